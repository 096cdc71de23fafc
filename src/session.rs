//! Game session coordination.
//!
//! A [`SessionCoordinator`] maps game ids to state machines. Each game sits
//! behind its own lock: moves on one game are serialized, reads of it run
//! side by side, and different games never contend beyond the brief
//! registry lookup.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::board::Color;
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::game::{GameMachine, GameState};
use crate::rules::KoRule;
use crate::wire::{MoveRequest, StateView};

/// Unique identifier for a game, displayed as `game-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display("game-{_0}")]
#[serde(transparent)]
pub struct GameId(u64);

impl GameId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A game id string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid game id: {input}")]
pub struct ParseGameIdError {
    pub input: String,
}

impl FromStr for GameId {
    type Err = ParseGameIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("game-").unwrap_or(s);
        digits.parse().map(GameId).map_err(|_| ParseGameIdError {
            input: s.to_string(),
        })
    }
}

type GameSlot = Arc<RwLock<GameMachine>>;

// A machine commits by swapping one `Arc`, so a guard poisoned by a
// panicking holder still protects a whole snapshot.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every live game and routes requests to them.
///
/// Cloning is cheap and yields a handle to the same set of games.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    games: Arc<RwLock<HashMap<GameId, GameSlot>>>,
    next_id: Arc<AtomicU64>,
    ko_rule: KoRule,
}

impl SessionCoordinator {
    /// Creates a coordinator whose games enforce `ko_rule`.
    #[instrument]
    pub fn new(ko_rule: KoRule) -> Self {
        info!("Creating session coordinator");
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            ko_rule,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.ko_rule)
    }

    pub fn ko_rule(&self) -> KoRule {
        self.ko_rule
    }

    fn register(&self, machine: GameMachine) -> (GameId, Arc<GameState>) {
        let id = GameId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let state = machine.state();
        write(&self.games).insert(id, Arc::new(RwLock::new(machine)));
        (id, state)
    }

    fn slot(&self, id: GameId) -> Result<GameSlot, GameError> {
        read(&self.games).get(&id).cloned().ok_or_else(|| {
            debug!(game_id = %id, "Game not found");
            GameError::NotFound(id)
        })
    }

    /// Runs one transition against a game while holding its write lock.
    fn transition(
        &self,
        id: GameId,
        f: impl FnOnce(&mut GameMachine) -> Result<Arc<GameState>, GameError>,
    ) -> Result<Arc<GameState>, GameError> {
        let slot = self.slot(id)?;
        let mut machine = write(&slot);
        f(&mut machine)
    }

    /// Starts a new game on an empty `size` x `size` board.
    #[instrument(skip(self))]
    pub fn create_game(&self, size: usize) -> Result<(GameId, Arc<GameState>), GameError> {
        let machine = GameMachine::new(size, self.ko_rule).inspect_err(|e| {
            warn!(size, error = %e, "Rejected game creation");
        })?;
        let (id, state) = self.register(machine);
        info!(game_id = %id, size, "Created new game");
        Ok((id, state))
    }

    /// Registers a game restored from its serialized form under a fresh id.
    #[instrument(skip(self, view))]
    pub fn import_game(&self, view: StateView) -> Result<(GameId, Arc<GameState>), GameError> {
        let state = GameState::try_from(view).inspect_err(|e| {
            warn!(error = %e, "Rejected game record");
        })?;
        let recorded = state.history().len();
        if self.ko_rule == KoRule::PositionalSuperko && recorded < state.move_number() as usize {
            warn!(
                recorded,
                move_number = state.move_number(),
                "Record lacks full history; superko checks only the recorded positions"
            );
        }
        let (id, state) = self.register(GameMachine::from_state(state, self.ko_rule));
        info!(game_id = %id, move_number = state.move_number(), "Imported game");
        Ok((id, state))
    }

    /// Current snapshot of a game.
    #[instrument(skip(self))]
    pub fn get_state(&self, id: GameId) -> Result<Arc<GameState>, GameError> {
        let slot = self.slot(id)?;
        let state = read(&slot).state();
        Ok(state)
    }

    #[instrument(skip(self))]
    pub fn submit_move(
        &self,
        id: GameId,
        color: Color,
        x: i64,
        y: i64,
    ) -> Result<Arc<GameState>, GameError> {
        let result = self.transition(id, |m| m.play(color, x, y));
        match &result {
            Ok(state) => info!(
                game_id = %id,
                %color,
                x,
                y,
                captures_black = state.captures().black,
                captures_white = state.captures().white,
                "Move accepted"
            ),
            Err(e) => warn!(game_id = %id, %color, x, y, error = %e, "Move rejected"),
        }
        result
    }

    #[instrument(skip(self))]
    pub fn submit_pass(&self, id: GameId, color: Color) -> Result<Arc<GameState>, GameError> {
        let result = self.transition(id, |m| m.pass(color));
        match &result {
            Ok(state) => info!(game_id = %id, %color, game_over = state.is_terminal(), "Pass accepted"),
            Err(e) => warn!(game_id = %id, %color, error = %e, "Pass rejected"),
        }
        result
    }

    #[instrument(skip(self))]
    pub fn submit_resign(&self, id: GameId, color: Color) -> Result<Arc<GameState>, GameError> {
        let result = self.transition(id, |m| m.resign(color));
        match &result {
            Ok(_) => info!(game_id = %id, %color, "Player resigned"),
            Err(e) => warn!(game_id = %id, %color, error = %e, "Resignation rejected"),
        }
        result
    }

    /// Dispatches a transport request to the matching submit operation.
    pub fn submit(&self, request: MoveRequest) -> Result<Arc<GameState>, GameError> {
        match request {
            MoveRequest::Play {
                game_id,
                color,
                x,
                y,
            } => self.submit_move(game_id, color, x, y),
            MoveRequest::Pass { game_id, color } => self.submit_pass(game_id, color),
            MoveRequest::Resign { game_id, color } => self.submit_resign(game_id, color),
        }
    }

    /// Ids of all registered games, ascending.
    #[instrument(skip(self))]
    pub fn list_games(&self) -> Vec<GameId> {
        let mut ids: Vec<_> = read(&self.games).keys().copied().collect();
        ids.sort();
        debug!(count = ids.len(), "Listed games");
        ids
    }

    /// Drops a game, returning its final snapshot.
    #[instrument(skip(self))]
    pub fn remove_game(&self, id: GameId) -> Result<Arc<GameState>, GameError> {
        let slot = write(&self.games)
            .remove(&id)
            .ok_or(GameError::NotFound(id))?;
        let state = read(&slot).state();
        info!(game_id = %id, "Removed game");
        Ok(state)
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(KoRule::default())
    }
}
