//! Game state snapshots and the per-game state machine.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::board::{Board, Color, Point};
use crate::constants::is_supported_size;
use crate::error::GameError;
use crate::rules::{self, KoRule};

/// Stones captured *by* each color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captures {
    pub black: u32,
    pub white: u32,
}

impl Captures {
    /// Stones captured by `color`.
    pub fn by(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub(crate) fn add(&mut self, color: Color, stones: usize) {
        let stones = u32::try_from(stones).unwrap_or(u32::MAX);
        match color {
            Color::Black => self.black = self.black.saturating_add(stones),
            Color::White => self.white = self.white.saturating_add(stones),
        }
    }
}

/// How far a game has progressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    InProgress,
    /// Ended by consecutive passes; scoring is left to the caller.
    BothPassed,
    /// The given color resigned.
    Resigned(Color),
}

struct Node {
    board: Board,
    prev: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink iteratively; a long game would otherwise recurse once per board.
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Earlier boards of a game, newest first.
///
/// A persistent list: [`History::push`] returns a new history that shares
/// every older entry with `self`, so successive snapshots cost one node each.
#[derive(Clone, Default)]
pub struct History {
    head: Option<Arc<Node>>,
    len: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from boards listed oldest first.
    pub fn from_oldest(boards: impl IntoIterator<Item = Board>) -> Self {
        boards.into_iter().fold(Self::new(), |h, b| h.push(b))
    }

    /// A new history with `board` as the most recent entry.
    pub fn push(&self, board: Board) -> Self {
        Self {
            head: Some(Arc::new(Node {
                board,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Most recent board.
    pub fn last(&self) -> Option<&Board> {
        self.head.as_deref().map(|n| &n.board)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Boards from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Board> + '_ {
        std::iter::successors(self.head.as_deref(), |n| n.prev.as_deref()).map(|n| &n.board)
    }

    /// Returns `true` if `board` appears anywhere in the history.
    pub fn contains(&self, board: &Board) -> bool {
        self.iter().any(|b| b == board)
    }
}

impl PartialEq for History {
    fn eq(&self, other: &Self) -> bool {
        let same_head = match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.len == other.len && (same_head || self.iter().eq(other.iter()))
    }
}

impl Eq for History {}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History").field("len", &self.len).finish()
    }
}

/// An immutable snapshot of a game.
///
/// New snapshots come only from the transitions in [`crate::rules`]; a
/// snapshot that has been handed out never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) board: Board,
    /// Every earlier board. The newest entry is the board before the most
    /// recent move or pass.
    pub(crate) history: History,
    pub(crate) to_move: Color,
    pub(crate) captures: Captures,
    pub(crate) last_move: Option<Point>,
    pub(crate) consecutive_passes: u8,
    pub(crate) move_number: u32,
    pub(crate) outcome: Outcome,
}

impl GameState {
    /// Empty board, Black to move, no captures and no history.
    pub fn new(size: usize) -> Result<Self, GameError> {
        if !is_supported_size(size) {
            return Err(GameError::InvalidBoardSize(size));
        }
        Ok(Self {
            board: Board::new(size),
            history: History::new(),
            to_move: Color::Black,
            captures: Captures::default(),
            last_move: None,
            consecutive_passes: 0,
            move_number: 0,
            outcome: Outcome::InProgress,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Board as it was before the most recent move or pass.
    pub fn previous_board(&self) -> Option<&Board> {
        self.history.last()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Color whose turn it is.
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn captures(&self) -> Captures {
        self.captures
    }

    /// Point of the last stone placed, `None` at the start or after a pass.
    pub fn last_move(&self) -> Option<Point> {
        self.last_move
    }

    pub fn consecutive_passes(&self) -> u8 {
        self.consecutive_passes
    }

    /// Moves and passes committed so far.
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Winner by resignation. Games ended by passing have no winner here.
    pub fn winner(&self) -> Option<Color> {
        match self.outcome {
            Outcome::Resigned(loser) => Some(loser.opponent()),
            Outcome::InProgress | Outcome::BothPassed => None,
        }
    }
}

/// Owns the current snapshot of one game and is its only entry point.
///
/// Once the game is over every transition fails with
/// [`GameError::GameOver`].
#[derive(Debug, Clone)]
pub struct GameMachine {
    state: Arc<GameState>,
    ko_rule: KoRule,
}

impl GameMachine {
    pub fn new(size: usize, ko_rule: KoRule) -> Result<Self, GameError> {
        Ok(Self::from_state(GameState::new(size)?, ko_rule))
    }

    /// Resumes a game from an existing snapshot.
    pub fn from_state(state: GameState, ko_rule: KoRule) -> Self {
        Self {
            state: Arc::new(state),
            ko_rule,
        }
    }

    /// Current snapshot. Cheap to call; the snapshot is shared.
    pub fn state(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn ko_rule(&self) -> KoRule {
        self.ko_rule
    }

    fn ensure_live(&self) -> Result<(), GameError> {
        if self.state.is_terminal() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    fn commit(&mut self, next: GameState) -> Arc<GameState> {
        self.state = Arc::new(next);
        debug!(
            move_number = self.state.move_number,
            to_move = %self.state.to_move,
            outcome = ?self.state.outcome,
            "state committed"
        );
        self.state()
    }

    /// Places a stone for `color` at `(x, y)`.
    #[instrument(skip(self))]
    pub fn play(&mut self, color: Color, x: i64, y: i64) -> Result<Arc<GameState>, GameError> {
        self.ensure_live()?;
        let next = rules::apply_move(&self.state, color, x, y, self.ko_rule)?;
        Ok(self.commit(next))
    }

    #[instrument(skip(self))]
    pub fn pass(&mut self, color: Color) -> Result<Arc<GameState>, GameError> {
        self.ensure_live()?;
        let next = rules::pass(&self.state, color)?;
        Ok(self.commit(next))
    }

    #[instrument(skip(self))]
    pub fn resign(&mut self, color: Color) -> Result<Arc<GameState>, GameError> {
        self.ensure_live()?;
        let next = rules::resign(&self.state, color);
        Ok(self.commit(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, MoveError};

    #[test]
    fn test_new_state() {
        let state = GameState::new(19).unwrap();
        assert_eq!(state.size(), 19);
        assert_eq!(state.to_move(), Color::Black);
        assert_eq!(state.captures(), Captures::default());
        assert_eq!(state.previous_board(), None);
        assert_eq!(state.last_move(), None);
        assert!(!state.is_terminal());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_rejects_unsupported_size() {
        assert_eq!(GameState::new(10), Err(GameError::InvalidBoardSize(10)));
        assert!(GameMachine::new(0, KoRule::Simple).is_err());
    }

    #[test]
    fn test_rejected_move_keeps_snapshot() {
        let mut machine = GameMachine::new(9, KoRule::Simple).unwrap();
        let before = machine.state();
        let err = machine.play(Color::White, 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfTurn);
        assert!(Arc::ptr_eq(&before, &machine.state()));
    }

    #[test]
    fn test_old_snapshots_survive_commits() {
        let mut machine = GameMachine::new(9, KoRule::Simple).unwrap();
        let first = machine.state();
        let after = machine.play(Color::Black, 2, 2).unwrap();
        assert!(first.board().at(Point::new(2, 2)).is_empty());
        assert_eq!(after.board().at(Point::new(2, 2)), crate::board::Cell::Black);
        assert_eq!(after.previous_board(), Some(first.board()));
    }

    #[test]
    fn test_game_over_after_two_passes() {
        let mut machine = GameMachine::new(9, KoRule::Simple).unwrap();
        machine.pass(Color::Black).unwrap();
        let state = machine.pass(Color::White).unwrap();
        assert!(state.is_terminal());
        assert_eq!(machine.play(Color::Black, 0, 0), Err(GameError::GameOver));
        assert_eq!(machine.pass(Color::Black), Err(GameError::GameOver));
        assert_eq!(machine.resign(Color::Black), Err(GameError::GameOver));
    }

    #[test]
    fn test_resign_ends_game() {
        let mut machine = GameMachine::new(13, KoRule::PositionalSuperko).unwrap();
        machine.play(Color::Black, 3, 3).unwrap();
        let state = machine.resign(Color::Black).unwrap();
        assert_eq!(state.winner(), Some(Color::White));
        assert_eq!(state.outcome(), Outcome::Resigned(Color::Black));
        assert_eq!(machine.play(Color::White, 4, 4), Err(GameError::GameOver));
    }

    #[test]
    fn test_rule_errors_are_wrapped() {
        let mut machine = GameMachine::new(9, KoRule::Simple).unwrap();
        machine.play(Color::Black, 4, 4).unwrap();
        let err = machine.play(Color::White, 4, 4).unwrap_err();
        assert_eq!(err, GameError::Rule(MoveError::Occupied(Point::new(4, 4))));
    }

    #[test]
    fn test_history_shares_earlier_entries() {
        let state = GameState::new(9).unwrap();
        let first = rules::apply_move(&state, Color::Black, 2, 2, KoRule::Simple).unwrap();
        let second = rules::pass(&first, Color::White).unwrap();

        assert_eq!(second.history().len(), 2);
        assert_eq!(second.history().last(), Some(first.board()));
        assert!(second.history().iter().skip(1).eq(first.history().iter()));
        let older = second.history.head.as_ref().and_then(|n| n.prev.as_ref());
        let shared = first.history.head.as_ref();
        assert!(matches!((older, shared), (Some(a), Some(b)) if Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_history_order_and_equality() {
        let a = Board::new(9);
        let b = a.with(Point::new(0, 0), crate::board::Cell::White);
        let history = History::from_oldest([a.clone(), b.clone()]);
        assert_eq!(history.last(), Some(&b));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![&b, &a]);
        assert!(history.contains(&a));
        assert_eq!(history, History::new().push(a).push(b));
        assert_ne!(history, History::new());
    }

    #[test]
    fn test_long_history_drops() {
        let board = Board::new(9);
        let mut history = History::new();
        for _ in 0..200_000 {
            history = history.push(board.clone());
        }
        assert_eq!(history.len(), 200_000);
        drop(history);
    }

    #[test]
    fn test_captures_saturate() {
        let mut captures = Captures {
            black: u32::MAX - 1,
            white: 0,
        };
        captures.add(Color::Black, 5);
        captures.add(Color::White, 3);
        assert_eq!(captures.by(Color::Black), u32::MAX);
        assert_eq!(captures.by(Color::White), 3);
    }
}
