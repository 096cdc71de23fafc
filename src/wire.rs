//! Serialized form of a game for transports and storage.
//!
//! The board is a nested array indexed `board[x][y]`, each entry `null`,
//! `"black"` or `"white"`. Captures count stones taken *by* that color.
//! Requests and error replies for transports live here as well.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Color, Point};
use crate::constants::{PASSES_TO_END, is_supported_size};
use crate::error::{ErrorKind, GameError};
use crate::game::{Captures, GameState, History, Outcome};
use crate::group::group_and_liberties;
use crate::session::GameId;

/// Column-major grid of optional stones.
pub type Grid = Vec<Vec<Option<Color>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub board: Grid,
    pub current_player: Color,
    pub captured_black: u32,
    pub captured_white: u32,
    /// `[x, y]` of the last stone placed.
    pub last_move: Option<[usize; 2]>,
    /// Board before the last move, the reference for ko.
    #[serde(default)]
    pub previous_board: Option<Grid>,
    /// Boards older than `previous_board`, oldest first. Needed to keep
    /// positional superko exact across a restore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Grid>,
    #[serde(default)]
    pub consecutive_passes: u8,
    #[serde(default)]
    pub move_number: u32,
    pub is_game_over: bool,
    pub winner: Option<Color>,
}

/// A move submitted over a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MoveRequest {
    Play {
        game_id: GameId,
        color: Color,
        x: i64,
        y: i64,
    },
    Pass {
        game_id: GameId,
        color: Color,
    },
    Resign {
        game_id: GameId,
        color: Color,
    },
}

impl MoveRequest {
    pub fn game_id(&self) -> GameId {
        match *self {
            MoveRequest::Play { game_id, .. }
            | MoveRequest::Pass { game_id, .. }
            | MoveRequest::Resign { game_id, .. } => game_id,
        }
    }
}

/// Error sent back to a client in place of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GameError> for ErrorReply {
    fn from(err: &GameError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn to_grid(board: &Board) -> Grid {
    let n = board.size();
    (0..n)
        .map(|x| (0..n).map(|y| board.at(Point::new(x, y)).color()).collect())
        .collect()
}

fn from_grid(grid: &Grid) -> Result<Board, GameError> {
    let n = grid.len();
    if !is_supported_size(n) {
        return Err(GameError::InvalidBoardSize(n));
    }
    if let Some(x) = grid.iter().position(|col| col.len() != n) {
        return Err(GameError::InvalidRecord(format!(
            "column {x} has {} cells, expected {n}",
            grid[x].len()
        )));
    }
    let cells = (0..n)
        .flat_map(|y| grid.iter().map(move |col| Cell::from(col[y])))
        .collect();
    Board::from_cells(n, cells)
        .ok_or_else(|| GameError::InvalidRecord("board has the wrong number of cells".into()))
}

/// Parses a grid that must match the size of the current board.
fn from_grid_sized(grid: &Grid, size: usize, what: &str) -> Result<Board, GameError> {
    let board = from_grid(grid)?;
    let n = board.size();
    if n != size {
        return Err(GameError::InvalidRecord(format!(
            "{what} is {n}x{n}, expected {size}x{size}"
        )));
    }
    Ok(board)
}

/// Rejects boards holding a group with no liberties; no legal game reaches one.
fn ensure_groups_breathe(board: &Board, what: &str) -> Result<(), GameError> {
    let mut seen = BTreeSet::new();
    for p in board.points() {
        if board.at(p).is_empty() || seen.contains(&p) {
            continue;
        }
        let group = group_and_liberties(board, p);
        if group.liberty_count() == 0 {
            return Err(GameError::InvalidRecord(format!(
                "{what} has a group without liberties at {p}"
            )));
        }
        seen.extend(group.stones);
    }
    Ok(())
}

impl From<&GameState> for StateView {
    fn from(state: &GameState) -> Self {
        let mut history: Vec<Grid> = state.history().iter().skip(1).map(to_grid).collect();
        history.reverse();
        Self {
            board: to_grid(state.board()),
            current_player: state.to_move(),
            captured_black: state.captures().black,
            captured_white: state.captures().white,
            last_move: state.last_move().map(|p| [p.x, p.y]),
            previous_board: state.previous_board().map(to_grid),
            history,
            consecutive_passes: state.consecutive_passes(),
            move_number: state.move_number(),
            is_game_over: state.is_terminal(),
            winner: state.winner(),
        }
    }
}

impl TryFrom<StateView> for GameState {
    type Error = GameError;

    /// Validates a record and rebuilds the snapshot it describes. Records
    /// without `history` restore only the previous board, which is all
    /// simple ko needs.
    fn try_from(view: StateView) -> Result<Self, Self::Error> {
        let board = from_grid(&view.board)?;
        let size = board.size();
        ensure_groups_breathe(&board, "board")?;

        let previous = match &view.previous_board {
            Some(grid) => {
                let prev = from_grid_sized(grid, size, "previous board")?;
                ensure_groups_breathe(&prev, "previous board")?;
                Some(prev)
            }
            None if !view.history.is_empty() => {
                return Err(GameError::InvalidRecord(
                    "history given without a previous board".into(),
                ));
            }
            None => None,
        };
        let earlier = view
            .history
            .iter()
            .enumerate()
            .map(|(i, grid)| from_grid_sized(grid, size, &format!("history entry {i}")))
            .collect::<Result<Vec<_>, _>>()?;
        let history = History::from_oldest(earlier.into_iter().chain(previous));

        let last_move = match view.last_move {
            Some([x, y]) => {
                let p = Point::new(x, y);
                if !board.contains(p) {
                    return Err(GameError::InvalidRecord(format!(
                        "last move {p} is off the board"
                    )));
                }
                // The last stone placed belongs to the player who is not on move.
                if board.at(p).color() != Some(view.current_player.opponent()) {
                    return Err(GameError::InvalidRecord(format!(
                        "last move {p} is not a {} stone",
                        view.current_player.opponent()
                    )));
                }
                if view.consecutive_passes > 0 {
                    return Err(GameError::InvalidRecord(
                        "last move recorded after a pass".into(),
                    ));
                }
                Some(p)
            }
            None => None,
        };

        let passed_out = view.consecutive_passes >= PASSES_TO_END;
        let outcome = match (view.is_game_over, view.winner) {
            (false, Some(_)) => {
                return Err(GameError::InvalidRecord(
                    "winner set on a game in progress".into(),
                ));
            }
            (false, None) if passed_out => {
                return Err(GameError::InvalidRecord(format!(
                    "{} consecutive passes on a game in progress",
                    view.consecutive_passes
                )));
            }
            (false, None) => Outcome::InProgress,
            (true, None) if !passed_out => {
                return Err(GameError::InvalidRecord(
                    "game over without a winner or consecutive passes".into(),
                ));
            }
            (true, None) => Outcome::BothPassed,
            (true, Some(winner)) => Outcome::Resigned(winner.opponent()),
        };

        Ok(GameState {
            board,
            history,
            to_move: view.current_player,
            captures: Captures {
                black: view.captured_black,
                white: view.captured_white,
            },
            last_move,
            consecutive_passes: view.consecutive_passes,
            move_number: view.move_number,
            outcome,
        })
    }
}
