//! Error types returned by the engine.
//!
//! Every error is a rejection: the game it was raised against is left
//! exactly as it was before the attempt.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::board::{Color, OutOfBounds, Point};
use crate::session::GameId;

/// A move broke one of the rules of Go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MoveError {
    /// A player moved while it was the other player's turn.
    #[display("it is {expected}'s turn")]
    OutOfTurn { expected: Color },
    /// Coordinates outside the grid.
    #[display("{_0}")]
    OutOfBounds(OutOfBounds),
    /// Point is not empty.
    #[display("point {_0} is already occupied")]
    Occupied(Point),
    /// Resulting group would have no liberties.
    #[display("playing {_0} would be suicide")]
    Suicide(Point),
    /// Move would recreate an earlier position.
    #[display("playing {_0} retakes ko")]
    KoViolation(Point),
}

impl std::error::Error for MoveError {}

impl MoveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MoveError::OutOfTurn { .. } => ErrorKind::OutOfTurn,
            MoveError::OutOfBounds(_) => ErrorKind::OutOfBounds,
            MoveError::Occupied(_) => ErrorKind::Occupied,
            MoveError::Suicide(_) => ErrorKind::Suicide,
            MoveError::KoViolation(_) => ErrorKind::KoViolation,
        }
    }
}

/// Errors reported by the game state machine and the session coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GameError {
    /// No game is registered under this id.
    #[display("game {_0} not found")]
    NotFound(GameId),
    /// The game has ended and accepts no further transitions.
    #[display("game is over")]
    GameOver,
    /// Board size is not one of 9, 13 or 19.
    #[display("unsupported board size {_0}")]
    InvalidBoardSize(usize),
    /// A serialized game could not be turned back into a state.
    #[display("invalid game record: {_0}")]
    InvalidRecord(String),
    /// Illegal move.
    #[display("illegal move: {_0}")]
    Rule(MoveError),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Rule(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MoveError> for GameError {
    fn from(err: MoveError) -> Self {
        GameError::Rule(err)
    }
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotFound(_) => ErrorKind::NotFound,
            GameError::GameOver => ErrorKind::GameOver,
            GameError::InvalidBoardSize(_) => ErrorKind::InvalidBoardSize,
            GameError::InvalidRecord(_) => ErrorKind::InvalidRecord,
            GameError::Rule(e) => e.kind(),
        }
    }

    /// Returns the rule violation, if this is one.
    pub fn as_rule(&self) -> Option<&MoveError> {
        match self {
            GameError::Rule(e) => Some(e),
            _ => None,
        }
    }
}

/// Stable, payload-free name of an error, for replies sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    GameOver,
    InvalidBoardSize,
    InvalidRecord,
    OutOfTurn,
    OutOfBounds,
    Occupied,
    Suicide,
    KoViolation,
}
