//! goban-engine: an authoritative Go (Baduk) rules engine.
//!
//! Given a game state and a proposed move, the engine either produces the
//! next state or a reason for rejecting the move. Captures are resolved by
//! flood-filling groups and their liberties; suicide and ko are enforced;
//! two consecutive passes or a resignation end the game.
//!
//! ## Modules
//!
//! - [`constants`] - Supported board sizes and text symbols
//! - [`board`] - Immutable board, cells, colors and points
//! - [`group`] - Connected groups and their liberties
//! - [`rules`] - Move validation and resolution (captures, suicide, ko)
//! - [`game`] - Game snapshots and the per-game state machine
//! - [`session`] - Concurrent access to many games by id
//! - [`wire`] - Serialized game state
//! - [`config`] - TOML configuration
//! - [`playout`] - Random self-play
//! - [`gtp`] - Go Text Protocol front end
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use goban_engine::board::Color;
//! use goban_engine::session::SessionCoordinator;
//!
//! let games = SessionCoordinator::default();
//! let (id, _) = games.create_game(9).unwrap();
//!
//! games.submit_move(id, Color::Black, 4, 4).unwrap();
//! let state = games.submit_move(id, Color::White, 4, 5).unwrap();
//! assert_eq!(state.to_move(), Color::Black);
//!
//! // Playing out of turn is rejected and leaves the game untouched.
//! assert!(games.submit_move(id, Color::White, 0, 0).is_err());
//! assert_eq!(games.get_state(id).unwrap(), state);
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod group;
pub mod gtp;
pub mod playout;
pub mod rules;
pub mod session;
pub mod wire;

pub use board::{Board, Cell, Color, Point};
pub use error::{ErrorKind, GameError, MoveError};
pub use game::{Captures, GameMachine, GameState, History, Outcome};
pub use rules::KoRule;
pub use session::{GameId, SessionCoordinator};
pub use wire::{ErrorReply, MoveRequest, StateView};
