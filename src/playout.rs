//! Random self-play.
//!
//! Plays random legal moves through a [`SessionCoordinator`] until both
//! players pass or a move limit is hit. Used by the `demo` command and by
//! randomized tests of the engine's invariants. This is not a playing
//! strategy: the only heuristic is that a player never fills its own
//! single-point eye, which is what lets random games end.

use std::sync::Arc;

use crate::board::{Board, Cell, Color, Point};
use crate::error::GameError;
use crate::game::GameState;
use crate::rules::{KoRule, is_legal};
use crate::session::{GameId, SessionCoordinator};

/// Move limit for a board of side `size`, enough for captures and refills.
pub fn max_game_len(size: usize) -> usize {
    size * size * 3
}

/// Returns `true` if every on-board neighbor of the empty point `p` holds a
/// stone of `color`. May be true for false eyes.
fn is_eyeish(board: &Board, p: Point, color: Color) -> bool {
    let own = Cell::from(color);
    board.at(p).is_empty() && board.neighbors(p).all(|n| board.at(n) == own)
}

/// Picks a random legal point for `color` that does not fill its own eye.
pub fn choose_random_move(
    state: &GameState,
    color: Color,
    ko_rule: KoRule,
    rng: &mut fastrand::Rng,
) -> Option<Point> {
    let board = state.board();
    let mut candidates: Vec<Point> = board
        .points()
        .filter(|&p| board.at(p).is_empty() && !is_eyeish(board, p, color))
        .collect();
    rng.shuffle(&mut candidates);
    candidates
        .into_iter()
        .find(|&p| is_legal(state, color, p, ko_rule))
}

/// Plays random moves in game `id` until it ends or `max_moves` transitions
/// have been committed. Returns the final snapshot.
pub fn random_game(
    coordinator: &SessionCoordinator,
    id: GameId,
    max_moves: usize,
    rng: &mut fastrand::Rng,
) -> Result<Arc<GameState>, GameError> {
    let mut state = coordinator.get_state(id)?;
    let mut played = 0;
    while !state.is_terminal() && played < max_moves {
        let color = state.to_move();
        state = match choose_random_move(&state, color, coordinator.ko_rule(), rng) {
            Some(p) => coordinator.submit_move(id, color, p.x as i64, p.y as i64)?,
            None => coordinator.submit_pass(id, color)?,
        };
        played += 1;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eyeish() {
        let board = Board::new(9)
            .with(Point::new(1, 0), Cell::Black)
            .with(Point::new(0, 1), Cell::Black);
        assert!(is_eyeish(&board, Point::new(0, 0), Color::Black));
        assert!(!is_eyeish(&board, Point::new(0, 0), Color::White));
        assert!(!is_eyeish(&board, Point::new(1, 1), Color::Black));
    }

    #[test]
    fn test_random_game_ends() {
        let coordinator = SessionCoordinator::default();
        let (id, _) = coordinator.create_game(9).unwrap();
        let mut rng = fastrand::Rng::with_seed(7);
        let state = random_game(&coordinator, id, max_game_len(9), &mut rng).unwrap();
        assert!(state.move_number() as usize <= max_game_len(9));
        assert_eq!(coordinator.get_state(id).unwrap(), state);
    }

    #[test]
    fn test_same_seed_same_game() {
        let coordinator = SessionCoordinator::default();
        let (a, _) = coordinator.create_game(9).unwrap();
        let (b, _) = coordinator.create_game(9).unwrap();
        let first = random_game(&coordinator, a, 40, &mut fastrand::Rng::with_seed(3)).unwrap();
        let second = random_game(&coordinator, b, 40, &mut fastrand::Rng::with_seed(3)).unwrap();
        assert_eq!(first.board(), second.board());
    }
}
