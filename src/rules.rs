//! Move validation and resolution.
//!
//! Every function here is pure: it reads a [`GameState`] and either returns
//! the next state or a [`MoveError`]. The input state is never touched, so a
//! rejected move leaves the game exactly as it was.
//!
//! A stone placement is checked in this order:
//! 1. turn, 2. bounds, 3. occupancy, then the stone is placed on a trial
//! board, 4. opponent groups left without liberties are captured, 5. the
//! mover's own group must still have a liberty (suicide), 6. the resulting
//! position must not repeat an earlier one (ko).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{Board, Color, Point};
use crate::constants::PASSES_TO_END;
use crate::error::MoveError;
use crate::game::{GameState, Outcome};
use crate::group::group_and_liberties;

/// Which repeated positions are forbidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KoRule {
    /// A single-stone capture may not recreate the position from before the
    /// opponent's last move.
    #[default]
    Simple,
    /// No move may recreate any earlier position of the game.
    PositionalSuperko,
}

/// Board after a placement and its captures, before the ko check.
struct Placement {
    board: Board,
    captured: BTreeSet<Point>,
}

/// Places `color` at `point` on `board`, removes captured opponent groups,
/// and rejects suicide.
fn resolve_placement(board: &Board, color: Color, point: Point) -> Result<Placement, MoveError> {
    let trial = board.with(point, color.into());
    let opponent = color.opponent();

    // Every opponent neighbor is judged against the trial board as placed.
    // Two neighbors may belong to the same group, which is counted once.
    let mut captured = BTreeSet::new();
    for n in trial.neighbors(point) {
        if trial.at(n).color() != Some(opponent) || captured.contains(&n) {
            continue;
        }
        let group = group_and_liberties(&trial, n);
        if group.liberty_count() == 0 {
            trace!(at = %n, stones = group.len(), "opponent group captured");
            captured.extend(group.stones);
        }
    }

    let board = if captured.is_empty() {
        trial
    } else {
        trial.without(&captured)
    };

    if group_and_liberties(&board, point).liberty_count() == 0 {
        return Err(MoveError::Suicide(point));
    }
    Ok(Placement { board, captured })
}

fn repeats_position(state: &GameState, placement: &Placement, ko_rule: KoRule) -> bool {
    let simple_ko = placement.captured.len() == 1
        && state.previous_board() == Some(&placement.board);
    match ko_rule {
        KoRule::Simple => simple_ko,
        KoRule::PositionalSuperko => {
            simple_ko || state.history().contains(&placement.board)
        }
    }
}

/// Plays a stone of `color` at `(x, y)`.
///
/// Coordinates are signed so that any caller input can be judged; negative
/// values are reported as out of bounds.
pub fn apply_move(
    state: &GameState,
    color: Color,
    x: i64,
    y: i64,
    ko_rule: KoRule,
) -> Result<GameState, MoveError> {
    if color != state.to_move() {
        return Err(MoveError::OutOfTurn {
            expected: state.to_move(),
        });
    }
    let board = state.board();
    let point = board.point(x, y).map_err(MoveError::OutOfBounds)?;
    if !board.at(point).is_empty() {
        return Err(MoveError::Occupied(point));
    }

    let placement = resolve_placement(board, color, point)?;
    if repeats_position(state, &placement, ko_rule) {
        return Err(MoveError::KoViolation(point));
    }

    let history = state.history().push(board.clone());
    let mut captures = state.captures();
    captures.add(color, placement.captured.len());

    Ok(GameState {
        board: placement.board,
        history,
        to_move: color.opponent(),
        captures,
        last_move: Some(point),
        consecutive_passes: 0,
        move_number: state.move_number() + 1,
        outcome: Outcome::InProgress,
    })
}

/// Passes the turn. The second pass in a row ends the game.
pub fn pass(state: &GameState, color: Color) -> Result<GameState, MoveError> {
    if color != state.to_move() {
        return Err(MoveError::OutOfTurn {
            expected: state.to_move(),
        });
    }
    let consecutive_passes = state.consecutive_passes().saturating_add(1);
    let outcome = if consecutive_passes >= PASSES_TO_END {
        Outcome::BothPassed
    } else {
        Outcome::InProgress
    };

    let history = state.history().push(state.board().clone());

    Ok(GameState {
        board: state.board().clone(),
        history,
        to_move: color.opponent(),
        captures: state.captures(),
        last_move: None,
        consecutive_passes,
        move_number: state.move_number() + 1,
        outcome,
    })
}

/// `color` concedes; the opponent wins. Accepted on either player's turn.
pub fn resign(state: &GameState, color: Color) -> GameState {
    GameState {
        outcome: Outcome::Resigned(color),
        ..state.clone()
    }
}

/// Returns `true` if `color` could play at `point` right now.
pub fn is_legal(state: &GameState, color: Color, point: Point, ko_rule: KoRule) -> bool {
    let (Ok(x), Ok(y)) = (i64::try_from(point.x), i64::try_from(point.y)) else {
        return false;
    };
    apply_move(state, color, x, y, ko_rule).is_ok()
}

/// Every point where `color` could legally place a stone, in row-major order.
pub fn legal_points(state: &GameState, color: Color, ko_rule: KoRule) -> Vec<Point> {
    state
        .board()
        .points()
        .filter(|&p| is_legal(state, color, p, ko_rule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::game::History;

    /// Plays `moves` alternately starting with Black. `None` passes.
    fn play_all(size: usize, moves: &[Option<(i64, i64)>]) -> GameState {
        let mut state = GameState::new(size).unwrap();
        for (i, mv) in moves.iter().enumerate() {
            let color = state.to_move();
            state = match mv {
                Some((x, y)) => apply_move(&state, color, *x, *y, KoRule::Simple)
                    .unwrap_or_else(|e| panic!("move {i} ({x}, {y}) rejected: {e}")),
                None => pass(&state, color).unwrap(),
            };
        }
        state
    }

    #[test]
    fn test_check_order_turn_before_bounds() {
        let state = GameState::new(9).unwrap();
        let err = apply_move(&state, Color::White, -1, 100, KoRule::Simple).unwrap_err();
        assert_eq!(
            err,
            MoveError::OutOfTurn {
                expected: Color::Black
            }
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let state = GameState::new(9).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (9, 0), (0, 9), (i64::MAX, 0)] {
            let err = apply_move(&state, Color::Black, x, y, KoRule::Simple).unwrap_err();
            assert!(matches!(err, MoveError::OutOfBounds(_)), "({x}, {y})");
        }
    }

    #[test]
    fn test_occupied() {
        let state = play_all(9, &[Some((4, 4))]);
        let err = apply_move(&state, Color::White, 4, 4, KoRule::Simple).unwrap_err();
        assert_eq!(err, MoveError::Occupied(Point::new(4, 4)));
    }

    #[test]
    fn test_capture_in_corner() {
        // White (0,0) is closed in by Black (1,0) and (0,1).
        let state = play_all(9, &[Some((1, 0)), Some((0, 0)), Some((0, 1))]);
        assert!(state.board().at(Point::new(0, 0)).is_empty());
        assert_eq!(state.captures().black, 1);
        assert_eq!(state.captures().white, 0);
    }

    #[test]
    fn test_two_groups_captured_by_one_stone() {
        //   x: 0 1 2
        // y0:  . W B
        // y1:  W B .
        // y2:  B . .
        let state = play_all(
            9,
            &[
                Some((2, 0)),
                Some((1, 0)),
                Some((0, 2)),
                Some((0, 1)),
                Some((1, 1)),
                None,
            ],
        );
        // Each white stone's last liberty is (0,0).
        let state = apply_move(&state, Color::Black, 0, 0, KoRule::Simple).unwrap();
        assert_eq!(state.captures().black, 2);
        assert!(state.board().at(Point::new(1, 0)).is_empty());
        assert!(state.board().at(Point::new(0, 1)).is_empty());
    }

    #[test]
    fn test_group_touching_twice_counted_once() {
        //   x: 0 1 2
        // y0:  W W B
        // y1:  W . .
        // y2:  B . .
        // Black (1,1) touches the white group at (1,0) and at (0,1).
        let state = play_all(
            9,
            &[
                Some((2, 0)),
                Some((0, 0)),
                Some((0, 2)),
                Some((1, 0)),
                Some((8, 8)),
                Some((0, 1)),
            ],
        );
        let state = apply_move(&state, Color::Black, 1, 1, KoRule::Simple).unwrap();
        assert_eq!(state.captures().black, 3);
        assert_eq!(state.board().stone_count(Color::White), 0);
    }

    #[test]
    fn test_suicide_rejected_and_state_unchanged() {
        let state = play_all(9, &[Some((1, 0)), Some((8, 8)), Some((0, 1))]);
        let before = state.clone();
        let err = apply_move(&state, Color::White, 0, 0, KoRule::Simple).unwrap_err();
        assert_eq!(err, MoveError::Suicide(Point::new(0, 0)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_multi_stone_suicide() {
        //   x: 0 1 2
        // y0:  W . B
        // y1:  B B .
        // White (1,0) would join (0,0) into a group with no liberties.
        let state = play_all(
            9,
            &[Some((0, 1)), Some((0, 0)), Some((1, 1)), Some((8, 8)), Some((2, 0))],
        );
        let err = apply_move(&state, Color::White, 1, 0, KoRule::Simple).unwrap_err();
        assert_eq!(err, MoveError::Suicide(Point::new(1, 0)));
        assert_eq!(state.board().at(Point::new(0, 0)), Cell::White);
    }

    #[test]
    fn test_capture_is_not_suicide() {
        //   x: 0 1 2
        // y0:  . W B
        // y1:  W B .
        // Black (0,0) has no liberty of its own until White (1,0) is removed.
        let state = play_all(
            9,
            &[
                Some((2, 0)),
                Some((1, 0)),
                Some((1, 1)),
                Some((0, 1)),
                Some((8, 8)),
                Some((8, 7)),
            ],
        );
        let state = apply_move(&state, Color::Black, 0, 0, KoRule::Simple).unwrap();
        assert_eq!(state.captures().black, 1);
        assert!(state.board().at(Point::new(1, 0)).is_empty());
        assert_eq!(state.board().at(Point::new(0, 1)), Cell::White);
    }

    /// Ko shape with Black to move, able to capture at (2,1):
    ///   x: 0 1 2 3
    /// y0:  . B W .
    /// y1:  B W . W
    /// y2:  . B W .
    fn ko_position() -> GameState {
        play_all(
            9,
            &[
                Some((1, 0)),
                Some((2, 0)),
                Some((0, 1)),
                Some((3, 1)),
                Some((1, 2)),
                Some((2, 2)),
                Some((8, 8)),
                Some((1, 1)),
            ],
        )
    }

    #[test]
    fn test_simple_ko() {
        let state = ko_position();
        assert_eq!(state.to_move(), Color::Black);
        let state = apply_move(&state, Color::Black, 2, 1, KoRule::Simple).unwrap();
        assert_eq!(state.captures().black, 1);
        assert!(state.board().at(Point::new(1, 1)).is_empty());

        // Immediate recapture is forbidden and changes nothing.
        let before = state.clone();
        let err = apply_move(&state, Color::White, 1, 1, KoRule::Simple).unwrap_err();
        assert_eq!(err, MoveError::KoViolation(Point::new(1, 1)));
        assert_eq!(state, before);

        // After an exchange elsewhere it is allowed again.
        let state = apply_move(&state, Color::White, 7, 7, KoRule::Simple).unwrap();
        let state = apply_move(&state, Color::Black, 7, 6, KoRule::Simple).unwrap();
        let state = apply_move(&state, Color::White, 1, 1, KoRule::Simple).unwrap();
        assert_eq!(state.captures().white, 1);
        assert!(state.board().at(Point::new(2, 1)).is_empty());
    }

    #[test]
    fn test_superko_rejects_any_earlier_position() {
        let empty = GameState::new(9).unwrap();
        let seen = empty.board().with(Point::new(4, 4), Cell::Black);
        let state = GameState {
            history: History::new().push(seen),
            ..empty
        };
        // No capture, so simple ko does not apply.
        assert!(is_legal(&state, Color::Black, Point::new(4, 4), KoRule::Simple));
        let err = apply_move(&state, Color::Black, 4, 4, KoRule::PositionalSuperko).unwrap_err();
        assert_eq!(err, MoveError::KoViolation(Point::new(4, 4)));
        assert!(is_legal(&state, Color::Black, Point::new(4, 5), KoRule::PositionalSuperko));
    }

    #[test]
    fn test_superko_includes_simple_ko() {
        let state = ko_position();
        let state = apply_move(&state, Color::Black, 2, 1, KoRule::PositionalSuperko).unwrap();
        assert!(!is_legal(&state, Color::White, Point::new(1, 1), KoRule::PositionalSuperko));
    }

    #[test]
    fn test_pass_and_termination() {
        let state = GameState::new(9).unwrap();
        let state = pass(&state, Color::Black).unwrap();
        assert!(!state.is_terminal());
        assert_eq!(state.to_move(), Color::White);
        assert_eq!(state.previous_board(), Some(state.board()));
        assert_eq!(state.last_move(), None);
        let state = pass(&state, Color::White).unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.winner(), None);
        assert_eq!(state.outcome(), Outcome::BothPassed);
    }

    #[test]
    fn test_stone_resets_pass_counter() {
        let state = play_all(9, &[None, Some((3, 3)), None]);
        assert_eq!(state.consecutive_passes(), 1);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_pass_out_of_turn() {
        let state = GameState::new(9).unwrap();
        assert!(matches!(
            pass(&state, Color::White),
            Err(MoveError::OutOfTurn { .. })
        ));
    }

    #[test]
    fn test_resign_on_either_turn() {
        let state = GameState::new(9).unwrap();
        let done = resign(&state, Color::White);
        assert!(done.is_terminal());
        assert_eq!(done.winner(), Some(Color::Black));
        assert_eq!(done.board(), state.board());
        assert_eq!(done.to_move(), state.to_move());
    }

    #[test]
    fn test_legal_points() {
        let state = GameState::new(9).unwrap();
        assert_eq!(legal_points(&state, Color::Black, KoRule::Simple).len(), 81);
        assert!(legal_points(&state, Color::White, KoRule::Simple).is_empty());

        let state = play_all(9, &[Some((1, 0)), Some((8, 8)), Some((0, 1))]);
        let legal = legal_points(&state, Color::White, KoRule::Simple);
        assert!(!legal.contains(&Point::new(0, 0)));
        assert_eq!(legal.len(), 81 - 4);
    }
}
