//! Connected groups and their liberties.
//!
//! Groups are never stored; they are recomputed from the board on demand.
//! At 19x19 and below a flood fill per query is cheap enough.

use std::collections::{BTreeSet, VecDeque};

use crate::board::{Board, Cell, Color, Point};

/// A maximal 4-connected set of same-colored stones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Color of the stones, `None` for the empty group.
    pub color: Option<Color>,
    pub stones: BTreeSet<Point>,
    /// Distinct empty points adjacent to any member.
    pub liberties: BTreeSet<Point>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn liberty_count(&self) -> usize {
        self.liberties.len()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.stones.contains(&p)
    }
}

/// Collects the group containing `start` and its liberties.
///
/// Breadth-first over same-colored neighbors. An empty `start` yields an
/// empty group with no liberties. Shared liberties are counted once.
pub fn group_and_liberties(board: &Board, start: Point) -> Group {
    let Some(color) = board.at(start).color() else {
        return Group::default();
    };
    let stone = Cell::from(color);

    let mut visited = vec![false; board.size() * board.size()];
    let mut queue = VecDeque::from([start]);
    let mut group = Group {
        color: Some(color),
        ..Group::default()
    };
    visited[start.y * board.size() + start.x] = true;

    while let Some(pt) = queue.pop_front() {
        group.stones.insert(pt);
        for n in board.neighbors(pt) {
            match board.at(n) {
                Cell::Empty => {
                    group.liberties.insert(n);
                }
                c if c == stone => {
                    let i = n.y * board.size() + n.x;
                    if !visited[i] {
                        visited[i] = true;
                        queue.push_back(n);
                    }
                }
                _ => {}
            }
        }
    }
    group
}
