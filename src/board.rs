//! Immutable square board of stones.
//!
//! A [`Board`] never changes after construction: [`Board::with`] and
//! [`Board::without`] return new values. Cells live behind an `Arc`, so
//! cloning a board (for history or snapshots) does not copy the grid.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::constants::{SYMBOL_BLACK, SYMBOL_EMPTY, SYMBOL_WHITE};

/// Stone color, also used to name the players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Black moves first.
    #[display("black")]
    Black,
    /// White.
    #[display("white")]
    White,
}

impl Color {
    /// Returns the other color.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// Error returned when a color name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unknown color: {name}")]
pub struct ParseColorError {
    /// The rejected input.
    pub name: String,
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Ok(Color::Black),
            "w" | "white" => Ok(Color::White),
            _ => Err(ParseColorError { name: s.to_string() }),
        }
    }
}

/// Content of a single board point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Cell {
    /// The stone color on this cell, if any.
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => SYMBOL_EMPTY,
            Cell::Black => SYMBOL_BLACK,
            Cell::White => SYMBOL_WHITE,
        }
    }
}

impl From<Color> for Cell {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }
}

impl From<Option<Color>> for Cell {
    fn from(color: Option<Color>) -> Self {
        color.map_or(Cell::Empty, Cell::from)
    }
}

/// A coordinate on the board. `x` is the column, `y` the row, both from zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[display("({x}, {y})")]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A coordinate fell outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("({x}, {y}) is outside the {size}x{size} board")]
pub struct OutOfBounds {
    pub x: i64,
    pub y: i64,
    pub size: usize,
}

/// Square grid of cells, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Arc<[Cell]>,
}

impl Board {
    /// Creates an empty board with side length `size`.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size].into(),
        }
    }

    /// Builds a board from row-major cells. Returns `None` unless exactly
    /// `size * size` cells are supplied.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Option<Self> {
        (cells.len() == size * size).then(|| Self {
            size,
            cells: cells.into(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, p: Point) -> usize {
        assert!(self.contains(p), "point {p} outside {size}x{size} board", size = self.size);
        p.y * self.size + p.x
    }

    /// Returns `true` if `p` lies on the grid.
    pub fn contains(&self, p: Point) -> bool {
        p.x < self.size && p.y < self.size
    }

    /// Validates caller-supplied coordinates, which may be negative.
    pub fn point(&self, x: i64, y: i64) -> Result<Point, OutOfBounds> {
        let oob = OutOfBounds {
            x,
            y,
            size: self.size,
        };
        let (Ok(px), Ok(py)) = (usize::try_from(x), usize::try_from(y)) else {
            return Err(oob);
        };
        let p = Point::new(px, py);
        if self.contains(p) { Ok(p) } else { Err(oob) }
    }

    /// Cell at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Result<Cell, OutOfBounds> {
        let p = Point::new(x, y);
        if !self.contains(p) {
            return Err(OutOfBounds {
                x: i64::try_from(x).unwrap_or(i64::MAX),
                y: i64::try_from(y).unwrap_or(i64::MAX),
                size: self.size,
            });
        }
        Ok(self.cells[self.idx(p)])
    }

    /// Cell at a point already known to be on the grid.
    ///
    /// Panics if `p` is off the grid; callers obtain points from
    /// [`Board::point`] or [`Board::neighbors`].
    pub fn at(&self, p: Point) -> Cell {
        self.cells[self.idx(p)]
    }

    /// Returns a new board with `p` set to `cell`.
    pub fn with(&self, p: Point, cell: Cell) -> Board {
        let mut cells = self.cells.to_vec();
        cells[self.idx(p)] = cell;
        Board {
            size: self.size,
            cells: cells.into(),
        }
    }

    /// Returns a new board with every point in `points` emptied.
    pub fn without<'a>(&self, points: impl IntoIterator<Item = &'a Point>) -> Board {
        let mut cells = self.cells.to_vec();
        for &p in points {
            cells[self.idx(p)] = Cell::Empty;
        }
        Board {
            size: self.size,
            cells: cells.into(),
        }
    }

    /// The up to four orthogonal neighbors of `p` that lie on the grid.
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        let Point { x, y } = p;
        let mut v = Vec::with_capacity(4);
        if x > 0 {
            v.push(Point::new(x - 1, y));
        }
        if x + 1 < s {
            v.push(Point::new(x + 1, y));
        }
        if y > 0 {
            v.push(Point::new(x, y - 1));
        }
        if y + 1 < s {
            v.push(Point::new(x, y + 1));
        }
        v.into_iter()
    }

    /// Every point on the grid in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        (0..s).flat_map(move |y| (0..s).map(move |x| Point::new(x, y)))
    }

    /// Number of stones of `color` on the board.
    pub fn stone_count(&self, color: Color) -> usize {
        let cell = Cell::from(color);
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size == 0 {
            return Ok(());
        }
        for row in self.cells.chunks(self.size) {
            let line: Vec<String> = row.iter().map(|c| c.symbol().to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
