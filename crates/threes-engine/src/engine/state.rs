use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ops;

/// A direction to shift/merge tiles. Left/Right operate on rows, Up/Down on
/// columns; Right and Down reuse the left-transform through line reversal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn token(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    /// Parse one of the lowercase command tokens. Rejecting the token here,
    /// before any board method runs, is what keeps a bad command from ever
    /// touching game state.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(GameError::InvalidDirection(other.to_string())),
        }
    }
}

/// A single board cell: empty, one of the two base tile kinds, or a merged
/// sum.
///
/// "No tile" is its own variant rather than a zero value, so a cell's rank
/// can never be confused with the absence of a tile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cell {
    Empty,
    One,
    Two,
    Sum(u32),
}

impl Cell {
    /// Numeric value the cell contributes to merges and scoring; `None` for
    /// an empty slot.
    #[inline]
    pub fn rank(self) -> Option<u32> {
        match self {
            Cell::Empty => None,
            Cell::One => Some(1),
            Cell::Two => Some(2),
            Cell::Sum(n) => Some(n),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("."),
            Cell::One => f.write_str("1"),
            Cell::Two => f.write_str("2"),
            Cell::Sum(n) => write!(f, "{}", n),
        }
    }
}

/// Errors surfaced by board construction and the checked line accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Board constructed with a zero row or column count.
    InvalidDimension { rows: usize, columns: usize },
    /// A command token that names no direction.
    InvalidDirection(String),
    /// Row or column index outside the board.
    IndexOutOfRange { index: usize, limit: usize },
    /// A line whose length does not match the board edge it is written to.
    LineLengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidDimension { rows, columns } => {
                write!(f, "board dimensions must be positive, got {rows}x{columns}")
            }
            GameError::InvalidDirection(token) => {
                write!(f, "unknown direction {token:?}, expected left, right, up or down")
            }
            GameError::IndexOutOfRange { index, limit } => {
                write!(f, "index {index} out of range for length {limit}")
            }
            GameError::LineLengthMismatch { expected, actual } => {
                write!(f, "expected a line of {expected} cells, got {actual}")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Running merge score for one game session. Owned by the board, only ever
/// increases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    total: u64,
}

impl Score {
    #[inline]
    pub fn add(&mut self, value: u64) {
        self.total += value;
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.total
    }
}

/// Rectangular tile grid with its running score.
///
/// Cells are stored row-major; dimensions are fixed at construction and
/// never change across moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
    rows: usize,
    columns: usize,
    score: Score,
}

impl Board {
    /// Build a randomly populated board using the provided RNG.
    ///
    /// `fill_ratio` is the fraction of cells seeded with a starting tile,
    /// clamped to `[0, 1]`.
    ///
    /// Deterministic example using a seeded RNG:
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use threes_engine::engine::Board;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let board = Board::new(3, 3, 0.5, &mut rng).unwrap();
    /// let tiles = board.cells().iter().filter(|c| !c.is_empty()).count();
    /// assert_eq!(tiles, 5); // ceil(0.5 * 9)
    /// ```
    pub fn new<R: Rng + ?Sized>(
        rows: usize,
        columns: usize,
        fill_ratio: f64,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if rows == 0 || columns == 0 {
            return Err(GameError::InvalidDimension { rows, columns });
        }
        let cells = ops::populate(rows, columns, fill_ratio, rng);
        Ok(Board {
            cells,
            rows,
            columns,
            score: Score::default(),
        })
    }

    /// Convenience: like `new` but uses the thread-local RNG.
    pub fn new_thread(rows: usize, columns: usize, fill_ratio: f64) -> Result<Self, GameError> {
        let mut rng = rand::thread_rng();
        Self::new(rows, columns, fill_ratio, &mut rng)
    }

    /// Construct a board from explicit cells (row-major), score zero.
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<Cell>) -> Result<Self, GameError> {
        if rows == 0 || columns == 0 {
            return Err(GameError::InvalidDimension { rows, columns });
        }
        if cells.len() != rows * columns {
            return Err(GameError::LineLengthMismatch {
                expected: rows * columns,
                actual: cells.len(),
            });
        }
        Ok(Board {
            cells,
            rows,
            columns,
            score: Score::default(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// All cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Total value of all merges made so far.
    #[inline]
    pub fn score(&self) -> u64 {
        self.score.value()
    }

    /// Checked row read.
    pub fn get_row(&self, index: usize) -> Result<Vec<Cell>, GameError> {
        if index >= self.rows {
            return Err(GameError::IndexOutOfRange {
                index,
                limit: self.rows,
            });
        }
        Ok(self.row(index))
    }

    /// Checked column read.
    pub fn get_column(&self, index: usize) -> Result<Vec<Cell>, GameError> {
        if index >= self.columns {
            return Err(GameError::IndexOutOfRange {
                index,
                limit: self.columns,
            });
        }
        Ok(self.column(index))
    }

    /// Checked row write; `values` must span the full row.
    pub fn set_row(&mut self, index: usize, values: &[Cell]) -> Result<(), GameError> {
        if index >= self.rows {
            return Err(GameError::IndexOutOfRange {
                index,
                limit: self.rows,
            });
        }
        if values.len() != self.columns {
            return Err(GameError::LineLengthMismatch {
                expected: self.columns,
                actual: values.len(),
            });
        }
        self.write_row(index, values);
        Ok(())
    }

    /// Checked column write; `values` must span the full column.
    pub fn set_column(&mut self, index: usize, values: &[Cell]) -> Result<(), GameError> {
        if index >= self.columns {
            return Err(GameError::IndexOutOfRange {
                index,
                limit: self.columns,
            });
        }
        if values.len() != self.rows {
            return Err(GameError::LineLengthMismatch {
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.write_column(index, values);
        Ok(())
    }

    /// Shift and merge every line in `direction`, then spawn replacement
    /// tiles on the trailing edge of each line that moved.
    ///
    /// Lines whose pure transform leaves them unchanged are skipped
    /// entirely: no write-back, no score update, and no randomness drawn.
    /// That keeps a finished board frozen no matter how often it is moved.
    pub fn make_move<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) {
        match direction {
            Direction::Left | Direction::Right => {
                for index in 0..self.rows {
                    let mut line = self.row(index);
                    if direction == Direction::Right {
                        line.reverse();
                    }
                    let (mut moved, gained) = ops::shift_line(&line);
                    if moved == line {
                        continue;
                    }
                    self.score.add(gained);
                    ops::spawn_tile(&mut moved, rng);
                    if direction == Direction::Right {
                        moved.reverse();
                    }
                    self.write_row(index, &moved);
                }
            }
            Direction::Up | Direction::Down => {
                for index in 0..self.columns {
                    let mut line = self.column(index);
                    if direction == Direction::Down {
                        line.reverse();
                    }
                    let (mut moved, gained) = ops::shift_line(&line);
                    if moved == line {
                        continue;
                    }
                    self.score.add(gained);
                    ops::spawn_tile(&mut moved, rng);
                    if direction == Direction::Down {
                        moved.reverse();
                    }
                    self.write_column(index, &moved);
                }
            }
        }
    }

    /// Convenience: like `make_move` but uses the thread-local RNG.
    pub fn make_move_thread(&mut self, direction: Direction) {
        let mut rng = rand::thread_rng();
        self.make_move(direction, &mut rng);
    }

    /// True if no move in any direction changes the board.
    ///
    /// Every row and column is dry-run through the pure line transform in
    /// both orientations; a line can be immovable left-to-right yet movable
    /// right-to-left, so both must be checked. Nothing is mutated and no
    /// randomness is drawn.
    ///
    /// ```
    /// use threes_engine::engine::{Board, Cell};
    ///
    /// let stuck = Board::from_cells(
    ///     2,
    ///     2,
    ///     vec![Cell::One, Cell::Sum(3), Cell::Sum(6), Cell::One],
    /// )
    /// .unwrap();
    /// assert!(stuck.is_game_over());
    /// ```
    pub fn is_game_over(&self) -> bool {
        let lines = (0..self.rows)
            .map(|index| self.row(index))
            .chain((0..self.columns).map(|index| self.column(index)));
        for mut line in lines {
            if ops::shift_line(&line).0 != line {
                return false;
            }
            line.reverse();
            if ops::shift_line(&line).0 != line {
                return false;
            }
        }
        true
    }

    fn row(&self, index: usize) -> Vec<Cell> {
        self.cells[index * self.columns..(index + 1) * self.columns].to_vec()
    }

    fn column(&self, index: usize) -> Vec<Cell> {
        (0..self.rows)
            .map(|row| self.cells[row * self.columns + index])
            .collect()
    }

    fn write_row(&mut self, index: usize, values: &[Cell]) {
        self.cells[index * self.columns..(index + 1) * self.columns].copy_from_slice(values);
    }

    fn write_column(&mut self, index: usize, values: &[Cell]) {
        for (row, &value) in values.iter().enumerate() {
            self.cells[row * self.columns + index] = value;
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.rows {
            for cell in &self.cells[index * self.columns..(index + 1) * self.columns] {
                write!(f, "|{}\t", cell)?;
            }
            writeln!(f, "|")?;
        }
        Ok(())
    }
}
