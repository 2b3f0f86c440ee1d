use std::fmt;

use serde::{Deserialize, Serialize};

use super::{MoveError, Player};
use crate::error::BoardShapeError;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
pub const WIN_LENGTH: usize = 4;

/// Scan order for win detection: horizontal, vertical, diagonal down-right,
/// diagonal down-left. The first axis that wins is the one reported.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Red,
    Yellow,
}

impl Cell {
    /// The player occupying this cell, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Red => Some(Player::Red),
            Cell::Yellow => Some(Player::Yellow),
        }
    }
}

/// A rectangular Connect Four grid.
///
/// Row 0 is the top, row `rows - 1` is the bottom. Pieces fall toward higher
/// row indices, so a cell below an occupied cell is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Board {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Create an empty 6x7 board.
    pub fn standard() -> Self {
        Self::new(ROWS, COLS)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get the cell at a specific position. Out-of-range positions read as empty.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        if row >= self.rows || col >= self.cols {
            return Cell::Empty;
        }
        self.cells[row * self.cols + col]
    }

    fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.cols + col] = cell;
    }

    /// True iff `col` is on the board and its top cell is empty.
    pub fn is_valid_move(&self, col: usize) -> bool {
        col < self.cols && self.rows > 0 && self.get(0, col) == Cell::Empty
    }

    /// Row a piece dropped into `col` would land on, scanning up from the
    /// bottom. `None` if the column is full or out of range.
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        (0..self.rows)
            .rev()
            .find(|&row| self.get(row, col) == Cell::Empty)
    }

    /// Columns that can still take a piece, ascending.
    pub fn valid_columns(&self) -> Vec<usize> {
        (0..self.cols).filter(|&col| self.is_valid_move(col)).collect()
    }

    /// Return a copy of the board with `cell` dropped into `col`.
    ///
    /// A full or out-of-range column yields an unchanged copy; check
    /// [`Board::is_valid_move`] first.
    pub fn apply_move(&self, col: usize, cell: Cell) -> Board {
        let mut next = self.clone();
        let _ = next.drop_piece(col, cell);
        next
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, MoveError> {
        if col >= self.cols {
            return Err(MoveError::InvalidColumn(col));
        }
        let row = self.lowest_empty_row(col).ok_or(MoveError::ColumnFull(col))?;
        self.set(row, col, cell);
        Ok(row)
    }

    /// Check whether the piece at (row, col) completes a line of `win_length`.
    ///
    /// Axes are scanned in the order horizontal, vertical, down-right,
    /// down-left. The returned line holds exactly `win_length` distinct
    /// cells including the origin, sorted by (row, col). For runs longer
    /// than `win_length` the earliest window containing the origin is used.
    pub fn check_win(
        &self,
        row: usize,
        col: usize,
        cell: Cell,
        win_length: usize,
    ) -> Option<Vec<(usize, usize)>> {
        if cell == Cell::Empty || win_length == 0 || self.get(row, col) != cell {
            return None;
        }

        for (dr, dc) in DIRECTIONS {
            let mut line = vec![(row, col)];
            line.extend(self.run(row, col, dr, dc, cell));
            line.extend(self.run(row, col, -dr, -dc, cell));

            if line.len() >= win_length {
                line.sort_unstable();
                let origin = line
                    .iter()
                    .position(|&pos| pos == (row, col))
                    .unwrap_or(0);
                let start = origin
                    .saturating_sub(win_length - 1)
                    .min(line.len() - win_length);
                return Some(line[start..start + win_length].to_vec());
            }
        }

        None
    }

    /// Contiguous cells equal to `cell`, walking away from (row, col).
    fn run(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while r >= 0
            && c >= 0
            && (r as usize) < self.rows
            && (c as usize) < self.cols
            && self.get(r as usize, c as usize) == cell
        {
            cells.push((r as usize, c as usize));
            r += dr;
            c += dc;
        }
        cells
    }

    /// True iff every column's top cell is occupied.
    ///
    /// Says nothing about wins: a board filled by a winning move is a win.
    pub fn check_draw(&self) -> bool {
        (0..self.cols).all(|col| self.get(0, col) != Cell::Empty)
    }

    /// Number of occupied cells.
    pub fn piece_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Cell::Empty).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = BoardShapeError;

    fn try_from(grid: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(BoardShapeError::Empty);
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in grid.into_iter().enumerate() {
            if line.len() != cols {
                return Err(BoardShapeError::Ragged {
                    row,
                    found: line.len(),
                    expected: cols,
                });
            }
            cells.extend(line);
        }
        Ok(Board { rows, cols, cells })
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board
            .cells
            .chunks(board.cols.max(1))
            .map(<[Cell]>::to_vec)
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let symbol = match self.get(row, col) {
                    Cell::Empty => '.',
                    Cell::Red => 'R',
                    Cell::Yellow => 'Y',
                };
                write!(f, " {symbol}")?;
            }
            writeln!(f)?;
        }
        for col in 0..self.cols {
            write!(f, " {}", col % 10)?;
        }
        Ok(())
    }
}
