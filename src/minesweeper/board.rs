use bit_vec::BitVec;
use itertools::iproduct;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A board coordinate. Rows grow downwards, columns to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// At most eight cells surround any cell.
pub type Neighbours = SmallVec<[Cell; 8]>;

/// Errors raised while building a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// One of the dimensions is zero.
    #[error("board dimensions must be non-zero, got {height}x{width}")]
    EmptyBoard {
        /// Requested height.
        height: usize,
        /// Requested width.
        width: usize,
    },

    /// More mines were requested than the board has cells.
    #[error("cannot place {mines} mines on {cells} cells")]
    TooManyMines {
        /// Requested mines.
        mines: usize,
        /// Cells available.
        cells: usize,
    },

    /// A mine was placed outside the board.
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
}

/// A Minesweeper board: the observation source the agent plays against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minesweeper {
    height: usize,
    width: usize,
    mines: BitVec,
    mine_count: usize,
}

impl Minesweeper {
    fn empty(height: usize, width: usize) -> Result<Self, BoardError> {
        if height == 0 || width == 0 {
            return Err(BoardError::EmptyBoard { height, width });
        }
        Ok(Self {
            height,
            width,
            mines: BitVec::from_elem(height * width, false),
            mine_count: 0,
        })
    }

    /// A board with `mines` mines placed uniformly at random.
    ///
    /// # Errors
    ///
    /// `EmptyBoard` for a zero dimension, `TooManyMines` if the mines do not fit.
    pub fn new(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, BoardError> {
        let mut board = Self::empty(height, width)?;
        if mines > height * width {
            return Err(BoardError::TooManyMines {
                mines,
                cells: height * width,
            });
        }

        while board.mine_count != mines {
            let cell = Cell::new(rng.usize(..height), rng.usize(..width));
            board.place(cell);
        }
        Ok(board)
    }

    /// A board with mines at exactly the given cells.
    ///
    /// # Errors
    ///
    /// `EmptyBoard` for a zero dimension, `OutOfBounds` for a mine off the board.
    pub fn with_mines<I: IntoIterator<Item = Cell>>(
        height: usize,
        width: usize,
        mines: I,
    ) -> Result<Self, BoardError> {
        let mut board = Self::empty(height, width)?;
        for cell in mines {
            if !board.contains(cell) {
                return Err(BoardError::OutOfBounds(cell));
            }
            board.place(cell);
        }
        Ok(board)
    }

    fn place(&mut self, cell: Cell) {
        let i = self.index(cell);
        if !self.mines[i] {
            self.mines.set(i, true);
            self.mine_count += 1;
        }
    }

    const fn index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of mines on the board.
    #[must_use]
    pub const fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// `true` if `cell` lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// `true` if `cell` holds a mine. Cells off the board never do.
    #[must_use]
    pub fn is_mine(&self, cell: Cell) -> bool {
        self.contains(cell) && self.mines.get(self.index(cell)).unwrap_or(false)
    }

    /// The up to eight cells adjacent to `cell`, clipped to the board.
    #[must_use]
    pub fn neighbours(&self, cell: Cell) -> Neighbours {
        iproduct!(-1isize..=1, -1isize..=1)
            .filter(|&offset| offset != (0, 0))
            .filter_map(|(dr, dc)| {
                let row = cell.row.checked_add_signed(dr)?;
                let col = cell.col.checked_add_signed(dc)?;
                let neighbour = Cell::new(row, col);
                self.contains(neighbour).then_some(neighbour)
            })
            .collect()
    }

    /// Number of mines adjacent to `cell`, not counting the cell itself.
    #[must_use]
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        self.neighbours(cell)
            .into_iter()
            .filter(|&n| self.is_mine(n))
            .count()
    }

    /// Every cell on the board, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        iproduct!(0..self.height, 0..self.width).map(Cell::from)
    }

    /// Every mine on the board, row by row.
    pub fn mines(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(|&cell| self.is_mine(cell))
    }

    /// `true` if `flagged` is exactly the set of mines.
    #[must_use]
    pub fn won(&self, flagged: &FxHashSet<Cell>) -> bool {
        flagged.len() == self.mine_count && flagged.iter().all(|&cell| self.is_mine(cell))
    }
}

impl Display for Minesweeper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let separator = "--".repeat(self.width) + "-";
        for row in 0..self.height {
            writeln!(f, "{separator}")?;
            for col in 0..self.width {
                let mark = if self.is_mine(Cell::new(row, col)) { 'X' } else { ' ' };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        write!(f, "{separator}")
    }
}
