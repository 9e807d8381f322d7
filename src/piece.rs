//! Pieces: the seven shapes, square-matrix rotation, and where the next kind comes from.

use crate::arena::{Cell, EMPTY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest piece side length (the I piece).
pub const MAX_PIECE_SIZE: usize = 4;

/// Piece kinds (I, O, T, S, Z, J, L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// Draw order for random selection.
    pub const ALL: [Self; 7] = [Self::I, Self::T, Self::J, Self::L, Self::O, Self::S, Self::Z];

    /// Colour index written into every occupied cell of this kind.
    pub fn color_index(self) -> Cell {
        match self {
            Self::I => 1,
            Self::L => 2,
            Self::J => 3,
            Self::O => 4,
            Self::Z => 5,
            Self::S => 6,
            Self::T => 7,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::I => 'I',
            Self::O => 'O',
            Self::T => 'T',
            Self::S => 'S',
            Self::Z => 'Z',
            Self::J => 'J',
            Self::L => 'L',
        }
    }
}

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn inverse(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Square cell matrix of side `size` (2..=4). Cells outside `size` stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    cells: [[Cell; MAX_PIECE_SIZE]; MAX_PIECE_SIZE],
}

impl Matrix {
    const fn new(size: usize, cells: [[Cell; MAX_PIECE_SIZE]; MAX_PIECE_SIZE]) -> Self {
        Self { size, cells }
    }

    /// Side length; the same as the width used by the wall-kick limit.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cell at local (x, y); empty outside the matrix.
    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.size && y < self.size {
            self.cells[y][x]
        } else {
            EMPTY
        }
    }

    /// Occupied cells as (local x, local y, value).
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        (0..self.size).flat_map(move |y| {
            (0..self.size).filter_map(move |x| {
                let value = self.cells[y][x];
                (value != EMPTY).then_some((x as i32, y as i32, value))
            })
        })
    }

    /// Rotate in place.
    /// Clockwise: `r[i][j] = m[n-1-j][i]`; counter-clockwise: `r[i][j] = m[j][n-1-i]`.
    pub fn rotate(&mut self, rotation: Rotation) {
        let n = self.size;
        let mut out = [[EMPTY; MAX_PIECE_SIZE]; MAX_PIECE_SIZE];
        for (i, row) in out.iter_mut().enumerate().take(n) {
            for (j, cell) in row.iter_mut().enumerate().take(n) {
                *cell = match rotation {
                    Rotation::Clockwise => self.cells[n - 1 - j][i],
                    Rotation::CounterClockwise => self.cells[j][n - 1 - i],
                };
            }
        }
        self.cells = out;
    }
}

/// A piece: its kind and current (possibly rotated) matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub matrix: Matrix,
}

impl Piece {
    #[inline]
    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.matrix.occupied()
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        self.matrix.rotate(rotation);
    }
}

/// Fresh piece of the given kind in its spawn orientation.
pub fn create_piece(kind: PieceKind) -> Piece {
    let matrix = match kind {
        PieceKind::I => Matrix::new(4, [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0]]),
        PieceKind::L => Matrix::new(3, [[0, 2, 0, 0], [0, 2, 0, 0], [0, 2, 2, 0], [0; 4]]),
        PieceKind::O => Matrix::new(2, [[4, 4, 0, 0], [4, 4, 0, 0], [0; 4], [0; 4]]),
        PieceKind::J => Matrix::new(3, [[0, 3, 0, 0], [0, 3, 0, 0], [3, 3, 0, 0], [0; 4]]),
        PieceKind::T => Matrix::new(3, [[7, 7, 7, 0], [0, 7, 0, 0], [0; 4], [0; 4]]),
        PieceKind::Z => Matrix::new(3, [[5, 5, 0, 0], [0, 5, 5, 0], [0; 4], [0; 4]]),
        PieceKind::S => Matrix::new(3, [[0, 6, 6, 0], [6, 6, 0, 0], [0; 4], [0; 4]]),
    };
    Piece { kind, matrix }
}

/// Supplies the kind of each newly spawned piece.
pub trait PieceSource {
    fn next_kind(&mut self) -> PieceKind;
}

/// Uniform random kinds.
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: StdRng,
}

impl RandomPieces {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomPieces {
    fn next_kind(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())]
    }
}

/// Fixed order, repeated forever.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct PieceSequence {
    kinds: Vec<PieceKind>,
    next: usize,
}

#[cfg(test)]
impl PieceSequence {
    /// An empty list behaves like `[PieceKind::O]`.
    pub fn new(kinds: Vec<PieceKind>) -> Self {
        let kinds = if kinds.is_empty() {
            vec![PieceKind::O]
        } else {
            kinds
        };
        Self { kinds, next: 0 }
    }
}

#[cfg(test)]
impl PieceSource for PieceSequence {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        kind
    }
}
