//! Arena: the grid of locked blocks, merging a piece into it, and collision.

use crate::piece::Piece;
use std::collections::VecDeque;

/// Cell value: 0 is empty, 1..=7 a colour index.
pub type Cell = u8;

pub const EMPTY: Cell = 0;

/// Offset of a piece's top-left matrix corner in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grid of cells. y=0 is top; rows are stored [0..height].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    /// All-empty grid of `width` columns and `height` rows.
    pub fn new(width: u16, height: u16) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self {
            width: w,
            height: h,
            rows: (0..h).map(|_| vec![EMPTY; w]).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at (x, y), or `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Writes are dropped outside the grid.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Empty every cell; dimensions are kept.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(EMPTY);
        }
    }

    /// Number of non-empty cells.
    #[cfg(test)]
    pub fn filled_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|&&c| c != EMPTY).count())
            .sum()
    }

    /// Write the piece's occupied cells at `pos`.
    /// Only meaningful for a placement where `collides` is false.
    pub fn merge(&mut self, piece: &Piece, pos: Position) {
        for (x, y, value) in piece.occupied() {
            self.set(pos.x + x, pos.y + y, value);
        }
    }

    /// True if any occupied cell of `piece` at `pos` is outside the grid or on a locked cell.
    pub fn collides(&self, piece: &Piece, pos: Position) -> bool {
        piece
            .occupied()
            .any(|(x, y, _)| self.get(pos.x + x, pos.y + y) != Some(EMPTY))
    }

    pub(crate) fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|&c| c != EMPTY))
    }

    /// Remove row `y` and push an empty row on top; rows above `y` shift down by one.
    pub(crate) fn collapse_row(&mut self, y: usize) {
        if let Some(mut row) = self.rows.remove(y) {
            row.fill(EMPTY);
            self.rows.push_front(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{PieceKind, create_piece};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(12, 20);
        assert_eq!(grid.width(), 12);
        assert_eq!(grid.height(), 20);
        assert_eq!(grid.rows().count(), 20);
        assert!(grid.rows().all(|row| row.len() == 12));
        assert_eq!(grid.filled_cells(), 0);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let grid = Grid::new(12, 20);
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(0, -1), None);
        assert_eq!(grid.get(12, 0), None);
        assert_eq!(grid.get(0, 20), None);
        assert_eq!(grid.get(11, 19), Some(EMPTY));
    }

    #[test]
    fn test_set_out_of_bounds_is_ignored() {
        let mut grid = Grid::new(4, 4);
        grid.set(-1, 0, 3);
        grid.set(4, 0, 3);
        grid.set(0, 4, 3);
        assert_eq!(grid.filled_cells(), 0);
        grid.set(2, 3, 3);
        assert_eq!(grid.get(2, 3), Some(3));
    }

    #[test]
    fn test_clear_keeps_dimensions() {
        let mut grid = Grid::new(6, 5);
        grid.set(1, 1, 2);
        grid.set(5, 4, 7);
        grid.clear();
        assert_eq!(grid, Grid::new(6, 5));
    }

    #[test]
    fn test_merge_writes_piece_colour() {
        let mut grid = Grid::new(12, 20);
        let piece = create_piece(PieceKind::T);
        grid.merge(&piece, Position::new(3, 10));
        assert_eq!(grid.get(3, 10), Some(7));
        assert_eq!(grid.get(4, 10), Some(7));
        assert_eq!(grid.get(5, 10), Some(7));
        assert_eq!(grid.get(4, 11), Some(7));
        assert_eq!(grid.get(3, 11), Some(EMPTY));
        assert_eq!(grid.filled_cells(), 4);
    }

    #[test]
    fn test_collides_with_walls_and_floor() {
        let grid = Grid::new(12, 20);
        let piece = create_piece(PieceKind::O);
        assert!(!grid.collides(&piece, Position::new(0, 0)));
        assert!(!grid.collides(&piece, Position::new(10, 18)));
        assert!(grid.collides(&piece, Position::new(-1, 0)));
        assert!(grid.collides(&piece, Position::new(11, 0)));
        assert!(grid.collides(&piece, Position::new(0, 19)));
        assert!(grid.collides(&piece, Position::new(0, -1)));
    }

    #[test]
    fn test_empty_matrix_cells_may_hang_outside() {
        // The I piece's occupied column is x=1; column 0 of its matrix is empty.
        let grid = Grid::new(12, 20);
        let piece = create_piece(PieceKind::I);
        assert!(!grid.collides(&piece, Position::new(-1, 0)));
        assert!(grid.collides(&piece, Position::new(-2, 0)));
    }

    #[test]
    fn test_collides_with_locked_cell() {
        let mut grid = Grid::new(12, 20);
        grid.set(5, 10, 1);
        let piece = create_piece(PieceKind::O);
        assert!(grid.collides(&piece, Position::new(4, 9)));
        assert!(grid.collides(&piece, Position::new(5, 10)));
        assert!(!grid.collides(&piece, Position::new(6, 10)));
        assert!(!grid.collides(&piece, Position::new(4, 11)));
    }

    #[test]
    fn test_collides_matches_brute_force_on_random_grids() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..500 {
            let (w, h) = (rng.gen_range(4..=12u16), rng.gen_range(4..=20u16));
            let mut grid = Grid::new(w, h);
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    if rng.gen_bool(0.3) {
                        grid.set(x, y, rng.gen_range(1..=7));
                    }
                }
            }
            let kind = PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())];
            let piece = create_piece(kind);
            let pos = Position::new(rng.gen_range(-4..w as i32 + 2), rng.gen_range(-4..h as i32 + 2));

            let mut expected = false;
            for ly in 0..piece.size() {
                for lx in 0..piece.size() {
                    if piece.matrix.get(lx, ly) == EMPTY {
                        continue;
                    }
                    let (gx, gy) = (pos.x + lx as i32, pos.y + ly as i32);
                    let inside = gx >= 0 && gy >= 0 && gx < w as i32 && gy < h as i32;
                    if !inside || grid.get(gx, gy) != Some(EMPTY) {
                        expected = true;
                    }
                }
            }
            assert_eq!(grid.collides(&piece, pos), expected, "{:?} at {:?}", kind, pos);
        }
    }

    #[test]
    fn test_collapse_row_shifts_rows_above() {
        let mut grid = Grid::new(3, 4);
        grid.set(0, 1, 5);
        grid.set(1, 2, 6);
        grid.collapse_row(2);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.get(0, 2), Some(5));
        assert_eq!(grid.get(1, 2), Some(EMPTY));
        assert!(grid.rows().next().is_some_and(|top| top.iter().all(|&c| c == EMPTY)));
    }
}
