//! 2D cell arena.
//!
//! Cells live in one flat row-major vector, bottom row first. Everything
//! outside the grid reads as steel wall. Resolvers address cells by
//! position and copy them out; nothing keeps a reference into the vector
//! across a mutation.

use mine_core::{Cell, ObjectKind, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid must not be empty");
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::air(); size],
        }
    }

    /// Build a grid from row-major cells, bottom row first.
    pub fn from_cells(width: i32, height: i32, cells: Vec<Cell>) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let size = (width as usize).checked_mul(height as usize)?;
        if cells.len() != size {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid from text rows, top row first. Each character is mapped
    /// through `decode`; unknown characters yield `None`.
    pub fn from_rows<F>(rows: &[&str], mut decode: F) -> Option<Self>
    where
        F: FnMut(char) -> Option<Cell>,
    {
        let height = rows.len() as i32;
        let width = rows.first()?.chars().count() as i32;
        if width == 0 {
            return None;
        }
        let mut grid = Self::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() as i32 != width {
                return None;
            }
            let y = height - 1 - row as i32;
            for (x, ch) in line.chars().enumerate() {
                grid.set(Position::new(x as i32, y), decode(ch)?);
            }
        }
        Some(grid)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Copy of the cell at `pos`; steel wall outside the grid.
    pub fn get(&self, pos: Position) -> Cell {
        match self.index(pos) {
            Some(index) => self.cells[index],
            None => Cell::new(ObjectKind::SteelWall),
        }
    }

    pub fn kind(&self, pos: Position) -> ObjectKind {
        self.get(pos).kind
    }

    pub fn is_air(&self, pos: Position) -> bool {
        self.contains(pos) && self.get(pos).is_air()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        let index = self.index(pos)?;
        Some(&mut self.cells[index])
    }

    /// Set cell at position. Writing outside the grid is a caller bug.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        let index = self
            .index(pos)
            .unwrap_or_else(|| panic!("write outside grid at {}", pos));
        self.cells[index] = cell;
    }

    /// Replace the cell with air and return what was there.
    pub fn take(&mut self, pos: Position) -> Cell {
        let old = self.get(pos);
        self.set(pos, Cell::air());
        old
    }

    /// Mark the cell as processed in `turn`.
    pub fn stamp(&mut self, pos: Position, turn: u32) {
        if let Some(cell) = self.get_mut(pos) {
            cell.stamp = turn;
        }
    }

    pub fn is_stamped(&self, pos: Position, turn: u32) -> bool {
        self.get(pos).stamp == turn
    }

    /// Place `cell` at `pos` already stamped with `turn`, so the turn engine
    /// will not visit it again in the same tick.
    pub fn put(&mut self, pos: Position, mut cell: Cell, turn: u32) {
        cell.stamp = turn;
        self.set(pos, cell);
    }

    /// Move the content of `from` into `to`, leaving air behind. Both cells
    /// are stamped with `turn`.
    pub fn move_cell(&mut self, from: Position, to: Position, turn: u32) {
        let cell = self.take(from);
        self.stamp(from, turn);
        self.put(to, cell, turn);
    }

    /// Resize in place, keeping the overlapping bottom-left region.
    pub fn resize(&mut self, width: i32, height: i32) {
        let mut resized = Grid::new(width, height);
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                let pos = Position::new(x, y);
                resized.set(pos, self.get(pos));
            }
        }
        *self = resized;
    }

    /// Positions of the 3x3 block around `pos` (inside the grid), row-major
    /// from the bottom-left, together with their slot in that block.
    pub fn block(&self, pos: Position) -> Vec<(usize, Position)> {
        let mut block = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let slot = ((dy + 1) * 3 + dx + 1) as usize;
                let p = pos.add(dx, dy);
                if self.contains(p) {
                    block.push((slot, p));
                }
            }
        }
        block
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind).count()
    }

    /// Positions of all cells of `kind`, row-major.
    pub fn find(&self, kind: ObjectKind) -> Vec<Position> {
        self.iter()
            .filter(|(_, cell)| cell.kind == kind)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over all positions
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.positions().zip(self.cells.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::Flags;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 8);
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 8);
        assert_eq!(grid.len(), 80);
        assert!(grid.cells().iter().all(|c| c.is_air()));
    }

    #[test]
    fn test_outside_reads_as_steel() {
        let mut grid = Grid::new(4, 4);
        assert_eq!(grid.kind(Position::new(-1, 0)), ObjectKind::SteelWall);
        assert_eq!(grid.kind(Position::new(0, 4)), ObjectKind::SteelWall);
        assert!(!grid.is_air(Position::new(4, 0)));
        assert!(grid.get_mut(Position::new(0, -1)).is_none());
    }

    #[test]
    #[should_panic]
    fn test_write_outside_panics() {
        let mut grid = Grid::new(4, 4);
        grid.set(Position::new(4, 4), Cell::new(ObjectKind::Rock));
    }

    #[test]
    fn test_row_major_bottom_first() {
        let grid = Grid::new(3, 2);
        assert_eq!(grid.index(Position::new(0, 0)), Some(0));
        assert_eq!(grid.index(Position::new(2, 0)), Some(2));
        assert_eq!(grid.index(Position::new(0, 1)), Some(3));
        assert_eq!(grid.index_to_pos(4), Position::new(1, 1));
    }

    #[test]
    fn test_from_rows_top_first() {
        let grid = Grid::from_rows(&["r.", " #"], |ch| match ch {
            'r' => Some(Cell::new(ObjectKind::Rock)),
            '.' => Some(Cell::new(ObjectKind::Earth)),
            '#' => Some(Cell::new(ObjectKind::Wall)),
            ' ' => Some(Cell::air()),
            _ => None,
        })
        .unwrap();
        assert_eq!(grid.kind(Position::new(0, 1)), ObjectKind::Rock);
        assert_eq!(grid.kind(Position::new(1, 0)), ObjectKind::Wall);
        assert!(Grid::from_rows(&["r", "rr"], |_| Some(Cell::air())).is_none());
    }

    #[test]
    fn test_from_cells_checks_size() {
        assert!(Grid::from_cells(i32::MAX, i32::MAX, Vec::new()).is_none());
        assert!(Grid::from_cells(2, 0, Vec::new()).is_none());
        assert!(Grid::from_cells(2, 2, vec![Cell::air(); 3]).is_none());

        let grid = Grid::from_cells(2, 2, vec![Cell::air(); 4]).unwrap();
        let positions: Vec<_> = grid.iter().map(|(pos, _)| pos).collect();
        assert_eq!(positions[1], Position::new(1, 0));
        assert_eq!(positions[2], Position::new(0, 1));
    }

    #[test]
    fn test_move_cell_stamps_destination() {
        let mut grid = Grid::new(3, 3);
        let from = Position::new(1, 2);
        let to = Position::new(1, 1);
        grid.set(from, Cell::new(ObjectKind::Rock));

        grid.move_cell(from, to, 7);

        assert!(grid.get(from).is_air());
        assert!(grid.is_stamped(from, 7));
        assert_eq!(grid.kind(to), ObjectKind::Rock);
        assert!(grid.is_stamped(to, 7));
        assert!(grid.get(to).has(Flags::FALLABLE));
    }

    #[test]
    fn test_resize_keeps_overlap() {
        let mut grid = Grid::new(4, 4);
        grid.set(Position::new(1, 1), Cell::new(ObjectKind::Emerald));
        grid.set(Position::new(3, 3), Cell::new(ObjectKind::Rock));

        grid.resize(2, 3);

        assert_eq!(grid.len(), 6);
        assert_eq!(grid.kind(Position::new(1, 1)), ObjectKind::Emerald);
        assert_eq!(grid.count(ObjectKind::Rock), 0);
    }

    #[test]
    fn test_block_clips_at_edges() {
        let grid = Grid::new(5, 5);
        assert_eq!(grid.block(Position::new(2, 2)).len(), 9);

        let corner = grid.block(Position::new(0, 0));
        assert_eq!(corner.len(), 4);
        assert!(corner.contains(&(4, Position::new(0, 0))));
        assert!(corner.contains(&(8, Position::new(1, 1))));
    }
}
