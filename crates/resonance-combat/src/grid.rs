//! The 3×3 battle grid.
//!
//! Row 2 is the front row; column 0 is the left edge. Every occupied cell
//! holds a living enemy: defeated enemies are taken off the grid immediately.

use crate::enemy::Enemy;
use resonance_common::{CommandError, EnemyUid};
use serde::{Deserialize, Serialize};

/// Grid side length.
pub const GRID_SIZE: usize = 3;

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Row (0 = back, 2 = front).
    pub row: usize,
    /// Column (0 = left).
    pub col: usize,
}

impl GridPos {
    /// Center cell, reserved for bosses.
    pub const CENTER: Self = Self { row: 1, col: 1 };

    /// Creates a position if it lies on the grid.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Option<Self> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Creates a position or reports it as out of range.
    pub fn checked(row: usize, col: usize) -> Result<Self, CommandError> {
        Self::new(row, col).ok_or(CommandError::OutOfRange { row, col })
    }

    /// All nine cells, row-major from the back row.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |col| Self { row, col }))
    }

    /// All cells in targeting priority: front row first, left to right.
    pub fn front_to_back() -> impl Iterator<Item = Self> {
        (0..GRID_SIZE)
            .rev()
            .flat_map(|row| (0..GRID_SIZE).map(move |col| Self { row, col }))
    }

    /// Orthogonal neighbors that lie on the grid.
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        let Self { row, col } = self;
        [
            row.checked_sub(1).map(|r| (r, col)),
            Some((row + 1, col)),
            col.checked_sub(1).map(|c| (row, c)),
            Some((row, col + 1)),
        ]
        .into_iter()
        .flatten()
        .filter_map(|(r, c)| Self::new(r, c))
    }
}

/// Owner of the enemies currently on the field.
#[derive(Debug, Clone, Default)]
pub struct BattleGrid {
    cells: [[Option<Enemy>; GRID_SIZE]; GRID_SIZE],
}

impl BattleGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enemy at a cell.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<&Enemy> {
        self.cells[pos.row][pos.col].as_ref()
    }

    /// Mutable enemy at a cell.
    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut Enemy> {
        self.cells[pos.row][pos.col].as_mut()
    }

    /// Places an enemy on an empty cell.
    ///
    /// Returns the enemy back if the cell is taken.
    pub fn place(&mut self, pos: GridPos, enemy: Enemy) -> Result<(), Enemy> {
        let cell = &mut self.cells[pos.row][pos.col];
        if cell.is_some() {
            return Err(enemy);
        }
        *cell = Some(enemy);
        Ok(())
    }

    /// Removes and returns the enemy at a cell.
    pub fn take(&mut self, pos: GridPos) -> Option<Enemy> {
        self.cells[pos.row][pos.col].take()
    }

    /// Empties the grid.
    pub fn clear(&mut self) {
        self.cells = Default::default();
    }

    /// Whether any enemy remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Occupied cells, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Enemy)> {
        GridPos::all().filter_map(|pos| self.get(pos).map(|enemy| (pos, enemy)))
    }

    /// Mutable access to every enemy.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.cells.iter_mut().flatten().filter_map(Option::as_mut)
    }

    /// Where an enemy stands.
    #[must_use]
    pub fn find(&self, uid: EnemyUid) -> Option<GridPos> {
        self.iter()
            .find(|(_, enemy)| enemy.uid == uid)
            .map(|(pos, _)| pos)
    }

    /// Enemy by uid.
    #[must_use]
    pub fn enemy(&self, uid: EnemyUid) -> Option<&Enemy> {
        self.find(uid).and_then(|pos| self.get(pos))
    }

    /// Mutable enemy by uid.
    pub fn enemy_mut(&mut self, uid: EnemyUid) -> Option<&mut Enemy> {
        let pos = self.find(uid)?;
        self.get_mut(pos)
    }

    /// Front-most, left-most occupied cell.
    #[must_use]
    pub fn front_most(&self) -> Option<GridPos> {
        GridPos::front_to_back().find(|&pos| self.get(pos).is_some())
    }

    /// Enemies in a row, left to right.
    #[must_use]
    pub fn in_row(&self, row: usize) -> Vec<EnemyUid> {
        self.iter()
            .filter(|(pos, _)| pos.row == row)
            .map(|(_, enemy)| enemy.uid)
            .collect()
    }

    /// Enemies in a column, back to front.
    #[must_use]
    pub fn in_column(&self, col: usize) -> Vec<EnemyUid> {
        self.iter()
            .filter(|(pos, _)| pos.col == col)
            .map(|(_, enemy)| enemy.uid)
            .collect()
    }

    /// Enemies orthogonally adjacent to a cell.
    #[must_use]
    pub fn adjacent(&self, pos: GridPos) -> Vec<EnemyUid> {
        pos.neighbors()
            .filter_map(|p| self.get(p).map(|enemy| enemy.uid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::test_enemy;

    #[test]
    fn test_position_bounds() {
        assert!(GridPos::new(2, 2).is_some());
        assert!(GridPos::new(3, 0).is_none());
        assert_eq!(
            GridPos::checked(0, 5),
            Err(CommandError::OutOfRange { row: 0, col: 5 })
        );
        assert_eq!(GridPos::all().count(), 9);
    }

    #[test]
    fn test_neighbors() {
        let corner: Vec<_> = GridPos { row: 0, col: 0 }.neighbors().collect();
        assert_eq!(corner.len(), 2);
        assert_eq!(GridPos::CENTER.neighbors().count(), 4);
    }

    #[test]
    fn test_place_rejects_occupied() {
        let mut grid = BattleGrid::new();
        assert!(grid.place(GridPos::CENTER, test_enemy(1, None, 10.0)).is_ok());
        assert!(grid.place(GridPos::CENTER, test_enemy(2, None, 10.0)).is_err());
        assert_eq!(grid.occupied(), 1);
    }

    #[test]
    fn test_front_most_prefers_front_left() {
        let mut grid = BattleGrid::new();
        assert_eq!(grid.front_most(), None);

        let back = GridPos { row: 0, col: 0 };
        let front_right = GridPos { row: 2, col: 2 };
        let front_mid = GridPos { row: 2, col: 1 };
        assert!(grid.place(back, test_enemy(1, None, 10.0)).is_ok());
        assert_eq!(grid.front_most(), Some(back));
        assert!(grid.place(front_right, test_enemy(2, None, 10.0)).is_ok());
        assert!(grid.place(front_mid, test_enemy(3, None, 10.0)).is_ok());
        assert_eq!(grid.front_most(), Some(front_mid));
    }

    #[test]
    fn test_area_queries() {
        let mut grid = BattleGrid::new();
        for (i, pos) in GridPos::all().enumerate() {
            assert!(grid.place(pos, test_enemy(i as u64, None, 10.0)).is_ok());
        }
        assert_eq!(grid.in_row(2).len(), 3);
        assert_eq!(grid.in_column(0).len(), 3);
        assert_eq!(grid.adjacent(GridPos::CENTER).len(), 4);
        assert_eq!(grid.find(EnemyUid::new(4)), Some(GridPos::CENTER));

        grid.take(GridPos::CENTER);
        assert_eq!(grid.occupied(), 8);
        grid.clear();
        assert!(grid.is_empty());
    }
}
