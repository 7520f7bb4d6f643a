#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cave state owned by the generation pipeline.
//!
//! A [`Grid`] is mutated exclusively by the carving and repair systems during
//! a single attempt and handed off read-only afterwards. The [`OpenTileSet`]
//! and [`NavGraph`] are derived from the finished grid and describe two
//! distinct open-cell sets: padded placement candidates and every navigable
//! cell respectively.

use abyssal_core::{CellCoord, CellState};

mod navigation;
mod open_tiles;

pub use navigation::{NavGraph, NavNode};
pub use open_tiles::OpenTileSet;

/// Dense two-dimensional cave grid stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates a grid where every cell is wall.
    #[must_use]
    pub fn walled(width: u32, height: u32) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![CellState::Wall; len],
        }
    }

    /// Builds a grid from text rows where `.` is open and any other byte is wall.
    ///
    /// All rows must share the length of the first row.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let width = rows
            .first()
            .map_or(0, |row| u32::try_from(row.len()).unwrap_or(u32::MAX));
        let mut grid = Self::walled(width, height);

        for (row_index, row) in (0..height).zip(rows) {
            debug_assert_eq!(row.len(), rows[0].len(), "ragged grid rows");
            for (column, byte) in (0..width).zip(row.bytes()) {
                if byte == b'.' {
                    grid.set(CellCoord::new(column, row_index), CellState::Open);
                }
            }
        }

        grid
    }

    /// Width of the grid in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the grid in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Reports whether the cell lies on the outermost ring of the grid.
    #[must_use]
    pub const fn is_border(&self, cell: CellCoord) -> bool {
        cell.column() == 0
            || cell.row() == 0
            || cell.column() + 1 == self.width
            || cell.row() + 1 == self.height
    }

    /// State stored at the cell, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// State stored at the cell; cells outside the grid read as wall.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.get(cell).unwrap_or(CellState::Wall)
    }

    /// Reports whether the cell is open water.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.state(cell).is_open()
    }

    /// Overwrites the state of a cell. Cells outside the grid are ignored.
    pub fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = state;
        }
    }

    /// Cell states in row-major order.
    #[must_use]
    pub fn states(&self) -> &[CellState] {
        &self.cells
    }

    /// Every coordinate of the grid, column by column.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let height = self.height;
        (0..self.width)
            .flat_map(move |column| (0..height).map(move |row| CellCoord::new(column, row)))
    }

    /// Number of open cells.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|state| state.is_open()).count()
    }

    /// Open cells as a percentage of all cells.
    #[must_use]
    pub fn density(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.open_count() as f32 / self.cells.len() as f32 * 100.0
    }

    /// Sums the states of the eight ring samples at the given radius.
    ///
    /// The samples sit at offsets `(-r, 0)`, `(-1, -1)`, `(0, -r)`, `(r, -r)`,
    /// `(r, 0)`, `(r, r)`, `(0, r)` and `(-r, r)`; note the upper-left sample
    /// stays at distance one for every radius. Samples whose guard falls
    /// outside the grid contribute nothing.
    #[must_use]
    pub fn neighbor_count(&self, cell: CellCoord, radius: u32) -> u32 {
        debug_assert!(radius > 0, "neighbour radius must be positive");
        let (x, y) = (cell.column(), cell.row());
        let fits_left = x >= radius;
        let fits_top = y >= radius;
        let fits_right = x.saturating_add(radius) < self.width;
        let fits_bottom = y.saturating_add(radius) < self.height;

        let mut count = 0;
        let mut sample = |column: u32, row: u32| {
            count += self.state(CellCoord::new(column, row)).value();
        };

        if fits_left {
            sample(x - radius, y);
            if fits_top {
                sample(x - 1, y - 1);
            }
        }
        if fits_top {
            sample(x, y - radius);
            if fits_right {
                sample(x + radius, y - radius);
            }
        }
        if fits_right {
            sample(x + radius, y);
            if fits_bottom {
                sample(x + radius, y + radius);
            }
        }
        if fits_bottom {
            sample(x, y + radius);
            if fits_left {
                sample(x - radius, y + radius);
            }
        }

        count
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_parses_open_and_wall_cells() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 3);
        assert!(grid.is_open(CellCoord::new(1, 1)));
        assert!(!grid.is_open(CellCoord::new(0, 1)));
        assert_eq!(grid.open_count(), 1);
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let grid = Grid::from_rows(&["..", ".."]);
        assert_eq!(grid.get(CellCoord::new(2, 0)), None);
        assert_eq!(grid.state(CellCoord::new(2, 0)), CellState::Wall);
    }

    #[test]
    fn radius_one_counts_full_moore_neighbourhood() {
        let grid = Grid::from_rows(&[".....", ".....", ".....", ".....", "....."]);
        assert_eq!(grid.neighbor_count(CellCoord::new(2, 2), 1), 8);
        assert_eq!(grid.neighbor_count(CellCoord::new(0, 0), 1), 3);
        assert_eq!(grid.neighbor_count(CellCoord::new(4, 2), 1), 5);
    }

    #[test]
    fn radius_two_samples_the_skewed_ring() {
        let mut grid = Grid::walled(5, 5);
        let samples = [(0, 2), (1, 1), (2, 0), (4, 0), (4, 2), (4, 4), (2, 4), (0, 4)];
        for (column, row) in samples {
            grid.set(CellCoord::new(column, row), CellState::Open);
        }
        assert_eq!(grid.neighbor_count(CellCoord::new(2, 2), 2), 8);

        // (-2, -2) is not part of the pattern while (-1, -1) is.
        grid.set(CellCoord::new(0, 0), CellState::Open);
        assert_eq!(grid.neighbor_count(CellCoord::new(2, 2), 2), 8);
        grid.set(CellCoord::new(1, 1), CellState::Wall);
        assert_eq!(grid.neighbor_count(CellCoord::new(2, 2), 2), 7);
    }

    #[test]
    fn radius_two_skips_samples_past_the_edge() {
        let grid = Grid::from_rows(&[".....", ".....", ".....", ".....", "....."]);
        // Only (+2, 0), (+2, +2) and (0, +2) fit from the corner.
        assert_eq!(grid.neighbor_count(CellCoord::new(0, 0), 2), 3);
        // x = 1 cannot host the left samples even though (-1, -1) would fit.
        assert_eq!(grid.neighbor_count(CellCoord::new(1, 2), 2), 5);
    }

    #[test]
    fn density_is_a_percentage_of_all_cells() {
        let grid = Grid::from_rows(&["#.", ".."]);
        assert!((grid.density() - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn coords_walk_columns_first() {
        let grid = Grid::walled(2, 2);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(
            coords,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
            ]
        );
    }
}
