#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cellular-automata cave carver.
//!
//! The carver seeds an interior of random noise and then runs growth and
//! smoothing steps. Every step reads from a snapshot of the previous
//! generation so updates within one pass never observe each other.

use abyssal_core::{CarveConfig, CellCoord, CellState};
use abyssal_world::Grid;
use rand::Rng;

/// Update rule applied by a single automaton pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepRule {
    /// Opens a cell when the inner ring is crowded or the outer ring is empty.
    Growth,
    /// Opens a cell only when the inner ring is crowded.
    Smooth,
}

/// Pure system that produces raw, unrepaired cave grids.
#[derive(Debug)]
pub struct CaveCarver {
    config: CarveConfig,
    snapshot: Grid,
}

impl CaveCarver {
    /// Creates a carver for the provided parameters.
    #[must_use]
    pub fn new(config: CarveConfig) -> Self {
        Self {
            snapshot: Grid::walled(config.width, config.height),
            config,
        }
    }

    /// Parameters used by the carver.
    #[must_use]
    pub const fn config(&self) -> &CarveConfig {
        &self.config
    }

    /// Runs the full seed, growth and smoothing schedule.
    pub fn carve<R>(&mut self, rng: &mut R) -> Grid
    where
        R: Rng + ?Sized,
    {
        let mut grid = self.seed(rng);
        for _ in 0..self.config.growth_steps {
            self.step(&mut grid, StepRule::Growth);
        }
        for _ in 0..self.config.smooth_steps {
            self.step(&mut grid, StepRule::Smooth);
        }

        log::debug!(
            "carved {}x{} cave with {} open cells",
            grid.width(),
            grid.height(),
            grid.open_count()
        );
        grid
    }

    /// Fills the interior with noise; the border starts as wall.
    pub fn seed<R>(&self, rng: &mut R) -> Grid
    where
        R: Rng + ?Sized,
    {
        let mut grid = Grid::walled(self.config.width, self.config.height);
        for cell in interior(&grid) {
            if rng.gen::<f32>() < self.config.fill_probability {
                grid.set(cell, CellState::Open);
            }
        }
        grid
    }

    /// Applies one automaton pass to the grid.
    ///
    /// `R1` is the cell's own value plus the radius-one ring and `R2` the
    /// same with the radius-two ring. Growth opens a cell when
    /// `R1 > growth_threshold` or `R2 < shrink_threshold`, smoothing only
    /// checks `R1`. Every cell is updated, the border included; only
    /// connectivity repair walls the border again.
    pub fn step(&mut self, grid: &mut Grid, rule: StepRule) {
        self.snapshot.clone_from(grid);
        let snapshot = &self.snapshot;

        for cell in snapshot.coords() {
            let own = snapshot.state(cell).value();
            let inner = own + snapshot.neighbor_count(cell, 1);
            let open = match rule {
                StepRule::Growth => {
                    let outer = own + snapshot.neighbor_count(cell, 2);
                    inner > self.config.growth_threshold || outer < self.config.shrink_threshold
                }
                StepRule::Smooth => inner > self.config.growth_threshold,
            };
            grid.set(cell, if open { CellState::Open } else { CellState::Wall });
        }
    }
}

fn interior(grid: &Grid) -> impl Iterator<Item = CellCoord> {
    let width = grid.width();
    let height = grid.height();
    (1..width.saturating_sub(1)).flat_map(move |column| {
        (1..height.saturating_sub(1)).map(move |row| CellCoord::new(column, row))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_skips_the_border() {
        let grid = Grid::walled(4, 3);
        let cells: Vec<_> = interior(&grid).collect();
        assert_eq!(cells, vec![CellCoord::new(1, 1), CellCoord::new(2, 1)]);
    }
}
