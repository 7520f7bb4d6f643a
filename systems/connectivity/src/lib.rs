#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Connectivity repair for freshly carved caves.
//!
//! The border is walled first. A random open cell then seeds a
//! four-directional flood fill; everything the fill reaches stays open and
//! everything else turns to rock, leaving a single connected cave whose
//! density is then checked against the configured band.

use abyssal_core::{CellCoord, CellState, DensityBand, GenerationError};
use abyssal_world::Grid;
use rand::Rng;

/// Summary of a repaired grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repair {
    /// Cell the flood fill started from.
    pub seed: CellCoord,
    /// Open cells left after the repair.
    pub open_cells: usize,
    /// Open cells as a percentage of the whole grid.
    pub density: f32,
    /// Whether the density fell inside the configured band.
    pub accepted: bool,
}

/// Pure system that prunes a grid down to one connected cave.
#[derive(Debug)]
pub struct ConnectivityFiller {
    band: DensityBand,
    seed_attempts: u32,
    stack: Vec<CellCoord>,
}

impl ConnectivityFiller {
    /// Creates a filler that accepts caves inside `band` and spends at most
    /// `seed_attempts` random draws on finding an open seed.
    #[must_use]
    pub fn new(band: DensityBand, seed_attempts: u32) -> Self {
        Self {
            band,
            seed_attempts,
            stack: Vec::new(),
        }
    }

    /// Repairs the grid in place and reports whether it meets the density band.
    ///
    /// The border is walled before the fill so it cannot bridge two caverns
    /// that the interior keeps apart. Fails only when no interior cell is open.
    pub fn repair<R>(&mut self, grid: &mut Grid, rng: &mut R) -> Result<Repair, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let border: Vec<_> = grid.coords().filter(|&cell| grid.is_border(cell)).collect();
        for cell in border {
            grid.set(cell, CellState::Wall);
        }

        let seed = self
            .pick_seed(grid, rng)
            .ok_or_else(|| GenerationError::NoOpenCellsAvailable {
                context: "seeding the connectivity flood fill".to_owned(),
            })?;

        let reached = self.flood_fill(grid, seed);
        let mut open_cells = 0;
        for cell in grid.coords() {
            let state = if grid.state(cell) == CellState::Reachable {
                open_cells += 1;
                CellState::Open
            } else {
                CellState::Wall
            };
            grid.set(cell, state);
        }

        let density = grid.density();
        let accepted = self.band.contains(density);
        log::debug!(
            "flood fill from {seed} reached {reached} cells, {open_cells} kept open ({density:.1}%)"
        );

        Ok(Repair {
            seed,
            open_cells,
            density,
            accepted,
        })
    }

    /// Draws uniformly random cells until one is open.
    ///
    /// When the draw budget runs out the seed is drawn uniformly from the
    /// open cells instead, so `None` means the grid has no open cell.
    pub fn pick_seed<R>(&self, grid: &Grid, rng: &mut R) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        if grid.width() == 0 || grid.height() == 0 || grid.open_count() == 0 {
            return None;
        }

        for _ in 0..self.seed_attempts {
            let cell = CellCoord::new(
                rng.gen_range(0..grid.width()),
                rng.gen_range(0..grid.height()),
            );
            if grid.is_open(cell) {
                return Some(cell);
            }
        }

        log::warn!(
            "no open seed after {} draws, falling back to the open cell list",
            self.seed_attempts
        );
        let open: Vec<_> = grid.coords().filter(|&cell| grid.is_open(cell)).collect();
        Some(open[rng.gen_range(0..open.len())])
    }

    /// Tags every open cell four-connected to `seed` as reachable.
    ///
    /// Uses an explicit stack so deep caves cannot overflow the call stack.
    /// Returns the number of tagged cells.
    pub fn flood_fill(&mut self, grid: &mut Grid, seed: CellCoord) -> usize {
        self.stack.clear();
        self.stack.push(seed);
        let mut reached = 0;

        while let Some(cell) = self.stack.pop() {
            if grid.state(cell) != CellState::Open {
                continue;
            }
            grid.set(cell, CellState::Reachable);
            reached += 1;
            self.stack.extend(orthogonal_neighbors(cell, grid));
        }

        reached
    }
}

/// Reports whether every open cell is four-connected to every other one.
///
/// Grids without open cells count as connected.
#[must_use]
pub fn is_connected(grid: &Grid) -> bool {
    let Some(start) = grid.coords().find(|&cell| grid.is_open(cell)) else {
        return true;
    };

    let mut scratch = grid.clone();
    let mut filler = ConnectivityFiller::new(DensityBand::new(0.0, 100.0), 1);
    filler.flood_fill(&mut scratch, start) == grid.open_count()
}

fn orthogonal_neighbors(cell: CellCoord, grid: &Grid) -> impl Iterator<Item = CellCoord> {
    let (column, row) = (cell.column(), cell.row());
    let width = grid.width();
    let height = grid.height();
    [
        column.checked_sub(1).map(|left| CellCoord::new(left, row)),
        column
            .checked_add(1)
            .filter(|&right| right < width)
            .map(|right| CellCoord::new(right, row)),
        row.checked_add(1)
            .filter(|&below| below < height)
            .map(|below| CellCoord::new(column, below)),
        row.checked_sub(1).map(|above| CellCoord::new(column, above)),
    ]
    .into_iter()
    .flatten()
}
