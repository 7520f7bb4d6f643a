//! Padded placement candidates.

use abyssal_core::CellCoord;
use rand::Rng;

use crate::Grid;

/// Open cells whose whole radius-one ring is also open.
///
/// Features are only spawned on these tiles so they never sit against rock.
/// Tiles keep the column-by-column discovery order of the grid so sampling
/// stays reproducible for a given random sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenTileSet {
    tiles: Vec<CellCoord>,
}

impl OpenTileSet {
    /// Collects every padded open tile of the grid.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let tiles = grid
            .coords()
            .filter(|&cell| grid.is_open(cell) && grid.neighbor_count(cell, 1) == 8)
            .collect();
        Self { tiles }
    }

    /// Creates a set from explicit tiles, keeping their order.
    #[must_use]
    pub fn from_tiles(tiles: Vec<CellCoord>) -> Self {
        Self { tiles }
    }

    /// Number of tiles left in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the set ran dry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Reports whether the tile is still available.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.tiles.contains(&cell)
    }

    /// Tiles in discovery order.
    #[must_use]
    pub fn as_slice(&self) -> &[CellCoord] {
        &self.tiles
    }

    /// Draws a tile uniformly at random without removing it.
    pub fn sample<R>(&self, rng: &mut R) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        if self.tiles.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.tiles.len());
        Some(self.tiles[index])
    }

    /// Removes the tile, preserving the order of the remaining tiles.
    ///
    /// Returns `false` when the tile was not part of the set.
    pub fn remove(&mut self, cell: CellCoord) -> bool {
        match self.tiles.iter().position(|&tile| tile == cell) {
            Some(index) => {
                let _ = self.tiles.remove(index);
                true
            }
            None => false,
        }
    }
}
