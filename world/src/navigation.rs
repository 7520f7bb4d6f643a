//! Navigation graph derived from a finished cave.

use abyssal_core::{CellCoord, CellToWorld, Position};

use crate::Grid;

/// Navigable cell together with its world-space position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavNode {
    cell: CellCoord,
    position: Position,
}

impl NavNode {
    /// Grid cell represented by the node.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// World-space position of the node.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }
}

/// One node per open cell with implicit Moore-neighbourhood adjacency.
///
/// Unlike the padded [`OpenTileSet`](crate::OpenTileSet), every open cell is
/// a node. The node set is immutable once built; search state lives with the
/// path finder and never inside the graph.
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    width: u32,
    height: u32,
    nodes: Vec<NavNode>,
    lookup: Vec<Option<usize>>,
}

impl NavGraph {
    /// Builds the graph from a finished grid using the provided cell mapping.
    #[must_use]
    pub fn build<M>(grid: &Grid, mapping: &M) -> Self
    where
        M: CellToWorld + ?Sized,
    {
        let width = grid.width();
        let height = grid.height();
        let mut nodes = Vec::with_capacity(grid.open_count());
        let mut lookup = vec![None; grid.cell_count()];

        for cell in grid.coords().filter(|&cell| grid.is_open(cell)) {
            if let Some(slot) = index(width, height, cell) {
                lookup[slot] = Some(nodes.len());
                nodes.push(NavNode {
                    cell,
                    position: mapping.cell_to_world(cell),
                });
            }
        }

        Self {
            width,
            height,
            nodes,
            lookup,
        }
    }

    /// Nodes in column-by-column discovery order.
    #[must_use]
    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node stored at the provided index.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&NavNode> {
        self.nodes.get(index)
    }

    /// Index of the node covering the cell, if the cell is navigable.
    #[must_use]
    pub fn node_index(&self, cell: CellCoord) -> Option<usize> {
        index(self.width, self.height, cell).and_then(|slot| self.lookup[slot])
    }

    /// Indices of the navigable cells surrounding the node.
    ///
    /// Columns are scanned left to right and, within a column, rows top to
    /// bottom. The node itself and cells outside the grid are skipped.
    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let centre = self.nodes.get(node).map(NavNode::cell);
        centre
            .into_iter()
            .flat_map(moore_neighbors)
            .filter_map(move |cell| self.node_index(cell))
    }
}

fn moore_neighbors(cell: CellCoord) -> impl Iterator<Item = CellCoord> {
    let column = i64::from(cell.column());
    let row = i64::from(cell.row());
    (-1..=1_i64)
        .flat_map(move |dx| (-1..=1_i64).map(move |dy| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let column = u32::try_from(column + dx).ok()?;
            let row = u32::try_from(row + dy).ok()?;
            Some(CellCoord::new(column, row))
        })
}

fn index(width: u32, height: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() >= width || cell.row() >= height {
        return None;
    }
    let width = usize::try_from(width).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
