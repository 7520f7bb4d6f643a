#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy best-first search over a cave navigation graph.
//!
//! The frontier is ordered purely by straight-line distance to the goal.
//! Accumulated path cost is never considered and a node is parented exactly
//! once, by whichever node discovered it first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use abyssal_core::{CellCoord, Path, PathOutcome};
use abyssal_world::NavGraph;

/// Pure system answering path queries against a [`NavGraph`].
///
/// Per-node search state lives in scratch buffers owned by the finder and is
/// reset at the start of every query, so queries never observe each other.
#[derive(Debug, Default)]
pub struct PathFinder {
    heuristic: Vec<f32>,
    parent: Vec<Option<usize>>,
    seen: Vec<bool>,
    frontier: BinaryHeap<FrontierEntry>,
    sequence: u64,
}

impl PathFinder {
    /// Creates a finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches for a path from `start` to `goal`.
    ///
    /// Returns [`PathOutcome::NotFound`] when either endpoint is not a
    /// navigable cell or the frontier empties before the goal is popped.
    pub fn find_path(&mut self, nav: &NavGraph, start: CellCoord, goal: CellCoord) -> PathOutcome {
        let (Some(start_index), Some(goal_index)) = (nav.node_index(start), nav.node_index(goal))
        else {
            log::debug!("path query {start} -> {goal} touches a non-navigable cell");
            return PathOutcome::NotFound;
        };

        self.reset(nav.len());
        self.discover(nav, start_index, None, goal);

        while let Some(entry) = self.frontier.pop() {
            if entry.node == goal_index {
                return PathOutcome::Found(self.trace(nav, goal_index));
            }
            for child in nav.children(entry.node) {
                if !self.seen[child] {
                    self.discover(nav, child, Some(entry.node), goal);
                }
            }
        }

        log::debug!("frontier exhausted before reaching {goal} from {start}");
        PathOutcome::NotFound
    }

    /// Heuristic recorded for the node by the most recent query.
    ///
    /// Nodes the query never discovered report positive infinity.
    #[must_use]
    pub fn heuristic(&self, node: usize) -> Option<f32> {
        self.heuristic.get(node).copied()
    }

    fn reset(&mut self, nodes: usize) {
        self.heuristic.clear();
        self.heuristic.resize(nodes, f32::INFINITY);
        self.parent.clear();
        self.parent.resize(nodes, None);
        self.seen.clear();
        self.seen.resize(nodes, false);
        self.frontier.clear();
        self.sequence = 0;
    }

    fn discover(&mut self, nav: &NavGraph, node: usize, parent: Option<usize>, goal: CellCoord) {
        let Some(cell) = nav.node(node).map(|node| node.cell()) else {
            return;
        };
        let heuristic = cell.euclidean_distance(goal);
        self.seen[node] = true;
        self.parent[node] = parent;
        self.heuristic[node] = heuristic;
        self.frontier.push(FrontierEntry {
            heuristic,
            sequence: self.sequence,
            node,
        });
        self.sequence += 1;
    }

    fn trace(&self, nav: &NavGraph, goal: usize) -> Path {
        let mut cells = Vec::new();
        let mut positions = Vec::new();
        let mut cursor = Some(goal);

        while let Some(index) = cursor {
            if let Some(node) = nav.node(index) {
                cells.push(node.cell());
                positions.push(node.position());
            }
            cursor = self.parent[index];
        }

        cells.reverse();
        positions.reverse();
        Path::new(cells, positions)
    }
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    heuristic: f32,
    sequence: u64,
    node: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the closest, earliest entry first.
        other
            .heuristic
            .total_cmp(&self.heuristic)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(heuristic: f32, sequence: u64) -> FrontierEntry {
        FrontierEntry {
            heuristic,
            sequence,
            node: 0,
        }
    }

    #[test]
    fn frontier_pops_lowest_heuristic_then_oldest_entry() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(3.0, 0));
        heap.push(entry(1.0, 2));
        heap.push(entry(1.0, 1));
        heap.push(entry(2.0, 3));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|entry| (entry.heuristic, entry.sequence))
            .collect();
        assert_eq!(order, vec![(1.0, 1), (1.0, 2), (2.0, 3), (3.0, 0)]);
    }
}
