#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Abyssal level generator.
//!
//! This crate defines the vocabulary that connects the cave grid, the pure
//! generation systems and the adapters. Systems receive immutable views and
//! explicitly passed random sources, return owned results and broadcast
//! [`Event`] values describing what happened during a generation run so
//! callers can audit the pipeline deterministically.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
mod error;

pub use config::{
    CarveConfig, DensityBand, GenerationConfig, PlacementPlan, PlacementRule, PlacementStep,
    RetryCaps, RouteRequest, RouteTarget, Separation,
};
pub use error::{ConfigError, GenerationError};

/// World-space point derived from a grid cell.
pub type Position = glam::Vec2;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Straight-line distance between two cells measured in cell units.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let dx = self.column.abs_diff(other.column) as f32;
        let dy = self.row.abs_diff(other.row) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether `other` lies in the Moore neighbourhood of the cell.
    #[must_use]
    pub fn is_moore_adjacent(self, other: CellCoord) -> bool {
        self != other
            && self.column.abs_diff(other.column) <= 1
            && self.row.abs_diff(other.row) <= 1
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// State stored in a single cave cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Solid rock.
    #[default]
    Wall,
    /// Navigable water.
    Open,
    /// Open cell tagged as reachable while a flood fill is in progress.
    Reachable,
}

impl CellState {
    /// Numeric value of the state as summed by neighbour counting.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Wall => 0,
            Self::Open => 1,
            Self::Reachable => 2,
        }
    }

    /// Reports whether the state is navigable open water.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Maps grid cells onto world-space positions for consumers.
pub trait CellToWorld {
    /// Converts the provided cell into its world-space position.
    fn cell_to_world(&self, cell: CellCoord) -> Position;
}

impl<F> CellToWorld for F
where
    F: Fn(CellCoord) -> Position,
{
    fn cell_to_world(&self, cell: CellCoord) -> Position {
        self(cell)
    }
}

/// Default mapping that mirrors the grid around its centre and returns tile centres.
///
/// Cell `(x, y)` lands on tile `(-x + width / 2, -y + height / 2)` and the
/// returned position is the centre of that tile scaled by `cell_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirroredCellCenter {
    width: u32,
    height: u32,
    cell_size: f32,
}

impl MirroredCellCenter {
    /// Creates a mapping for a grid with the provided dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
        }
    }
}

impl CellToWorld for MirroredCellCenter {
    fn cell_to_world(&self, cell: CellCoord) -> Position {
        let tile_x = i64::from(self.width / 2) - i64::from(cell.column());
        let tile_y = i64::from(self.height / 2) - i64::from(cell.row());
        Position::new(
            (tile_x as f32 + 0.5) * self.cell_size,
            (tile_y as f32 + 0.5) * self.cell_size,
        )
    }
}

/// Named point-of-interest kinds placed inside a cave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Where the navigating agent starts.
    Start,
    /// Where the navigating agent is heading.
    Goal,
    /// Waypoint kept far away from both start and goal.
    Midpoint,
    /// Meeting point derived from the start, goal and midpoint.
    Rendezvous,
    /// Numbered mine in the mine field.
    Mine(u8),
}

impl FeatureKind {
    /// Reports whether the kind belongs to the mine field.
    #[must_use]
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine(_))
    }

    /// Parses the label produced by the `Display` implementation.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "start" => Some(Self::Start),
            "goal" => Some(Self::Goal),
            "midpoint" => Some(Self::Midpoint),
            "rendezvous" => Some(Self::Rendezvous),
            other => other
                .strip_prefix("mine-")
                .and_then(|index| index.parse().ok())
                .map(Self::Mine),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Goal => write!(f, "goal"),
            Self::Midpoint => write!(f, "midpoint"),
            Self::Rendezvous => write!(f, "rendezvous"),
            Self::Mine(index) => write!(f, "mine-{index}"),
        }
    }
}

/// Feature placed on the grid together with its world-space position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Feature {
    /// Kind of feature that was placed.
    pub kind: FeatureKind,
    /// Grid cell holding the feature.
    pub cell: CellCoord,
    /// World-space position of the cell.
    pub position: Position,
}

/// Ordered route through open water from a start cell to a goal cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    cells: Vec<CellCoord>,
    positions: Vec<Position>,
}

impl Path {
    /// Creates a path from parallel cell and position sequences.
    ///
    /// Both sequences must already be ordered from start to goal.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>, positions: Vec<Position>) -> Self {
        debug_assert_eq!(cells.len(), positions.len());
        Self { cells, positions }
    }

    /// Cells visited by the path, start first.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// World-space positions of the visited cells, start first.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of nodes on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Result of a single path query.
#[derive(Clone, Debug, PartialEq)]
pub enum PathOutcome {
    /// The goal was reached and the traced path is attached.
    Found(Path),
    /// The frontier ran dry before reaching the goal.
    NotFound,
}

impl PathOutcome {
    /// Returns the traced path, if any.
    #[must_use]
    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound => None,
        }
    }
}

/// How a feature location was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementSource {
    /// Drawn from the open tile set after the given number of draws.
    Sampled {
        /// Number of draws consumed before the constraint held.
        draws: u32,
    },
    /// Centroid of the three anchor features.
    Centroid,
    /// Midpoint between two anchor features after the centroid hit rock.
    PairMidpoint {
        /// First feature of the pair.
        first: FeatureKind,
        /// Second feature of the pair.
        second: FeatureKind,
    },
    /// Uniform draw from the open tile set after every derived candidate hit rock.
    RandomFallback,
}

/// Why a generation attempt was discarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectionReason {
    /// The repaired cave fell outside the configured density band.
    DensityOutOfBand {
        /// Open-cell percentage of the repaired cave.
        density: f32,
    },
    /// A feature could not be placed in the accepted cave.
    PlacementFailed {
        /// Feature whose placement failed, when the failure names one.
        feature: Option<FeatureKind>,
    },
}

/// Events broadcast by the generation driver while a run progresses.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A fresh attempt started from an empty grid.
    AttemptStarted {
        /// One-based attempt number.
        attempt: u32,
    },
    /// An attempt was discarded and the pipeline restarts from scratch.
    AttemptRejected {
        /// One-based attempt number.
        attempt: u32,
        /// Reason the attempt was discarded.
        reason: RejectionReason,
    },
    /// The repaired cave passed validation.
    CaveAccepted {
        /// One-based attempt number.
        attempt: u32,
        /// Number of open cells in the repaired cave.
        open_cells: usize,
        /// Open-cell percentage of the repaired cave.
        density: f32,
    },
    /// A feature was placed.
    FeaturePlaced {
        /// Kind of feature that was placed.
        kind: FeatureKind,
        /// Cell chosen for the feature.
        cell: CellCoord,
        /// How the cell was chosen.
        source: PlacementSource,
    },
    /// A requested route was traced through the cave.
    RouteTraced {
        /// Name of the route request.
        route: String,
        /// Number of nodes on the traced path.
        nodes: usize,
    },
}
