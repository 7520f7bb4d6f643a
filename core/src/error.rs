use thiserror::Error;

use crate::{CellCoord, FeatureKind};

/// Reasons a configuration is refused before generation starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid leaves no interior inside its border.
    #[error("grid {width}x{height} is too small, each side needs at least 3 cells")]
    GridTooSmall {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The grid holds more cells than a single allocation may cover.
    #[error("grid {width}x{height} exceeds the limit of {max} cells")]
    GridTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Largest accepted cell count.
        max: u64,
    },
    /// The fill probability is not a probability.
    #[error("fill probability {0} is outside [0, 1]")]
    FillProbability(f32),
    /// The density band is inverted or outside [0, 100].
    #[error("density band [{low}, {high}] is not a valid percentage range")]
    DensityBand {
        /// Requested lower bound.
        low: f32,
        /// Requested upper bound.
        high: f32,
    },
    /// A retry cap of zero would fail every run.
    #[error("retry cap `{0}` must be positive")]
    ZeroRetryCap(&'static str),
    /// A separation bound is negative or inverted.
    #[error("separation [{min}, {max:?}] is negative or inverted")]
    Separation {
        /// Requested minimum.
        min: f32,
        /// Requested maximum.
        max: Option<f32>,
    },
    /// A placement step references a feature that is not placed before it.
    #[error("anchor `{0}` is not placed by an earlier step")]
    UnplacedAnchor(FeatureKind),
    /// Two placement steps place the same feature.
    #[error("feature `{0}` is placed more than once")]
    DuplicateFeature(FeatureKind),
    /// Two routes share a name.
    #[error("route `{0}` is requested more than once")]
    DuplicateRoute(String),
    /// A route endpoint is never placed.
    #[error("route `{route}` references unplaced feature `{kind}`")]
    UnplacedRouteEndpoint {
        /// Name of the route.
        route: String,
        /// Feature that is never placed.
        kind: FeatureKind,
    },
    /// A route targets the nearest mine but the plan places none.
    #[error("route `{0}` targets the nearest mine but no mines are placed")]
    NoMinesForRoute(String),
}

/// Failures local to a generation run.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// Every attempt produced a cave outside the density band.
    #[error("no cave met the density band after {attempts} attempts (last density {last_density:.1}%)")]
    GenerationRejected {
        /// Attempts spent.
        attempts: u32,
        /// Open-cell percentage of the last rejected cave.
        last_density: f32,
    },
    /// The grid or the open tile set ran out of candidates.
    #[error("no open cells available while {context}")]
    NoOpenCellsAvailable {
        /// What the caller was doing when it ran out.
        context: String,
    },
    /// A distance-constrained placement never found a satisfying tile.
    #[error("placing `{feature}` exhausted {draws} draws without satisfying {constraint}")]
    SamplingExhausted {
        /// Feature being placed.
        feature: FeatureKind,
        /// Human-readable description of the violated constraint.
        constraint: String,
        /// Draws spent.
        draws: u32,
    },
    /// Greedy search failed between two features of a connected cave.
    #[error("route `{route}` found no path from {from} to {to}")]
    RouteDisconnected {
        /// Name of the route.
        route: String,
        /// Origin cell.
        from: CellCoord,
        /// Destination cell.
        to: CellCoord,
    },
}
