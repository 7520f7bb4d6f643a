//! Caller-supplied configuration for a generation run.
//!
//! Every knob is validated once by [`GenerationConfig::validate`] before any
//! system touches a grid, so the systems themselves may assume sane values.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, FeatureKind};

/// Complete configuration of a generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cellular-automata carving parameters.
    pub carve: CarveConfig,
    /// Accepted open-cell percentage after connectivity repair.
    pub density: DensityBand,
    /// Caps applied to every retry and rejection-sampling loop.
    pub retry: RetryCaps,
    /// Ordered feature placement table.
    pub placement: PlacementPlan,
    /// Routes traced between placed features.
    pub routes: Vec<RouteRequest>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            carve: CarveConfig::default(),
            density: DensityBand::default(),
            retry: RetryCaps::default(),
            placement: PlacementPlan::default(),
            routes: RouteRequest::defaults(),
        }
    }
}

impl GenerationConfig {
    /// Checks every parameter and cross-reference of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.carve.validate()?;
        self.density.validate()?;
        self.retry.validate()?;
        let placed = self.placement.validate()?;

        let mut names = HashSet::new();
        for route in &self.routes {
            if !names.insert(route.name.as_str()) {
                return Err(ConfigError::DuplicateRoute(route.name.clone()));
            }
            if !placed.contains(&route.from) {
                return Err(ConfigError::UnplacedRouteEndpoint {
                    route: route.name.clone(),
                    kind: route.from,
                });
            }
            match route.to {
                RouteTarget::Feature(kind) if !placed.contains(&kind) => {
                    return Err(ConfigError::UnplacedRouteEndpoint {
                        route: route.name.clone(),
                        kind,
                    });
                }
                RouteTarget::NearestMine if !placed.iter().any(|kind| kind.is_mine()) => {
                    return Err(ConfigError::NoMinesForRoute(route.name.clone()));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Parameters of the cellular-automata cave carver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Probability that an interior cell starts open.
    pub fill_probability: f32,
    /// Number of growth steps using both neighbour rings.
    pub growth_steps: u32,
    /// Number of smoothing steps using only the inner ring.
    pub smooth_steps: u32,
    /// A cell opens when its inner-ring sum exceeds this value.
    pub growth_threshold: u32,
    /// During growth, a cell also opens when its outer-ring sum is below this value.
    pub shrink_threshold: u32,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 80,
            fill_probability: 0.52,
            growth_steps: 4,
            smooth_steps: 2,
            growth_threshold: 4,
            shrink_threshold: 2,
        }
    }
}

impl CarveConfig {
    /// Smallest grid side that still leaves an interior inside the border.
    pub const MIN_SIDE: u32 = 3;

    /// Largest accepted `width * height`.
    pub const MAX_CELLS: u64 = 1 << 24;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.width < Self::MIN_SIDE || self.height < Self::MIN_SIDE {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if u64::from(self.width) * u64::from(self.height) > Self::MAX_CELLS {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
                max: Self::MAX_CELLS,
            });
        }
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(ConfigError::FillProbability(self.fill_probability));
        }
        Ok(())
    }
}

/// Inclusive band of accepted open-cell percentages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityBand {
    /// Lowest accepted percentage.
    pub low: f32,
    /// Highest accepted percentage.
    pub high: f32,
}

impl Default for DensityBand {
    fn default() -> Self {
        Self {
            low: 45.0,
            high: 55.0,
        }
    }
}

impl DensityBand {
    /// Creates a band from its inclusive bounds.
    #[must_use]
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Reports whether the percentage lies inside the band.
    #[must_use]
    pub fn contains(&self, percentage: f32) -> bool {
        self.low <= percentage && percentage <= self.high
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |value: f32| (0.0..=100.0).contains(&value);
        if !in_range(self.low) || !in_range(self.high) || self.low > self.high {
            return Err(ConfigError::DensityBand {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Caps on every loop that retries until a random draw succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryCaps {
    /// Whole-pipeline attempts before giving up.
    pub generation_attempts: u32,
    /// Random draws spent looking for an open flood-fill seed.
    pub seed_attempts: u32,
    /// Random draws spent on each distance-constrained placement.
    pub sampling_draws: u32,
}

impl Default for RetryCaps {
    fn default() -> Self {
        Self {
            generation_attempts: 50,
            seed_attempts: 1024,
            sampling_draws: 4096,
        }
    }
}

impl RetryCaps {
    fn validate(&self) -> Result<(), ConfigError> {
        let caps = [
            ("generation_attempts", self.generation_attempts),
            ("seed_attempts", self.seed_attempts),
            ("sampling_draws", self.sampling_draws),
        ];
        match caps.into_iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::ZeroRetryCap(name)),
            None => Ok(()),
        }
    }
}

/// Distance bounds measured in cell units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    /// Smallest accepted distance.
    pub min: f32,
    /// Largest accepted distance, if bounded.
    #[serde(default)]
    pub max: Option<f32>,
}

impl Separation {
    /// Lower bound only.
    #[must_use]
    pub const fn at_least(min: f32) -> Self {
        Self { min, max: None }
    }

    /// Inclusive lower and upper bounds.
    #[must_use]
    pub const fn between(min: f32, max: f32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Reports whether the distance satisfies the bounds.
    #[must_use]
    pub fn admits(&self, distance: f32) -> bool {
        distance >= self.min && self.max.map_or(true, |max| distance <= max)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let valid_min = self.min >= 0.0;
        let valid_max = self.max.map_or(true, |max| max >= 0.0 && max >= self.min);
        if valid_min && valid_max {
            Ok(())
        } else {
            Err(ConfigError::Separation {
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Constraint family applied by a placement step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PlacementRule {
    /// Draws two distinct tiles at once until they are far enough apart.
    SeparatedPair {
        /// Feature placed on the first tile.
        first: FeatureKind,
        /// Feature placed on the second tile.
        second: FeatureKind,
        /// Distance bounds between the two tiles.
        separation: Separation,
    },
    /// Draws a tile until it satisfies the separation to every anchor.
    Constrained {
        /// Feature being placed.
        kind: FeatureKind,
        /// Previously placed features the distance is measured from.
        anchors: Vec<FeatureKind>,
        /// Distance bounds to each anchor.
        separation: Separation,
    },
    /// Derives the tile from three anchors with an ordered fallback chain.
    Centroid {
        /// Feature being placed.
        kind: FeatureKind,
        /// Features averaged to find the first candidate.
        anchors: [FeatureKind; 3],
        /// Anchor pairs whose midpoints are tried, in order, when the centroid is rock.
        fallbacks: Vec<[FeatureKind; 2]>,
    },
}

impl PlacementRule {
    /// Features placed by the rule.
    #[must_use]
    pub fn placed_kinds(&self) -> Vec<FeatureKind> {
        match self {
            Self::SeparatedPair { first, second, .. } => vec![*first, *second],
            Self::Constrained { kind, .. } | Self::Centroid { kind, .. } => vec![*kind],
        }
    }

    /// Features that must already be placed before the rule runs.
    #[must_use]
    pub fn anchor_kinds(&self) -> Vec<FeatureKind> {
        match self {
            Self::SeparatedPair { .. } => Vec::new(),
            Self::Constrained { anchors, .. } => anchors.clone(),
            Self::Centroid {
                anchors, fallbacks, ..
            } => anchors
                .iter()
                .chain(fallbacks.iter().flatten())
                .copied()
                .collect(),
        }
    }

    fn separation(&self) -> Option<&Separation> {
        match self {
            Self::SeparatedPair { separation, .. } | Self::Constrained { separation, .. } => {
                Some(separation)
            }
            Self::Centroid { .. } => None,
        }
    }
}

/// Single entry of the placement table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementStep {
    /// Constraint family and its parameters.
    #[serde(flatten)]
    pub rule: PlacementRule,
    /// Whether the chosen tile leaves the open tile set.
    ///
    /// Features that keep their tile may share it with later placements.
    #[serde(default = "consumes_by_default")]
    pub consumes_tile: bool,
}

fn consumes_by_default() -> bool {
    true
}

impl PlacementStep {
    /// Step whose tile is removed from the open tile set.
    #[must_use]
    pub const fn consuming(rule: PlacementRule) -> Self {
        Self {
            rule,
            consumes_tile: true,
        }
    }

    /// Step whose tile stays selectable by later steps.
    #[must_use]
    pub const fn sharing(rule: PlacementRule) -> Self {
        Self {
            rule,
            consumes_tile: false,
        }
    }
}

/// Ordered table of placement steps keyed by the features they place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementPlan {
    steps: Vec<PlacementStep>,
}

impl PlacementPlan {
    /// Creates a plan from ordered steps.
    #[must_use]
    pub fn new(steps: Vec<PlacementStep>) -> Self {
        Self { steps }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PlacementStep] {
        &self.steps
    }

    /// Features placed by the plan in execution order.
    #[must_use]
    pub fn placed_kinds(&self) -> Vec<FeatureKind> {
        self.steps
            .iter()
            .flat_map(|step| step.rule.placed_kinds())
            .collect()
    }

    fn validate(&self) -> Result<HashSet<FeatureKind>, ConfigError> {
        let mut placed = HashSet::new();
        for step in &self.steps {
            if let Some(separation) = step.rule.separation() {
                separation.validate()?;
            }
            for anchor in step.rule.anchor_kinds() {
                if !placed.contains(&anchor) {
                    return Err(ConfigError::UnplacedAnchor(anchor));
                }
            }
            for kind in step.rule.placed_kinds() {
                if !placed.insert(kind) {
                    return Err(ConfigError::DuplicateFeature(kind));
                }
            }
        }
        Ok(placed)
    }
}

impl Default for PlacementPlan {
    fn default() -> Self {
        let tether = |kind, anchor| {
            PlacementStep::consuming(PlacementRule::Constrained {
                kind,
                anchors: vec![anchor],
                separation: Separation::between(15.0, 20.0),
            })
        };

        Self::new(vec![
            PlacementStep::consuming(PlacementRule::SeparatedPair {
                first: FeatureKind::Start,
                second: FeatureKind::Goal,
                separation: Separation::at_least(75.0),
            }),
            PlacementStep::consuming(PlacementRule::Constrained {
                kind: FeatureKind::Midpoint,
                anchors: vec![FeatureKind::Start, FeatureKind::Goal],
                separation: Separation::at_least(45.0),
            }),
            PlacementStep::sharing(PlacementRule::Centroid {
                kind: FeatureKind::Rendezvous,
                anchors: [FeatureKind::Start, FeatureKind::Goal, FeatureKind::Midpoint],
                fallbacks: vec![
                    [FeatureKind::Start, FeatureKind::Midpoint],
                    [FeatureKind::Start, FeatureKind::Goal],
                    [FeatureKind::Goal, FeatureKind::Midpoint],
                ],
            }),
            tether(FeatureKind::Mine(0), FeatureKind::Goal),
            tether(FeatureKind::Mine(1), FeatureKind::Goal),
            tether(FeatureKind::Mine(2), FeatureKind::Mine(1)),
            tether(FeatureKind::Mine(3), FeatureKind::Mine(2)),
            tether(FeatureKind::Mine(4), FeatureKind::Midpoint),
            tether(FeatureKind::Mine(5), FeatureKind::Mine(4)),
        ])
    }
}

/// Destination of a route request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// A specific placed feature.
    Feature(FeatureKind),
    /// The mine closest to the route origin, first in plan order on ties.
    NearestMine,
}

/// Named route traced after placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Name under which the traced path is published.
    pub name: String,
    /// Feature the route starts at.
    pub from: FeatureKind,
    /// Destination of the route.
    pub to: RouteTarget,
}

impl RouteRequest {
    /// Creates a named route request.
    #[must_use]
    pub fn new(name: impl Into<String>, from: FeatureKind, to: RouteTarget) -> Self {
        Self {
            name: name.into(),
            from,
            to,
        }
    }

    /// Routes traced by the shipped level preset.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "start-to-midpoint",
                FeatureKind::Start,
                RouteTarget::Feature(FeatureKind::Midpoint),
            ),
            Self::new(
                "midpoint-to-goal",
                FeatureKind::Midpoint,
                RouteTarget::Feature(FeatureKind::Goal),
            ),
            Self::new(
                "midpoint-to-rendezvous",
                FeatureKind::Midpoint,
                RouteTarget::Feature(FeatureKind::Rendezvous),
            ),
            Self::new(
                "start-to-nearest-mine",
                FeatureKind::Start,
                RouteTarget::NearestMine,
            ),
        ]
    }
}
