#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Top-level driver that turns a configuration and a random source into a
//! finished cave level.
//!
//! Each attempt starts from a fresh grid: carve, repair, check the density
//! band, place features and finally trace the requested routes. Rejected
//! attempts are discarded whole, so nothing from a failed attempt reaches the
//! published [`Generation`].

use abyssal_core::{
    CellCoord, CellToWorld, ConfigError, Event, Feature, FeatureKind, GenerationConfig,
    GenerationError, Path, PathOutcome, RejectionReason, RouteRequest, RouteTarget,
};
use abyssal_system_cave_carving::CaveCarver;
use abyssal_system_connectivity::{ConnectivityFiller, Repair};
use abyssal_system_feature_placement::{FeaturePlacer, Placement};
use abyssal_system_pathfinding::PathFinder;
use abyssal_world::{Grid, NavGraph, OpenTileSet};
use rand::Rng;

/// Route traced between two placed features.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Name requested by the configuration.
    pub name: String,
    /// Feature the route starts at.
    pub from: FeatureKind,
    /// Feature the route ends at, with `NearestMine` already resolved.
    pub to: FeatureKind,
    /// Path from the origin to the destination.
    pub path: Path,
}

/// Finished level published once every validation step passed.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    grid: Grid,
    features: Vec<Feature>,
    routes: Vec<Route>,
    attempts: u32,
}

impl Generation {
    /// Connected cave grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Placed features in plan order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Feature of the provided kind, if the plan placed one.
    #[must_use]
    pub fn feature(&self, kind: FeatureKind) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.kind == kind)
    }

    /// Traced routes in request order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route published under the provided name.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    /// One-based number of the attempt that produced the level.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Connected cave that met the density band, before any placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectedCave {
    /// Repaired grid.
    pub grid: Grid,
    /// One-based number of the accepted attempt.
    pub attempts: u32,
    /// Open cells in the repaired grid.
    pub open_cells: usize,
    /// Open-cell percentage of the repaired grid.
    pub density: f32,
}

/// Drives the full generation pipeline for a validated configuration.
#[derive(Debug)]
pub struct Generator {
    config: GenerationConfig,
    carver: CaveCarver,
    filler: ConnectivityFiller,
    placer: FeaturePlacer,
    finder: PathFinder,
}

impl Generator {
    /// Validates the configuration and prepares the pipeline systems.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self {
            carver: CaveCarver::new(config.carve),
            filler: ConnectivityFiller::new(config.density, config.retry.seed_attempts),
            placer: FeaturePlacer::new(config.retry.sampling_draws),
            finder: PathFinder::new(),
            config,
        })
    }

    /// Configuration the generator was built with.
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Carves caves until one meets the density band.
    ///
    /// Runs only the carve and repair stages; no features are placed. A
    /// carve without any open water fails the run immediately.
    pub fn carve_connected<R>(
        &mut self,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<ConnectedCave, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let cap = self.config.retry.generation_attempts;
        let mut last_density = 0.0;

        for attempt in 1..=cap {
            match self.carve_attempt(attempt, rng, out_events)? {
                CaveAttempt::Accepted { grid, repair } => {
                    return Ok(ConnectedCave {
                        grid,
                        attempts: attempt,
                        open_cells: repair.open_cells,
                        density: repair.density,
                    });
                }
                CaveAttempt::Rejected { density } => last_density = density,
            }
        }

        Err(GenerationError::GenerationRejected {
            attempts: cap,
            last_density,
        })
    }

    /// Runs the full pipeline and publishes the finished level.
    ///
    /// Density and placement failures restart the pipeline while attempts
    /// remain; once the cap is spent the last failure is returned. A carve
    /// without any open water, or a route the greedy search cannot trace,
    /// fails the run immediately.
    pub fn generate<R, M>(
        &mut self,
        rng: &mut R,
        mapping: &M,
        out_events: &mut Vec<Event>,
    ) -> Result<Generation, GenerationError>
    where
        R: Rng + ?Sized,
        M: CellToWorld + ?Sized,
    {
        let cap = self.config.retry.generation_attempts;
        let mut last_error = None;

        for attempt in 1..=cap {
            let (grid, repair) = match self.carve_attempt(attempt, rng, out_events)? {
                CaveAttempt::Accepted { grid, repair } => (grid, repair),
                CaveAttempt::Rejected { density } => {
                    last_error = Some(GenerationError::GenerationRejected {
                        attempts: cap,
                        last_density: density,
                    });
                    continue;
                }
            };

            let mut tiles = OpenTileSet::from_grid(&grid);
            let mut placed_events = Vec::new();
            let placements = match self.placer.place_all(
                &self.config.placement,
                &grid,
                &mut tiles,
                rng,
                &mut placed_events,
            ) {
                Ok(placements) => placements,
                Err(error) => {
                    log::warn!("attempt {attempt} rejected: {error}");
                    out_events.push(Event::AttemptRejected {
                        attempt,
                        reason: RejectionReason::PlacementFailed {
                            feature: failed_feature(&error),
                        },
                    });
                    last_error = Some(error);
                    continue;
                }
            };
            out_events.extend(placed_events);

            let nav = NavGraph::build(&grid, mapping);
            let mut routes = Vec::with_capacity(self.config.routes.len());
            for request in &self.config.routes {
                let route = trace_route(&mut self.finder, &nav, request, &placements)?;
                out_events.push(Event::RouteTraced {
                    route: route.name.clone(),
                    nodes: route.path.len(),
                });
                routes.push(route);
            }

            let features = placements
                .iter()
                .map(|placement| Feature {
                    kind: placement.kind,
                    cell: placement.cell,
                    position: mapping.cell_to_world(placement.cell),
                })
                .collect();

            log::info!(
                "generated {}x{} level on attempt {attempt} ({} open cells, {:.1}%)",
                grid.width(),
                grid.height(),
                repair.open_cells,
                repair.density
            );
            return Ok(Generation {
                grid,
                features,
                routes,
                attempts: attempt,
            });
        }

        Err(last_error.unwrap_or(GenerationError::GenerationRejected {
            attempts: cap,
            last_density: 0.0,
        }))
    }

    fn carve_attempt<R>(
        &mut self,
        attempt: u32,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<CaveAttempt, GenerationError>
    where
        R: Rng + ?Sized,
    {
        out_events.push(Event::AttemptStarted { attempt });
        log::debug!("attempt {attempt} started");

        let mut grid = self.carver.carve(rng);
        let repair = self.filler.repair(&mut grid, rng).map_err(|error| {
            log::error!("attempt {attempt} carved no open water: {error}");
            error
        })?;

        if !repair.accepted {
            log::debug!(
                "attempt {attempt} rejected: density {:.1}% outside {}..={}",
                repair.density,
                self.config.density.low,
                self.config.density.high
            );
            return Ok(reject(attempt, repair.density, out_events));
        }

        debug_assert!(abyssal_system_connectivity::is_connected(&grid));
        out_events.push(Event::CaveAccepted {
            attempt,
            open_cells: repair.open_cells,
            density: repair.density,
        });
        Ok(CaveAttempt::Accepted { grid, repair })
    }
}

enum CaveAttempt {
    Accepted { grid: Grid, repair: Repair },
    Rejected { density: f32 },
}

fn reject(attempt: u32, density: f32, out_events: &mut Vec<Event>) -> CaveAttempt {
    out_events.push(Event::AttemptRejected {
        attempt,
        reason: RejectionReason::DensityOutOfBand { density },
    });
    CaveAttempt::Rejected { density }
}

fn trace_route(
    finder: &mut PathFinder,
    nav: &NavGraph,
    request: &RouteRequest,
    placements: &[Placement],
) -> Result<Route, GenerationError> {
    let from = endpoint(request, request.from, placements)?;
    let to = match request.to {
        RouteTarget::Feature(kind) => endpoint(request, kind, placements)?,
        RouteTarget::NearestMine => nearest_mine(from.cell, placements)
            .ok_or_else(|| ConfigError::NoMinesForRoute(request.name.clone()))?,
    };

    match finder.find_path(nav, from.cell, to.cell) {
        PathOutcome::Found(path) => Ok(Route {
            name: request.name.clone(),
            from: from.kind,
            to: to.kind,
            path,
        }),
        PathOutcome::NotFound => {
            log::error!(
                "route `{}` found no path from {} to {} in a connected cave",
                request.name,
                from.cell,
                to.cell
            );
            Err(GenerationError::RouteDisconnected {
                route: request.name.clone(),
                from: from.cell,
                to: to.cell,
            })
        }
    }
}

fn endpoint(
    request: &RouteRequest,
    kind: FeatureKind,
    placements: &[Placement],
) -> Result<Placement, GenerationError> {
    placements
        .iter()
        .find(|placement| placement.kind == kind)
        .copied()
        .ok_or_else(|| {
            GenerationError::from(ConfigError::UnplacedRouteEndpoint {
                route: request.name.clone(),
                kind,
            })
        })
}

/// Mine closest to `origin`; the earliest placed mine wins ties.
fn nearest_mine(origin: CellCoord, placements: &[Placement]) -> Option<Placement> {
    let mut best: Option<(f32, Placement)> = None;
    for placement in placements.iter().filter(|placement| placement.kind.is_mine()) {
        let distance = origin.euclidean_distance(placement.cell);
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, *placement));
        }
    }
    best.map(|(_, placement)| placement)
}

fn failed_feature(error: &GenerationError) -> Option<FeatureKind> {
    match error {
        GenerationError::SamplingExhausted { feature, .. } => Some(*feature),
        _ => None,
    }
}
