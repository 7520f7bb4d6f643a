#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Distance-constrained feature placement.
//!
//! The placer walks a [`PlacementPlan`] in order. Sampling rules draw tiles
//! from the [`OpenTileSet`] until their separation constraints hold or the
//! draw budget runs out; the centroid rule derives its tile from earlier
//! features and walks a fixed fallback chain when the derived cell is rock.

use std::fmt::Write as _;

use abyssal_core::{
    CellCoord, Event, FeatureKind, GenerationError, PlacementPlan, PlacementRule, PlacementSource,
    Separation,
};
use abyssal_world::{Grid, OpenTileSet};
use rand::Rng;

/// Feature location chosen by the placer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Kind of feature that was placed.
    pub kind: FeatureKind,
    /// Cell chosen for the feature.
    pub cell: CellCoord,
    /// How the cell was chosen.
    pub source: PlacementSource,
}

/// Candidate that won the centroid fallback chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CentroidChoice {
    /// The average of all three anchors was open.
    Centroid,
    /// The midpoint of the fallback pair at this index was open.
    Fallback(usize),
    /// Every derived candidate was rock and the tile was drawn at random.
    Random,
}

/// Pure system that turns a placement plan into feature coordinates.
#[derive(Clone, Copy, Debug)]
pub struct FeaturePlacer {
    sampling_draws: u32,
}

impl FeaturePlacer {
    /// Creates a placer that spends at most `sampling_draws` draws per constraint.
    #[must_use]
    pub const fn new(sampling_draws: u32) -> Self {
        Self { sampling_draws }
    }

    /// Executes every step of the plan and broadcasts one event per feature.
    ///
    /// Tiles chosen by consuming steps leave `tiles`; the others stay
    /// selectable for later steps.
    pub fn place_all<R>(
        &self,
        plan: &PlacementPlan,
        grid: &Grid,
        tiles: &mut OpenTileSet,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<Vec<Placement>, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let mut placed: Vec<Placement> = Vec::new();

        for step in plan.steps() {
            let batch = match &step.rule {
                PlacementRule::SeparatedPair {
                    first,
                    second,
                    separation,
                } => {
                    let (a, b, draws) = self.place_pair(tiles, *first, *second, separation, rng)?;
                    let source = PlacementSource::Sampled { draws };
                    vec![
                        Placement {
                            kind: *first,
                            cell: a,
                            source,
                        },
                        Placement {
                            kind: *second,
                            cell: b,
                            source,
                        },
                    ]
                }
                PlacementRule::Constrained {
                    kind,
                    anchors,
                    separation,
                } => {
                    let anchor_cells = anchors
                        .iter()
                        .map(|anchor| lookup(&placed, *anchor))
                        .collect::<Result<Vec<_>, _>>()?;
                    let (cell, draws) = self.place_constrained(
                        tiles,
                        *kind,
                        anchors,
                        &anchor_cells,
                        separation,
                        rng,
                    )?;
                    vec![Placement {
                        kind: *kind,
                        cell,
                        source: PlacementSource::Sampled { draws },
                    }]
                }
                PlacementRule::Centroid {
                    kind,
                    anchors,
                    fallbacks,
                } => {
                    let anchor_cells = [
                        lookup(&placed, anchors[0])?,
                        lookup(&placed, anchors[1])?,
                        lookup(&placed, anchors[2])?,
                    ];
                    let fallback_cells = fallbacks
                        .iter()
                        .map(|[a, b]| Ok([lookup(&placed, *a)?, lookup(&placed, *b)?]))
                        .collect::<Result<Vec<_>, GenerationError>>()?;
                    let (cell, choice) =
                        resolve_centroid(grid, tiles, *kind, anchor_cells, &fallback_cells, rng)?;
                    let source = match choice {
                        CentroidChoice::Centroid => PlacementSource::Centroid,
                        CentroidChoice::Fallback(index) => PlacementSource::PairMidpoint {
                            first: fallbacks[index][0],
                            second: fallbacks[index][1],
                        },
                        CentroidChoice::Random => PlacementSource::RandomFallback,
                    };
                    vec![Placement {
                        kind: *kind,
                        cell,
                        source,
                    }]
                }
            };

            for placement in batch {
                if step.consumes_tile {
                    let _ = tiles.remove(placement.cell);
                }
                log::debug!(
                    "placed {} at {} ({:?})",
                    placement.kind,
                    placement.cell,
                    placement.source
                );
                out_events.push(Event::FeaturePlaced {
                    kind: placement.kind,
                    cell: placement.cell,
                    source: placement.source,
                });
                placed.push(placement);
            }
        }

        Ok(placed)
    }

    /// Draws two distinct tiles at a time until their distance satisfies `separation`.
    ///
    /// Returns both tiles and the number of draws spent. Does not remove them.
    pub fn place_pair<R>(
        &self,
        tiles: &OpenTileSet,
        first: FeatureKind,
        second: FeatureKind,
        separation: &Separation,
        rng: &mut R,
    ) -> Result<(CellCoord, CellCoord, u32), GenerationError>
    where
        R: Rng + ?Sized,
    {
        for draw in 1..=self.sampling_draws {
            let a = sample(tiles, first, rng)?;
            let b = sample(tiles, second, rng)?;
            if a != b && separation.admits(a.euclidean_distance(b)) {
                return Ok((a, b, draw));
            }
        }

        Err(GenerationError::SamplingExhausted {
            feature: first,
            constraint: describe(separation, &[second]),
            draws: self.sampling_draws,
        })
    }

    /// Draws tiles until one satisfies `separation` to every anchor cell.
    ///
    /// Returns the tile and the number of draws spent. Does not remove it.
    pub fn place_constrained<R>(
        &self,
        tiles: &OpenTileSet,
        kind: FeatureKind,
        anchor_kinds: &[FeatureKind],
        anchors: &[CellCoord],
        separation: &Separation,
        rng: &mut R,
    ) -> Result<(CellCoord, u32), GenerationError>
    where
        R: Rng + ?Sized,
    {
        for draw in 1..=self.sampling_draws {
            let cell = sample(tiles, kind, rng)?;
            if anchors
                .iter()
                .all(|anchor| separation.admits(cell.euclidean_distance(*anchor)))
            {
                return Ok((cell, draw));
            }
        }

        Err(GenerationError::SamplingExhausted {
            feature: kind,
            constraint: describe(separation, anchor_kinds),
            draws: self.sampling_draws,
        })
    }
}

/// Derives a cell from three anchors, walking the fallback chain in order.
///
/// The centroid is the truncated average of the anchors. When it is rock,
/// the truncated midpoint of each fallback pair is tried in order, and when
/// all of them are rock a tile is drawn uniformly from `tiles`.
pub fn resolve_centroid<R>(
    grid: &Grid,
    tiles: &OpenTileSet,
    kind: FeatureKind,
    anchors: [CellCoord; 3],
    fallbacks: &[[CellCoord; 2]],
    rng: &mut R,
) -> Result<(CellCoord, CentroidChoice), GenerationError>
where
    R: Rng + ?Sized,
{
    for candidate in candidates(&anchors, fallbacks) {
        let (cell, choice) = match candidate {
            Candidate::Centroid(cell) => (cell, CentroidChoice::Centroid),
            Candidate::Midpoint(index, cell) => (cell, CentroidChoice::Fallback(index)),
        };
        if grid.is_open(cell) {
            return Ok((cell, choice));
        }
        log::warn!("{kind} {candidate} is rock");
    }

    log::warn!("every derived cell for {kind} is rock, drawing a random tile");
    let cell = sample(tiles, kind, rng)?;
    Ok((cell, CentroidChoice::Random))
}

/// Derived cell tried by [`resolve_centroid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidate {
    Centroid(CellCoord),
    Midpoint(usize, CellCoord),
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centroid(cell) => write!(f, "centroid {cell}"),
            Self::Midpoint(index, cell) => write!(f, "pair midpoint {index} at {cell}"),
        }
    }
}

fn candidates<'a>(
    anchors: &[CellCoord; 3],
    fallbacks: &'a [[CellCoord; 2]],
) -> impl Iterator<Item = Candidate> + 'a {
    std::iter::once(Candidate::Centroid(average(anchors))).chain(
        fallbacks
            .iter()
            .enumerate()
            .map(|(index, pair)| Candidate::Midpoint(index, average(pair))),
    )
}

fn average(cells: &[CellCoord]) -> CellCoord {
    let count = cells.len().max(1) as u64;
    let column: u64 = cells.iter().map(|cell| u64::from(cell.column())).sum();
    let row: u64 = cells.iter().map(|cell| u64::from(cell.row())).sum();
    CellCoord::new(
        u32::try_from(column / count).unwrap_or(u32::MAX),
        u32::try_from(row / count).unwrap_or(u32::MAX),
    )
}

fn sample<R>(
    tiles: &OpenTileSet,
    kind: FeatureKind,
    rng: &mut R,
) -> Result<CellCoord, GenerationError>
where
    R: Rng + ?Sized,
{
    tiles
        .sample(rng)
        .ok_or_else(|| GenerationError::NoOpenCellsAvailable {
            context: format!("placing `{kind}`"),
        })
}

fn lookup(placed: &[Placement], kind: FeatureKind) -> Result<CellCoord, GenerationError> {
    placed
        .iter()
        .find(|placement| placement.kind == kind)
        .map(|placement| placement.cell)
        .ok_or_else(|| GenerationError::NoOpenCellsAvailable {
            context: format!("resolving anchor `{kind}` before it was placed"),
        })
}

fn describe(separation: &Separation, anchors: &[FeatureKind]) -> String {
    let mut text = match separation.max {
        Some(max) => format!("{} <= distance <= {max}", separation.min),
        None => format!("distance >= {}", separation.min),
    };
    let names: Vec<String> = anchors.iter().map(ToString::to_string).collect();
    let _ = write!(text, " from {}", names.join(", "));
    text
}
