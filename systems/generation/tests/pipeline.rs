use abyssal_core::{
    CarveConfig, CellCoord, CellToWorld, DensityBand, Event, FeatureKind, GenerationConfig,
    GenerationError, MirroredCellCenter, PlacementPlan, PlacementRule, PlacementStep, Position,
    RejectionReason, RetryCaps, Separation,
};
use abyssal_system_connectivity::is_connected;
use abyssal_system_generation::{Generation, Generator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn fifty_by_fifty(fill_probability: f32, generation_attempts: u32) -> GenerationConfig {
    GenerationConfig {
        carve: CarveConfig {
            width: 50,
            height: 50,
            fill_probability,
            growth_steps: 4,
            smooth_steps: 2,
            growth_threshold: 4,
            shrink_threshold: 2,
        },
        density: DensityBand::new(45.0, 55.0),
        retry: RetryCaps {
            generation_attempts,
            ..RetryCaps::default()
        },
        ..GenerationConfig::default()
    }
}

fn generate(seed: u64) -> (Generation, Vec<Event>) {
    let config = GenerationConfig::default();
    let mapping = MirroredCellCenter::new(config.carve.width, config.carve.height, 1.0);
    let mut generator = Generator::new(config).expect("shipped preset is valid");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut events = Vec::new();
    let generation = generator
        .generate(&mut rng, &mapping, &mut events)
        .expect("shipped preset generates a level");
    (generation, events)
}

fn assert_border_is_rock(generation: &Generation) {
    let grid = generation.grid();
    for cell in grid.coords().filter(|&cell| grid.is_border(cell)) {
        assert!(!grid.is_open(cell), "border cell {cell} is open");
    }
}

#[test]
fn fifty_by_fifty_cave_is_accepted_within_the_retry_cap() {
    for seed in 0..6 {
        let mut generator = Generator::new(fifty_by_fifty(0.52, 50)).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut events = Vec::new();

        let cave = generator
            .carve_connected(&mut rng, &mut events)
            .expect("a cave meets the band within 50 attempts");

        assert!(cave.attempts < 50);
        assert!((45.0..=55.0).contains(&cave.density), "density {}", cave.density);
        assert_eq!(cave.open_cells, cave.grid.open_count());
        assert!(is_connected(&cave.grid));
        for cell in cave.grid.coords().filter(|&cell| cave.grid.is_border(cell)) {
            assert!(!cave.grid.is_open(cell));
        }

        let accepted = events
            .iter()
            .filter(|event| matches!(event, Event::CaveAccepted { .. }))
            .count();
        assert_eq!(accepted, 1);
    }
}

#[test]
fn sparse_fill_is_rejected_once_the_cap_runs_out() {
    let mut generator = Generator::new(fifty_by_fifty(0.45, 4)).expect("valid config");
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = Vec::new();

    let error = generator
        .carve_connected(&mut rng, &mut events)
        .expect_err("0.45 fill leaves too little open water");

    match error {
        GenerationError::GenerationRejected {
            attempts,
            last_density,
        } => {
            assert_eq!(attempts, 4);
            assert!(last_density < 45.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let rejected = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::AttemptRejected {
                    reason: RejectionReason::DensityOutOfBand { .. },
                    ..
                }
            )
        })
        .count();
    assert_eq!(rejected, 4);
}

#[test]
fn rock_without_open_water_is_surfaced_not_retried() {
    let mut config = fifty_by_fifty(0.0, 3);
    config.carve.growth_steps = 0;
    config.carve.smooth_steps = 0;
    let mapping = MirroredCellCenter::new(50, 50, 1.0);

    let mut generator = Generator::new(config.clone()).expect("valid config");
    let mut events = Vec::new();
    let error = generator
        .generate(&mut ChaCha8Rng::seed_from_u64(3), &mapping, &mut events)
        .expect_err("an unseeded grid stays solid rock");
    assert!(matches!(error, GenerationError::NoOpenCellsAvailable { .. }));
    assert_eq!(events, vec![Event::AttemptStarted { attempt: 1 }]);

    let mut generator = Generator::new(config).expect("valid config");
    let mut events = Vec::new();
    let error = generator
        .carve_connected(&mut ChaCha8Rng::seed_from_u64(3), &mut events)
        .expect_err("an unseeded grid stays solid rock");
    assert!(matches!(error, GenerationError::NoOpenCellsAvailable { .. }));
    assert_eq!(events, vec![Event::AttemptStarted { attempt: 1 }]);
}

#[test]
fn invalid_configuration_is_refused_up_front() {
    let mut config = GenerationConfig::default();
    config.carve.fill_probability = 1.5;
    assert!(matches!(
        Generator::new(config),
        Err(GenerationError::InvalidConfig(_))
    ));
}

#[test]
fn impossible_placement_surfaces_sampling_exhaustion() {
    let config = GenerationConfig {
        density: DensityBand::new(0.0, 100.0),
        retry: RetryCaps {
            generation_attempts: 3,
            sampling_draws: 16,
            ..RetryCaps::default()
        },
        placement: PlacementPlan::new(vec![PlacementStep::consuming(
            PlacementRule::SeparatedPair {
                first: FeatureKind::Start,
                second: FeatureKind::Goal,
                separation: Separation::at_least(1000.0),
            },
        )]),
        routes: Vec::new(),
        ..GenerationConfig::default()
    };
    let mapping = |cell: CellCoord| Position::new(cell.column() as f32, cell.row() as f32);
    let mut generator = Generator::new(config).expect("valid config");
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut events = Vec::new();

    let error = generator
        .generate(&mut rng, &mapping, &mut events)
        .expect_err("no cave is 1000 cells wide");

    assert!(matches!(
        error,
        GenerationError::SamplingExhausted {
            feature: FeatureKind::Start,
            draws: 16,
            ..
        }
    ));
    let placement_failures = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::AttemptRejected {
                    reason: RejectionReason::PlacementFailed {
                        feature: Some(FeatureKind::Start)
                    },
                    ..
                }
            )
        })
        .count();
    assert_eq!(placement_failures, 3);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::FeaturePlaced { .. })));
}

#[test]
fn shipped_preset_meets_every_level_property() {
    for seed in 0..3 {
        let (generation, events) = generate(seed);
        let grid = generation.grid();
        let config = GenerationConfig::default();
        let mapping = MirroredCellCenter::new(grid.width(), grid.height(), 1.0);

        assert_border_is_rock(&generation);
        assert!(is_connected(grid));
        assert!(config.density.contains(grid.density()));

        let cell = |kind| generation.feature(kind).expect("feature placed").cell;
        let start = cell(FeatureKind::Start);
        let goal = cell(FeatureKind::Goal);
        let midpoint = cell(FeatureKind::Midpoint);
        assert!(start.euclidean_distance(goal) >= 75.0);
        assert!(midpoint.euclidean_distance(start) >= 45.0);
        assert!(midpoint.euclidean_distance(goal) >= 45.0);
        let tethers = [
            (FeatureKind::Mine(0), goal),
            (FeatureKind::Mine(1), goal),
            (FeatureKind::Mine(2), cell(FeatureKind::Mine(1))),
            (FeatureKind::Mine(3), cell(FeatureKind::Mine(2))),
            (FeatureKind::Mine(4), midpoint),
            (FeatureKind::Mine(5), cell(FeatureKind::Mine(4))),
        ];
        for (kind, anchor) in tethers {
            let distance = cell(kind).euclidean_distance(anchor);
            assert!((15.0..=20.0).contains(&distance), "{kind}: {distance}");
        }

        for feature in generation.features() {
            assert!(grid.is_open(feature.cell));
            assert_eq!(feature.position, mapping.cell_to_world(feature.cell));
        }

        assert_eq!(generation.routes().len(), config.routes.len());
        for route in generation.routes() {
            let cells = route.path.cells();
            let positions = route.path.positions();
            assert_eq!(cells.first(), Some(&cell(route.from)));
            assert_eq!(cells.last(), Some(&cell(route.to)));
            assert_eq!(
                positions.first(),
                Some(&generation.feature(route.from).expect("origin").position)
            );
            assert_eq!(
                positions.last(),
                Some(&generation.feature(route.to).expect("destination").position)
            );
            for (cell, position) in cells.iter().zip(positions) {
                assert!(grid.is_open(*cell));
                assert_eq!(*position, mapping.cell_to_world(*cell));
            }
            for pair in cells.windows(2) {
                assert!(pair[0].is_moore_adjacent(pair[1]));
            }
        }

        let nearest = generation
            .route("start-to-nearest-mine")
            .expect("route requested");
        let closest = generation
            .features()
            .iter()
            .filter(|feature| feature.kind.is_mine())
            .map(|feature| feature.cell.euclidean_distance(start))
            .fold(f32::INFINITY, f32::min);
        assert!(nearest.to.is_mine());
        assert_eq!(cell(nearest.to).euclidean_distance(start), closest);

        let accepted: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::CaveAccepted { attempt, .. } => Some(*attempt),
                _ => None,
            })
            .collect();
        assert_eq!(accepted.last(), Some(&generation.attempts()));
    }
}
