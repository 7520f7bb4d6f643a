use abyssal_core::{
    CellCoord, CellState, Event, FeatureKind, GenerationError, PlacementPlan, PlacementRule,
    PlacementSource, PlacementStep, Separation,
};
use abyssal_system_feature_placement::{resolve_centroid, CentroidChoice, FeaturePlacer};
use abyssal_world::{Grid, OpenTileSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn toy_tiles() -> OpenTileSet {
    OpenTileSet::from_tiles(vec![
        CellCoord::new(2, 2),
        CellCoord::new(2, 40),
        CellCoord::new(40, 40),
    ])
}

fn open_field(width: u32, height: u32) -> Grid {
    let mut grid = Grid::walled(width, height);
    for column in 1..width - 1 {
        for row in 1..height - 1 {
            grid.set(CellCoord::new(column, row), CellState::Open);
        }
    }
    grid
}

fn start_goal_plan(separation: Separation) -> PlacementPlan {
    PlacementPlan::new(vec![PlacementStep::consuming(
        PlacementRule::SeparatedPair {
            first: FeatureKind::Start,
            second: FeatureKind::Goal,
            separation,
        },
    )])
}

#[test]
fn separated_pair_picks_distinct_tiles_far_enough_apart() {
    let placer = FeaturePlacer::new(256);
    let tiles = toy_tiles();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (a, b, draws) = placer
            .place_pair(
                &tiles,
                FeatureKind::Start,
                FeatureKind::Goal,
                &Separation::at_least(30.0),
                &mut rng,
            )
            .expect("every distinct pair is at least 38 apart");
        assert_ne!(a, b);
        assert!(tiles.contains(a) && tiles.contains(b));
        assert!(a.euclidean_distance(b) >= 30.0);
        assert!(draws >= 1);
    }
}

#[test]
fn tight_separation_leaves_only_the_diagonal_pair() {
    let placer = FeaturePlacer::new(512);
    let tiles = toy_tiles();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (a, b, _) = placer
            .place_pair(
                &tiles,
                FeatureKind::Start,
                FeatureKind::Goal,
                &Separation::at_least(40.0),
                &mut rng,
            )
            .expect("the diagonal pair is 53.7 apart");
        let mut pair = [a, b];
        pair.sort();
        assert_eq!(pair, [CellCoord::new(2, 2), CellCoord::new(40, 40)]);
    }
}

#[test]
fn unsatisfiable_separation_exhausts_the_draw_budget() {
    let placer = FeaturePlacer::new(64);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let error = placer
        .place_pair(
            &toy_tiles(),
            FeatureKind::Start,
            FeatureKind::Goal,
            &Separation::at_least(60.0),
            &mut rng,
        )
        .expect_err("no pair is 60 apart");

    match error {
        GenerationError::SamplingExhausted { feature, draws, .. } => {
            assert_eq!(feature, FeatureKind::Start);
            assert_eq!(draws, 64);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_tile_set_reports_no_open_cells() {
    let placer = FeaturePlacer::new(16);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let error = placer
        .place_constrained(
            &OpenTileSet::default(),
            FeatureKind::Midpoint,
            &[FeatureKind::Start],
            &[CellCoord::new(5, 5)],
            &Separation::at_least(1.0),
            &mut rng,
        )
        .expect_err("nothing to draw from");
    assert!(matches!(error, GenerationError::NoOpenCellsAvailable { .. }));
}

#[test]
fn constrained_tile_respects_the_band_to_its_anchor() {
    let grid = open_field(60, 60);
    let tiles = OpenTileSet::from_grid(&grid);
    let placer = FeaturePlacer::new(4096);
    let anchor = CellCoord::new(30, 30);

    for seed in 0..10 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (cell, _) = placer
            .place_constrained(
                &tiles,
                FeatureKind::Mine(0),
                &[FeatureKind::Goal],
                &[anchor],
                &Separation::between(15.0, 20.0),
                &mut rng,
            )
            .expect("the ring around the anchor is open");
        let distance = cell.euclidean_distance(anchor);
        assert!((15.0..=20.0).contains(&distance), "distance {distance}");
    }
}

#[test]
fn open_centroid_is_used_directly() {
    let grid = open_field(30, 30);
    let tiles = OpenTileSet::from_grid(&grid);
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let anchors = [
        CellCoord::new(2, 2),
        CellCoord::new(20, 2),
        CellCoord::new(2, 20),
    ];

    let (cell, choice) =
        resolve_centroid(&grid, &tiles, FeatureKind::Rendezvous, anchors, &[], &mut rng)
            .expect("centroid is open");
    assert_eq!(cell, CellCoord::new(8, 8));
    assert_eq!(choice, CentroidChoice::Centroid);
}

#[test]
fn rock_centroid_falls_back_to_pair_midpoints_in_order() {
    let a = CellCoord::new(2, 2);
    let b = CellCoord::new(20, 2);
    let c = CellCoord::new(2, 20);
    let fallbacks = [[a, c], [a, b], [b, c]];
    let tiles = OpenTileSet::from_tiles(vec![CellCoord::new(25, 25)]);
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let mut grid = Grid::walled(30, 30);
    grid.set(CellCoord::new(11, 2), CellState::Open);
    grid.set(CellCoord::new(11, 11), CellState::Open);
    let (cell, choice) = resolve_centroid(
        &grid,
        &tiles,
        FeatureKind::Rendezvous,
        [a, b, c],
        &fallbacks,
        &mut rng,
    )
    .expect("second midpoint is open");
    assert_eq!(cell, CellCoord::new(11, 2));
    assert_eq!(choice, CentroidChoice::Fallback(1));

    grid.set(CellCoord::new(2, 11), CellState::Open);
    let (cell, choice) = resolve_centroid(
        &grid,
        &tiles,
        FeatureKind::Rendezvous,
        [a, b, c],
        &fallbacks,
        &mut rng,
    )
    .expect("first midpoint is open");
    assert_eq!(cell, CellCoord::new(2, 11));
    assert_eq!(choice, CentroidChoice::Fallback(0));
}

#[test]
fn all_rock_candidates_draw_a_random_tile() {
    let grid = Grid::walled(30, 30);
    let tiles = OpenTileSet::from_tiles(vec![CellCoord::new(25, 25)]);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let a = CellCoord::new(2, 2);
    let b = CellCoord::new(20, 2);
    let c = CellCoord::new(2, 20);

    let (cell, choice) = resolve_centroid(
        &grid,
        &tiles,
        FeatureKind::Rendezvous,
        [a, b, c],
        &[[a, c], [a, b], [b, c]],
        &mut rng,
    )
    .expect("tile set is not empty");
    assert_eq!(cell, CellCoord::new(25, 25));
    assert_eq!(choice, CentroidChoice::Random);
}

#[test]
fn consuming_steps_remove_their_tiles() {
    let grid = Grid::walled(41, 41);
    let mut tiles = toy_tiles();
    let mut events = Vec::new();
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    let placements = FeaturePlacer::new(512)
        .place_all(
            &start_goal_plan(Separation::at_least(40.0)),
            &grid,
            &mut tiles,
            &mut rng,
            &mut events,
        )
        .expect("diagonal pair fits");

    assert_eq!(placements.len(), 2);
    assert_eq!(tiles.as_slice(), &[CellCoord::new(2, 40)]);
    assert_eq!(events.len(), 2);
}

#[test]
fn shipped_plan_places_every_feature_within_its_constraints() {
    let grid = open_field(120, 80);
    let plan = PlacementPlan::default();

    for seed in 0..5 {
        let mut tiles = OpenTileSet::from_grid(&grid);
        let before = tiles.clone();
        let mut events = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let placements = FeaturePlacer::new(4096)
            .place_all(&plan, &grid, &mut tiles, &mut rng, &mut events)
            .expect("open field fits the shipped plan");
        let cell_of = |kind| {
            placements
                .iter()
                .find(|placement| placement.kind == kind)
                .map(|placement| placement.cell)
                .expect("feature placed")
        };

        let kinds: Vec<_> = placements.iter().map(|placement| placement.kind).collect();
        assert_eq!(kinds, plan.placed_kinds());

        let start = cell_of(FeatureKind::Start);
        let goal = cell_of(FeatureKind::Goal);
        let midpoint = cell_of(FeatureKind::Midpoint);
        assert!(start.euclidean_distance(goal) >= 75.0);
        assert!(midpoint.euclidean_distance(start) >= 45.0);
        assert!(midpoint.euclidean_distance(goal) >= 45.0);

        let tethers = [
            (0, goal),
            (1, goal),
            (2, cell_of(FeatureKind::Mine(1))),
            (3, cell_of(FeatureKind::Mine(2))),
            (4, midpoint),
            (5, cell_of(FeatureKind::Mine(4))),
        ];
        for (index, anchor) in tethers {
            let distance = cell_of(FeatureKind::Mine(index)).euclidean_distance(anchor);
            assert!((15.0..=20.0).contains(&distance), "mine {index}: {distance}");
        }

        let rendezvous = placements
            .iter()
            .find(|placement| placement.kind == FeatureKind::Rendezvous)
            .expect("rendezvous placed");
        assert_eq!(rendezvous.source, PlacementSource::Centroid);
        assert!(grid.is_open(rendezvous.cell));
        let shared = placements.iter().any(|placement| {
            placement.kind != FeatureKind::Rendezvous && placement.cell == rendezvous.cell
        });
        if !shared {
            assert_eq!(
                tiles.contains(rendezvous.cell),
                before.contains(rendezvous.cell)
            );
        }

        for placement in placements
            .iter()
            .filter(|placement| placement.kind != FeatureKind::Rendezvous)
        {
            assert!(before.contains(placement.cell));
            assert!(!tiles.contains(placement.cell));
        }

        assert!(events.iter().all(|event| matches!(event, Event::FeaturePlaced { .. })));
        assert_eq!(events.len(), placements.len());
    }
}
