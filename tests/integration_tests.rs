//! End-to-end checks of the gravity model and the adaptive zone system.

use adaptive_zoning::{
    AdaptiveZoneSystem, CalibrationConfig, GravityConfig, ZoneSystemBuilder, ZoningError,
    calibrate_doubly_constrained, distance_matrix_from_points, doubly_constrained,
};

fn grid_points(side: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            points.push((col as f64, row as f64));
        }
    }
    points
}

/// Uneven but balanced demand over the grid, deterministic.
fn demand(n: usize) -> (Vec<f64>, Vec<f64>) {
    let origins: Vec<f64> = (0..n).map(|i| 1.0 + ((i * 7) % 5) as f64 * 0.5).collect();
    let destinations: Vec<f64> = origins.iter().rev().copied().collect();
    (origins, destinations)
}

#[test]
fn balanced_marginals_across_betas() {
    let points = grid_points(4);
    let distance = distance_matrix_from_points(&points).unwrap();
    let (origins, destinations) = demand(points.len());
    let config = GravityConfig::default();

    for beta in [0.1, 0.5, 1.0, 2.0] {
        let out = doubly_constrained(&origins, &destinations, &distance, beta, &config, None)
            .unwrap_or_else(|err| panic!("beta {beta}: {err}"));
        for i in 0..points.len() {
            let row: f64 = out.trips[i].iter().sum();
            let col: f64 = out.trips.iter().map(|r| r[i]).sum();
            assert!(
                (row - origins[i]).abs() / origins[i] < 1e-5,
                "beta {beta}, row {i}"
            );
            assert!(
                (col - destinations[i]).abs() / destinations[i] < 1e-5,
                "beta {beta}, col {i}"
            );
        }
    }
}

#[test]
fn mean_trip_distance_is_strictly_decreasing_in_beta() {
    let points = grid_points(4);
    let distance = distance_matrix_from_points(&points).unwrap();
    let (origins, destinations) = demand(points.len());
    let config = GravityConfig::default();

    let mut previous = f64::INFINITY;
    for beta in [0.05, 0.2, 0.5, 1.0, 2.0, 4.0] {
        let mean = doubly_constrained(&origins, &destinations, &distance, beta, &config, None)
            .unwrap()
            .mean_distance;
        assert!(mean < previous, "mean not decreasing at beta {beta}");
        previous = mean;
    }
}

#[test]
fn calibration_round_trip_hits_the_target() {
    let points = grid_points(5);
    let distance = distance_matrix_from_points(&points).unwrap();
    let (origins, destinations) = demand(points.len());
    let config = CalibrationConfig {
        beta_max: 5.0,
        ..CalibrationConfig::default()
    };

    for target in [0.8, 1.2, 1.6] {
        let beta =
            calibrate_doubly_constrained(&origins, &destinations, &distance, target, &config)
                .unwrap_or_else(|err| panic!("target {target}: {err}"));
        let mean = doubly_constrained(
            &origins,
            &destinations,
            &distance,
            beta,
            &config.gravity,
            None,
        )
        .unwrap()
        .mean_distance;
        assert!(
            (mean - target).abs() < 1e-3,
            "target {target}, got {mean} at beta {beta}"
        );
    }
}

#[test]
fn four_point_scenario_converges_symmetrically() {
    let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    let distance = distance_matrix_from_points(&points).unwrap();
    let totals = vec![1.0; 4];

    let out = doubly_constrained(
        &totals,
        &totals,
        &distance,
        1.0,
        &GravityConfig::default(),
        None,
    )
    .unwrap();

    assert!(out.iterations <= 100);
    for i in 0..4 {
        let row: f64 = out.trips[i].iter().sum();
        let col: f64 = out.trips.iter().map(|r| r[i]).sum();
        assert!((row - 1.0).abs() < 1e-5);
        assert!((col - 1.0).abs() < 1e-5);
        for j in 0..4 {
            assert!((out.trips[i][j] - out.trips[j][i]).abs() < 1e-9);
        }
    }
}

#[test]
fn four_point_scenario_splits_into_two_pairs() {
    let system = AdaptiveZoneSystem::new(
        vec![1.0; 4],
        vec![1.0; 4],
        vec![1.0; 4],
        vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)],
        1.0,
        2,
    )
    .unwrap();

    let zones = system.select_resolution(2);
    assert_eq!(zones.len(), 2);
    let mut covered = Vec::new();
    for &zone in &zones {
        let leaves = system.leaves_of(zone).unwrap();
        assert_eq!(leaves.len(), 2);
        covered.extend(leaves);
    }
    covered.sort_unstable();
    assert_eq!(covered, vec![0, 1, 2, 3]);
}

#[test]
fn every_resolution_partitions_exactly() {
    let points = grid_points(3);
    let n = points.len();
    let (origins, destinations) = demand(n);
    let weights = vec![1.0; n];
    let system = ZoneSystemBuilder::new(origins, destinations, weights, points, 0.5, 4)
        .build()
        .unwrap();

    let all_leaves: Vec<usize> = (0..n).collect();
    for m in 1..=n {
        let zones = system.select_resolution(m);
        assert_eq!(zones.len(), m, "resolution {m}");
        let mut covered: Vec<usize> = zones
            .iter()
            .flat_map(|&zone| system.leaves_of(zone).unwrap())
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, all_leaves, "resolution {m}");
    }

    // Out-of-range requests clamp instead of failing.
    assert_eq!(system.select_resolution(0).len(), 1);
    assert_eq!(system.select_resolution(n + 10).len(), n);
}

#[test]
fn neighbourhood_queries_are_sorted_and_exclusive() {
    let points = grid_points(3);
    let n = points.len();
    let (origins, destinations) = demand(n);
    let system = AdaptiveZoneSystem::new(origins, destinations, vec![1.0; n], points, 0.5, 4)
        .unwrap();

    let centre = 4; // middle of the 3x3 grid
    let neighbours = system.neighbourhood(centre, 5).unwrap();
    assert_eq!(neighbours.len(), 5);
    assert!(!neighbours.contains(&centre));

    let (cx, cy) = system.centroid(centre).unwrap();
    let dist = |zone: usize| {
        let (x, y) = system.centroid(zone).unwrap();
        ((x - cx).powi(2) + (y - cy).powi(2)).sqrt()
    };
    for pair in neighbours.windows(2) {
        assert!(dist(pair[0]) <= dist(pair[1]), "{neighbours:?} out of order");
    }

    // Requesting more than exist returns all peers, nothing more.
    let everyone = system.neighbourhood(centre, 100).unwrap();
    assert_eq!(everyone.len(), n - 1);
}

#[test]
fn leaf_neighbourhoods_partition_and_respect_size() {
    let points = grid_points(4);
    let n = points.len();
    let (origins, destinations) = demand(n);
    let system = AdaptiveZoneSystem::new(origins, destinations, vec![1.0; n], points, 0.5, 6)
        .unwrap();

    let all_leaves: Vec<usize> = (0..n).collect();
    for neighbourhood in system.leaf_neighbourhoods() {
        assert!(!neighbourhood.is_empty());
        assert!(neighbourhood.len() <= 6);
        let mut covered: Vec<usize> = neighbourhood
            .iter()
            .flat_map(|&zone| system.leaves_of(zone).unwrap())
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, all_leaves);
    }
}

#[test]
fn invalid_inputs_surface_typed_errors() {
    // Mismatched arrays.
    let err = AdaptiveZoneSystem::new(
        vec![1.0; 3],
        vec![1.0; 2],
        vec![1.0; 3],
        vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)],
        1.0,
        2,
    )
    .unwrap_err();
    assert!(matches!(err, ZoningError::InvalidInput(_)));

    // Unbalanced totals.
    let distance = distance_matrix_from_points(&[(0.0, 0.0), (1.0, 0.0)]).unwrap();
    let err = doubly_constrained(
        &[1.0, 1.0],
        &[2.0, 2.0],
        &distance,
        1.0,
        &GravityConfig::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ZoningError::InvalidInput(_)));

    // Bracket not straddling the target.
    let err = calibrate_doubly_constrained(
        &[1.0, 1.0],
        &[1.0, 1.0],
        &distance,
        50.0,
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ZoningError::Calibration(_)));
}
