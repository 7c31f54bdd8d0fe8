// The grid and hash partitions must find exactly the neighbour sets of the all-pairs scan.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sph_fluid::{PartitionMode, SimulationParams, Vector2, World};

fn fluid_world(mode: PartitionMode, points: &[(f32, f32)]) -> World {
    let params = SimulationParams {
        partition_mode: mode,
        gravity: Vector2::ZERO,
        particle_collisions: false,
        ..SimulationParams::default()
    };
    let mut world = World::with_params(params).unwrap();
    for &(x, y) in points {
        let handle = world.create_particle(x, y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.05, false).unwrap();
        world.set_fluid(handle, true).unwrap();
    }
    world
}

// Neighbour lists after one step, as sorted sets of handle ids
fn neighbor_sets(mode: PartitionMode, points: &[(f32, f32)]) -> Vec<Vec<u64>> {
    let mut world = fluid_world(mode, points);
    world.update();
    let particles = world.particles();
    particles
        .iter()
        .map(|p| {
            let mut ids: Vec<u64> = p.fluid_neighbors.iter().map(|&j| particles[j].handle().id()).collect();
            ids.sort_unstable();
            ids
        })
        .collect()
}

fn assert_partitions_agree(points: &[(f32, f32)]) {
    let brute = neighbor_sets(PartitionMode::None, points);
    assert_eq!(neighbor_sets(PartitionMode::Grid, points), brute);
    assert_eq!(neighbor_sets(PartitionMode::Hash, points), brute);
}

#[test]
fn random_clouds_match_brute_force() {
    for seed in [1, 2, 3, 5, 8] {
        let mut rng = StdRng::seed_from_u64(seed);
        let points: Vec<(f32, f32)> = (0..300)
            .map(|_| (rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)))
            .collect();
        assert_partitions_agree(&points);
    }
}

#[test]
fn walls_corners_and_cell_edges_match_brute_force() {
    let mut points = vec![
        (0.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (10.0, 0.0),
        (0.5, 0.0),
        (9.5, 10.0),
        (0.0, 0.99),
    ];
    // Particles sitting exactly on cell boundaries, spaced at the smoothing length and just inside it
    for i in 0..10 {
        points.push((i as f32, 5.0));
        points.push((i as f32 + 0.999, 6.0));
        points.push((3.0, i as f32));
    }
    assert_partitions_agree(&points);
}

#[test]
fn particles_outside_the_domain_match_brute_force() {
    let points = [(-0.3, 5.0), (0.4, 5.0), (10.6, 2.0), (9.8, 2.0), (5.0, -1.2), (5.0, -0.4), (5.0, 11.5)];
    assert_partitions_agree(&points);
}

#[test]
fn dense_cluster_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(99);
    let points: Vec<(f32, f32)> = (0..400)
        .map(|_| (rng.gen_range(4.0..6.0), rng.gen_range(4.0..6.0)))
        .collect();
    assert_partitions_agree(&points);
}
