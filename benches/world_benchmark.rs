/*
 * Fluid Simulation Benchmark
 *
 * This file contains benchmarks for the simulation core to identify performance bottlenecks.
 * It measures the neighbour search for each partition mode, and the full update loop
 * for the built-in scenes.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use sph_fluid::fluid::find_neighbors;
use sph_fluid::{PartitionMode, Scene, SimulationParams, SpatialIndex, World};

const WORLD_SIZE: f32 = 10.0;

// A world of resting fluid particles scattered uniformly over the domain
fn random_fluid_world(n: usize, mode: PartitionMode) -> World {
    let params = SimulationParams {
        partition_mode: mode,
        ..SimulationParams::default()
    };
    let mut world = World::with_params(params).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..n {
        let x = rng.gen_range(0.0..WORLD_SIZE);
        let y = rng.gen_range(0.0..WORLD_SIZE);
        let handle = world.create_particle(x, y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, false).unwrap();
        world.set_fluid(handle, true).unwrap();
    }
    world
}

// Benchmark the neighbour search for each partition mode
fn bench_neighbor_search(c: &mut Criterion) {
    for mode in PartitionMode::ALL {
        let mut group = c.benchmark_group(format!("neighbor_search/{}", mode));

        for num_particles in [100, 500, 1000, 2000].iter() {
            group.bench_with_input(BenchmarkId::from_parameter(num_particles), num_particles, |b, &n| {
                let world = random_fluid_world(n, mode);
                let mut particles = world.particles().to_vec();
                let mut index = SpatialIndex::for_mode(mode, 1.0, WORLD_SIZE, WORLD_SIZE).unwrap();

                b.iter(|| {
                    if let Some(index) = index.as_mut() {
                        index.clear();
                    }
                    find_neighbors(&mut particles, index.as_mut(), 1.0, true);
                    black_box(&particles);
                });
            });
        }

        group.finish();
    }
}

// Benchmark the overall update loop
fn bench_update_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_loop");

    for scene in [Scene::DoubleColumns, Scene::Particles1024, Scene::Particles1600] {
        group.bench_function(BenchmarkId::from_parameter(scene.name()), |b| {
            let mut world = scene.load().unwrap();
            b.iter(|| {
                world.update();
                black_box(world.step_count());
            });
        });
    }

    group.finish();
}

// Configure the benchmarks
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_neighbor_search, bench_update_loop
}
criterion_main!(benches);
