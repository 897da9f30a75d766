//! # ECS Performance Benchmark
//!
//! Measures the costs that dominate a frame:
//! - entity creation with membership updates
//! - attach/detach churn across several systems
//! - a full system pass over 100k members
//!
//! Run with: `cargo bench --package mosaic_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mosaic_core::{ComponentId, SystemDescriptor, World, WorldConfig, ALL_CATEGORIES};

/// Entities in the large-world benchmarks.
const ENTITY_COUNT: usize = 100_000;

fn world_with(count: usize) -> (World, ComponentId, ComponentId) {
    let config = WorldConfig::default()
        .with_initial_entity_capacity(count + 1)
        .with_initial_system_capacity(count + 1);
    let mut world = World::new(config).unwrap();
    let pos = world.register_component::<[f32; 3]>().unwrap();
    let vel = world.register_component::<[f32; 3]>().unwrap();
    (world, pos, vel)
}

/// Benchmark: create entities with one matching system registered.
fn bench_create_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_entities");

    for count in [1_000, 10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (mut world, _, _) = world_with(count);
                world.register_system(SystemDescriptor::from_fn(|_, _| 0)).unwrap();
                for _ in 0..count {
                    black_box(world.create().unwrap());
                }
                world.entity_count()
            });
        });
    }

    group.finish();
}

/// Benchmark: attach then detach a component watched by four systems.
fn bench_attach_detach_churn(c: &mut Criterion) {
    let (mut world, pos, vel) = world_with(10_000);
    for _ in 0..4 {
        world
            .register_system(SystemDescriptor::from_fn(|_, _| 0).require(pos).require(vel))
            .unwrap();
    }
    let entities: Vec<_> = (0..10_000)
        .map(|_| {
            let e = world.create().unwrap();
            world.attach(e, pos).unwrap();
            e
        })
        .collect();

    c.bench_function("attach_detach_10k_x4_systems", |b| {
        b.iter(|| {
            for &e in &entities {
                world.attach(e, vel).unwrap();
            }
            for &e in &entities {
                world.detach(e, vel).unwrap();
            }
        });
    });
}

/// Benchmark: one movement pass over every member.
fn bench_system_pass(c: &mut Criterion) {
    let (mut world, pos, vel) = world_with(ENTITY_COUNT);
    world
        .register_system(
            SystemDescriptor::from_fn(move |world, entities| {
                for &e in entities {
                    let Ok(&[dx, dy, dz]) = world.get::<[f32; 3]>(e, vel) else {
                        continue;
                    };
                    if let Ok(p) = world.get_mut::<[f32; 3]>(e, pos) {
                        p[0] += dx;
                        p[1] += dy;
                        p[2] += dz;
                    }
                }
                0
            })
            .require(pos)
            .require(vel),
        )
        .unwrap();

    for i in 0..ENTITY_COUNT {
        let e = world.create().unwrap();
        let f = i as f32;
        world.insert(e, pos, [f, f, f]).unwrap();
        world.insert(e, vel, [0.1_f32, 0.2, 0.3]).unwrap();
    }

    c.bench_function("system_pass_100k", |b| {
        b.iter(|| black_box(world.run_all_systems(ALL_CATEGORIES)));
    });
}

/// Benchmark: queue every entity for destruction from inside an update.
fn bench_deferred_destroy(c: &mut Criterion) {
    c.bench_function("deferred_destroy_10k", |b| {
        b.iter(|| {
            let (mut world, pos, _) = world_with(10_000);
            let reaper = world
                .register_system(
                    SystemDescriptor::from_fn(|world, entities| {
                        for &e in entities {
                            let _ = world.queue_destroy(e);
                        }
                        0
                    })
                    .require(pos),
                )
                .unwrap();
            for _ in 0..10_000 {
                let e = world.create().unwrap();
                world.attach(e, pos).unwrap();
            }
            world.run_system(reaper, ALL_CATEGORIES).unwrap();
            world.entity_count()
        });
    });
}

criterion_group!(
    benches,
    bench_create_entities,
    bench_attach_detach_churn,
    bench_system_pass,
    bench_deferred_destroy,
);
criterion_main!(benches);
