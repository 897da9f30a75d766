//! # Membership Integration Test
//!
//! Proves every system's member set tracks its require/exclude predicate
//! through arbitrary attach, detach and destroy sequences.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use mosaic_core::{
    ComponentId, ComponentType, EcsError, EntityId, SystemDescriptor, SystemId, World,
    WorldConfig, ALL_CATEGORIES,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Pos {
    x: f32,
    y: f32,
}

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// Test: the documented Pos scenario.
#[test]
fn test_pos_scenario() {
    let mut world = World::new(WorldConfig::default()).unwrap();
    let pos = world.register_component::<Pos>().unwrap();

    let a = world.create().unwrap();
    let b = world.create().unwrap();
    world.attach(a, pos).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let system = world
        .register_system(
            SystemDescriptor::from_fn(move |_, entities| {
                *sink.borrow_mut() = entities.to_vec();
                0
            })
            .require(pos),
        )
        .unwrap();

    world.run_system(system, ALL_CATEGORIES).unwrap();
    assert_eq!(*seen.borrow(), vec![a]);
    assert_eq!(world.system_entity_count(system), Ok(1));

    world.attach(b, pos).unwrap();
    world.run_system(system, ALL_CATEGORIES).unwrap();
    let got: HashSet<_> = seen.borrow().iter().copied().collect();
    assert_eq!(got, HashSet::from([a, b]));
    assert_eq!(world.system_entity_count(system), Ok(2));

    world.detach(a, pos).unwrap();
    world.run_system(system, ALL_CATEGORIES).unwrap();
    assert_eq!(*seen.borrow(), vec![b]);
    assert_eq!(world.system_entity_count(system), Ok(1));
}

/// Test: a third component type is rejected when the limit is two.
#[test]
fn test_component_limit_of_two() {
    let mut world = World::new(WorldConfig::default().with_max_components(2)).unwrap();
    world.register_component::<Pos>().unwrap();
    world.register_component::<u32>().unwrap();
    assert_eq!(
        world.register_component::<u8>(),
        Err(EcsError::ComponentCapacityExceeded { max: 2 })
    );
}

/// Test: random mutations never break the predicate.
#[test]
fn test_random_mutations_keep_membership_exact() {
    let mut world = World::new(WorldConfig::default().with_initial_entity_capacity(4)).unwrap();
    let components: Vec<ComponentId> = (0..4)
        .map(|_| world.register_component::<u32>().unwrap())
        .collect();

    let predicates: Vec<(Vec<usize>, Vec<usize>)> = vec![
        (vec![], vec![]),
        (vec![0], vec![]),
        (vec![0, 1], vec![]),
        (vec![1], vec![2]),
        (vec![], vec![3]),
        (vec![2, 3], vec![0]),
    ];
    let systems: Vec<SystemId> = predicates
        .iter()
        .map(|(require, exclude)| {
            let mut descriptor = SystemDescriptor::from_fn(|_, _| 0);
            for &c in require {
                descriptor = descriptor.require(components[c]);
            }
            for &c in exclude {
                descriptor = descriptor.exclude(components[c]);
            }
            world.register_system(descriptor).unwrap()
        })
        .collect();

    let mut rng = Lcg(7);
    let mut alive: Vec<EntityId> = Vec::new();

    for _ in 0..5_000 {
        match rng.next(10) {
            0..=1 => alive.push(world.create().unwrap()),
            2 if !alive.is_empty() => {
                let e = alive.swap_remove(rng.next(alive.len()));
                world.destroy(e).unwrap();
            }
            _ if !alive.is_empty() => {
                let e = alive[rng.next(alive.len())];
                let c = components[rng.next(components.len())];
                if world.has(e, c) {
                    world.detach(e, c).unwrap();
                } else {
                    world.attach(e, c).unwrap();
                }
            }
            _ => {}
        }

        for (index, (require, exclude)) in predicates.iter().enumerate() {
            let expected: HashSet<EntityId> = alive
                .iter()
                .copied()
                .filter(|&e| {
                    require.iter().all(|&c| world.has(e, components[c]))
                        && !exclude.iter().any(|&c| world.has(e, components[c]))
                })
                .collect();
            let actual: HashSet<EntityId> =
                world.system_entities(systems[index]).unwrap().iter().copied().collect();
            assert_eq!(actual, expected, "system {index} drifted");
        }
    }

    // Ids of live entities never collide and are never zero
    let unique: HashSet<u32> = alive.iter().map(|e| e.get()).collect();
    assert_eq!(unique.len(), alive.len());
    assert!(!unique.contains(&0));
    assert_eq!(world.entity_count(), alive.len());
}

/// Test: attach then detach fires the destructor exactly once.
#[test]
fn test_attach_detach_round_trip() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);

    let mut world = World::new(WorldConfig::default()).unwrap();
    let pos = world
        .register_component_with(
            ComponentType::<Pos>::new().on_destruct(move |_, _: &mut Pos| {
                counter.set(counter.get() + 1);
            }),
        )
        .unwrap();

    let e = world.create().unwrap();
    world.attach(e, pos).unwrap();
    world.detach(e, pos).unwrap();
    assert!(!world.has(e, pos));
    assert_eq!(calls.get(), 1);

    // Destroying afterwards does not destruct the detached component again
    world.destroy(e).unwrap();
    assert_eq!(calls.get(), 1);
}

/// Test: members can be listed outside of a run.
#[test]
fn test_members_are_listed() {
    let mut world = World::new(WorldConfig::default()).unwrap();
    let pos = world.register_component::<Pos>().unwrap();
    let system = world
        .register_system(SystemDescriptor::from_fn(|_, _| 0).require(pos))
        .unwrap();
    let e = world.create().unwrap();
    world.insert(e, pos, Pos { x: 1.0, y: 2.0 }).unwrap();

    assert_eq!(world.system_entities(system), Ok(&[e][..]));
    assert_eq!(world.get::<Pos>(e, pos), Ok(&Pos { x: 1.0, y: 2.0 }));
}
