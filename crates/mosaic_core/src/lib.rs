//! # MOSAIC Core
//!
//! Entity Component System runtime with incrementally maintained system
//! membership:
//! - Components are plain data in per-type arenas indexed by entity id
//! - Systems select entities with require/exclude component predicates
//! - Destruction requested mid-update is deferred until the update returns
//!
//! ## Architecture Rules
//!
//! 1. **Entity ids are dense** - metadata and storage are indexed directly
//! 2. **Membership is never recomputed per frame** - it changes only on
//!    attach, detach and destroy
//! 3. **Iteration is stable** - an update sees a snapshot of its members
//!
//! ## Example
//!
//! ```rust
//! use mosaic_core::{SystemDescriptor, World, WorldConfig, ALL_CATEGORIES};
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//! let pos = world.register_component::<[f32; 2]>().unwrap();
//! let vel = world.register_component::<[f32; 2]>().unwrap();
//!
//! let movement = world
//!     .register_system(
//!         SystemDescriptor::from_fn(move |world, entities| {
//!             for &e in entities {
//!                 let [dx, dy] = *world.get::<[f32; 2]>(e, vel).unwrap();
//!                 let p = world.get_mut::<[f32; 2]>(e, pos).unwrap();
//!                 p[0] += dx;
//!                 p[1] += dy;
//!             }
//!             0
//!         })
//!         .require(pos)
//!         .require(vel),
//!     )
//!     .unwrap();
//!
//! let e = world.create().unwrap();
//! world.attach(e, pos).unwrap();
//! world.insert(e, vel, [1.0_f32, 2.0]).unwrap();
//! world.run_all_systems(ALL_CATEGORIES).unwrap();
//! assert_eq!(world.get::<[f32; 2]>(e, pos), Ok(&[1.0, 2.0]));
//! # let _ = movement;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    CategoryMask, Component, ComponentId, ComponentStorage, ComponentType, EntityId, System,
    SystemDescriptor, SystemId, World, ALL_CATEGORIES, MAX_COMPONENTS, MAX_SYSTEMS,
};
pub use error::{EcsError, EcsResult};
