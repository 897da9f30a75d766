//! # Entity Component System
//!
//! Entities are bare ids, components are plain-data columns indexed by entity
//! id, and systems are update routines over the entities matching a
//! require/exclude predicate.
//!
//! ## Design Philosophy
//!
//! - Membership is maintained incrementally on every attach/detach/destroy
//! - Component storage grows by doubling and is never compacted
//! - Destructive work issued during an update is deferred to a flush

mod component;
mod entity;
mod storage;
mod system;
mod world;

pub use component::{Component, ComponentId, ComponentMask, ComponentType, MASK_WORDS, MAX_COMPONENTS};
pub use entity::{EntityId, EntityRecord, EntityRegistry};
pub use storage::{ComponentStorage, MAX_COMPONENT_ALIGN};
pub use system::{CategoryMask, System, SystemDescriptor, SystemId, ALL_CATEGORIES, MAX_SYSTEMS};
pub use world::World;
