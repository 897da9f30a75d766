//! # Systems
//!
//! A system is an update routine paired with a component predicate: an
//! entity is a member while it carries every required component and none of
//! the excluded ones. Each system keeps its members in a [`SparseSet`] that
//! the world updates on every attach, detach and destroy.
//!
//! ## Callbacks
//!
//! - `update` gets `&mut World` and a snapshot of the member list
//! - `on_add` / `on_remove` get `&World`: they observe, they cannot mutate
//!
//! The system value itself is the system's user data; see
//! [`World::system`](crate::World::system).

use std::any::{type_name, Any};
use std::fmt;

use super::component::{ComponentId, ComponentMask};
use super::entity::EntityId;
use super::world::World;
use crate::collections::SparseSet;

/// Compile-time upper bound on systems per world.
pub const MAX_SYSTEMS: usize = 64;

/// Bitmask partitioning systems into selectively runnable groups.
pub type CategoryMask = u64;

/// Run every system regardless of its category.
pub const ALL_CATEGORIES: CategoryMask = CategoryMask::MAX;

/// Behavior of a registered system.
///
/// # Example
///
/// ```rust
/// use mosaic_core::{EntityId, System, World};
///
/// #[derive(Default)]
/// struct Census {
///     seen: usize,
/// }
///
/// impl System for Census {
///     fn update(&mut self, _world: &mut World, entities: &[EntityId]) -> i32 {
///         self.seen += entities.len();
///         0
///     }
///
///     fn on_add(&mut self, _world: &World, entity: EntityId) {
///         println!("{entity} joined");
///     }
/// }
/// ```
pub trait System: 'static {
    /// Runs one pass over the members.
    ///
    /// A non-zero return value is handed back to the caller of
    /// [`World::run_system`] and stops [`World::run_all_systems`].
    fn update(&mut self, world: &mut World, entities: &[EntityId]) -> i32;

    /// Called when `entity` becomes a member.
    fn on_add(&mut self, world: &World, entity: EntityId) {
        let _ = (world, entity);
    }

    /// Called when `entity` stops being a member. Its components are still
    /// readable.
    fn on_remove(&mut self, world: &World, entity: EntityId) {
        let _ = (world, entity);
    }
}

/// Adapter turning an update closure into a [`System`].
struct FnSystem<F>(F);

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, &[EntityId]) -> i32 + 'static,
{
    fn update(&mut self, world: &mut World, entities: &[EntityId]) -> i32 {
        (self.0)(world, entities)
    }
}

/// Object-safe view of a system that can be downcast to its concrete type.
pub(crate) trait AnySystem: System {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> AnySystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Handle of a registered system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SystemId(u32);

impl SystemId {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Registration index of this system.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to register a system.
///
/// # Example
///
/// ```rust
/// use mosaic_core::{SystemDescriptor, World, WorldConfig, ALL_CATEGORIES};
///
/// let mut world = World::new(WorldConfig::default()).unwrap();
/// let pos = world.register_component::<[f32; 2]>().unwrap();
/// let frozen = world.register_component::<()>().unwrap();
///
/// let movement = world
///     .register_system(
///         SystemDescriptor::from_fn(|_world, entities| entities.len() as i32 - 1)
///             .named("movement")
///             .require(pos)
///             .exclude(frozen),
///     )
///     .unwrap();
///
/// let e = world.create().unwrap();
/// world.attach(e, pos).unwrap();
/// assert_eq!(world.run_system(movement, ALL_CATEGORIES), Ok(0));
/// ```
pub struct SystemDescriptor {
    name: String,
    system: Box<dyn AnySystem>,
    require: Vec<ComponentId>,
    exclude: Vec<ComponentId>,
    mask: CategoryMask,
    enabled: bool,
}

impl SystemDescriptor {
    /// Describes `system` with no requirements, category mask 0 (runs under
    /// any mask), enabled.
    #[must_use]
    pub fn new<S: System>(system: S) -> Self {
        Self {
            name: type_name::<S>().to_string(),
            system: Box::new(system),
            require: Vec::new(),
            exclude: Vec::new(),
            mask: 0,
            enabled: true,
        }
    }

    /// Describes a system that only has an update closure.
    #[must_use]
    pub fn from_fn<F>(update: F) -> Self
    where
        F: FnMut(&mut World, &[EntityId]) -> i32 + 'static,
    {
        Self::new(FnSystem(update)).named("<fn>")
    }

    /// Name used in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required component.
    #[must_use]
    pub fn require(mut self, component: ComponentId) -> Self {
        self.require.push(component);
        self
    }

    /// Adds an excluded component.
    #[must_use]
    pub fn exclude(mut self, component: ComponentId) -> Self {
        self.exclude.push(component);
        self
    }

    /// Sets the category mask.
    #[must_use]
    pub fn mask(mut self, mask: CategoryMask) -> Self {
        self.mask = mask;
        self
    }

    /// Sets whether the system starts enabled.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builds the registry entry, rejecting component handles at or past
    /// `component_count`.
    pub(crate) fn into_record(
        self,
        component_count: usize,
        sparse_capacity: usize,
    ) -> Result<SystemRecord, ComponentId> {
        let require = build_mask(&self.require, component_count)?;
        let exclude = build_mask(&self.exclude, component_count)?;
        Ok(SystemRecord {
            name: self.name,
            callbacks: Some(self.system),
            require,
            exclude,
            mask: self.mask,
            enabled: self.enabled,
            members: SparseSet::with_capacity(sparse_capacity),
            pending: Vec::new(),
        })
    }
}

fn build_mask(components: &[ComponentId], component_count: usize) -> Result<ComponentMask, ComponentId> {
    let mut mask = ComponentMask::new();
    for &component in components {
        if component.index() >= component_count {
            return Err(component);
        }
        mask.set(component.index());
    }
    Ok(mask)
}

/// Membership change awaiting delivery to a system whose update is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MembershipEvent {
    Added(EntityId),
    Removed(EntityId),
}

/// A registered system.
pub(crate) struct SystemRecord {
    pub name: String,
    /// `None` while the system's own update runs.
    pub callbacks: Option<Box<dyn AnySystem>>,
    pub require: ComponentMask,
    pub exclude: ComponentMask,
    pub mask: CategoryMask,
    pub enabled: bool,
    pub members: SparseSet<EntityId>,
    pub pending: Vec<MembershipEvent>,
}

impl SystemRecord {
    /// The membership predicate.
    #[inline]
    pub fn matches(&self, components: &ComponentMask) -> bool {
        components.is_disjoint(&self.exclude) && components.contains_all(&self.require)
    }

    /// Whether a run under `mask` executes this system.
    #[inline]
    pub fn runs_under(&self, mask: CategoryMask) -> bool {
        self.enabled && (self.mask == 0 || self.mask & mask != 0)
    }
}
