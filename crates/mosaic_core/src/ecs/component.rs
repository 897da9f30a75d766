//! # Component Types
//!
//! Components are plain data: any `bytemuck::Pod` type qualifies. A type is
//! registered once per world and gets a small [`ComponentId`], which is its
//! bit in every [`ComponentMask`] and the index of its storage.
//!
//! Construct/destruct hooks are optional closures run on attach and
//! detach. They see the component in place and never the world.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::Pod;

use super::entity::EntityId;
use crate::collections::Bitset;

/// Words in a [`ComponentMask`].
#[cfg(not(feature = "wide-mask"))]
pub const MASK_WORDS: usize = 1;

/// Words in a [`ComponentMask`].
#[cfg(feature = "wide-mask")]
pub const MASK_WORDS: usize = 4;

/// Set of component types, one bit per [`ComponentId`].
pub type ComponentMask = Bitset<MASK_WORDS>;

/// Compile-time upper bound on component types per world.
pub const MAX_COMPONENTS: usize = ComponentMask::CAPACITY;

/// Marker trait for ECS components.
///
/// Components must be `Pod`: bitwise copyable, valid when zeroed, no
/// padding. Every such type is a component.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
/// ```
pub trait Component: Pod {}

impl<T: Pod> Component for T {}

/// Handle of a registered component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentId(u16);

impl ComponentId {
    #[inline]
    pub(crate) const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Bit index of this component in a [`ComponentMask`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-erased construct hook: entity, slot bytes, construction arguments.
pub(crate) type ConstructHook = Box<dyn FnMut(EntityId, &mut [u8], Option<&dyn Any>)>;

/// Type-erased destruct hook: entity, slot bytes.
pub(crate) type DestructHook = Box<dyn FnMut(EntityId, &mut [u8])>;

/// Registration descriptor for a component type.
///
/// # Example
///
/// ```rust
/// use mosaic_core::{ComponentType, World, WorldConfig};
///
/// let mut world = World::new(WorldConfig::default()).unwrap();
/// let health = world
///     .register_component_with(
///         ComponentType::<u32>::new()
///             .named("Health")
///             .on_construct(|_entity, hp, args| {
///                 *hp = args.and_then(|a| a.downcast_ref::<u32>()).copied().unwrap_or(100);
///             }),
///     )
///     .unwrap();
///
/// let e = world.create().unwrap();
/// world.attach(e, health).unwrap();
/// assert_eq!(world.get::<u32>(e, health).copied(), Ok(100));
/// ```
pub struct ComponentType<C: Component> {
    name: &'static str,
    on_construct: Option<ConstructHook>,
    on_destruct: Option<DestructHook>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentType<C> {
    /// Describes `C` with no hooks, named after its Rust type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: type_name::<C>(),
            on_construct: None,
            on_destruct: None,
            _marker: PhantomData,
        }
    }

    /// Overrides the name used in errors and logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Hook run after the slot is zeroed (or written by
    /// [`World::insert`](crate::World::insert)) and before the entity's
    /// mask bit is set.
    #[must_use]
    pub fn on_construct<F>(mut self, mut hook: F) -> Self
    where
        F: FnMut(EntityId, &mut C, Option<&dyn Any>) + 'static,
    {
        self.on_construct = Some(Box::new(
            move |entity: EntityId, bytes: &mut [u8], args: Option<&dyn Any>| {
                if let Ok(value) = bytemuck::try_from_bytes_mut::<C>(bytes) {
                    hook(entity, value, args);
                }
            },
        ));
        self
    }

    /// Hook run on detach and destroy, before the mask bit is cleared.
    #[must_use]
    pub fn on_destruct<F>(mut self, mut hook: F) -> Self
    where
        F: FnMut(EntityId, &mut C) + 'static,
    {
        self.on_destruct = Some(Box::new(move |entity: EntityId, bytes: &mut [u8]| {
            if let Ok(value) = bytemuck::try_from_bytes_mut::<C>(bytes) {
                hook(entity, value);
            }
        }));
        self
    }

    pub(crate) fn into_info(self) -> ComponentInfo {
        ComponentInfo {
            name: self.name,
            type_id: TypeId::of::<C>(),
            size: size_of::<C>(),
            align: align_of::<C>(),
            on_construct: self.on_construct,
            on_destruct: self.on_destruct,
        }
    }
}

impl<C: Component> Default for ComponentType<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Erased description of a registered component type.
pub(crate) struct ComponentInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    pub size: usize,
    pub align: usize,
    pub on_construct: Option<ConstructHook>,
    pub on_destruct: Option<DestructHook>,
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("on_construct", &self.on_construct.is_some())
            .field("on_destruct", &self.on_destruct.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_info_layout() {
        let info = ComponentType::<Position>::new().into_info();
        assert_eq!(info.size, 8);
        assert_eq!(info.align, 4);
        assert_eq!(info.type_id, TypeId::of::<Position>());
        assert!(info.name.ends_with("Position"));
    }

    #[test]
    fn test_hooks_see_typed_value() {
        let mut info = ComponentType::<Position>::new()
            .named("Pos")
            .on_construct(|_, pos, _| pos.x = 4.0)
            .into_info();
        assert_eq!(info.name, "Pos");

        let mut value = Position::zeroed();
        let ctor = info.on_construct.as_mut().unwrap();
        ctor(
            EntityId::new(1).unwrap(),
            bytemuck::bytes_of_mut(&mut value),
            None,
        );
        assert_eq!(value, Position { x: 4.0, y: 0.0 });
    }

    #[test]
    fn test_mask_capacity_matches_max_components() {
        assert_eq!(MAX_COMPONENTS, MASK_WORDS * 64);
        assert!(ComponentId::new(3).index() < MAX_COMPONENTS);
    }
}
