//! # ECS World
//!
//! The central container: entity metadata, one storage per component type,
//! the system registry, and the deferred destroy/remove queues.
//!
//! Every mutation keeps each system's member set equal to the set of ready
//! entities matching its predicate. Destructive work requested from inside
//! an update is queued and applied after the update returns.

use std::any::{type_name, Any, TypeId};

use super::component::{Component, ComponentId, ComponentInfo, ComponentMask, ComponentType};
use super::entity::{EntityId, EntityRegistry};
use super::storage::{ComponentStorage, MAX_COMPONENT_ALIGN};
use super::system::{
    AnySystem, CategoryMask, MembershipEvent, System, SystemDescriptor, SystemId, SystemRecord,
};
use crate::collections::IdList;
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// A registered component type and its storage.
struct ComponentColumn {
    info: ComponentInfo,
    storage: ComponentStorage,
}

/// The ECS World - container for all simulation state.
///
/// # Example
///
/// ```rust
/// use mosaic_core::{SystemDescriptor, World, WorldConfig, ALL_CATEGORIES};
///
/// let mut world = World::new(WorldConfig::default()).unwrap();
/// let hp = world.register_component::<i32>().unwrap();
///
/// let decay = world
///     .register_system(
///         SystemDescriptor::from_fn(move |world, entities| {
///             for &entity in entities {
///                 let dead = {
///                     let value = world.get_mut::<i32>(entity, hp).unwrap();
///                     *value -= 10;
///                     *value <= 0
///                 };
///                 if dead {
///                     world.queue_destroy(entity).unwrap();
///                 }
///             }
///             0
///         })
///         .require(hp),
///     )
///     .unwrap();
///
/// let e = world.create().unwrap();
/// world.insert(e, hp, 15).unwrap();
///
/// world.run_system(decay, ALL_CATEGORIES).unwrap();
/// assert!(world.is_ready(e));
/// world.run_system(decay, ALL_CATEGORIES).unwrap();
/// assert!(!world.is_ready(e));
/// ```
pub struct World {
    config: WorldConfig,
    entities: EntityRegistry,
    components: Vec<ComponentColumn>,
    systems: Vec<SystemRecord>,
    /// Entities awaiting destruction, in queue order.
    destroy_queue: IdList<EntityId>,
    /// Components awaiting detachment, in queue order.
    remove_queue: IdList<(EntityId, ComponentId)>,
    /// Reusable member snapshots, one per nested `run_system`.
    scratch: Vec<Vec<EntityId>>,
    /// System updates currently on the call stack.
    running: usize,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        tracing::debug!(
            max_components = config.max_components,
            max_systems = config.max_systems,
            initial_entity_capacity = config.initial_entity_capacity,
            "created world"
        );
        Ok(Self {
            entities: EntityRegistry::new(config.initial_entity_capacity),
            components: Vec::with_capacity(config.max_components),
            systems: Vec::with_capacity(config.max_systems),
            destroy_queue: IdList::new(),
            remove_queue: IdList::new(),
            scratch: Vec::new(),
            running: 0,
            config,
        })
    }

    /// The configuration this world was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers `C` as a component type without hooks.
    ///
    /// # Errors
    ///
    /// See [`register_component_with`](Self::register_component_with).
    pub fn register_component<C: Component>(&mut self) -> EcsResult<ComponentId> {
        self.register_component_with(ComponentType::<C>::new())
    }

    /// Registers a component type with its hooks.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentCapacityExceeded`] past `max_components`,
    /// [`EcsError::UnsupportedAlignment`] for over-aligned types.
    pub fn register_component_with<C: Component>(
        &mut self,
        component: ComponentType<C>,
    ) -> EcsResult<ComponentId> {
        let max = self.config.max_components;
        if self.components.len() >= max {
            return Err(EcsError::ComponentCapacityExceeded { max });
        }
        let info = component.into_info();
        if info.align > MAX_COMPONENT_ALIGN {
            return Err(EcsError::UnsupportedAlignment {
                name: info.name,
                align: info.align,
                max: MAX_COMPONENT_ALIGN,
            });
        }

        let id = ComponentId::new(
            u16::try_from(self.components.len())
                .map_err(|_| EcsError::ComponentCapacityExceeded { max })?,
        );
        tracing::debug!(component = %id, name = info.name, size = info.size, "registered component");

        let storage = ComponentStorage::new(info.size, self.config.initial_entity_capacity);
        self.components.push(ComponentColumn { info, storage });
        Ok(id)
    }

    /// Registers a system. Existing entities that match join immediately.
    ///
    /// # Errors
    ///
    /// [`EcsError::SystemCapacityExceeded`] past `max_systems`,
    /// [`EcsError::InvalidComponent`] for an unknown component handle.
    pub fn register_system(&mut self, descriptor: SystemDescriptor) -> EcsResult<SystemId> {
        let max = self.config.max_systems;
        if self.systems.len() >= max {
            return Err(EcsError::SystemCapacityExceeded { max });
        }
        let record = descriptor
            .into_record(self.components.len(), self.config.initial_system_capacity)
            .map_err(EcsError::InvalidComponent)?;

        let id = SystemId::new(
            u32::try_from(self.systems.len()).map_err(|_| EcsError::SystemCapacityExceeded { max })?,
        );
        tracing::debug!(system = %id, name = %record.name, "registered system");

        self.systems.push(record);
        if !self.entities.is_empty() {
            self.refresh_system(id.index());
        }
        Ok(id)
    }

    /// Number of registered component types.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityIdsExhausted`] when no id is left.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        let entity = self.entities.create()?;
        tracing::trace!(entity = %entity, "created entity");

        // Systems without requirements match the bare entity
        let mask = ComponentMask::new();
        self.sync_membership(entity, &mask);
        Ok(entity)
    }

    /// Destroys an entity now: leaves every system, runs every destructor,
    /// recycles the id.
    ///
    /// Called while a system update is running, this behaves exactly like
    /// [`queue_destroy`](Self::queue_destroy): the id stays reserved until the
    /// outermost run returns.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if it does not exist,
    /// [`EcsError::EntityNotReady`] if it is already queued for destruction.
    pub fn destroy(&mut self, entity: EntityId) -> EcsResult<()> {
        self.entities.ready(entity)?;
        if self.running > 0 {
            return self.queue_destroy(entity);
        }
        self.destroy_now(entity);
        Ok(())
    }

    /// Removes an entity from every system now and defers the rest of its
    /// destruction to the next flush. The entity is not ready from here on.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if it does not exist,
    /// [`EcsError::EntityNotReady`] if it is already queued.
    pub fn queue_destroy(&mut self, entity: EntityId) -> EcsResult<()> {
        self.entities.ready(entity)?;
        for system in 0..self.systems.len() {
            self.remove_member(system, entity);
        }
        if let Some(record) = self.entities.get_mut(entity) {
            record.ready = false;
        }
        self.destroy_queue.push(entity);
        tracing::trace!(entity = %entity, "queued entity destruction");
        Ok(())
    }

    /// Checks if an entity exists and is not queued for destruction.
    #[inline]
    #[must_use]
    pub fn is_ready(&self, entity: EntityId) -> bool {
        self.entities.is_ready(entity)
    }

    /// Number of live entities, including those queued for destruction.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|(id, _)| id)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a zeroed component and runs its construct hook without
    /// arguments.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`], [`EcsError::EntityNotReady`],
    /// [`EcsError::InvalidComponent`], [`EcsError::ComponentAlreadyAttached`].
    pub fn attach(&mut self, entity: EntityId, component: ComponentId) -> EcsResult<()> {
        self.attach_inner(entity, component, None, None)
    }

    /// Attaches a zeroed component and passes `args` to its construct hook.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn attach_with(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        args: &dyn Any,
    ) -> EcsResult<()> {
        self.attach_inner(entity, component, None, Some(args))
    }

    /// Attaches a component initialized to `value`; the construct hook runs
    /// afterwards and sees it.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach), plus [`EcsError::ComponentTypeMismatch`].
    pub fn insert<C: Component>(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        value: C,
    ) -> EcsResult<()> {
        self.check_type::<C>(component)?;
        self.attach_inner(entity, component, Some(bytemuck::bytes_of(&value)), None)
    }

    /// Detaches a component: systems that stop matching lose the entity
    /// first, then the destruct hook runs, then the bit is cleared.
    ///
    /// If a system whose update is running would lose the entity, the detach
    /// is queued like [`queue_remove`](Self::queue_remove) so that system's
    /// `on_remove` still sees the component.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`], [`EcsError::EntityNotReady`],
    /// [`EcsError::InvalidComponent`], [`EcsError::ComponentNotAttached`].
    pub fn detach(&mut self, entity: EntityId, component: ComponentId) -> EcsResult<()> {
        let mask = self.entities.ready(entity)?.mask;
        self.column(component)?;
        if !mask.test(component.index()) {
            return Err(EcsError::ComponentNotAttached { entity, component });
        }
        let mut cleared = mask;
        cleared.clear(component.index());
        if self.leaves_running_system(entity, &cleared) {
            tracing::trace!(entity = %entity, component = %component, "deferring detach");
            self.remove_queue.push((entity, component));
            return Ok(());
        }
        self.detach_inner(entity, component, mask)
    }

    /// Queues a detach for the next flush. Membership is untouched until then.
    ///
    /// # Errors
    ///
    /// As [`detach`](Self::detach), checked at queue time.
    pub fn queue_remove(&mut self, entity: EntityId, component: ComponentId) -> EcsResult<()> {
        let record = self.entities.ready(entity)?;
        self.column(component)?;
        if !record.has_component(component.index()) {
            return Err(EcsError::ComponentNotAttached { entity, component });
        }
        self.remove_queue.push((entity, component));
        Ok(())
    }

    /// Checks if a live entity carries `component`.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: EntityId, component: ComponentId) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|record| record.has_component(component.index()))
    }

    /// Reads a component.
    ///
    /// Works on entities queued for destruction until the flush.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`], [`EcsError::InvalidComponent`],
    /// [`EcsError::ComponentTypeMismatch`], [`EcsError::ComponentNotAttached`].
    pub fn get<C: Component>(&self, entity: EntityId, component: ComponentId) -> EcsResult<&C> {
        self.check_attached::<C>(entity, component)?;
        self.components[component.index()]
            .storage
            .get::<C>(entity.index())
            .ok_or(EcsError::ComponentNotAttached { entity, component })
    }

    /// Mutably borrows a component.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn get_mut<C: Component>(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> EcsResult<&mut C> {
        self.check_attached::<C>(entity, component)?;
        self.components[component.index()]
            .storage
            .get_mut::<C>(entity.index())
            .ok_or(EcsError::ComponentNotAttached { entity, component })
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Number of entities currently matching a system.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn system_entity_count(&self, system: SystemId) -> EcsResult<usize> {
        Ok(self.system_record(system)?.members.len())
    }

    /// Entities currently matching a system, in member order.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn system_entities(&self, system: SystemId) -> EcsResult<&[EntityId]> {
        Ok(self.system_record(system)?.members.as_slice())
    }

    /// Enables a system.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn enable_system(&mut self, system: SystemId) -> EcsResult<()> {
        self.system_record_mut(system)?.enabled = true;
        Ok(())
    }

    /// Disables a system: runs skip it, membership is still maintained.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn disable_system(&mut self, system: SystemId) -> EcsResult<()> {
        self.system_record_mut(system)?.enabled = false;
        Ok(())
    }

    /// Whether a system is enabled.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn is_system_enabled(&self, system: SystemId) -> EcsResult<bool> {
        Ok(self.system_record(system)?.enabled)
    }

    /// Replaces a system's category mask.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn set_system_mask(&mut self, system: SystemId, mask: CategoryMask) -> EcsResult<()> {
        self.system_record_mut(system)?.mask = mask;
        Ok(())
    }

    /// A system's category mask.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle.
    pub fn system_mask(&self, system: SystemId) -> EcsResult<CategoryMask> {
        Ok(self.system_record(system)?.mask)
    }

    /// Adds a required component to a registered system and rebuilds its
    /// membership, firing hooks for entities that leave.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`], [`EcsError::InvalidComponent`].
    pub fn require_component(&mut self, system: SystemId, component: ComponentId) -> EcsResult<()> {
        self.column(component)?;
        self.system_record_mut(system)?.require.set(component.index());
        self.refresh_system(system.index());
        Ok(())
    }

    /// Adds an excluded component to a registered system and rebuilds its
    /// membership.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`], [`EcsError::InvalidComponent`].
    pub fn exclude_component(&mut self, system: SystemId, component: ComponentId) -> EcsResult<()> {
        self.column(component)?;
        self.system_record_mut(system)?.exclude.set(component.index());
        self.refresh_system(system.index());
        Ok(())
    }

    /// Borrows a system's state as its concrete type.
    ///
    /// Returns `None` for unknown handles, a different type, or while the
    /// system's own update is running.
    #[must_use]
    pub fn system<S: System>(&self, system: SystemId) -> Option<&S> {
        self.systems
            .get(system.index())?
            .callbacks
            .as_ref()?
            .as_any()
            .downcast_ref::<S>()
    }

    /// Mutably borrows a system's state as its concrete type.
    pub fn system_mut<S: System>(&mut self, system: SystemId) -> Option<&mut S> {
        self.systems
            .get_mut(system.index())?
            .callbacks
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    /// Runs one system, then flushes the deferred queues unless it was called
    /// from inside another system's update.
    ///
    /// Skipped (returning `Ok(0)`) when the system is disabled, or when its
    /// category mask is non-zero and shares no bit with `mask`.
    ///
    /// The update receives a snapshot of the member list taken at call time:
    /// every member is visited exactly once even if the update destroys or
    /// detaches entities. Entities queued for destruction earlier in the pass
    /// are still visited; check [`is_ready`](Self::is_ready).
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidSystem`] for an unknown handle,
    /// [`EcsError::SystemBusy`] when called from the system's own update.
    pub fn run_system(&mut self, system: SystemId, mask: CategoryMask) -> EcsResult<i32> {
        let index = system.index();
        if !self.system_record(system)?.runs_under(mask) {
            return Ok(0);
        }
        let Some(mut callbacks) = self.systems[index].callbacks.take() else {
            return Err(EcsError::SystemBusy(system));
        };

        let mut entities = self.scratch.pop().unwrap_or_default();
        entities.clear();
        entities.extend_from_slice(self.systems[index].members.as_slice());

        self.running += 1;
        let code = callbacks.update(self, &entities);
        self.running -= 1;

        self.systems[index].callbacks = Some(callbacks);
        self.scratch.push(entities);
        self.deliver_pending(index);
        self.flush();

        if code != 0 {
            tracing::trace!(system = %system, code, "system returned non-zero");
        }
        Ok(code)
    }

    /// Runs every system in registration order, stopping at the first
    /// non-zero code and returning it.
    ///
    /// # Errors
    ///
    /// As [`run_system`](Self::run_system).
    pub fn run_all_systems(&mut self, mask: CategoryMask) -> EcsResult<i32> {
        for index in 0..self.systems.len() {
            let Ok(raw) = u32::try_from(index) else {
                break;
            };
            let code = self.run_system(SystemId::new(raw), mask)?;
            if code != 0 {
                return Ok(code);
            }
        }
        Ok(0)
    }

    // =========================================================================
    // Deferred queues
    // =========================================================================

    /// Applies queued destructions, then queued removals, in queue order.
    ///
    /// Runs automatically when the outermost system update returns. Does
    /// nothing while any update is running.
    pub fn flush(&mut self) {
        if self.running > 0 {
            return;
        }
        if !self.destroy_queue.is_empty() {
            let mut queue = std::mem::take(&mut self.destroy_queue);
            tracing::trace!(count = queue.len(), "flushing destroy queue");
            for &entity in queue.as_slice() {
                self.destroy_now(entity);
            }
            queue.clear();
            self.destroy_queue = queue;
        }

        if !self.remove_queue.is_empty() {
            let mut queue = std::mem::take(&mut self.remove_queue);
            tracing::trace!(count = queue.len(), "flushing remove queue");
            for &(entity, component) in queue.as_slice() {
                self.flush_remove(entity, component);
            }
            queue.clear();
            self.remove_queue = queue;
        }
    }

    /// Destroys every entity (hooks fire), clears the queues and restarts id
    /// issuance. Component types and systems are kept.
    ///
    /// Ignored while a system update is running.
    pub fn reset(&mut self) {
        if self.running > 0 {
            tracing::warn!("reset ignored inside a system update");
            return;
        }
        let live: Vec<EntityId> = self.entities().collect();
        tracing::debug!(entities = live.len(), "resetting world");
        for entity in live {
            self.destroy_now(entity);
        }
        self.destroy_queue.clear();
        self.remove_queue.clear();
        for system in &mut self.systems {
            system.members.clear();
        }
        self.entities.reset();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn attach_inner(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        init: Option<&[u8]>,
        args: Option<&dyn Any>,
    ) -> EcsResult<()> {
        let mut mask = self.entities.ready(entity)?.mask;
        let column = self
            .components
            .get_mut(component.index())
            .ok_or(EcsError::InvalidComponent(component))?;
        if mask.test(component.index()) {
            return Err(EcsError::ComponentAlreadyAttached { entity, component });
        }

        let slot = entity.index();
        column.storage.grow(slot);
        match init {
            Some(bytes) => {
                column.storage.write(slot, bytes);
            }
            None => column.storage.zero(slot),
        }
        if let (Some(construct), Some(bytes)) =
            (column.info.on_construct.as_mut(), column.storage.slot_mut(slot))
        {
            construct(entity, bytes, args);
        }

        mask.set(component.index());
        if let Some(record) = self.entities.get_mut(entity) {
            record.mask = mask;
        }
        tracing::trace!(entity = %entity, component = %component, "attached component");

        self.sync_membership(entity, &mask);
        Ok(())
    }

    fn detach_inner(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        mask: ComponentMask,
    ) -> EcsResult<()> {
        self.column(component)?;
        if !mask.test(component.index()) {
            return Err(EcsError::ComponentNotAttached { entity, component });
        }
        let mut cleared = mask;
        cleared.clear(component.index());

        for system in 0..self.systems.len() {
            if !self.systems[system].matches(&cleared) {
                self.remove_member(system, entity);
            }
        }

        self.destruct(entity, component.index());
        if let Some(record) = self.entities.get_mut(entity) {
            record.mask = cleared;
        }
        tracing::trace!(entity = %entity, component = %component, "detached component");

        // Systems excluding the component may match now
        self.sync_membership(entity, &cleared);
        Ok(())
    }

    fn flush_remove(&mut self, entity: EntityId, component: ComponentId) {
        let Some(record) = self.entities.get(entity) else {
            tracing::trace!(entity = %entity, "dropping queued removal for destroyed entity");
            return;
        };
        let mask = record.mask;
        if !mask.test(component.index()) {
            tracing::warn!(
                entity = %entity,
                component = %component,
                "dropping queued removal: component already detached"
            );
            return;
        }
        if let Err(err) = self.detach_inner(entity, component, mask) {
            tracing::warn!(entity = %entity, error = %err, "queued removal failed");
        }
    }

    /// Full destruction of an active entity, ready or not.
    fn destroy_now(&mut self, entity: EntityId) {
        let Some(record) = self.entities.get(entity) else {
            return;
        };
        let mask = record.mask;

        for system in 0..self.systems.len() {
            self.remove_member(system, entity);
        }
        for component in mask.iter() {
            self.destruct(entity, component);
        }
        self.entities.release(entity);
        tracing::trace!(entity = %entity, "destroyed entity");
    }

    fn destruct(&mut self, entity: EntityId, component: usize) {
        let Some(column) = self.components.get_mut(component) else {
            return;
        };
        if let (Some(destruct), Some(bytes)) = (
            column.info.on_destruct.as_mut(),
            column.storage.slot_mut(entity.index()),
        ) {
            destruct(entity, bytes);
        }
    }

    /// Adds `entity` to every system it matches and removes it from every
    /// system it no longer matches.
    fn sync_membership(&mut self, entity: EntityId, mask: &ComponentMask) {
        for system in 0..self.systems.len() {
            if self.systems[system].matches(mask) {
                self.add_member(system, entity);
            } else {
                self.remove_member(system, entity);
            }
        }
    }

    /// Re-evaluates one system against every ready entity.
    fn refresh_system(&mut self, system: usize) {
        let verdicts: Vec<(EntityId, bool)> = {
            let record = &self.systems[system];
            self.entities
                .iter()
                .filter(|(_, entity)| entity.ready)
                .map(|(id, entity)| (id, record.matches(&entity.mask)))
                .collect()
        };
        for (entity, matches) in verdicts {
            if matches {
                self.add_member(system, entity);
            } else {
                self.remove_member(system, entity);
            }
        }
    }

    fn add_member(&mut self, system: usize, entity: EntityId) {
        if self.systems[system].members.insert(entity) {
            self.notify(system, MembershipEvent::Added(entity));
        }
    }

    fn remove_member(&mut self, system: usize, entity: EntityId) {
        if self.systems[system].members.remove(entity) {
            self.notify(system, MembershipEvent::Removed(entity));
        }
    }

    /// Fires a membership hook, or buffers it while the system's update runs.
    fn notify(&mut self, system: usize, event: MembershipEvent) {
        let Some(mut callbacks) = self.systems[system].callbacks.take() else {
            self.systems[system].pending.push(event);
            return;
        };
        fire(&mut *callbacks, self, event);
        self.systems[system].callbacks = Some(callbacks);
    }

    fn deliver_pending(&mut self, system: usize) {
        if self.systems[system].pending.is_empty() {
            return;
        }
        for event in std::mem::take(&mut self.systems[system].pending) {
            self.notify(system, event);
        }
    }

    /// Whether a system whose update is running would lose `entity` once its
    /// mask becomes `mask`.
    fn leaves_running_system(&self, entity: EntityId, mask: &ComponentMask) -> bool {
        self.running > 0
            && self.systems.iter().any(|system| {
                system.callbacks.is_none()
                    && system.members.contains(entity)
                    && !system.matches(mask)
            })
    }

    fn column(&self, component: ComponentId) -> EcsResult<&ComponentColumn> {
        self.components
            .get(component.index())
            .ok_or(EcsError::InvalidComponent(component))
    }

    fn check_type<C: Component>(&self, component: ComponentId) -> EcsResult<()> {
        let info = &self.column(component)?.info;
        if info.type_id == TypeId::of::<C>() {
            Ok(())
        } else {
            Err(EcsError::ComponentTypeMismatch {
                component,
                registered: info.name,
                requested: type_name::<C>(),
            })
        }
    }

    fn check_attached<C: Component>(&self, entity: EntityId, component: ComponentId) -> EcsResult<()> {
        self.check_type::<C>(component)?;
        let record = self.entities.get(entity).ok_or(EcsError::InvalidEntity(entity))?;
        if record.has_component(component.index()) {
            Ok(())
        } else {
            Err(EcsError::ComponentNotAttached { entity, component })
        }
    }

    fn system_record(&self, system: SystemId) -> EcsResult<&SystemRecord> {
        self.systems
            .get(system.index())
            .ok_or(EcsError::InvalidSystem(system))
    }

    fn system_record_mut(&mut self, system: SystemId) -> EcsResult<&mut SystemRecord> {
        self.systems
            .get_mut(system.index())
            .ok_or(EcsError::InvalidSystem(system))
    }
}

fn fire(callbacks: &mut dyn AnySystem, world: &World, event: MembershipEvent) {
    match event {
        MembershipEvent::Added(entity) => callbacks.on_add(world, entity),
        MembershipEvent::Removed(entity) => callbacks.on_remove(world, entity),
    }
}
