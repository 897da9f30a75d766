//! # Entity Management
//!
//! Entities are non-zero `u32` ids. Id 0 is reserved and never issued;
//! destroyed ids are recycled through a LIFO free list, so a stale handle may
//! name a newer entity. Per-entity metadata lives in a dense array indexed by
//! id.

use std::fmt;
use std::num::NonZeroU32;

use super::component::ComponentMask;
use crate::collections::{IdList, SparseKey};
use crate::error::{EcsError, EcsResult};

/// Opaque entity handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(NonZeroU32);

impl EntityId {
    /// Wraps a raw id. Returns `None` for the reserved id 0.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// The raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The id as an array index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0.get() as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SparseKey for EntityId {
    #[inline]
    fn sparse_index(self) -> usize {
        self.index()
    }
}

/// Metadata of one entity slot. All-zero means "free".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityRecord {
    /// Attached component types.
    pub mask: ComponentMask,
    /// Created and not yet destroyed.
    pub active: bool,
    /// Cleared while the entity waits in the destroy queue.
    pub ready: bool,
}

impl EntityRecord {
    /// Checks if this entity has a specific component.
    #[inline]
    #[must_use]
    pub fn has_component(&self, component: usize) -> bool {
        self.mask.test(component)
    }
}

/// Allocates, recycles and describes entities.
#[derive(Debug)]
pub struct EntityRegistry {
    /// Indexed by raw id; slot 0 is never used.
    records: Vec<EntityRecord>,
    /// Destroyed ids ready for reuse.
    free: IdList<EntityId>,
    /// Next never-issued id.
    next_id: u32,
    /// Number of active entities.
    live: usize,
}

impl EntityRegistry {
    /// Creates a registry with metadata for `capacity` ids preallocated.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: vec![EntityRecord::default(); capacity.max(2)],
            free: IdList::new(),
            next_id: 1,
            live: 0,
        }
    }

    /// Allocates an entity: the most recently freed id, or a fresh one.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityIdsExhausted`] once every `u32` id is in use.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = EntityId::new(self.next_id).ok_or(EcsError::EntityIdsExhausted)?;
                self.next_id = self
                    .next_id
                    .checked_add(1)
                    .ok_or(EcsError::EntityIdsExhausted)?;
                self.ensure_capacity(id.index());
                id
            }
        };

        self.records[id.index()] = EntityRecord {
            mask: ComponentMask::new(),
            active: true,
            ready: true,
        };
        self.live += 1;
        Ok(id)
    }

    /// Zeroes the metadata of `id` and pushes it onto the free list.
    ///
    /// Callers must have already detached the entity from every index.
    pub(crate) fn release(&mut self, id: EntityId) {
        if let Some(record) = self.records.get_mut(id.index()) {
            if record.active {
                *record = EntityRecord::default();
                self.free.push(id);
                self.live -= 1;
            }
        }
    }

    /// Metadata of an active entity.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.records.get(id.index()).filter(|record| record.active)
    }

    /// Mutable metadata of an active entity.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.records.get_mut(id.index()).filter(|record| record.active)
    }

    /// Metadata of an entity that is active and ready.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity does not exist,
    /// [`EcsError::EntityNotReady`] if it is queued for destruction.
    pub fn ready(&self, id: EntityId) -> EcsResult<&EntityRecord> {
        let record = self.get(id).ok_or(EcsError::InvalidEntity(id))?;
        if record.ready {
            Ok(record)
        } else {
            Err(EcsError::EntityNotReady(id))
        }
    }

    /// Checks if an entity exists and is not queued for destruction.
    #[inline]
    #[must_use]
    pub fn is_ready(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|record| record.ready)
    }

    /// Checks if an entity exists, ready or not.
    #[inline]
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of active entities.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no entity is active.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Length of the metadata array.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Active entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.active)
            .filter_map(|(index, record)| {
                let id = EntityId::new(u32::try_from(index).ok()?)?;
                Some((id, record))
            })
    }

    /// Forgets every entity and restarts id issuance at 1.
    pub(crate) fn reset(&mut self) {
        self.records.fill(EntityRecord::default());
        self.free.clear();
        self.next_id = 1;
        self.live = 0;
    }

    /// Doubles the metadata array until `index` fits, zero-filling.
    fn ensure_capacity(&mut self, index: usize) {
        if index < self.records.len() {
            return;
        }
        let mut capacity = self.records.len().max(2);
        while capacity <= index {
            capacity *= 2;
        }
        self.records.resize(capacity, EntityRecord::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_zero_is_reserved() {
        assert!(EntityId::new(0).is_none());
        assert_eq!(EntityId::new(7).map(EntityId::get), Some(7));
    }

    #[test]
    fn test_create_issues_sequential_ids_from_one() {
        let mut registry = EntityRegistry::new(4);
        let ids: Vec<u32> = (0..3).map(|_| registry.create().unwrap().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_release_recycles_lifo() {
        let mut registry = EntityRegistry::new(4);
        let a = registry.create().unwrap();
        let b = registry.create().unwrap();
        registry.release(a);
        registry.release(b);
        assert!(!registry.is_active(a));
        assert_eq!(registry.create().unwrap(), b);
        assert_eq!(registry.create().unwrap(), a);
    }

    #[test]
    fn test_release_twice_is_ignored() {
        let mut registry = EntityRegistry::new(4);
        let a = registry.create().unwrap();
        registry.release(a);
        registry.release(a);
        assert_eq!(registry.len(), 0);
        let b = registry.create().unwrap();
        let c = registry.create().unwrap();
        assert_ne!(b, c);
    }

    #[test]
    fn test_metadata_grows_by_doubling() {
        let mut registry = EntityRegistry::new(2);
        for _ in 0..5 {
            registry.create().unwrap();
        }
        assert_eq!(registry.capacity(), 8);
    }

    #[test]
    fn test_ready_flag() {
        let mut registry = EntityRegistry::new(4);
        let a = registry.create().unwrap();
        assert!(registry.is_ready(a));
        registry.get_mut(a).unwrap().ready = false;
        assert!(!registry.is_ready(a));
        assert!(registry.is_active(a));
        assert_eq!(registry.ready(a), Err(EcsError::EntityNotReady(a)));

        let unknown = EntityId::new(99).unwrap();
        assert!(!registry.is_ready(unknown));
        assert_eq!(registry.ready(unknown), Err(EcsError::InvalidEntity(unknown)));
    }

    #[test]
    fn test_component_mask() {
        let mut registry = EntityRegistry::new(4);
        let a = registry.create().unwrap();
        let record = registry.get_mut(a).unwrap();
        assert!(!record.has_component(5));
        record.mask.set(5);
        assert!(registry.get(a).unwrap().has_component(5));
    }
}
