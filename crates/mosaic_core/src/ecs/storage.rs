//! # Component Storage
//!
//! One byte arena per component type, indexed directly by entity id.
//!
//! The storage is sparse in entity-id space and dense in layout:
//! - Slot `id` lives at byte offset `size * id`
//! - Access is O(1), no indirection table
//! - Growth doubles capacity and preserves existing bytes
//!
//! Backing memory is a `Vec<u64>`, so every slot is aligned for components
//! whose alignment is at most [`MAX_COMPONENT_ALIGN`]: the base is 8-byte
//! aligned and `size` is always a multiple of the component's alignment.

use std::mem::align_of;

use super::component::Component;

/// Largest component alignment the byte arena supports.
pub const MAX_COMPONENT_ALIGN: usize = align_of::<u64>();

/// Byte storage for a single component type.
///
/// # Example
///
/// ```rust
/// use mosaic_core::ComponentStorage;
///
/// let mut storage = ComponentStorage::new(4, 8);
/// storage.grow(20);
/// assert_eq!(storage.capacity(), 32);
/// storage.write(20, &7u32.to_ne_bytes());
/// assert_eq!(storage.get::<u32>(20), Some(&7));
/// ```
#[derive(Clone, Debug)]
pub struct ComponentStorage {
    /// Backing words; viewed as bytes through `bytemuck`.
    words: Vec<u64>,
    /// Component size in bytes.
    size: usize,
    /// Slots available (max entity id + 1).
    capacity: usize,
}

impl ComponentStorage {
    /// Creates zeroed storage for `capacity` slots of `size` bytes.
    #[must_use]
    pub fn new(size: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            words: vec![0; words_for(size, capacity)],
            size,
            capacity,
        }
    }

    /// Returns the slot capacity of this storage.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the size of one slot in bytes.
    #[inline]
    #[must_use]
    pub const fn item_size(&self) -> usize {
        self.size
    }

    /// Doubles capacity until it exceeds `min_index`, preserving bytes.
    pub fn grow(&mut self, min_index: usize) {
        if min_index < self.capacity {
            return;
        }
        let mut capacity = self.capacity;
        while capacity <= min_index {
            capacity *= 2;
        }
        self.words.resize(words_for(self.size, capacity), 0);
        self.capacity = capacity;
    }

    /// Bytes of slot `index`, or `None` past capacity.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&[u8]> {
        let offset = self.offset(index)?;
        let bytes: &[u8] = bytemuck::cast_slice(&self.words);
        bytes.get(offset..offset + self.size)
    }

    /// Mutable bytes of slot `index`, or `None` past capacity.
    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let offset = self.offset(index)?;
        let size = self.size;
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        bytes.get_mut(offset..offset + size)
    }

    /// Zeroes slot `index`.
    #[inline]
    pub fn zero(&mut self, index: usize) {
        if let Some(slot) = self.slot_mut(index) {
            slot.fill(0);
        }
    }

    /// Copies `value` into slot `index`.
    ///
    /// # Returns
    ///
    /// `true` if the slot exists and `value` has exactly the slot size.
    pub fn write(&mut self, index: usize, value: &[u8]) -> bool {
        match self.slot_mut(index) {
            Some(slot) if slot.len() == value.len() => {
                slot.copy_from_slice(value);
                true
            }
            _ => false,
        }
    }

    /// Slot `index` viewed as `C`.
    ///
    /// Returns `None` past capacity or if `C` does not match the slot layout.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, index: usize) -> Option<&C> {
        bytemuck::try_from_bytes(self.slot(index)?).ok()
    }

    /// Slot `index` viewed mutably as `C`.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, index: usize) -> Option<&mut C> {
        bytemuck::try_from_bytes_mut(self.slot_mut(index)?).ok()
    }

    #[inline]
    fn offset(&self, index: usize) -> Option<usize> {
        (index < self.capacity).then(|| self.size * index)
    }
}

/// Backing words needed for `capacity` slots of `size` bytes.
fn words_for(size: usize, capacity: usize) -> usize {
    (size * capacity).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }

    #[test]
    fn test_storage_creation() {
        let storage = ComponentStorage::new(12, 1000);
        assert_eq!(storage.capacity(), 1000);
        assert_eq!(storage.item_size(), 12);
        assert_eq!(storage.slot(999).map(<[u8]>::len), Some(12));
    }

    #[test]
    fn test_storage_typed_roundtrip() {
        let mut storage = ComponentStorage::new(12, 100);
        let pos = Position { x: 1.0, y: 2.0, z: 3.0 };
        assert!(storage.write(50, bytemuck::bytes_of(&pos)));
        assert_eq!(storage.get::<Position>(50), Some(&pos));

        storage.get_mut::<Position>(50).unwrap().x = 9.0;
        assert_eq!(storage.get::<Position>(50).unwrap().x, 9.0);
    }

    #[test]
    fn test_storage_bounds() {
        let storage = ComponentStorage::new(12, 100);
        assert!(storage.slot(100).is_none());
        assert!(storage.get::<Position>(99).is_some());
    }

    #[test]
    fn test_grow_preserves_bytes() {
        let mut storage = ComponentStorage::new(4, 4);
        storage.write(3, &[1, 2, 3, 4]);
        storage.grow(4);
        assert_eq!(storage.capacity(), 8);
        assert_eq!(storage.slot(3), Some(&[1, 2, 3, 4][..]));
        assert_eq!(storage.slot(7), Some(&[0, 0, 0, 0][..]));

        // Already large enough
        storage.grow(2);
        assert_eq!(storage.capacity(), 8);
    }

    #[test]
    fn test_zero_and_size_mismatch() {
        let mut storage = ComponentStorage::new(4, 4);
        assert!(!storage.write(1, &[1, 2]));
        storage.write(1, &[5, 5, 5, 5]);
        storage.zero(1);
        assert_eq!(storage.get::<u32>(1), Some(&0));
        assert_eq!(storage.get::<u64>(1), None);
    }

    #[test]
    fn test_zero_sized_components() {
        let mut storage = ComponentStorage::new(0, 4);
        storage.grow(100);
        assert_eq!(storage.slot(100), Some(&[][..]));
        assert_eq!(storage.get::<()>(100), Some(&()));
    }
}
