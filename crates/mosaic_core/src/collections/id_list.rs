//! # Growable ID List
//!
//! Order-insensitive list of small `Copy` ids. Used as the entity free list
//! (LIFO) and as the append-only deferred queues that are drained after each
//! system update.

/// Minimum capacity reserved on the first push.
const MIN_CAPACITY: usize = 8;

/// A growable list of ids with doubling growth.
///
/// # Example
///
/// ```rust
/// use mosaic_core::collections::IdList;
///
/// let mut free: IdList<u32> = IdList::new();
/// free.push(3);
/// free.push(7);
/// assert_eq!(free.pop(), Some(7));
/// assert_eq!(free.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct IdList<T: Copy> {
    items: Vec<T>,
}

impl<T: Copy> IdList<T> {
    /// Creates an empty list without allocating.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates an empty list with room for `capacity` ids.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Appends an id.
    ///
    /// When the list is full its capacity is doubled, so a long run of
    /// pushes costs amortized O(1).
    #[inline]
    pub fn push(&mut self, id: T) {
        if self.items.len() == self.items.capacity() {
            let additional = self.items.capacity().max(MIN_CAPACITY);
            self.items.reserve_exact(additional);
        }
        self.items.push(id);
    }

    /// Removes and returns the most recently pushed id.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Number of ids currently stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list holds no ids.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocated capacity in ids.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Ids in push order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Forgets all ids, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Copy> Default for IdList<T> {
    fn default() -> Self {
        Self::new()
    }
}
