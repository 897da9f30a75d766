//! # Sparse Set
//!
//! O(1) insert, remove and membership test over a densely packed array.
//!
//! ```text
//! sparse: [ _, 1, _, 0, _ ]   key -> position in dense
//! dense:  [ 3, 1 ]            packed keys, iteration order
//! ```
//!
//! A key is present only when `dense[sparse[key]] == key`, so the sparse
//! array never needs clearing. Removal swaps the last dense entry into the
//! freed slot: dense order is not stable across removals.

/// Keys that can index a sparse array.
pub trait SparseKey: Copy + Eq {
    /// Position of this key in the sparse array.
    fn sparse_index(self) -> usize;
}

impl SparseKey for u32 {
    #[inline]
    fn sparse_index(self) -> usize {
        self as usize
    }
}

impl SparseKey for usize {
    #[inline]
    fn sparse_index(self) -> usize {
        self
    }
}

/// Default sparse capacity when none is requested.
const DEFAULT_CAPACITY: usize = 64;

/// Set of keys with a packed, directly iterable dense array.
///
/// # Example
///
/// ```rust
/// use mosaic_core::collections::SparseSet;
///
/// let mut set: SparseSet<u32> = SparseSet::with_capacity(8);
/// assert!(set.insert(5));
/// assert!(!set.insert(5));
/// assert!(set.contains(5));
/// assert!(set.remove(5));
/// assert!(set.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct SparseSet<K: SparseKey> {
    /// Key index -> position in `dense`. Stale values are allowed.
    sparse: Vec<usize>,
    /// Packed keys.
    dense: Vec<K>,
}

impl<K: SparseKey> SparseSet<K> {
    /// Creates a set whose sparse array covers keys `0..capacity`.
    ///
    /// The sparse array doubles when a larger key is inserted.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: vec![0; capacity.max(1)],
            dense: Vec::new(),
        }
    }

    /// Creates a set with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Inserts `key`.
    ///
    /// # Returns
    ///
    /// `true` if the key was newly added, `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.contains(key) {
            return false;
        }
        let index = key.sparse_index();
        if index >= self.sparse.len() {
            self.grow(index);
        }
        self.sparse[index] = self.dense.len();
        self.dense.push(key);
        true
    }

    /// Removes `key` by swapping the last dense entry into its slot.
    ///
    /// # Returns
    ///
    /// `true` if the key was present and removed.
    pub fn remove(&mut self, key: K) -> bool {
        if !self.contains(key) {
            return false;
        }
        let position = self.sparse[key.sparse_index()];
        self.dense.swap_remove(position);
        if let Some(&moved) = self.dense.get(position) {
            self.sparse[moved.sparse_index()] = position;
        }
        true
    }

    /// Returns `true` if `key` is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.position(key).is_some()
    }

    /// Position of `key` in the dense array.
    #[inline]
    #[must_use]
    pub fn position(&self, key: K) -> Option<usize> {
        let position = *self.sparse.get(key.sparse_index())?;
        (self.dense.get(position) == Some(&key)).then_some(position)
    }

    /// Number of keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set holds no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Length of the sparse array, i.e. the largest key index it can hold
    /// without growing, plus one.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    /// The dense array, in its current (unstable) order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.dense
    }

    /// Iterates over keys in dense order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.dense.iter().copied()
    }

    /// Removes every key. The sparse array is left as is.
    pub fn clear(&mut self) {
        self.dense.clear();
    }

    /// Doubles the sparse array until `index` fits.
    fn grow(&mut self, index: usize) {
        let mut capacity = self.sparse.len().max(1);
        while capacity <= index {
            capacity *= 2;
        }
        self.sparse.resize(capacity, 0);
    }
}

impl<K: SparseKey> Default for SparseSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
