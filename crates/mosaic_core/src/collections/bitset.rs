//! # Fixed-Capacity Bitset
//!
//! One bit per registered component type. A bitset of a single word is a
//! plain `u64`; wider bitsets are word arrays with the same API, so callers
//! never branch on capacity.
//!
//! ## Layout
//!
//! ```text
//! index:   0 .. 63 | 64 .. 127 | ...
//! word:    words[0] | words[1]  | ...
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Bits per storage word.
const WORD_BITS: usize = u64::BITS as usize;

/// A bit vector of `WORDS * 64` bits.
///
/// # Example
///
/// ```rust
/// use mosaic_core::collections::Bitset;
///
/// let mut required: Bitset<1> = Bitset::new();
/// required.set(0);
/// required.set(3);
///
/// let mut entity = Bitset::<1>::new();
/// entity.set(0);
/// assert!(!entity.contains_all(&required));
/// entity.set(3);
/// assert!(entity.contains_all(&required));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitset<const WORDS: usize> {
    words: [u64; WORDS],
}

impl<const WORDS: usize> Bitset<WORDS> {
    /// Number of addressable bits.
    pub const CAPACITY: usize = WORDS * WORD_BITS;

    /// Creates an empty bitset.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Sets the bit at `index`.
    ///
    /// Indices at or beyond [`Self::CAPACITY`] are a usage error: they trip a
    /// debug assertion and are ignored in release builds.
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY, "bit index {index} out of range");
        if let Some(word) = self.words.get_mut(index / WORD_BITS) {
            *word |= 1 << (index % WORD_BITS);
        }
    }

    /// Clears the bit at `index`.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY, "bit index {index} out of range");
        if let Some(word) = self.words.get_mut(index / WORD_BITS) {
            *word &= !(1 << (index % WORD_BITS));
        }
    }

    /// Returns whether the bit at `index` is set.
    #[inline]
    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| (word >> (index % WORD_BITS)) & 1 == 1)
    }

    /// Bitwise AND.
    #[inline]
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let mut out = *self;
        for (word, rhs) in out.words.iter_mut().zip(other.words.iter()) {
            *word &= *rhs;
        }
        out
    }

    /// Bitwise OR.
    #[inline]
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        let mut out = *self;
        for (word, rhs) in out.words.iter_mut().zip(other.words.iter()) {
            *word |= *rhs;
        }
        out
    }

    /// Bitwise NOT over the full capacity.
    #[inline]
    #[must_use]
    pub fn not(&self) -> Self {
        let mut out = *self;
        for word in &mut out.words {
            *word = !*word;
        }
        out
    }

    /// Returns `true` if any bit is set.
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    #[inline]
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        self.and(other) == *other
    }

    /// Returns `true` if `self` and `other` share no bit.
    #[inline]
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.and(other).is_empty()
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn iter(&self) -> Ones<'_, WORDS> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl<const WORDS: usize> Default for Bitset<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> BitAnd for Bitset<WORDS> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(&rhs)
    }
}

impl<const WORDS: usize> BitOr for Bitset<WORDS> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(&rhs)
    }
}

impl<const WORDS: usize> Not for Bitset<WORDS> {
    type Output = Self;

    fn not(self) -> Self {
        Bitset::not(&self)
    }
}

impl<const WORDS: usize> fmt::Debug for Bitset<WORDS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over set bit indices, see [`Bitset::iter`].
pub struct Ones<'a, const WORDS: usize> {
    words: &'a [u64; WORDS],
    word_idx: usize,
    current: u64,
}

impl<const WORDS: usize> Iterator for Ones<'_, WORDS> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current &= self.current - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_test_clear() {
        let mut bits: Bitset<1> = Bitset::new();
        assert!(!bits.test(5));
        bits.set(5);
        assert!(bits.test(5));
        assert!(bits.any());
        bits.clear(5);
        assert!(!bits.test(5));
        assert!(bits.is_empty());
    }

    #[test]
    fn test_wide_bitset_crosses_words() {
        let mut bits: Bitset<4> = Bitset::new();
        bits.set(0);
        bits.set(64);
        bits.set(255);
        assert_eq!(Bitset::<4>::CAPACITY, 256);
        assert!(bits.test(64));
        assert!(bits.test(255));
        assert!(!bits.test(63));
        assert_eq!(bits.count(), 3);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 64, 255]);
    }

    #[test]
    fn test_and_or_not() {
        let mut a: Bitset<2> = Bitset::new();
        let mut b: Bitset<2> = Bitset::new();
        a.set(1);
        a.set(70);
        b.set(70);
        b.set(2);

        let both = a & b;
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![70]);

        let either = a | b;
        assert_eq!(either.iter().collect::<Vec<_>>(), vec![1, 2, 70]);

        let inverted = !a;
        assert!(!inverted.test(1));
        assert!(inverted.test(0));
        assert_eq!(inverted.count(), Bitset::<2>::CAPACITY - 2);
    }

    #[test]
    fn test_containment_and_disjointness() {
        let mut entity: Bitset<1> = Bitset::new();
        entity.set(0);
        entity.set(1);

        let mut require = Bitset::new();
        require.set(1);
        let mut exclude = Bitset::new();
        exclude.set(2);

        assert!(entity.contains_all(&require));
        assert!(entity.is_disjoint(&exclude));
        assert!(entity.contains_all(&Bitset::new()));

        entity.set(2);
        assert!(!entity.is_disjoint(&exclude));
    }

    #[test]
    fn test_equality() {
        let mut a: Bitset<1> = Bitset::new();
        let mut b: Bitset<1> = Bitset::new();
        assert_eq!(a, b);
        a.set(9);
        assert_ne!(a, b);
        b.set(9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_test_is_false() {
        let bits: Bitset<1> = Bitset::new();
        assert!(!bits.test(64));
    }
}
