//! # Collections
//!
//! The id-level building blocks the ECS indices are made of.
//!
//! ## Design Philosophy
//!
//! - Every operation is O(1) or amortized O(1)
//! - Storage grows by doubling, never shrinks
//! - Nothing here knows about entities or components

mod bitset;
mod id_list;
mod sparse_set;

pub use bitset::{Bitset, Ones};
pub use id_list::IdList;
pub use sparse_set::{SparseKey, SparseSet};
