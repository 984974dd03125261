//! Sorted contiguous containers.
//!
//! # Overview
//!
//! Every container here keeps its elements in a sorted [`AllocVec`] and
//! looks them up with a strategy chosen by a const threshold `N`: below `N`
//! elements a linear scan, at or above `N` a binary search. Small
//! collections stay cache friendly, large ones stay logarithmic.
//!
//! - [`FlatSet`] / [`FlatMultiSet`]: sorted values, unique or repeated.
//! - [`FlatMap`]: keys in a [`FlatSet`], values in a parallel vector.
//! - [`OrderedMap`] / [`OrderedMultiMap`]: a single vector of pairs.
//!
//! Positions (`usize` indices) play the role of iterators. Any mutation may
//! shift them.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut set: FlatSet<u32> = [5, 1, 3, 1].into_iter().collect();
//! assert_eq!(set.as_slice(), &[1, 3, 5]);
//!
//! let (index, inserted) = set.insert(3);
//! assert_eq!((index, inserted), (1, false));
//! ```
//!
//! [`AllocVec`]: crate::memory::AllocVec

mod compare;
mod dense;
mod flat_map;
mod flat_multiset;
mod flat_set;
mod search;

pub use compare::{Compare, Greater, Less};
pub use dense::{OrderedMap, OrderedMultiMap, OrderedMultiSet, OrderedSet};
pub use flat_map::FlatMap;
pub use flat_multiset::FlatMultiSet;
pub use flat_set::FlatSet;

/// Element count at which lookups switch from linear to binary search.
pub const DEFAULT_THRESHOLD: usize = 42;
