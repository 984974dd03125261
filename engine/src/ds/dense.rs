//! Dense ordered containers: a single sorted vector of `(key, value)` pairs.
//!
//! Unlike [`FlatMap`](super::FlatMap), keys and values share one buffer,
//! which suits maps that are mostly iterated front to back.

use std::{borrow::Borrow, cmp::Ordering, fmt};

use super::{
    compare::{Compare, Less},
    flat_multiset::FlatMultiSet,
    flat_set::FlatSet,
    search,
};
use crate::memory::{AllocVec, Allocator};

/// Dense ordered set; the same container as [`FlatSet`].
pub type OrderedSet<V, C = Less, const N: usize = 42> = FlatSet<V, C, N>;

/// Dense ordered multiset; the same container as [`FlatMultiSet`].
pub type OrderedMultiSet<V, C = Less, const N: usize = 42> = FlatMultiSet<V, C, N>;

macro_rules! ordered_pairs {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<K, V, C = Less, const N: usize = 42> {
            pairs: AllocVec<(K, V)>,
            cmp: C,
        }

        impl<K, V, C: Default, const N: usize> Default for $name<K, V, C, N> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K, V, C: Default, const N: usize> $name<K, V, C, N> {
            pub fn new() -> Self {
                Self::new_in(Allocator::default())
            }

            pub fn new_in(alloc: Allocator) -> Self {
                Self {
                    pairs: AllocVec::new_in(alloc),
                    cmp: C::default(),
                }
            }
        }

        impl<K, V, C, const N: usize> $name<K, V, C, N> {
            #[inline]
            pub fn len(&self) -> usize {
                self.pairs.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.pairs.is_empty()
            }

            #[inline]
            pub fn capacity(&self) -> usize {
                self.pairs.capacity()
            }

            #[inline]
            pub fn allocator(&self) -> &Allocator {
                self.pairs.allocator()
            }

            #[inline]
            pub fn as_slice(&self) -> &[(K, V)] {
                self.pairs.as_slice()
            }

            #[inline]
            pub fn iter(&self) -> std::slice::Iter<'_, (K, V)> {
                self.pairs.iter()
            }

            /// Values in key order. Keys cannot be reached mutably.
            pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
                self.pairs.iter_mut().map(|(_, value)| value)
            }

            #[inline]
            pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
                self.pairs.get(index).map(|(key, value)| (key, value))
            }

            pub fn erase(&mut self, index: usize) -> (K, V) {
                self.pairs.remove(index)
            }

            pub fn clear(&mut self) {
                self.pairs.clear();
            }

            pub fn reserve(&mut self, additional: usize) {
                self.pairs.reserve(additional);
            }

            pub fn shrink_to_fit(&mut self) {
                self.pairs.shrink_to_fit();
            }

            pub fn truncate(&mut self, len: usize) {
                self.pairs.truncate(len);
            }
        }

        impl<K, V, C: Compare<K>, const N: usize> $name<K, V, C, N> {
            #[inline]
            fn ordering<Q>(&self) -> impl Fn(&(K, V), &Q) -> Ordering + '_
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                move |pair: &(K, V), key: &Q| Compare::<Q>::compare(&self.cmp, pair.0.borrow(), key)
            }

            /// Position of the first entry whose key is equivalent to `key`.
            pub fn find<Q>(&self, key: &Q) -> Option<usize>
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                search::find(&self.pairs, key, N, self.ordering::<Q>())
            }

            #[inline]
            pub fn contains_key<Q>(&self, key: &Q) -> bool
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.find(key).is_some()
            }

            pub fn get<Q>(&self, key: &Q) -> Option<&V>
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.find(key).map(|index| &self.pairs[index].1)
            }

            pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.find(key).map(|index| &mut self.pairs[index].1)
            }

            pub fn equal_range<Q>(&self, key: &Q) -> (usize, usize)
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                search::equal_range(&self.pairs, key, self.ordering::<Q>())
            }

            /// Number of entries whose key is equivalent to `key`.
            pub fn count<Q>(&self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                let (lo, hi) = self.equal_range(key);
                hi - lo
            }

            /// Remove every entry whose key is equivalent to `key`.
            pub fn remove<Q>(&mut self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                let (lo, hi) = self.equal_range(key);
                self.pairs.drain(lo..hi);
                hi - lo
            }
        }

        impl<K: Clone, V: Clone, C: Clone, const N: usize> Clone for $name<K, V, C, N> {
            fn clone(&self) -> Self {
                Self {
                    pairs: self.pairs.clone(),
                    cmp: self.cmp.clone(),
                }
            }
        }

        impl<K: fmt::Debug, V: fmt::Debug, C, const N: usize> fmt::Debug for $name<K, V, C, N> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map()
                    .entries(self.pairs.iter().map(|(key, value)| (key, value)))
                    .finish()
            }
        }

        impl<K, V, C: Compare<K> + Default, const N: usize> FromIterator<(K, V)> for $name<K, V, C, N> {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                let mut map = Self::new();
                for (key, value) in iter {
                    map.insert(key, value);
                }
                map
            }
        }
    };
}

ordered_pairs! {
    /// Sorted vector of unique-key pairs.
    OrderedMap
}

ordered_pairs! {
    /// Sorted vector of pairs; equal keys keep insertion order.
    OrderedMultiMap
}

impl<K, V, C: Compare<K>, const N: usize> OrderedMap<K, V, C, N> {
    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (lo, hi) = self.equal_range(&key);
        if lo != hi {
            return Some(std::mem::replace(&mut self.pairs[lo].1, value));
        }
        self.pairs.insert(lo, (key, value));
        None
    }
}

impl<K, V, C: Compare<K>, const N: usize> OrderedMultiMap<K, V, C, N> {
    /// Insert after every entry with an equivalent key. Returns its position.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        let index = search::upper_bound(&self.pairs, &key, self.ordering::<K>());
        self.pairs.insert(index, (key, value));
        index
    }

    /// Values stored under `key`, in insertion order.
    pub fn get_all<Q>(&self, key: &Q) -> impl Iterator<Item = &V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let (lo, hi) = self.equal_range(key);
        self.pairs[lo..hi].iter().map(|(_, value)| value)
    }
}
