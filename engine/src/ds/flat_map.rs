use std::{borrow::Borrow, fmt};

use super::{
    compare::{Compare, Less},
    flat_set::FlatSet,
};
use crate::memory::{AllocVec, Allocator};

/// Sorted map with split key and value storage.
///
/// Keys live in a [`FlatSet`] and values in a parallel vector, so key
/// searches only touch key memory. The value at position `i` belongs to the
/// key at position `i`.
pub struct FlatMap<K, V, C = Less, const N: usize = 42> {
    keys: FlatSet<K, C, N>,
    values: AllocVec<V>,
}

impl<K, V, C: Default, const N: usize> Default for FlatMap<K, V, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Default, const N: usize> FlatMap<K, V, C, N> {
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self {
            keys: FlatSet::new_in(alloc.clone()),
            values: AllocVec::new_in(alloc),
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: Allocator) -> Self {
        Self {
            keys: FlatSet::with_capacity_in(capacity, alloc.clone()),
            values: AllocVec::with_capacity_in(capacity, alloc),
        }
    }
}

impl<K, V, C, const N: usize> FlatMap<K, V, C, N> {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        self.values.allocator()
    }

    #[inline]
    pub fn keys(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    #[inline]
    pub fn values(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    #[inline]
    pub fn values_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.values.iter_mut()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = (&K, &mut V)> {
        self.keys.iter().zip(self.values.iter_mut())
    }

    /// Key at `index`, in sorted order.
    #[inline]
    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    #[inline]
    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.values.get_mut(index)
    }

    /// Remove the entry at `index`. Panics when out of bounds.
    pub fn erase(&mut self, index: usize) -> (K, V) {
        (self.keys.erase(index), self.values.remove(index))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.values.reserve(additional);
    }

    pub fn shrink_to_fit(&mut self) {
        self.keys.shrink_to_fit();
        self.values.shrink_to_fit();
    }

    /// Keep the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.keys.truncate(len);
        self.values.truncate(len);
    }

    /// Keep only the entries `keep` accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        let mut index = 0;
        while index < self.values.len() {
            let key = &self.keys.as_slice()[index];
            if keep(key, &mut self.values[index]) {
                index += 1;
            } else {
                self.erase(index);
            }
        }
    }
}

impl<K, V, C: Compare<K>, const N: usize> FlatMap<K, V, C, N> {
    /// Position of the entry whose key is equivalent to `key`.
    #[inline]
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.keys.find(key)
    }

    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.keys.contains(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).map(|index| &self.values[index])
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).map(|index| &mut self.values[index])
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (index, inserted) = self.keys.insert(key);
        if inserted {
            self.values.insert(index, value);
            None
        } else {
            Some(std::mem::replace(&mut self.values[index], value))
        }
    }

    /// Insert only when `key` is absent.
    ///
    /// Returns the entry position and whether the value went in. A rejected
    /// value is dropped.
    pub fn try_insert(&mut self, key: K, value: V) -> (usize, bool) {
        let (index, inserted) = self.keys.insert(key);
        if inserted {
            self.values.insert(index, value);
        }
        (index, inserted)
    }

    /// Existing value for `key`, or the one `make` builds for it.
    pub fn find_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let index = match self.find(&key) {
            Some(index) => index,
            None => {
                let index = self.keys.lower_bound(&key);
                self.keys.insert_at(index, key);
                self.values.insert(index, make());
                index
            }
        };
        &mut self.values[index]
    }

    /// Existing value for `key`, or a freshly defaulted one.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.find_or_insert_with(key, V::default)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).map(|index| self.erase(index))
    }
}

impl<K, V, C: Compare<K> + Default, const N: usize> FlatMap<K, V, C, N> {
    /// Build a map from pairs. When keys repeat, the first pair wins.
    pub fn from_iter_in<I: IntoIterator<Item = (K, V)>>(iter: I, alloc: Allocator) -> Self {
        let mut map = Self::new_in(alloc);
        for (key, value) in iter {
            map.try_insert(key, value);
        }
        map
    }
}

impl<K: Clone, V: Clone, C: Clone, const N: usize> Clone for FlatMap<K, V, C, N> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, const N: usize> fmt::Debug for FlatMap<K, V, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Compare<K> + Default, const N: usize> FromIterator<(K, V)> for FlatMap<K, V, C, N> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_in(iter, Allocator::default())
    }
}
