use std::{borrow::Borrow, cmp::Ordering, fmt, ops::Range};

use super::{
    compare::{Compare, Less},
    search,
};
use crate::memory::{AllocVec, Allocator};

/// Sorted multiset backed by a contiguous vector.
///
/// Equivalent values are kept in insertion order: every insert lands after
/// the existing run of equivalent values.
pub struct FlatMultiSet<V, C = Less, const N: usize = 42> {
    items: AllocVec<V>,
    cmp: C,
}

impl<V, C: Default, const N: usize> Default for FlatMultiSet<V, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C: Default, const N: usize> FlatMultiSet<V, C, N> {
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self {
            items: AllocVec::new_in(alloc),
            cmp: C::default(),
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: Allocator) -> Self {
        Self {
            items: AllocVec::with_capacity_in(capacity, alloc),
            cmp: C::default(),
        }
    }
}

impl<V, C, const N: usize> FlatMultiSet<V, C, N> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        self.items.allocator()
    }

    #[inline]
    pub fn as_slice(&self) -> &[V] {
        self.items.as_slice()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.items.get(index)
    }

    pub fn erase(&mut self, index: usize) -> V {
        self.items.remove(index)
    }

    pub fn erase_range(&mut self, range: Range<usize>) {
        self.items.drain(range);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

impl<V, C: Compare<V>, const N: usize> FlatMultiSet<V, C, N> {
    #[inline]
    fn ordering<Q>(&self) -> impl Fn(&V, &Q) -> Ordering + '_
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        move |item: &V, key: &Q| Compare::<Q>::compare(&self.cmp, item.borrow(), key)
    }

    /// Build a multiset from arbitrary values, sorting stably.
    pub fn from_iter_in<I>(iter: I, alloc: Allocator) -> Self
    where
        I: IntoIterator<Item = V>,
        C: Default,
    {
        let mut set = Self::new_in(alloc);
        set.items.extend(iter);
        let cmp = &set.cmp;
        search::sort(&mut set.items, |a, b| cmp.compare(a, b));
        set
    }

    /// Insert `value` after every equivalent value. Always succeeds.
    pub fn insert(&mut self, value: V) -> usize {
        let index = self.upper_bound(&value);
        self.items.insert(index, value);
        index
    }

    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        search::find(&self.items, key, N, self.ordering::<Q>())
    }

    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).is_some()
    }

    /// Number of values equivalent to `key`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let (lo, hi) = self.equal_range(key);
        hi - lo
    }

    pub fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        search::lower_bound(&self.items, key, self.ordering::<Q>())
    }

    pub fn upper_bound<Q>(&self, key: &Q) -> usize
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        search::upper_bound(&self.items, key, self.ordering::<Q>())
    }

    pub fn equal_range<Q>(&self, key: &Q) -> (usize, usize)
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        search::equal_range(&self.items, key, self.ordering::<Q>())
    }

    /// Remove every value equivalent to `key`, returning how many went.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let (lo, hi) = self.equal_range(key);
        self.items.drain(lo..hi);
        hi - lo
    }
}

impl<V: Clone, C: Clone, const N: usize> Clone for FlatMultiSet<V, C, N> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<V: fmt::Debug, C, const N: usize> fmt::Debug for FlatMultiSet<V, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<V, C: Compare<V> + Default, const N: usize> FromIterator<V> for FlatMultiSet<V, C, N> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_iter_in(iter, Allocator::default())
    }
}

impl<V, C: Compare<V>, const N: usize> Extend<V> for FlatMultiSet<V, C, N> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, V, C, const N: usize> IntoIterator for &'a FlatMultiSet<V, C, N> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_iter_keeps_duplicates() {
        let set: FlatMultiSet<i32> = [3, 1, 3, 2].into_iter().collect();

        assert_eq!(set.as_slice(), &[1, 2, 3, 3]);
    }

    #[test]
    fn insert_lands_after_equivalent_run() {
        // Given
        let mut set: FlatMultiSet<(u8, char), ByFirst> = FlatMultiSet::new();
        set.insert((1, 'a'));
        set.insert((2, 'x'));

        // When
        let index = set.insert((1, 'b'));

        // Then
        assert_eq!(index, 1);
        assert_eq!(set.as_slice(), &[(1, 'a'), (1, 'b'), (2, 'x')]);
    }

    #[test]
    fn every_insert_keeps_order() {
        let mut set: FlatMultiSet<u32, Less, 8> = FlatMultiSet::new();
        let mut state = 5u32;

        for _ in 0..300 {
            state = state.wrapping_mul(22_695_477).wrapping_add(1);
            set.insert(state % 31);
            assert!(set.as_slice().windows(2).all(|pair| pair[0] <= pair[1]));
        }
        assert_eq!(set.len(), 300);
    }

    #[test]
    fn count_and_remove_all() {
        let mut set: FlatMultiSet<i32> = [1, 2, 2, 2, 3].into_iter().collect();

        assert_eq!(set.count(&2), 3);
        assert_eq!(set.remove_all(&2), 3);
        assert_eq!(set.count(&2), 0);
        assert_eq!(set.as_slice(), &[1, 3]);
    }

    #[test]
    fn lookups_match_across_thresholds() {
        let values = [4, 4, 9, 1, 16, 25, 9];
        let binary: FlatMultiSet<i32, Less, 0> = values.into_iter().collect();
        let linear: FlatMultiSet<i32, Less, 512> = values.into_iter().collect();

        for needle in -1..30 {
            assert_eq!(binary.find(&needle), linear.find(&needle));
        }
    }

    #[derive(Default)]
    struct ByFirst;

    impl Compare<(u8, char)> for ByFirst {
        fn compare(&self, lhs: &(u8, char), rhs: &(u8, char)) -> Ordering {
            lhs.0.cmp(&rhs.0)
        }
    }
}
