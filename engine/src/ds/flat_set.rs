use std::{borrow::Borrow, cmp::Ordering, fmt, ops::Range};

use super::{
    compare::{Compare, Less},
    search,
};
use crate::memory::{AllocVec, Allocator};

/// Sorted set backed by a contiguous vector.
///
/// Values are unique under `C`: inserting a value equivalent to one already
/// present leaves the set untouched. Lookups scan linearly while the set
/// holds fewer than `N` values and binary search after that.
pub struct FlatSet<V, C = Less, const N: usize = 42> {
    items: AllocVec<V>,
    cmp: C,
}

impl<V, C: Default, const N: usize> Default for FlatSet<V, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C: Default, const N: usize> FlatSet<V, C, N> {
    /// Empty set on the default allocator.
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    /// Empty set on `alloc`.
    pub fn new_in(alloc: Allocator) -> Self {
        Self::with_comparator_in(C::default(), alloc)
    }

    /// Empty set on `alloc` with room for `capacity` values.
    pub fn with_capacity_in(capacity: usize, alloc: Allocator) -> Self {
        Self {
            items: AllocVec::with_capacity_in(capacity, alloc),
            cmp: C::default(),
        }
    }
}

impl<V, C, const N: usize> FlatSet<V, C, N> {
    /// Empty set ordered by `cmp`.
    pub fn with_comparator_in(cmp: C, alloc: Allocator) -> Self {
        Self {
            items: AllocVec::new_in(alloc),
            cmp,
        }
    }

    /// Lookup threshold this set was instantiated with.
    #[inline]
    pub const fn threshold(&self) -> usize {
        N
    }

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
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    #[inline]
    pub fn as_slice(&self) -> &[V] {
        self.items.as_slice()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    /// Value at `index`, in sorted order.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.items.get(index)
    }

    #[inline]
    pub fn first(&self) -> Option<&V> {
        self.items.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&V> {
        self.items.last()
    }

    /// Remove and return the value at `index`. Panics when out of bounds.
    pub fn erase(&mut self, index: usize) -> V {
        self.items.remove(index)
    }

    /// Remove every value whose position falls in `range`.
    pub fn erase_range(&mut self, range: Range<usize>) {
        self.items.drain(range);
    }

    /// Keep only the values `keep` accepts. Order is preserved.
    pub fn retain(&mut self, keep: impl FnMut(&V) -> bool) {
        self.items.retain(keep);
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

    /// Drop every value past the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub(crate) fn insert_at(&mut self, index: usize, value: V) {
        self.items.insert(index, value);
    }
}

impl<V, C: Compare<V>, const N: usize> FlatSet<V, C, N> {
    #[inline]
    fn ordering<Q>(&self) -> impl Fn(&V, &Q) -> Ordering + '_
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        move |item: &V, key: &Q| Compare::<Q>::compare(&self.cmp, item.borrow(), key)
    }

    /// Build a set from arbitrary values, sorting and keeping the first of
    /// every group of equivalent values.
    pub fn from_iter_in<I>(iter: I, alloc: Allocator) -> Self
    where
        I: IntoIterator<Item = V>,
        C: Default,
    {
        let mut set = Self::new_in(alloc);
        set.items.extend(iter);
        let cmp = &set.cmp;
        search::sort(&mut set.items, |a, b| cmp.compare(a, b));
        search::dedup_sorted(&mut set.items, |a, b| cmp.compare(a, b));
        set
    }

    /// Insert `value` at its sorted position.
    ///
    /// Returns the position of the value and whether it was inserted. When
    /// an equivalent value already exists the set is unchanged and its
    /// position is returned with `false`.
    pub fn insert(&mut self, value: V) -> (usize, bool) {
        let (lo, hi) = self.equal_range(&value);
        if lo != hi {
            return (lo, false);
        }
        self.items.insert(lo, value);
        (lo, true)
    }

    /// Position of the value equivalent to `key`.
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

    /// The value equivalent to `key`.
    pub fn get_equivalent<Q>(&self, key: &Q) -> Option<&V>
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).map(|index| &self.items[index])
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

    /// Remove the value equivalent to `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        V: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(key).map(|index| self.items.remove(index))
    }
}

impl<V: Clone, C: Clone, const N: usize> Clone for FlatSet<V, C, N> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<V: fmt::Debug, C, const N: usize> fmt::Debug for FlatSet<V, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<V: PartialEq, C, const N: usize> PartialEq for FlatSet<V, C, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<V: Eq, C, const N: usize> Eq for FlatSet<V, C, N> {}

impl<V, C: Compare<V> + Default, const N: usize> FromIterator<V> for FlatSet<V, C, N> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_iter_in(iter, Allocator::default())
    }
}

impl<V, C: Compare<V>, const N: usize> Extend<V> for FlatSet<V, C, N> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, V, C, const N: usize> IntoIterator for &'a FlatSet<V, C, N> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<V, C, const N: usize> IntoIterator for FlatSet<V, C, N> {
    type Item = V;
    type IntoIter = allocator_api2::vec::IntoIter<V, Allocator>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ds::Greater, memory::TestResource};

    fn is_strictly_sorted<V: Ord>(values: &[V]) -> bool {
        values.windows(2).all(|pair| pair[0] < pair[1])
    }

    // ==================== Construction ====================

    #[test]
    fn new_creates_empty_set() {
        let set: FlatSet<i32> = FlatSet::new();

        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.threshold(), 42);
    }

    #[test]
    fn from_iter_sorts_and_dedups() {
        let set: FlatSet<i32> = [5, 3, 9, 3, 1, 5].into_iter().collect();

        assert_eq!(set.as_slice(), &[1, 3, 5, 9]);
    }

    #[test]
    fn from_iter_keeps_first_equivalent_value() {
        // Given
        #[derive(Debug, Clone)]
        struct Tagged(u32, &'static str);
        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Tagged {}
        impl PartialOrd for Tagged {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Tagged {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        // When
        let set: FlatSet<Tagged> = [Tagged(2, "first"), Tagged(1, "one"), Tagged(2, "second")]
            .into_iter()
            .collect();

        // Then
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().1, "first");
    }

    #[test]
    fn new_in_routes_memory_through_allocator() {
        // Given
        let tracker = Arc::new(TestResource::new());
        let mut set: FlatSet<u64> = FlatSet::new_in(Allocator::new(tracker.clone()));

        // When
        set.insert(7);

        // Then
        assert!(tracker.stats().allocations >= 1);
        drop(set);
        assert_eq!(tracker.stats().bytes_in_use, 0);
    }

    // ==================== Insert ====================

    #[test]
    fn insert_returns_position_and_flag() {
        let mut set: FlatSet<i32> = FlatSet::new();

        assert_eq!(set.insert(10), (0, true));
        assert_eq!(set.insert(5), (0, true));
        assert_eq!(set.insert(20), (2, true));
        assert_eq!(set.as_slice(), &[5, 10, 20]);
    }

    #[test]
    fn insert_duplicate_is_a_no_op() {
        // Given
        let mut set: FlatSet<i32> = [1, 2, 3].into_iter().collect();

        // When
        let result = set.insert(2);

        // Then
        assert_eq!(result, (1, false));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn every_insert_keeps_set_sorted_and_unique() {
        let mut set: FlatSet<u32, Less, 4> = FlatSet::new();
        let mut state = 17u32;

        for _ in 0..500 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            set.insert(state % 97);
            assert!(is_strictly_sorted(set.as_slice()));
        }
    }

    #[test]
    fn greater_comparator_sorts_descending() {
        let set: FlatSet<i32, Greater> = [1, 4, 2, 4].into_iter().collect();

        assert_eq!(set.as_slice(), &[4, 2, 1]);
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    // ==================== Lookup ====================

    #[test]
    fn find_reports_position() {
        let set: FlatSet<i32> = [10, 20, 30].into_iter().collect();

        assert_eq!(set.find(&20), Some(1));
        assert_eq!(set.find(&25), None);
    }

    #[test]
    fn lookups_match_across_thresholds() {
        // Given
        let values = [3, 8, 13, 21, 34, 55, 89, 144];
        let binary: FlatSet<i32, Less, 0> = values.into_iter().collect();
        let linear: FlatSet<i32, Less, 1024> = values.into_iter().collect();

        // Then
        for needle in values.iter().copied().chain([0, 4, 22, 100, 1000]) {
            assert_eq!(binary.contains(&needle), linear.contains(&needle));
            assert_eq!(binary.find(&needle), linear.find(&needle));
        }
    }

    #[test]
    fn borrowed_lookup_for_strings() {
        let set: FlatSet<String> = ["b", "a", "c"].into_iter().map(String::from).collect();

        assert!(set.contains("a"));
        assert_eq!(set.find("c"), Some(2));
    }

    // ==================== Removal ====================

    #[test]
    fn erase_range_preserves_order() {
        let mut set: FlatSet<i32> = (0..10).collect();

        set.erase_range(2..5);

        assert_eq!(set.as_slice(), &[0, 1, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn remove_returns_value() {
        let mut set: FlatSet<i32> = [1, 2, 3].into_iter().collect();

        assert_eq!(set.remove(&2), Some(2));
        assert_eq!(set.remove(&2), None);
        assert_eq!(set.as_slice(), &[1, 3]);
    }

    #[test]
    fn extend_skips_existing_values() {
        let mut set: FlatSet<i32> = [1, 3].into_iter().collect();

        set.extend([3, 2, 1, 4]);

        assert_eq!(set.as_slice(), &[1, 2, 3, 4]);
    }
}
