//! Search and ordering helpers shared by the flat containers.

use std::cmp::Ordering;

use crate::memory::AllocVec;

/// First position whose element is not ordered before `key`.
#[inline]
pub(crate) fn lower_bound<T, Q: ?Sized>(items: &[T], key: &Q, cmp: impl Fn(&T, &Q) -> Ordering) -> usize {
    items.partition_point(|item| cmp(item, key) == Ordering::Less)
}

/// First position whose element is ordered after `key`.
#[inline]
pub(crate) fn upper_bound<T, Q: ?Sized>(items: &[T], key: &Q, cmp: impl Fn(&T, &Q) -> Ordering) -> usize {
    items.partition_point(|item| cmp(item, key) != Ordering::Greater)
}

#[inline]
pub(crate) fn equal_range<T, Q: ?Sized>(
    items: &[T],
    key: &Q,
    cmp: impl Fn(&T, &Q) -> Ordering,
) -> (usize, usize) {
    let lo = lower_bound(items, key, &cmp);
    let hi = lo + upper_bound(&items[lo..], key, &cmp);
    (lo, hi)
}

/// Position of the first element equivalent to `key`.
///
/// Scans linearly while `items` holds fewer than `threshold` elements and
/// binary searches otherwise; both paths agree on equivalence.
pub(crate) fn find<T, Q: ?Sized>(
    items: &[T],
    key: &Q,
    threshold: usize,
    cmp: impl Fn(&T, &Q) -> Ordering,
) -> Option<usize> {
    if items.len() < threshold {
        items.iter().position(|item| cmp(item, key) == Ordering::Equal)
    } else {
        let index = lower_bound(items, key, &cmp);
        (index < items.len() && cmp(&items[index], key) == Ordering::Equal).then_some(index)
    }
}

/// Sort `items` stably.
#[inline]
pub(crate) fn sort<T>(items: &mut [T], cmp: impl Fn(&T, &T) -> Ordering) {
    items.sort_by(|a, b| cmp(a, b));
}

/// Drop every element equivalent to its predecessor, keeping the first of
/// each run. `items` must already be sorted.
pub(crate) fn dedup_sorted<T>(items: &mut AllocVec<T>, cmp: impl Fn(&T, &T) -> Ordering) {
    if items.len() < 2 {
        return;
    }
    let mut write = 1;
    for read in 1..items.len() {
        if cmp(&items[write - 1], &items[read]) != Ordering::Equal {
            items.swap(write, read);
            write += 1;
        }
    }
    items.truncate(write);
}
