use std::cmp::Ordering;

/// A strict weak ordering between `L` and `R`.
///
/// Two values are equivalent when the comparison yields
/// [`Ordering::Equal`]; containers never look at `PartialEq`.
pub trait Compare<L: ?Sized, R: ?Sized = L> {
    fn compare(&self, lhs: &L, rhs: &R) -> Ordering;
}

/// Ascending order by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Less;

impl<T: Ord + ?Sized> Compare<T> for Less {
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Descending order by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Greater;

impl<T: Ord + ?Sized> Compare<T> for Greater {
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        rhs.cmp(lhs)
    }
}
