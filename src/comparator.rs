//! Pluggable key ordering.

use core::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Every operation of [`RankedBTreeMap`](crate::RankedBTreeMap) is parameterized over a
/// comparator. Any `Fn(&K, &K) -> Ordering` is a comparator, so closures and function
/// items can be passed directly.
///
/// A comparator that is not a strict weak ordering (inconsistent or non-transitive
/// results) is a logic error. The behavior that follows is not specified, but stays
/// encapsulated to the map that observed it; [`check_invariants`] can be used to detect
/// the resulting corruption.
///
/// [`check_invariants`]: crate::RankedBTreeMap::check_invariants
///
/// # Examples
///
/// ```
/// use ranked_btree::RankedBTreeMap;
///
/// let mut map = RankedBTreeMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// map.set(1, "one").set(3, "three").set(2, "two");
/// assert_eq!(map.get_nth_key(0), Some(&3));
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// The default comparator: the key type's own [`Ord`] implementation.
///
/// For [`Key`](crate::Key) this is the polymorphic cross-kind ordering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
