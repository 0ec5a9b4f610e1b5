use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Index;

use crate::comparator::{Comparator, Natural};
use crate::cursor::{Entries, Keys, Values};
use crate::error::InvariantError;
use crate::raw::RawTree;

mod closest;
mod group_by;
mod order_statistic;

/// An ordered map based on a counted [B+Tree].
///
/// Entries are kept sorted by a [`Comparator`], by default the key type's own [`Ord`]
/// implementation ([`Natural`]). Every node records how many entries its subtree holds,
/// which turns positional queries into O(log n) descents: the map can be read like a
/// sorted array ([`get_nth`](Self::get_nth), [`get_index`](Self::get_index)) as well as
/// searched by key or by nearest key ([`get_closest_key`](Self::get_closest_key)).
///
/// Iteration ([`entries`](Self::entries), [`keys`](Self::keys), [`values`](Self::values))
/// starts at any rank, counting from the end when negative, and can walk a bounded number
/// of entries forward or backward.
///
/// It is a logic error for a key to change its ordering relative to other keys while it
/// is in the map, or for the comparator to be inconsistent. The behavior resulting from
/// such a logic error is not specified, but is encapsulated to the map that observed it;
/// [`check_invariants`](Self::check_invariants) reports the damage.
///
/// # Examples
///
/// ```
/// use ranked_btree::{Match, RankedBTreeMap, Side};
///
/// let mut prices = RankedBTreeMap::new();
/// prices.set(120, "standard").set(80, "saver").set(300, "flexible");
///
/// // Positional access.
/// assert_eq!(prices.get_nth(0), Some(&"saver"));
/// assert_eq!(prices.get_nth(-1), Some(&"flexible"));
///
/// // Nearest-key lookup: the cheapest fare at or above a budget.
/// assert_eq!(prices.get_closest_value(&100, Side::Ceiling, Match::Inclusive), Some(&"standard"));
///
/// // Bounded iteration, backward from the last entry.
/// let top_two: Vec<_> = prices.keys(-1, Some(-2)).copied().collect();
/// assert_eq!(top_two, [300, 120]);
/// ```
///
/// [B+Tree]: https://en.wikipedia.org/wiki/B%2B_tree
pub struct RankedBTreeMap<K, V, C = Natural> {
    raw: RawTree<K, V>,
    comparator: C,
}

impl<K, V> RankedBTreeMap<K, V> {
    /// Makes a new, empty map ordered by `K`'s [`Ord`] implementation.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::new();
    /// map.insert(1, "a");
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, V, C> RankedBTreeMap<K, V, C> {
    /// Makes a new, empty map ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::with_comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
    /// map.set("ccc", 3).set("a", 1).set("bb", 2);
    /// assert_eq!(map.get_nth_key(0), Some(&"a"));
    /// // Same length means same key.
    /// assert_eq!(map.get(&"z"), Some(&1));
    /// ```
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            raw: RawTree::new(),
            comparator,
        }
    }

    /// Returns the comparator that orders this map.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes every entry, keeping the comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::from([(1, "a"), (2, "b")]);
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the first entry in sorted order.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let (leaf, index) = self.raw.descend_by_rank(0)?;
        Some(self.raw.entry(leaf, index))
    }

    /// Returns the last entry in sorted order.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let (leaf, index) = self.raw.descend_by_rank(-1)?;
        Some(self.raw.entry(leaf, index))
    }

    /// Iterates over entries starting at rank `start`.
    ///
    /// A negative `start` counts from the end, so `-1` is the last entry. With
    /// `count == None` the iterator walks forward to the end. A positive `count` walks
    /// forward and a negative one walks backward, stopping after `|count|` entries or at the
    /// end of the map, whichever comes first. A `start` outside the map yields nothing.
    ///
    /// # Complexity
    ///
    /// O(log n) to position, then amortized O(1) per entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map: RankedBTreeMap<i32, char> = (0..10).zip('a'..).collect();
    ///
    /// let forward: Vec<_> = map.entries(7, None).collect();
    /// assert_eq!(forward, [(&7, &'h'), (&8, &'i'), (&9, &'j')]);
    ///
    /// let backward: Vec<_> = map.entries(2, Some(-5)).collect();
    /// assert_eq!(backward, [(&2, &'c'), (&1, &'b'), (&0, &'a')]);
    /// ```
    pub fn entries(&self, start: isize, count: Option<isize>) -> Entries<'_, K, V> {
        Entries::new(&self.raw, start, count)
    }

    /// Iterates over keys; see [`entries`](Self::entries) for `start` and `count`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([(1, ()), (2, ()), (3, ())]);
    /// assert_eq!(map.keys(-1, Some(-1)).collect::<Vec<_>>(), [&3]);
    /// ```
    pub fn keys(&self, start: isize, count: Option<isize>) -> Keys<'_, K, V> {
        Keys::new(&self.raw, start, count)
    }

    /// Iterates over values; see [`entries`](Self::entries) for `start` and `count`.
    pub fn values(&self, start: isize, count: Option<isize>) -> Values<'_, K, V> {
        Values::new(&self.raw, start, count)
    }

    /// Iterates over every entry in sorted order.
    pub fn iter(&self) -> Entries<'_, K, V> {
        self.entries(0, None)
    }

    /// Calls `f(value, key, map)` for each entry [`entries`](Self::entries) would yield.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([("a", 1), ("b", 2), ("c", 3)]);
    /// let mut seen = Vec::new();
    /// map.for_each(1, None, |value, key, map| seen.push((*key, *value, map.len())));
    /// assert_eq!(seen, [("b", 2, 3), ("c", 3, 3)]);
    /// ```
    pub fn for_each<F>(&self, start: isize, count: Option<isize>, mut f: F)
    where
        F: FnMut(&V, &K, &Self),
    {
        for (key, value) in self.entries(start, count) {
            f(value, key, self);
        }
    }
}

impl<K, V, C: Comparator<K>> RankedBTreeMap<K, V, C> {
    /// Returns `true` if the map contains an entry for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([(1, "a")]);
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key, &self.comparator).is_some()
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([(1, "a")]);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let (leaf, index) = self.raw.find(key, &self.comparator)?;
        Some(self.raw.entry(leaf, index).1)
    }

    /// Returns the stored key and the value for `key`.
    ///
    /// The stored key may differ from `key` when the comparator treats distinct keys as
    /// equal.
    #[must_use]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let (leaf, index) = self.raw.find(key, &self.comparator)?;
        Some(self.raw.entry(leaf, index))
    }

    /// Returns a mutable reference to the value stored for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::from([(1, 10)]);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(map[&1], 11);
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (leaf, index) = self.raw.find(key, &self.comparator)?;
        Some(self.raw.value_mut(leaf, index))
    }

    /// Verifies every structural invariant of the tree.
    ///
    /// This walks the whole tree and is meant for tests and debugging. A map driven by a
    /// consistent comparator always returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantError`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.raw.check_invariants(&self.comparator)
    }
}

impl<K: Clone, V, C: Comparator<K>> RankedBTreeMap<K, V, C> {
    /// Inserts a key-value pair, returning the previous value for an equal key.
    ///
    /// The stored key is not replaced when the key was already present.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map[&37], "b");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.raw.insert(key, value, &self.comparator)
    }

    /// Inserts or overwrites an entry and returns the map for chaining.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::new();
    /// map.set("b", 2).set("a", 1).set("b", 3);
    /// assert_eq!(map.iter().collect::<Vec<_>>(), [(&"a", &1), (&"b", &3)]);
    /// ```
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`, inserting `value` first if the key is absent.
    ///
    /// An existing value is left unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::new();
    /// *map.get_or_insert("hits", 0) += 1;
    /// *map.get_or_insert("hits", 0) += 1;
    /// assert_eq!(map[&"hits"], 2);
    /// ```
    pub fn get_or_insert(&mut self, key: K, value: V) -> &mut V {
        self.get_or_insert_with(key, || value)
    }

    /// Returns the value for `key`, inserting the result of `produce` first if the key is
    /// absent.
    ///
    /// `produce` runs only on a miss, at most once.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map: RankedBTreeMap<&str, Vec<u32>> = RankedBTreeMap::new();
    /// map.get_or_insert_with("evens", Vec::new).push(2);
    /// map.get_or_insert_with("evens", || unreachable!()).push(4);
    /// assert_eq!(map[&"evens"], [2, 4]);
    /// ```
    pub fn get_or_insert_with<F>(&mut self, key: K, produce: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let Ok(value) = self.try_get_or_insert_with(key, || Ok::<V, core::convert::Infallible>(produce()));
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), with a fallible producer.
    ///
    /// # Errors
    ///
    /// Returns the producer's error. The map is not modified in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map: RankedBTreeMap<&str, u32> = RankedBTreeMap::new();
    /// assert_eq!(map.try_get_or_insert_with("n", || "x".parse::<u32>()).map(|v| *v).ok(), None);
    /// assert!(map.is_empty());
    ///
    /// assert_eq!(map.try_get_or_insert_with("n", || "7".parse::<u32>()).map(|v| *v), Ok(7));
    /// ```
    pub fn try_get_or_insert_with<F, E>(&mut self, key: K, produce: F) -> Result<&mut V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let handle = self.raw.try_get_or_insert_with(key, &self.comparator, produce)?;
        Ok(self.raw.value_by_handle_mut(handle))
    }

    /// Removes the entry for `key`, returning `true` if it was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::from([(1, "a")]);
    /// assert!(map.delete(&1));
    /// assert!(!map.delete(&1));
    /// ```
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry for `key`, returning the stored key and its value.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.raw.remove(key, &self.comparator)
    }

    /// Removes and returns the first entry in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let mut map = RankedBTreeMap::from([(2, "b"), (1, "a")]);
    /// assert_eq!(map.pop_first(), Some((1, "a")));
    /// assert_eq!(map.pop_first(), Some((2, "b")));
    /// assert_eq!(map.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let (leaf, index) = self.raw.descend_by_rank(0)?;
        Some(self.raw.remove_at(leaf, index))
    }

    /// Removes and returns the last entry in sorted order.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let (leaf, index) = self.raw.descend_by_rank(-1)?;
        Some(self.raw.remove_at(leaf, index))
    }

    /// Builds a map ordered by `comparator` from `entries`.
    ///
    /// Later entries overwrite earlier ones with an equal key.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from_entries_with([(1, 'a'), (3, 'c'), (2, 'b')], |a: &i32, b: &i32| b.cmp(a));
    /// assert_eq!(map.keys(0, None).copied().collect::<Vec<_>>(), [3, 2, 1]);
    /// ```
    pub fn from_entries_with<I>(entries: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_comparator(comparator);
        map.extend(entries);
        map
    }

    /// Builds a map ordered by `comparator` holding a copy of every entry of `other`.
    ///
    /// Entries are re-inserted one by one, so `other` may use any ordering. When both maps
    /// share the comparator, [`copy_from`](Self::copy_from) duplicates the tree directly.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let ascending = RankedBTreeMap::from([(1, "a"), (2, "b")]);
    /// let descending = RankedBTreeMap::from_map_with_comparator(&ascending, |a: &i32, b: &i32| b.cmp(a));
    /// assert_eq!(descending.get_nth_key(0), Some(&2));
    /// ```
    pub fn from_map_with_comparator<C2>(other: &RankedBTreeMap<K, V, C2>, comparator: C) -> Self
    where
        V: Clone,
    {
        Self::from_entries_with(other.iter().map(|(key, value)| (key.clone(), value.clone())), comparator)
    }
}

impl<K: Clone, V: Clone, C: Clone> RankedBTreeMap<K, V, C> {
    /// Duplicates `other`, comparator included, without comparing a single key.
    ///
    /// The copy shares no nodes with `other`; mutating one never affects the other.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let original = RankedBTreeMap::from([(1, "a"), (2, "b")]);
    /// let mut copy = RankedBTreeMap::copy_from(&original);
    /// copy.delete(&1);
    /// assert_eq!(original.len(), 2);
    /// assert_eq!(copy.len(), 1);
    /// ```
    #[must_use]
    pub fn copy_from(other: &Self) -> Self {
        Self {
            raw: other.raw.clone_structure(),
            comparator: other.comparator.clone(),
        }
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for RankedBTreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self::copy_from(self)
    }
}

impl<K: Hash, V: Hash, C> Hash for RankedBTreeMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for RankedBTreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for RankedBTreeMap<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for RankedBTreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Default> Default for RankedBTreeMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, V, C: Comparator<K> + Default> FromIterator<(K, V)> for RankedBTreeMap<K, V, C> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_entries_with(iter, C::default())
    }
}

impl<K: Clone, V, C: Comparator<K>> Extend<(K, V)> for RankedBTreeMap<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a RankedBTreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Entries<'a, K, V>;

    fn into_iter(self) -> Entries<'a, K, V> {
        self.iter()
    }
}

impl<K: Ord + Clone, V, const N: usize> From<[(K, V); N]> for RankedBTreeMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Looks up the value for a key.
///
/// # Panics
///
/// Panics if the key is not present in the map.
impl<K, V, C: Comparator<K>> Index<&K> for RankedBTreeMap<K, V, C> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn first_and_last_follow_mutations() {
        let mut map = RankedBTreeMap::new();
        assert_eq!(map.first_key_value(), None);
        for key in (0..500).rev() {
            map.insert(key, key * 3);
        }
        assert_eq!(map.first_key_value(), Some((&0, &0)));
        assert_eq!(map.last_key_value(), Some((&499, &1497)));
        assert_eq!(map.pop_last(), Some((499, 1497)));
        assert_eq!(map.last_key_value(), Some((&498, &1494)));
        map.check_invariants().unwrap();
    }

    #[test]
    fn equal_under_comparator_keeps_the_first_key() {
        let mut map = RankedBTreeMap::with_comparator(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        map.insert((1, 'x'), "first");
        assert_eq!(map.insert((1, 'y'), "second"), Some("first"));
        assert_eq!(map.get_key_value(&(1, 'z')), Some((&(1, 'x'), &"second")));
        assert_eq!(map.remove_entry(&(1, 'q')), Some(((1, 'x'), "second")));
    }

    #[test]
    fn clone_is_structural_and_independent() {
        let mut map: RankedBTreeMap<i32, i32> = (0..2000).map(|k| (k, k)).collect();
        let copy = map.clone();
        for key in 0..1000 {
            map.delete(&key);
        }
        copy.check_invariants().unwrap();
        assert_eq!(copy.len(), 2000);
        assert_eq!(copy.keys(0, None).copied().collect::<Vec<_>>(), (0..2000).collect::<Vec<_>>());
        assert_eq!(map.len(), 1000);
        assert_ne!(map, copy);
    }

    #[test]
    fn debug_lists_entries_in_order() {
        let map = RankedBTreeMap::from([(2, 'b'), (1, 'a')]);
        assert_eq!(alloc::format!("{map:?}"), "{1: 'a', 2: 'b'}");
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_panics_on_missing_key() {
        let map: RankedBTreeMap<i32, i32> = RankedBTreeMap::new();
        let _ = map[&1];
    }
}
