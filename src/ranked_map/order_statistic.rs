use core::ops::{Index, IndexMut};

use super::RankedBTreeMap;
use crate::comparator::Comparator;
use crate::order_statistic::{Rank, Side};

impl<K, V, C> RankedBTreeMap<K, V, C> {
    /// Returns the value at sorted position `index`.
    ///
    /// A negative `index` counts from the end, so `-1` is the last entry. Returns `None`
    /// when `index` falls outside `[-len, len)`.
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
    /// let map = RankedBTreeMap::from([("a", 10), ("c", 30), ("b", 20)]);
    /// assert_eq!(map.get_nth(1), Some(&20));
    /// assert_eq!(map.get_nth(-1), Some(&30));
    /// assert_eq!(map.get_nth(3), None);
    /// assert_eq!(map.get_nth(-4), None);
    /// ```
    #[must_use]
    pub fn get_nth(&self, index: isize) -> Option<&V> {
        self.get_nth_entry(index).map(|(_, value)| value)
    }

    /// Returns the key at sorted position `index`; see [`get_nth`](Self::get_nth).
    #[must_use]
    pub fn get_nth_key(&self, index: isize) -> Option<&K> {
        self.get_nth_entry(index).map(|(key, _)| key)
    }

    /// Returns the entry at sorted position `index`; see [`get_nth`](Self::get_nth).
    #[must_use]
    pub fn get_nth_entry(&self, index: isize) -> Option<(&K, &V)> {
        let (leaf, offset) = self.raw.descend_by_rank(index)?;
        Some(self.raw.entry(leaf, offset))
    }

    /// Returns the key and a mutable reference to the value at sorted position `index`.
    ///
    /// The key stays shared: changing it could break the map's order.
    pub fn get_nth_mut(&mut self, index: isize) -> Option<(&K, &mut V)> {
        let (leaf, offset) = self.raw.descend_by_rank(index)?;
        Some(self.raw.entry_mut(leaf, offset))
    }
}

impl<K, V, C: Comparator<K>> RankedBTreeMap<K, V, C> {
    /// Returns the sorted position of `key`, or of its nearest entry when absent.
    ///
    /// A present key yields its own rank. For an absent key, [`Side::Floor`] yields the
    /// rank of the greatest key below it and [`Side::Ceiling`] the rank of the least key
    /// above it; `None` when there is no such key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::{RankedBTreeMap, Side};
    ///
    /// let map = RankedBTreeMap::from([(10, ()), (20, ()), (30, ())]);
    /// assert_eq!(map.get_index(&20, Side::Floor), Some(1));
    /// assert_eq!(map.get_index(&25, Side::Floor), Some(1));
    /// assert_eq!(map.get_index(&25, Side::Ceiling), Some(2));
    /// assert_eq!(map.get_index(&5, Side::Floor), None);
    /// assert_eq!(map.get_index(&35, Side::Ceiling), None);
    /// ```
    #[must_use]
    pub fn get_index(&self, key: &K, side: Side) -> Option<usize> {
        self.raw.rank_of(key, side, false, &self.comparator)
    }

    /// Returns the sorted position of `key`, or `None` if it is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([(10, "a"), (20, "b")]);
    /// assert_eq!(map.rank_of(&20), Some(1));
    /// assert_eq!(map.rank_of(&15), None);
    /// ```
    #[must_use]
    pub fn rank_of(&self, key: &K) -> Option<usize> {
        self.raw.rank_of(key, Side::Floor, true, &self.comparator)
    }
}

/// Indexes into the map by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
impl<K, V, C> Index<Rank> for RankedBTreeMap<K, V, C> {
    type Output = V;

    fn index(&self, rank: Rank) -> &V {
        isize::try_from(rank.0)
            .ok()
            .and_then(|index| self.get_nth(index))
            .expect("rank out of bounds")
    }
}

/// Mutably indexes into the map by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use ranked_btree::{RankedBTreeMap, Rank};
///
/// let mut map = RankedBTreeMap::from([("a", 1), ("b", 2)]);
/// map[Rank(1)] = 5;
/// assert_eq!(map[&"b"], 5);
/// ```
impl<K, V, C> IndexMut<Rank> for RankedBTreeMap<K, V, C> {
    fn index_mut(&mut self, rank: Rank) -> &mut V {
        isize::try_from(rank.0)
            .ok()
            .and_then(|index| self.get_nth_mut(index))
            .map(|(_, value)| value)
            .expect("rank out of bounds")
    }
}
