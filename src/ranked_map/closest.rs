use super::RankedBTreeMap;
use crate::comparator::Comparator;
use crate::order_statistic::{Match, Side};

impl<K, V, C: Comparator<K>> RankedBTreeMap<K, V, C> {
    /// Returns the entry nearest to `key` on `side`.
    ///
    /// With [`Match::Inclusive`] an entry equal to `key` is returned as is; with
    /// [`Match::Exclusive`] only strictly smaller ([`Side::Floor`]) or strictly greater
    /// ([`Side::Ceiling`]) keys qualify. Returns `None` when nothing qualifies.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::{Match, RankedBTreeMap, Side};
    ///
    /// let map = RankedBTreeMap::from([(1, "a"), (3, "c"), (5, "e")]);
    /// assert_eq!(map.get_closest_entry(&4, Side::Floor, Match::Inclusive), Some((&3, &"c")));
    /// assert_eq!(map.get_closest_entry(&3, Side::Ceiling, Match::Exclusive), Some((&5, &"e")));
    /// assert_eq!(map.get_closest_entry(&6, Side::Ceiling, Match::Inclusive), None);
    /// ```
    #[must_use]
    pub fn get_closest_entry(&self, key: &K, side: Side, matching: Match) -> Option<(&K, &V)> {
        let (leaf, index) = self.raw.nearest(key, side, matching, &self.comparator)?;
        Some(self.raw.entry(leaf, index))
    }

    /// Returns the key nearest to `key`; see [`get_closest_entry`](Self::get_closest_entry).
    #[must_use]
    pub fn get_closest_key(&self, key: &K, side: Side, matching: Match) -> Option<&K> {
        self.get_closest_entry(key, side, matching).map(|(key, _)| key)
    }

    /// Returns the value of the key nearest to `key`; see
    /// [`get_closest_entry`](Self::get_closest_entry).
    #[must_use]
    pub fn get_closest_value(&self, key: &K, side: Side, matching: Match) -> Option<&V> {
        self.get_closest_entry(key, side, matching).map(|(_, value)| value)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use core::ops::Bound::{Excluded, Included, Unbounded};
    use proptest::prelude::*;

    #[test]
    fn odd_keys() {
        let map = RankedBTreeMap::from([(1, ()), (3, ()), (5, ())]);
        let closest = |key, side, matching| map.get_closest_key(&key, side, matching).copied();

        assert_eq!(closest(4, Side::Floor, Match::Inclusive), Some(3));
        assert_eq!(closest(4, Side::Ceiling, Match::Inclusive), Some(5));
        assert_eq!(closest(3, Side::Floor, Match::Exclusive), Some(1));
        assert_eq!(closest(3, Side::Floor, Match::Inclusive), Some(3));
        assert_eq!(closest(0, Side::Floor, Match::Inclusive), None);
        assert_eq!(closest(5, Side::Ceiling, Match::Exclusive), None);
        assert_eq!(closest(1, Side::Floor, Match::Exclusive), None);
    }

    proptest! {
        #[test]
        fn closest_matches_btree_ranges(
            keys in prop::collection::btree_set(0i32..20_000, 1..1500),
            probe in -5i32..20_005,
        ) {
            let map: RankedBTreeMap<i32, i32> = keys.iter().map(|&k| (k, -k)).collect();
            let model: BTreeMap<i32, i32> = keys.iter().map(|&k| (k, -k)).collect();

            let floor = model.range((Unbounded, Included(probe))).next_back().map(|(k, v)| (*k, *v));
            let below = model.range((Unbounded, Excluded(probe))).next_back().map(|(k, v)| (*k, *v));
            let ceiling = model.range((Included(probe), Unbounded)).next().map(|(k, v)| (*k, *v));
            let above = model.range((Excluded(probe), Unbounded)).next().map(|(k, v)| (*k, *v));

            let closest = |side, matching| map.get_closest_entry(&probe, side, matching).map(|(k, v)| (*k, *v));
            prop_assert_eq!(closest(Side::Floor, Match::Inclusive), floor);
            prop_assert_eq!(closest(Side::Floor, Match::Exclusive), below);
            prop_assert_eq!(closest(Side::Ceiling, Match::Inclusive), ceiling);
            prop_assert_eq!(closest(Side::Ceiling, Match::Exclusive), above);
        }
    }
}
