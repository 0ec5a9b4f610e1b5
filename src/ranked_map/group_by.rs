use alloc::vec::Vec;

use super::RankedBTreeMap;
use crate::comparator::{Comparator, Natural};

impl<K: Ord + Clone, T> RankedBTreeMap<K, Vec<T>> {
    /// Groups `items` by the key `classify(&item, position)` returns.
    ///
    /// Each group holds its items in the order they were produced. Groups are ordered by
    /// key.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let parity = RankedBTreeMap::group_by([1, 2, 3, 4], |x, _| x % 2);
    /// assert_eq!(parity.get(&0), Some(&vec![2, 4]));
    /// assert_eq!(parity.get(&1), Some(&vec![1, 3]));
    /// ```
    pub fn group_by<I, F>(items: I, classify: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T, usize) -> K,
    {
        Self::group_by_with(items, classify, Natural)
    }
}

impl<K: Clone, T, C: Comparator<K>> RankedBTreeMap<K, Vec<T>, C> {
    /// Like [`group_by`](RankedBTreeMap::group_by), ordering the groups by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let words = ["apple", "bob", "cat", "dinosaur"];
    /// let by_len = RankedBTreeMap::group_by_with(words, |w, _| w.len(), |a: &usize, b: &usize| b.cmp(a));
    /// assert_eq!(by_len.get_nth(0), Some(&vec!["dinosaur"]));
    /// assert_eq!(by_len.get_nth(-1), Some(&vec!["bob", "cat"]));
    /// ```
    pub fn group_by_with<I, F>(items: I, mut classify: F, comparator: C) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T, usize) -> K,
    {
        let mut groups = Self::with_comparator(comparator);
        for (position, item) in items.into_iter().enumerate() {
            let key = classify(&item, position);
            groups.get_or_insert_with(key, Vec::new).push(item);
        }
        groups
    }
}
