//! Bounded, bidirectional iteration over the leaf chain.

use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Handle, RawTree};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Direction {
    Forward,
    Backward,
}

/// A position in the leaf chain plus the budget left to yield.
///
/// The cursor never compares keys: it resolves its start by rank once and then only
/// follows `prev`/`next` links.
struct Cursor<'a, K, V> {
    tree: &'a RawTree<K, V>,
    position: Option<(Handle, usize)>,
    // Entries between the position and the end of the chain in `direction`.
    available: usize,
    remaining: Option<usize>,
    direction: Direction,
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            position: self.position,
            available: self.available,
            remaining: self.remaining,
            direction: self.direction,
        }
    }
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Starts at rank `start` (negative counts from the end).
    ///
    /// `count` of `None` walks forward to the end, a positive count walks forward at most
    /// that many entries, a negative count walks backward at most `|count|` entries.
    fn new(tree: &'a RawTree<K, V>, start: isize, count: Option<isize>) -> Self {
        let (remaining, direction) = match count {
            None => (None, Direction::Forward),
            Some(count) if count < 0 => (Some(count.unsigned_abs()), Direction::Backward),
            Some(count) => (Some(count.unsigned_abs()), Direction::Forward),
        };

        let position = tree.descend_by_rank(start);
        let available = match position {
            None => 0,
            Some(_) => {
                let rank = if start < 0 { tree.len() - start.unsigned_abs() } else { start.unsigned_abs() };
                match direction {
                    Direction::Forward => tree.len() - rank,
                    Direction::Backward => rank + 1,
                }
            }
        };

        Self {
            tree,
            position,
            available,
            remaining,
            direction,
        }
    }

    fn len(&self) -> usize {
        self.remaining.map_or(self.available, |remaining| remaining.min(self.available))
    }

    /// Yields the entry under the cursor and moves one step in its direction.
    fn step(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == Some(0) {
            return None;
        }
        let (leaf, index) = self.position?;
        let tree = self.tree;
        let node = tree.node(leaf);

        self.position = match self.direction {
            Direction::Forward if index + 1 < node.len() => Some((leaf, index + 1)),
            Direction::Forward => node.next().map(|next| (next, 0)),
            Direction::Backward if index > 0 => Some((leaf, index - 1)),
            Direction::Backward => node.prev().map(|prev| (prev, tree.node(prev).len() - 1)),
        };
        self.available -= 1;
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        Some(tree.entry(leaf, index))
    }
}

macro_rules! cursor_iterator {
    ($(#[$meta:meta])* $name:ident, $item:ty, |$entry:ident| $project:expr) => {
        $(#[$meta])*
        #[must_use = "iterators are lazy and do nothing unless consumed"]
        pub struct $name<'a, K, V> {
            cursor: Cursor<'a, K, V>,
        }

        impl<'a, K, V> $name<'a, K, V> {
            pub(crate) fn new(tree: &'a RawTree<K, V>, start: isize, count: Option<isize>) -> Self {
                Self {
                    cursor: Cursor::new(tree, start, count),
                }
            }
        }

        impl<K, V> Clone for $name<'_, K, V> {
            fn clone(&self) -> Self {
                Self {
                    cursor: self.cursor.clone(),
                }
            }
        }

        impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for $name<'a, K, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.clone()).finish()
            }
        }

        impl<'a, K, V> Iterator for $name<'a, K, V> {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                self.cursor.step().map(|$entry| $project)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                let len = self.cursor.len();
                (len, Some(len))
            }
        }

        impl<K, V> ExactSizeIterator for $name<'_, K, V> {
            fn len(&self) -> usize {
                self.cursor.len()
            }
        }

        impl<K, V> FusedIterator for $name<'_, K, V> {}
    };
}

cursor_iterator!(
    /// An iterator over a run of entries of a [`RankedBTreeMap`](crate::RankedBTreeMap).
    ///
    /// Created by [`entries`](crate::RankedBTreeMap::entries) and
    /// [`iter`](crate::RankedBTreeMap::iter).
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_btree::RankedBTreeMap;
    ///
    /// let map = RankedBTreeMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);
    /// let back: Vec<_> = map.entries(-1, Some(-2)).collect();
    /// assert_eq!(back, [(&3, &'c'), (&2, &'b')]);
    /// ```
    Entries,
    (&'a K, &'a V),
    |entry| entry
);

cursor_iterator!(
    /// An iterator over a run of keys of a [`RankedBTreeMap`](crate::RankedBTreeMap).
    ///
    /// Created by [`keys`](crate::RankedBTreeMap::keys).
    Keys,
    &'a K,
    |entry| entry.0
);

cursor_iterator!(
    /// An iterator over a run of values of a [`RankedBTreeMap`](crate::RankedBTreeMap).
    ///
    /// Created by [`values`](crate::RankedBTreeMap::values).
    Values,
    &'a V,
    |entry| entry.1
);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
mod tests {
    use super::*;
    use crate::comparator::Natural;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn tree_of(n: i32) -> RawTree<i32, i32> {
        let mut tree = RawTree::new();
        for key in 0..n {
            tree.insert(key, -key, &Natural);
        }
        tree
    }

    fn keys(tree: &RawTree<i32, i32>, start: isize, count: Option<isize>) -> Vec<i32> {
        Keys::new(tree, start, count).copied().collect()
    }

    #[test]
    fn unbounded_walks_forward_to_the_end() {
        let tree = tree_of(200);
        assert_eq!(keys(&tree, 0, None), (0..200).collect::<Vec<_>>());
        assert_eq!(keys(&tree, 150, None), (150..200).collect::<Vec<_>>());
        assert_eq!(keys(&tree, -3, None), [197, 198, 199]);
    }

    #[test]
    fn negative_count_walks_backward() {
        let tree = tree_of(200);
        assert_eq!(keys(&tree, -1, Some(-1)), [199]);
        assert_eq!(keys(&tree, 40, Some(-5)), [40, 39, 38, 37, 36]);
        // The chain ends before the budget does.
        assert_eq!(keys(&tree, 2, Some(-10)), [2, 1, 0]);
    }

    #[test]
    fn zero_count_and_out_of_range_start_are_empty() {
        let tree = tree_of(10);
        assert!(keys(&tree, 0, Some(0)).is_empty());
        assert!(keys(&tree, 10, None).is_empty());
        assert!(keys(&tree, -11, Some(-3)).is_empty());
        assert!(keys(&RawTree::new(), 0, None).is_empty());
    }

    #[test]
    fn values_and_entries_follow_keys() {
        let tree = tree_of(100);
        let values: Vec<i32> = Values::new(&tree, 64, Some(3)).copied().collect();
        assert_eq!(values, [-64, -65, -66]);
        let mut entries = Entries::new(&tree, 99, Some(5));
        assert_eq!(entries.next(), Some((&99, &-99)));
        assert_eq!(entries.next(), None);
        assert_eq!(entries.next(), None);
    }

    proptest! {
        #[test]
        fn cursor_matches_slice_windows(
            n in 0i32..600,
            start in -700isize..700,
            count in proptest::option::of(-700isize..700),
        ) {
            let tree = tree_of(n);
            let all: Vec<i32> = (0..n).collect();
            let len = all.len() as isize;
            let rank = if start < 0 { len + start } else { start };

            let expected: Vec<i32> = if rank < 0 || rank >= len {
                Vec::new()
            } else {
                let rank = rank as usize;
                match count {
                    None => all[rank..].to_vec(),
                    Some(count) if count >= 0 => all[rank..].iter().copied().take(count as usize).collect(),
                    Some(count) => all[..=rank].iter().rev().copied().take(count.unsigned_abs()).collect(),
                }
            };

            let iter = Keys::new(&tree, start, count);
            prop_assert_eq!(iter.len(), expected.len());
            prop_assert_eq!(iter.copied().collect::<Vec<_>>(), expected);
        }
    }
}
