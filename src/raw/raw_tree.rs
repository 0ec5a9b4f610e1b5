use alloc::vec::Vec;
use core::cmp::Ordering;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{MAX_CHILDREN, MIN_CHILDREN, Node};
use crate::comparator::Comparator;
use crate::error::InvariantError;
use crate::order_statistic::{Match, Side};

/// The counted B+Tree backing `RankedBTreeMap`.
///
/// The tree knows nothing about the comparator; every operation that compares keys
/// borrows one from the caller.
pub(crate) struct RawTree<K, V> {
    /// Arena storing all tree nodes.
    pub(super) nodes: Arena<Node<K>>,
    /// Arena storing all values, addressed by the slots of leaf nodes.
    pub(super) values: Arena<V>,
    /// Handle to the root node, if the tree is non-empty.
    pub(super) root: Option<Handle>,
}

impl<K, V> RawTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
        }
    }

    /// Number of entries, read from the root's count.
    pub(crate) fn len(&self) -> usize {
        self.root.map_or(0, |root| self.nodes.get(root).count())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes.
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.values.clear();
        self.root = None;
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    #[cfg(test)]
    pub(crate) fn value(&self, handle: Handle) -> &V {
        self.values.get(handle)
    }

    pub(crate) fn value_by_handle_mut(&mut self, handle: Handle) -> &mut V {
        self.values.get_mut(handle)
    }

    /// Key and value of leaf entry `index`.
    pub(crate) fn entry(&self, leaf: Handle, index: usize) -> (&K, &V) {
        let node = self.nodes.get(leaf);
        (node.key(index), self.values.get(node.value(index)))
    }

    /// Key and mutable value of leaf entry `index`.
    pub(crate) fn entry_mut(&mut self, leaf: Handle, index: usize) -> (&K, &mut V) {
        let node = self.nodes.get(leaf);
        // Keys live in `nodes`, values in `values`; the borrows are disjoint.
        (node.key(index), self.values.get_mut(node.value(index)))
    }

    pub(crate) fn value_mut(&mut self, leaf: Handle, index: usize) -> &mut V {
        let handle = self.nodes.get(leaf).value(index);
        self.values.get_mut(handle)
    }

    /// Resolves a possibly negative rank to the leaf holding it and the offset inside it.
    ///
    /// Negative ranks count from the end, so `-1` is the last entry. Returns `None` outside
    /// `[-len, len)`.
    pub(crate) fn descend_by_rank(&self, index: isize) -> Option<(Handle, usize)> {
        let len = self.len();
        let mut remaining = if index < 0 {
            len.checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        if remaining >= len {
            return None;
        }

        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Some((current, remaining));
            }
            let mut next = None;
            for &child in node.slots() {
                let count = self.nodes.get(child).count();
                if remaining < count {
                    next = Some(child);
                    break;
                }
                remaining -= count;
            }
            debug_assert!(next.is_some(), "descend_by_rank: node {current:?} counts are stale");
            current = next?;
        }
    }

    /// Normalizes a leaf position that may sit one past either end of its leaf by stepping
    /// onto the neighbouring leaf.
    fn step_into(&self, leaf: Handle, index: Option<usize>) -> Option<(Handle, usize)> {
        let node = self.nodes.get(leaf);
        match index {
            None => {
                let prev = node.prev()?;
                Some((prev, self.nodes.get(prev).len() - 1))
            }
            Some(i) if i >= node.len() => node.next().map(|next| (next, 0)),
            Some(i) => Some((leaf, i)),
        }
    }
}

/// Index of the entry equal to `key`, or of the greatest entry below it when
/// `exact_only` is false. `None` when no such entry exists in `node`.
pub(crate) fn locate<K, C>(node: &Node<K>, key: &K, exact_only: bool, comparator: &C) -> Option<usize>
where
    C: Comparator<K> + ?Sized,
{
    match node.search(key, comparator) {
        Ok(index) => Some(index),
        Err(_) if exact_only => None,
        Err(insert_at) => insert_at.checked_sub(1),
    }
}

impl<K, V> RawTree<K, V> {
    /// Walks from the root to the leaf whose key range covers `key`.
    ///
    /// When `key` is smaller than every key of a node, an exact descent gives up while an
    /// inexact one continues through the first child.
    pub(crate) fn descend_by_key<C>(&self, key: &K, exact_only: bool, comparator: &C) -> Option<Handle>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Some(current);
            }
            current = match locate(node, key, false, comparator) {
                Some(index) => node.child(index),
                None if exact_only => return None,
                None => node.child(0),
            };
        }
    }

    /// Leaf and index of the entry equal to `key`.
    pub(crate) fn find<C>(&self, key: &K, comparator: &C) -> Option<(Handle, usize)>
    where
        C: Comparator<K> + ?Sized,
    {
        let leaf = self.descend_by_key(key, true, comparator)?;
        let index = locate(self.nodes.get(leaf), key, true, comparator)?;
        Some((leaf, index))
    }

    /// Sorted position of `key`.
    ///
    /// A present key yields its own rank. An absent key yields `None` when
    /// `require_exact`, otherwise the rank of its floor or ceiling entry, or `None` when
    /// no entry lies on that side.
    pub(crate) fn rank_of<C>(&self, key: &K, side: Side, require_exact: bool, comparator: &C) -> Option<usize>
    where
        C: Comparator<K> + ?Sized,
    {
        let len = self.len();
        let mut current = self.root?;
        let mut rank = 0;
        loop {
            let node = self.nodes.get(current);
            let found = node.search(key, comparator);
            if node.is_leaf() {
                return match found {
                    Ok(index) => Some(rank + index),
                    Err(_) if require_exact => None,
                    Err(insert_at) => match side {
                        Side::Floor => (rank + insert_at).checked_sub(1),
                        Side::Ceiling => Some(rank + insert_at).filter(|&r| r < len),
                    },
                };
            }
            let index = match found {
                Ok(index) => index,
                Err(insert_at) => match insert_at.checked_sub(1) {
                    Some(index) => index,
                    // Smaller than everything below this node.
                    None if require_exact => return None,
                    None => {
                        return match side {
                            Side::Floor => rank.checked_sub(1),
                            Side::Ceiling => Some(rank).filter(|&r| r < len),
                        };
                    }
                },
            };
            for &left in &node.slots()[..index] {
                rank += self.nodes.get(left).count();
            }
            current = node.child(index);
        }
    }

    /// Leaf position of the entry nearest to `key` on `side`, optionally allowing `key`
    /// itself.
    pub(crate) fn nearest<C>(&self, key: &K, side: Side, matching: Match, comparator: &C) -> Option<(Handle, usize)>
    where
        C: Comparator<K> + ?Sized,
    {
        let leaf = self.descend_by_key(key, false, comparator)?;
        let index = match (self.nodes.get(leaf).search(key, comparator), side, matching) {
            (Ok(index), _, Match::Inclusive) => Some(index),
            (Ok(index), Side::Floor, Match::Exclusive) => index.checked_sub(1),
            (Ok(index), Side::Ceiling, Match::Exclusive) => Some(index + 1),
            (Err(insert_at), Side::Floor, _) => insert_at.checked_sub(1),
            (Err(insert_at), Side::Ceiling, _) => Some(insert_at),
        };
        self.step_into(leaf, index)
    }
}

impl<K: Clone, V: Clone> RawTree<K, V> {
    /// Duplicates the tree level by level, following each level's sibling chain.
    ///
    /// The copy shares nothing with `self` and its arenas are compacted.
    pub(crate) fn clone_structure(&self) -> Self {
        let Some(source_root) = self.root else {
            return Self::new();
        };

        let mut nodes = Arena::with_capacity(self.nodes.len());
        let mut values = Arena::with_capacity(self.values.len());

        let copy_root = self.duplicate(source_root, &mut nodes, &mut values);

        // First node of the level being copied from, and its copy.
        let mut source_level = source_root;
        let mut copy_level = copy_root;
        while !self.nodes.get(source_level).is_leaf() {
            let mut source_parent = source_level;
            let mut copy_parent = copy_level;
            let mut previous_copy: Option<Handle> = None;
            let mut first_copy = None;

            let mut source = Some(self.nodes.get(source_level).child(0));
            while let Some(current) = source {
                let node = self.nodes.get(current);
                // Crossed into the next parent's children.
                while node.parent() != Some(source_parent) {
                    source_parent = self.nodes.get(source_parent).next().expect("clone: parent chain ended early");
                    copy_parent = nodes.get(copy_parent).next().expect("clone: copied parent chain ended early");
                }

                let copy = self.duplicate(current, &mut nodes, &mut values);
                {
                    let copied = nodes.get_mut(copy);
                    copied.set_parent(Some(copy_parent));
                    copied.set_prev(previous_copy);
                }
                if let Some(previous) = previous_copy {
                    nodes.get_mut(previous).set_next(Some(copy));
                }
                nodes.get_mut(copy_parent).push_slot(copy);

                previous_copy = Some(copy);
                first_copy.get_or_insert(copy);
                source = node.next();
            }

            source_level = self.nodes.get(source_level).child(0);
            copy_level = first_copy.expect("clone: internal level without children");
        }

        Self {
            nodes,
            values,
            root: Some(copy_root),
        }
    }

    /// Copies one node's scalars and keys; leaf values are cloned into `values`.
    fn duplicate(&self, source: Handle, nodes: &mut Arena<Node<K>>, values: &mut Arena<V>) -> Handle {
        let node = self.nodes.get(source);
        let mut copy = node.duplicate_shell();
        if node.is_leaf() {
            for &value in node.slots() {
                copy.push_slot(values.alloc(self.values.get(value).clone()));
            }
        }
        nodes.alloc(copy)
    }
}

impl<K, V> RawTree<K, V> {
    /// Verifies every structural invariant, level by level.
    pub(crate) fn check_invariants<C>(&self, comparator: &C) -> Result<(), InvariantError>
    where
        C: Comparator<K> + ?Sized,
    {
        let Some(root) = self.root else {
            return Ok(());
        };
        let root_node = self.nodes.get(root);
        if root_node.is_empty() {
            return Err(InvariantError::EmptyRoot { node: root.to_index() });
        }
        if !root_node.is_leaf() && root_node.len() == 1 {
            return Err(InvariantError::SingleChildRoot { node: root.to_index() });
        }
        if root_node.parent().is_some() {
            return Err(InvariantError::BrokenParentLink { node: root.to_index() });
        }

        let mut level: Vec<Handle> = alloc::vec![root];
        let mut depth = 0;
        loop {
            self.check_level(&level, depth, comparator)?;

            let first = self.nodes.get(level[0]);
            if first.is_leaf() {
                return Ok(());
            }
            level = level.iter().flat_map(|&h| self.nodes.get(h).slots().iter().copied()).collect();
            depth += 1;
        }
    }

    fn check_level<C>(&self, level: &[Handle], depth: usize, comparator: &C) -> Result<(), InvariantError>
    where
        C: Comparator<K> + ?Sized,
    {
        let leaf_level = self.nodes.get(level[0]).is_leaf();
        let mut previous: Option<Handle> = None;
        for &handle in level {
            let node = self.nodes.get(handle);
            let id = handle.to_index();

            if node.is_leaf() != leaf_level {
                return Err(InvariantError::UnevenDepth { depth });
            }
            if node.prev() != previous {
                return Err(InvariantError::BrokenSiblingLink { node: id });
            }
            if let Some(previous) = previous {
                if self.nodes.get(previous).next() != Some(handle) {
                    return Err(InvariantError::BrokenSiblingLink { node: previous.to_index() });
                }
                let last = self.nodes.get(previous).keys().last();
                if let (Some(last), Some(first)) = (last, node.first_key())
                    && comparator.compare(last, first) != Ordering::Less
                {
                    return Err(InvariantError::KeysOutOfOrder { node: id, index: 0 });
                }
            }

            let is_root = Some(handle) == self.root;
            let min = if is_root { 1 } else { MIN_CHILDREN };
            if node.len() < min || node.len() > MAX_CHILDREN {
                return Err(InvariantError::FanOut {
                    node: id,
                    len: node.len(),
                    min,
                    max: MAX_CHILDREN,
                });
            }

            for (index, pair) in node.keys().windows(2).enumerate() {
                if comparator.compare(&pair[0], &pair[1]) != Ordering::Less {
                    return Err(InvariantError::KeysOutOfOrder { node: id, index: index + 1 });
                }
            }

            let actual = if node.is_leaf() {
                node.len()
            } else {
                let mut total = 0;
                for (index, &child) in node.slots().iter().enumerate() {
                    let child_node = self.nodes.get(child);
                    if child_node.parent() != Some(handle) {
                        return Err(InvariantError::BrokenParentLink { node: child.to_index() });
                    }
                    let separator_ok = child_node
                        .first_key()
                        .is_some_and(|first| comparator.compare(node.key(index), first) == Ordering::Equal);
                    if !separator_ok {
                        return Err(InvariantError::StaleSeparator { node: id, index });
                    }
                    total += child_node.count();
                }
                total
            };
            if node.count() != actual {
                return Err(InvariantError::CountMismatch {
                    node: id,
                    stored: node.count(),
                    actual,
                });
            }

            previous = Some(handle);
        }

        let last = *level.last().expect("check_level: empty level");
        if self.nodes.get(last).next().is_some() {
            return Err(InvariantError::BrokenSiblingLink { node: last.to_index() });
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::comparator::Natural;
    use proptest::prelude::*;

    fn tree_of(keys: impl IntoIterator<Item = i32>) -> RawTree<i32, i32> {
        let mut tree = RawTree::new();
        for key in keys {
            tree.insert(key, key * 10, &Natural);
        }
        tree.check_invariants(&Natural).expect("fresh tree must be valid");
        tree
    }

    fn keys_in_order(tree: &RawTree<i32, i32>) -> Vec<i32> {
        let mut out = Vec::new();
        let mut current = tree.descend_by_rank(0).map(|(leaf, _)| leaf);
        while let Some(leaf) = current {
            out.extend_from_slice(tree.node(leaf).keys());
            current = tree.node(leaf).next();
        }
        out
    }

    #[test]
    fn empty_tree_searches() {
        let tree: RawTree<i32, i32> = RawTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.descend_by_rank(0).is_none());
        assert!(tree.descend_by_rank(-1).is_none());
        assert!(tree.find(&1, &Natural).is_none());
        assert!(tree.nearest(&1, Side::Floor, Match::Inclusive, &Natural).is_none());
        assert_eq!(tree.rank_of(&1, Side::Ceiling, false, &Natural), None);
        assert_eq!(tree.check_invariants(&Natural), Ok(()));
    }

    #[test]
    fn locate_floor_and_exact() {
        let tree = tree_of([10, 20, 30]);
        let leaf = tree.node(tree.root().unwrap());
        assert_eq!(locate(leaf, &20, true, &Natural), Some(1));
        assert_eq!(locate(leaf, &25, true, &Natural), None);
        assert_eq!(locate(leaf, &25, false, &Natural), Some(1));
        assert_eq!(locate(leaf, &5, false, &Natural), None);
        assert_eq!(locate(leaf, &99, false, &Natural), Some(2));
    }

    #[test]
    fn descend_by_rank_handles_negative_indices() {
        let tree = tree_of(0..500);
        for rank in 0..500 {
            let (leaf, index) = tree.descend_by_rank(rank).unwrap();
            assert_eq!(*tree.entry(leaf, index).0, rank as i32);
        }
        let (leaf, index) = tree.descend_by_rank(-1).unwrap();
        assert_eq!(*tree.entry(leaf, index).0, 499);
        let (leaf, index) = tree.descend_by_rank(-500).unwrap();
        assert_eq!(*tree.entry(leaf, index).0, 0);
        assert!(tree.descend_by_rank(500).is_none());
        assert!(tree.descend_by_rank(-501).is_none());
    }

    #[test]
    fn rank_of_sides_for_absent_keys() {
        let tree = tree_of((0..300).map(|k| k * 2));
        // present keys resolve to themselves regardless of side
        assert_eq!(tree.rank_of(&100, Side::Floor, true, &Natural), Some(50));
        assert_eq!(tree.rank_of(&100, Side::Ceiling, false, &Natural), Some(50));
        // absent key between 100 and 102
        assert_eq!(tree.rank_of(&101, Side::Floor, true, &Natural), None);
        assert_eq!(tree.rank_of(&101, Side::Floor, false, &Natural), Some(50));
        assert_eq!(tree.rank_of(&101, Side::Ceiling, false, &Natural), Some(51));
        // beyond both ends
        assert_eq!(tree.rank_of(&-1, Side::Floor, false, &Natural), None);
        assert_eq!(tree.rank_of(&-1, Side::Ceiling, false, &Natural), Some(0));
        assert_eq!(tree.rank_of(&999, Side::Floor, false, &Natural), Some(299));
        assert_eq!(tree.rank_of(&999, Side::Ceiling, false, &Natural), None);
    }

    #[test]
    fn nearest_steps_across_leaves() {
        let tree = tree_of((0..1000).map(|k| k * 2));
        // Every leaf boundary must be crossed correctly in both directions.
        for key in (0..2000).step_by(2) {
            let (leaf, index) = tree.nearest(&(key + 1), Side::Floor, Match::Inclusive, &Natural).unwrap();
            assert_eq!(*tree.entry(leaf, index).0, key);
            let (leaf, index) = tree.nearest(&(key - 1), Side::Ceiling, Match::Exclusive, &Natural).unwrap();
            assert_eq!(*tree.entry(leaf, index).0, key);
            if key > 0 {
                let (leaf, index) = tree.nearest(&key, Side::Floor, Match::Exclusive, &Natural).unwrap();
                assert_eq!(*tree.entry(leaf, index).0, key - 2);
            }
        }
        assert!(tree.nearest(&0, Side::Floor, Match::Exclusive, &Natural).is_none());
        assert!(tree.nearest(&1998, Side::Ceiling, Match::Exclusive, &Natural).is_none());
    }

    #[test]
    fn clone_structure_is_independent() {
        let mut tree = tree_of(0..5000);
        let copy = tree.clone_structure();
        copy.check_invariants(&Natural).unwrap();
        assert_eq!(copy.len(), 5000);
        assert_eq!(copy.node_count(), tree.node_count());
        assert_eq!(keys_in_order(&copy), keys_in_order(&tree));

        for key in 0..2500 {
            tree.remove(&key, &Natural);
        }
        assert_eq!(copy.len(), 5000);
        assert_eq!(tree.len(), 2500);
        copy.check_invariants(&Natural).unwrap();
    }

    #[test]
    fn check_invariants_reports_broken_order() {
        let mut tree = tree_of(0..10);
        let root = tree.root().unwrap();
        tree.nodes.get_mut(root).set_key(3, 100);
        assert!(matches!(
            tree.check_invariants(&Natural),
            Err(InvariantError::KeysOutOfOrder { index: 4, .. })
        ));
    }

    #[test]
    fn check_invariants_reports_stale_count() {
        let mut tree = tree_of(0..1000);
        let root = tree.root().unwrap();
        tree.nodes.get_mut(root).set_count(7);
        assert!(matches!(
            tree.check_invariants(&Natural),
            Err(InvariantError::CountMismatch { stored: 7, actual: 1000, .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn rank_of_inverts_descend_by_rank(keys in prop::collection::btree_set(-5000i32..5000, 1..800)) {
            let tree = tree_of(keys.iter().copied());
            for (rank, key) in keys.iter().enumerate() {
                prop_assert_eq!(tree.rank_of(key, Side::Floor, true, &Natural), Some(rank));
                let (leaf, index) = tree.descend_by_rank(rank as isize).unwrap();
                prop_assert_eq!(tree.entry(leaf, index).0, key);
            }
        }

        #[test]
        fn clone_matches_source(keys in prop::collection::vec(-5000i32..5000, 0..2000)) {
            let tree = tree_of(keys);
            let copy = tree.clone_structure();
            prop_assert_eq!(copy.check_invariants(&Natural), Ok(()));
            prop_assert_eq!(keys_in_order(&copy), keys_in_order(&tree));
        }
    }
}
