use core::mem;

use super::handle::Handle;
use super::node::{MAX_CHILDREN, Node, SPLIT_THRESHOLD, Slots};
use super::raw_tree::{RawTree, locate};
use crate::comparator::Comparator;

/// Where a key lives, or where it would be inserted.
pub(crate) enum Probe {
    /// The key is present at this leaf entry.
    Found(Handle, usize),
    /// The key is absent; it belongs at this leaf position (`None` for an empty tree).
    Vacant(Option<(Handle, usize)>),
}

impl<K: Clone, V> RawTree<K, V> {
    /// Locates `key` for an insertion.
    pub(crate) fn probe<C>(&self, key: &K, comparator: &C) -> Probe
    where
        C: Comparator<K> + ?Sized,
    {
        let Some(leaf) = self.descend_by_key(key, false, comparator) else {
            return Probe::Vacant(None);
        };
        match self.node(leaf).search(key, comparator) {
            Ok(index) => Probe::Found(leaf, index),
            Err(index) => Probe::Vacant(Some((leaf, index))),
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key was present.
    pub(crate) fn insert<C>(&mut self, key: K, value: V, comparator: &C) -> Option<V>
    where
        C: Comparator<K> + ?Sized,
    {
        match self.probe(&key, comparator) {
            Probe::Found(leaf, index) => Some(mem::replace(self.value_mut(leaf, index), value)),
            Probe::Vacant(at) => {
                self.insert_vacant(at, key, value);
                None
            }
        }
    }

    /// Returns the value handle for `key`, inserting the output of `produce` on a miss.
    ///
    /// `produce` runs at most once and only on a miss. If it fails, the tree is untouched.
    pub(crate) fn try_get_or_insert_with<C, E, F>(&mut self, key: K, comparator: &C, produce: F) -> Result<Handle, E>
    where
        C: Comparator<K> + ?Sized,
        F: FnOnce() -> Result<V, E>,
    {
        match self.probe(&key, comparator) {
            Probe::Found(leaf, index) => Ok(self.node(leaf).value(index)),
            Probe::Vacant(at) => {
                let value = produce()?;
                Ok(self.insert_vacant(at, key, value))
            }
        }
    }

    /// Inserts a new entry at a vacant position found by [`probe`](Self::probe) and
    /// restores the tree invariants. Returns the new value's handle.
    pub(crate) fn insert_vacant(&mut self, at: Option<(Handle, usize)>, key: K, value: V) -> Handle {
        let value_handle = self.values.alloc(value);
        let (leaf, index) = at.unwrap_or_else(|| {
            let leaf = self.nodes.alloc(Node::new_leaf());
            self.root = Some(leaf);
            (leaf, 0)
        });

        let node = self.nodes.get_mut(leaf);
        node.insert(index, key, value_handle);
        node.set_count(node.count() + 1);

        self.fix_up_after_insert(leaf, index == 0);
        value_handle
    }

    /// Walks from a leaf that just gained an entry up to the root, keeping separators,
    /// fan-out and counts exact.
    fn fix_up_after_insert(&mut self, leaf: Handle, mut front_changed: bool) {
        let mut current = leaf;
        loop {
            let parent = self.nodes.get(current).parent();
            if self.nodes.get(current).is_overfull() {
                self.split(current);
            }
            // A split root already has a complete new parent.
            let Some(parent) = parent else {
                break;
            };

            if front_changed {
                let index = self.nodes.get(parent).index_of_child(current);
                self.refresh_separator(parent, index, current);
                front_changed = index == 0;
            }
            let node = self.nodes.get_mut(parent);
            node.set_count(node.count() + 1);
            current = parent;
        }
    }

    /// Copies `child`'s first key into `parent.keys[index]`.
    fn refresh_separator(&mut self, parent: Handle, index: usize, child: Handle) {
        if let Some(first) = self.nodes.get(child).first_key().cloned() {
            self.nodes.get_mut(parent).set_key(index, first);
        }
    }

    /// Installs a new internal root above `old_root` and returns it.
    fn grow_root(&mut self, old_root: Handle) -> Handle {
        let old = self.nodes.get(old_root);
        let mut root = Node::new_internal();
        root.set_count(old.count());
        root.insert(0, old.key(0).clone(), old_root);

        let root = self.nodes.alloc(root);
        self.nodes.get_mut(old_root).set_parent(Some(root));
        self.root = Some(root);

        #[cfg(feature = "tracing")]
        tracing::trace!(root = ?root, child = ?old_root, "grow root");
        root
    }

    /// Moves entries `[SPLIT_THRESHOLD..]` of an overfull node into a new right sibling.
    fn split(&mut self, handle: Handle) {
        let parent = match self.nodes.get(handle).parent() {
            Some(parent) => parent,
            None => self.grow_root(handle),
        };

        let node = self.nodes.get_mut(handle);
        let old_next = node.next();
        let mut right = node.split_off(SPLIT_THRESHOLD);
        right.set_parent(Some(parent));
        right.set_prev(Some(handle));
        right.set_next(old_next);

        let moved_children: Slots = if right.is_leaf() {
            Slots::new()
        } else {
            Slots::from_slice(right.slots())
        };
        let right_count = if right.is_leaf() {
            right.len()
        } else {
            moved_children.iter().map(|&child| self.nodes.get(child).count()).sum()
        };
        right.set_count(right_count);
        let separator = right.key(0).clone();
        let right_handle = self.nodes.alloc(right);

        let node = self.nodes.get_mut(handle);
        node.set_count(node.count() - right_count);
        node.set_next(Some(right_handle));
        if let Some(old_next) = old_next {
            self.nodes.get_mut(old_next).set_prev(Some(right_handle));
        }
        for child in moved_children {
            self.nodes.get_mut(child).set_parent(Some(right_handle));
        }

        let parent_node = self.nodes.get_mut(parent);
        let index = parent_node.index_of_child(handle);
        parent_node.insert(index + 1, separator, right_handle);

        #[cfg(feature = "tracing")]
        tracing::trace!(node = ?handle, right = ?right_handle, moved = right_count, "split");
    }

    /// Removes the entry equal to `key`.
    pub(crate) fn remove<C>(&mut self, key: &K, comparator: &C) -> Option<(K, V)>
    where
        C: Comparator<K> + ?Sized,
    {
        let leaf = self.descend_by_key(key, true, comparator)?;
        let index = locate(self.node(leaf), key, true, comparator)?;
        Some(self.remove_at(leaf, index))
    }

    /// Removes leaf entry `index` and restores the tree invariants.
    pub(crate) fn remove_at(&mut self, leaf: Handle, index: usize) -> (K, V) {
        let (key, value_handle) = self.nodes.get_mut(leaf).remove(index);
        let value = self.values.take(value_handle);
        self.fix_up_after_remove(leaf, index == 0);
        (key, value)
    }

    /// Walks from a leaf that just lost an entry up to the root, keeping separators,
    /// fan-out and counts exact, then collapses the root if needed.
    fn fix_up_after_remove(&mut self, leaf: Handle, mut front_changed: bool) {
        let mut current = leaf;
        loop {
            let node = self.nodes.get_mut(current);
            node.set_count(node.count() - 1);
            let Some(parent) = node.parent() else {
                break;
            };

            let index = self.nodes.get(parent).index_of_child(current);
            if front_changed {
                self.refresh_separator(parent, index, current);
                front_changed = index == 0;
            }
            if self.nodes.get(current).is_underfull() {
                self.rebalance(parent, index);
            }
            current = parent;
        }
        self.collapse_root();
    }

    /// Restores the minimum fan-out of `parent.children[index]` using one sibling under
    /// the same parent, the right one when it exists.
    fn rebalance(&mut self, parent: Handle, index: usize) {
        let parent_node = self.nodes.get(parent);
        let left_index = if index + 1 < parent_node.len() {
            index
        } else if index > 0 {
            index - 1
        } else {
            // Only child; the root collapse takes care of it.
            return;
        };
        let left = parent_node.child(left_index);
        let right = parent_node.child(left_index + 1);

        if self.nodes.get(left).len() + self.nodes.get(right).len() <= MAX_CHILDREN {
            self.merge(parent, left_index, left, right);
        } else {
            self.redistribute(parent, left_index, left, right);
        }
    }

    /// Absorbs `right` into `left` and drops `right` from the tree.
    fn merge(&mut self, parent: Handle, left_index: usize, left: Handle, right: Handle) {
        let mut right_node = self.nodes.take(right);
        let moved_children: Slots = if right_node.is_leaf() {
            Slots::new()
        } else {
            Slots::from_slice(right_node.slots())
        };

        let left_node = self.nodes.get_mut(left);
        left_node.append(&mut right_node);
        left_node.set_count(left_node.count() + right_node.count());
        left_node.set_next(right_node.next());
        if let Some(next) = right_node.next() {
            self.nodes.get_mut(next).set_prev(Some(left));
        }
        for child in moved_children {
            self.nodes.get_mut(child).set_parent(Some(left));
        }
        self.nodes.get_mut(parent).remove(left_index + 1);

        #[cfg(feature = "tracing")]
        tracing::trace!(left = ?left, right = ?right, len = self.nodes.get(left).len(), "merge");
    }

    /// Moves half the size difference from the larger sibling to the smaller one.
    fn redistribute(&mut self, parent: Handle, left_index: usize, left: Handle, right: Handle) {
        let (left_node, right_node) = self.nodes.pair_mut(left, right);
        let (left_len, right_len) = (left_node.len(), right_node.len());
        let n = left_len.abs_diff(right_len) / 2;
        let from_left = left_len > right_len;

        let moved: Slots = if from_left {
            let moved = Slots::from_slice(&left_node.slots()[left_len - n..]);
            left_node.shift_tail_to(right_node, n);
            moved
        } else {
            let moved = Slots::from_slice(&right_node.slots()[..n]);
            left_node.pull_head_from(right_node, n);
            moved
        };
        let leaf = left_node.is_leaf();

        let moved_count = if leaf {
            n
        } else {
            moved.iter().map(|&child| self.nodes.get(child).count()).sum()
        };
        let (donor, receiver) = if from_left { (left, right) } else { (right, left) };
        let donor_node = self.nodes.get_mut(donor);
        donor_node.set_count(donor_node.count() - moved_count);
        let receiver_node = self.nodes.get_mut(receiver);
        receiver_node.set_count(receiver_node.count() + moved_count);
        if !leaf {
            for child in moved {
                self.nodes.get_mut(child).set_parent(Some(receiver));
            }
        }
        // The boundary moved, so the right node starts with a different key.
        self.refresh_separator(parent, left_index + 1, right);

        #[cfg(feature = "tracing")]
        tracing::trace!(donor = ?donor, receiver = ?receiver, moved = n, "redistribute");
    }

    /// Clears an emptied root and promotes the only child of an internal root.
    fn collapse_root(&mut self) {
        while let Some(root) = self.root {
            let node = self.nodes.get(root);
            if node.is_empty() {
                self.clear();
                return;
            }
            if node.is_leaf() || node.len() > 1 {
                return;
            }
            let child = node.child(0);
            self.nodes.free(root);
            self.nodes.get_mut(child).set_parent(None);
            self.root = Some(child);

            #[cfg(feature = "tracing")]
            tracing::trace!(old = ?root, new = ?child, "collapse root");
        }
    }
}
