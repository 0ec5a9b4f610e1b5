use smallvec::SmallVec;

use super::handle::Handle;
use crate::comparator::Comparator;

/// Fewest entries a non-root node may hold.
pub(crate) const MIN_CHILDREN: usize = 24;
/// Entries the left half keeps when an overfull node splits.
pub(crate) const SPLIT_THRESHOLD: usize = 32;
/// Most entries any node may hold once a mutation has completed.
pub(crate) const MAX_CHILDREN: usize = 64;

// +1 so a node can overflow by one entry before it is split.
const CAPACITY: usize = MAX_CHILDREN + 1;

pub(crate) type Keys<K> = SmallVec<[K; CAPACITY]>;
pub(crate) type Slots = SmallVec<[Handle; CAPACITY]>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NodeKind {
    Leaf,
    Internal,
}

/// A node of the counted B+Tree.
///
/// Leaves pair `keys[i]` with the value handle `slots[i]`. Internal nodes pair
/// `keys[i]` with the child handle `slots[i]`, where `keys[i]` is the smallest key
/// reachable through that child. Both kinds carry the same links:
/// `parent` points at the owning internal node and `prev`/`next` chain every node
/// of the same depth from left to right, across parent boundaries.
pub(crate) struct Node<K> {
    kind: NodeKind,
    // Entries in the subtree rooted here.
    count: usize,
    parent: Option<Handle>,
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: Keys<K>,
    slots: Slots,
}

impl<K> Node<K> {
    pub(crate) fn new_leaf() -> Self {
        Self::new(NodeKind::Leaf)
    }

    pub(crate) fn new_internal() -> Self {
        Self::new(NodeKind::Internal)
    }

    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            count: 0,
            parent: None,
            prev: None,
            next: None,
            keys: SmallVec::new(),
            slots: SmallVec::new(),
        }
    }

    /// Copies every scalar field and the key array; slots are left empty.
    pub(crate) fn duplicate_shell(&self) -> Self
    where
        K: Clone,
    {
        Self {
            kind: self.kind,
            count: self.count,
            parent: None,
            prev: None,
            next: None,
            keys: self.keys.clone(),
            slots: SmallVec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> NodeKind {
        self.kind
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Number of keys (and slots) held directly by this node.
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn is_overfull(&self) -> bool {
        self.keys.len() > MAX_CHILDREN
    }

    pub(crate) fn is_underfull(&self) -> bool {
        self.keys.len() < MIN_CHILDREN
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Value handle of a leaf entry.
    #[inline]
    pub(crate) fn value(&self, index: usize) -> Handle {
        debug_assert!(self.is_leaf(), "value() on an internal node");
        self.slots[index]
    }

    /// Child handle of an internal entry.
    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        debug_assert!(!self.is_leaf(), "child() on a leaf node");
        self.slots[index]
    }

    pub(crate) fn slots(&self) -> &[Handle] {
        &self.slots
    }

    pub(crate) fn push_slot(&mut self, slot: Handle) {
        self.slots.push(slot);
    }

    /// Position of `child` among this node's children.
    pub(crate) fn index_of_child(&self, child: Handle) -> usize {
        self.slots
            .iter()
            .position(|&slot| slot == child)
            .expect("`Node::index_of_child()` - handle is not a child of this node!")
    }

    /// Binary search over the keys of this node.
    ///
    /// `Ok(i)` is an exact match, `Err(i)` the position where `key` would be inserted.
    #[inline]
    pub(crate) fn search<C>(&self, key: &K, comparator: &C) -> Result<usize, usize>
    where
        C: Comparator<K> + ?Sized,
    {
        self.keys.binary_search_by(|probe| comparator.compare(probe, key))
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, slot: Handle) {
        self.keys.insert(index, key);
        self.slots.insert(index, slot);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, Handle) {
        (self.keys.remove(index), self.slots.remove(index))
    }

    /// Splits off entries `[at..]` into a fresh node of the same kind.
    ///
    /// Counts and links of both nodes are left for the caller to fix up.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        let mut right = Self::new(self.kind);
        right.keys = self.keys.drain(at..).collect();
        right.slots = self.slots.drain(at..).collect();
        right
    }

    /// Appends every entry of `right` to this node.
    pub(crate) fn append(&mut self, right: &mut Self) {
        self.keys.append(&mut right.keys);
        self.slots.append(&mut right.slots);
    }

    /// Moves the last `n` entries of this node to the front of `right`.
    pub(crate) fn shift_tail_to(&mut self, right: &mut Self, n: usize) {
        let at = self.keys.len() - n;
        let keys: Keys<K> = self.keys.drain(at..).collect();
        let slots: Slots = self.slots.drain(at..).collect();
        right.keys.insert_many(0, keys);
        right.slots.insert_many(0, slots);
    }

    /// Moves the first `n` entries of `right` to the end of this node.
    pub(crate) fn pull_head_from(&mut self, right: &mut Self, n: usize) {
        self.keys.extend(right.keys.drain(..n));
        self.slots.extend(right.slots.drain(..n));
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::comparator::Natural;

    fn leaf_with(keys: impl IntoIterator<Item = usize>) -> Node<usize> {
        let mut leaf = Node::new_leaf();
        for k in keys {
            let at = leaf.len();
            leaf.insert(at, k, Handle::from_index(k));
        }
        leaf
    }

    #[test]
    fn fan_out_constants_are_consistent() {
        const { assert!(MIN_CHILDREN < SPLIT_THRESHOLD) };
        const { assert!(SPLIT_THRESHOLD < MAX_CHILDREN) };
        // Both halves of a split must satisfy the minimum.
        const { assert!(MAX_CHILDREN + 1 - SPLIT_THRESHOLD >= MIN_CHILDREN) };
    }

    #[test]
    fn overflow_by_one_stays_inline() {
        let mut leaf = leaf_with(0..MAX_CHILDREN);
        leaf.insert(MAX_CHILDREN, MAX_CHILDREN, Handle::from_index(MAX_CHILDREN));
        assert_eq!(leaf.len(), CAPACITY);
        assert!(leaf.is_overfull());
        assert!(!leaf.keys.spilled());
        assert!(!leaf.slots.spilled());
    }

    #[test]
    fn search_reports_exact_and_insertion_points() {
        let leaf = leaf_with(0..10);
        assert_eq!(leaf.search(&4, &Natural), Ok(4));
        assert_eq!(leaf.search(&20, &Natural), Err(10));
    }

    #[test]
    fn split_off_keeps_the_front() {
        let mut leaf = leaf_with(0..=MAX_CHILDREN);
        assert!(leaf.is_overfull());
        let right = leaf.split_off(SPLIT_THRESHOLD);
        assert_eq!(leaf.len(), SPLIT_THRESHOLD);
        assert_eq!(right.len(), MAX_CHILDREN + 1 - SPLIT_THRESHOLD);
        assert_eq!(right.first_key(), Some(&SPLIT_THRESHOLD));
        assert_eq!(right.value(0), Handle::from_index(SPLIT_THRESHOLD));
    }

    #[test]
    fn shifting_preserves_order() {
        let mut left = leaf_with(0..10);
        let mut right = leaf_with(10..12);
        left.shift_tail_to(&mut right, 3);
        assert_eq!(left.keys(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(right.keys(), &[7, 8, 9, 10, 11]);

        left.pull_head_from(&mut right, 4);
        assert_eq!(left.keys(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(right.keys(), &[11]);
        assert_eq!(right.slots(), &[Handle::from_index(11)]);
    }

    #[test]
    fn index_of_child_finds_slot() {
        let mut internal: Node<usize> = Node::new_internal();
        internal.insert(0, 0, Handle::from_index(5));
        internal.insert(1, 10, Handle::from_index(9));
        assert_eq!(internal.index_of_child(Handle::from_index(9)), 1);
        assert_eq!(internal.child(0), Handle::from_index(5));
    }
}
