use thiserror::Error;

/// A broken structural invariant, reported by
/// [`RankedBTreeMap::check_invariants`](crate::RankedBTreeMap::check_invariants).
///
/// A correctly used map never produces one of these. They surface when the comparator
/// is not a strict weak ordering, or when a key's ordering changes while it is stored.
/// `node` fields identify the offending node by its slot index.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvariantError {
    #[error("root node {node} is empty but still attached")]
    EmptyRoot { node: usize },

    #[error("root node {node} is internal with a single child")]
    SingleChildRoot { node: usize },

    #[error("node {node} holds {len} entries, outside [{min}, {max}]")]
    FanOut { node: usize, len: usize, min: usize, max: usize },

    #[error("node {node} keys are not strictly increasing at index {index}")]
    KeysOutOfOrder { node: usize, index: usize },

    #[error("node {node} separator {index} differs from its child's first key")]
    StaleSeparator { node: usize, index: usize },

    #[error("node {node} stores count {stored}, but its subtree holds {actual}")]
    CountMismatch { node: usize, stored: usize, actual: usize },

    #[error("node {node} has a parent link that does not match its owner")]
    BrokenParentLink { node: usize },

    #[error("node {node} has sibling links that do not match its level")]
    BrokenSiblingLink { node: usize },

    #[error("leaves and internal nodes are mixed at depth {depth}")]
    UnevenDepth { depth: usize },

    #[error("map length {len} differs from the root count {root_count}")]
    LengthMismatch { len: usize, root_count: usize },
}
