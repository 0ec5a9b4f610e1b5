/// A zero-based rank into the sorted order of a map.
///
/// # Examples
///
/// ```
/// use ranked_btree::{RankedBTreeMap, Rank};
///
/// let mut map = RankedBTreeMap::new();
/// map.insert("a", 10);
/// map.insert("b", 20);
///
/// assert_eq!(map[Rank(0)], 10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);

/// Which neighbour of a probe key a nearest-key query looks for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Side {
    /// The greatest key below the probe.
    #[default]
    Floor,
    /// The least key above the probe.
    Ceiling,
}

/// Whether a nearest-key query may return the probe key itself.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Match {
    /// An entry equal to the probe qualifies.
    #[default]
    Inclusive,
    /// Only entries strictly below (or above) the probe qualify.
    Exclusive,
}
