//! A counted B+Tree ordered map for Rust.
//!
//! [`RankedBTreeMap`] is a sorted key-value map whose nodes record the number of entries
//! below them. On top of the usual ordered-map operations it offers, in O(log n):
//!
//! - [`get_nth`](RankedBTreeMap::get_nth) - the entry at a sorted position, negative
//!   positions counting from the end
//! - [`get_index`](RankedBTreeMap::get_index) - the sorted position of a key, or of its
//!   nearest neighbour
//! - [`get_closest_key`](RankedBTreeMap::get_closest_key) - floor and ceiling lookups,
//!   inclusive or exclusive of the probe
//! - [`entries`](RankedBTreeMap::entries) - bounded iteration, forward or backward, from
//!   any position
//!
//! # Example
//!
//! ```
//! use ranked_btree::{Match, RankedBTreeMap, Side};
//!
//! let mut scores = RankedBTreeMap::new();
//! scores.set("Alice", 100).set("Bob", 85).set("Carol", 92);
//!
//! assert_eq!(scores.get(&"Bob"), Some(&85));
//! assert_eq!(scores.get_nth_key(1), Some(&"Bob"));
//! assert_eq!(scores.rank_of(&"Carol"), Some(2));
//! assert_eq!(scores.get_closest_key(&"Bz", Side::Floor, Match::Inclusive), Some(&"Bob"));
//!
//! let last_two: Vec<_> = scores.keys(-2, None).collect();
//! assert_eq!(last_two, [&"Bob", &"Carol"]);
//! ```
//!
//! # Ordering
//!
//! The map is ordered by a [`Comparator`]. The default, [`Natural`], uses the key's
//! [`Ord`] implementation; any `Fn(&K, &K) -> Ordering` works as well. [`Key`] is a
//! dynamically typed key whose `Ord` implementation orders mixed kinds of values (numbers,
//! strings, booleans, ...) in one total order, so a single map can hold all of them.
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`
//! - **`tracing`** (default) - emits `trace`-level events for node splits, merges,
//!   redistributions and root changes

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod comparator;
mod cursor;
mod error;
mod key;
mod order_statistic;
mod raw;
mod ranked_map;

pub use comparator::{Comparator, Natural};
pub use cursor::{Entries, Keys, Values};
pub use error::InvariantError;
pub use key::{Boxed, Key, Kind, polymorphic_compare};
pub use order_statistic::{Match, Rank, Side};
pub use ranked_map::RankedBTreeMap;
