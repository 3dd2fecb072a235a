#![deny(missing_docs)]

//! This crate implements [BlockMap], an ordered map held as a red-black tree of blocks of up to
//! [DB] sorted entries, and [BlockSet], the corresponding ordered set.
//!
//! Keys are ordered by a [Comparator], by default [NaturalOrder] which uses [Ord]. The map
//! supports navigation (floor, ceiling, higher, lower), live bounded and descending views
//! ([RangeView], [RangeViewMut]), and detached cursors ([Cursor]) which detect modification
//! of the map by other means.
//!
//! Most of the implementation is in the [gb] module, see [gb::BlockMap].
//!
//! # Example
//!
//! ```
//!     use blocktree_map::BlockMap;
//!     let mut mymap = BlockMap::new();
//!     mymap.insert("England", "London");
//!     mymap.insert("France", "Paris");
//!     println!("The capital of France is {}", mymap[&"France"]);
//!     assert_eq!(mymap.floor_key(&"Germany"), Some(&"France"));
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `serde` : enables serialisation of [BlockMap] and [BlockSet] via serde crate.
//! - `unsafe-optim` : uses unsafe code for extra optimisation.

/// Module with version of BlockMap that allows B to be specified as generic constant.
pub mod gb;

/// Module with version of BlockSet that allows B to be specified as generic constant.
pub mod set;

mod compare;
mod error;
mod iter;
mod tree;
mod vecs;
mod view;

pub use compare::{Comparator, NaturalOrder, Reversed};
pub use error::{Error, Result};
pub use gb::{Bounds, Cursor, Entry::Occupied, Entry::Vacant};

/// Default B value, the maximum number of entries in a block.
pub const DB: usize = 64;

/// BlockMap with default block capacity [DB].
pub type BlockMap<K, V, C = NaturalOrder> = gb::BlockMap<K, V, C, DB>;

/// BlockSet with default block capacity [DB].
pub type BlockSet<K, C = NaturalOrder> = set::BlockSet<K, C, DB>;

/// Entry in BlockMap, returned by [BlockMap::entry].
pub type Entry<'a, K, V, C = NaturalOrder> = gb::Entry<'a, K, V, C, DB>;

/// Occupied [Entry].
pub type OccupiedEntry<'a, K, V, C = NaturalOrder> = gb::OccupiedEntry<'a, K, V, C, DB>;

/// Vacant [Entry].
pub type VacantEntry<'a, K, V, C = NaturalOrder> = gb::VacantEntry<'a, K, V, C, DB>;

/// Consuming iterator returned by [BlockMap::into_iter].
pub type IntoIter<K, V> = gb::IntoIter<K, V, DB>;

/// Consuming iterator returned by [BlockMap::into_keys].
pub type IntoKeys<K, V> = gb::IntoKeys<K, V, DB>;

/// Consuming iterator returned by [BlockMap::into_values].
pub type IntoValues<K, V> = gb::IntoValues<K, V, DB>;

/// Iterator returned by [BlockMap::iter_mut].
pub type IterMut<'a, K, V> = gb::IterMut<'a, K, V, DB>;

/// Iterator returned by [BlockMap::iter].
pub type Iter<'a, K, V> = gb::Iter<'a, K, V, DB>;

/// Iterator returned by [BlockMap::keys].
pub type Keys<'a, K, V> = gb::Keys<'a, K, V, DB>;

/// Iterator returned by [BlockMap::values].
pub type Values<'a, K, V> = gb::Values<'a, K, V, DB>;

/// Iterator returned by [BlockMap::values_mut].
pub type ValuesMut<'a, K, V> = gb::ValuesMut<'a, K, V, DB>;

/// Iterator returned by [BlockMap::range].
pub type Range<'a, K, V> = gb::Range<'a, K, V, DB>;

/// Iterator returned by [BlockMap::range_mut].
pub type RangeMut<'a, K, V> = gb::RangeMut<'a, K, V, DB>;

/// View returned by [BlockMap::head_map], [BlockMap::tail_map], [BlockMap::sub_map] and [BlockMap::descending_map].
pub type RangeView<'a, K, V, C = NaturalOrder> = gb::RangeView<'a, K, V, C, DB>;

/// View returned by [BlockMap::head_map_mut], [BlockMap::tail_map_mut], [BlockMap::sub_map_mut] and [BlockMap::descending_map_mut].
pub type RangeViewMut<'a, K, V, C = NaturalOrder> = gb::RangeViewMut<'a, K, V, C, DB>;

/// View returned by [BlockSet::head_set], [BlockSet::tail_set], [BlockSet::sub_set] and [BlockSet::descending_set].
pub type SetView<'a, K, C = NaturalOrder> = set::SetView<'a, K, C, DB>;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(test)]
mod mytests;
