#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Detached, fail-fast cursors over an `OrderedDict`.
///
/// A cursor does not borrow the dictionary between steps, so values can be
/// updated while it is open. Any change in length aborts the walk.
pub mod cursor;

mod error;

pub mod hash_table;

/// Sources an `OrderedDict` can be merged from.
pub mod merge;

/// An insertion-ordered hash map.
///
/// This module provides an `OrderedDict` that wraps the order-preserving
/// `HashTable` and adds a keyed interface with configurable hashers.
pub mod ordered_dict;

pub use cursor::ItemCursor;
pub use cursor::KeyCursor;
pub use cursor::ValueCursor;
pub use error::Error;
pub use error::Result;
pub use hash_table::HashTable;
pub use merge::MergeSource;
pub use ordered_dict::Entry;
pub use ordered_dict::OrderMode;
pub use ordered_dict::OrderedDict;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder when no default hasher is compiled in. A hasher must be
        /// supplied with `with_hasher`.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
