//! Cursors hold only a position and the length seen when they were opened.
//! Each step takes the dictionary by shared reference and checks that its
//! length is unchanged; otherwise the step reports
//! [`Error::ConcurrentModification`](crate::Error::ConcurrentModification)
//! and the cursor stays exhausted from then on.
//!
//! ```rust
//! # #[cfg(feature = "foldhash")]
//! # {
//! use ordered_dict::OrderedDict;
//!
//! let mut dict: OrderedDict<_, _> = [("a", 1), ("b", 2)].into_iter().collect();
//! let mut cursor = dict.key_cursor();
//!
//! assert_eq!(cursor.next(&dict).unwrap().unwrap(), &"a");
//! *dict.get_mut("b").unwrap() += 1;
//! assert_eq!(cursor.next(&dict).unwrap().unwrap(), &"b");
//! assert!(cursor.next(&dict).is_none());
//!
//! let mut cursor = dict.key_cursor();
//! dict.insert("c", 3).unwrap();
//! assert!(cursor.next(&dict).unwrap().is_err());
//! assert!(cursor.next(&dict).is_none());
//! # }
//! ```

use crate::OrderedDict;
use crate::error::ConcurrentModificationSnafu;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active { position: usize, snapshot_len: usize },
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct RawCursor {
    state: State,
}

impl RawCursor {
    fn new(len: usize) -> Self {
        Self {
            state: State::Active {
                position: 0,
                snapshot_len: len,
            },
        }
    }

    fn advance<'a, K, V, S>(
        &mut self,
        dict: &'a OrderedDict<K, V, S>,
    ) -> Option<Result<(&'a K, &'a V)>> {
        let State::Active {
            position,
            snapshot_len,
        } = &mut self.state
        else {
            return None;
        };

        let len = dict.len();
        if len != *snapshot_len {
            let expected = *snapshot_len;
            self.state = State::Exhausted;
            return Some(
                ConcurrentModificationSnafu {
                    expected,
                    found: len,
                }
                .fail(),
            );
        }

        match dict.get_index(*position) {
            Some(entry) => {
                *position += 1;
                Some(Ok(entry))
            }
            None => {
                self.state = State::Exhausted;
                None
            }
        }
    }

    fn len_hint<K, V, S>(&self, dict: &OrderedDict<K, V, S>) -> usize {
        match self.state {
            State::Active {
                position,
                snapshot_len,
            } if dict.len() == snapshot_len => snapshot_len.saturating_sub(position),
            _ => 0,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }
}

/// A detached cursor over the keys of an `OrderedDict`.
///
/// Created by [`OrderedDict::key_cursor`].
#[derive(Debug, Clone, Copy)]
pub struct KeyCursor {
    raw: RawCursor,
}

impl KeyCursor {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            raw: RawCursor::new(len),
        }
    }

    /// Advances the cursor against `dict`.
    ///
    /// Returns `None` once the walk is over, and
    /// `Some(Err(ConcurrentModification))` exactly once if the dictionary's
    /// length changed since the cursor was opened.
    pub fn next<'a, K, V, S>(&mut self, dict: &'a OrderedDict<K, V, S>) -> Option<Result<&'a K>> {
        self.raw.advance(dict).map(|step| step.map(|(k, _)| k))
    }

    /// Returns how many keys remain, or 0 if the dictionary's length has
    /// changed.
    pub fn len_hint<K, V, S>(&self, dict: &OrderedDict<K, V, S>) -> usize {
        self.raw.len_hint(dict)
    }

    /// Returns `true` once the cursor can yield nothing more.
    pub fn is_exhausted(&self) -> bool {
        self.raw.is_exhausted()
    }
}

/// A detached cursor over the values of an `OrderedDict`.
///
/// Created by [`OrderedDict::value_cursor`].
#[derive(Debug, Clone, Copy)]
pub struct ValueCursor {
    raw: RawCursor,
}

impl ValueCursor {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            raw: RawCursor::new(len),
        }
    }

    /// Advances the cursor against `dict`. See [`KeyCursor::next`].
    pub fn next<'a, K, V, S>(&mut self, dict: &'a OrderedDict<K, V, S>) -> Option<Result<&'a V>> {
        self.raw.advance(dict).map(|step| step.map(|(_, v)| v))
    }

    /// Returns how many values remain, or 0 if the dictionary's length has
    /// changed.
    pub fn len_hint<K, V, S>(&self, dict: &OrderedDict<K, V, S>) -> usize {
        self.raw.len_hint(dict)
    }

    /// Returns `true` once the cursor can yield nothing more.
    pub fn is_exhausted(&self) -> bool {
        self.raw.is_exhausted()
    }
}

/// A detached cursor over the entries of an `OrderedDict`.
///
/// Created by [`OrderedDict::item_cursor`].
#[derive(Debug, Clone, Copy)]
pub struct ItemCursor {
    raw: RawCursor,
}

impl ItemCursor {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            raw: RawCursor::new(len),
        }
    }

    /// Advances the cursor against `dict`. See [`KeyCursor::next`].
    pub fn next<'a, K, V, S>(
        &mut self,
        dict: &'a OrderedDict<K, V, S>,
    ) -> Option<Result<(&'a K, &'a V)>> {
        self.raw.advance(dict)
    }

    /// Returns how many entries remain, or 0 if the dictionary's length has
    /// changed.
    pub fn len_hint<K, V, S>(&self, dict: &OrderedDict<K, V, S>) -> usize {
        self.raw.len_hint(dict)
    }

    /// Returns `true` once the cursor can yield nothing more.
    pub fn is_exhausted(&self) -> bool {
        self.raw.is_exhausted()
    }
}
