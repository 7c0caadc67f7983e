use alloc::collections::TryReserveError;

use snafu::Snafu;

/// Errors surfaced by [`OrderedDict`](crate::OrderedDict) and the raw
/// [`HashTable`](crate::HashTable).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The key is not present.
    #[snafu(display("key not found"))]
    KeyNotFound,

    /// A positional argument fell outside `[0, len)` after negative indices
    /// were resolved against the end.
    #[snafu(display("index {index} out of range for length {len}"))]
    IndexOutOfRange {
        /// The index as given by the caller.
        index: isize,
        /// The container's length at the time of the call.
        len: usize,
    },

    /// Growing the slot table or the order index failed. The container is
    /// left exactly as it was before the call.
    #[snafu(display("allocation failed: {source}"))]
    OutOfMemory {
        /// The allocator's report.
        source: TryReserveError,
    },

    /// The container changed length while a cursor was walking it, or was
    /// reallocated during a raw slot walk.
    #[snafu(display("container changed size during iteration (expected {expected}, found {found})"))]
    ConcurrentModification {
        /// Length (or reallocation count) captured when the walk started.
        expected: usize,
        /// The value observed at this step.
        found: usize,
    },

    /// A merge source could not enumerate its entries in a defined order.
    #[snafu(display("source has undefined order"))]
    UnorderedSource,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    /// Returns `true` for [`Error::KeyNotFound`].
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound)
    }
}

/// Resolves a possibly negative position against `len`, the way the order
/// index addresses entries.
pub(crate) fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        index.checked_add_unsigned(len)
    } else {
        Some(index)
    };
    match resolved {
        Some(position) if position >= 0 && (position as usize) < len => Ok(position as usize),
        _ => IndexOutOfRangeSnafu { index, len }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_positive_and_negative_indices() {
        assert_eq!(resolve_index(0, 3).unwrap(), 0);
        assert_eq!(resolve_index(2, 3).unwrap(), 2);
        assert_eq!(resolve_index(-1, 3).unwrap(), 2);
        assert_eq!(resolve_index(-3, 3).unwrap(), 0);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        assert!(matches!(
            resolve_index(3, 3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            resolve_index(-4, 3),
            Err(Error::IndexOutOfRange { index: -4, len: 3 })
        ));
        assert!(matches!(
            resolve_index(0, 0),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            resolve_index(isize::MIN, 5),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn display_messages() {
        let err = Error::IndexOutOfRange { index: -7, len: 2 };
        assert_eq!(alloc::format!("{err}"), "index -7 out of range for length 2");
        assert_eq!(alloc::format!("{}", Error::KeyNotFound), "key not found");
        assert!(Error::KeyNotFound.is_key_not_found());
        assert!(!Error::UnorderedSource.is_key_not_found());
    }
}
