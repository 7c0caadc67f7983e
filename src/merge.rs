use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::OrderedDict;

/// A collection whose entries can be merged into an
/// [`OrderedDict`](crate::OrderedDict).
///
/// Merging preserves the source's order, so a source must be able to
/// enumerate its entries in a defined order. Sources without one, such as
/// `std::collections::HashMap`, return `None` from
/// [`ordered_entries`](Self::ordered_entries) and are rejected with
/// [`Error::UnorderedSource`](crate::Error::UnorderedSource).
pub trait MergeSource<K, V> {
    /// Returns the number of entries in the source.
    fn len(&self) -> usize;

    /// Returns `true` if the source has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entries in their defined order, or `None` if the source
    /// has no defined order.
    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a;
}

impl<K, V, S> MergeSource<K, V> for OrderedDict<K, V, S> {
    fn len(&self) -> usize {
        OrderedDict::len(self)
    }

    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a,
    {
        Some(self.iter())
    }
}

impl<K, V> MergeSource<K, V> for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a,
    {
        Some(self.iter())
    }
}

impl<K, V> MergeSource<K, V> for [(K, V)] {
    fn len(&self) -> usize {
        <[(K, V)]>::len(self)
    }

    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a,
    {
        Some(self.iter().map(|(k, v)| (k, v)))
    }
}

impl<K, V> MergeSource<K, V> for Vec<(K, V)> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a,
    {
        self.as_slice().ordered_entries()
    }
}

#[cfg(feature = "std")]
impl<K, V, S> MergeSource<K, V> for std::collections::HashMap<K, V, S> {
    fn len(&self) -> usize {
        std::collections::HashMap::len(self)
    }

    fn ordered_entries<'a>(&'a self) -> Option<impl Iterator<Item = (&'a K, &'a V)>>
    where
        K: 'a,
        V: 'a,
    {
        None::<core::iter::Empty<(&'a K, &'a V)>>
    }
}
