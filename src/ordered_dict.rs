use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::mem;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::cursor::ItemCursor;
use crate::cursor::KeyCursor;
use crate::cursor::ValueCursor;
use crate::error::IndexOutOfRangeSnafu;
use crate::error::KeyNotFoundSnafu;
use crate::error::Result;
use crate::error::UnorderedSourceSnafu;
use crate::error::resolve_index;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::hash_table::SlotPosition;
use crate::merge::MergeSource;

/// How updates to an existing key affect its position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderMode {
    /// Keys stay where they were first inserted; updating a value leaves the
    /// order alone.
    #[default]
    KeyInsertion,
    /// Updating the value of an existing key moves it to the end, so the
    /// order reflects the last write of each key.
    KeyValueInsertion,
}

/// A hash map that remembers the order of its entries.
///
/// `OrderedDict<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash keys. The
/// entries keep insertion order, which can be rearranged explicitly with
/// [`insert_at`](Self::insert_at) and [`reverse`](Self::reverse). Every
/// iterator walks the entries in that order.
///
/// Operations that may allocate return [`Result`] and fail with
/// [`Error::OutOfMemory`](crate::Error::OutOfMemory) instead of aborting; a
/// failed insertion leaves the dictionary exactly as it was.
///
/// # Performance Characteristics
///
/// - Lookup, update and insertion at the end: expected O(1).
/// - Removal, [`index_of`](Self::index_of) and positional insertion: O(n),
///   the cost of scanning and shifting the dense order index.
/// - **Memory**: a `u64` hash and slot tag per slot, plus one `usize` per
///   entry for the order index.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "foldhash")]
/// # {
/// use ordered_dict::OrderedDict;
///
/// let mut dict: OrderedDict<_, _> = OrderedDict::new();
/// dict.insert("b", 2).unwrap();
/// dict.insert("a", 1).unwrap();
/// dict.insert("c", 3).unwrap();
///
/// let keys: Vec<_> = dict.keys().copied().collect();
/// assert_eq!(keys, ["b", "a", "c"]);
/// # }
/// ```
#[derive(Clone)]
pub struct OrderedDict<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
    mode: OrderMode,
}

impl<K, V, S> Debug for OrderedDict<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for OrderedDict<K, V, S>
where
    K: PartialEq,
    V: PartialEq,
{
    /// Two dictionaries are equal when they hold equal entries in the same
    /// order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V, S> Eq for OrderedDict<K, V, S>
where
    K: Eq,
    V: Eq,
{
}

impl<K, V, S> OrderedDict<K, V, S> {
    /// Returns the number of entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = OrderedDict::new();
    /// assert_eq!(dict.len(), 0);
    /// dict.insert(1, "a").unwrap();
    /// assert_eq!(dict.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the dictionary contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns how many entries fit before the next insertion resizes.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns how many times the underlying slot table has been replaced.
    /// Updating existing keys never changes it.
    pub fn epoch(&self) -> usize {
        self.table.epoch()
    }

    /// Returns the order mode chosen at construction.
    pub fn order_mode(&self) -> OrderMode {
        self.mode
    }

    /// Returns a reference to the dictionary's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the entry at `position` in iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let dict: OrderedDict<_, _> = [("x", 1), ("y", 2)].into_iter().collect();
    /// assert_eq!(dict.get_index(1), Some((&"y", &2)));
    /// assert_eq!(dict.get_index(2), None);
    /// # }
    /// ```
    pub fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.table.get_index(position).map(|(k, v)| (k, v))
    }

    /// Returns the entry at `position` with a mutable value.
    pub fn get_index_mut(&mut self, position: usize) -> Option<(&K, &mut V)> {
        self.table.get_index_mut(position).map(|(k, v)| (&*k, v))
    }

    /// Removes and returns the entry at `index`. Negative indices count from
    /// the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange) if
    /// the resolved index is not in `[0, len)`, including on an empty
    /// dictionary.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
    /// assert_eq!(dict.pop_at(-1).unwrap(), ("c", 3));
    /// assert_eq!(dict.pop_at(0).unwrap(), ("a", 1));
    /// assert!(dict.pop_at(5).is_err());
    /// # }
    /// ```
    pub fn pop_at(&mut self, index: isize) -> Result<(K, V)> {
        let position = resolve_index(index, self.len())?;
        match self.table.remove_index(position) {
            Some(entry) => Ok(entry),
            None => IndexOutOfRangeSnafu {
                index,
                len: self.len(),
            }
            .fail(),
        }
    }

    /// Removes and returns the last entry, or `None` if the dictionary is
    /// empty.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.len().checked_sub(1)?;
        self.table.remove_index(last)
    }

    /// Reverses the order of the entries in place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = (0..4).map(|i| (i, i * 10)).collect();
    /// dict.reverse();
    /// assert_eq!(dict.keys().copied().collect::<Vec<_>>(), [3, 2, 1, 0]);
    /// # }
    /// ```
    pub fn reverse(&mut self) {
        self.table.reverse();
    }

    /// Removes every entry and returns the table to its minimum size.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Ensures `additional` more entries can be inserted without resizing.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.table.reserve(additional)
    }

    /// Shrinks the table as much as possible, dropping tombstones left by
    /// removals.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.table.shrink_to_fit()
    }

    /// An iterator visiting all key-value pairs in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = OrderedDict::new();
    /// dict.insert("a", 1).unwrap();
    /// dict.insert("b", 2).unwrap();
    ///
    /// let items: Vec<_> = dict.iter().collect();
    /// assert_eq!(items, [(&"a", &1), (&"b", &2)]);
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// An iterator visiting all entries in order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// An iterator visiting all keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably in order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Clears the dictionary, returning all entries as an iterator in order.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Opens a cursor over the keys. See [`KeyCursor`].
    pub fn key_cursor(&self) -> KeyCursor {
        KeyCursor::new(self.len())
    }

    /// Opens a cursor over the values. See [`ValueCursor`].
    pub fn value_cursor(&self) -> ValueCursor {
        ValueCursor::new(self.len())
    }

    /// Opens a cursor over the entries. See [`ItemCursor`].
    pub fn item_cursor(&self) -> ItemCursor {
        ItemCursor::new(self.len())
    }

    /// Starts a walk over the entries in slot-table order.
    pub fn slot_position(&self) -> SlotPosition {
        self.table.slot_position()
    }

    /// Advances a slot-order walk started with
    /// [`slot_position`](Self::slot_position), yielding the cached hash with
    /// each entry.
    ///
    /// Slot order is unrelated to the dictionary's order. Values may be
    /// updated in place between steps; a resize in between fails the walk
    /// with [`Error::ConcurrentModification`](crate::Error::ConcurrentModification).
    pub fn next_slot<'a>(
        &'a self,
        position: &mut SlotPosition,
    ) -> Result<Option<(u64, &'a K, &'a V)>> {
        Ok(self
            .table
            .next_slot(position)?
            .map(|(hash, (k, v))| (hash, k, v)))
    }

    /// Returns detailed statistics about the underlying slot table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<K, V, S> OrderedDict<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new dictionary with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use ordered_dict::OrderedDict;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let dict: OrderedDict<i32, String, _> = OrderedDict::with_hasher(SimpleHasher);
    /// assert!(dict.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a new dictionary able to hold `capacity` entries without
    /// resizing, using the given hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
            mode: OrderMode::default(),
        }
    }

    /// Sets how updates to existing keys affect the order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderMode;
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = OrderedDict::new().with_order_mode(OrderMode::KeyValueInsertion);
    /// dict.insert("a", 1).unwrap();
    /// dict.insert("b", 2).unwrap();
    /// dict.insert("a", 3).unwrap();
    /// assert_eq!(dict.keys().copied().collect::<Vec<_>>(), ["b", "a"]);
    /// # }
    /// ```
    pub fn with_order_mode(mut self, mode: OrderMode) -> Self {
        self.mode = mode;
        self
    }

    fn hash<Q>(&self, key: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hash_builder.hash_one(key)
    }

    fn insert_hashed(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        position: Option<usize>,
    ) -> Result<Option<V>> {
        let len = self.table.len();
        let mode = self.mode;
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                let old_value = mem::replace(&mut entry.get_mut().1, value);
                let target = match (position, mode) {
                    (Some(position), _) => Some(position),
                    (None, OrderMode::KeyValueInsertion) => Some(len - 1),
                    (None, OrderMode::KeyInsertion) => None,
                };
                if let Some(target) = target {
                    entry.move_to(target)?;
                }
                Ok(Some(old_value))
            }
            TableEntry::Vacant(entry) => {
                match position {
                    Some(position) => entry.insert_at(position, (key, value))?,
                    None => entry.insert((key, value))?,
                };
                Ok(None)
            }
        }
    }

    /// Inserts a key-value pair.
    ///
    /// A new key is appended to the end of the order. An existing key keeps
    /// its position (unless the dictionary uses
    /// [`OrderMode::KeyValueInsertion`]) and its old value is returned.
    /// Updating an existing key never resizes the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`](crate::Error::OutOfMemory) if a new key
    /// needs a resize that cannot be allocated. The dictionary is unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use ordered_dict::OrderedDict;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut dict = OrderedDict::with_hasher(SimpleHasher);
    /// assert_eq!(dict.insert(37, "a").unwrap(), None);
    /// assert_eq!(dict.insert(37, "b").unwrap(), Some("a"));
    /// assert_eq!(dict.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.hash(&key);
        self.insert_hashed(hash, key, value, None)
    }

    /// Inserts or updates `key` so that it ends up at `index` in the order.
    /// Negative indices count from the end.
    ///
    /// A new key is placed before the entry currently at `index`. An existing
    /// key has its value replaced and is moved to `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange) if the
    /// resolved index is not in `[0, len)`. Indices are never clamped, so an
    /// empty dictionary rejects every index. May also return
    /// [`Error::OutOfMemory`](crate::Error::OutOfMemory).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = [("a", 1), ("b", 2)].into_iter().collect();
    /// dict.insert_at(0, "z", 26).unwrap();
    /// assert_eq!(dict.keys().copied().collect::<Vec<_>>(), ["z", "a", "b"]);
    /// assert_eq!(dict.index_of("z").unwrap(), 0);
    /// # }
    /// ```
    pub fn insert_at(&mut self, index: isize, key: K, value: V) -> Result<Option<V>> {
        let position = resolve_index(index, self.len())?;
        let hash = self.hash(&key);
        self.insert_hashed(hash, key, value, Some(position))
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the value for `key`, or `default` if the key is absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns the stored key and value corresponding to `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash(key);
        self.table
            .find(hash, |(k, _)| key.eq(k.borrow()))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// Writing through the reference never changes the order or the table
    /// shape, so it is safe while cursors are open.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash(key);
        self.table
            .find_mut(hash, |(k, _)| key.eq(k.borrow()))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the dictionary contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).is_some()
    }

    /// Returns the position of `key` in the order. O(n).
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`](crate::Error::KeyNotFound) if the key is
    /// absent.
    pub fn index_of<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash(key);
        self.table
            .position(hash, |(k, _)| key.eq(k.borrow()))
            .ok_or_else(|| KeyNotFoundSnafu.build())
    }

    /// Removes a key, returning its value.
    ///
    /// The entries after it shift forward by one; the table is never shrunk
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`](crate::Error::KeyNotFound) if the key is
    /// absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = OrderedDict::new();
    /// dict.insert(1, "a").unwrap();
    /// assert_eq!(dict.remove(&1).unwrap(), "a");
    /// assert!(dict.remove(&1).unwrap_err().is_key_not_found());
    /// # }
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash(key);
        self.table
            .remove(hash, |(k, _)| key.eq(k.borrow()))
            .ok_or_else(|| KeyNotFoundSnafu.build())
    }

    /// Removes a key and returns its value, or returns `default` if the key
    /// is absent.
    pub fn pop_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key).unwrap_or(default)
    }

    /// Gets the given key's entry for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut counts: OrderedDict<_, _> = OrderedDict::new();
    /// for word in ["to", "be", "or", "not", "to", "be"] {
    ///     *counts.entry(word).or_insert(0).unwrap() += 1;
    /// }
    /// assert_eq!(counts.iter().collect::<Vec<_>>(), [
    ///     (&"to", &2),
    ///     (&"be", &2),
    ///     (&"or", &1),
    ///     (&"not", &1)
    /// ]);
    /// # }
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Merges the entries of `source` into the dictionary, in the source's
    /// order.
    ///
    /// New keys are appended. Existing keys are updated only when
    /// `override_existing` is set. Without it, a key repeated within the
    /// source keeps its first value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnorderedSource`](crate::Error::UnorderedSource)
    /// before touching the dictionary if the source cannot enumerate its
    /// entries in a defined order. Allocation failure returns
    /// [`Error::OutOfMemory`](crate::Error::OutOfMemory); entries merged
    /// before the failure stay merged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use std::collections::BTreeMap;
    ///
    /// use ordered_dict::OrderedDict;
    ///
    /// let mut dict: OrderedDict<_, _> = [("b", 1)].into_iter().collect();
    /// let source = BTreeMap::from([("a", 10), ("b", 20)]);
    ///
    /// dict.merge(&source, false).unwrap();
    /// assert_eq!(dict.iter().collect::<Vec<_>>(), [(&"b", &1), (&"a", &10)]);
    ///
    /// dict.merge(&source, true).unwrap();
    /// assert_eq!(dict.get("b"), Some(&20));
    /// # }
    /// ```
    pub fn merge<M>(&mut self, source: &M, override_existing: bool) -> Result<()>
    where
        M: MergeSource<K, V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        let Some(entries) = source.ordered_entries() else {
            return UnorderedSourceSnafu.fail();
        };
        self.table.reserve(source.len())?;

        for (key, value) in entries {
            let hash = self.hash(key);
            if !override_existing && self.table.find(hash, |(k, _)| k == key).is_some() {
                continue;
            }
            self.insert_hashed(hash, key.clone(), value.clone(), None)?;
        }
        Ok(())
    }

    /// Merges owned key-value pairs into the dictionary, in iteration order,
    /// with the same override rules as [`merge`](Self::merge).
    pub fn merge_pairs<I>(&mut self, pairs: I, override_existing: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs = pairs.into_iter();
        self.table.reserve(pairs.size_hint().0)?;

        for (key, value) in pairs {
            let hash = self.hash(&key);
            if !override_existing && self.table.find(hash, |(k, _)| k == &key).is_some() {
                continue;
            }
            self.insert_hashed(hash, key, value, None)?;
        }
        Ok(())
    }
}

impl<K, V, S> OrderedDict<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new dictionary using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use ordered_dict::OrderedDict;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let dict: OrderedDict<i32, String, SimpleHasher> = OrderedDict::new();
    /// assert!(dict.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new dictionary able to hold `capacity` entries without
    /// resizing, using the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates a dictionary mapping every key of `keys` to a clone of
    /// `value`, in iteration order. Duplicate keys keep their first position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use ordered_dict::OrderedDict;
    ///
    /// let dict: OrderedDict<_, _> = OrderedDict::from_keys(["x", "y", "x"], 0).unwrap();
    /// assert_eq!(dict.len(), 2);
    /// assert_eq!(dict.index_of("y").unwrap(), 1);
    /// # }
    /// ```
    pub fn from_keys<I>(keys: I, value: V) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        V: Clone,
    {
        let keys = keys.into_iter();
        let mut dict = Self::new();
        dict.reserve(keys.size_hint().0)?;
        for key in keys {
            dict.insert(key, value.clone())?;
        }
        Ok(dict)
    }
}

impl<K, V, S> Default for OrderedDict<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Q, V, S> Index<&Q> for OrderedDict<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in OrderedDict"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedDict<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// # Panics
    ///
    /// Panics if the table cannot grow.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(err) = self.merge_pairs(iter, true) {
            panic!("OrderedDict::extend: {err}");
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedDict<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        dict.extend(iter);
        dict
    }
}

impl<K, V, S> IntoIterator for OrderedDict<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedDict<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut OrderedDict<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the dictionary, which may either be vacant
/// or occupied.
///
/// This enum is constructed from the [`entry`] method on [`OrderedDict`].
///
/// [`entry`]: OrderedDict::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Appends `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> Result<&'a mut V> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Appends a value computed from a closure if the entry is vacant and
    /// returns a mutable reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> Result<&'a mut V>
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Appends the default value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> Result<&'a mut V> {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the dictionary.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Appends the entry and returns a mutable reference to its value.
    pub fn insert(self, value: V) -> Result<&'a mut V> {
        self.entry.insert((self.key, value)).map(|(_, v)| v)
    }
}

/// A view into an occupied entry in the dictionary.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Returns the entry's position in the order. O(n).
    pub fn index(&self) -> usize {
        self.entry.position()
    }

    /// Replaces the value in place and returns the old one. The order is
    /// unchanged.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the dictionary and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the dictionary and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the entries of an `OrderedDict`, in order.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of an `OrderedDict`, in order.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of an `OrderedDict`, in order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of an `OrderedDict`, in order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of an `OrderedDict`, in order.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of an `OrderedDict`, in order.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A draining iterator over the entries of an `OrderedDict`, in order.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
impl<K, V> FusedIterator for Drain<'_, K, V> {}
