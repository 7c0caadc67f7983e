//! The raw order-preserving hash table.
//!
//! [`HashTable<T>`] combines two structures:
//!
//! - a power-of-two **slot table** probed with the classic perturbation
//!   sequence (`i = i * 5 + perturb + 1; perturb >>= 5`), where every slot is
//!   empty, tombstoned, or occupied by a value and its cached hash;
//! - a dense **order index** holding one slot index per live value, whose
//!   sequence is the iteration order.
//!
//! Like the keyed wrappers built on top of it, the table never hashes or
//! compares values itself: every lookup is driven by a caller-supplied hash
//! and equality predicate.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use snafu::ResultExt;

use crate::error::ConcurrentModificationSnafu;
use crate::error::IndexOutOfRangeSnafu;
use crate::error::OutOfMemorySnafu;
use crate::error::Result;

/// Smallest slot table ever allocated. Must be a power of two.
const MIN_SIZE: usize = 8;

/// Bits of the hash folded into the probe sequence per step.
const PERTURB_SHIFT: u32 = 5;

/// Past this many live entries a resize only doubles the live count instead
/// of quadrupling it.
const LARGE_TABLE: usize = 50_000;

/// Smallest power of two strictly greater than `minused`, never below
/// [`MIN_SIZE`].
#[inline]
fn table_size_for(minused: usize) -> usize {
    minused
        .checked_add(1)
        .and_then(usize::checked_next_power_of_two)
        .map(|size| size.max(MIN_SIZE))
        // An impossible size; the allocator rejects it as a capacity overflow.
        .unwrap_or(usize::MAX)
}

/// Table size chosen when a new-key insertion pushes the fill past 2/3.
#[inline]
fn grow_target(used: usize) -> usize {
    let factor = if used > LARGE_TABLE { 2 } else { 4 };
    table_size_for(used.saturating_mul(factor))
}

#[inline(always)]
fn over_load_factor(fill: usize, slots: usize) -> bool {
    fill.saturating_mul(3) >= slots.saturating_mul(2)
}

#[derive(Clone)]
enum Slot<T> {
    Empty,
    Deleted,
    Occupied { hash: u64, value: T },
}

impl<T> Slot<T> {
    #[inline]
    fn occupied(&self) -> &T {
        match self {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("order index references a vacant slot"),
        }
    }

    #[inline]
    fn occupied_mut(&mut self) -> &mut T {
        match self {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("order index references a vacant slot"),
        }
    }

    #[inline]
    fn take(&mut self, replacement: Slot<T>) -> T {
        match mem::replace(self, replacement) {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("order index references a vacant slot"),
        }
    }
}

/// The perturbation probe sequence for one hash.
///
/// Once `perturb` has shifted down to zero the recurrence `i = 5i + 1` visits
/// every index of a power-of-two table, so a probe always reaches an empty
/// slot as long as one exists.
struct ProbeSeq {
    index: usize,
    perturb: usize,
    mask: usize,
}

impl ProbeSeq {
    #[inline(always)]
    fn new(hash: u64, mask: usize) -> Self {
        let perturb = hash as usize;
        Self {
            index: perturb & mask,
            perturb,
            mask,
        }
    }

    #[inline(always)]
    fn slot(&self) -> usize {
        self.index & self.mask
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.index = self
            .index
            .wrapping_mul(5)
            .wrapping_add(self.perturb)
            .wrapping_add(1);
        self.perturb >>= PERTURB_SHIFT;
    }
}

enum Probe {
    Found(usize),
    Vacant(usize),
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries.
    pub used: usize,
    /// Live entries plus tombstones.
    pub fill: usize,
    /// Number of tombstoned slots.
    pub tombstones: usize,
    /// Total number of slots allocated.
    pub slots: usize,
    /// Entries the table can hold before the next resize.
    pub capacity: usize,
    /// Number of reallocations so far.
    pub epoch: usize,
    /// `fill / slots`.
    pub load_factor: f64,
    /// `histogram[n]` counts live entries found after `n` probe steps.
    pub probe_histogram: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Ordered Table Debug Statistics ===");
        println!(
            "Population: {} live, {} tombstones, {}/{} slots filled ({:.2}% load factor)",
            self.used,
            self.tombstones,
            self.fill,
            self.slots,
            self.load_factor * 100.0
        );
        println!("Capacity before resize: {}", self.capacity);
        println!("Reallocations: {}", self.epoch);
        for (steps, count) in self.probe_histogram.iter().enumerate() {
            println!("{:>2} | {}", steps, count);
        }
    }
}

/// An order-preserving hash table using open addressing.
///
/// `HashTable<T>` stores values of type `T` and remembers the position of
/// every value in an explicit order, which is insertion order unless changed
/// with the positional operations. Like the keyed [`OrderedDict`], lookups
/// require both the hash value and an equality predicate.
///
/// ## Performance Characteristics
///
/// - Lookup, insertion at the end and update: expected O(1).
/// - Deletion, positional insertion and `position`: O(n) in the worst case,
///   the cost of shifting the dense order index.
/// - Iteration walks the order index, never the slot table.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use ordered_dict::hash_table::Entry;
/// # use ordered_dict::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_str(s: &str) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     s.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::with_capacity(10);
/// for word in ["one", "two", "three"] {
///     match table.entry(hash_str(word), |s: &String| s == word) {
///         Entry::Vacant(entry) => {
///             entry.insert(word.to_string()).unwrap();
///         }
///         Entry::Occupied(_) => unreachable!(),
///     }
/// }
///
/// let words: Vec<&str> = table.iter().map(String::as_str).collect();
/// assert_eq!(words, ["one", "two", "three"]);
/// ```
///
/// [`OrderedDict`]: crate::OrderedDict
#[derive(Clone)]
pub struct HashTable<T> {
    slots: Box<[Slot<T>]>,
    order: Vec<usize>,
    fill: usize,
    epoch: usize,
    #[cfg(test)]
    fail_alloc: bool,
}

impl<T> Debug for HashTable<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("entries", &DebugEntries(self))
            .field("used", &self.order.len())
            .field("fill", &self.fill)
            .field("slots", &self.slots.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

struct DebugEntries<'a, T>(&'a HashTable<T>);

impl<T: Debug> Debug for DebugEntries<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.0.order.iter().map(|&slot| {
                (slot, self.0.slots[slot].occupied())
            }))
            .finish()
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with the minimum number of slots.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new hash table able to hold `capacity` values without
    /// resizing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_dict::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let size = table_size_for(capacity.saturating_mul(3) / 2);
        Self {
            slots: Self::empty_slots(size),
            order: Vec::new(),
            fill: 0,
            epoch: 0,
            #[cfg(test)]
            fail_alloc: false,
        }
    }

    fn empty_slots(size: usize) -> Box<[Slot<T>]> {
        core::iter::repeat_with(|| Slot::Empty).take(size).collect()
    }

    fn alloc_slots(&self, size: usize) -> Result<Box<[Slot<T>]>> {
        #[cfg(test)]
        let size = if self.fail_alloc { usize::MAX } else { size };
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(size)
            .context(OutOfMemorySnafu)
            .inspect_err(|err| log::debug!("slot table allocation of {size} slots failed: {err}"))?;
        slots.resize_with(size, || Slot::Empty);
        Ok(slots.into_boxed_slice())
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Returns the number of values in the table.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the table contains no values.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns how many values the table can hold before the next insertion
    /// triggers a resize, assuming no tombstones.
    pub fn capacity(&self) -> usize {
        (self.slots.len() * 2 - 1) / 3
    }

    /// Returns the number of allocated slots. Always a power of two.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstoned slots.
    pub fn tombstones(&self) -> usize {
        self.fill - self.order.len()
    }

    /// Returns how many times the slot table has been replaced.
    ///
    /// The counter only moves when the slot table is reallocated, so an
    /// unchanged epoch proves no slot has moved.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    fn probe(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Probe {
        let mut seq = ProbeSeq::new(hash, self.mask());
        let mut free_slot = None;
        loop {
            let index = seq.slot();
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(free_slot.unwrap_or(index)),
                Slot::Deleted => {
                    if free_slot.is_none() {
                        free_slot = Some(index);
                    }
                }
                Slot::Occupied {
                    hash: slot_hash,
                    value,
                } => {
                    if *slot_hash == hash && eq(value) {
                        return Probe::Found(index);
                    }
                }
            }
            seq.advance();
        }
    }

    /// Finds a free slot without comparing values. Only valid for tables
    /// free of tombstones whose values are known to be distinct.
    fn clean_slot(slots: &[Slot<T>], hash: u64) -> usize {
        let mut seq = ProbeSeq::new(hash, slots.len() - 1);
        while !matches!(slots[seq.slot()], Slot::Empty) {
            seq.advance();
        }
        seq.slot()
    }

    fn position_of_slot(&self, slot: usize) -> Option<usize> {
        self.order.iter().position(|&s| s == slot)
    }

    /// Returns a reference to the value matching `hash` and `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ordered_dict::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(7, |&v: &u32| v == 7).or_insert(7).unwrap();
    ///
    /// assert_eq!(table.find(7, |&v| v == 7), Some(&7));
    /// assert_eq!(table.find(8, |&v| v == 8), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        match self.probe(hash, eq) {
            Probe::Found(slot) => Some(self.slots[slot].occupied()),
            Probe::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`.
    ///
    /// Mutating a value in place never reallocates the table.
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        match self.probe(hash, eq) {
            Probe::Found(slot) => Some(self.slots[slot].occupied_mut()),
            Probe::Vacant(_) => None,
        }
    }

    /// Returns the position of the matching value in the order index.
    pub fn position(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<usize> {
        match self.probe(hash, eq) {
            Probe::Found(slot) => self.position_of_slot(slot),
            Probe::Vacant(_) => None,
        }
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// Looking up an entry never resizes; only inserting through a
    /// [`VacantEntry`] can.
    pub fn entry(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Entry<'_, T> {
        match self.probe(hash, eq) {
            Probe::Found(slot) => Entry::Occupied(OccupiedEntry { table: self, slot }),
            Probe::Vacant(slot) => Entry::Vacant(VacantEntry {
                table: self,
                hash,
                slot,
            }),
        }
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The slot becomes a tombstone and the value's reference is spliced out
    /// of the order index; the table never shrinks here.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        match self.entry(hash, eq) {
            Entry::Occupied(entry) => Some(entry.remove()),
            Entry::Vacant(_) => None,
        }
    }

    /// Returns the value at `position` in iteration order.
    pub fn get_index(&self, position: usize) -> Option<&T> {
        let slot = *self.order.get(position)?;
        Some(self.slots[slot].occupied())
    }

    /// Returns the value at `position` in iteration order, mutably.
    pub fn get_index_mut(&mut self, position: usize) -> Option<&mut T> {
        let slot = *self.order.get(position)?;
        Some(self.slots[slot].occupied_mut())
    }

    /// Removes and returns the value at `position` in iteration order.
    pub fn remove_index(&mut self, position: usize) -> Option<T> {
        if position >= self.order.len() {
            return None;
        }
        let slot = self.order.remove(position);
        Some(self.slots[slot].take(Slot::Deleted))
    }

    /// Moves the value at `from` so that it ends up at `to`, shifting the
    /// values in between by one.
    pub fn move_index(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.order.len();
        snafu::ensure!(
            from < len,
            IndexOutOfRangeSnafu {
                index: from as isize,
                len
            }
        );
        snafu::ensure!(
            to < len,
            IndexOutOfRangeSnafu {
                index: to as isize,
                len
            }
        );
        if from < to {
            self.order[from..=to].rotate_left(1);
        } else if to < from {
            self.order[to..=from].rotate_right(1);
        }
        Ok(())
    }

    /// Reverses the iteration order in place. No hashing is involved.
    pub fn reverse(&mut self) {
        self.order.reverse();
    }

    /// Removes all values and returns the slot table to its minimum size.
    pub fn clear(&mut self) {
        self.slots = Self::empty_slots(MIN_SIZE);
        self.order = Vec::new();
        self.fill = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Ensures `additional` more values can be inserted without a resize.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`](crate::Error::OutOfMemory) if the new
    /// slot table cannot be allocated; the table is left untouched.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if over_load_factor(self.fill.saturating_add(additional), self.slots.len()) {
            let minused = self.order.len().saturating_add(additional).saturating_mul(2);
            self.resize(table_size_for(minused))?;
        }
        Ok(())
    }

    /// Rebuilds the slot table at the smallest size that holds the current
    /// values, dropping every tombstone.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        let size = table_size_for(self.order.len().saturating_mul(3) / 2);
        if size < self.slots.len() || self.fill > self.order.len() {
            self.resize(size)?;
        }
        Ok(())
    }

    fn resize(&mut self, size: usize) -> Result<()> {
        let slots = self.alloc_slots(size)?;
        self.rehash_into(slots);
        Ok(())
    }

    /// Moves every live value into `slots` and relinks the order index in
    /// place, keeping its sequence.
    fn rehash_into(&mut self, slots: Box<[Slot<T>]>) {
        let old_size = self.slots.len();
        let old_fill = self.fill;
        let mut old_slots = mem::replace(&mut self.slots, slots).into_vec();

        for slot_ref in self.order.iter_mut() {
            let slot = mem::replace(&mut old_slots[*slot_ref], Slot::Empty);
            if let Slot::Occupied { hash, .. } = slot {
                let index = Self::clean_slot(&self.slots, hash);
                self.slots[index] = slot;
                *slot_ref = index;
            } else {
                unreachable!("order index references a vacant slot");
            }
        }

        self.fill = self.order.len();
        self.epoch = self.epoch.wrapping_add(1);
        log::trace!(
            "resized slot table {old_size} -> {} (used {}, fill {old_fill} -> {})",
            self.slots.len(),
            self.order.len(),
            self.fill
        );
    }

    /// Returns an iterator over the values in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            order: self.order.iter(),
        }
    }

    /// Returns an iterator over mutable references to the values in order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            slots: NonNull::from(&mut *self.slots).cast(),
            slot_count: self.slots.len(),
            order: self.order.iter(),
            _marker: PhantomData,
        }
    }

    /// Removes every value, yielding them in order.
    ///
    /// The table is reset to its minimum size as soon as the iterator is
    /// created; values not consumed are dropped with the iterator.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let slots = mem::replace(&mut self.slots, Self::empty_slots(MIN_SIZE));
        let order = mem::take(&mut self.order);
        self.fill = 0;
        self.epoch = self.epoch.wrapping_add(1);
        Drain {
            inner: IntoIter {
                slots: slots.into_vec(),
                order: order.into_iter(),
            },
            _marker: PhantomData,
        }
    }

    /// Starts a walk over the slot table in slot order.
    pub fn slot_position(&self) -> SlotPosition {
        SlotPosition {
            index: 0,
            epoch: self.epoch,
        }
    }

    /// Advances a slot-order walk, returning the next live value with its
    /// cached hash.
    ///
    /// Values may be updated in place between calls. Any reallocation of the
    /// slot table since [`slot_position`](Self::slot_position) makes the walk
    /// fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`](crate::Error::ConcurrentModification)
    /// if the table was reallocated.
    pub fn next_slot<'a>(&'a self, position: &mut SlotPosition) -> Result<Option<(u64, &'a T)>> {
        snafu::ensure!(
            position.epoch == self.epoch,
            ConcurrentModificationSnafu {
                expected: position.epoch,
                found: self.epoch
            }
        );
        while position.index < self.slots.len() {
            let index = position.index;
            position.index += 1;
            if let Slot::Occupied { hash, value } = &self.slots[index] {
                return Ok(Some((*hash, value)));
            }
        }
        Ok(None)
    }

    /// Returns detailed utilization statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mask = self.mask();
        let mut probe_histogram = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let Slot::Occupied { hash, .. } = slot else {
                continue;
            };
            let mut seq = ProbeSeq::new(*hash, mask);
            let mut steps = 0;
            while seq.slot() != index {
                seq.advance();
                steps += 1;
            }
            if probe_histogram.len() <= steps {
                probe_histogram.resize(steps + 1, 0);
            }
            probe_histogram[steps] += 1;
        }

        DebugStats {
            used: self.order.len(),
            fill: self.fill,
            tombstones: self.tombstones(),
            slots: self.slots.len(),
            capacity: self.capacity(),
            epoch: self.epoch,
            load_factor: self.fill as f64 / self.slots.len() as f64,
            probe_histogram,
        }
    }
}

/// A resumable position in a slot-order walk, see
/// [`HashTable::next_slot`].
#[derive(Debug, Clone, Copy)]
pub struct SlotPosition {
    index: usize,
    epoch: usize,
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// The value is not present in the table.
    Vacant(VacantEntry<'a, T>),
    /// The value is present in the table.
    Occupied(OccupiedEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` at the end of the order if the entry is vacant and
    /// returns a mutable reference to the value.
    pub fn or_insert(self, default: T) -> Result<&'a mut T> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Like [`or_insert`](Self::or_insert), computing the value lazily.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> Result<&'a mut T> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
///
/// The entry remembers the slot the probe ended on: the first tombstone seen,
/// or the empty slot that terminated the search.
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u64,
    slot: usize,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Inserts the value at the end of the order and returns a mutable
    /// reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`](crate::Error::OutOfMemory) if the
    /// insertion needs a resize or order index growth that cannot be
    /// allocated. The table is left untouched in that case.
    pub fn insert(self, value: T) -> Result<&'a mut T> {
        let position = self.table.order.len();
        self.insert_at(position, value)
    }

    /// Inserts the value at `position` in the order, shifting later values
    /// back by one. `position == len()` appends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange) if
    /// `position > len()`, or [`Error::OutOfMemory`](crate::Error::OutOfMemory)
    /// as for [`insert`](Self::insert).
    pub fn insert_at(self, position: usize, value: T) -> Result<&'a mut T> {
        let table = self.table;
        let used = table.order.len();
        snafu::ensure!(
            position <= used,
            IndexOutOfRangeSnafu {
                index: position as isize,
                len: used
            }
        );

        let fill = match table.slots[self.slot] {
            Slot::Deleted => table.fill,
            _ => table.fill + 1,
        };
        // Acquire everything that can fail before touching the table.
        let grown = if over_load_factor(fill, table.slots.len()) {
            Some(table.alloc_slots(grow_target(used + 1))?)
        } else {
            None
        };
        table.order.try_reserve(1).context(OutOfMemorySnafu)?;

        table.slots[self.slot] = Slot::Occupied {
            hash: self.hash,
            value,
        };
        table.fill = fill;
        table.order.insert(position, self.slot);
        if let Some(slots) = grown {
            table.rehash_into(slots);
        }

        let slot = table.order[position];
        Ok(table.slots[slot].occupied_mut())
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    slot: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &T {
        self.table.slots[self.slot].occupied()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut T {
        self.table.slots[self.slot].occupied_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut T {
        self.table.slots[self.slot].occupied_mut()
    }

    /// Returns the entry's position in iteration order. O(n).
    pub fn position(&self) -> usize {
        self.table
            .position_of_slot(self.slot)
            .unwrap_or_else(|| unreachable!("occupied slot missing from the order index"))
    }

    /// Moves the entry to `position` in iteration order, shifting the values
    /// in between. The slot table is untouched.
    pub fn move_to(&mut self, position: usize) -> Result<()> {
        let from = self.position();
        self.table.move_index(from, position)
    }

    /// Removes the entry from the table and returns the value.
    pub fn remove(self) -> T {
        let position = self.position();
        self.table.order.remove(position);
        self.table.slots[self.slot].take(Slot::Deleted)
    }
}

/// An iterator over the values of a [`HashTable`] in order.
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    order: core::slice::Iter<'a, usize>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            order: self.order.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = *self.order.next()?;
        Some(self.slots[slot].occupied())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = *self.order.next_back()?;
        Some(self.slots[slot].occupied())
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// A mutable iterator over the values of a [`HashTable`] in order.
pub struct IterMut<'a, T> {
    slots: NonNull<Slot<T>>,
    slot_count: usize,
    order: core::slice::Iter<'a, usize>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    #[inline]
    fn slot_mut(&mut self, slot: usize) -> &'a mut T {
        assert!(slot < self.slot_count);
        // SAFETY: `slots` points at `slot_count` initialized slots mutably
        // borrowed for `'a`, and `slot` was bounds checked above. The order
        // index holds every slot index at most once, so no slot is handed out
        // twice.
        unsafe { (*self.slots.as_ptr().add(slot)).occupied_mut() }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = *self.order.next()?;
        Some(self.slot_mut(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = *self.order.next_back()?;
        Some(self.slot_mut(slot))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// An owning iterator over the values of a [`HashTable`] in order.
pub struct IntoIter<T> {
    slots: Vec<Slot<T>>,
    order: alloc::vec::IntoIter<usize>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.order.next()?;
        Some(self.slots[slot].take(Slot::Empty))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.order.next_back()?;
        Some(self.slots[slot].take(Slot::Empty))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for HashTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_vec(),
            order: self.order.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A draining iterator over the values of a [`HashTable`] in order.
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, T> {
    inner: IntoIter<T>,
    _marker: PhantomData<&'a mut HashTable<T>>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Drain<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
impl<T> FusedIterator for Drain<'_, T> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::Error;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn insert(table: &mut HashTable<Item>, state: &HashState, key: u64, value: i32) {
        match table.entry(hash_key(state, key), |v| v.key == key) {
            Entry::Vacant(v) => {
                v.insert(Item { key, value }).unwrap();
            }
            Entry::Occupied(mut o) => o.get_mut().value = value,
        }
    }

    fn keys(table: &HashTable<Item>) -> Vec<u64> {
        table.iter().map(|v| v.key).collect()
    }

    #[test]
    fn table_sizes() {
        assert_eq!(table_size_for(0), MIN_SIZE);
        assert_eq!(table_size_for(7), MIN_SIZE);
        assert_eq!(table_size_for(8), 16);
        assert_eq!(table_size_for(20), 32);
        assert_eq!(grow_target(6), 32);
        assert_eq!(grow_target(LARGE_TABLE + 1), table_size_for((LARGE_TABLE + 1) * 2));
        assert_eq!(table_size_for(usize::MAX), usize::MAX);
    }

    #[test]
    fn probe_sequence_visits_every_slot() {
        for hash in [0u64, 1, 0xDEAD_BEEF, u64::MAX] {
            let mask = 63;
            let mut seq = ProbeSeq::new(hash, mask);
            let mut seen = vec![false; mask + 1];
            for _ in 0..4096 {
                seen[seq.slot()] = true;
                seq.advance();
            }
            assert!(seen.iter().all(|&s| s), "hash {hash:#x} missed slots");
        }
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            match table.entry(hash, |v: &Item| v.key == k) {
                Entry::Vacant(v) => {
                    v.insert(Item {
                        key: k,
                        value: (k as i32) * 2,
                    })
                    .unwrap();
                    assert_eq!(
                        table.find(hash, |v| v.key == k),
                        Some(&Item {
                            key: k,
                            value: (k as i32) * 2
                        }),
                        "{:#?}",
                        table
                    );
                }
                Entry::Occupied(_) => panic!("unexpected occupied on first insert: {:#?}", table),
            }
        }
        assert_eq!(table.len(), 32);
        assert_eq!(keys(&table), (0..32).collect::<Vec<_>>());

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        let k = 42u64;
        let hash = hash_key(&state, k);

        match table.entry(hash, |v| v.key == k) {
            Entry::Vacant(v) => {
                v.insert(Item { key: k, value: 7 }).unwrap();
            }
            Entry::Occupied(_) => panic!("should be vacant first time"),
        }

        match table.entry(hash, |v| v.key == k) {
            Entry::Occupied(mut occ) => {
                let prev_value = occ.get().value;
                *occ.get_mut() = Item { key: k, value: 11 };
                assert_eq!(prev_value, 7, "{:#?}", table);
            }
            Entry::Vacant(_) => panic!("should be occupied: {}#{:02X} in {:#?}", k, hash, table),
        }
        let found = table.find(hash, |v| v.key == k).unwrap();
        assert_eq!(found.value, 11);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_leaves_tombstones_and_keeps_order() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..8u64 {
            insert(&mut table, &state, k, k as i32);
        }
        let slots = table.slot_count();
        for k in [0u64, 3, 7] {
            let hash = hash_key(&state, k);
            let removed = table.remove(hash, |v| v.key == k).expect("should remove");
            assert_eq!(removed.key, k);
        }
        assert_eq!(table.len(), 5);
        assert_eq!(table.tombstones(), 3);
        assert_eq!(table.slot_count(), slots);
        assert_eq!(keys(&table), vec![1, 2, 4, 5, 6]);

        let hash = hash_key(&state, 1000);
        assert!(table.remove(hash, |v| v.key == 1000).is_none());
    }

    #[test]
    fn tombstone_is_reused_without_growing_fill() {
        let mut table: HashTable<u64> = HashTable::new();
        table.entry(3, |&v| v == 3).or_insert(3).unwrap();
        table.entry(3, |&v| v == 11).or_insert(11).unwrap();
        assert_eq!(table.remove(3, |&v| v == 3), Some(3));
        assert_eq!(table.debug_stats().fill, 2);

        // The probe for 19 passes the tombstone first and lands there.
        table.entry(3, |&v| v == 19).or_insert(19).unwrap();
        let stats = table.debug_stats();
        assert_eq!(stats.fill, 2);
        assert_eq!(stats.tombstones, 0);
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), vec![11, 19]);
    }

    #[test]
    fn resize_keeps_relative_order() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        let mut epochs = vec![table.epoch()];
        for k in (0..500u64).rev() {
            insert(&mut table, &state, k, k as i32);
            if *epochs.last().unwrap() != table.epoch() {
                epochs.push(table.epoch());
                assert_eq!(keys(&table), (k..500).rev().collect::<Vec<_>>());
            }
        }
        assert!(epochs.len() >= 3, "expected at least two resizes");
        assert_eq!(table.debug_stats().tombstones, 0);
        for k in 0..500u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).unwrap().value, k as i32);
        }
    }

    #[test]
    fn update_never_resizes() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..5u64 {
            insert(&mut table, &state, k, 0);
        }
        let epoch = table.epoch();
        let slots = table.slot_count();
        for round in 0..100 {
            for k in 0..5u64 {
                insert(&mut table, &state, k, round);
            }
        }
        assert_eq!(table.epoch(), epoch);
        assert_eq!(table.slot_count(), slots);
    }

    #[test]
    fn load_factor_triggers_growth() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..5u64 {
            table.entry(v, |&x| x == v).or_insert(v).unwrap();
        }
        assert_eq!(table.slot_count(), 8);
        table.entry(5, |&x| x == 5).or_insert(5).unwrap();
        // 6 * 3 >= 8 * 2, grows to the smallest power of two above 6 * 4.
        assert_eq!(table.slot_count(), 32);
        assert_eq!(table.epoch(), 1);
    }

    #[test]
    fn explicit_collision() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        let hash = 0;
        for k in 0..65u64 {
            match table.entry(hash, |v| v.key == k) {
                Entry::Vacant(v) => {
                    v.insert(Item {
                        key: k,
                        value: k as i32,
                    })
                    .unwrap();
                }
                _ => unreachable!(),
            }
        }

        assert_eq!(table.len(), 65);
        for k in 0..65u64 {
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: k as i32
                }),
                "{:#?}",
                table
            );
        }
        for k in (0..65u64).step_by(2) {
            assert!(table.remove(hash, |v| v.key == k).is_some());
        }
        assert_eq!(keys(&table), (1..65).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn positional_operations() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..4u64 {
            insert(&mut table, &state, k, 0);
        }

        let k = 9u64;
        match table.entry(hash_key(&state, k), |v| v.key == k) {
            Entry::Vacant(v) => {
                v.insert_at(1, Item { key: k, value: 0 }).unwrap();
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(keys(&table), vec![0, 9, 1, 2, 3]);
        assert_eq!(table.position(hash_key(&state, 9), |v| v.key == 9), Some(1));

        table.move_index(1, 4).unwrap();
        assert_eq!(keys(&table), vec![0, 1, 2, 3, 9]);
        table.move_index(3, 0).unwrap();
        assert_eq!(keys(&table), vec![3, 0, 1, 2, 9]);
        assert!(matches!(
            table.move_index(5, 0),
            Err(Error::IndexOutOfRange { index: 5, len: 5 })
        ));

        assert_eq!(table.remove_index(0).map(|v| v.key), Some(3));
        assert_eq!(table.remove_index(10), None);
        assert_eq!(table.get_index(0).map(|v| v.key), Some(0));
        table.get_index_mut(0).unwrap().value = 5;
        assert_eq!(table.get_index(0).unwrap().value, 5);

        table.reverse();
        assert_eq!(keys(&table), vec![9, 2, 1, 0]);

        let k = 10u64;
        match table.entry(hash_key(&state, k), |v| v.key == k) {
            Entry::Vacant(v) => assert!(matches!(
                v.insert_at(5, Item { key: k, value: 0 }),
                Err(Error::IndexOutOfRange { index: 5, len: 4 })
            )),
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn occupied_entry_moves_and_removes() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..5u64 {
            insert(&mut table, &state, k, 0);
        }
        match table.entry(hash_key(&state, 1), |v| v.key == 1) {
            Entry::Occupied(mut o) => {
                assert_eq!(o.position(), 1);
                o.move_to(3).unwrap();
                assert_eq!(o.position(), 3);
            }
            Entry::Vacant(_) => unreachable!(),
        }
        assert_eq!(keys(&table), vec![0, 2, 3, 1, 4]);

        match table.entry(hash_key(&state, 3), |v| v.key == 3) {
            Entry::Occupied(o) => assert_eq!(o.remove().key, 3),
            Entry::Vacant(_) => unreachable!(),
        }
        assert_eq!(keys(&table), vec![0, 2, 1, 4]);
    }

    #[test]
    fn iter_mut_and_drain() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 10..20u64 {
            insert(&mut table, &state, k, k as i32);
        }
        for item in table.iter_mut() {
            item.value += 1;
        }
        assert!(table.iter().all(|v| v.value == v.key as i32 + 1));
        assert_eq!(
            table.iter().rev().map(|v| v.key).collect::<Vec<_>>(),
            (10..20).rev().collect::<Vec<_>>()
        );

        let drained: Vec<u64> = table.drain().map(|v| v.key).collect();
        assert_eq!(drained, (10..20).collect::<Vec<_>>());
        assert_eq!(table.len(), 0);
        assert_eq!(table.slot_count(), MIN_SIZE);

        for k in 10..20u64 {
            let hash = hash_key(&state, k);
            assert!(table.find(hash, |v| v.key == k).is_none());
        }
    }

    #[test]
    fn into_iter_yields_order() {
        let mut table: HashTable<String> = HashTable::new();
        for (hash, word) in [(1u64, "b"), (2, "a"), (3, "c")] {
            table
                .entry(hash, |s: &String| s == word)
                .or_insert(word.to_string())
                .unwrap();
        }
        table.reverse();
        let words: Vec<String> = table.into_iter().collect();
        assert_eq!(words, vec!["c", "a", "b"]);
    }

    #[test]
    fn reserve_and_shrink() {
        let mut table: HashTable<u64> = HashTable::new();
        table.reserve(1000).unwrap();
        assert!(table.capacity() >= 1000);
        let epoch = table.epoch();
        for v in 0..1000u64 {
            table.entry(v, |&x| x == v).or_insert(v).unwrap();
        }
        assert_eq!(table.epoch(), epoch);

        for v in 0..990u64 {
            table.remove(v, |&x| x == v);
        }
        table.shrink_to_fit().unwrap();
        assert_eq!(table.tombstones(), 0);
        assert!(table.slot_count() <= 32);
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), (990..1000).collect::<Vec<_>>());
    }

    #[test]
    fn allocation_failure_leaves_table_intact() {
        let mut table: HashTable<u64> = HashTable::new();
        table.entry(1, |&x| x == 1).or_insert(1).unwrap();
        let err = table.reserve(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
        assert_eq!(table.len(), 1);
        assert_eq!(table.epoch(), 0);
        assert_eq!(table.find(1, |&x| x == 1), Some(&1));
    }

    #[test]
    fn failed_growth_on_insert_leaves_table_intact() {
        let mut table: HashTable<u64> = HashTable::new();
        while table.len() < table.capacity() {
            let v = table.len() as u64;
            table.entry(v, |&x| x == v).or_insert(v).unwrap();
        }
        let before: Vec<u64> = table.iter().copied().collect();
        let (slot_count, epoch) = (table.slot_count(), table.epoch());

        table.fail_alloc = true;
        let next = before.len() as u64;
        let err = match table.entry(next, |&x| x == next) {
            Entry::Vacant(entry) => entry.insert_at(0, next).unwrap_err(),
            Entry::Occupied(_) => unreachable!(),
        };
        assert!(matches!(err, Error::OutOfMemory { .. }));
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), before);
        assert_eq!(table.slot_count(), slot_count);
        assert_eq!(table.epoch(), epoch);
        assert_eq!(table.find(next, |&x| x == next), None);

        table.fail_alloc = false;
        table.entry(next, |&x| x == next).or_insert(next).unwrap();
        assert_eq!(table.len(), before.len() + 1);
        assert!(table.slot_count() > slot_count);
    }

    #[test]
    fn slot_walk_detects_reallocation() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..4u64 {
            table.entry(v, |&x| x == v).or_insert(v).unwrap();
        }
        let mut position = table.slot_position();
        let mut seen = Vec::new();
        while let Some((hash, value)) = table.next_slot(&mut position).unwrap() {
            assert_eq!(hash, *value);
            seen.push(*value);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        let mut position = table.slot_position();
        table.next_slot(&mut position).unwrap();
        *table.find_mut(2, |&x| x == 2).unwrap() = 2;
        assert!(table.next_slot(&mut position).is_ok());

        for v in 4..8u64 {
            table.entry(v, |&x| x == v).or_insert(v).unwrap();
        }
        assert!(matches!(
            table.next_slot(&mut position),
            Err(Error::ConcurrentModification { .. })
        ));
    }

    #[test]
    fn clear_resets_to_minimum() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..100u64 {
            insert(&mut table, &state, k, 0);
        }
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.slot_count(), MIN_SIZE);
        insert(&mut table, &state, 5, 5);
        assert_eq!(keys(&table), vec![5]);
    }

    #[test]
    fn test_clone() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..20u64 {
            insert(&mut table, &state, k, k as i32);
        }
        table.reverse();
        let mut cloned = table.clone();
        assert_eq!(keys(&cloned), keys(&table));

        insert(&mut cloned, &state, 100, 0);
        cloned.find_mut(hash_key(&state, 0), |v| v.key == 0).unwrap().value = -1;
        assert_eq!(table.len(), 20);
        assert_eq!(table.find(hash_key(&state, 0), |v| v.key == 0).unwrap().value, 0);
    }

    #[test]
    fn debug_stats_histogram_counts_every_entry() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..300u64 {
            insert(&mut table, &state, k, 0);
        }
        let stats = table.debug_stats();
        assert_eq!(stats.used, 300);
        assert_eq!(stats.probe_histogram.iter().sum::<usize>(), 300);
        assert!(stats.load_factor < 2.0 / 3.0);
        #[cfg(feature = "std")]
        stats.print();
    }
}
