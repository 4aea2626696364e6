//! [CuckooTable] is a low-level cuckoo hash table with explicit hashing.
use std::fmt;

use crate::{
    addressing::candidate_buckets,
    config::{TARGET_LOAD_DEN, TARGET_LOAD_NUM},
    displacement::{self, Chain},
    slots::{Slot, Slots},
    util::impl_slot_iterator,
    BucketPair, CuckooConfig, CuckooError,
};

/// A cuckoo hash table with explicit hashing.
///
/// The table never computes hashes itself. Every operation takes the hash of the entry it
/// concerns and an equality predicate, and operations that may move entries around also take a
/// `hasher` that recomputes the hash of any stored entry. The hasher must agree with the hashes
/// that were passed when the entries were inserted.
///
/// The API is loosely modeled after hashbrown's `HashTable`.
#[derive(Clone)]
pub struct CuckooTable<T> {
    slots: Slots<T>,
    max_displacements: usize,
    grows: usize,
    exhausted_searches: usize,
    displaced_inserts: usize,
    longest_chain: usize,
}

impl<T: fmt::Debug> fmt::Debug for CuckooTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> Default for CuckooTable<T> {
    /// Returns an empty table using the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the storage for the default geometry cannot be allocated.
    fn default() -> Self {
        match Self::with_config(CuckooConfig::default()) {
            Ok(table) => table,
            Err(err) => panic!("cuckoo table construction failed: {err}"),
        }
    }
}

/// Counters describing the state and history of a [`CuckooTable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Number of stored entries.
    pub len: usize,
    /// Current number of buckets.
    pub bucket_count: usize,
    /// Number of slots in each bucket.
    pub slots_per_bucket: usize,
    /// Number of times the bucket count was doubled, including explicit reservations.
    pub grows: usize,
    /// Number of insertions whose displacement search ran out of budget, each of which grew the
    /// table once or failed.
    pub exhausted_searches: usize,
    /// Number of insertions that had to relocate existing entries.
    pub displaced_inserts: usize,
    /// Largest number of entries moved by a single insertion.
    pub longest_chain: usize,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capacity = self.bucket_count * self.slots_per_bucket;
        write!(
            f,
            "{} entries in {}x{} slots ({:.1}% full), {} grows, {} exhausted searches, \
             {} displaced inserts, longest chain {}",
            self.len,
            self.bucket_count,
            self.slots_per_bucket,
            if capacity == 0 {
                0.0
            } else {
                self.len as f64 * 100.0 / capacity as f64
            },
            self.grows,
            self.exhausted_searches,
            self.displaced_inserts,
            self.longest_chain,
        )
    }
}

/// Stores `value` in the first empty slot of its candidate buckets or, failing that, at the start
/// of a relocation chain. Returns the slot index and the chain used, if any.
///
/// Returns the value together with the number of expansions performed when no chain was found
/// within `budget` expansions.
fn place<T>(
    slots: &mut Slots<T>,
    hash: u64,
    value: T,
    budget: usize,
    hasher: impl Fn(&T) -> u64,
) -> Result<(usize, Option<Chain>), (T, usize)> {
    let pair = candidate_buckets(hash, slots.half_bucket_count());
    for bucket in pair.as_array() {
        if let Some(index) = slots.vacant_in_bucket(bucket) {
            slots.occupy(index, value);
            return Ok((index, None));
        }
    }
    match displacement::find_chain(slots, pair, budget, hasher) {
        Ok(chain) => {
            let index = chain.migrate(slots, value);
            Ok((index, Some(chain)))
        }
        Err(expansions) => Err((value, expansions)),
    }
}

/// Places entry `i` with hash `hashes[i]` for every `i`, in order, into fresh index-only storage of
/// the given geometry, without touching any actual entries. Returns `None` when some entry could
/// not be placed.
fn plan_placement(
    hashes: &[u64],
    bucket_count: usize,
    slots_per_bucket: usize,
    budget: usize,
) -> Result<Option<Slots<usize>>, CuckooError> {
    let mut plan = Slots::with_geometry(bucket_count, slots_per_bucket)?;
    for (entry, &hash) in hashes.iter().enumerate() {
        if place(&mut plan, hash, entry, budget, |&other| hashes[other]).is_err() {
            return Ok(None);
        }
    }
    Ok(Some(plan))
}

impl<T> CuckooTable<T> {
    /// Returns an empty table using the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an empty table using the given configuration.
    pub fn with_config(config: CuckooConfig) -> Result<Self, CuckooError> {
        config.validate()?;
        Ok(CuckooTable {
            slots: Slots::with_geometry(config.bucket_count, config.slots_per_bucket)?,
            max_displacements: config.max_displacements,
            grows: 0,
            exhausted_searches: 0,
            displaced_inserts: 0,
            longest_chain: 0,
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    /// Returns the current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.slots.bucket_count()
    }

    /// Returns the number of slots in each bucket.
    pub fn slots_per_bucket(&self) -> usize {
        self.slots.slots_per_bucket()
    }

    /// Returns the total number of slots, i.e. the number of entries the table could hold if every
    /// slot were occupied.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the fraction of occupied slots.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Returns the configuration describing the current geometry of the table.
    pub fn config(&self) -> CuckooConfig {
        CuckooConfig {
            bucket_count: self.bucket_count(),
            slots_per_bucket: self.slots_per_bucket(),
            max_displacements: self.max_displacements,
        }
    }

    /// Returns statistics about the table.
    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.len(),
            bucket_count: self.bucket_count(),
            slots_per_bucket: self.slots_per_bucket(),
            grows: self.grows,
            exhausted_searches: self.exhausted_searches,
            displaced_inserts: self.displaced_inserts,
            longest_chain: self.longest_chain,
        }
    }

    /// Returns the candidate buckets for an entry with the given hash under the current geometry.
    pub fn buckets(&self, hash: u64) -> BucketPair {
        candidate_buckets(hash, self.slots.half_bucket_count())
    }

    fn find_index(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let pair = self.buckets(hash);
        if let Some(index) = self.slots.find_in_bucket(pair.first, &mut eq) {
            return Some(index);
        }
        self.slots.find_in_bucket(pair.second, eq)
    }

    /// Returns a reference to the entry with the given hash for which `eq` returns `true`.
    pub fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        let index = self.find_index(hash, eq)?;
        self.slots.get(index)
    }

    /// Returns a mutable reference to the entry with the given hash for which `eq` returns
    /// `true`.
    ///
    /// The entry must not be modified in a way that changes its hash.
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let index = self.find_index(hash, eq)?;
        self.slots.get_mut(index)
    }

    /// Inserts `value`, replacing and returning an existing entry for which `eq` returns `true`.
    ///
    /// See [`insert_unique`](Self::insert_unique) for the error cases.
    pub fn insert(
        &mut self,
        hash: u64,
        value: T,
        mut eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<Option<T>, CuckooError> {
        if let Some(existing) = self.find_mut(hash, &mut eq) {
            return Ok(Some(std::mem::replace(existing, value)));
        }
        self.insert_unique(hash, value, hasher)?;
        Ok(None)
    }

    /// Inserts `value` without checking whether an equal entry is already present.
    ///
    /// Inserting an entry equal to a present entry leaves the table with duplicates, which lookups
    /// and removals will encounter in an unspecified order.
    ///
    /// When both candidate buckets are full, existing entries are relocated. When no relocation is
    /// found within the displacement budget, the bucket count is doubled once and the insertion is
    /// retried once in the grown table.
    ///
    /// Fails with [`CuckooError::OutOfCapacity`] when the bucket count cannot be doubled or when
    /// the retry fails as well, e.g. because more than `2 * slots_per_bucket` entries share a hash.
    /// Fails with [`CuckooError::AllocationFailed`] when the grown storage cannot be allocated. On
    /// failure the table keeps its previous bucket count and contents and `value` is dropped.
    pub fn insert_unique(
        &mut self,
        hash: u64,
        value: T,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<&mut T, CuckooError> {
        let value = match self.place(hash, value, &hasher) {
            Ok(index) => return Ok(self.occupied_mut(index)),
            Err((value, expansions)) => {
                log::debug!("displacement search exhausted after {expansions} expansions, growing");
                self.exhausted_searches += 1;
                value
            }
        };
        let index = self.grow(Some((hash, value)), &hasher)?;
        match index {
            Some(index) => Ok(self.occupied_mut(index)),
            None => unreachable!("pending entry was not placed"),
        }
    }

    fn place(
        &mut self,
        hash: u64,
        value: T,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<usize, (T, usize)> {
        let (index, chain) = place(&mut self.slots, hash, value, self.max_displacements, hasher)?;
        if let Some(chain) = chain {
            log::trace!(
                "relocated {} entries after {} expansions",
                chain.moved_entries(),
                chain.expansions()
            );
            self.displaced_inserts += 1;
            self.longest_chain = self.longest_chain.max(chain.moved_entries());
        }
        Ok(index)
    }

    fn occupied_mut(&mut self, index: usize) -> &mut T {
        match self.slots.get_mut(index) {
            Some(entry) => entry,
            None => unreachable!("slot {index} was just occupied"),
        }
    }

    /// Removes and returns the entry with the given hash for which `eq` returns `true`.
    pub fn remove(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        let pair = self.buckets(hash);
        if let Some(entry) = self.slots.remove_from_bucket(pair.first, &mut eq) {
            return Some(entry);
        }
        self.slots.remove_from_bucket(pair.second, eq)
    }

    /// Removes and returns the entry with the given hash for which `eq` returns `true`, failing
    /// with [`CuckooError::NotFound`] if there is none.
    pub fn try_remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Result<T, CuckooError> {
        self.remove(hash, eq).ok_or(CuckooError::NotFound)
    }

    /// Removes all entries, but keeps the allocated storage and the current bucket count.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Makes room for `additional` more entries by doubling the bucket count until they fit at no
    /// more than 85% occupancy.
    ///
    /// The table never shrinks and never grows on its own based on occupancy, so this is only
    /// useful to avoid repeated growth during a known number of insertions. Fails with
    /// [`CuckooError::OutOfCapacity`] if the bucket count would overflow or the present entries
    /// cannot be placed into the new geometry, leaving the table unchanged.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&T) -> u64) -> Result<(), CuckooError> {
        let current = self.bucket_count();
        let wanted = self
            .len()
            .checked_add(additional)
            .ok_or(CuckooError::OutOfCapacity {
                bucket_count: current,
            })?
            .saturating_mul(TARGET_LOAD_DEN);
        let mut bucket_count = current;
        while (bucket_count.saturating_mul(self.slots_per_bucket())).saturating_mul(TARGET_LOAD_NUM)
            < wanted
        {
            bucket_count = bucket_count
                .checked_mul(2)
                .ok_or(CuckooError::OutOfCapacity { bucket_count })?;
        }
        if bucket_count != current {
            self.rehash(bucket_count, None, hasher)?;
        }
        Ok(())
    }

    /// Doubles the bucket count, placing `pending` after all present entries. Returns the slot
    /// of `pending`.
    #[cold]
    #[inline(never)]
    fn grow(
        &mut self,
        pending: Option<(u64, T)>,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<Option<usize>, CuckooError> {
        let bucket_count = self.bucket_count();
        let target = bucket_count
            .checked_mul(2)
            .ok_or(CuckooError::OutOfCapacity { bucket_count })?;
        self.rehash(target, pending, hasher)
    }

    /// Moves all entries, followed by `pending`, into new storage with `bucket_count` buckets.
    /// Returns the slot of `pending`.
    ///
    /// Placement is planned on entry indices first and entries are only moved once the plan is
    /// complete, so any failure leaves the table unchanged. If the plan cannot place every entry
    /// this fails with [`CuckooError::OutOfCapacity`] without trying a larger geometry.
    fn rehash(
        &mut self,
        bucket_count: usize,
        pending: Option<(u64, T)>,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<Option<usize>, CuckooError> {
        let old_bucket_count = self.bucket_count();
        let slots_per_bucket = self.slots_per_bucket();

        let mut sources = Vec::with_capacity(self.len());
        let mut hashes = Vec::with_capacity(self.len() + 1);
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot.get() {
                sources.push(index);
                hashes.push(hasher(entry));
            }
        }
        let mut pending = pending.map(|(hash, value)| {
            hashes.push(hash);
            value
        });

        let Some(plan) = plan_placement(
            &hashes,
            bucket_count,
            slots_per_bucket,
            self.max_displacements,
        )?
        else {
            log::debug!(
                "could not place {} entries into {bucket_count} buckets",
                hashes.len()
            );
            return Err(CuckooError::OutOfCapacity {
                bucket_count: old_bucket_count,
            });
        };

        let mut fresh = Slots::with_geometry(bucket_count, slots_per_bucket)?;
        let mut pending_index = None;
        for (target, slot) in plan.iter().enumerate() {
            let Some(&entry) = slot.get() else {
                continue;
            };
            let value = match sources.get(entry) {
                Some(&source) => self.slots.vacate(source),
                None => {
                    pending_index = Some(target);
                    pending.take()
                }
            };
            if let Some(value) = value {
                fresh.occupy(target, value);
            }
        }
        debug_assert_eq!(self.slots.len(), 0);
        debug_assert_eq!(fresh.len(), hashes.len());
        self.slots = fresh;
        self.grows += (bucket_count / old_bucket_count).trailing_zeros() as usize;

        log::debug!(
            "grew from {old_bucket_count} to {bucket_count} buckets: {}",
            self.stats()
        );
        Ok(pending_index)
    }

    /// Returns an iterator over all entries in storage order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.slots.iter().filter_map(Slot::get as SlotGetter<'_, T>),
            remaining: self.len(),
        }
    }

    /// Returns an iterator over all entries in storage order, allowing mutation.
    ///
    /// Entries must not be modified in a way that changes their hash.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let remaining = self.len();
        IterMut {
            inner: self
                .slots
                .iter_mut()
                .filter_map(Slot::get_mut as SlotGetterMut<'_, T>),
            remaining,
        }
    }

    /// Removes all entries and returns them in storage order, keeping the current bucket count.
    pub fn drain(&mut self) -> IntoIter<T> {
        let remaining = self.len();
        IntoIter {
            inner: self
                .slots
                .take_all()
                .into_iter()
                .filter_map(Slot::into_entry as SlotTaker<T>),
            remaining,
        }
    }

    #[cfg(test)]
    pub(crate) fn check(&self, hasher: impl Fn(&T) -> u64) {
        self.slots.check();
        assert!(self.bucket_count() % 2 == 0);
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot.get() {
                let bucket = self.slots.bucket_of(index);
                let pair = self.buckets(hasher(entry));
                assert!(
                    bucket == pair.first || bucket == pair.second,
                    "entry in slot {index} is outside of its candidate buckets {pair:?}"
                );
            }
        }
    }
}

type SlotGetter<'a, T> = fn(&'a Slot<T>) -> Option<&'a T>;
type SlotGetterMut<'a, T> = fn(&'a mut Slot<T>) -> Option<&'a mut T>;
type SlotTaker<T> = fn(Slot<T>) -> Option<T>;

/// An iterator over the entries of a [`CuckooTable`].
///
/// This struct is created by the [`iter`](`CuckooTable::iter`) method on [`CuckooTable`].
pub struct Iter<'a, T> {
    inner: std::iter::FilterMap<std::slice::Iter<'a, Slot<T>>, SlotGetter<'a, T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    impl_slot_iterator!();
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

/// A mutable iterator over the entries of a [`CuckooTable`].
///
/// This struct is created by the [`iter_mut`](`CuckooTable::iter_mut`) method on
/// [`CuckooTable`].
pub struct IterMut<'a, T> {
    inner: std::iter::FilterMap<std::slice::IterMut<'a, Slot<T>>, SlotGetterMut<'a, T>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;
    impl_slot_iterator!();
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// An owning iterator over the entries of a [`CuckooTable`].
///
/// This struct is created by the [`drain`](`CuckooTable::drain`) method on [`CuckooTable`] and by
/// consuming the table with `into_iter`.
pub struct IntoIter<T> {
    inner: std::iter::FilterMap<std::vec::IntoIter<Slot<T>>, SlotTaker<T>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    impl_slot_iterator!();
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for CuckooTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        IntoIter {
            inner: self
                .slots
                .into_slots()
                .into_iter()
                .filter_map(Slot::into_entry as SlotTaker<T>),
            remaining,
        }
    }
}

impl<'a, T> IntoIterator for &'a CuckooTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut CuckooTable<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
