//! Flat bucketed slot storage.
use std::ops::Range;

use crate::CuckooError;

/// A single storage position.
///
/// An occupied slot owns its entry; overwriting or clearing the slot drops the entry exactly once.
#[derive(Clone, Debug, Default)]
pub enum Slot<T> {
    /// No entry.
    #[default]
    Empty,
    /// Holds one entry.
    Occupied(T),
}

impl<T> Slot<T> {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline(always)]
    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Empty => None,
        }
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Empty => None,
        }
    }

    #[inline(always)]
    pub fn into_entry(self) -> Option<T> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Empty => None,
        }
    }

    /// Moves the entry out, leaving the slot empty.
    #[inline(always)]
    pub fn take(&mut self) -> Option<T> {
        std::mem::take(self).into_entry()
    }
}

/// `bucket_count * slots_per_bucket` slots in a single allocation.
///
/// Bucket `i` consists of the slots `i * slots_per_bucket..(i + 1) * slots_per_bucket`. Slots are
/// addressed by their index in the flat array.
#[derive(Clone, Debug)]
pub struct Slots<T> {
    slots: Vec<Slot<T>>,
    bucket_count: usize,
    slots_per_bucket: usize,
    len: usize,
}

impl<T> Slots<T> {
    /// Allocates empty storage of the given geometry.
    ///
    /// The caller is responsible for validating the geometry, this only fails on arithmetic
    /// overflow or when the allocation itself fails.
    pub fn with_geometry(bucket_count: usize, slots_per_bucket: usize) -> Result<Self, CuckooError> {
        debug_assert!(bucket_count >= 2 && bucket_count % 2 == 0 && slots_per_bucket >= 1);
        let total = bucket_count
            .checked_mul(slots_per_bucket)
            .ok_or(CuckooError::OutOfCapacity { bucket_count })?;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(total)
            .map_err(|_| CuckooError::AllocationFailed { slots: total })?;
        slots.resize_with(total, Slot::default);
        Ok(Slots {
            slots,
            bucket_count,
            slots_per_bucket,
            len: 0,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline(always)]
    pub fn half_bucket_count(&self) -> usize {
        self.bucket_count / 2
    }

    #[inline(always)]
    pub fn slots_per_bucket(&self) -> usize {
        self.slots_per_bucket
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the range of slot indices making up `bucket`.
    #[inline(always)]
    pub fn bucket_range(&self, bucket: usize) -> Range<usize> {
        debug_assert!(bucket < self.bucket_count);
        let start = bucket * self.slots_per_bucket;
        start..start + self.slots_per_bucket
    }

    /// Returns the bucket containing the slot `index`.
    #[inline(always)]
    pub fn bucket_of(&self, index: usize) -> usize {
        index / self.slots_per_bucket
    }

    #[inline(always)]
    pub fn slot(&self, index: usize) -> &Slot<T> {
        &self.slots[index]
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots[index].get()
    }

    #[inline(always)]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots[index].get_mut()
    }

    /// Returns the first occupied slot of `bucket` whose entry satisfies `eq`.
    #[inline]
    pub fn find_in_bucket(&self, bucket: usize, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        self.bucket_range(bucket)
            .find(|&index| self.slots[index].get().is_some_and(&mut eq))
    }

    /// Returns the first empty slot of `bucket`.
    #[inline]
    pub fn vacant_in_bucket(&self, bucket: usize) -> Option<usize> {
        self.bucket_range(bucket)
            .find(|&index| self.slots[index].is_empty())
    }

    /// Stores `entry` in the empty slot `index`.
    #[inline]
    pub fn occupy(&mut self, index: usize, entry: T) -> &mut T {
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_empty());
        *slot = Slot::Occupied(entry);
        self.len += 1;
        match slot {
            Slot::Occupied(entry) => entry,
            Slot::Empty => unreachable!(),
        }
    }

    /// Moves the entry out of slot `index`, if any.
    #[inline]
    pub fn vacate(&mut self, index: usize) -> Option<T> {
        let entry = self.slots[index].take();
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Moves the entry from slot `from` into the empty slot `to`.
    #[inline]
    pub fn relocate(&mut self, from: usize, to: usize) {
        debug_assert!(self.slots[to].is_empty());
        let slot = std::mem::take(&mut self.slots[from]);
        self.slots[to] = slot;
    }

    /// Removes and returns the entry of `bucket` satisfying `eq`, if there is one.
    #[inline]
    pub fn remove_from_bucket(&mut self, bucket: usize, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find_in_bucket(bucket, eq)?;
        self.vacate(index)
    }

    /// Drops all entries, keeping the storage.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.len = 0;
    }

    /// Returns an iterator over all slots in storage order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Slot<T>> {
        self.slots.iter()
    }

    /// Returns a mutable iterator over all slots in storage order.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Slot<T>> {
        self.slots.iter_mut()
    }

    /// Consumes the storage, returning all slots in storage order.
    #[inline]
    pub fn into_slots(self) -> Vec<Slot<T>> {
        self.slots
    }

    /// Takes every entry out, leaving the storage empty.
    pub fn take_all(&mut self) -> Vec<Slot<T>> {
        self.len = 0;
        let total = self.slots.len();
        let mut fresh = Vec::with_capacity(total);
        fresh.resize_with(total, Slot::default);
        std::mem::replace(&mut self.slots, fresh)
    }

    #[cfg(test)]
    pub fn check(&self) {
        assert_eq!(self.slots.len(), self.bucket_count * self.slots_per_bucket);
        assert_eq!(
            self.slots.iter().filter(|slot| !slot.is_empty()).count(),
            self.len
        );
    }
}
