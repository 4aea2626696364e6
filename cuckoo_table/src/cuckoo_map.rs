//! [CuckooMap] is a hash map using cuckoo hashing.
use core::hash::Hash;
use std::{borrow::Borrow, hash::BuildHasher};

use hashbrown::hash_map::DefaultHashBuilder;

use crate::{
    cuckoo_table::{self, CuckooTable},
    util::impl_iterator,
    CuckooConfig, CuckooError, TableStats,
};

/// A hash map using cuckoo hashing with multi-slot buckets.
///
/// In `CuckooMap<K, V, S>`, `K: Hash + Eq` is the type of keys, `V` the type of values and
/// `S: BuildHasher` is used for hashing keys. The two candidate buckets of a key are derived from
/// the low and high 32 bits of its 64-bit hash, so `S` should produce well mixed hashes in both
/// halves.
///
/// Iteration visits entries in storage order, which is unrelated to insertion order and changes
/// whenever entries are relocated or the table grows.
#[derive(Clone)]
pub struct CuckooMap<K, V, S = DefaultHashBuilder> {
    table: CuckooTable<(K, V)>,
    build_hasher: S,
}

impl<K, V, S: Default> Default for CuckooMap<K, V, S> {
    fn default() -> Self {
        CuckooMap {
            table: CuckooTable::default(),
            build_hasher: S::default(),
        }
    }
}

impl<K, V, S: Default> CuckooMap<K, V, S> {
    /// Returns an empty map using the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns an empty map using the given configuration.
    pub fn with_config(config: CuckooConfig) -> Result<Self, CuckooError> {
        Self::with_config_and_hasher(config, S::default())
    }
}

impl<K, V, S> CuckooMap<K, V, S> {
    /// Returns an empty map using the default configuration and the provided BuildHasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        CuckooMap {
            table: CuckooTable::default(),
            build_hasher,
        }
    }
    /// Returns an empty map using the given configuration and the provided BuildHasher.
    pub fn with_config_and_hasher(config: CuckooConfig, build_hasher: S) -> Result<Self, CuckooError> {
        Ok(CuckooMap {
            table: CuckooTable::with_config(config)?,
            build_hasher,
        })
    }
    /// Returns a reference to the map's BuildHasher.
    pub fn hasher(&self) -> &S {
        &self.build_hasher
    }
    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }
    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
    /// Returns the current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }
    /// Returns statistics about the underlying table.
    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }
    /// Returns a reference to the underlying table.
    pub fn as_table(&self) -> &CuckooTable<(K, V)> {
        &self.table
    }
    /// Removes all entries from the map, but keeps the allocated memory.
    pub fn clear(&mut self) {
        self.table.clear();
    }
    /// Returns an iterator over all key-value pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }
    /// Returns an iterator over all key-value pairs, allowing mutation of values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }
    /// Returns an iterator over all keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.iter(),
        }
    }
    /// Returns an iterator over all values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.iter(),
        }
    }
    /// Returns an iterator over all values, allowing mutation.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }
    /// Removes all entries and returns them, keeping the current bucket count.
    pub fn drain(&mut self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.drain(),
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CuckooMap<K, V, S> {
    /// Inserts `value` at `key`, replacing and returning any previous value.
    ///
    /// When the key is already present, the stored key is kept and only the value is replaced.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be placed even after growing the table once, see
    /// [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(err) => panic!("cuckoo map insertion failed: {err}"),
        }
    }
    /// Inserts `value` at `key`, replacing and returning any previous value.
    ///
    /// Fails if the table had to grow but could not. In that case the map is unchanged and the key
    /// and value are dropped.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, CuckooError> {
        let hash = self.build_hasher.hash_one(&key);
        if let Some((_, present)) = self.table.find_mut(hash, |(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(present, value)));
        }
        let build_hasher = &self.build_hasher;
        self.table
            .insert_unique(hash, (key, value), |(k, _)| build_hasher.hash_one(k))?;
        Ok(None)
    }
    /// Makes room for `additional` more entries, see [`CuckooTable::reserve`].
    pub fn reserve(&mut self, additional: usize) -> Result<(), CuckooError> {
        let build_hasher = &self.build_hasher;
        self.table
            .reserve(additional, |(k, _)| build_hasher.hash_one(k))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CuckooMap<K, V, S> {
    /// Returns references to the key and value of the entry with the specified key, if it exists.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        self.table
            .find(hash, |(k, _)| k.borrow() == key)
            .map(|(k, v)| (k, v))
    }
    /// Returns a reference to the value corresponding to the specified key, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_key_value(key).map(|x| x.1)
    }
    /// Returns a reference to the value corresponding to the specified key, failing with
    /// [`CuckooError::NotFound`] if it does not exist.
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, CuckooError>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get(key).ok_or(CuckooError::NotFound)
    }
    /// Returns a mutable reference to the value corresponding to the specified key, if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }
    /// Returns `true` if the map contains an entry with the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_key_value(key).is_some()
    }
    /// Removes the entry with the specified key and returns its key and value, if it exists.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        self.table.remove(hash, |(k, _)| k.borrow() == key)
    }
    /// Removes the entry with the specified key and returns its value, if it exists.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.remove_entry(key).map(|x| x.1)
    }
    /// Removes the entry with the specified key and returns its value, failing with
    /// [`CuckooError::NotFound`] if it does not exist.
    pub fn try_remove<Q>(&mut self, key: &Q) -> Result<V, CuckooError>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.remove(key).ok_or(CuckooError::NotFound)
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug, S> std::fmt::Debug for CuckooMap<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V: PartialEq, S1: BuildHasher, S2: BuildHasher> PartialEq<CuckooMap<K, V, S2>>
    for CuckooMap<K, V, S1>
{
    fn eq(&self, other: &CuckooMap<K, V, S2>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for CuckooMap<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for CuckooMap<K, V, S> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Hash + Eq + Copy, V: Copy, S: BuildHasher> Extend<(&'a K, &'a V)>
    for CuckooMap<K, V, S>
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for CuckooMap<K, V, S> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> IntoIterator for CuckooMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a CuckooMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut CuckooMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An iterator over the entries of a [`CuckooMap`].
///
/// This struct is created by the [`iter`](`CuckooMap::iter`) method on [`CuckooMap`].
pub struct Iter<'a, K, V> {
    inner: cuckoo_table::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    impl_iterator!(|entry| (&entry.0, &entry.1));
}
impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`CuckooMap`].
///
/// This struct is created by the [`iter_mut`](`CuckooMap::iter_mut`) method on [`CuckooMap`].
pub struct IterMut<'a, K, V> {
    inner: cuckoo_table::IterMut<'a, (K, V)>,
}
impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    impl_iterator!(|entry| (&entry.0, &mut entry.1));
}
impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`CuckooMap`].
///
/// This struct is created by the [`keys`](`CuckooMap::keys`) method on [`CuckooMap`].
pub struct Keys<'a, K, V> {
    inner: cuckoo_table::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    impl_iterator!(|entry| &entry.0);
}
impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`CuckooMap`].
///
/// This struct is created by the [`values`](`CuckooMap::values`) method on [`CuckooMap`].
pub struct Values<'a, K, V> {
    inner: cuckoo_table::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    impl_iterator!(|entry| &entry.1);
}
impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a [`CuckooMap`].
///
/// This struct is created by the [`values_mut`](`CuckooMap::values_mut`) method on [`CuckooMap`].
pub struct ValuesMut<'a, K, V> {
    inner: cuckoo_table::IterMut<'a, (K, V)>,
}
impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    impl_iterator!(|entry| &mut entry.1);
}
impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of a [`CuckooMap`].
///
/// This struct is created by the [`drain`](`CuckooMap::drain`) method on [`CuckooMap`] and by
/// consuming the map with `into_iter`.
pub struct IntoIter<K, V> {
    inner: cuckoo_table::IntoIter<(K, V)>,
}
impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    impl_iterator!();
}
impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K: Hash, V, S: BuildHasher> CuckooMap<K, V, S> {
    #[cfg(test)]
    pub(crate) fn check(&self) {
        self.table.check(|(k, _)| self.build_hasher.hash_one(k));
    }
}
