/// `BlockMap` is an ordered map where the block capacity (B) can be specified.
/// B must be at least 4, a good value may be 64.
///
/// General guide to implementation:
///
/// Entries are held in blocks of up to B sorted entries. The blocks are nodes of a red-black
/// tree and are also threaded by a doubly linked chain in key order, so iteration never
/// walks the tree. Blocks live in a slab and link to each other by index.
///
/// Inserting into a full block first tries to spill one entry into the less full neighbouring
/// block, only when both neighbours are full is a new block made (and the tree rebalanced).
/// A block that drops to B/4 entries or fewer is merged into a neighbour that has room for it.
///
/// Every mutation, including handing out a mutable reference to a value, increments a
/// modification counter. Detached [`Cursor`]s check it, and also check the map's identity,
/// so use after an unrelated modification or with another map is reported as an error.
pub struct BlockMap<K, V, C, const B: usize> {
    pub(crate) len: usize,
    pub(crate) mod_count: u64,
    pub(crate) id: u64,
    pub(crate) tree: Tree<K, V, B>,
    pub(crate) cmp: C,
}

/// Identity of a newly made map, distinct from every other map (clones included).
fn next_map_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(0);
    NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

impl<K, V, C: Default, const B: usize> Default for BlockMap<K, V, C, B> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, const B: usize> BlockMap<K, V, NaturalOrder, B> {
    /// Returns a new, empty map ordered by the keys' [`Ord`] implementation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C, const B: usize> BlockMap<K, V, C, B> {
    /// This should produce a compile-time error if B is too small.
    const CHECK_B: usize = {
        assert!(B >= 4);
        0
    };

    /// Returns a new, empty map ordered by `cmp`.
    #[must_use]
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            len: Self::CHECK_B,
            mod_count: 0,
            id: next_map_id(),
            tree: Tree::default(),
            cmp,
        }
    }

    /// Get the comparator that orders the map.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Clear the map.
    pub fn clear(&mut self) {
        self.len = 0;
        self.mod_count += 1;
        self.tree.clear();
    }

    /// Get number of key-value pairs in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the map empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get references to first key and value.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let kv = self.tree.kv(self.tree.first_pos()?);
        Some((&kv.0, &kv.1))
    }

    /// Gets references to last key and value.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let kv = self.tree.kv(self.tree.last_pos()?);
        Some((&kv.0, &kv.1))
    }

    /// Get reference to the lowest key.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.first_key_value().map(|(k, _)| k)
    }

    /// Get reference to the highest key.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.last_key_value().map(|(k, _)| k)
    }

    /// Remove first key-value pair from map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let pos = self.tree.first_pos()?;
        Some(self.remove_at(pos))
    }

    /// Remove last key-value pair from map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let pos = self.tree.last_pos()?;
        Some(self.remove_at(pos))
    }

    /// Does the map contain the value? This visits every entry.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Remove all key-value pairs, visited in ascending order, for which f returns false.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        if self.len == 0 {
            return;
        }
        let removed = self.tree.retain(&mut f);
        self.len -= removed;
        // f may have changed values.
        self.mod_count += 1;
    }

    /// Get first Entry.
    pub fn first_entry(&mut self) -> Option<OccupiedEntry<'_, K, V, C, B>> {
        let pos = self.tree.first_pos()?;
        Some(OccupiedEntry { pos, map: self })
    }

    /// Get last Entry.
    pub fn last_entry(&mut self) -> Option<OccupiedEntry<'_, K, V, C, B>> {
        let pos = self.tree.last_pos()?;
        Some(OccupiedEntry { pos, map: self })
    }

    /// Get iterator of references to key-value pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, B> {
        Iter::new(self.len, Range::new(&self.tree, self.tree.first_pos(), self.tree.last_pos()))
    }

    /// Get iterator of mutable references to key-value pairs.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, B> {
        self.mod_count += 1;
        let (front, back) = (self.tree.first_pos(), self.tree.last_pos());
        IterMut::new(self.len, RangeMut::new(&mut self.tree, front, back))
    }

    /// Get iterator of references to keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, B> {
        Keys(self.iter())
    }

    /// Get iterator of references to values.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, B> {
        Values(self.iter())
    }

    /// Get iterator of mutable references to values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, B> {
        ValuesMut(self.iter_mut())
    }

    /// Get consuming iterator that returns all the keys, in sorted order.
    #[must_use]
    pub fn into_keys(self) -> IntoKeys<K, V, B> {
        IntoKeys(self.into_iter())
    }

    /// Get consuming iterator that returns all the values, in sorted order.
    #[must_use]
    pub fn into_values(self) -> IntoValues<K, V, B> {
        IntoValues(self.into_iter())
    }

    /// Insert a key known to be absent at the position locate reported, None for an empty map.
    fn insert_new(&mut self, at: Option<(BlockId, usize)>, key: K, value: V) -> Pos {
        let pos = match at {
            None => self.tree.new_root((key, value)),
            Some((b, ix)) => self.tree.insert_at(b, ix, (key, value)),
        };
        self.len += 1;
        self.mod_count += 1;
        pos
    }

    pub(crate) fn remove_at(&mut self, pos: Pos) -> (K, V) {
        self.len -= 1;
        self.mod_count += 1;
        self.tree.remove_at(pos)
    }

    #[cfg(test)]
    pub(crate) fn check(&self)
    where
        C: Comparator<K>,
    {
        assert_eq!(self.tree.check(&self.cmp), self.len, "len mismatch");
    }
}

impl<K, V, C, const B: usize> BlockMap<K, V, C, B>
where
    C: Comparator<K>,
{
    /// Get Entry for map key.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, B> {
        match self.tree.locate(&key, &self.cmp) {
            Some(Probe::Hit(b, i)) => Entry::Occupied(OccupiedEntry {
                pos: (b, i),
                map: self,
            }),
            Some(Probe::Miss(b, i)) => Entry::Vacant(VacantEntry {
                key,
                at: Some((b, i)),
                map: self,
            }),
            None => Entry::Vacant(VacantEntry {
                key,
                at: None,
                map: self,
            }),
        }
    }

    /// Insert key-value pair into map, or if key is already in map, replaces value and returns old value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.locate(&key, &self.cmp) {
            Some(Probe::Hit(b, i)) => {
                self.mod_count += 1;
                Some(std::mem::replace(&mut self.tree.kvm((b, i)).1, value))
            }
            Some(Probe::Miss(b, i)) => {
                self.insert_new(Some((b, i)), key, value);
                None
            }
            None => {
                self.insert_new(None, key, value);
                None
            }
        }
    }

    /// Insert, taking the append fast path when key is above every existing key.
    pub(crate) fn insert_sorted(&mut self, key: K, value: V) -> Option<V> {
        let above = match self.tree.last_pos() {
            None => true,
            Some(pos) => self.cmp.compare(self.tree.key(pos), &key) == Ordering::Less,
        };
        if above {
            self.tree.push_last((key, value));
            self.len += 1;
            self.mod_count += 1;
            None
        } else {
            self.insert(key, value)
        }
    }

    /// Does the map have an entry for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        matches!(self.tree.locate(key, &self.cmp), Some(Probe::Hit(..)))
    }

    /// Get reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_k, v)| v)
    }

    /// Get a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.tree.locate(key, &self.cmp)? {
            Probe::Hit(b, i) => {
                self.mod_count += 1;
                Some(&mut self.tree.kvm((b, i)).1)
            }
            Probe::Miss(..) => None,
        }
    }

    /// Get references to the corresponding key and value.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        match self.tree.locate(key, &self.cmp)? {
            Probe::Hit(b, i) => {
                let kv = self.tree.kv((b, i));
                Some((&kv.0, &kv.1))
            }
            Probe::Miss(..) => None,
        }
    }

    /// Remove key-value pair from map, returning just the value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_k, v)| v)
    }

    /// Remove key-value pair from map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        match self.tree.locate(key, &self.cmp)? {
            Probe::Hit(b, i) => Some(self.remove_at((b, i))),
            Probe::Miss(..) => None,
        }
    }

    fn entry_at(&self, pos: Option<Pos>) -> Option<(&K, &V)> {
        let kv = self.tree.kv(pos?);
        Some((&kv.0, &kv.1))
    }

    /// Greatest key-value pair with key less than or equal to key.
    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_at(self.tree.floor(key, &self.cmp, true))
    }

    /// Least key-value pair with key greater than or equal to key.
    pub fn ceiling_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_at(self.tree.ceiling(key, &self.cmp, true))
    }

    /// Least key-value pair with key strictly greater than key.
    pub fn higher_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_at(self.tree.ceiling(key, &self.cmp, false))
    }

    /// Greatest key-value pair with key strictly less than key.
    pub fn lower_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_at(self.tree.floor(key, &self.cmp, false))
    }

    /// Greatest key less than or equal to key.
    pub fn floor_key(&self, key: &K) -> Option<&K> {
        self.floor_entry(key).map(|(k, _)| k)
    }

    /// Least key greater than or equal to key.
    pub fn ceiling_key(&self, key: &K) -> Option<&K> {
        self.ceiling_entry(key).map(|(k, _)| k)
    }

    /// Least key strictly greater than key.
    pub fn higher_key(&self, key: &K) -> Option<&K> {
        self.higher_entry(key).map(|(k, _)| k)
    }

    /// Greatest key strictly less than key.
    pub fn lower_key(&self, key: &K) -> Option<&K> {
        self.lower_entry(key).map(|(k, _)| k)
    }

    /// Moves all elements from `other` into `self`, leaving `other` empty.
    ///
    /// If a key from `other` is already present in `self`, the respective
    /// value from `self` will be overwritten with the respective value from `other`.
    pub fn append(&mut self, other: &mut Self) {
        let tree = std::mem::take(&mut other.tree);
        let len = std::mem::replace(&mut other.len, 0);
        other.mod_count += 1;
        for (k, v) in IntoIter::new(tree, len) {
            self.insert_sorted(k, v);
        }
    }
}

use std::hash::{Hash, Hasher};
impl<K: Hash, V: Hash, C, const B: usize> Hash for BlockMap<K, V, C, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for elt in self {
            elt.hash(state);
        }
    }
}
impl<K: PartialEq, V: PartialEq, C, const B: usize> PartialEq for BlockMap<K, V, C, B> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
impl<K: Eq, V: Eq, C, const B: usize> Eq for BlockMap<K, V, C, B> {}

impl<K: PartialOrd, V: PartialOrd, C, const B: usize> PartialOrd for BlockMap<K, V, C, B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}
impl<K: Ord, V: Ord, C, const B: usize> Ord for BlockMap<K, V, C, B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}
impl<K, V, C, const B: usize> IntoIterator for BlockMap<K, V, C, B> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, B>;

    /// Convert `BlockMap` to [`IntoIter`].
    fn into_iter(self) -> IntoIter<K, V, B> {
        IntoIter::new(self.tree, self.len)
    }
}
impl<'a, K, V, C, const B: usize> IntoIterator for &'a BlockMap<K, V, C, B> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, B>;
    fn into_iter(self) -> Iter<'a, K, V, B> {
        self.iter()
    }
}
impl<'a, K, V, C, const B: usize> IntoIterator for &'a mut BlockMap<K, V, C, B> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, B>;
    fn into_iter(self) -> IterMut<'a, K, V, B> {
        self.iter_mut()
    }
}
impl<K, V, C, const B: usize> Clone for BlockMap<K, V, C, B>
where
    K: Clone,
    V: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        let mut map = Self::with_comparator(self.cmp.clone());
        for (k, v) in self {
            map.tree.push_last((k.clone(), v.clone()));
        }
        map.len = self.len;
        map
    }
}
impl<K, V, C, const B: usize> FromIterator<(K, V)> for BlockMap<K, V, C, B>
where
    C: Comparator<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        for (k, v) in iter {
            map.insert_sorted(k, v);
        }
        map
    }
}
impl<K, V, const B: usize, const N: usize> From<[(K, V); N]> for BlockMap<K, V, NaturalOrder, B>
where
    K: Ord,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}
impl<K, V, C, const B: usize> Extend<(K, V)> for BlockMap<K, V, C, B>
where
    C: Comparator<K>,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert_sorted(k, v);
        }
    }
}
impl<'a, K, V, C, const B: usize> Extend<(&'a K, &'a V)> for BlockMap<K, V, C, B>
where
    K: Copy,
    V: Copy,
    C: Comparator<K>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        for (&k, &v) in iter {
            self.insert_sorted(k, v);
        }
    }
}
impl<K, V, C, const B: usize> std::ops::Index<&K> for BlockMap<K, V, C, B>
where
    C: Comparator<K>,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// Panics if the key is not present in the `BlockMap`.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}
impl<K: Debug, V: Debug, C, const B: usize> Debug for BlockMap<K, V, C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize,
};

#[cfg(feature = "serde")]
impl<K, V, C, const B: usize> Serialize for BlockMap<K, V, C, B>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct BlockMapVisitor<K, V, C, const B: usize> {
    marker: PhantomData<fn() -> BlockMap<K, V, C, B>>,
}

#[cfg(feature = "serde")]
impl<K, V, C, const B: usize> BlockMapVisitor<K, V, C, B> {
    fn new() -> Self {
        BlockMapVisitor {
            marker: PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C, const B: usize> Visitor<'de> for BlockMapVisitor<K, V, C, B>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Comparator<K> + Default,
{
    type Value = BlockMap<K, V, C, B>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("BlockMap")
    }

    fn visit_map<M>(self, mut access: M) -> std::result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        // Serialized maps are already sorted, so this normally only appends to the last block.
        let mut map = BlockMap::default();
        while let Some((k, v)) = access.next_entry()? {
            map.insert_sorted(k, v);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C, const B: usize> Deserialize<'de> for BlockMap<K, V, C, B>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Comparator<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BlockMapVisitor::new())
    }
}

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::{cmp::Ordering, fmt, fmt::Debug};

#[cfg(feature = "serde")]
use std::marker::PhantomData;

use crate::compare::{Comparator, NaturalOrder};
use crate::tree::{BlockId, Pos, Probe, Tree};

pub use crate::iter::{
    Cursor, IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Range, RangeMut, Values,
    ValuesMut,
};
pub use crate::view::{
    Bounds, RangeView, RangeViewMut, ViewIter, ViewIterMut, ViewKeys, ViewValues,
};

/// Entry in `BlockMap`, returned by [`BlockMap::entry`].
pub enum Entry<'a, K, V, C, const B: usize> {
    /// Vacant entry - map doesn't yet contain key.
    Vacant(VacantEntry<'a, K, V, C, B>),
    /// Occupied entry - map already contains key.
    Occupied(OccupiedEntry<'a, K, V, C, B>),
}
impl<'a, K, V, C, const B: usize> Entry<'a, K, V, C, B> {
    /// Get reference to entry key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(e) => &e.key,
            Entry::Occupied(e) => e.key(),
        }
    }

    /// Insert default value, returning mutable reference to inserted value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        match self {
            Entry::Vacant(e) => e.insert(Default::default()),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Insert value, returning mutable reference to inserted value.
    pub fn or_insert(self, value: V) -> &'a mut V {
        match self {
            Entry::Vacant(e) => e.insert(value),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Insert default value obtained from function, returning mutable reference to inserted value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Vacant(e) => e.insert(default()),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Insert default value obtained from function called with key, returning mutable reference to inserted value.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Vacant(e) => {
                let value = default(e.key());
                e.insert(value)
            }
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Modify existing value ( if entry is occupied ).
    pub fn and_modify<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        if let Entry::Occupied(e) = &mut self {
            f(e.get_mut());
        }
        self
    }
}

/// Vacant [Entry].
pub struct VacantEntry<'a, K, V, C, const B: usize> {
    key: K,
    at: Option<(BlockId, usize)>,
    map: &'a mut BlockMap<K, V, C, B>,
}

impl<'a, K, V, C, const B: usize> VacantEntry<'a, K, V, C, B> {
    /// Get reference to entry key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Get entry key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Insert value into map returning reference to inserted value.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { key, at, map } = self;
        let pos = map.insert_new(at, key, value);
        &mut map.tree.kvm(pos).1
    }
}

/// Occupied [Entry].
pub struct OccupiedEntry<'a, K, V, C, const B: usize> {
    pos: Pos,
    map: &'a mut BlockMap<K, V, C, B>,
}

impl<'a, K, V, C, const B: usize> OccupiedEntry<'a, K, V, C, B> {
    /// Get reference to entry key.
    #[must_use]
    pub fn key(&self) -> &K {
        self.map.tree.key(self.pos)
    }

    /// Remove (key,value) from map, returning key and value.
    #[must_use]
    pub fn remove_entry(self) -> (K, V) {
        self.map.remove_at(self.pos)
    }

    /// Remove (key,value) from map, returning the value.
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Get reference to the value.
    #[must_use]
    pub fn get(&self) -> &V {
        &self.map.tree.kv(self.pos).1
    }

    /// Get mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        self.map.mod_count += 1;
        &mut self.map.tree.kvm(self.pos).1
    }

    /// Get mutable reference to the value, consuming the entry.
    #[must_use]
    pub fn into_mut(self) -> &'a mut V {
        self.map.mod_count += 1;
        &mut self.map.tree.kvm(self.pos).1
    }

    /// Update the value returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        std::mem::replace(self.get_mut(), value)
    }
}
