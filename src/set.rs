//! Ordered set built on [`BlockMap`] with unit values.

use crate::compare::{Comparator, NaturalOrder};
use crate::error::Result;
use crate::gb::{BlockMap, IntoKeys, Keys, Range, RangeView, ViewKeys};
use std::fmt;
use std::iter::Map;
use std::ops::RangeBounds;

/// Iterator returned by [`BlockSet::range`].
pub type SetRange<'a, K, const B: usize> = Map<Range<'a, K, (), B>, fn((&'a K, &'a ())) -> &'a K>;

/// Ordered set of keys, where the block capacity (B) can be specified.
pub struct BlockSet<K, C, const B: usize> {
    map: BlockMap<K, (), C, B>,
}

impl<K, C: Default, const B: usize> Default for BlockSet<K, C, B> {
    fn default() -> Self {
        Self {
            map: BlockMap::default(),
        }
    }
}

impl<K, const B: usize> BlockSet<K, NaturalOrder, B> {
    /// Returns a new, empty set ordered by the keys' [`Ord`] implementation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, C, const B: usize> BlockSet<K, C, B> {
    /// Returns a new, empty set ordered by `cmp`.
    #[must_use]
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            map: BlockMap::with_comparator(cmp),
        }
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Lowest key.
    pub fn first(&self) -> Option<&K> {
        self.map.first_key()
    }

    /// Highest key.
    pub fn last(&self) -> Option<&K> {
        self.map.last_key()
    }

    /// Remove and return the lowest key.
    pub fn pop_first(&mut self) -> Option<K> {
        self.map.pop_first().map(|(k, _)| k)
    }

    /// Remove and return the highest key.
    pub fn pop_last(&mut self) -> Option<K> {
        self.map.pop_last().map(|(k, _)| k)
    }

    /// Keep only the keys for which f returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.map.retain(|k, _| f(k));
    }

    /// Iterate keys in ascending order.
    pub fn iter(&self) -> Keys<'_, K, (), B> {
        self.map.keys()
    }
}

impl<K, C, const B: usize> BlockSet<K, C, B>
where
    C: Comparator<K>,
{
    /// Add key to the set, returning false if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ()).is_none()
    }

    /// Remove key from the set, returning true if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    /// Is key in the set?
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Greatest key less than or equal to key.
    pub fn floor(&self, key: &K) -> Option<&K> {
        self.map.floor_key(key)
    }

    /// Least key greater than or equal to key.
    pub fn ceiling(&self, key: &K) -> Option<&K> {
        self.map.ceiling_key(key)
    }

    /// Least key strictly greater than key.
    pub fn higher(&self, key: &K) -> Option<&K> {
        self.map.higher_key(key)
    }

    /// Greatest key strictly less than key.
    pub fn lower(&self, key: &K) -> Option<&K> {
        self.map.lower_key(key)
    }

    /// Iterate keys within range, fails if the range start is greater than its end.
    pub fn range<'a, R>(&'a self, range: R) -> Result<SetRange<'a, K, B>>
    where
        R: RangeBounds<K>,
    {
        let key: fn((&'a K, &'a ())) -> &'a K = |(k, _)| k;
        Ok(self.map.range(range)?.map(key))
    }

    /// View of the keys less than (or equal to, if inclusive) `to`.
    pub fn head_set(&self, to: K, inclusive: bool) -> SetView<'_, K, C, B> {
        SetView(self.map.head_map(to, inclusive))
    }

    /// View of the keys greater than (or equal to, if inclusive) `from`.
    pub fn tail_set(&self, from: K, inclusive: bool) -> SetView<'_, K, C, B> {
        SetView(self.map.tail_map(from, inclusive))
    }

    /// View of the keys between `from` and `to`.
    pub fn sub_set(
        &self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<SetView<'_, K, C, B>> {
        Ok(SetView(self.map.sub_map(from, from_inclusive, to, to_inclusive)?))
    }

    /// View of every key, highest first.
    pub fn descending_set(&self) -> SetView<'_, K, C, B> {
        SetView(self.map.descending_map())
    }
}

/// Read-only view of a [`BlockSet`], see [`RangeView`].
pub struct SetView<'a, K, C, const B: usize>(RangeView<'a, K, (), C, B>);

impl<'a, K, C, const B: usize> SetView<'a, K, C, B>
where
    C: Comparator<K>,
{
    /// Is key in the view?
    pub fn contains(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys in the view.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the view empty?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First key in view order.
    pub fn first(&self) -> Option<&'a K> {
        self.0.first_key()
    }

    /// Last key in view order.
    pub fn last(&self) -> Option<&'a K> {
        self.0.last_key()
    }

    /// Last key in view order at or before key.
    pub fn floor(&self, key: &K) -> Option<&'a K> {
        self.0.floor_entry(key).map(|(k, _)| k)
    }

    /// First key in view order at or after key.
    pub fn ceiling(&self, key: &K) -> Option<&'a K> {
        self.0.ceiling_entry(key).map(|(k, _)| k)
    }

    /// First key in view order strictly after key.
    pub fn higher(&self, key: &K) -> Option<&'a K> {
        self.0.higher_entry(key).map(|(k, _)| k)
    }

    /// Last key in view order strictly before key.
    pub fn lower(&self, key: &K) -> Option<&'a K> {
        self.0.lower_entry(key).map(|(k, _)| k)
    }

    /// Iterate keys in view order.
    pub fn iter(&self) -> ViewKeys<'a, K, (), B> {
        self.0.keys()
    }

    /// The same keys in the opposite order.
    pub fn descending(self) -> Self {
        SetView(self.0.descending())
    }
}

impl<K, C, const B: usize> IntoIterator for BlockSet<K, C, B> {
    type Item = K;
    type IntoIter = IntoKeys<K, (), B>;
    fn into_iter(self) -> Self::IntoIter {
        self.map.into_keys()
    }
}
impl<'a, K, C, const B: usize> IntoIterator for &'a BlockSet<K, C, B> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, (), B>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
impl<K, C, const B: usize> FromIterator<K> for BlockSet<K, C, B>
where
    C: Comparator<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().map(|k| (k, ())).collect(),
        }
    }
}
impl<K, C, const B: usize> Extend<K> for BlockSet<K, C, B>
where
    C: Comparator<K>,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        self.map.extend(iter.into_iter().map(|k| (k, ())));
    }
}
impl<K: Clone, C: Clone, const B: usize> Clone for BlockSet<K, C, B> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}
impl<K: PartialEq, C, const B: usize> PartialEq for BlockSet<K, C, B> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}
impl<K: Eq, C, const B: usize> Eq for BlockSet<K, C, B> {}
impl<K: fmt::Debug, C, const B: usize> fmt::Debug for BlockSet<K, C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<K: serde::Serialize, C, const B: usize> serde::Serialize for BlockSet<K, C, B> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, C, const B: usize> serde::Deserialize<'de> for BlockSet<K, C, B>
where
    K: serde::Deserialize<'de>,
    C: Comparator<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let keys: Vec<K> = Vec::deserialize(deserializer)?;
        Ok(keys.into_iter().collect())
    }
}
