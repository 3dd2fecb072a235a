//! Bounded, optionally reversed, live views of a [`BlockMap`].
//!
//! A view owns only its [`Bounds`] and a reference to the map. Positions are found again
//! on every call, so a view never observes a stale block.

use crate::compare::Comparator;
use crate::error::{Error, Result};
use crate::gb::BlockMap;
use crate::iter::{Cursor, Range, RangeMut};
use crate::tree::{Pos, Tree};
use std::cmp::Ordering;
use std::iter::{FusedIterator, Map};
use std::ops::{Bound, RangeBounds};

/// Check that a range's low bound is not above its high bound.
/// Equal bound keys are fine, whether included or not, the range is then just empty.
fn check_range<K, C: Comparator<K>>(lo: Bound<&K>, hi: Bound<&K>, cmp: &C) -> Result<()> {
    match (lo, hi) {
        (Bound::Included(l) | Bound::Excluded(l), Bound::Included(h) | Bound::Excluded(h))
            if cmp.compare(l, h) == Ordering::Greater =>
        {
            Err(Error::InvalidOrdering)
        }
        _ => Ok(()),
    }
}

fn bound_cloned<K: Clone>(b: &Bound<K>) -> Bound<K> {
    match b {
        Bound::Included(k) => Bound::Included(k.clone()),
        Bound::Excluded(k) => Bound::Excluded(k.clone()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Low and high bounds of a view.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bounds<K> {
    lo: Bound<K>,
    hi: Bound<K>,
}

impl<K> Default for Bounds<K> {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Copy)]
enum Nav {
    Floor,
    Ceiling,
    Higher,
    Lower,
}

impl Nav {
    fn reversed(self) -> Self {
        match self {
            Nav::Floor => Nav::Ceiling,
            Nav::Ceiling => Nav::Floor,
            Nav::Higher => Nav::Lower,
            Nav::Lower => Nav::Higher,
        }
    }
}

impl<K> Bounds<K> {
    /// Bounds that admit every key.
    pub fn all() -> Self {
        Self {
            lo: Bound::Unbounded,
            hi: Bound::Unbounded,
        }
    }

    /// Make bounds, failing with [`Error::InvalidOrdering`] if lo is above hi.
    pub fn new<C: Comparator<K>>(lo: Bound<K>, hi: Bound<K>, cmp: &C) -> Result<Self> {
        check_range(lo.as_ref(), hi.as_ref(), cmp)?;
        Ok(Self { lo, hi })
    }

    /// Low bound.
    pub fn lo(&self) -> Bound<&K> {
        self.lo.as_ref()
    }

    /// High bound.
    pub fn hi(&self) -> Bound<&K> {
        self.hi.as_ref()
    }

    pub(crate) fn too_low<C: Comparator<K>>(&self, key: &K, cmp: &C) -> bool {
        match &self.lo {
            Bound::Unbounded => false,
            Bound::Included(l) => cmp.compare(key, l) == Ordering::Less,
            Bound::Excluded(l) => cmp.compare(key, l) != Ordering::Greater,
        }
    }

    pub(crate) fn too_high<C: Comparator<K>>(&self, key: &K, cmp: &C) -> bool {
        match &self.hi {
            Bound::Unbounded => false,
            Bound::Included(h) => cmp.compare(key, h) == Ordering::Greater,
            Bound::Excluded(h) => cmp.compare(key, h) != Ordering::Less,
        }
    }

    /// Is key inside the bounds?
    pub fn contains<C: Comparator<K>>(&self, key: &K, cmp: &C) -> bool {
        !self.too_low(key, cmp) && !self.too_high(key, cmp)
    }

    /// Is key between the bound keys, counting the bound keys themselves as inside.
    fn within_closed<C: Comparator<K>>(&self, key: &K, cmp: &C) -> bool {
        let above_lo = match &self.lo {
            Bound::Unbounded => true,
            Bound::Included(l) | Bound::Excluded(l) => cmp.compare(key, l) != Ordering::Less,
        };
        let below_hi = match &self.hi {
            Bound::Unbounded => true,
            Bound::Included(h) | Bound::Excluded(h) => cmp.compare(key, h) != Ordering::Greater,
        };
        above_lo && below_hi
    }

    fn admits<C: Comparator<K>>(&self, bound: &Bound<K>, cmp: &C) -> bool {
        match bound {
            Bound::Unbounded => true,
            Bound::Included(k) => self.contains(k, cmp),
            Bound::Excluded(k) => self.within_closed(k, cmp),
        }
    }

    /// Narrow to new bounds, an unbounded side keeps the current bound.
    /// Fails with [`Error::OutOfRange`] if a new bound lies outside the current bounds.
    pub fn narrow<C: Comparator<K>>(&self, lo: Bound<K>, hi: Bound<K>, cmp: &C) -> Result<Self>
    where
        K: Clone,
    {
        if !self.admits(&lo, cmp) || !self.admits(&hi, cmp) {
            return Err(Error::OutOfRange);
        }
        let lo = match lo {
            Bound::Unbounded => bound_cloned(&self.lo),
            b => b,
        };
        let hi = match hi {
            Bound::Unbounded => bound_cloned(&self.hi),
            b => b,
        };
        Self::new(lo, hi, cmp)
    }

    pub(crate) fn first_pos<V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &Tree<K, V, B>,
        cmp: &C,
    ) -> Option<Pos> {
        tree.lower_pos(self.lo.as_ref(), cmp)
            .filter(|&p| !self.too_high(tree.key(p), cmp))
    }

    pub(crate) fn last_pos<V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &Tree<K, V, B>,
        cmp: &C,
    ) -> Option<Pos> {
        tree.upper_pos(self.hi.as_ref(), cmp)
            .filter(|&p| !self.too_low(tree.key(p), cmp))
    }

    /// First position in iteration order.
    pub(crate) fn head<V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &Tree<K, V, B>,
        cmp: &C,
        descending: bool,
    ) -> Option<Pos> {
        if descending {
            self.last_pos(tree, cmp)
        } else {
            self.first_pos(tree, cmp)
        }
    }

    /// Last position in iteration order.
    fn tail<V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &Tree<K, V, B>,
        cmp: &C,
        descending: bool,
    ) -> Option<Pos> {
        self.head(tree, cmp, !descending)
    }

    fn nav<V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &Tree<K, V, B>,
        cmp: &C,
        key: &K,
        nav: Nav,
        descending: bool,
    ) -> Option<Pos> {
        let nav = if descending { nav.reversed() } else { nav };
        match nav {
            Nav::Floor | Nav::Lower => {
                if self.too_high(key, cmp) {
                    self.last_pos(tree, cmp)
                } else {
                    tree.floor(key, cmp, matches!(nav, Nav::Floor))
                        .filter(|&p| !self.too_low(tree.key(p), cmp))
                }
            }
            Nav::Ceiling | Nav::Higher => {
                if self.too_low(key, cmp) {
                    self.first_pos(tree, cmp)
                } else {
                    tree.ceiling(key, cmp, matches!(nav, Nav::Ceiling))
                        .filter(|&p| !self.too_high(tree.key(p), cmp))
                }
            }
        }
    }

    fn range<'m, V, C: Comparator<K>, const B: usize>(
        &self,
        tree: &'m Tree<K, V, B>,
        cmp: &C,
    ) -> Range<'m, K, V, B> {
        Range::between(tree, self.first_pos(tree, cmp), self.last_pos(tree, cmp), cmp)
    }

    /// Bounds for a head, tail or sub view taken in iteration order.
    fn oriented(from: Bound<K>, to: Bound<K>, descending: bool) -> (Bound<K>, Bound<K>) {
        if descending {
            (to, from)
        } else {
            (from, to)
        }
    }
}

fn entry_at<K, V, const B: usize>(tree: &Tree<K, V, B>, pos: Option<Pos>) -> Option<(&K, &V)> {
    let (k, v) = tree.kv(pos?);
    Some((k, v))
}

fn bound<K>(key: K, inclusive: bool) -> Bound<K> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

/// Iterator over a [`RangeView`], in the view's order.
pub struct ViewIter<'a, K, V, const B: usize> {
    inner: Range<'a, K, V, B>,
    descending: bool,
}

impl<'a, K, V, const B: usize> Iterator for ViewIter<'a, K, V, B> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.inner.next_back()
        } else {
            self.inner.next()
        }
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for ViewIter<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.inner.next()
        } else {
            self.inner.next_back()
        }
    }
}
impl<K, V, const B: usize> FusedIterator for ViewIter<'_, K, V, B> {}

/// Iterator over a [`RangeViewMut`], in the view's order.
pub struct ViewIterMut<'a, K, V, const B: usize> {
    inner: RangeMut<'a, K, V, B>,
    descending: bool,
}

impl<'a, K, V, const B: usize> Iterator for ViewIterMut<'a, K, V, B> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.inner.next_back()
        } else {
            self.inner.next()
        }
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for ViewIterMut<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.inner.next()
        } else {
            self.inner.next_back()
        }
    }
}
impl<K, V, const B: usize> FusedIterator for ViewIterMut<'_, K, V, B> {}

/// Keys of a [`RangeView`].
pub type ViewKeys<'a, K, V, const B: usize> =
    Map<ViewIter<'a, K, V, B>, fn((&'a K, &'a V)) -> &'a K>;

/// Values of a [`RangeView`].
pub type ViewValues<'a, K, V, const B: usize> =
    Map<ViewIter<'a, K, V, B>, fn((&'a K, &'a V)) -> &'a V>;

/// Read-only view of the entries of a map that lie within [`Bounds`].
///
/// Returned by [`BlockMap::head_map`], [`BlockMap::tail_map`], [`BlockMap::sub_map`],
/// [`BlockMap::descending_map`] and [`BlockMap::view`].
pub struct RangeView<'a, K, V, C, const B: usize> {
    map: &'a BlockMap<K, V, C, B>,
    bounds: Bounds<K>,
    descending: bool,
}

impl<'a, K, V, C, const B: usize> RangeView<'a, K, V, C, B>
where
    C: Comparator<K>,
{
    /// The bounds of the view.
    pub fn bounds(&self) -> &Bounds<K> {
        &self.bounds
    }

    /// Does the view run from high keys to low keys?
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Get reference to the value corresponding to the key, None if the key is outside the view.
    pub fn get(&self, key: &K) -> Option<&'a V> {
        if self.bounds.contains(key, &self.map.cmp) {
            self.map.get(key)
        } else {
            None
        }
    }

    /// Does the view have an entry for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries in the view. This visits every entry.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Is the view empty?
    pub fn is_empty(&self) -> bool {
        self.bounds.first_pos(&self.map.tree, &self.map.cmp).is_none()
    }

    /// First entry in view order.
    pub fn first_key_value(&self) -> Option<(&'a K, &'a V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.head(tree, &self.map.cmp, self.descending))
    }

    /// Last entry in view order.
    pub fn last_key_value(&self) -> Option<(&'a K, &'a V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.tail(tree, &self.map.cmp, self.descending))
    }

    /// First key in view order.
    pub fn first_key(&self) -> Option<&'a K> {
        self.first_key_value().map(|(k, _)| k)
    }

    /// Last key in view order.
    pub fn last_key(&self) -> Option<&'a K> {
        self.last_key_value().map(|(k, _)| k)
    }

    fn nav(&self, key: &K, nav: Nav) -> Option<(&'a K, &'a V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.nav(tree, &self.map.cmp, key, nav, self.descending))
    }

    /// Last entry in view order at or before key.
    pub fn floor_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.nav(key, Nav::Floor)
    }

    /// First entry in view order at or after key.
    pub fn ceiling_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.nav(key, Nav::Ceiling)
    }

    /// First entry in view order strictly after key.
    pub fn higher_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.nav(key, Nav::Higher)
    }

    /// Last entry in view order strictly before key.
    pub fn lower_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.nav(key, Nav::Lower)
    }

    /// Iterate entries in view order.
    pub fn iter(&self) -> ViewIter<'a, K, V, B> {
        ViewIter {
            inner: self.bounds.range(&self.map.tree, &self.map.cmp),
            descending: self.descending,
        }
    }

    /// Iterate keys in view order.
    pub fn keys(&self) -> ViewKeys<'a, K, V, B> {
        let key: fn((&'a K, &'a V)) -> &'a K = |(k, _)| k;
        self.iter().map(key)
    }

    /// Iterate values in view order.
    pub fn values(&self) -> ViewValues<'a, K, V, B> {
        let value: fn((&'a K, &'a V)) -> &'a V = |(_, v)| v;
        self.iter().map(value)
    }

    fn narrowed(&self, from: Bound<K>, to: Bound<K>) -> Result<Self>
    where
        K: Clone,
    {
        let (lo, hi) = Bounds::oriented(from, to, self.descending);
        Ok(Self {
            map: self.map,
            bounds: self.bounds.narrow(lo, hi, &self.map.cmp)?,
            descending: self.descending,
        })
    }

    /// View of the entries before `to` in view order.
    pub fn head_map(&self, to: K, inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(Bound::Unbounded, bound(to, inclusive))
    }

    /// View of the entries from `from` onward in view order.
    pub fn tail_map(&self, from: K, inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(bound(from, inclusive), Bound::Unbounded)
    }

    /// View of the entries from `from` to `to` in view order.
    pub fn sub_map(&self, from: K, from_inclusive: bool, to: K, to_inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(bound(from, from_inclusive), bound(to, to_inclusive))
    }

    /// The same entries in the opposite order.
    pub fn descending(self) -> Self {
        Self {
            descending: !self.descending,
            ..self
        }
    }

    /// Detached cursor over the view, see [`Cursor`].
    pub fn cursor(&self) -> Cursor<K>
    where
        K: Clone,
    {
        Cursor::new(self.map, self.bounds.clone(), self.descending)
    }
}

/// Mutable view of the entries of a map that lie within [`Bounds`].
///
/// Inserting a key outside the bounds fails with [`Error::OutOfRange`].
pub struct RangeViewMut<'a, K, V, C, const B: usize> {
    map: &'a mut BlockMap<K, V, C, B>,
    bounds: Bounds<K>,
    descending: bool,
}

impl<'a, K, V, C, const B: usize> RangeViewMut<'a, K, V, C, B>
where
    C: Comparator<K>,
{
    /// The bounds of the view.
    pub fn bounds(&self) -> &Bounds<K> {
        &self.bounds
    }

    /// Does the view run from high keys to low keys?
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Get reference to the value corresponding to the key, None if the key is outside the view.
    pub fn get(&self, key: &K) -> Option<&V> {
        if self.bounds.contains(key, &self.map.cmp) {
            self.map.get(key)
        } else {
            None
        }
    }

    /// Get mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.bounds.contains(key, &self.map.cmp) {
            // BlockMap::get_mut counts the modification.
            self.map.get_mut(key)
        } else {
            None
        }
    }

    /// Does the view have an entry for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries in the view. This visits every entry.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Is the view empty?
    pub fn is_empty(&self) -> bool {
        self.bounds.first_pos(&self.map.tree, &self.map.cmp).is_none()
    }

    /// First entry in view order.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.head(tree, &self.map.cmp, self.descending))
    }

    /// Last entry in view order.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.tail(tree, &self.map.cmp, self.descending))
    }

    /// Last entry in view order at or before key.
    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.nav(tree, &self.map.cmp, key, Nav::Floor, self.descending))
    }

    /// First entry in view order at or after key.
    pub fn ceiling_entry(&self, key: &K) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.nav(tree, &self.map.cmp, key, Nav::Ceiling, self.descending))
    }

    /// First entry in view order strictly after key.
    pub fn higher_entry(&self, key: &K) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.nav(tree, &self.map.cmp, key, Nav::Higher, self.descending))
    }

    /// Last entry in view order strictly before key.
    pub fn lower_entry(&self, key: &K) -> Option<(&K, &V)> {
        let tree = &self.map.tree;
        entry_at(tree, self.bounds.nav(tree, &self.map.cmp, key, Nav::Lower, self.descending))
    }

    /// Iterate entries in view order.
    pub fn iter(&self) -> ViewIter<'_, K, V, B> {
        ViewIter {
            inner: self.bounds.range(&self.map.tree, &self.map.cmp),
            descending: self.descending,
        }
    }

    /// Iterate entries in view order, with mutable references to the values.
    pub fn iter_mut(&mut self) -> ViewIterMut<'_, K, V, B> {
        let map = &mut *self.map;
        map.mod_count += 1;
        let (front, back) = (
            self.bounds.first_pos(&map.tree, &map.cmp),
            self.bounds.last_pos(&map.tree, &map.cmp),
        );
        ViewIterMut {
            inner: RangeMut::between(&mut map.tree, front, back, &map.cmp),
            descending: self.descending,
        }
    }

    /// Insert key-value pair, failing with [`Error::OutOfRange`] if key is outside the view.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if !self.bounds.contains(&key, &self.map.cmp) {
            return Err(Error::OutOfRange);
        }
        Ok(self.map.insert(key, value))
    }

    /// Remove key from the map, if it lies inside the view.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if self.bounds.contains(key, &self.map.cmp) {
            self.map.remove(key)
        } else {
            None
        }
    }

    /// Remove the first entry in view order.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let pos = self.bounds.head(&self.map.tree, &self.map.cmp, self.descending)?;
        Some(self.map.remove_at(pos))
    }

    /// Remove the last entry in view order.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let pos = self.bounds.tail(&self.map.tree, &self.map.cmp, self.descending)?;
        Some(self.map.remove_at(pos))
    }

    /// Remove every entry in the view from the map.
    pub fn clear(&mut self) {
        while let Some(pos) = self.bounds.first_pos(&self.map.tree, &self.map.cmp) {
            self.map.remove_at(pos);
        }
    }

    /// Read-only view with the same bounds and order.
    pub fn as_view(&self) -> RangeView<'_, K, V, C, B>
    where
        K: Clone,
    {
        RangeView {
            map: &*self.map,
            bounds: self.bounds.clone(),
            descending: self.descending,
        }
    }

    fn narrowed(self, from: Bound<K>, to: Bound<K>) -> Result<Self>
    where
        K: Clone,
    {
        let (lo, hi) = Bounds::oriented(from, to, self.descending);
        let bounds = self.bounds.narrow(lo, hi, &self.map.cmp)?;
        Ok(Self { bounds, ..self })
    }

    /// View of the entries before `to` in view order.
    pub fn head_map(self, to: K, inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(Bound::Unbounded, bound(to, inclusive))
    }

    /// View of the entries from `from` onward in view order.
    pub fn tail_map(self, from: K, inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(bound(from, inclusive), Bound::Unbounded)
    }

    /// View of the entries from `from` to `to` in view order.
    pub fn sub_map(self, from: K, from_inclusive: bool, to: K, to_inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        self.narrowed(bound(from, from_inclusive), bound(to, to_inclusive))
    }

    /// The same entries in the opposite order.
    pub fn descending(self) -> Self {
        Self {
            descending: !self.descending,
            ..self
        }
    }

    /// Detached cursor over the view, see [`Cursor`].
    pub fn cursor(&self) -> Cursor<K>
    where
        K: Clone,
    {
        Cursor::new(&*self.map, self.bounds.clone(), self.descending)
    }
}

impl<K, V, C, const B: usize> BlockMap<K, V, C, B>
where
    C: Comparator<K>,
{
    /// Get iterator for range of keys.
    ///
    /// Fails with [`Error::InvalidOrdering`] if the range start is greater than its end.
    pub fn range<R>(&self, range: R) -> Result<Range<'_, K, V, B>>
    where
        R: RangeBounds<K>,
    {
        let (lo, hi) = (range.start_bound(), range.end_bound());
        check_range(lo, hi, &self.cmp)?;
        let (front, back) = (
            self.tree.lower_pos(lo, &self.cmp),
            self.tree.upper_pos(hi, &self.cmp),
        );
        Ok(Range::between(&self.tree, front, back, &self.cmp))
    }

    /// Get mutable iterator for range of keys.
    ///
    /// Fails with [`Error::InvalidOrdering`] if the range start is greater than its end.
    pub fn range_mut<R>(&mut self, range: R) -> Result<RangeMut<'_, K, V, B>>
    where
        R: RangeBounds<K>,
    {
        let (lo, hi) = (range.start_bound(), range.end_bound());
        check_range(lo, hi, &self.cmp)?;
        self.mod_count += 1;
        let (front, back) = (
            self.tree.lower_pos(lo, &self.cmp),
            self.tree.upper_pos(hi, &self.cmp),
        );
        Ok(RangeMut::between(&mut self.tree, front, back, &self.cmp))
    }

    /// Live view of the entries within bounds.
    ///
    /// The bounds are checked again under this map's comparator, failing with
    /// [`Error::InvalidOrdering`] if lo is above hi.
    pub fn view(&self, bounds: Bounds<K>) -> Result<RangeView<'_, K, V, C, B>> {
        check_range(bounds.lo(), bounds.hi(), &self.cmp)?;
        Ok(self.bounded(bounds))
    }

    /// Mutable live view of the entries within bounds.
    ///
    /// The bounds are checked again under this map's comparator, failing with
    /// [`Error::InvalidOrdering`] if lo is above hi.
    pub fn view_mut(&mut self, bounds: Bounds<K>) -> Result<RangeViewMut<'_, K, V, C, B>> {
        check_range(bounds.lo(), bounds.hi(), &self.cmp)?;
        Ok(self.bounded_mut(bounds))
    }

    fn bounded(&self, bounds: Bounds<K>) -> RangeView<'_, K, V, C, B> {
        RangeView {
            map: self,
            bounds,
            descending: false,
        }
    }

    fn bounded_mut(&mut self, bounds: Bounds<K>) -> RangeViewMut<'_, K, V, C, B> {
        RangeViewMut {
            map: self,
            bounds,
            descending: false,
        }
    }

    /// View of the entries with keys less than (or equal to, if inclusive) `to`.
    pub fn head_map(&self, to: K, inclusive: bool) -> RangeView<'_, K, V, C, B> {
        self.bounded(Bounds {
            lo: Bound::Unbounded,
            hi: bound(to, inclusive),
        })
    }

    /// View of the entries with keys greater than (or equal to, if inclusive) `from`.
    pub fn tail_map(&self, from: K, inclusive: bool) -> RangeView<'_, K, V, C, B> {
        self.bounded(Bounds {
            lo: bound(from, inclusive),
            hi: Bound::Unbounded,
        })
    }

    /// View of the entries with keys between `from` and `to`.
    ///
    /// Fails with [`Error::InvalidOrdering`] if `from` is greater than `to`.
    pub fn sub_map(
        &self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<RangeView<'_, K, V, C, B>> {
        let bounds = Bounds::new(bound(from, from_inclusive), bound(to, to_inclusive), &self.cmp)?;
        Ok(self.bounded(bounds))
    }

    /// View of every entry, highest key first.
    pub fn descending_map(&self) -> RangeView<'_, K, V, C, B> {
        self.bounded(Bounds::all()).descending()
    }

    /// Mutable view of the entries with keys less than (or equal to, if inclusive) `to`.
    pub fn head_map_mut(&mut self, to: K, inclusive: bool) -> RangeViewMut<'_, K, V, C, B> {
        self.bounded_mut(Bounds {
            lo: Bound::Unbounded,
            hi: bound(to, inclusive),
        })
    }

    /// Mutable view of the entries with keys greater than (or equal to, if inclusive) `from`.
    pub fn tail_map_mut(&mut self, from: K, inclusive: bool) -> RangeViewMut<'_, K, V, C, B> {
        self.bounded_mut(Bounds {
            lo: bound(from, inclusive),
            hi: Bound::Unbounded,
        })
    }

    /// Mutable view of the entries with keys between `from` and `to`.
    ///
    /// Fails with [`Error::InvalidOrdering`] if `from` is greater than `to`.
    pub fn sub_map_mut(
        &mut self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<RangeViewMut<'_, K, V, C, B>> {
        let bounds = Bounds::new(bound(from, from_inclusive), bound(to, to_inclusive), &self.cmp)?;
        Ok(self.bounded_mut(bounds))
    }

    /// Mutable view of every entry, highest key first.
    pub fn descending_map_mut(&mut self) -> RangeViewMut<'_, K, V, C, B> {
        self.bounded_mut(Bounds::all()).descending()
    }

    /// Detached cursor visiting every entry in ascending key order.
    pub fn cursor(&self) -> Cursor<K> {
        Cursor::new(self, Bounds::all(), false)
    }

    /// Detached cursor visiting every entry in descending key order.
    pub fn cursor_back(&self) -> Cursor<K> {
        Cursor::new(self, Bounds::all(), true)
    }
}
