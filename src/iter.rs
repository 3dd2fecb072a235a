//! Iterators over a [`BlockMap`] and the detached [`Cursor`].
//!
//! Borrowing iterators walk the block chain between a front and a back position, both
//! inclusive, so they are double ended without touching the tree.

use crate::compare::Comparator;
use crate::error::{Error, Result};
use crate::gb::BlockMap;
use crate::tree::{BlockId, Pos, Tree};
use crate::view::Bounds;
use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Range iterator returned by [`BlockMap::range`].
pub struct Range<'a, K, V, const B: usize> {
    tree: &'a Tree<K, V, B>,
    front: Option<Pos>,
    back: Option<Pos>,
}

impl<K, V, const B: usize> Clone for Range<'_, K, V, B> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, K, V, const B: usize> Range<'a, K, V, B> {
    /// front and back must both be None or both be Some with front not after back.
    pub(crate) fn new(tree: &'a Tree<K, V, B>, front: Option<Pos>, back: Option<Pos>) -> Self {
        if front.is_none() || back.is_none() {
            return Self::empty(tree);
        }
        Self { tree, front, back }
    }

    /// Range between two positions found by independent searches, which may have crossed.
    pub(crate) fn between<C: Comparator<K>>(
        tree: &'a Tree<K, V, B>,
        front: Option<Pos>,
        back: Option<Pos>,
        cmp: &C,
    ) -> Self {
        match (front, back) {
            (Some(f), Some(b)) if cmp.compare(tree.key(f), tree.key(b)) != Ordering::Greater => {
                Self::new(tree, front, back)
            }
            _ => Self::empty(tree),
        }
    }

    pub(crate) fn empty(tree: &'a Tree<K, V, B>) -> Self {
        Self {
            tree,
            front: None,
            back: None,
        }
    }

    fn step_front(&mut self) -> Option<Pos> {
        let f = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.tree.succ(f);
        }
        Some(f)
    }

    fn step_back(&mut self) -> Option<Pos> {
        let b = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.tree.pred(b);
        }
        Some(b)
    }
}

impl<'a, K, V, const B: usize> Iterator for Range<'a, K, V, B> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let (k, v) = tree.kv(self.step_front()?);
        Some((k, v))
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for Range<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let (k, v) = tree.kv(self.step_back()?);
        Some((k, v))
    }
}
impl<K, V, const B: usize> FusedIterator for Range<'_, K, V, B> {}

/// Range iterator returned by [`BlockMap::range_mut`].
pub struct RangeMut<'a, K, V, const B: usize> {
    tree: &'a Tree<K, V, B>,
    front: Option<Pos>,
    back: Option<Pos>,
    _pd: PhantomData<&'a mut V>,
}

impl<'a, K, V, const B: usize> RangeMut<'a, K, V, B> {
    /// Holding the only borrow of the tree is what makes handing out `&mut V` sound.
    pub(crate) fn new(tree: &'a mut Tree<K, V, B>, front: Option<Pos>, back: Option<Pos>) -> Self {
        let tree: &'a Tree<K, V, B> = tree;
        let (front, back) = match (front, back) {
            (Some(_), Some(_)) => (front, back),
            _ => (None, None),
        };
        Self {
            tree,
            front,
            back,
            _pd: PhantomData,
        }
    }

    pub(crate) fn between<C: Comparator<K>>(
        tree: &'a mut Tree<K, V, B>,
        front: Option<Pos>,
        back: Option<Pos>,
        cmp: &C,
    ) -> Self {
        let crossed = match (front, back) {
            (Some(f), Some(b)) => cmp.compare(tree.key(f), tree.key(b)) == Ordering::Greater,
            _ => true,
        };
        if crossed {
            Self::new(tree, None, None)
        } else {
            Self::new(tree, front, back)
        }
    }

    fn item(&self, (b, i): Pos) -> (&'a K, &'a mut V) {
        let tree = self.tree;
        let p = tree.b(b).kv.ix_ptr(i);
        // Each position is yielded at most once, so no two live &mut V alias.
        unsafe { (&(*p).0, &mut (*p).1) }
    }
}

impl<'a, K, V, const B: usize> Iterator for RangeMut<'a, K, V, B> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        let f = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.tree.succ(f);
        }
        Some(self.item(f))
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for RangeMut<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let b = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.tree.pred(b);
        }
        Some(self.item(b))
    }
}
impl<K, V, const B: usize> FusedIterator for RangeMut<'_, K, V, B> {}

/// Iterator returned by [`BlockMap::iter`].
pub struct Iter<'a, K, V, const B: usize> {
    len: usize,
    inner: Range<'a, K, V, B>,
}
impl<K, V, const B: usize> Clone for Iter<'_, K, V, B> {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            inner: self.inner.clone(),
        }
    }
}
impl<'a, K, V, const B: usize> Iter<'a, K, V, B> {
    pub(crate) fn new(len: usize, inner: Range<'a, K, V, B>) -> Self {
        Self { len, inner }
    }
}
impl<'a, K, V, const B: usize> Iterator for Iter<'a, K, V, B> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next()
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a, K, V, const B: usize> ExactSizeIterator for Iter<'a, K, V, B> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for Iter<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next_back()
        }
    }
}
impl<'a, K, V, const B: usize> FusedIterator for Iter<'a, K, V, B> {}

/// Iterator returned by [`BlockMap::iter_mut`].
pub struct IterMut<'a, K, V, const B: usize> {
    len: usize,
    inner: RangeMut<'a, K, V, B>,
}
impl<'a, K, V, const B: usize> IterMut<'a, K, V, B> {
    pub(crate) fn new(len: usize, inner: RangeMut<'a, K, V, B>) -> Self {
        Self { len, inner }
    }
}
impl<'a, K, V, const B: usize> Iterator for IterMut<'a, K, V, B> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next()
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a, K, V, const B: usize> ExactSizeIterator for IterMut<'a, K, V, B> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for IterMut<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next_back()
        }
    }
}
impl<'a, K, V, const B: usize> FusedIterator for IterMut<'a, K, V, B> {}

/// Consuming iterator for [`BlockMap`].
pub struct IntoIter<K, V, const B: usize> {
    len: usize,
    tree: Tree<K, V, B>,
    front: Option<BlockId>,
    back: Option<BlockId>,
}
impl<K, V, const B: usize> IntoIter<K, V, B> {
    pub(crate) fn new(tree: Tree<K, V, B>, len: usize) -> Self {
        let (front, back) = (tree.first_block(), tree.last_block());
        Self {
            len,
            tree,
            front,
            back,
        }
    }
}
impl<K, V, const B: usize> Iterator for IntoIter<K, V, B> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let b = self.front?;
        let blk = &mut self.tree.blocks[b];
        let kv = blk.kv.pop_front()?;
        if blk.kv.is_empty() {
            self.front = blk.next;
        }
        self.len -= 1;
        Some(kv)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<K, V, const B: usize> DoubleEndedIterator for IntoIter<K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let b = self.back?;
        let blk = &mut self.tree.blocks[b];
        let kv = blk.kv.pop_back()?;
        if blk.kv.is_empty() {
            self.back = blk.prev;
        }
        self.len -= 1;
        Some(kv)
    }
}
impl<K, V, const B: usize> ExactSizeIterator for IntoIter<K, V, B> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<K, V, const B: usize> FusedIterator for IntoIter<K, V, B> {}

/// Consuming iterator returned by [`BlockMap::into_keys`].
pub struct IntoKeys<K, V, const B: usize>(pub(crate) IntoIter<K, V, B>);
impl<K, V, const B: usize> Iterator for IntoKeys<K, V, B> {
    type Item = K;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.0)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V, const B: usize> DoubleEndedIterator for IntoKeys<K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(self.0.next_back()?.0)
    }
}
impl<K, V, const B: usize> ExactSizeIterator for IntoKeys<K, V, B> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V, const B: usize> FusedIterator for IntoKeys<K, V, B> {}

/// Consuming iterator returned by [`BlockMap::into_values`].
pub struct IntoValues<K, V, const B: usize>(pub(crate) IntoIter<K, V, B>);
impl<K, V, const B: usize> Iterator for IntoValues<K, V, B> {
    type Item = V;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.1)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V, const B: usize> DoubleEndedIterator for IntoValues<K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(self.0.next_back()?.1)
    }
}
impl<K, V, const B: usize> ExactSizeIterator for IntoValues<K, V, B> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V, const B: usize> FusedIterator for IntoValues<K, V, B> {}

/// Iterator returned by [`BlockMap::keys`].
pub struct Keys<'a, K, V, const B: usize>(pub(crate) Iter<'a, K, V, B>);
impl<K, V, const B: usize> Clone for Keys<'_, K, V, B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl<'a, K, V, const B: usize> Iterator for Keys<'a, K, V, B> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.0)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for Keys<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(self.0.next_back()?.0)
    }
}
impl<'a, K, V, const B: usize> ExactSizeIterator for Keys<'a, K, V, B> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V, const B: usize> FusedIterator for Keys<'a, K, V, B> {}

/// Iterator returned by [`BlockMap::values`].
pub struct Values<'a, K, V, const B: usize>(pub(crate) Iter<'a, K, V, B>);
impl<K, V, const B: usize> Clone for Values<'_, K, V, B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl<'a, K, V, const B: usize> Iterator for Values<'a, K, V, B> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.1)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for Values<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(self.0.next_back()?.1)
    }
}
impl<'a, K, V, const B: usize> ExactSizeIterator for Values<'a, K, V, B> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V, const B: usize> FusedIterator for Values<'a, K, V, B> {}

/// Iterator returned by [`BlockMap::values_mut`].
pub struct ValuesMut<'a, K, V, const B: usize>(pub(crate) IterMut<'a, K, V, B>);
impl<'a, K, V, const B: usize> Iterator for ValuesMut<'a, K, V, B> {
    type Item = &'a mut V;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.1)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V, const B: usize> DoubleEndedIterator for ValuesMut<'a, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(self.0.next_back()?.1)
    }
}
impl<'a, K, V, const B: usize> ExactSizeIterator for ValuesMut<'a, K, V, B> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V, const B: usize> FusedIterator for ValuesMut<'a, K, V, B> {}

/// Cursor that does not borrow the map it walks.
///
/// The map is passed to each call instead. If the map has been modified since the cursor
/// last saw it, other than by [`Cursor::remove`], calls fail with
/// [`Error::ConcurrentModification`]. Passing a map other than the one the cursor was made
/// from (a clone included) fails with [`Error::IllegalState`].
#[derive(Debug, Clone)]
pub struct Cursor<K> {
    bounds: Bounds<K>,
    descending: bool,
    next: Option<Pos>,
    last: Option<Pos>,
    map_id: u64,
    expected: u64,
}

impl<K> Cursor<K> {
    pub(crate) fn new<V, C, const B: usize>(
        map: &BlockMap<K, V, C, B>,
        bounds: Bounds<K>,
        descending: bool,
    ) -> Self
    where
        C: Comparator<K>,
    {
        let next = bounds.head(&map.tree, &map.cmp, descending);
        Self {
            bounds,
            descending,
            next,
            last: None,
            map_id: map.id,
            expected: map.mod_count,
        }
    }

    /// Does the cursor walk keys in descending order?
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    fn check<V, C, const B: usize>(&self, map: &BlockMap<K, V, C, B>) -> Result<()> {
        if map.id != self.map_id {
            Err(Error::IllegalState("cursor used with a different map"))
        } else if map.mod_count != self.expected {
            Err(Error::ConcurrentModification)
        } else {
            Ok(())
        }
    }

    /// Is there another entry to visit?
    pub fn has_next<V, C, const B: usize>(&self, map: &BlockMap<K, V, C, B>) -> Result<bool> {
        self.check(map)?;
        Ok(self.next.is_some())
    }

    /// Look at the next entry without advancing.
    pub fn peek<'m, V, C, const B: usize>(
        &self,
        map: &'m BlockMap<K, V, C, B>,
    ) -> Result<(&'m K, &'m V)> {
        self.check(map)?;
        let (k, v) = map.tree.kv(self.next.ok_or(Error::NoSuchElement)?);
        Ok((k, v))
    }

    /// Advance, returning the entry passed over.
    pub fn next<'m, V, C, const B: usize>(
        &mut self,
        map: &'m BlockMap<K, V, C, B>,
    ) -> Result<(&'m K, &'m V)>
    where
        C: Comparator<K>,
    {
        self.check(map)?;
        let pos = self.next.ok_or(Error::NoSuchElement)?;
        let step = if self.descending {
            map.tree.pred(pos)
        } else {
            map.tree.succ(pos)
        };
        self.next = step.filter(|&p| self.bounds.contains(map.tree.key(p), &map.cmp));
        self.last = Some(pos);
        let (k, v) = map.tree.kv(pos);
        Ok((k, v))
    }

    /// Remove the entry most recently returned by [`Cursor::next`].
    ///
    /// The cursor stays valid, later entries are still visited.
    pub fn remove<V, C, const B: usize>(&mut self, map: &mut BlockMap<K, V, C, B>) -> Result<(K, V)>
    where
        C: Comparator<K>,
    {
        self.check(map)?;
        let pos = self
            .last
            .take()
            .ok_or(Error::IllegalState("remove called without a preceding next"))?;
        let (k, v) = map.remove_at(pos);
        // Removal can merge or free blocks, so positions are found again from the removed key.
        let next = if self.descending {
            map.tree.floor(&k, &map.cmp, false)
        } else {
            map.tree.ceiling(&k, &map.cmp, false)
        };
        self.next = next.filter(|&p| self.bounds.contains(map.tree.key(p), &map.cmp));
        self.expected = map.mod_count;
        Ok((k, v))
    }
}
