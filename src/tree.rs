//! Blocks and the red-black tree over them.
//!
//! Every block holds between 1 and B sorted entries. Blocks live in a slab and refer to
//! each other by index: `parent`/`left`/`right` form the balancing tree, `prev`/`next` thread
//! all blocks in key order. In-order traversal of the tree always equals the chain order.

use crate::compare::Comparator;
use crate::vecs::{safe_assert, GapVec};
use arrayvec::ArrayVec;
use slab::Slab;
use std::cmp::Ordering;
use std::ops::Bound;

/// Index of a block in the slab.
pub(crate) type BlockId = usize;

/// Position of an entry: block and index within the block's occupied range.
pub(crate) type Pos = (BlockId, usize);

pub(crate) type PairVec<K, V, const B: usize> = GapVec<(K, V), B>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) struct Block<K, V, const B: usize> {
    pub(crate) kv: PairVec<K, V, B>,
    pub(crate) color: Color,
    pub(crate) parent: Option<BlockId>,
    pub(crate) left: Option<BlockId>,
    pub(crate) right: Option<BlockId>,
    pub(crate) prev: Option<BlockId>,
    pub(crate) next: Option<BlockId>,
}

impl<K, V, const B: usize> Block<K, V, B> {
    fn new(kv: PairVec<K, V, B>, color: Color) -> Self {
        Self {
            kv,
            color,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
        }
    }
}

/// Result of [`Tree::locate`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Probe {
    /// Key found at position.
    Hit(BlockId, usize),
    /// Key absent. It belongs at this index of the block: 0 means between the previous
    /// block and this one, `len` means between this block and the next one.
    Miss(BlockId, usize),
}

pub(crate) struct Tree<K, V, const B: usize> {
    pub(crate) blocks: Slab<Block<K, V, B>>,
    pub(crate) root: Option<BlockId>,
}

impl<K, V, const B: usize> Default for Tree<K, V, B> {
    fn default() -> Self {
        Self {
            blocks: Slab::new(),
            root: None,
        }
    }
}

impl<K, V, const B: usize> Tree<K, V, B> {
    /// A block with this many entries or fewer is merged into a neighbour that can absorb it.
    const LOW_WATER: usize = B / 4;

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.root = None;
    }

    #[inline]
    pub fn b(&self, id: BlockId) -> &Block<K, V, B> {
        &self.blocks[id]
    }

    #[inline]
    fn bm(&mut self, id: BlockId) -> &mut Block<K, V, B> {
        &mut self.blocks[id]
    }

    #[inline]
    pub fn kv(&self, (b, i): Pos) -> &(K, V) {
        self.b(b).kv.ix(i)
    }

    #[inline]
    pub fn kvm(&mut self, (b, i): Pos) -> &mut (K, V) {
        self.bm(b).kv.ixm(i)
    }

    #[inline]
    pub fn key(&self, pos: Pos) -> &K {
        &self.kv(pos).0
    }

    pub fn first_block(&self) -> Option<BlockId> {
        let mut id = self.root?;
        while let Some(l) = self.b(id).left {
            id = l;
        }
        Some(id)
    }

    pub fn last_block(&self) -> Option<BlockId> {
        let mut id = self.root?;
        while let Some(r) = self.b(id).right {
            id = r;
        }
        Some(id)
    }

    pub fn first_pos(&self) -> Option<Pos> {
        self.first_block().map(|b| (b, 0))
    }

    pub fn last_pos(&self) -> Option<Pos> {
        self.last_block().map(|b| (b, self.b(b).kv.len() - 1))
    }

    /// Position following pos in key order.
    #[inline]
    pub fn succ(&self, (b, i): Pos) -> Option<Pos> {
        let blk = self.b(b);
        if i + 1 < blk.kv.len() {
            Some((b, i + 1))
        } else {
            blk.next.map(|n| (n, 0))
        }
    }

    /// Position preceding pos in key order.
    #[inline]
    pub fn pred(&self, (b, i): Pos) -> Option<Pos> {
        if i > 0 {
            Some((b, i - 1))
        } else {
            let p = self.b(b).prev?;
            Some((p, self.b(p).kv.len() - 1))
        }
    }

    /// Descend the tree looking for key.
    pub fn locate<C: Comparator<K>>(&self, key: &K, cmp: &C) -> Option<Probe> {
        let mut id = self.root?;
        loop {
            let blk = self.b(id);
            let len = blk.kv.len();
            if cmp.compare(key, &blk.kv.ix(0).0) == Ordering::Less {
                match blk.left {
                    Some(l) => id = l,
                    None => return Some(Probe::Miss(id, 0)),
                }
                continue;
            }
            match cmp.compare(key, &blk.kv.ix(len - 1).0) {
                Ordering::Greater => match blk.right {
                    Some(r) => id = r,
                    None => return Some(Probe::Miss(id, len)),
                },
                Ordering::Equal => return Some(Probe::Hit(id, len - 1)),
                Ordering::Less => {
                    return Some(match blk.kv.search(|(k, _)| cmp.compare(k, key)) {
                        Ok(i) => Probe::Hit(id, i),
                        Err(i) => Probe::Miss(id, i),
                    });
                }
            }
        }
    }

    /// First position whose key is >= key (inclusive) or > key (exclusive).
    pub fn ceiling<C: Comparator<K>>(&self, key: &K, cmp: &C, inclusive: bool) -> Option<Pos> {
        match self.locate(key, cmp)? {
            Probe::Hit(b, i) if inclusive => Some((b, i)),
            Probe::Hit(b, i) => self.succ((b, i)),
            Probe::Miss(b, i) => {
                if i < self.b(b).kv.len() {
                    Some((b, i))
                } else {
                    self.b(b).next.map(|n| (n, 0))
                }
            }
        }
    }

    /// Last position whose key is <= key (inclusive) or < key (exclusive).
    pub fn floor<C: Comparator<K>>(&self, key: &K, cmp: &C, inclusive: bool) -> Option<Pos> {
        match self.locate(key, cmp)? {
            Probe::Hit(b, i) if inclusive => Some((b, i)),
            Probe::Hit(b, i) | Probe::Miss(b, i) => self.pred((b, i)),
        }
    }

    /// First position inside a lower bound.
    pub fn lower_pos<C: Comparator<K>>(&self, bound: Bound<&K>, cmp: &C) -> Option<Pos> {
        match bound {
            Bound::Unbounded => self.first_pos(),
            Bound::Included(k) => self.ceiling(k, cmp, true),
            Bound::Excluded(k) => self.ceiling(k, cmp, false),
        }
    }

    /// Last position inside an upper bound.
    pub fn upper_pos<C: Comparator<K>>(&self, bound: Bound<&K>, cmp: &C) -> Option<Pos> {
        match bound {
            Bound::Unbounded => self.last_pos(),
            Bound::Included(k) => self.floor(k, cmp, true),
            Bound::Excluded(k) => self.floor(k, cmp, false),
        }
    }

    // Insertion.

    /// Make the first block of an empty tree.
    pub fn new_root(&mut self, kv: (K, V)) -> Pos {
        safe_assert!(self.root.is_none());
        let id = self
            .blocks
            .insert(Block::new(GapVec::single(kv), Color::Black));
        self.root = Some(id);
        (id, 0)
    }

    /// Insert kv where [`Tree::locate`] reported `Probe::Miss(b, ix)`, returning its position.
    pub fn insert_at(&mut self, b: BlockId, ix: usize, kv: (K, V)) -> Pos {
        if !self.b(b).kv.is_full() {
            self.bm(b).kv.insert(ix, kv);
            return (b, ix);
        }
        let (prev, next) = (self.b(b).prev, self.b(b).next);
        let prev_room = prev.map_or(0, |p| self.b(p).kv.room());
        let next_room = next.map_or(0, |n| self.b(n).kv.room());
        match (prev, next) {
            (Some(p), _) if prev_room > 0 && prev_room >= next_room => {
                if ix == 0 {
                    self.bm(p).kv.push_back(kv);
                    (p, self.b(p).kv.len() - 1)
                } else {
                    let moved = self.bm(b).kv.remove(0);
                    self.bm(p).kv.push_back(moved);
                    self.bm(b).kv.insert(ix - 1, kv);
                    (b, ix - 1)
                }
            }
            (_, Some(n)) if next_room > 0 => {
                if ix == B {
                    self.bm(n).kv.push_front(kv);
                    (n, 0)
                } else {
                    let moved = self.bm(b).kv.remove(B - 1);
                    self.bm(n).kv.push_front(moved);
                    self.bm(b).kv.insert(ix, kv);
                    (b, ix)
                }
            }
            _ => self.split(b, ix, kv),
        }
    }

    /// Block b and both its neighbours are full: make a new block.
    fn split(&mut self, b: BlockId, ix: usize, kv: (K, V)) -> Pos {
        if ix == 0 {
            let n = self.attach_before(b, GapVec::single(kv));
            tracing::trace!("new block {n} before full block {b}");
            (n, 0)
        } else if ix == B {
            let n = self.attach_after(b, GapVec::single(kv));
            tracing::trace!("new block {n} after full block {b}");
            (n, 0)
        } else {
            let mid = B / 2;
            let tail = self.bm(b).kv.split_off(mid);
            let n = self.attach_after(b, tail);
            tracing::trace!("block {b} split at {mid}, upper half moved to block {n}");
            if ix <= mid {
                self.bm(b).kv.insert(ix, kv);
                (b, ix)
            } else {
                self.bm(n).kv.insert(ix - mid, kv);
                (n, ix - mid)
            }
        }
    }

    /// Append kv after every existing key.
    pub fn push_last(&mut self, kv: (K, V)) -> Pos {
        match self.last_block() {
            None => self.new_root(kv),
            Some(b) if !self.b(b).kv.is_full() => {
                self.bm(b).kv.push_back(kv);
                (b, self.b(b).kv.len() - 1)
            }
            Some(b) => (self.attach_after(b, GapVec::single(kv)), 0),
        }
    }

    /// Link a new block holding kv into the chain and tree as the in-order successor of `at`.
    fn attach_after(&mut self, at: BlockId, kv: PairVec<K, V, B>) -> BlockId {
        let next = self.b(at).next;
        let id = self.blocks.insert(Block::new(kv, Color::Red));
        self.bm(id).prev = Some(at);
        self.bm(id).next = next;
        self.bm(at).next = Some(id);
        if let Some(n) = next {
            self.bm(n).prev = Some(id);
        }
        if self.b(at).right.is_none() {
            self.bm(at).right = Some(id);
            self.bm(id).parent = Some(at);
        } else {
            // The successor is the leftmost block of at's right subtree.
            safe_assert!(next.is_some());
            if let Some(s) = next {
                safe_assert!(self.b(s).left.is_none());
                self.bm(s).left = Some(id);
                self.bm(id).parent = Some(s);
            }
        }
        self.insert_fixup(id);
        id
    }

    /// Link a new block holding kv into the chain and tree as the in-order predecessor of `at`.
    fn attach_before(&mut self, at: BlockId, kv: PairVec<K, V, B>) -> BlockId {
        let prev = self.b(at).prev;
        let id = self.blocks.insert(Block::new(kv, Color::Red));
        self.bm(id).next = Some(at);
        self.bm(id).prev = prev;
        self.bm(at).prev = Some(id);
        if let Some(p) = prev {
            self.bm(p).next = Some(id);
        }
        if self.b(at).left.is_none() {
            self.bm(at).left = Some(id);
            self.bm(id).parent = Some(at);
        } else {
            safe_assert!(prev.is_some());
            if let Some(p) = prev {
                safe_assert!(self.b(p).right.is_none());
                self.bm(p).right = Some(id);
                self.bm(id).parent = Some(p);
            }
        }
        self.insert_fixup(id);
        id
    }

    #[inline]
    fn is_red(&self, id: Option<BlockId>) -> bool {
        id.is_some_and(|id| self.b(id).color == Color::Red)
    }

    #[inline]
    fn set_color(&mut self, id: Option<BlockId>, color: Color) {
        if let Some(id) = id {
            self.bm(id).color = color;
        }
    }

    /// Make `new` take the place of child `old` under `parent` (or at the root).
    fn replace_child(&mut self, parent: Option<BlockId>, old: BlockId, new: Option<BlockId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let pb = self.bm(p);
                if pb.left == Some(old) {
                    pb.left = new;
                } else {
                    pb.right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: BlockId) {
        let Some(y) = self.b(x).right else { return };
        let yl = self.b(y).left;
        self.bm(x).right = yl;
        if let Some(yl) = yl {
            self.bm(yl).parent = Some(x);
        }
        let xp = self.b(x).parent;
        self.bm(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        self.bm(y).left = Some(x);
        self.bm(x).parent = Some(y);
    }

    fn rotate_right(&mut self, x: BlockId) {
        let Some(y) = self.b(x).left else { return };
        let yr = self.b(y).right;
        self.bm(x).left = yr;
        if let Some(yr) = yr {
            self.bm(yr).parent = Some(x);
        }
        let xp = self.b(x).parent;
        self.bm(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        self.bm(y).right = Some(x);
        self.bm(x).parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: BlockId) {
        while let Some(p) = self.b(z).parent {
            if self.b(p).color == Color::Black {
                break;
            }
            // A red block is never the root, so it has a parent.
            let Some(g) = self.b(p).parent else { break };
            if self.b(g).left == Some(p) {
                let u = self.b(g).right;
                if self.is_red(u) {
                    self.bm(p).color = Color::Black;
                    self.set_color(u, Color::Black);
                    self.bm(g).color = Color::Red;
                    z = g;
                } else {
                    let p = if self.b(p).right == Some(z) {
                        self.rotate_left(p);
                        z = p;
                        self.b(z).parent.unwrap_or(p)
                    } else {
                        p
                    };
                    self.bm(p).color = Color::Black;
                    self.bm(g).color = Color::Red;
                    self.rotate_right(g);
                }
            } else {
                let u = self.b(g).left;
                if self.is_red(u) {
                    self.bm(p).color = Color::Black;
                    self.set_color(u, Color::Black);
                    self.bm(g).color = Color::Red;
                    z = g;
                } else {
                    let p = if self.b(p).left == Some(z) {
                        self.rotate_right(p);
                        z = p;
                        self.b(z).parent.unwrap_or(p)
                    } else {
                        p
                    };
                    self.bm(p).color = Color::Black;
                    self.bm(g).color = Color::Red;
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // Removal.

    /// Remove the entry at pos, then merge or delete its block as needed.
    pub fn remove_at(&mut self, (b, i): Pos) -> (K, V) {
        let kv = self.bm(b).kv.remove(i);
        self.after_remove(b);
        kv
    }

    /// Called after entries have been taken from block b.
    fn after_remove(&mut self, b: BlockId) {
        let len = self.b(b).kv.len();
        if len == 0 {
            self.delete_block(b);
            return;
        }
        if len > Self::LOW_WATER {
            return;
        }
        let (prev, next) = (self.b(b).prev, self.b(b).next);
        let prev_room = prev.map_or(0, |p| self.b(p).kv.room());
        let next_room = next.map_or(0, |n| self.b(n).kv.room());
        match (prev, next) {
            (Some(p), _) if prev_room >= len && prev_room >= next_room => {
                let moved: ArrayVec<(K, V), B> =
                    std::iter::from_fn(|| self.bm(b).kv.pop_front()).collect();
                let to = self.bm(p);
                for kv in moved {
                    to.kv.push_back(kv);
                }
                tracing::trace!("block {b} merged into previous block {p}");
                self.delete_block(b);
            }
            (_, Some(n)) if next_room >= len => {
                let moved: ArrayVec<(K, V), B> =
                    std::iter::from_fn(|| self.bm(b).kv.pop_back()).collect();
                let to = self.bm(n);
                for kv in moved {
                    to.kv.push_front(kv);
                }
                tracing::trace!("block {b} merged into next block {n}");
                self.delete_block(b);
            }
            _ => {}
        }
    }

    /// Unlink block z from the chain and the tree and free it.
    fn delete_block(&mut self, z: BlockId) {
        let (prev, next) = (self.b(z).prev, self.b(z).next);
        if let Some(p) = prev {
            self.bm(p).next = next;
        }
        if let Some(n) = next {
            self.bm(n).prev = prev;
        }

        let (zl, zr, zp) = (self.b(z).left, self.b(z).right, self.b(z).parent);
        let mut removed_color = self.b(z).color;
        let x;
        let x_parent;
        match (zl, zr) {
            (None, _) => {
                x = zr;
                x_parent = zp;
                self.transplant(z, zr);
            }
            (Some(_), None) => {
                x = zl;
                x_parent = zp;
                self.transplant(z, zl);
            }
            (Some(zl), Some(zr)) => {
                // In-order successor, leftmost block of the right subtree.
                let mut y = zr;
                while let Some(l) = self.b(y).left {
                    y = l;
                }
                safe_assert!(next == Some(y));
                removed_color = self.b(y).color;
                x = self.b(y).right;
                if self.b(y).parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.b(y).parent;
                    self.transplant(y, x);
                    self.bm(y).right = Some(zr);
                    self.bm(zr).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.bm(y).left = Some(zl);
                self.bm(zl).parent = Some(y);
                let zc = self.b(z).color;
                self.bm(y).color = zc;
            }
        }
        self.blocks.remove(z);
        tracing::trace!("block {z} deleted");
        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
    }

    /// Replace the subtree rooted at u with the subtree rooted at v.
    fn transplant(&mut self, u: BlockId, v: Option<BlockId>) {
        let up = self.b(u).parent;
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.bm(v).parent = up;
        }
    }

    fn delete_fixup(&mut self, mut x: Option<BlockId>, mut parent: Option<BlockId>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else { break };
            if self.b(p).left == x {
                let Some(mut w) = self.b(p).right else { break };
                if self.is_red(Some(w)) {
                    self.bm(w).color = Color::Black;
                    self.bm(p).color = Color::Red;
                    self.rotate_left(p);
                    let Some(nw) = self.b(p).right else { break };
                    w = nw;
                }
                let (wl, wr) = (self.b(w).left, self.b(w).right);
                if !self.is_red(wl) && !self.is_red(wr) {
                    self.bm(w).color = Color::Red;
                    x = Some(p);
                    parent = self.b(p).parent;
                } else {
                    if !self.is_red(wr) {
                        self.set_color(wl, Color::Black);
                        self.bm(w).color = Color::Red;
                        self.rotate_right(w);
                        let Some(nw) = self.b(p).right else { break };
                        w = nw;
                    }
                    let pc = self.b(p).color;
                    self.bm(w).color = pc;
                    self.bm(p).color = Color::Black;
                    let wr = self.b(w).right;
                    self.set_color(wr, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let Some(mut w) = self.b(p).left else { break };
                if self.is_red(Some(w)) {
                    self.bm(w).color = Color::Black;
                    self.bm(p).color = Color::Red;
                    self.rotate_right(p);
                    let Some(nw) = self.b(p).left else { break };
                    w = nw;
                }
                let (wl, wr) = (self.b(w).left, self.b(w).right);
                if !self.is_red(wl) && !self.is_red(wr) {
                    self.bm(w).color = Color::Red;
                    x = Some(p);
                    parent = self.b(p).parent;
                } else {
                    if !self.is_red(wl) {
                        self.set_color(wr, Color::Black);
                        self.bm(w).color = Color::Red;
                        self.rotate_left(w);
                        let Some(nw) = self.b(p).left else { break };
                        w = nw;
                    }
                    let pc = self.b(p).color;
                    self.bm(w).color = pc;
                    self.bm(p).color = Color::Black;
                    let wl = self.b(w).left;
                    self.set_color(wl, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Remove every entry for which f returns false, visiting entries in key order.
    /// Returns the number of entries removed.
    pub fn retain<F>(&mut self, f: &mut F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        let mut id = self.first_block();
        while let Some(b) = id {
            id = self.b(b).next;
            let blk = self.bm(b);
            let before = blk.kv.len();
            blk.kv.retain_mut(|(k, v)| f(k, v));
            removed += before - blk.kv.len();
            if blk.kv.is_empty() {
                self.delete_block(b);
            }
        }
        removed
    }

    /// Verify every structural invariant, returning the number of entries.
    #[cfg(test)]
    pub fn check<C: Comparator<K>>(&self, cmp: &C) -> usize {
        let mut order = Vec::new();
        if let Some(r) = self.root {
            assert!(self.b(r).parent.is_none(), "root has parent");
            assert_eq!(self.b(r).color, Color::Black, "root is red");
            self.check_subtree(r, &mut order);
        }

        let mut chain = Vec::new();
        let (mut id, mut prev) = (self.first_block(), None);
        while let Some(b) = id {
            assert_eq!(self.b(b).prev, prev, "broken prev link");
            chain.push(b);
            prev = Some(b);
            id = self.b(b).next;
        }
        assert_eq!(order, chain, "tree order differs from chain order");
        assert_eq!(chain.len(), self.blocks.len(), "unreachable blocks");

        let mut last: Option<&K> = None;
        let mut count = 0;
        for b in chain {
            let kv = &self.b(b).kv;
            assert!(!kv.is_empty() && kv.len() <= B, "bad block size");
            for (k, _) in kv.iter() {
                if let Some(l) = last {
                    assert_eq!(cmp.compare(l, k), Ordering::Less, "keys out of order");
                }
                last = Some(k);
                count += 1;
            }
        }
        count
    }

    /// Returns black height of subtree.
    #[cfg(test)]
    fn check_subtree(&self, id: BlockId, order: &mut Vec<BlockId>) -> usize {
        let blk = self.b(id);
        let side = |child: Option<BlockId>, order: &mut Vec<BlockId>| match child {
            None => 1,
            Some(c) => {
                assert_eq!(self.b(c).parent, Some(id), "broken parent link");
                if blk.color == Color::Red {
                    assert_eq!(self.b(c).color, Color::Black, "red block has red child");
                }
                self.check_subtree(c, order)
            }
        };
        let lh = side(blk.left, order);
        order.push(id);
        let rh = side(blk.right, order);
        assert_eq!(lh, rh, "unequal black height");
        lh + usize::from(blk.color == Color::Black)
    }
}
