use std::{
    alloc,
    alloc::Layout,
    cmp::Ordering,
    fmt, mem,
    ops::{Deref, DerefMut},
    ptr,
    ptr::NonNull,
};

/// Basic vec, does not have own capacity or length, just a pointer to memory.
/// Kind-of cribbed from <https://doc.rust-lang.org/nomicon/vec/vec-final.html>.
struct BasicVec<T> {
    p: NonNull<T>,
}

unsafe impl<T: Send> Send for BasicVec<T> {}
unsafe impl<T: Sync> Sync for BasicVec<T> {}

impl<T> BasicVec<T> {
    /// Allocate memory for cap elements.
    fn alloc(cap: usize) -> Self {
        if mem::size_of::<T>() == 0 || cap == 0 {
            return Self {
                p: NonNull::dangling(),
            };
        }
        let layout = Layout::array::<T>(cap).expect("block capacity overflow");
        let p = unsafe { alloc::alloc(layout) };
        // If allocation fails, `p` will be null, in which case we abort.
        match NonNull::new(p.cast::<T>()) {
            Some(p) => Self { p },
            None => alloc::handle_alloc_error(layout),
        }
    }

    /// Get mutable raw pointer to specified element.
    /// # Safety
    /// index must be < capacity.
    #[inline]
    unsafe fn ix(&self, index: usize) -> *mut T {
        self.p.as_ptr().add(index)
    }

    /// Free memory.
    /// # Safety
    ///
    /// cap must be the capacity passed to alloc, all elements must already be dropped or moved out.
    unsafe fn free(&mut self, cap: usize) {
        if cap != 0 && mem::size_of::<T>() != 0 {
            alloc::dealloc(
                self.p.as_ptr().cast::<u8>(),
                Layout::array::<T>(cap).unwrap_unchecked(),
            );
        }
    }

    /// Set value.
    /// # Safety
    ///
    /// ix must be < capacity, and the element must be unset.
    #[inline]
    unsafe fn set(&mut self, ix: usize, elem: T) {
        ptr::write(self.ix(ix), elem);
    }

    /// Get value.
    /// # Safety
    ///
    /// ix must be less < capacity, and the element must have been set.
    #[inline]
    unsafe fn get(&mut self, ix: usize) -> T {
        ptr::read(self.ix(ix))
    }

    /// Move elements.
    /// # Safety
    ///
    /// The set status of the elements changes in the obvious way. from, to and len must be in range.
    #[inline]
    unsafe fn move_self(&mut self, from: usize, to: usize, len: usize) {
        ptr::copy(self.ix(from), self.ix(to), len);
    }

    /// Move elements from another `BasicVec`.
    /// # Safety
    ///
    /// The set status of the elements changes in the obvious way. from, to and len must be in range.
    #[inline]
    unsafe fn move_from(&mut self, from: usize, src: &mut Self, to: usize, len: usize) {
        ptr::copy_nonoverlapping(src.ix(from), self.ix(to), len);
    }
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(any(debug_assertions, not(feature = "unsafe-optim")))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        assert!($cond)
    };
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(all(not(debug_assertions), feature = "unsafe-optim"))]
macro_rules! safe_assert {
    ( $cond: expr ) => {};
}

pub(crate) use safe_assert;

/// Gap buffer with fixed capacity N.
///
/// Occupied elements live in `[left, right)`, free slots on both sides, so an insert or
/// remove only moves whichever side of the occupied range is shorter.
pub(crate) struct GapVec<T, const N: usize> {
    left: usize,
    right: usize,
    v: BasicVec<T>,
}

impl<T, const N: usize> Default for GapVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for GapVec<T, N> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(self.as_mut_slice());
            self.v.free(N);
        }
    }
}

impl<T, const N: usize> GapVec<T, N> {
    pub fn new() -> Self {
        Self {
            left: N / 2,
            right: N / 2,
            v: BasicVec::alloc(N),
        }
    }

    /// New `GapVec` holding a single element.
    pub fn single(value: T) -> Self {
        let mut result = Self::new();
        result.push_back(value);
        result
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left == self.right
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Number of free slots.
    #[inline]
    pub fn room(&self) -> usize {
        N - self.len()
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.v.ix(self.left), self.len()) }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.v.ix(self.left), self.len()) }
    }

    /// Get reference to ith occupied element.
    #[inline]
    pub fn ix(&self, ix: usize) -> &T {
        safe_assert!(ix < self.len());
        unsafe { &*self.v.ix(self.left + ix) }
    }

    /// Get mutable reference to ith occupied element.
    #[inline]
    pub fn ixm(&mut self, ix: usize) -> &mut T {
        safe_assert!(ix < self.len());
        unsafe { &mut *self.v.ix(self.left + ix) }
    }

    /// Raw pointer to ith occupied element, used by the mutable iterators.
    #[inline]
    pub fn ix_ptr(&self, ix: usize) -> *mut T {
        safe_assert!(ix < self.len());
        unsafe { self.v.ix(self.left + ix) }
    }

    /// Move the occupied range so that it starts at `start`.
    fn recentre(&mut self, start: usize) {
        let len = self.len();
        safe_assert!(start + len <= N);
        unsafe {
            self.v.move_self(self.left, start, len);
        }
        self.left = start;
        self.right = start + len;
    }

    /// Insert at position `at`, shifting whichever side is shorter.
    pub fn insert(&mut self, at: usize, value: T) {
        let len = self.len();
        safe_assert!(at <= len && len < N);
        let back = len - at;
        unsafe {
            if self.left > 0 && (at <= back || self.right == N) {
                self.v.move_self(self.left, self.left - 1, at);
                self.left -= 1;
            } else {
                self.v.move_self(self.left + at, self.left + at + 1, back);
                self.right += 1;
            }
            self.v.set(self.left + at, value);
        }
    }

    /// Remove element at position `at`, closing the gap from the shorter side.
    pub fn remove(&mut self, at: usize) -> T {
        let len = self.len();
        safe_assert!(at < len);
        unsafe {
            let result = self.v.get(self.left + at);
            if at < len - at - 1 {
                self.v.move_self(self.left, self.left + 1, at);
                self.left += 1;
            } else {
                self.v.move_self(self.left + at + 1, self.left + at, len - at - 1);
                self.right -= 1;
            }
            if self.is_empty() {
                self.left = N / 2;
                self.right = N / 2;
            }
            result
        }
    }

    pub fn push_back(&mut self, value: T) {
        safe_assert!(!self.is_full());
        if self.right == N {
            self.recentre((N - self.len()) / 2);
        }
        unsafe {
            self.v.set(self.right, value);
        }
        self.right += 1;
    }

    pub fn push_front(&mut self, value: T) {
        safe_assert!(!self.is_full());
        if self.left == 0 {
            self.recentre((N - self.len() + 1) / 2);
        }
        self.left -= 1;
        unsafe {
            self.v.set(self.left, value);
        }
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            self.right -= 1;
            Some(unsafe { self.v.get(self.right) })
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            self.left += 1;
            Some(unsafe { self.v.get(self.left - 1) })
        }
    }

    /// Split off elements `at..`, returned in a new `GapVec` centred in its buffer.
    pub fn split_off(&mut self, at: usize) -> Self {
        let len = self.len();
        safe_assert!(at <= len);
        let n = len - at;
        let mut result = Self::new();
        let start = (N - n) / 2;
        unsafe {
            result.v.move_from(self.left + at, &mut self.v, start, n);
        }
        result.left = start;
        result.right = start + n;
        self.right -= n;
        result
    }

    /// Keep only the elements for which f returns true.
    pub fn retain_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        unsafe {
            let mut i = self.left;
            let mut r = self.left;
            while i < self.right {
                if f(&mut *self.v.ix(i)) {
                    if r != i {
                        let v = self.v.get(i);
                        self.v.set(r, v);
                    }
                    r += 1;
                } else {
                    drop(self.v.get(i));
                }
                i += 1;
            }
            self.right = r;
        }
        if self.is_empty() {
            self.left = N / 2;
            self.right = N / 2;
        }
    }

    /// Binary search over the occupied range.
    pub fn search<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let (mut i, mut j) = (0, self.len());
        while i < j {
            let m = (i + j) / 2;
            match f(self.ix(m)) {
                Ordering::Equal => {
                    return Ok(m);
                }
                Ordering::Less => i = m + 1,
                Ordering::Greater => j = m,
            }
        }
        Err(i)
    }
}

impl<T, const N: usize> Deref for GapVec<T, N> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for GapVec<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> fmt::Debug for GapVec<T, N>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
