//! A growable stack stored in one contiguous allocation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ptr;

use dynstack_buffer::{AllocError, RawBuffer};

use crate::error::StackError;
use crate::iter::{IntoIter, Iter, IterMut};

/// A growable stack whose elements live contiguously at indices `[0, len)` of one owned
/// heap buffer.
///
/// Growth is driven by the new logical length: whenever a push finds the buffer full, the
/// buffer is reallocated to exactly twice the new length. Construction from a sequence
/// reserves the same margin, while assignment from a sequence does not.
///
/// The two ends of the stack are not symmetric. [`pop`](Self::pop) removes the element at
/// the highest index, the one most recently pushed, while [`top`](Self::top) and
/// [`emplace`](Self::emplace) work at index 0, the front.
///
/// # Examples
///
/// ```
/// use dynstack::dynstack;
///
/// let mut stack = dynstack![5, 1, 6];
/// assert_eq!(stack.capacity(), 6);
/// assert_eq!(stack.top(), Ok(&5));
///
/// stack.push(10);
/// assert_eq!(stack.pop(), Ok(10));
/// assert_eq!(stack.top(), Ok(&5));
///
/// assert_eq!(stack.to_string(), "[ 5, 1, 6 ]");
/// ```
pub struct DynamicStack<T> {
    /// Storage; `buffer[.. len]` is initialized.
    buffer: RawBuffer<T>,
    len: usize,
}

impl<T> DynamicStack<T> {

    /// An empty stack. Does not allocate.
    pub const fn new() -> Self {
        DynamicStack {
            buffer: RawBuffer::new(),
            len: 0,
        }
    }

    /// A stack of `len` default values, with capacity for `2 * len`.
    ///
    /// ```
    /// use dynstack::DynamicStack;
    ///
    /// let stack = DynamicStack::<u32>::with_len(3);
    /// assert_eq!(stack.as_slice(), &[0, 0, 0]);
    /// assert_eq!(stack.capacity(), 6);
    /// ```
    pub fn with_len(len: usize) -> Self where T: Default {
        let mut stack = Self::reserved_for(len);
        // SAFETY: `reserved_for` provides at least `len` slots.
        unsafe { stack.fill_with(len, T::default) };
        stack
    }

    /// A stack holding clones of `items`, in order, with capacity for `2 * items.len()`.
    pub fn from_slice(items: &[T]) -> Self where T: Clone {
        let mut stack = Self::reserved_for(items.len());
        for item in items {
            // SAFETY: `reserved_for` provides at least `items.len()` slots.
            unsafe { stack.push_unchecked(item.clone()) };
        }
        stack
    }

    /// An empty stack with room for twice `len` elements.
    fn reserved_for(len: usize) -> Self {
        let capacity = Self::grown(len).unwrap_or_else(|error| error.handle());
        DynamicStack {
            buffer: RawBuffer::with_capacity(capacity),
            len: 0,
        }
    }

    /// The capacity reserved for a logical length of `len`.
    #[inline]
    fn grown(len: usize) -> Result<usize, AllocError> {
        len.checked_mul(2).ok_or(AllocError::CapacityOverflow)
    }

    /// The number of elements in the stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// The number of slots allocated; zero exactly when nothing is allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether the stack holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The largest number of elements the address space could describe.
    pub fn max_size(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => usize::MAX / size,
        }
    }

    /// Pointer to the element at index 0, or a dangling pointer if nothing is allocated.
    ///
    /// The pointer is invalidated by any operation that reallocates or releases the buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    /// The live elements, front first.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `buffer[.. len]` is initialized, and the pointer is aligned and non-null.
        unsafe { std::slice::from_raw_parts(self.buffer.as_ptr(), self.len) }
    }

    /// The live elements, front first, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, with unique access through `&mut self`.
        unsafe { std::slice::from_raw_parts_mut(self.buffer.as_mut_ptr(), self.len) }
    }

    /// Iterates over the elements in index order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.as_slice())
    }

    /// Iterates mutably over the elements in index order.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.as_mut_slice())
    }

    /// Appends `value` after the last element.
    ///
    /// When the buffer is full it is reallocated to twice the new length, so a run of
    /// pushes costs amortized O(1). Allocation failure is fatal; see [`try_push`](Self::try_push).
    pub fn push(&mut self, value: T) {
        if let Err(error) = self.try_push(value) {
            error.handle()
        }
    }

    /// Appends `value` after the last element, reporting allocation failure.
    ///
    /// On failure `value` is dropped and the stack is unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), StackError> {
        if self.len == self.capacity() {
            let len = self.len.checked_add(1).ok_or(AllocError::CapacityOverflow)?;
            self.reallocate(len, true)?;
        }
        // SAFETY: the branch above leaves room for one more element.
        unsafe { self.push_unchecked(value) };
        Ok(())
    }

    /// Removes and returns the last element, the one at index `len - 1`.
    ///
    /// The capacity is unchanged.
    pub fn pop(&mut self) -> Result<T, StackError> {
        if self.len == 0 {
            return Err(StackError::Empty { operation: "pop" });
        }
        self.len -= 1;
        // SAFETY: the slot was initialized and is no longer part of the live region.
        Ok(unsafe { self.buffer.as_ptr().add(self.len).read() })
    }

    /// The element at index 0, the front of the stack.
    ///
    /// This is not the most recently pushed element unless the stack has exactly one.
    pub fn top(&self) -> Result<&T, StackError> {
        self.as_slice().first().ok_or(StackError::Empty { operation: "top" })
    }

    /// The element at index 0, mutably.
    pub fn top_mut(&mut self) -> Result<&mut T, StackError> {
        self.as_mut_slice().first_mut().ok_or(StackError::Empty { operation: "top" })
    }

    /// Inserts `value` at index 0, moving every element one slot towards the back.
    ///
    /// Always moves into a fresh buffer of capacity `2 * (len + 1)`, so it costs O(len).
    ///
    /// ```
    /// use dynstack::dynstack;
    ///
    /// let mut stack = dynstack![1, 2];
    /// stack.emplace(0);
    /// assert_eq!(stack.as_slice(), &[0, 1, 2]);
    /// assert_eq!(stack.capacity(), 6);
    /// ```
    pub fn emplace(&mut self, value: T) {
        self.emplace_with(|| value)
    }

    /// Inserts the result of `construct` at index 0.
    ///
    /// The value is constructed before the buffer is touched, so a panic in `construct`
    /// leaves the stack as it was.
    pub fn emplace_with<F: FnOnce() -> T>(&mut self, construct: F) {
        if let Err(error) = self.try_emplace(construct()) {
            error.handle()
        }
    }

    /// Inserts `value` at index 0, reporting allocation failure.
    ///
    /// On failure `value` is dropped and the stack is unchanged.
    pub fn try_emplace(&mut self, value: T) -> Result<(), StackError> {
        let len = self.len.checked_add(1).ok_or(AllocError::CapacityOverflow)?;
        let mut fresh = RawBuffer::<T>::allocate(Self::grown(len)?)?;
        // SAFETY: `fresh` has room for `len` elements and does not overlap `self.buffer`.
        unsafe {
            fresh.as_mut_ptr().write(value);
            ptr::copy_nonoverlapping(self.buffer.as_ptr(), fresh.as_mut_ptr().add(1), self.len);
        }
        // The old elements were moved out, so the old buffer is released without dropping them.
        self.buffer = fresh;
        self.len = len;
        Ok(())
    }

    /// Exchanges contents, lengths, and buffers with `other`, without touching elements.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buffer, &mut other.buffer);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Moves the contents into a new stack, leaving `self` empty and unallocated.
    ///
    /// ```
    /// use dynstack::dynstack;
    ///
    /// let mut source = dynstack![1, 2, 3];
    /// let moved = source.take();
    /// assert_eq!(moved.as_slice(), &[1, 2, 3]);
    /// assert_eq!((source.len(), source.capacity()), (0, 0));
    /// ```
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Replaces the contents of `self` with those of `source`, leaving `source` empty.
    ///
    /// The elements of `self` are dropped and its buffer is released.
    pub fn take_from(&mut self, source: &mut Self) {
        *self = source.take();
    }

    /// Replaces the contents with clones of `items`, sizing the buffer to exactly
    /// `items.len()` unless the length is unchanged.
    pub fn assign(&mut self, items: &[T]) where T: Clone {
        self.overwrite(items, false);
    }

    /// Drops every element, keeping the buffer.
    pub fn clear(&mut self) {
        let live = ptr::slice_from_raw_parts_mut(self.buffer.as_mut_ptr(), self.len);
        self.len = 0;
        // SAFETY: the live region is dropped once and is no longer reachable.
        unsafe { ptr::drop_in_place(live) }
    }

    /// Resizes to `new_len`, filling new slots with clones of `value`.
    ///
    /// Any change of length reallocates to twice `new_len`. Shrinking keeps the first
    /// `new_len` elements and drops the rest.
    pub fn resize(&mut self, new_len: usize, value: T) where T: Clone {
        self.resize_with(new_len, || value.clone())
    }

    /// Resizes to `new_len`, filling new slots with the results of `fill`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, fill: F) {
        if let Err(error) = self.reallocate(new_len, true) {
            error.handle()
        }
        // SAFETY: `reallocate` provides at least `new_len` slots.
        unsafe { self.fill_with(new_len, fill) }
    }

    /// Reallocates for a logical length of `new_len`.
    ///
    /// Does nothing if `new_len` is the current length. Otherwise the new capacity is
    /// `2 * new_len` when `reserve_extra` is set and `new_len` when it is not, and the
    /// first `min(len, new_len)` elements move to the new buffer. Elements beyond
    /// `new_len` are dropped. On return `len` is `min(len, new_len)`, and the caller
    /// initializes any slots up to `new_len`.
    ///
    /// If the stack holds elements, the new buffer is allocated before the old one is
    /// released and failure leaves the stack untouched. An empty stack releases first, and
    /// is left unallocated on failure.
    fn reallocate(&mut self, new_len: usize, reserve_extra: bool) -> Result<(), AllocError> {
        if new_len == self.len {
            return Ok(());
        }

        let capacity = if reserve_extra { Self::grown(new_len)? } else { new_len };

        if self.len > 0 {
            let kept = self.len.min(new_len);
            let mut fresh = RawBuffer::allocate(capacity)?;
            // SAFETY: `buffer[.. kept]` is initialized, `fresh` has room for it, and they are distinct.
            unsafe { ptr::copy_nonoverlapping(self.buffer.as_ptr(), fresh.as_mut_ptr(), kept) };
            let mut stale = mem::replace(&mut self.buffer, fresh);
            let prior = mem::replace(&mut self.len, kept);
            // SAFETY: `stale[kept .. prior]` holds the truncated elements, owned by nothing else.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(stale.as_mut_ptr().add(kept), prior - kept));
            }
        }
        else {
            self.buffer.release();
            self.buffer = RawBuffer::allocate(capacity)?;
        }

        Ok(())
    }

    /// Writes `value` at index `len`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `len < capacity`.
    #[inline]
    unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        self.buffer.as_mut_ptr().add(self.len).write(value);
        self.len += 1;
    }

    /// Pushes values from `fill` until the length reaches `new_len`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `new_len <= capacity`.
    unsafe fn fill_with<F: FnMut() -> T>(&mut self, new_len: usize, mut fill: F) {
        while self.len < new_len {
            self.push_unchecked(fill());
        }
    }

    /// Clones `items` over the contents, reallocating for `items.len()` first.
    fn overwrite(&mut self, items: &[T], reserve_extra: bool) where T: Clone {
        if let Err(error) = self.reallocate(items.len(), reserve_extra) {
            error.handle()
        }
        let kept = self.len;
        self.as_mut_slice().clone_from_slice(&items[.. kept]);
        for item in &items[kept ..] {
            // SAFETY: `reallocate` provides at least `items.len()` slots.
            unsafe { self.push_unchecked(item.clone()) };
        }
    }
}

impl<T> Drop for DynamicStack<T> {
    fn drop(&mut self) {
        // The buffer itself is released by its own destructor, after the elements.
        self.clear();
    }
}

impl<T> Default for DynamicStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DynamicStack<T> {
    /// Clones the live region into a buffer of the same capacity.
    fn clone(&self) -> Self {
        let mut stack = DynamicStack {
            buffer: RawBuffer::with_capacity(self.capacity()),
            len: 0,
        };
        for item in self.iter() {
            // SAFETY: the new buffer has the capacity of `self`, which holds all of `self`.
            unsafe { stack.push_unchecked(item.clone()) };
        }
        stack
    }

    /// Reallocates to twice the length of `source` (unless the lengths match) and clones
    /// its elements in.
    fn clone_from(&mut self, source: &Self) {
        self.overwrite(source.as_slice(), true);
    }
}

impl<T> From<Vec<T>> for DynamicStack<T> {
    fn from(mut items: Vec<T>) -> Self {
        let mut stack = Self::reserved_for(items.len());
        // SAFETY: the elements move bitwise into a buffer with room for them, and `items`
        // forgets them.
        unsafe {
            let len = items.len();
            items.set_len(0);
            ptr::copy_nonoverlapping(items.as_ptr(), stack.buffer.as_mut_ptr(), len);
            stack.len = len;
        }
        stack
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicStack<T> {
    fn from(items: [T; N]) -> Self {
        Self::from(Vec::from(items))
    }
}

impl<T: Clone> From<&[T]> for DynamicStack<T> {
    fn from(items: &[T]) -> Self {
        Self::from_slice(items)
    }
}

impl<T> FromIterator<T> for DynamicStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T> Extend<T> for DynamicStack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for DynamicStack<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push(*item);
        }
    }
}

impl<T> IntoIterator for DynamicStack<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let len = mem::replace(&mut self.len, 0);
        IntoIter::new(mem::take(&mut self.buffer), len)
    }
}

impl<'a, T> IntoIterator for &'a DynamicStack<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicStack<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T: PartialEq> PartialEq for DynamicStack<T> {
    fn eq(&self, other: &Self) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

impl<T: Eq> Eq for DynamicStack<T> {}

impl<T: Hash> Hash for DynamicStack<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

/// Renders `[ e0, e1, ..., eN ]` in index order, or `[  ]` when empty.
impl<T: fmt::Display> fmt::Display for DynamicStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[ ")?;
        for (index, item) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(item, f)?;
        }
        f.write_str(" ]")
    }
}

mod serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::stack::DynamicStack;

    impl<T: Serialize> Serialize for DynamicStack<T> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            use serde::ser::SerializeSeq;
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for element in self.iter() {
                seq.serialize_element(element)?;
            }
            seq.end()
        }
    }

    impl<'de, T: Deserialize<'de>> Deserialize<'de> for DynamicStack<T> {
        /// Collects the sequence and stores it as a stack built from that sequence, with
        /// capacity for twice its length.
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            Vec::<T>::deserialize(deserializer).map(DynamicStack::from)
        }
    }
}

mod container {
    use crate::{Container, PushInto};
    use crate::iter::{IntoIter, Iter};
    use crate::stack::DynamicStack;

    impl<T> Container for DynamicStack<T> {
        type ItemRef<'a> = &'a T where Self: 'a;
        type Item<'a> = T where Self: 'a;

        fn len(&self) -> usize {
            DynamicStack::len(self)
        }

        fn is_empty(&self) -> bool {
            DynamicStack::is_empty(self)
        }

        type Iter<'a> = Iter<'a, T> where Self: 'a;

        fn iter(&self) -> Self::Iter<'_> {
            DynamicStack::iter(self)
        }

        type DrainIter<'a> = IntoIter<T> where Self: 'a;

        fn drain(&mut self) -> Self::DrainIter<'_> {
            self.take().into_iter()
        }
    }

    impl<T> PushInto<T> for DynamicStack<T> {
        #[inline]
        fn push_into(&mut self, item: T) {
            DynamicStack::push(self, item)
        }
    }

    impl<T: Clone> PushInto<&T> for DynamicStack<T> {
        #[inline]
        fn push_into(&mut self, item: &T) {
            DynamicStack::push(self, item.clone())
        }
    }

    impl<T: Clone> PushInto<&&T> for DynamicStack<T> {
        #[inline]
        fn push_into(&mut self, item: &&T) {
            self.push_into(*item)
        }
    }
}
