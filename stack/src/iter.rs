//! Iterators over the live region of a [`DynamicStack`](crate::DynamicStack).
//!
//! All of them visit elements in index order, front (index 0) first. The borrowing
//! iterators are position cursors over the stack's buffer, and the borrow they hold keeps
//! the stack from reallocating underneath them.

use std::fmt;
use std::iter::FusedIterator;
use std::ptr;

use dynstack_buffer::RawBuffer;

/// Shared references to a stack's elements. Cloning restarts from the current position.
pub struct Iter<'a, T> {
    inner: std::slice::Iter<'a, T>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(slice: &'a [T]) -> Self {
        Iter { inner: slice.iter() }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &'a [T] {
        self.inner.as_slice()
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter { inner: self.inner.clone() }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> { }
impl<T> FusedIterator for Iter<'_, T> { }

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.as_slice()).finish()
    }
}

/// Mutable references to a stack's elements.
pub struct IterMut<'a, T> {
    inner: std::slice::IterMut<'a, T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        IterMut { inner: slice.iter_mut() }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> { }
impl<T> FusedIterator for IterMut<'_, T> { }

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IterMut").field(&self.inner.as_slice()).finish()
    }
}

/// Owned elements moved out of a stack.
///
/// The iterator owns the stack's buffer. Elements not yet yielded are dropped with it, and
/// the buffer is released once, after them.
pub struct IntoIter<T> {
    buffer: RawBuffer<T>,
    /// `buffer[start .. end]` holds the elements still to be yielded.
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    /// Takes ownership of `buffer`, whose first `len` slots are initialized.
    pub(crate) fn new(buffer: RawBuffer<T>, len: usize) -> Self {
        debug_assert!(len <= buffer.capacity());
        IntoIter { buffer, start: 0, end: len }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `start .. end` lies within the initialized prefix of the buffer.
        unsafe { std::slice::from_raw_parts(self.buffer.as_ptr().add(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        }
        else {
            // SAFETY: the slot is initialized and leaves the yielded range before anyone reads it again.
            let value = unsafe { self.buffer.as_ptr().add(self.start).read() };
            self.start += 1;
            Some(value)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.start;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        }
        else {
            self.end -= 1;
            // SAFETY: as in `next`, from the other end.
            Some(unsafe { self.buffer.as_ptr().add(self.end).read() })
        }
    }
}

impl<T> ExactSizeIterator for IntoIter<T> { }
impl<T> FusedIterator for IntoIter<T> { }

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.end - self.start;
        // SAFETY: exactly the unyielded elements are dropped, once; the buffer follows.
        unsafe {
            let tail = ptr::slice_from_raw_parts_mut(self.buffer.as_mut_ptr().add(self.start), remaining);
            self.start = self.end;
            ptr::drop_in_place(tail);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::DynamicStack;

    #[test]
    fn iter_is_restartable() {
        let stack = DynamicStack::from([1, 2, 3]);
        let mut iter = stack.iter();
        assert_eq!(iter.next(), Some(&1));
        let rest = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), vec![&2, &3]);
        assert_eq!(rest.as_slice(), &[2, 3]);
        assert_eq!(stack.iter().rev().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut stack = DynamicStack::from([1, 2, 3]);
        for value in stack.iter_mut() {
            *value *= 10;
        }
        assert_eq!(stack.as_slice(), &[10, 20, 30]);
        assert_eq!(stack.iter_mut().len(), 3);
    }

    #[test]
    fn into_iter_from_both_ends() {
        let stack = DynamicStack::from([String::from("a"), String::from("b"), String::from("c")]);
        let mut iter = stack.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().as_deref(), Some("c"));
        assert_eq!(iter.next().as_deref(), Some("a"));
        assert_eq!(iter.as_slice(), &[String::from("b")]);
        assert_eq!(iter.next().as_deref(), Some("b"));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn into_iter_drops_the_rest() {
        let token = Rc::new(());
        let stack: DynamicStack<Rc<()>> = (0..5).map(|_| Rc::clone(&token)).collect();
        assert_eq!(Rc::strong_count(&token), 6);
        let mut iter = stack.into_iter();
        let first = iter.next();
        drop(iter);
        assert_eq!(Rc::strong_count(&token), 2);
        drop(first);
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn empty_stack_yields_nothing() {
        let stack = DynamicStack::<u8>::new();
        assert_eq!(stack.iter().next(), None);
        assert_eq!(stack.into_iter().next(), None);
    }
}
