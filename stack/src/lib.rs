//! A growable, contiguously stored stack with value semantics.
//!
//! [`DynamicStack`] keeps its elements at indices `[0, len)` of a single owned heap
//! buffer, grows by reallocating to twice its new length, and exposes push, pop, top,
//! emplace, swap, and assignment on top of two primitives: reallocation and release.
//!
//! The [`Container`] and [`PushInto`] traits let generic code fill, read, and drain either
//! a `DynamicStack` or a `Vec`.
//!
//! # Examples
//!
//! ```
//! use dynstack::{dynstack, DynamicStack};
//!
//! let mut stack: DynamicStack<u32> = dynstack![5, 1, 6];
//! let copy = stack.clone();
//!
//! stack.push(10);
//! assert_eq!(stack.pop(), Ok(10));
//! assert_eq!(stack.top(), Ok(&5));
//!
//! assert_eq!(format!("{}", copy), "[ 5, 1, 6 ]");
//! assert_eq!(stack.iter().sum::<u32>(), 12);
//! ```

#![forbid(missing_docs)]

mod error;
pub mod iter;
pub mod stack;

pub use dynstack_buffer::{logging, AllocError};
pub use error::StackError;
pub use stack::DynamicStack;

/// Builds a [`DynamicStack`] from a literal sequence, front first, with capacity for
/// twice its length.
///
/// ```
/// use dynstack::dynstack;
///
/// let stack = dynstack![1, 2, 3];
/// assert_eq!(stack.as_slice(), &[1, 2, 3]);
/// assert_eq!(stack.capacity(), 6);
///
/// let empty: dynstack::DynamicStack<u8> = dynstack![];
/// assert_eq!(empty.capacity(), 0);
/// ```
#[macro_export]
macro_rules! dynstack {
    () => {
        $crate::DynamicStack::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::DynamicStack::from([$($item),+])
    };
}

/// A container that can reveal its contents through iterating by reference and draining.
///
/// We require [`Default`] so that a drained container can be replaced by an empty one.
pub trait Container: Default {
    /// The type of elements when reading non-destructively from the container.
    type ItemRef<'a> where Self: 'a;

    /// The type of elements when draining the container.
    type Item<'a> where Self: 'a;

    /// The number of elements in this container.
    fn len(&self) -> usize;

    /// Determine if the container contains any elements, corresponding to `len() == 0`.
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push `item` into self
    #[inline]
    fn push<T>(&mut self, item: T) where Self: PushInto<T> {
        self.push_into(item)
    }

    /// Iterator type when reading from the container.
    type Iter<'a>: Iterator<Item=Self::ItemRef<'a>> where Self: 'a;

    /// Returns an iterator that reads the contents of this container, in index order.
    fn iter(&self) -> Self::Iter<'_>;

    /// Iterator type when draining the container.
    type DrainIter<'a>: Iterator<Item=Self::Item<'a>> where Self: 'a;

    /// Returns an iterator that drains the contents of this container, in index order.
    ///
    /// The container is empty once the iterator has been dropped.
    fn drain(&mut self) -> Self::DrainIter<'_>;
}

/// A container that can absorb items of a specific type.
pub trait PushInto<T> {
    /// Push item into self.
    fn push_into(&mut self, item: T);
}

impl<T> Container for Vec<T> {
    type ItemRef<'a> = &'a T where T: 'a;
    type Item<'a> = T where T: 'a;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }

    type Iter<'a> = std::slice::Iter<'a, T> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        self.as_slice().iter()
    }

    type DrainIter<'a> = std::vec::Drain<'a, T> where Self: 'a;

    fn drain(&mut self) -> Self::DrainIter<'_> {
        self.drain(..)
    }
}

impl<T> PushInto<T> for Vec<T> {
    #[inline]
    fn push_into(&mut self, item: T) {
        self.push(item)
    }
}

impl<T: Clone> PushInto<&T> for Vec<T> {
    #[inline]
    fn push_into(&mut self, item: &T) {
        self.push(item.clone())
    }
}
