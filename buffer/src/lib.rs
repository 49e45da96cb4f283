//! A single-owner heap array, with less convenience than `Vec` and more visibility.
//!
//! [`RawBuffer`] owns one allocation of `capacity` slots of `T` and nothing else: it does
//! not know which slots hold live values, and never runs their destructors. Its owner
//! tracks the initialized region and is responsible for dropping it before the buffer
//! is released. Every allocation and release is reported to the thread's buffer logger,
//! see [`logging`].
//!
//! # Examples
//!
//! ```
//! use dynstack_buffer::RawBuffer;
//!
//! let mut buffer = RawBuffer::<u64>::with_capacity(4);
//! assert_eq!(buffer.capacity(), 4);
//!
//! unsafe {
//!     buffer.as_mut_ptr().write(7);
//!     assert_eq!(buffer.as_ptr().read(), 7);
//! }
//!
//! buffer.release();
//! assert!(!buffer.is_allocated());
//! assert_eq!(buffer.capacity(), 0);
//! ```
#![forbid(missing_docs)]

pub mod logging;

pub use raw::{AllocError, RawBuffer};

/// Owned, uninitialized storage for a fixed number of elements.
pub mod raw {

    use std::alloc::{self, Layout};
    use std::fmt;
    use std::marker::PhantomData;
    use std::ptr::NonNull;

    use crate::logging::{self, AllocateEvent, ReleaseEvent};

    /// Reasons a buffer could not be allocated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AllocError {
        /// The requested capacity does not fit in the address space.
        CapacityOverflow,
        /// The global allocator could not provide `layout`.
        Exhausted {
            /// The layout that was requested.
            layout: Layout,
        },
    }

    impl AllocError {
        /// Treats the error as fatal.
        ///
        /// Overflow panics, and exhaustion goes to [`std::alloc::handle_alloc_error`], which
        /// aborts the process by default.
        #[cold]
        pub fn handle(self) -> ! {
            match self {
                AllocError::CapacityOverflow => panic!("capacity overflow"),
                AllocError::Exhausted { layout } => alloc::handle_alloc_error(layout),
            }
        }
    }

    impl fmt::Display for AllocError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                AllocError::CapacityOverflow => f.write_str("capacity overflow"),
                AllocError::Exhausted { layout } => {
                    write!(f, "memory allocation of {} bytes failed", layout.size())
                }
            }
        }
    }

    impl std::error::Error for AllocError { }

    /// A heap allocation of `capacity` slots of `T`.
    ///
    /// An instance of this type contends that `ptr` is valid for reads and writes of
    /// `capacity` elements whenever `capacity` is non-zero, and that no other owner of the
    /// allocation exists. A zero capacity means nothing is allocated and `ptr` dangles.
    pub struct RawBuffer<T> {
        /// Start of the allocation, or dangling when unallocated.
        ptr: NonNull<T>,
        /// Number of slots in the allocation.
        capacity: usize,
        _marker: PhantomData<T>,
    }

    // The buffer owns its slots the way a `Box<[T]>` would.
    unsafe impl<T: Send> Send for RawBuffer<T> { }
    unsafe impl<T: Sync> Sync for RawBuffer<T> { }

    impl<T> RawBuffer<T> {

        /// An unallocated buffer.
        pub const fn new() -> Self {
            RawBuffer {
                ptr: NonNull::dangling(),
                capacity: 0,
                _marker: PhantomData,
            }
        }

        /// Allocates room for exactly `capacity` elements.
        ///
        /// A `capacity` of zero allocates nothing. Zero-sized `T` never touch the allocator
        /// but still count as allocated for any non-zero capacity.
        pub fn allocate(capacity: usize) -> Result<Self, AllocError> {
            if capacity == 0 {
                return Ok(Self::new());
            }

            let layout = Self::layout(capacity)?;
            let ptr = if layout.size() == 0 {
                NonNull::dangling()
            }
            else {
                // SAFETY: `layout` has a non-zero size.
                let raw = unsafe { alloc::alloc(layout) };
                NonNull::new(raw.cast::<T>()).ok_or(AllocError::Exhausted { layout })?
            };

            logging::log(AllocateEvent {
                capacity,
                bytes: layout.size(),
                align: layout.align(),
            });

            Ok(RawBuffer {
                ptr,
                capacity,
                _marker: PhantomData,
            })
        }

        /// Allocates room for exactly `capacity` elements, treating failure as fatal.
        pub fn with_capacity(capacity: usize) -> Self {
            Self::allocate(capacity).unwrap_or_else(|error| error.handle())
        }

        /// The layout of an allocation holding `capacity` elements.
        pub fn layout(capacity: usize) -> Result<Layout, AllocError> {
            Layout::array::<T>(capacity).map_err(|_| AllocError::CapacityOverflow)
        }

        /// The number of slots in the allocation.
        #[inline(always)]
        pub fn capacity(&self) -> usize {
            self.capacity
        }

        /// Whether the buffer currently owns an allocation.
        #[inline(always)]
        pub fn is_allocated(&self) -> bool {
            self.capacity > 0
        }

        /// Pointer to the first slot. Dangling, but aligned, when unallocated.
        #[inline(always)]
        pub fn as_ptr(&self) -> *const T {
            self.ptr.as_ptr()
        }

        /// Mutable pointer to the first slot. Dangling, but aligned, when unallocated.
        #[inline(always)]
        pub fn as_mut_ptr(&mut self) -> *mut T {
            self.ptr.as_ptr()
        }

        /// Returns the allocation to the global allocator and resets to unallocated.
        ///
        /// Values still stored in the slots are forgotten, not dropped.
        pub fn release(&mut self) {
            if self.capacity == 0 {
                return;
            }

            // SAFETY: the same computation succeeded in `allocate` for this capacity.
            let layout = unsafe {
                Layout::from_size_align_unchecked(
                    std::mem::size_of::<T>() * self.capacity,
                    std::mem::align_of::<T>(),
                )
            };
            if layout.size() != 0 {
                // SAFETY: `ptr` came from `alloc::alloc` with this layout and is released once.
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) }
            }

            logging::log(ReleaseEvent {
                capacity: self.capacity,
                bytes: layout.size(),
                align: layout.align(),
            });

            self.ptr = NonNull::dangling();
            self.capacity = 0;
        }
    }

    impl<T> Default for RawBuffer<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> Drop for RawBuffer<T> {
        fn drop(&mut self) {
            self.release();
        }
    }

    impl<T> fmt::Debug for RawBuffer<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RawBuffer")
                .field("ptr", &self.ptr)
                .field("capacity", &self.capacity)
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_unallocated() {
        let buffer = RawBuffer::<String>::allocate(0).unwrap();
        assert!(!buffer.is_allocated());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn slots_are_writable() {
        let mut buffer = RawBuffer::<String>::with_capacity(3);
        assert!(buffer.is_allocated());
        unsafe {
            for index in 0..3 {
                buffer.as_mut_ptr().add(index).write(index.to_string());
            }
            let values: Vec<String> = (0..3).map(|index| buffer.as_ptr().add(index).read()).collect();
            assert_eq!(values, vec!["0", "1", "2"]);
        }
    }

    #[test]
    fn release_is_idempotent() {
        let mut buffer = RawBuffer::<u32>::with_capacity(8);
        buffer.release();
        buffer.release();
        assert!(!buffer.is_allocated());
    }

    #[test]
    fn zero_sized_elements() {
        let buffer = RawBuffer::<()>::with_capacity(usize::MAX);
        assert!(buffer.is_allocated());
        assert_eq!(buffer.capacity(), usize::MAX);
    }

    #[test]
    fn overflow_is_reported() {
        let error = RawBuffer::<u64>::allocate(usize::MAX).unwrap_err();
        assert_eq!(error, AllocError::CapacityOverflow);
        assert_eq!(error.to_string(), "capacity overflow");
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn overflow_is_fatal() {
        let _ = RawBuffer::<u64>::with_capacity(usize::MAX);
    }
}
