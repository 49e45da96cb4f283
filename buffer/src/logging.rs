//! Buffer lifecycle events, and the per-thread logger that receives them.
//!
//! Each successful allocation of a non-empty [`RawBuffer`](crate::RawBuffer) logs an
//! [`AllocateEvent`], and each release of one logs a [`ReleaseEvent`]. Over the life of a
//! thread the two balance, which is how tests observe that every allocation is released
//! exactly once.
//!
//! # Examples
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use dynstack_buffer::RawBuffer;
//! use dynstack_buffer::logging::{self, BufferEvent, BufferLogger, LoggerBatch};
//!
//! let live = Rc::new(Cell::new(0i64));
//! let count = Rc::clone(&live);
//! logging::register(BufferLogger::new(move |batch: LoggerBatch<'_, BufferEvent>| {
//!     if let LoggerBatch::Logs(records) = batch {
//!         for (_, event) in records {
//!             match event {
//!                 BufferEvent::Allocate(_) => count.set(count.get() + 1),
//!                 BufferEvent::Release(_) => count.set(count.get() - 1),
//!             }
//!         }
//!     }
//! }));
//!
//! drop(RawBuffer::<u8>::with_capacity(16));
//! logging::unregister();
//!
//! assert_eq!(live.get(), 0);
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

pub use dynstack_logging::{Logger, LoggerBatch};

/// Logger for buffer lifecycle events.
pub type BufferLogger = Logger<BufferEvent>;

thread_local! {
    static BUFFER_LOGGER: RefCell<Option<BufferLogger>> = const { RefCell::new(None) };
}

/// A buffer obtained an allocation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AllocateEvent {
    /// Number of element slots.
    pub capacity: usize,
    /// Size of the allocation in bytes; zero for zero-sized elements.
    pub bytes: usize,
    /// Alignment of the allocation.
    pub align: usize,
}

/// A buffer returned its allocation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ReleaseEvent {
    /// Number of element slots.
    pub capacity: usize,
    /// Size of the allocation in bytes; zero for zero-sized elements.
    pub bytes: usize,
    /// Alignment of the allocation.
    pub align: usize,
}

/// Lifecycle events of a buffer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BufferEvent {
    /// An allocation was obtained.
    Allocate(AllocateEvent),
    /// An allocation was returned.
    Release(ReleaseEvent),
}

impl From<AllocateEvent> for BufferEvent {
    fn from(v: AllocateEvent) -> BufferEvent { BufferEvent::Allocate(v) }
}

impl From<ReleaseEvent> for BufferEvent {
    fn from(v: ReleaseEvent) -> BufferEvent { BufferEvent::Release(v) }
}

/// Installs `logger` for buffers on the current thread, returning the previous one.
///
/// The logger's action runs while buffers are allocated and released. Buffers the action
/// itself allocates or releases on this thread are not logged.
pub fn register(logger: BufferLogger) -> Option<BufferLogger> {
    BUFFER_LOGGER.with(|slot| slot.borrow_mut().replace(logger))
}

/// Removes and returns the current thread's buffer logger.
///
/// Dropping the returned logger (if it is the last handle) flushes it.
pub fn unregister() -> Option<BufferLogger> {
    BUFFER_LOGGER.with(|slot| slot.borrow_mut().take())
}

/// Logs `event` to the current thread's buffer logger, if logging is enabled and a logger
/// is registered.
#[inline]
pub fn log<E: Into<BufferEvent>>(event: E) {
    if cfg!(feature = "logging") {
        // Buffers dropped by other thread-local destructors may outlive the slot.
        let _ = BUFFER_LOGGER.try_with(|slot| {
            if let Some(logger) = slot.borrow().as_ref() {
                logger.log(event);
            }
        });
    }
}
