//! Buffered, timestamped event logging.
//!
//! A [`Logger`] stamps each record with the time elapsed since the logger was created and
//! holds it in a buffer. Full buffers are handed to a user-supplied action as a
//! [`LoggerBatch::Logs`], and the action sees a final [`LoggerBatch::End`] once the last
//! handle to the logger is dropped.
//!
//! # Examples
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use dynstack_logging::{Logger, LoggerBatch};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let logger = Logger::new(move |batch: LoggerBatch<'_, &'static str>| {
//!     if let LoggerBatch::Logs(records) = batch {
//!         sink.borrow_mut().extend(records.iter().map(|(_, event)| *event));
//!     }
//! });
//!
//! logger.log("allocate");
//! logger.log("release");
//! logger.flush();
//!
//! assert_eq!(*seen.borrow(), vec!["allocate", "release"]);
//! ```

#![forbid(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Number of records a logger buffers before handing them to its action.
pub const BUFFERING_LOGGER_CAPACITY: usize = 1024;

/// Records delivered to a logger's action.
pub enum LoggerBatch<'a, E> {
    /// Timestamped records, in the order they were logged.
    Logs(&'a [(Duration, E)]),
    /// The logger is going away; no further batches follow.
    End,
}

/// A buffering logger for records of type `E`.
///
/// Handles are cheap to clone and share one buffer. The action is called from within
/// `log`, `flush`, and the drop of the last handle, and must not log back into the
/// same logger.
pub struct Logger<E> {
    inner: Rc<RefCell<LoggerInner<E>>>,
}

struct LoggerInner<E> {
    /// Base instant that record timestamps are measured from.
    time: Instant,
    /// Buffered record count that triggers a publication.
    capacity: usize,
    buffer: Vec<(Duration, E)>,
    action: Box<dyn FnMut(LoggerBatch<'_, E>)>,
}

impl<E> Logger<E> {
    /// Creates a logger that publishes every [`BUFFERING_LOGGER_CAPACITY`] records.
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(LoggerBatch<'_, E>) + 'static,
    {
        Self::with_capacity(BUFFERING_LOGGER_CAPACITY, action)
    }

    /// Creates a logger that publishes every `capacity` records.
    ///
    /// A `capacity` of zero is treated as one, publishing each record as it arrives.
    pub fn with_capacity<F>(capacity: usize, action: F) -> Self
    where
        F: FnMut(LoggerBatch<'_, E>) + 'static,
    {
        let capacity = capacity.max(1);
        Logger {
            inner: Rc::new(RefCell::new(LoggerInner {
                time: Instant::now(),
                capacity,
                buffer: Vec::with_capacity(capacity),
                action: Box::new(action),
            })),
        }
    }

    /// Adds `event` to the log.
    #[inline]
    pub fn log<T: Into<E>>(&self, event: T) {
        self.log_many(Some(event));
    }

    /// Adds a sequence of events to the log, all stamped with the same time.
    ///
    /// Events logged from within this logger's own action are discarded.
    pub fn log_many<I>(&self, events: I)
    where
        I: IntoIterator,
        I::Item: Into<E>,
    {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            return;
        };
        let elapsed = inner.time.elapsed();
        for event in events {
            inner.buffer.push((elapsed, event.into()));
            if inner.buffer.len() >= inner.capacity {
                inner.publish();
            }
        }
    }

    /// Hands any buffered records to the action. Does nothing when called from the action.
    pub fn flush(&self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.publish();
        }
    }

    /// Number of records currently buffered.
    pub fn pending(&self) -> usize {
        self.inner.borrow().buffer.len()
    }
}

impl<E> Clone for Logger<E> {
    fn clone(&self) -> Self {
        Logger {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for Logger<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Logger")
            .field("capacity", &inner.capacity)
            .field("pending", &inner.buffer.len())
            .finish()
    }
}

impl<E> LoggerInner<E> {
    fn publish(&mut self) {
        if !self.buffer.is_empty() {
            (self.action)(LoggerBatch::Logs(&self.buffer[..]));
            self.buffer.clear();
        }
    }
}

impl<E> Drop for LoggerInner<E> {
    fn drop(&mut self) {
        self.publish();
        (self.action)(LoggerBatch::End);
    }
}
