//! Errors reported by stack operations.

use std::fmt;

use dynstack_buffer::AllocError;

/// Failure of a stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// The operation needs at least one element, and the stack has none.
    Empty {
        /// Name of the operation that was attempted.
        operation: &'static str,
    },
    /// Storage for the operation could not be allocated.
    Alloc(AllocError),
}

impl StackError {
    /// Treats the error as fatal, panicking or aborting as appropriate.
    #[cold]
    pub fn handle(self) -> ! {
        match self {
            StackError::Empty { operation } => panic!("{}", StackError::Empty { operation }),
            StackError::Alloc(error) => error.handle(),
        }
    }
}

impl From<AllocError> for StackError {
    fn from(error: AllocError) -> Self {
        StackError::Alloc(error)
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Empty { operation } => write!(f, "tried calling {}() on an empty stack", operation),
            StackError::Alloc(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StackError::Empty { .. } => None,
            StackError::Alloc(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(StackError::Empty { operation: "pop" }.to_string(), "tried calling pop() on an empty stack");
        assert_eq!(StackError::from(AllocError::CapacityOverflow).to_string(), "capacity overflow");
    }

    #[test]
    fn source_is_the_allocation_error() {
        use std::error::Error;
        let error = StackError::from(AllocError::CapacityOverflow);
        assert!(error.source().is_some());
        assert!(StackError::Empty { operation: "top" }.source().is_none());
    }

    #[test]
    #[should_panic(expected = "tried calling top() on an empty stack")]
    fn empty_is_fatal_when_handled() {
        StackError::Empty { operation: "top" }.handle();
    }
}
