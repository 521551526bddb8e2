//! Error types for the persistent sequences.

use thiserror::Error;

/// Represents an attempt to observe or remove an element of an empty
/// sequence.
///
/// Returned by `head`, `tail`, `last`, and `init` (and the folds that need
/// at least one element) of [`Stream`](super::Stream),
/// [`Queue`](super::Queue), and [`Deque`](super::Deque). The condition is
/// always detected locally, before any lazy work is done.
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::{EmptyError, Queue};
///
/// let queue: Queue<i32> = Queue::new();
/// let error = queue.head().unwrap_err();
/// assert_eq!(error, EmptyError::new("Queue::head"));
/// assert_eq!(format!("{error}"), "Queue::head: collection is empty");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{operation}: collection is empty")]
pub struct EmptyError {
    /// The operation that found the collection empty, e.g. `"Deque::last"`.
    pub operation: &'static str,
}

impl EmptyError {
    /// Creates an error for the named operation.
    #[inline]
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Stream::head")]
    #[case("Deque::init")]
    fn test_display_names_operation(#[case] operation: &'static str) {
        let error = EmptyError::new(operation);
        assert_eq!(error.to_string(), format!("{operation}: collection is empty"));
    }

    #[rstest]
    fn test_is_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(EmptyError::new("Queue::tail"));
        assert!(error.source().is_none());
    }
}
