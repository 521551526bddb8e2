//! Persistent (immutable) sequences with lazy, amortization-free operations.
//!
//! This module provides the sequences built on [`Promise`](crate::control::Promise):
//!
//! - [`PersistentList`]: Strict persistent singly-linked list
//! - [`Stream`]: Lazy persistent cons stream, possibly infinite
//! - [`Queue`]: Real-time FIFO queue with O(1) worst-case operations
//! - [`OutputRestrictedDeque`]: [`Queue`] that also accepts elements at the front
//! - [`Deque`]: Real-time double-ended queue with O(1) worst-case operations
//!
//! # Structural Sharing
//!
//! Every operation returns a new version and leaves its receiver untouched.
//! Versions share structure, and they share memoized suspensions too: work
//! forced through one version is never repeated by another.
//!
//! # Examples
//!
//! ## `Stream`
//!
//! ```rust
//! use okasaki::persistent::Stream;
//!
//! let evens = Stream::from_step(0, 2);
//! assert_eq!(evens.take(4).to_vec(), vec![0, 2, 4, 6]);
//! ```
//!
//! ## `Queue`
//!
//! ```rust
//! use okasaki::persistent::Queue;
//!
//! let queue = Queue::new().snoc(1).snoc(2).snoc(3);
//! let rest = queue.tail().unwrap();
//!
//! assert_eq!(queue.head(), Ok(1)); // Original unchanged
//! assert_eq!(rest.head(), Ok(2));  // New version
//! ```
//!
//! ## `Deque`
//!
//! ```rust
//! use okasaki::persistent::Deque;
//!
//! let deque = Deque::new().cons(2).cons(1).snoc(3);
//! assert_eq!(deque.head(), Ok(1));
//! assert_eq!(deque.last(), Ok(3));
//! assert_eq!(deque.init().unwrap().to_vec(), vec![1, 2]);
//! ```
//!
//! # Errors
//!
//! Observing or removing an element of an empty sequence returns
//! [`EmptyError`] instead of panicking.

mod deque;
mod error;
mod list;
mod queue;
mod stream;

pub use deque::Deque;
pub use deque::DequeIterator;
pub use error::EmptyError;
pub use list::PersistentList;
pub use list::PersistentListIntoIterator;
pub use list::PersistentListIterator;
pub use queue::OutputRestrictedDeque;
pub use queue::Queue;
pub use queue::QueueIterator;
pub use stream::Stream;
pub use stream::StreamIterator;
