//! # okasaki
//!
//! Lazy evaluation and real-time persistent sequences for Rust.
//!
//! ## Overview
//!
//! Every collection in this library is persistent: operations return new
//! values and earlier versions stay valid, sharing structure with the new
//! ones. The library is built in layers:
//!
//! - **Control**: [`Promise`](control::Promise), a memoized and possibly
//!   self-referential deferred computation whose forcing is stack-safe
//! - **Persistent Data Structures**: a strict
//!   [`PersistentList`](persistent::PersistentList), the lazy
//!   [`Stream`](persistent::Stream), and the real-time
//!   [`Queue`](persistent::Queue) and [`Deque`](persistent::Deque), which
//!   schedule their lazy work so that every operation is O(1) in the worst
//!   case, not merely amortized
//!
//! ## Feature Flags
//!
//! - `control`: `Promise`
//! - `persistent`: `PersistentList`, `Stream`, `Queue`, `Deque`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use okasaki::prelude::*;
//!
//! let naturals = Stream::from_step(1, 1);
//! assert_eq!(naturals.take(5).to_vec(), vec![1, 2, 3, 4, 5]);
//!
//! let queue = Queue::new().snoc(1).snoc(2).snoc(3);
//! assert_eq!(queue.head(), Ok(1));
//! assert_eq!(queue.tail().and_then(|rest| rest.head()), Ok(2));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use okasaki::prelude::*;
/// ```
pub mod prelude {

    #[cfg(feature = "control")]
    pub use crate::control::*;

    #[cfg(feature = "persistent")]
    pub use crate::persistent::*;
}

#[cfg(feature = "control")]
pub mod control;

#[cfg(feature = "persistent")]
pub mod persistent;
