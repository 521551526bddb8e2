//! Control structures for lazy evaluation.
//!
//! This module provides the evaluation-control primitive the persistent
//! sequences are built on:
//!
//! - [`Promise`]: A memoized, possibly self-referential deferred computation
//!
//! # Examples
//!
//! ## Delayed Computation
//!
//! ```rust
//! use okasaki::control::Promise;
//!
//! let promise = Promise::delay(|| {
//!     println!("Computing...");
//!     1 + 2
//! });
//! // "Computing..." is not printed yet
//!
//! assert_eq!(promise.force(), 3);
//! // Printed once; later forces reuse the memoized value
//! assert_eq!(promise.force(), 3);
//! ```
//!
//! ## Stack-Safe Redirection Chains
//!
//! ```rust
//! use okasaki::control::Promise;
//!
//! fn countdown(n: u64) -> Promise<u64> {
//!     Promise::lazy(move || {
//!         if n == 0 {
//!             Promise::eager(0)
//!         } else {
//!             countdown(n - 1)
//!         }
//!     })
//! }
//!
//! assert_eq!(countdown(100_000).force(), 0);
//! ```

mod promise;

pub use promise::Promise;
#[cfg(feature = "persistent")]
pub(crate) use promise::{Sources, Suspension};
