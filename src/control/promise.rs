//! Memoized deferred computations.
//!
//! This module provides the [`Promise<T>`] type, the evaluation primitive
//! every lazy structure in this crate is built on. A promise is either
//! *lazy*, holding a thunk that produces another promise, or *eager*,
//! holding its final value. Forcing a lazy promise runs the thunk and
//! memoizes the result so the work is paid for only once.
//!
//! # Redirection
//!
//! A thunk returns a *promise*, not a value. When it does, the forced
//! promise adopts the returned promise's state and the returned promise is
//! redirected to share the forced promise's cell. Long chains of promises
//! that hand off to one another therefore collapse into a single cell, and
//! [`Promise::force`] walks them with a loop instead of recursion:
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
//! // Ten thousand redirections, no stack growth
//! assert_eq!(countdown(10_000).force(), 0);
//! ```
//!
//! # Self-Reference
//!
//! [`Promise::delay_recursive`] and [`Promise::lazy_recursive`] hand the
//! thunk a handle to the promise being forced, so a thunk may force its own
//! promise before it has produced a value. The nested force runs the thunk
//! again; whichever invocation finishes first fixes the value.
//!
//! ```rust
//! use okasaki::control::Promise;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let count = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&count);
//! let promise = Promise::delay_recursive(move |this| {
//!     counter.set(counter.get() + 1);
//!     if counter.get() > 5 {
//!         counter.get()
//!     } else {
//!         this.force()
//!     }
//! });
//!
//! assert_eq!(promise.force(), 6);
//! assert_eq!(promise.force(), 6);
//! assert_eq!(count.get(), 6);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// A thunk receives the promise being forced so that it may refer to it.
type Thunk<T> = Rc<dyn Fn(&Promise<T>) -> Promise<T>>;

/// A memo cell. Several promises may share one cell after redirection.
type Memo<T> = Rc<RefCell<PromiseState<T>>>;

enum PromiseState<T> {
    /// Not yet forced. The thunk can be invoked more than once only through
    /// re-entrant forcing.
    Lazy(Thunk<T>, Sources),
    /// Forced. Never changes again.
    Eager(T),
}

impl<T: Clone> Clone for PromiseState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Lazy(thunk, sources) => Self::Lazy(Rc::clone(thunk), sources.clone()),
            Self::Eager(value) => Self::Eager(value.clone()),
        }
    }
}

// =============================================================================
// Suspensions
// =============================================================================

/// A promise with its value type erased.
///
/// Derived lazy structures register the promises their thunks capture as
/// [`Sources`], and forcing and dropping walk those through this trait.
pub(crate) trait Suspension {
    /// Address shared by every clone of the promise.
    fn identity(&self) -> usize;

    fn is_pending(&self) -> bool;

    /// The sources a pending thunk forces before doing anything else.
    fn forced_sources(&self) -> Vec<Rc<dyn Suspension>>;

    /// Forces the promise without reading its value.
    fn settle(&self);
}

/// The promises captured by a lazy thunk.
///
/// Sources registered with [`forcing`](Sources::forcing) are forced before
/// the thunk runs, deepest first, so a thunk never finds a long chain of
/// pending promises beneath it. Every source, forced or only kept, is
/// released through a queue when the thunk is dropped, so dropping a long
/// chain of unforced promises does not recurse either.
#[derive(Clone, Default)]
pub(crate) struct Sources {
    handles: Vec<Rc<dyn Suspension>>,
    forced: usize,
}

impl Sources {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a source the thunk forces first.
    #[must_use]
    pub(crate) fn forcing(mut self, source: Rc<dyn Suspension>) -> Self {
        self.handles.insert(self.forced, source);
        self.forced += 1;
        self
    }

    /// Registers a source the thunk keeps but may never force.
    #[must_use]
    pub(crate) fn keeping(mut self, source: Rc<dyn Suspension>) -> Self {
        self.handles.push(source);
        self
    }

    fn forced(&self) -> &[Rc<dyn Suspension>] {
        &self.handles[..self.forced]
    }

    fn pending(&self) -> Vec<Rc<dyn Suspension>> {
        self.forced()
            .iter()
            .filter(|source| source.is_pending())
            .cloned()
            .collect()
    }
}

impl Drop for Sources {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.handles));
    }
}

/// Forces `roots` and everything they wait on, innermost first.
fn settle(roots: Vec<Rc<dyn Suspension>>) {
    let mut seen = HashSet::new();
    let mut stack = roots;
    let mut order = Vec::new();
    while let Some(suspension) = stack.pop() {
        if suspension.is_pending() && seen.insert(suspension.identity()) {
            stack.extend(suspension.forced_sources());
            order.push(suspension);
        }
    }
    if order.len() > 1 {
        trace!(depth = order.len(), "settling nested sources");
    }
    for suspension in order.into_iter().rev() {
        suspension.settle();
    }
}

thread_local! {
    /// Sources waiting to be dropped by the outermost `release`.
    static RELEASED: RefCell<Vec<Rc<dyn Suspension>>> = const { RefCell::new(Vec::new()) };

    static RELEASING: Cell<bool> = const { Cell::new(false) };
}

/// Resets the release flag even if a destructor panics.
struct ReleaseGuard;

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let _ = RELEASING.try_with(|releasing| releasing.set(false));
    }
}

/// Drops `handles` in a loop instead of through nested destructors.
///
/// Nested calls only queue their handles; the outermost call drains the
/// queue. During thread teardown the handles are dropped in place.
fn release(handles: Vec<Rc<dyn Suspension>>) {
    if handles.is_empty() {
        return;
    }
    if RELEASED
        .try_with(move |released| released.borrow_mut().extend(handles))
        .is_err()
    {
        return;
    }
    if RELEASING
        .try_with(|releasing| releasing.replace(true))
        .unwrap_or(true)
    {
        return;
    }
    let _guard = ReleaseGuard;
    while let Some(handle) = RELEASED
        .try_with(|released| released.borrow_mut().pop())
        .ok()
        .flatten()
    {
        drop(handle);
    }
}

// =============================================================================
// Promise
// =============================================================================

/// A memoized, possibly self-referential deferred computation.
///
/// `Promise<T>` defers a computation until [`force`](Promise::force) is
/// called, then caches the result. Cloning a promise is cheap and the clones
/// share the cache: forcing any of them forces all of them.
///
/// # Construction
///
/// | Constructor                 | Thunk type                       |
/// |-----------------------------|----------------------------------|
/// | [`Promise::eager`]          | none, already forced             |
/// | [`Promise::delay`]          | `Fn() -> T`                      |
/// | [`Promise::lazy`]           | `Fn() -> Promise<T>`             |
/// | [`Promise::delay_recursive`]| `Fn(&Promise<T>) -> T`           |
/// | [`Promise::lazy_recursive`] | `Fn(&Promise<T>) -> Promise<T>`  |
///
/// # Failure
///
/// A panic inside a thunk propagates to the caller of `force`. The promise
/// stays lazy, so a later `force` runs the thunk again.
///
/// # Thread Safety
///
/// This type is NOT thread-safe: it is built on `Rc` and `RefCell` and is
/// neither `Send` nor `Sync`.
///
/// # Examples
///
/// ```rust
/// use okasaki::control::Promise;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let call_count = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&call_count);
/// let promise = Promise::delay(move || {
///     counter.set(counter.get() + 1);
///     42
/// });
///
/// assert_eq!(call_count.get(), 0); // Not called yet
/// assert_eq!(promise.force(), 42);
/// assert_eq!(promise.force(), 42);
/// assert_eq!(call_count.get(), 1); // Memoized
/// ```
pub struct Promise<T> {
    cell: Rc<RefCell<Memo<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> Promise<T> {
    fn from_state(state: PromiseState<T>) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Rc::new(RefCell::new(state)))),
        }
    }

    /// Creates a promise that is already forced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::control::Promise;
    ///
    /// let promise = Promise::eager(123);
    /// assert!(promise.is_eager());
    /// assert_eq!(promise.force(), 123);
    /// ```
    #[inline]
    #[must_use]
    pub fn eager(value: T) -> Self {
        Self::from_state(PromiseState::Eager(value))
    }

    /// Returns the memo cell this promise currently points at.
    fn current(&self) -> Memo<T> {
        Rc::clone(&self.cell.borrow())
    }

    fn redirect(&self, cell: Memo<T>) {
        *self.cell.borrow_mut() = cell;
    }

    /// Returns whether the promise has been forced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::control::Promise;
    ///
    /// let promise = Promise::delay(|| 1);
    /// assert!(!promise.is_eager());
    /// promise.force();
    /// assert!(promise.is_eager());
    /// ```
    #[must_use]
    pub fn is_eager(&self) -> bool {
        matches!(*self.current().borrow(), PromiseState::Eager(_))
    }

    /// Returns whether the promise has not been forced yet.
    #[inline]
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        !self.is_eager()
    }

    /// Swaps the forced value out for `placeholder` when nothing else can
    /// observe this promise.
    ///
    /// Returns `None` (and leaves the promise alone) if the promise or its
    /// cell is shared, or if it has not been forced.
    pub(crate) fn replace_if_unique(&mut self, placeholder: T) -> Option<T> {
        let cell = Rc::get_mut(&mut self.cell)?.get_mut();
        match Rc::get_mut(cell)?.get_mut() {
            PromiseState::Eager(value) => Some(std::mem::replace(value, placeholder)),
            PromiseState::Lazy(..) => None,
        }
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Creates a lazy promise whose thunk produces another promise.
    ///
    /// This is the primitive constructor. When forced, the promise adopts the
    /// state of the promise returned by `thunk`, and forcing continues from
    /// there.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::control::Promise;
    ///
    /// let inner = Promise::delay(|| 7);
    /// let outer = Promise::lazy(move || inner.clone());
    /// assert_eq!(outer.force(), 7);
    /// ```
    #[must_use]
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> Self + 'static,
    {
        Self::lazy_recursive(move |_| thunk())
    }

    /// Creates a lazy promise whose thunk may refer to the promise itself.
    ///
    /// The thunk receives a handle to the promise being forced.
    #[must_use]
    pub fn lazy_recursive<F>(thunk: F) -> Self
    where
        F: Fn(&Self) -> Self + 'static,
    {
        Self::lazy_after(Sources::new(), thunk)
    }

    /// Creates a lazy promise whose thunk captured `sources`.
    pub(crate) fn lazy_after<F>(sources: Sources, thunk: F) -> Self
    where
        F: Fn(&Self) -> Self + 'static,
    {
        Self::from_state(PromiseState::Lazy(Rc::new(thunk), sources))
    }

    /// Creates a lazy promise whose thunk produces the value directly.
    ///
    /// `Promise::delay(f)` is equivalent to
    /// `Promise::lazy(move || Promise::eager(f()))`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::control::Promise;
    ///
    /// let promise = Promise::delay(|| "hello".len());
    /// assert_eq!(promise.force(), 5);
    /// ```
    #[must_use]
    pub fn delay<F>(thunk: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::delay_after(Sources::new(), thunk)
    }

    /// Creates a delayed promise whose thunk captured `sources`.
    pub(crate) fn delay_after<F>(sources: Sources, thunk: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::lazy_after(sources, move |_| Self::eager(thunk()))
    }

    /// Creates a delayed promise whose thunk may force the promise itself.
    #[must_use]
    pub fn delay_recursive<F>(thunk: F) -> Self
    where
        F: Fn(&Self) -> T + 'static,
    {
        Self::lazy_recursive(move |this| Self::eager(thunk(this)))
    }

    /// Returns a type-erased handle to this promise.
    pub(crate) fn suspension(&self) -> Rc<dyn Suspension> {
        Rc::new(self.clone())
    }

    /// Forces the promise and returns its value.
    ///
    /// If the promise is eager, the cached value is returned. Otherwise the
    /// thunk is invoked. If the promise is still lazy when the thunk returns
    /// (a re-entrant force may have settled it in the meantime), this
    /// promise's cell takes over the returned promise's state and the
    /// returned promise is redirected to this cell. The loop then continues
    /// with the adopted state, so arbitrarily long chains run in constant
    /// stack space.
    ///
    /// # Panics
    ///
    /// Propagates any panic raised by a thunk. The promise is not poisoned.
    pub fn force(&self) -> T {
        self.resolve(T::clone)
    }

    fn resolve<R>(&self, read: impl Fn(&T) -> R) -> R {
        loop {
            let cell = self.current();
            let (thunk, pending) = match &*cell.borrow() {
                PromiseState::Eager(value) => return read(value),
                PromiseState::Lazy(thunk, sources) => (Rc::clone(thunk), sources.pending()),
            };
            if !pending.is_empty() {
                settle(pending);
            }

            let promise = thunk(self);

            let cell = self.current();
            let still_lazy = matches!(*cell.borrow(), PromiseState::Lazy(..));
            if still_lazy {
                let source = promise.current();
                if !Rc::ptr_eq(&source, &cell) {
                    let adopted = source.borrow().clone();
                    *cell.borrow_mut() = adopted;
                    promise.redirect(Rc::clone(&cell));
                    trace!("promise redirected");
                }
            }
        }
    }

    /// Returns the value if the promise has already been forced.
    ///
    /// Never runs a thunk.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::control::Promise;
    ///
    /// let promise = Promise::delay(|| 42);
    /// assert_eq!(promise.peek(), None);
    /// promise.force();
    /// assert_eq!(promise.peek(), Some(42));
    /// ```
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        match &*self.current().borrow() {
            PromiseState::Eager(value) => Some(value.clone()),
            PromiseState::Lazy(..) => None,
        }
    }
}

impl<T: Clone + 'static> Suspension for Promise<T> {
    fn identity(&self) -> usize {
        Rc::as_ptr(&self.cell).addr()
    }

    fn is_pending(&self) -> bool {
        self.is_lazy()
    }

    fn forced_sources(&self) -> Vec<Rc<dyn Suspension>> {
        match &*self.current().borrow() {
            PromiseState::Lazy(_, sources) => sources.forced().to_vec(),
            PromiseState::Eager(_) => Vec::new(),
        }
    }

    fn settle(&self) {
        self.resolve(|_| ());
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.current();
        let state = cell.borrow();
        match &*state {
            PromiseState::Eager(value) => formatter.debug_tuple("Promise").field(value).finish(),
            PromiseState::Lazy(..) => formatter.debug_tuple("Promise").field(&"<lazy>").finish(),
        }
    }
}

static_assertions::assert_not_impl_any!(Promise<i32>: Send, Sync);
