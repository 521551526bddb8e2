//! Lazy persistent sequences.
//!
//! This module provides [`Stream`], a lazy cons list built on
//! [`Promise`]. Laziness has two layers:
//!
//! - the *shape* of the stream (is there another cell?) is a promise, and
//! - the *value* of every element is its own promise.
//!
//! Constructing a stream, or deriving one with [`map`](Stream::map),
//! [`filter`](Stream::filter), [`take`](Stream::take) and friends, does no
//! work. Cells are computed one at a time as they are demanded and each is
//! computed at most once.
//!
//! # Examples
//!
//! ```rust
//! use okasaki::persistent::Stream;
//!
//! // An infinite stream of natural numbers
//! let naturals = Stream::from_step(0, 1);
//!
//! let squares_of_odds = naturals
//!     .filter(|n| n % 2 == 1)
//!     .map(|n| n * n)
//!     .take(4);
//!
//! assert_eq!(squares_of_odds.to_vec(), vec![1, 9, 25, 49]);
//! ```
//!
//! # Stack Safety
//!
//! Traversals ([`iter`](Stream::iter), the folds, equality, `drop`) and the
//! destructor are loops, not recursion, so they handle streams of any
//! length.

use std::cell::RefCell;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::Add;
use std::rc::Rc;

use super::{EmptyError, PersistentList};
use crate::control::{Promise, Sources, Suspension};

/// The forced shape of a stream.
pub(crate) enum StreamCell<T> {
    Empty,
    Pair(Promise<T>, Stream<T>),
}

impl<T> Clone for StreamCell<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Pair(head, tail) => Self::Pair(head.clone(), tail.clone()),
        }
    }
}

/// A lazy, persistent, possibly infinite sequence.
///
/// `Stream<T>` is a promise of either nothing or a pair of a head promise and
/// a tail stream. Cloning a stream is O(1) and clones share all memoized
/// work.
///
/// # Time Complexity
///
/// | Operation            | Complexity                          |
/// |----------------------|-------------------------------------|
/// | `cons`, `empty`      | O(1)                                |
/// | `head`, `tail`       | O(1) plus the cost of the suspension |
/// | `map`, `filter`, ... | O(1) to construct                   |
/// | `reverse`, `length`  | O(n), finite streams only           |
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::Stream;
///
/// let stream = Stream::cons(|| 1, || Stream::cons(|| 2, Stream::empty));
/// assert_eq!(stream.head(), Ok(1));
/// assert_eq!(stream.tail().and_then(|tail| tail.head()), Ok(2));
/// ```
pub struct Stream<T> {
    promise: Promise<StreamCell<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T> Stream<T> {
    fn from_cell(cell: StreamCell<T>) -> Self {
        Self {
            promise: Promise::eager(cell),
        }
    }

    /// Returns the empty stream.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream: Stream<i32> = Stream::empty();
    /// assert!(stream.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::from_cell(StreamCell::Empty)
    }

    /// Builds a cell from an existing head promise and tail, forcing neither.
    pub(crate) fn from_parts(head: Promise<T>, tail: Self) -> Self {
        Self::from_cell(StreamCell::Pair(head, tail))
    }

    /// Takes the forced cell out of a stream nobody else references.
    fn detach_tail(&mut self) -> Option<Self> {
        match self.promise.replace_if_unique(StreamCell::Empty)? {
            StreamCell::Pair(_, tail) => Some(tail),
            StreamCell::Empty => None,
        }
    }
}

// Unlinks uniquely owned, already forced cells one at a time so that
// dropping a long stream does not recurse once per cell.
impl<T> Drop for Stream<T> {
    fn drop(&mut self) {
        let mut next = self.detach_tail();
        while let Some(mut stream) = next {
            next = stream.detach_tail();
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Creates a stream whose first cell is computed by `thunk` on demand.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::lazy(|| Stream::cons(|| 1, Stream::empty));
    /// assert_eq!(stream.to_vec(), vec![1]);
    /// ```
    #[must_use]
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> Self + 'static,
    {
        Self::lazy_after(Sources::new(), thunk)
    }

    /// Like [`Stream::lazy`], for a thunk that captured `sources`.
    fn lazy_after<F>(sources: Sources, thunk: F) -> Self
    where
        F: Fn() -> Self + 'static,
    {
        Self {
            promise: Promise::lazy_after(sources, move |_| thunk().promise.clone()),
        }
    }

    /// Sources for a thunk whose first step forces this stream's first cell.
    fn forced_first(&self) -> Sources {
        Sources::new().forcing(self.suspension())
    }

    fn suspension(&self) -> Rc<dyn Suspension> {
        self.promise.suspension()
    }

    /// Creates a non-empty stream from a head thunk and a tail thunk.
    ///
    /// Neither thunk runs until it is needed: `head` when the first element
    /// is requested, `tail` when the rest of the stream is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::cons(|| 123, Stream::empty);
    /// assert_eq!(stream.to_vec(), vec![123]);
    /// ```
    #[must_use]
    pub fn cons<H, F>(head: H, tail: F) -> Self
    where
        H: Fn() -> T + 'static,
        F: Fn() -> Self + 'static,
    {
        Self::from_parts(Promise::delay(head), Self::lazy(tail))
    }

    /// Returns a stream with `element` in front of `self`.
    #[must_use]
    pub fn prepend(&self, element: T) -> Self {
        Self::from_parts(Promise::eager(element), self.clone())
    }

    fn cell(&self) -> StreamCell<T> {
        self.promise.force()
    }

    /// Returns `true` if the stream has no elements.
    ///
    /// Forces the first cell, but not its element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.cell(), StreamCell::Empty)
    }

    /// Splits off the first cell without forcing the element's value.
    pub(crate) fn uncons_lazy(&self) -> Option<(Promise<T>, Self)> {
        match self.cell() {
            StreamCell::Empty => None,
            StreamCell::Pair(head, tail) => Some((head, tail)),
        }
    }

    /// Returns the first element and the rest of the stream.
    #[must_use]
    pub fn uncons(&self) -> Option<(T, Self)> {
        self.uncons_lazy().map(|(head, tail)| (head.force(), tail))
    }

    /// Returns the first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    pub fn head(&self) -> Result<T, EmptyError> {
        self.uncons_lazy()
            .map(|(head, _)| head.force())
            .ok_or(EmptyError::new("Stream::head"))
    }

    /// Returns the stream without its first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    pub fn tail(&self) -> Result<Self, EmptyError> {
        self.uncons_lazy()
            .map(|(_, tail)| tail)
            .ok_or(EmptyError::new("Stream::tail"))
    }

    /// Returns the last element. Only terminates on finite streams.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    pub fn last(&self) -> Result<T, EmptyError> {
        let (mut head, mut tail) = self
            .uncons_lazy()
            .ok_or(EmptyError::new("Stream::last"))?;
        while let Some((next_head, next_tail)) = tail.uncons_lazy() {
            head = next_head;
            tail = next_tail;
        }
        Ok(head.force())
    }

    /// Returns every element but the last, lazily.
    ///
    /// Only the emptiness check happens now.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::from_slice(&[1, 2, 3]);
    /// assert_eq!(stream.init().map(|init| init.to_vec()), Ok(vec![1, 2]));
    /// ```
    pub fn init(&self) -> Result<Self, EmptyError> {
        if self.is_empty() {
            return Err(EmptyError::new("Stream::init"));
        }
        Ok(init_of(self.clone()))
    }

    /// Returns the element at `index`, or `None` past the end.
    ///
    /// Only the element at `index` is forced, not the ones before it.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.drop_now(index).uncons().map(|(head, _)| head)
    }

    /// Counts the elements. Only terminates on finite streams.
    #[must_use]
    pub fn length(&self) -> usize {
        let mut count = 0;
        let mut current = self.clone();
        while let Some((_, tail)) = current.uncons_lazy() {
            count += 1;
            current = tail;
        }
        count
    }

    /// Returns the first element satisfying `predicate`.
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(predicate)
    }

    /// Returns an iterator that forces the stream one element at a time.
    #[must_use]
    pub fn iter(&self) -> StreamIterator<T> {
        StreamIterator {
            current: self.clone(),
        }
    }

    /// Collects the elements into a `Vec`. Only terminates on finite streams.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Collects the elements into a [`PersistentList`].
    #[must_use]
    pub fn to_list(&self) -> PersistentList<T> {
        self.iter().collect()
    }

    // =========================================================================
    // Folds
    // =========================================================================

    /// Reduces the stream from left to right.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::from_slice(&[1, 2, 3]);
    /// // ((10 - 1) - 2) - 3
    /// assert_eq!(stream.fold_left(10, |accumulator, x| accumulator - x), 4);
    /// ```
    pub fn fold_left<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        self.iter().fold(init, function)
    }

    /// Reduces the stream from right to left.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::from_slice(&[1, 2, 3]);
    /// // 1 - (2 - (3 - 10))
    /// assert_eq!(stream.fold_right(10, |x, accumulator| x - accumulator), -8);
    /// ```
    pub fn fold_right<B, F>(&self, init: B, mut function: F) -> B
    where
        F: FnMut(T, B) -> B,
    {
        self.to_vec()
            .into_iter()
            .rev()
            .fold(init, |accumulator, element| function(element, accumulator))
    }

    /// Left fold seeded with the first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    pub fn fold_left1<F>(&self, function: F) -> Result<T, EmptyError>
    where
        F: FnMut(T, T) -> T,
    {
        let (head, tail) = self
            .uncons()
            .ok_or(EmptyError::new("Stream::fold_left1"))?;
        Ok(tail.fold_left(head, function))
    }

    /// Right fold seeded with the last element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the stream is empty.
    pub fn fold_right1<F>(&self, mut function: F) -> Result<T, EmptyError>
    where
        F: FnMut(T, T) -> T,
    {
        let mut elements = self.to_vec();
        let last = elements
            .pop()
            .ok_or(EmptyError::new("Stream::fold_right1"))?;
        Ok(elements
            .into_iter()
            .rev()
            .fold(last, |accumulator, element| function(element, accumulator)))
    }

    /// Adds up the elements. Only terminates on finite streams.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// assert_eq!(Stream::from_step(1, 1).take(4).sum(), 10);
    /// assert_eq!(Stream::<i32>::empty().sum(), 0);
    /// ```
    #[must_use]
    pub fn sum(&self) -> T
    where
        T: Sum,
    {
        self.iter().sum()
    }

    /// Multiplies the elements. Only terminates on finite streams.
    #[must_use]
    pub fn product(&self) -> T
    where
        T: Product,
    {
        self.iter().product()
    }

    // =========================================================================
    // Lazy Transformations
    // =========================================================================

    /// Applies `function` to every element, lazily.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let strings = Stream::from_slice(&[1, 2, 3]).map(|x| x.to_string());
    /// assert_eq!(strings.to_vec(), vec!["1", "2", "3"]);
    /// ```
    #[must_use]
    pub fn map<U, F>(&self, function: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        map_with(self.clone(), Rc::new(function))
    }

    /// Keeps the elements satisfying `predicate`, lazily.
    ///
    /// Skipping runs of rejected elements happens in a loop, so long gaps
    /// between matches are fine.
    #[must_use]
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        filter_with(self.clone(), Rc::new(predicate))
    }

    /// Returns the first `count` elements, lazily.
    #[must_use]
    pub fn take(&self, count: usize) -> Self {
        take_with(self.clone(), count)
    }

    /// Skips the first `count` elements, lazily.
    #[must_use]
    pub fn drop(&self, count: usize) -> Self {
        if count == 0 {
            return self.clone();
        }
        let stream = self.clone();
        Self::lazy_after(self.forced_first(), move || stream.drop_now(count))
    }

    /// Skips up to `count` cells right away, forcing their shape but not
    /// their elements.
    pub(crate) fn drop_now(&self, count: usize) -> Self {
        let mut current = self.clone();
        for _ in 0..count {
            match current.uncons_lazy() {
                Some((_, tail)) => current = tail,
                None => break,
            }
        }
        current
    }

    /// Returns the longest prefix whose elements satisfy `predicate`, lazily.
    #[must_use]
    pub fn take_while<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        take_while_with(self.clone(), Rc::new(predicate))
    }

    /// Skips the longest prefix whose elements satisfy `predicate`, lazily.
    #[must_use]
    pub fn drop_while<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        let stream = self.clone();
        Self::lazy_after(self.forced_first(), move || {
            let mut current = stream.clone();
            while let Some((head, tail)) = current.uncons() {
                if !predicate(&head) {
                    break;
                }
                current = tail;
            }
            current
        })
    }

    /// Combines two streams element by element, lazily.
    ///
    /// The result ends when either input ends.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let sums = Stream::from_step(1, 1).zip_with(&Stream::from_slice(&[10, 20]), |a, b| a + b);
    /// assert_eq!(sums.to_vec(), vec![11, 22]);
    /// ```
    #[must_use]
    pub fn zip_with<U, V, F>(&self, other: &Stream<U>, function: F) -> Stream<V>
    where
        U: Clone + 'static,
        V: Clone + 'static,
        F: Fn(T, U) -> V + 'static,
    {
        zip_with_with(self.clone(), other.clone(), Rc::new(function))
    }

    /// Concatenates `other` after `self`, lazily.
    ///
    /// `a + b` is the same operation.
    #[must_use]
    pub fn append(&self, other: &Self) -> Self {
        append_with(self.clone(), other.clone())
    }

    /// Inserts `separator` between adjacent elements, lazily.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::from_slice(&[1, 2, 3]).intersperse(0);
    /// assert_eq!(stream.to_vec(), vec![1, 0, 2, 0, 3]);
    /// ```
    #[must_use]
    pub fn intersperse(&self, separator: T) -> Self {
        let stream = self.clone();
        Self::lazy_after(self.forced_first(), move || match stream.uncons_lazy() {
            None => Self::empty(),
            Some((head, tail)) => Self::from_parts(head, prepend_to_all(tail, separator.clone())),
        })
    }

    /// Reverses a finite stream.
    ///
    /// The whole shape is forced right away; the elements are not, so each
    /// keeps its own suspension.
    #[must_use]
    pub fn reverse(&self) -> Self {
        reverse_onto(self, usize::MAX, Self::empty()).1
    }

    // =========================================================================
    // Generators
    // =========================================================================

    /// Builds a stream by repeatedly applying `step` to a seed, lazily.
    ///
    /// `step` returns `None` to end the stream, or the next element and the
    /// next seed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let countdown = Stream::unfoldr(3, |n| if n == 0 { None } else { Some((n, n - 1)) });
    /// assert_eq!(countdown.to_vec(), vec![3, 2, 1]);
    /// ```
    #[must_use]
    pub fn unfoldr<S, F>(seed: S, step: F) -> Self
    where
        S: Clone + 'static,
        F: Fn(S) -> Option<(T, S)> + 'static,
    {
        unfoldr_with(seed, Rc::new(step))
    }

    /// The infinite arithmetic progression `first, first + step, ...`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// assert_eq!(Stream::from_step(1, 1).take(5).to_vec(), vec![1, 2, 3, 4, 5]);
    /// assert_eq!(Stream::from_step(10, -3).take(3).to_vec(), vec![10, 7, 4]);
    /// ```
    #[must_use]
    pub fn from_step(first: T, step: T) -> Self
    where
        T: Add<Output = T>,
    {
        let next = first.clone();
        Self::from_parts(
            Promise::eager(first),
            Self::lazy(move || Self::from_step(next.clone() + step.clone(), step.clone())),
        )
    }

    /// Builds a stream that pulls from `iterator` as it is forced.
    ///
    /// Streams built from the same iterator share it, so each element goes
    /// to whichever stream forces its next cell first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let stream = Stream::from_iterator((1..).map(|n| n * n));
    /// assert_eq!(stream.take(3).to_vec(), vec![1, 4, 9]);
    /// ```
    #[must_use]
    pub fn from_iterator<I>(iterator: I) -> Self
    where
        I: Iterator<Item = T> + 'static,
    {
        pull(Rc::new(RefCell::new(iterator)))
    }

    /// Creates an already forced stream holding the elements of `slice`.
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        slice
            .iter()
            .rev()
            .fold(Self::empty(), |tail, element| tail.prepend(element.clone()))
    }
}

impl<T: Clone + 'static> Stream<Stream<T>> {
    /// Concatenates a stream of streams, lazily.
    ///
    /// Runs of empty inner streams are skipped in a loop.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let nested = Stream::from_slice(&[
    ///     Stream::from_slice(&[1, 2]),
    ///     Stream::empty(),
    ///     Stream::from_slice(&[3]),
    /// ]);
    /// assert_eq!(nested.flatten().to_vec(), vec![1, 2, 3]);
    /// ```
    #[must_use]
    pub fn flatten(&self) -> Stream<T> {
        let outer = self.clone();
        Stream::lazy_after(self.forced_first(), move || {
            let mut current = outer.clone();
            while let Some((inner, rest)) = current.uncons() {
                if let Some((head, tail)) = inner.uncons_lazy() {
                    return Stream::from_parts(head, rest.prepend(tail).flatten());
                }
                current = rest;
            }
            Stream::empty()
        })
    }

    /// Concatenates the inner streams with `separator` between each pair,
    /// lazily.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Stream;
    ///
    /// let words = Stream::from_slice(&[
    ///     Stream::from_slice(&['a', 'b']),
    ///     Stream::from_slice(&['c']),
    /// ]);
    /// let joined = words.intercalate(&Stream::from_slice(&[',', ' ']));
    /// assert_eq!(joined.to_vec(), vec!['a', 'b', ',', ' ', 'c']);
    /// ```
    #[must_use]
    pub fn intercalate(&self, separator: &Stream<T>) -> Stream<T> {
        self.intersperse(separator.clone()).flatten()
    }
}

// =============================================================================
// Suspension Builders
// =============================================================================

fn init_of<T: Clone + 'static>(stream: Stream<T>) -> Stream<T> {
    Stream::lazy_after(stream.forced_first(), move || match stream.uncons_lazy() {
        Some((head, tail)) if !tail.is_empty() => Stream::from_parts(head, init_of(tail)),
        _ => Stream::empty(),
    })
}

fn map_with<T, U, F>(stream: Stream<T>, function: Rc<F>) -> Stream<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(T) -> U + 'static,
{
    Stream::lazy_after(stream.forced_first(), move || match stream.uncons_lazy() {
        None => Stream::empty(),
        Some((head, tail)) => {
            let element_function = Rc::clone(&function);
            let sources = Sources::new().forcing(head.suspension());
            Stream::from_parts(
                Promise::delay_after(sources, move || element_function(head.force())),
                map_with(tail, Rc::clone(&function)),
            )
        }
    })
}

fn filter_with<T, P>(stream: Stream<T>, predicate: Rc<P>) -> Stream<T>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    Stream::lazy_after(stream.forced_first(), move || {
        let mut current = stream.clone();
        while let Some((head, tail)) = current.uncons() {
            if predicate(&head) {
                return Stream::from_parts(
                    Promise::eager(head),
                    filter_with(tail, Rc::clone(&predicate)),
                );
            }
            current = tail;
        }
        Stream::empty()
    })
}

fn take_with<T: Clone + 'static>(stream: Stream<T>, count: usize) -> Stream<T> {
    if count == 0 {
        return Stream::empty();
    }
    Stream::lazy_after(stream.forced_first(), move || match stream.uncons_lazy() {
        None => Stream::empty(),
        Some((head, tail)) => Stream::from_parts(head, take_with(tail, count - 1)),
    })
}

fn take_while_with<T, P>(stream: Stream<T>, predicate: Rc<P>) -> Stream<T>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    Stream::lazy_after(stream.forced_first(), move || match stream.uncons() {
        Some((head, tail)) if predicate(&head) => Stream::from_parts(
            Promise::eager(head),
            take_while_with(tail, Rc::clone(&predicate)),
        ),
        _ => Stream::empty(),
    })
}

fn zip_with_with<T, U, V, F>(left: Stream<T>, right: Stream<U>, function: Rc<F>) -> Stream<V>
where
    T: Clone + 'static,
    U: Clone + 'static,
    V: Clone + 'static,
    F: Fn(T, U) -> V + 'static,
{
    let sources = left.forced_first().forcing(right.suspension());
    Stream::lazy_after(sources, move || match (left.uncons_lazy(), right.uncons_lazy()) {
        (Some((left_head, left_tail)), Some((right_head, right_tail))) => {
            let element_function = Rc::clone(&function);
            let sources = Sources::new()
                .forcing(left_head.suspension())
                .forcing(right_head.suspension());
            Stream::from_parts(
                Promise::delay_after(sources, move || {
                    element_function(left_head.force(), right_head.force())
                }),
                zip_with_with(left_tail, right_tail, Rc::clone(&function)),
            )
        }
        _ => Stream::empty(),
    })
}

fn append_with<T: Clone + 'static>(front: Stream<T>, back: Stream<T>) -> Stream<T> {
    let sources = front.forced_first().keeping(back.suspension());
    Stream::lazy_after(sources, move || match front.uncons_lazy() {
        None => back.clone(),
        Some((head, tail)) => Stream::from_parts(head, append_with(tail, back.clone())),
    })
}

fn prepend_to_all<T: Clone + 'static>(stream: Stream<T>, separator: T) -> Stream<T> {
    Stream::lazy_after(stream.forced_first(), move || match stream.uncons_lazy() {
        None => Stream::empty(),
        Some((head, tail)) => Stream::from_parts(
            Promise::eager(separator.clone()),
            Stream::from_parts(head, prepend_to_all(tail, separator.clone())),
        ),
    })
}

fn unfoldr_with<T, S, F>(seed: S, step: Rc<F>) -> Stream<T>
where
    T: Clone + 'static,
    S: Clone + 'static,
    F: Fn(S) -> Option<(T, S)> + 'static,
{
    Stream::lazy(move || match step(seed.clone()) {
        None => Stream::empty(),
        Some((element, next)) => {
            Stream::from_parts(Promise::eager(element), unfoldr_with(next, Rc::clone(&step)))
        }
    })
}

fn pull<T, I>(source: Rc<RefCell<I>>) -> Stream<T>
where
    T: Clone + 'static,
    I: Iterator<Item = T> + 'static,
{
    Stream::lazy(move || {
        let next = source.borrow_mut().next();
        match next {
            None => Stream::empty(),
            Some(element) => Stream::from_parts(Promise::eager(element), pull(Rc::clone(&source))),
        }
    })
}

/// Moves up to `limit` cells from the front of `stream` onto `accumulator`
/// in reverse order, forcing their shape but not their elements.
///
/// Returns the rest of `stream` and the grown accumulator.
pub(crate) fn reverse_onto<T>(
    stream: &Stream<T>,
    limit: usize,
    accumulator: Stream<T>,
) -> (Stream<T>, Stream<T>)
where
    T: Clone + 'static,
{
    let mut rest = stream.clone();
    let mut accumulator = accumulator;
    let mut moved = 0;
    while moved < limit {
        let Some((head, tail)) = rest.uncons_lazy() else {
            break;
        };
        accumulator = Stream::from_parts(head, accumulator);
        rest = tail;
        moved += 1;
    }
    (rest, accumulator)
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator that forces a [`Stream`] one element at a time.
pub struct StreamIterator<T> {
    current: Stream<T>,
}

impl<T: Clone + 'static> Iterator for StreamIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.current.uncons()?;
        self.current = tail;
        Some(head)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for Stream<T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        Self::from_slice(&elements)
    }
}

impl<T: Clone + 'static> IntoIterator for Stream<T> {
    type Item = T;
    type IntoIter = StreamIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + 'static> IntoIterator for &Stream<T> {
    type Item = T;
    type IntoIter = StreamIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + 'static> Add for Stream<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.append(&other)
    }
}

/// Compares element by element, stopping at the first difference.
///
/// Comparing two equal infinite streams does not terminate.
impl<T: Clone + PartialEq + 'static> PartialEq for Stream<T> {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        loop {
            match (left.uncons(), right.uncons()) {
                (None, None) => return true,
                (Some((left_head, left_tail)), Some((right_head, right_tail))) => {
                    if left_head != right_head {
                        return false;
                    }
                    left = left_tail;
                    right = right_tail;
                }
                _ => return false,
            }
        }
    }
}

/// Shows only what has already been forced: `?` for an element not yet
/// computed and `...` for a tail not yet computed.
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::Stream;
///
/// let stream = Stream::from_iterator(vec![1, 2, 3].into_iter());
/// assert_eq!(format!("{stream:?}"), "Stream[...]");
/// assert_eq!(stream.get(1), Some(2));
/// assert_eq!(format!("{stream:?}"), "Stream[1, 2, ...]");
/// ```
impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Stream<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Stream[")?;
        let mut current = self.clone();
        let mut first = true;
        loop {
            let Some(cell) = current.promise.peek() else {
                write!(formatter, "{}...", if first { "" } else { ", " })?;
                break;
            };
            let StreamCell::Pair(head, tail) = cell else {
                break;
            };
            if !first {
                write!(formatter, ", ")?;
            }
            match head.peek() {
                Some(value) => write!(formatter, "{value:?}")?,
                None => write!(formatter, "?")?,
            }
            first = false;
            current = tail;
        }
        write!(formatter, "]")
    }
}
