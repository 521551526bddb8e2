//! Real-time persistent double-ended queues.
//!
//! This module provides [`Deque`], a persistent deque whose `cons`, `snoc`,
//! `head`, `last`, `tail` and `init` all run in O(1) *worst-case* time.
//!
//! # Balance
//!
//! A deque is a front stream and a rear stream (the rear in reverse order),
//! each with a cached length and a schedule. Neither side may grow longer
//! than `BALANCE` times the other plus one. When an operation would break
//! that, the deque is split evenly: the long side keeps its first half and
//! the rest is rotated lazily onto the end of the short side, `BALANCE`
//! cells per step. Every operation forces one or two schedule cells per side,
//! which finishes each rotation before the next can start.
//!
//! ```text
//! front: [1, 2, 3]      front_len: 3
//! rear:  [6, 5, 4]      rear_len:  3    (reads 4, 5, 6 from the back)
//! ```

use std::fmt;
use std::iter::{Product, Sum};

use static_assertions::const_assert;
use tracing::trace;

use super::stream::reverse_onto;
use super::{EmptyError, PersistentList, Stream};

/// How many times longer one side may be than the other (plus one).
const BALANCE: usize = 3;

// Rotations move BALANCE cells per step; only 2 and 3 keep the two sides'
// rotations in lockstep.
const_assert!(BALANCE == 2 || BALANCE == 3);

/// A real-time persistent double-ended queue.
///
/// # Time Complexity
///
/// | Operation          | Complexity      |
/// |--------------------|-----------------|
/// | `new`              | O(1)            |
/// | `cons`, `snoc`     | O(1) worst case |
/// | `head`, `last`     | O(1) worst case |
/// | `tail`, `init`     | O(1) worst case |
/// | `len`, `is_empty`  | O(1)            |
/// | `get`              | O(n)            |
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::Deque;
///
/// let deque: Deque<i32> = (1..=5).collect();
/// assert_eq!(deque.head(), Ok(1));
/// assert_eq!(deque.last(), Ok(5));
///
/// let trimmed = deque.tail().and_then(|deque| deque.init()).unwrap();
/// assert_eq!(trimmed.to_vec(), vec![2, 3, 4]);
/// assert_eq!(deque.len(), 5); // Original unchanged
/// ```
pub struct Deque<T> {
    front: Stream<T>,
    front_len: usize,
    front_schedule: Stream<T>,
    rear: Stream<T>,
    rear_len: usize,
    rear_schedule: Stream<T>,
}

impl<T> Clone for Deque<T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            front_len: self.front_len,
            front_schedule: self.front_schedule.clone(),
            rear: self.rear.clone(),
            rear_len: self.rear_len,
            rear_schedule: self.rear_schedule.clone(),
        }
    }
}

impl<T> Deque<T> {
    /// Creates an empty deque.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            front: Stream::empty(),
            front_len: 0,
            front_schedule: Stream::empty(),
            rear: Stream::empty(),
            rear_len: 0,
            rear_schedule: Stream::empty(),
        }
    }

    /// Alias of [`Deque::new`].
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new()
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.front_len + self.rear_len
    }

    /// Returns `true` if the deque has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + 'static> Deque<T> {
    /// Rebalances if either side has outgrown the other.
    fn queue(
        front: Stream<T>,
        front_len: usize,
        front_schedule: Stream<T>,
        rear: Stream<T>,
        rear_len: usize,
        rear_schedule: Stream<T>,
    ) -> Self {
        let total = front_len + rear_len;
        if front_len > BALANCE * rear_len + 1 {
            let keep = total / 2;
            let moved = total - keep;
            trace!(front_len, rear_len, keep, moved, "deque rebalanced towards rear");
            let front_half = front.take(keep);
            let rear_rotated = rotate_drop(rear, keep, front);
            Self::balanced(front_half, keep, rear_rotated, moved)
        } else if rear_len > BALANCE * front_len + 1 {
            let keep = total / 2;
            let moved = total - keep;
            trace!(front_len, rear_len, keep, moved, "deque rebalanced towards front");
            let front_rotated = rotate_drop(front, keep, rear.clone());
            let rear_half = rear.take(keep);
            Self::balanced(front_rotated, moved, rear_half, keep)
        } else {
            Self {
                front,
                front_len,
                front_schedule,
                rear,
                rear_len,
                rear_schedule,
            }
        }
    }

    fn balanced(front: Stream<T>, front_len: usize, rear: Stream<T>, rear_len: usize) -> Self {
        Self {
            front_schedule: front.clone(),
            front,
            front_len,
            rear_schedule: rear.clone(),
            rear,
            rear_len,
        }
    }

    /// Adds an element at the front.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Deque;
    ///
    /// let deque = Deque::new().cons(2).cons(1);
    /// assert_eq!(deque.to_vec(), vec![1, 2]);
    /// ```
    #[must_use]
    pub fn cons(&self, element: T) -> Self {
        Self::queue(
            self.front.prepend(element),
            self.front_len + 1,
            exec1(&self.front_schedule),
            self.rear.clone(),
            self.rear_len,
            exec1(&self.rear_schedule),
        )
    }

    /// Adds an element at the back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Deque;
    ///
    /// let deque = Deque::new().snoc(1).snoc(2);
    /// assert_eq!(deque.to_vec(), vec![1, 2]);
    /// ```
    #[must_use]
    pub fn snoc(&self, element: T) -> Self {
        Self::queue(
            self.front.clone(),
            self.front_len,
            exec1(&self.front_schedule),
            self.rear.prepend(element),
            self.rear_len + 1,
            exec1(&self.rear_schedule),
        )
    }

    /// Returns the first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn head(&self) -> Result<T, EmptyError> {
        let side = if self.front_len == 0 {
            &self.rear
        } else {
            &self.front
        };
        first_of(side, "Deque::head")
    }

    /// Returns the last element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn last(&self) -> Result<T, EmptyError> {
        let side = if self.rear_len == 0 {
            &self.front
        } else {
            &self.rear
        };
        first_of(side, "Deque::last")
    }

    /// Returns the deque without its first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn tail(&self) -> Result<Self, EmptyError> {
        if self.is_empty() {
            return Err(EmptyError::new("Deque::tail"));
        }
        // A lone element may sit in the rear.
        let Some((_, front)) = self.front.uncons_lazy() else {
            return Ok(Self::new());
        };
        Ok(Self::queue(
            front,
            self.front_len - 1,
            exec2(&self.front_schedule),
            self.rear.clone(),
            self.rear_len,
            exec2(&self.rear_schedule),
        ))
    }

    /// Returns the deque without its last element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn init(&self) -> Result<Self, EmptyError> {
        if self.is_empty() {
            return Err(EmptyError::new("Deque::init"));
        }
        let Some((_, rear)) = self.rear.uncons_lazy() else {
            return Ok(Self::new());
        };
        Ok(Self::queue(
            self.front.clone(),
            self.front_len,
            exec2(&self.front_schedule),
            rear,
            self.rear_len - 1,
            exec2(&self.rear_schedule),
        ))
    }

    /// Returns the element at `index` from the front, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }
        if index < self.front_len {
            self.front.get(index)
        } else {
            self.rear.get(self.len() - 1 - index)
        }
    }

    /// Reduces the deque from front to back.
    pub fn fold_left<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        self.iter().fold(init, function)
    }

    /// Reduces the deque from back to front.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Deque;
    ///
    /// let deque: Deque<i32> = (1..=3).collect();
    /// let digits = deque.fold_right(String::new(), |x, accumulator| accumulator + &x.to_string());
    /// assert_eq!(digits, "321");
    /// ```
    pub fn fold_right<B, F>(&self, init: B, mut function: F) -> B
    where
        F: FnMut(T, B) -> B,
    {
        let mut accumulator = init;
        let mut current = self.clone();
        while let Ok(element) = current.last() {
            accumulator = function(element, accumulator);
            match current.init() {
                Ok(rest) => current = rest,
                Err(_) => break,
            }
        }
        accumulator
    }

    /// Left fold seeded with the first element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn fold_left1<F>(&self, function: F) -> Result<T, EmptyError>
    where
        F: FnMut(T, T) -> T,
    {
        let mut iterator = self.iter();
        let first = iterator
            .next()
            .ok_or(EmptyError::new("Deque::fold_left1"))?;
        Ok(iterator.fold(first, function))
    }

    /// Right fold seeded with the last element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Deque;
    ///
    /// let deque: Deque<i32> = (1..=3).collect();
    /// // 1 - (2 - 3)
    /// assert_eq!(deque.fold_right1(|x, accumulator| x - accumulator), Ok(2));
    /// ```
    pub fn fold_right1<F>(&self, function: F) -> Result<T, EmptyError>
    where
        F: FnMut(T, T) -> T,
    {
        let last = self.last().map_err(|_| EmptyError::new("Deque::fold_right1"))?;
        Ok(self.init()?.fold_right(last, function))
    }

    /// Returns the first element satisfying `predicate`, front to back.
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(predicate)
    }

    /// Adds up the elements.
    #[must_use]
    pub fn sum(&self) -> T
    where
        T: Sum,
    {
        self.iter().sum()
    }

    /// Multiplies the elements.
    #[must_use]
    pub fn product(&self) -> T
    where
        T: Product,
    {
        self.iter().product()
    }

    /// Collects the elements front to back into a [`PersistentList`].
    #[must_use]
    pub fn to_list(&self) -> PersistentList<T> {
        self.iter().collect()
    }

    /// Returns an iterator from front to back.
    #[must_use]
    pub fn iter(&self) -> DequeIterator<T> {
        DequeIterator {
            current: self.clone(),
        }
    }

    /// Collects the elements front to back into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

fn first_of<T: Clone + 'static>(
    side: &Stream<T>,
    operation: &'static str,
) -> Result<T, EmptyError> {
    side.uncons()
        .map(|(head, _)| head)
        .ok_or(EmptyError::new(operation))
}

/// Forces one schedule cell.
fn exec1<T: Clone + 'static>(schedule: &Stream<T>) -> Stream<T> {
    match schedule.uncons_lazy() {
        Some((_, rest)) => rest,
        None => schedule.clone(),
    }
}

/// Forces two schedule cells.
fn exec2<T: Clone + 'static>(schedule: &Stream<T>) -> Stream<T> {
    exec1(&exec1(schedule))
}

/// Computes `rear ++ reverse(front) ++ accumulator`, consuming `BALANCE`
/// cells of `front` for every cell of `rear`.
fn rotate_rev<T: Clone + 'static>(
    rear: Stream<T>,
    front: Stream<T>,
    accumulator: Stream<T>,
) -> Stream<T> {
    Stream::lazy(move || match rear.uncons_lazy() {
        None => reverse_onto(&front, usize::MAX, accumulator.clone()).1,
        Some((head, tail)) => {
            let (rest, accumulator) = reverse_onto(&front, BALANCE, accumulator.clone());
            Stream::from_parts(head, rotate_rev(tail, rest, accumulator))
        }
    })
}

/// Computes `rear ++ reverse(front.drop(skip))`, dropping `BALANCE` cells
/// of `front` for every cell of `rear` until fewer than `BALANCE` remain to
/// be skipped.
fn rotate_drop<T: Clone + 'static>(rear: Stream<T>, skip: usize, front: Stream<T>) -> Stream<T> {
    Stream::lazy(move || match rear.uncons_lazy() {
        Some((head, tail)) if skip >= BALANCE => Stream::from_parts(
            head,
            rotate_drop(tail, skip - BALANCE, front.drop_now(BALANCE)),
        ),
        _ => {
            debug_assert!(skip < BALANCE, "rotation ran out of elements to keep");
            rotate_rev(rear.clone(), front.drop_now(skip), Stream::empty())
        }
    })
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of a [`Deque`], front to back.
pub struct DequeIterator<T> {
    current: Deque<T>,
}

impl<T: Clone + 'static> Iterator for DequeIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.current.head().ok()?;
        self.current = self.current.tail().ok()?;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.current.len();
        (remaining, Some(remaining))
    }
}

impl<T: Clone + 'static> ExactSizeIterator for DequeIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for Deque<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |deque, element| deque.snoc(element))
    }
}

impl<T: Clone + 'static> IntoIterator for &Deque<T> {
    type Item = T;
    type IntoIter = DequeIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + PartialEq + 'static> PartialEq for Deque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Deque<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Deque")?;
        formatter.debug_list().entries(self.iter()).finish()
    }
}
