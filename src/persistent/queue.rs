//! Real-time persistent FIFO queues.
//!
//! This module provides [`Queue`], a persistent queue whose `snoc`, `head`
//! and `tail` run in O(1) *worst-case* time, and [`OutputRestrictedDeque`],
//! the same queue with an extra O(1) `cons` at the front.
//!
//! # Scheduling
//!
//! A queue keeps its front as a lazy [`Stream`] and its rear as a strict
//! [`PersistentList`] in reverse order. When the rear grows one longer than
//! the front, the two are combined by a *rotation*: a lazy stream computing
//! `front ++ reverse(rear)` one cell per force. The queue also keeps a
//! *schedule*, a suffix of the front, and forces one cell of it on every
//! operation. By the time the next rotation is due the previous one has been
//! fully paid for, so no single operation ever does more than constant work.
//!
//! ```text
//! front:    [1, 2, 3]           (lazy, partly forced)
//! rear:     [5, 4]              (strict, newest first)
//! schedule:       [3]           (len(front) - len(rear) cells)
//! ```

use std::fmt;

use tracing::trace;

use super::{EmptyError, PersistentList, Stream};

/// A real-time persistent FIFO queue.
///
/// Elements are added at the back with [`snoc`](Queue::snoc) and removed from
/// the front with [`tail`](Queue::tail). Every version stays valid and
/// versions share memoized work.
///
/// # Time Complexity
///
/// | Operation  | Complexity       |
/// |------------|------------------|
/// | `new`      | O(1)             |
/// | `snoc`     | O(1) worst case  |
/// | `head`     | O(1) worst case  |
/// | `tail`     | O(1) worst case  |
/// | `is_empty` | O(1)             |
/// | `len`      | O(n)             |
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::Queue;
///
/// let queue = Queue::new().snoc(1).snoc(2).snoc(3);
/// assert_eq!(queue.to_vec(), vec![1, 2, 3]);
///
/// let rest = queue.tail().unwrap();
/// assert_eq!(rest.head(), Ok(2));
/// assert_eq!(queue.head(), Ok(1));
/// ```
pub struct Queue<T> {
    front: Stream<T>,
    rear: PersistentList<T>,
    schedule: Stream<T>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            rear: self.rear.clone(),
            schedule: self.schedule.clone(),
        }
    }
}

impl<T> Queue<T> {
    /// Creates an empty queue.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            front: Stream::empty(),
            rear: PersistentList::new(),
            schedule: Stream::empty(),
        }
    }

    /// Alias of [`Queue::new`].
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Queue<T> {
    /// Restores the schedule invariant after one element was added to the
    /// rear or removed from the front.
    fn queue(front: Stream<T>, rear: PersistentList<T>, schedule: &Stream<T>) -> Self {
        match schedule.uncons_lazy() {
            Some((_, schedule)) => Self {
                front,
                rear,
                schedule,
            },
            None => {
                trace!(rear_len = rear.len(), "queue rotation started");
                let front = rotate(front, rear, Stream::empty());
                Self {
                    schedule: front.clone(),
                    front,
                    rear: PersistentList::new(),
                }
            }
        }
    }

    /// Returns `true` if the queue has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }

    /// Adds an element at the back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use okasaki::persistent::Queue;
    ///
    /// let queue = Queue::new().snoc("a").snoc("b");
    /// assert_eq!(queue.head(), Ok("a"));
    /// ```
    #[must_use]
    pub fn snoc(&self, element: T) -> Self {
        Self::queue(self.front.clone(), self.rear.cons(element), &self.schedule)
    }

    /// Returns the element at the front.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the queue is empty.
    pub fn head(&self) -> Result<T, EmptyError> {
        self.front
            .uncons()
            .map(|(head, _)| head)
            .ok_or(EmptyError::new("Queue::head"))
    }

    /// Returns the queue without its front element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the queue is empty.
    pub fn tail(&self) -> Result<Self, EmptyError> {
        let (_, front) = self
            .front
            .uncons_lazy()
            .ok_or(EmptyError::new("Queue::tail"))?;
        Ok(Self::queue(front, self.rear.clone(), &self.schedule))
    }

    /// Counts the elements.
    ///
    /// Forces the shape of the whole front, so this is linear.
    #[must_use]
    pub fn len(&self) -> usize {
        self.front.length() + self.rear.len()
    }

    /// Returns an iterator from front to back.
    #[must_use]
    pub fn iter(&self) -> QueueIterator<T> {
        QueueIterator {
            current: self.clone(),
        }
    }

    /// Collects the elements front to back into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// Builds `front ++ reverse(rear) ++ accumulator` one cell at a time.
///
/// Expects `rear` to hold exactly one more element than `front`.
fn rotate<T: Clone + 'static>(
    front: Stream<T>,
    rear: PersistentList<T>,
    accumulator: Stream<T>,
) -> Stream<T> {
    Stream::lazy(move || match (front.uncons_lazy(), rear.uncons()) {
        (None, Some((last, _))) => accumulator.prepend(last.clone()),
        (Some((head, front_rest)), Some((element, rear_rest))) => Stream::from_parts(
            head,
            rotate(front_rest, rear_rest, accumulator.prepend(element.clone())),
        ),
        (front_cell, None) => {
            debug_assert!(front_cell.is_none(), "rotation ran out of rear elements");
            front.append(&accumulator)
        }
    })
}

// =============================================================================
// OutputRestrictedDeque
// =============================================================================

/// A [`Queue`] that also accepts elements at the front.
///
/// Elements can enter at either end but leave only from the front.
/// [`cons`](OutputRestrictedDeque::cons) prepends to both the front and the
/// schedule, which keeps the schedule invariant without any extra work.
///
/// # Examples
///
/// ```rust
/// use okasaki::persistent::OutputRestrictedDeque;
///
/// let deque = OutputRestrictedDeque::new().snoc(2).snoc(3).cons(1);
/// assert_eq!(deque.to_vec(), vec![1, 2, 3]);
/// ```
pub struct OutputRestrictedDeque<T> {
    queue: Queue<T>,
}

impl<T> Clone for OutputRestrictedDeque<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T> OutputRestrictedDeque<T> {
    /// Creates an empty deque.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }
}

impl<T: Clone + 'static> OutputRestrictedDeque<T> {
    /// Adds an element at the front in O(1) worst-case time.
    #[must_use]
    pub fn cons(&self, element: T) -> Self {
        let Queue {
            front,
            rear,
            schedule,
        } = &self.queue;
        Self {
            queue: Queue {
                front: front.prepend(element.clone()),
                rear: rear.clone(),
                schedule: schedule.prepend(element),
            },
        }
    }

    /// Adds an element at the back.
    #[must_use]
    pub fn snoc(&self, element: T) -> Self {
        Self {
            queue: self.queue.snoc(element),
        }
    }

    /// Returns the element at the front.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn head(&self) -> Result<T, EmptyError> {
        self.queue.head()
    }

    /// Returns the deque without its front element.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyError`] if the deque is empty.
    pub fn tail(&self) -> Result<Self, EmptyError> {
        self.queue.tail().map(|queue| Self { queue })
    }

    /// Returns `true` if the deque has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Counts the elements in linear time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns an iterator from front to back.
    #[must_use]
    pub fn iter(&self) -> QueueIterator<T> {
        self.queue.iter()
    }

    /// Collects the elements front to back into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.queue.to_vec()
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of a [`Queue`], front to back.
pub struct QueueIterator<T> {
    current: Queue<T>,
}

impl<T: Clone + 'static> Iterator for QueueIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.current.head().ok()?;
        self.current = self.current.tail().ok()?;
        Some(head)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for Queue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Default for OutputRestrictedDeque<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for Queue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |queue, element| queue.snoc(element))
    }
}

impl<T: Clone + 'static> FromIterator<T> for OutputRestrictedDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl<T: Clone + 'static> IntoIterator for &Queue<T> {
    type Item = T;
    type IntoIter = QueueIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + PartialEq + 'static> PartialEq for Queue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Clone + PartialEq + 'static> PartialEq for OutputRestrictedDeque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.queue == other.queue
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Queue<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Queue")?;
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for OutputRestrictedDeque<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "OutputRestrictedDeque")?;
        formatter.debug_list().entries(self.iter()).finish()
    }
}
