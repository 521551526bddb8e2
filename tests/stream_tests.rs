#![cfg(feature = "persistent")]
//! Unit tests for Stream<T>.
//!
//! Tests cover:
//! - Construction from slices, iterators, and generators
//! - Element access and emptiness errors
//! - Folds
//! - Lazy transformations, including on infinite streams
//! - Equality and Debug formatting of partially forced streams

use okasaki::persistent::{EmptyError, Stream};
use rstest::rstest;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::IntoIter;

fn stream_of(elements: &[i32]) -> Stream<i32> {
    Stream::from_slice(elements)
}

/// A stream whose cells and elements are all still suspended.
fn suspended(elements: &[i32]) -> Stream<i32> {
    Stream::from_iterator(elements.to_vec().into_iter()).map(|x| x)
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
#[case(vec![])]
#[case(vec![1, 2, 3])]
fn from_slice_keeps_order(#[case] elements: Vec<i32>) {
    assert_eq!(Stream::from_slice(&elements).to_vec(), elements);
}

#[rstest]
fn collect_builds_stream() {
    let stream: Stream<char> = "abc".chars().collect();
    assert_eq!(stream.to_vec(), vec!['a', 'b', 'c']);
}

#[rstest]
fn streams_from_one_iterator_share_it() {
    let source = Rc::new(RefCell::new(vec![1, 2, 3, 4, 5].into_iter()));
    let pull = |source: &Rc<RefCell<IntoIter<i32>>>| {
        let source = Rc::clone(source);
        Stream::from_iterator(std::iter::from_fn(move || source.borrow_mut().next()))
    };
    let s1 = pull(&source);
    let s2 = pull(&source);

    assert_eq!(s1.head(), Ok(1));
    assert_eq!(s2.head(), Ok(2));
    assert_eq!(s1.head(), Ok(1));
    assert_eq!(s1.take(2).to_vec(), vec![1, 3]);
    assert_eq!(s2.drop(1).head(), Ok(4));
    assert_eq!(s1.to_vec(), vec![1, 3, 5]);
    assert_eq!(s2.to_vec(), vec![2, 4]);
}

#[rstest]
fn from_step_is_infinite() {
    let naturals = Stream::from_step(1_u64, 1);
    assert_eq!(naturals.get(999), Some(1000));
    assert_eq!(naturals.take(100).length(), 100);
}

#[rstest]
fn unfoldr_ends_when_step_returns_none() {
    let countdown = Stream::unfoldr(3, |n| if n == 0 { None } else { Some((n, n - 1)) });
    assert_eq!(countdown, stream_of(&[3, 2, 1]));

    let words = Stream::unfoldr(String::from("foo,bar,baz"), |rest: String| {
        if rest.is_empty() {
            return None;
        }
        match rest.split_once(',') {
            Some((word, remainder)) => Some((word.to_string(), remainder.to_string())),
            None => Some((rest, String::new())),
        }
    });
    assert_eq!(words.to_vec(), vec!["foo", "bar", "baz"]);
}

#[rstest]
fn cons_of_infinite_tail_is_lazy() {
    fn ones() -> Stream<i32> {
        Stream::cons(|| 1, ones)
    }
    assert_eq!(ones().take(3).to_vec(), vec![1, 1, 1]);
}

// =============================================================================
// Element Access
// =============================================================================

#[rstest]
fn head_and_tail_of_empty_fail() {
    let empty: Stream<i32> = Stream::empty();
    assert_eq!(empty.head(), Err(EmptyError::new("Stream::head")));
    assert_eq!(empty.tail().err(), Some(EmptyError::new("Stream::tail")));
    assert_eq!(empty.last(), Err(EmptyError::new("Stream::last")));
    assert_eq!(empty.init().err(), Some(EmptyError::new("Stream::init")));
}

#[rstest]
fn head_tail_last_init() {
    let stream = stream_of(&[1, 2, 3]);
    assert_eq!(stream.head(), Ok(1));
    assert_eq!(stream.tail().map(|tail| tail.to_vec()), Ok(vec![2, 3]));
    assert_eq!(stream.last(), Ok(3));
    assert_eq!(stream.init().map(|init| init.to_vec()), Ok(vec![1, 2]));
    assert!(stream_of(&[1]).tail().is_ok_and(|tail| tail.is_empty()));
}

#[rstest]
fn init_of_infinite_stream_is_lazy() {
    let init = Stream::from_step(0, 1).init().unwrap();
    assert_eq!(init.take(3).to_vec(), vec![0, 1, 2]);
}

#[rstest]
fn get_indexes_from_front() {
    let stream = stream_of(&[1, 2, 3, 4, 5]);
    for _ in 0..2 {
        assert_eq!(stream.get(0), Some(1));
        assert_eq!(stream.get(4), Some(5));
        assert_eq!(stream.get(5), None);
        assert_eq!(stream.get(3), Some(4));
    }
}

#[rstest]
fn is_empty_forces_shape_only() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let stream = Stream::cons(
        move || {
            counter.set(counter.get() + 1);
            1
        },
        Stream::empty,
    );
    assert!(!stream.is_empty());
    assert_eq!(calls.get(), 0);
    assert!(Stream::<i32>::empty().is_empty());
}

#[rstest]
fn length_and_find() {
    assert_eq!(stream_of(&[]).length(), 0);
    assert_eq!(stream_of(&[1, 2, 3]).length(), 3);
    assert_eq!(Stream::from_step(1, 1).find(|n| n % 7 == 0), Some(7));
    assert_eq!(stream_of(&[1, 2, 3]).find(|n| *n > 3), None);
}

#[rstest]
fn iterates_in_order() {
    let collected: Vec<i32> = stream_of(&[1, 2, 3]).into_iter().collect();
    assert_eq!(collected, vec![1, 2, 3]);
    assert_eq!(stream_of(&[]).iter().next(), None);
}

#[rstest]
fn to_list_keeps_order() {
    let list = stream_of(&[1, 2, 3]).to_list();
    assert_eq!(list.head(), Some(&1));
    assert_eq!(list.len(), 3);
}

// =============================================================================
// Folds
// =============================================================================

#[rstest]
#[case(&[], 0, 0)]
#[case(&[], 123, 123)]
#[case(&[1, 2, 3], 0, 6)]
fn folds_sum(#[case] elements: &[i32], #[case] init: i32, #[case] expected: i32) {
    let stream = stream_of(elements);
    assert_eq!(stream.fold_left(init, |accumulator, x| accumulator + x), expected);
    assert_eq!(stream.fold_right(init, |x, accumulator| x + accumulator), expected);
}

#[rstest]
fn folds_associate_correctly() {
    let stream = stream_of(&[1, 2, 3]);
    assert_eq!(stream.fold_left(10, |accumulator, x| accumulator - x), 4);
    assert_eq!(stream.fold_right(10, |x, accumulator| x - accumulator), -8);
}

#[rstest]
fn fold1_variants() {
    let empty = stream_of(&[]);
    assert_eq!(
        empty.fold_left1(|a, b| a + b),
        Err(EmptyError::new("Stream::fold_left1"))
    );
    assert_eq!(
        empty.fold_right1(|a, b| a + b),
        Err(EmptyError::new("Stream::fold_right1"))
    );

    assert_eq!(stream_of(&[1]).fold_left1(|a, b| a + b), Ok(1));
    assert_eq!(stream_of(&[1, 2, 3]).fold_left1(|a, b| a - b), Ok(-4));
    assert_eq!(stream_of(&[1, 2]).fold_right1(|a, b| a + b), Ok(3));
    assert_eq!(stream_of(&[1, 2, 3]).fold_right1(|a, b| a - b), Ok(2));
}

#[rstest]
fn fold_left_over_long_stream() {
    let total = Stream::from_step(1_u64, 1)
        .take(100_000)
        .fold_left(0, |accumulator, x| accumulator + x);
    assert_eq!(total, 5_000_050_000);
}

#[rstest]
#[case(&[], 0, 1)]
#[case(&[4], 4, 4)]
#[case(&[1, 2, 3, 4], 10, 24)]
fn sum_and_product(#[case] elements: &[i32], #[case] sum: i32, #[case] product: i32) {
    let stream = suspended(elements);
    assert_eq!(stream.sum(), sum);
    assert_eq!(stream.product(), product);
}

// =============================================================================
// Transformations
// =============================================================================

#[rstest]
fn map_converts_each_element() {
    assert_eq!(stream_of(&[]).map(|x| x.to_string()).to_vec(), Vec::<String>::new());
    assert_eq!(
        stream_of(&[1, 2, 3]).map(|x| x.to_string()).to_vec(),
        vec!["1", "2", "3"]
    );
}

#[rstest]
fn transformations_do_no_work_until_forced() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mapped = Stream::from_step(0, 1).map(move |x| {
        counter.set(counter.get() + 1);
        x * 2
    });
    let derived = mapped
        .filter(|x| x % 3 == 0)
        .take_while(|x| *x < 100)
        .drop(2)
        .zip_with(&Stream::from_step(0, 1), |a, b| a + b);
    assert_eq!(calls.get(), 0);

    assert_eq!(derived.head(), Ok(12));
    assert!(calls.get() > 0);
}

#[rstest]
#[case(&[1, 2, 3, 4, 5], vec![1, 3, 5])]
#[case(&[], vec![])]
#[case(&[2, 4], vec![])]
fn filter_keeps_matches(#[case] elements: &[i32], #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(elements).filter(|x| x % 2 == 1).to_vec(), expected);
}

#[rstest]
fn filter_skips_long_gaps() {
    let sparse = Stream::from_step(1_u64, 1).filter(|n| n % 100_000 == 0);
    assert_eq!(sparse.head(), Ok(100_000));
}

#[rstest]
#[case(&[], 1, vec![])]
#[case(&[1, 2, 3], 0, vec![])]
#[case(&[1, 2, 3], 1, vec![1])]
#[case(&[1, 2, 3], 2, vec![1, 2])]
#[case(&[1, 2, 3], 3, vec![1, 2, 3])]
#[case(&[1, 2, 3], 4, vec![1, 2, 3])]
fn take_prefix(#[case] elements: &[i32], #[case] count: usize, #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(elements).take(count).to_vec(), expected);
}

#[rstest]
#[case(&[], 1, vec![])]
#[case(&[1, 2, 3], 0, vec![1, 2, 3])]
#[case(&[1, 2, 3], 1, vec![2, 3])]
#[case(&[1, 2, 3], 2, vec![3])]
#[case(&[1, 2, 3], 3, vec![])]
#[case(&[1, 2, 3], 4, vec![])]
fn drop_prefix(#[case] elements: &[i32], #[case] count: usize, #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(elements).drop(count).to_vec(), expected);
}

#[rstest]
#[case(1, vec![])]
#[case(2, vec![1])]
#[case(3, vec![1, 2])]
#[case(4, vec![1, 2, 3])]
fn take_while_below(#[case] bound: i32, #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(&[1, 2, 3]).take_while(move |x| *x < bound).to_vec(), expected);
}

#[rstest]
#[case(1, vec![1, 2, 3])]
#[case(2, vec![2, 3])]
#[case(3, vec![3])]
#[case(4, vec![])]
fn drop_while_below(#[case] bound: i32, #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(&[1, 2, 3]).drop_while(move |x| *x < bound).to_vec(), expected);
}

#[rstest]
fn take_while_on_infinite_stream_terminates() {
    let small = Stream::from_step(1, 1).take_while(|x| *x <= 3);
    assert_eq!(small.to_vec(), vec![1, 2, 3]);
}

#[rstest]
fn zip_with_stops_at_shorter() {
    let pairs = stream_of(&[1, 2, 3]).zip_with(&Stream::from_step(10, 10), |a, b| (a, b));
    assert_eq!(pairs.to_vec(), vec![(1, 10), (2, 20), (3, 30)]);
    assert!(stream_of(&[]).zip_with(&stream_of(&[1]), |a, b| a + b).is_empty());
}

#[rstest]
#[case(&[], &[], vec![])]
#[case(&[], &[1, 2, 3], vec![1, 2, 3])]
#[case(&[1, 2, 3], &[], vec![1, 2, 3])]
#[case(&[1], &[2, 3], vec![1, 2, 3])]
#[case(&[1, 2], &[3], vec![1, 2, 3])]
fn append_concatenates(#[case] left: &[i32], #[case] right: &[i32], #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(left).append(&stream_of(right)).to_vec(), expected);
    assert_eq!((stream_of(left) + stream_of(right)).to_vec(), expected);
}

#[rstest]
fn append_to_infinite_stream_is_lazy() {
    let stream = Stream::from_step(1, 1) + stream_of(&[0]);
    assert_eq!(stream.take(3).to_vec(), vec![1, 2, 3]);
}

#[rstest]
fn flatten_concatenates_inner_streams() {
    let empty: Stream<Stream<i32>> = Stream::empty();
    assert!(empty.flatten().is_empty());

    let nested = Stream::from_slice(&[stream_of(&[1, 2]), stream_of(&[3])]);
    assert_eq!(nested.flatten(), stream_of(&[1, 2, 3]));

    let singletons = Stream::from_slice(&[stream_of(&[1]), stream_of(&[2]), stream_of(&[3])]);
    assert_eq!(singletons.flatten(), stream_of(&[1, 2, 3]));

    let deep = Stream::from_slice(&[Stream::from_slice(&[stream_of(&[1])])]);
    assert_eq!(deep.flatten(), Stream::from_slice(&[stream_of(&[1])]));
}

#[rstest]
fn flatten_of_infinite_outer_stream_is_lazy() {
    let blocks = Stream::from_step(0, 1).map(|n| stream_of(&[n, n]));
    assert_eq!(blocks.flatten().take(4).to_vec(), vec![0, 0, 1, 1]);
}

#[rstest]
#[case(&[], vec![])]
#[case(&[1], vec![1])]
#[case(&[1, 2, 3], vec![1, 0, 2, 0, 3])]
fn intersperse_separates(#[case] elements: &[i32], #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(elements).intersperse(0).to_vec(), expected);
}

#[rstest]
#[case(vec![], vec![])]
#[case(vec![vec![1, 2]], vec![1, 2])]
#[case(vec![vec![1], vec![], vec![2, 3]], vec![1, 0, 0, 0, 0, 2, 3])]
fn intercalate_joins_with_separator(#[case] blocks: Vec<Vec<i32>>, #[case] expected: Vec<i32>) {
    let nested: Stream<Stream<i32>> = blocks.iter().map(|block| stream_of(block)).collect();
    let joined = nested.intercalate(&stream_of(&[0, 0]));
    assert_eq!(joined.to_vec(), expected);
}

#[rstest]
fn intercalate_of_infinite_stream_is_lazy() {
    let blocks = Stream::from_step(1, 1).map(|n| Stream::from_step(n, 0).take(2));
    let joined = blocks.intercalate(&stream_of(&[0]));
    assert_eq!(joined.take(7).to_vec(), vec![1, 1, 0, 2, 2, 0, 3]);
}

#[rstest]
#[case(&[], vec![])]
#[case(&[1], vec![1])]
#[case(&[1, 2, 3], vec![3, 2, 1])]
fn reverse_finite(#[case] elements: &[i32], #[case] expected: Vec<i32>) {
    assert_eq!(stream_of(elements).reverse().to_vec(), expected);
}

// =============================================================================
// Equality
// =============================================================================

#[rstest]
fn equality_compares_elements() {
    assert_eq!(stream_of(&[]), stream_of(&[]));
    assert_ne!(stream_of(&[]), stream_of(&[1]));
    assert_ne!(stream_of(&[1]), stream_of(&[]));
    assert_eq!(stream_of(&[1, 2, 3]), stream_of(&[1, 2, 3]));
    assert_ne!(stream_of(&[1, 2, 3]), stream_of(&[1, 2]));
    assert_ne!(stream_of(&[1, 2, 3]), stream_of(&[1, 2, 3, 4]));
    assert_eq!(Stream::from_slice(&["foo"]), Stream::from_slice(&["foo"]));
    assert_ne!(Stream::from_slice(&["foo"]), Stream::from_slice(&["bar"]));
}

#[rstest]
fn equality_of_nested_streams() {
    let left = Stream::from_slice(&[stream_of(&[1, 2]), stream_of(&[3, 4])]);
    assert_eq!(left, Stream::from_slice(&[stream_of(&[1, 2]), stream_of(&[3, 4])]));
    assert_ne!(left, Stream::from_slice(&[stream_of(&[1, 2]), stream_of(&[3])]));
}

#[rstest]
fn finite_never_equals_infinite() {
    assert_ne!(stream_of(&[]), Stream::from_step(1, 1));
    assert_ne!(Stream::from_step(1, 1), stream_of(&[]));
    assert_ne!(stream_of(&[1]), Stream::from_step(1, 1));
    assert_ne!(Stream::from_step(1, 1), stream_of(&[1]));
}

// =============================================================================
// Debug
// =============================================================================

#[rstest]
fn debug_of_empty_stream() {
    let stream = suspended(&[]);
    assert_eq!(format!("{stream:?}"), "Stream[...]");
    assert_eq!(stream.get(0), None);
    assert_eq!(format!("{stream:?}"), "Stream[]");
}

#[rstest]
fn debug_grows_with_forcing() {
    let stream = suspended(&[1, 2, 3]);
    assert_eq!(format!("{stream:?}"), "Stream[...]");
    assert_eq!(stream.get(0), Some(1));
    assert_eq!(format!("{stream:?}"), "Stream[1, ...]");
    assert_eq!(stream.get(1), Some(2));
    assert_eq!(format!("{stream:?}"), "Stream[1, 2, ...]");
    assert_eq!(stream.get(2), Some(3));
    assert_eq!(format!("{stream:?}"), "Stream[1, 2, 3, ...]");
    assert_eq!(stream.get(3), None);
    assert_eq!(format!("{stream:?}"), "Stream[1, 2, 3]");
}

#[rstest]
fn debug_marks_unforced_elements() {
    let stream = suspended(&[1, 2, 3]);
    assert_eq!(stream.get(1), Some(2));
    assert_eq!(format!("{stream:?}"), "Stream[?, 2, ...]");
}

#[rstest]
fn debug_of_strings_and_nested_streams() {
    let strings = Stream::from_slice(&["foo"]);
    assert_eq!(format!("{strings:?}"), "Stream[\"foo\"]");

    let nested = Stream::from_slice(&[stream_of(&[1, 2]), stream_of(&[3, 4])]);
    assert_eq!(format!("{nested:?}"), "Stream[Stream[1, 2], Stream[3, 4]]");
}

// =============================================================================
// Persistence and Memory
// =============================================================================

#[rstest]
fn operations_leave_receiver_unchanged() {
    let stream = stream_of(&[1, 2, 3]);
    let _ = stream.tail();
    let _ = stream.prepend(0);
    let _ = stream.map(|x| x + 1).to_vec();
    assert_eq!(stream.to_vec(), vec![1, 2, 3]);
}

#[rstest]
fn long_forced_stream_drops_without_overflow() {
    let stream: Stream<u32> = (0..300_000).collect();
    assert_eq!(stream.last(), Ok(299_999));
    drop(stream);
}

// =============================================================================
// Deep Nesting
// =============================================================================

/// Runs `test` on a thread with a 2 MiB stack.
fn on_small_stack<F>(test: F)
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(test)
        .unwrap()
        .join()
        .unwrap();
}

#[rstest]
fn chained_drops_force_without_overflow() {
    on_small_stack(|| {
        let mut stream = Stream::from_step(0_u64, 1);
        for _ in 0..50_000 {
            stream = stream.drop(1);
        }
        assert_eq!(stream.head(), Ok(50_000));
    });
}

#[rstest]
fn left_nested_appends_force_without_overflow() {
    on_small_stack(|| {
        let mut stream = Stream::empty();
        for element in 0..100_000_u32 {
            stream = stream + Stream::from_slice(&[element]);
        }
        assert_eq!(stream.head(), Ok(0));
        assert_eq!(stream.get(3), Some(3));
    });
}

#[rstest]
fn nested_maps_force_without_overflow() {
    on_small_stack(|| {
        let mut stream = Stream::from_step(0_u64, 1);
        for _ in 0..50_000 {
            stream = stream.map(|x| x + 1);
        }
        assert_eq!(stream.head(), Ok(50_000));
        assert_eq!(stream.get(1), Some(50_001));
    });
}

#[rstest]
fn chained_zips_force_without_overflow() {
    on_small_stack(|| {
        let ones = Stream::from_iterator(std::iter::repeat(1_u64));
        let mut stream = Stream::from_step(0_u64, 1);
        for _ in 0..20_000 {
            stream = ones.zip_with(&stream, |a, b| a + b);
        }
        assert_eq!(stream.head(), Ok(20_000));
    });
}

#[rstest]
fn unforced_chain_drops_without_overflow() {
    on_small_stack(|| {
        let mut stream = Stream::from_step(0_u64, 1);
        for _ in 0..100_000 {
            stream = stream.filter(|x| x % 2 == 0).take(1_000);
        }
        drop(stream);
    });
}

#[rstest]
fn nested_derivations_keep_results() {
    let mut stream = Stream::from_step(0_i64, 1);
    for _ in 0..1_000 {
        stream = stream.map(|x| x * 2).drop(1).take(10);
    }
    assert_eq!(stream.length(), 0);

    let mut stream = stream_of(&[1, 2, 3]);
    for _ in 0..1_000 {
        stream = stream.map(|x| x + 1).filter(|_| true);
    }
    assert_eq!(stream.to_vec(), vec![1_001, 1_002, 1_003]);
}
