use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::block_on;
use mockall::predicate;
use rebind::{
	auto_bind, invert, ArrayChange, Binding, Error, EventKind, Listen, Observable, ReactiveArray,
	SortFn, Splice, Subscription,
};

use mock::Spy;

type Log<T> = Rc<RefCell<Vec<(EventKind, ArrayChange<T>)>>>;

fn record<T: Clone + 'static>(array: &ReactiveArray<T>) -> (Log<T>, [Subscription; 2]) {
	let log: Log<T> = Default::default();
	let changing = array.on_changing({
		let log = log.clone();
		move |event| log.borrow_mut().push((event.kind(), event.change().clone()))
	});
	let changed = array.on_changed({
		let log = log.clone();
		move |event| log.borrow_mut().push((event.kind(), event.change().clone()))
	});
	(log, [changing, changed])
}

fn splice<T>(index: usize, new_items: Vec<T>, old_items: Vec<T>) -> ArrayChange<T> {
	ArrayChange::Splice(Splice {
		index,
		new_items,
		old_items,
	})
}

fn changed<T: Clone>(log: &Log<T>) -> Vec<ArrayChange<T>> {
	log.borrow()
		.iter()
		.filter(|(kind, _)| *kind == EventKind::Changed)
		.map(|(_, change)| change.clone())
		.collect()
}

#[test]
fn push_describes_appended_items() {
	mock::init_tracing();

	let array = ReactiveArray::new(vec![1, 2]);
	let (log, _subs) = record(&array);

	assert_eq!(array.push([3, 4]), Ok(4));
	assert_eq!(array.get(), vec![1, 2, 3, 4]);
	assert_eq!(
		*log.borrow(),
		vec![
			(EventKind::Changing, splice(2, vec![3, 4], vec![])),
			(EventKind::Changed, splice(2, vec![3, 4], vec![])),
		]
	);
}

#[test]
fn pop_and_shift() {
	let array = ReactiveArray::new(vec!["a", "b", "c"]);
	let (log, _subs) = record(&array);

	assert_eq!(array.pop(), Ok(Some("c")));
	assert_eq!(array.shift(), Ok(Some("a")));
	assert_eq!(array.get(), vec!["b"]);
	assert_eq!(
		changed(&log),
		vec![splice(2, vec![], vec!["c"]), splice(0, vec![], vec!["a"])]
	);
}

#[test]
fn empty_mutations_send_nothing() {
	let array: ReactiveArray<i64> = ReactiveArray::default();
	let mock = mock::SharedMock::new();

	let _changing = array.on_changing({
		let mock = mock.clone();
		move |_| mock.get().changing(0)
	});
	mock.get().expect_changing().times(0).return_const(());

	assert_eq!(array.pop(), Ok(None));
	assert_eq!(array.shift(), Ok(None));
	assert_eq!(array.push([]), Ok(0));
	assert_eq!(array.splice(0, Some(0), []), Ok(vec![]));
	assert_eq!(array.fill(1, None, None), Ok(()));

	mock.get().checkpoint();
}

#[test]
fn unshift_inserts_at_the_front() {
	let array = ReactiveArray::new(vec![3]);
	let (log, _subs) = record(&array);

	assert_eq!(array.unshift([1, 2]), Ok(3));
	assert_eq!(array.get(), vec![1, 2, 3]);
	assert_eq!(changed(&log), vec![splice(0, vec![1, 2], vec![])]);
}

#[test]
fn splice_removes_and_inserts() {
	let array = ReactiveArray::new(vec!["x", "y", "z"]);
	let (log, _subs) = record(&array);

	assert_eq!(array.splice(1, Some(1), []), Ok(vec!["y"]));
	assert_eq!(array.get(), vec!["x", "z"]);
	assert_eq!(changed(&log), vec![splice(1, vec![], vec!["y"])]);

	assert_eq!(array.splice(1, None, ["q", "r"]), Ok(vec!["z"]));
	assert_eq!(array.get(), vec!["x", "q", "r"]);
}

#[test]
fn splice_with_negative_start() {
	let array = ReactiveArray::new(vec![1, 2, 3, 4]);
	let (log, _subs) = record(&array);

	assert_eq!(array.splice(-2, Some(1), [9]), Ok(vec![3]));
	assert_eq!(array.get(), vec![1, 2, 9, 4]);
	assert_eq!(changed(&log), vec![splice(2, vec![9], vec![3])]);

	assert_eq!(array.splice(-10, Some(1), []), Ok(vec![1]));
	assert_eq!(array.get(), vec![2, 9, 4]);
}

#[test]
fn insert_remove_and_bounds() {
	let array = ReactiveArray::new(vec![1, 3]);

	array.insert(1, 2).unwrap();
	assert_eq!(array.get(), vec![1, 2, 3]);
	assert_eq!(array.insert(5, 0), Err(Error::OutOfBounds { index: 5, len: 3 }));

	assert_eq!(array.remove(0), Ok(1));
	assert_eq!(array.remove(7), Err(Error::OutOfBounds { index: 7, len: 2 }));
	assert_eq!(array.at(1), Some(3));
	assert_eq!(array.len(), 2);
}

#[test]
fn index_assignment() {
	let array = ReactiveArray::new(vec!['a', 'b']);
	let (log, _subs) = record(&array);

	assert_eq!(array.set(1, 'c'), Ok('b'));
	assert_eq!(array.get(), vec!['a', 'c']);
	assert_eq!(changed(&log), vec![splice(1, vec!['c'], vec!['b'])]);

	assert_eq!(array.set(2, 'd'), Err(Error::OutOfBounds { index: 2, len: 2 }));
}

#[test]
fn set_len_truncates_and_extends() {
	let array = ReactiveArray::new(vec![1, 2, 3]);
	let (log, _subs) = record(&array);

	array.set_len(1).unwrap();
	assert_eq!(array.get(), vec![1]);
	array.set_len(3).unwrap();
	assert_eq!(array.get(), vec![1, 0, 0]);
	array.set_len(3).unwrap();

	assert_eq!(
		changed(&log),
		vec![splice(1, vec![], vec![2, 3]), splice(1, vec![0, 0], vec![])]
	);
}

#[test]
fn fill_a_range() {
	let array = ReactiveArray::new(vec![1, 2, 3, 4]);
	let (log, _subs) = record(&array);

	array.fill(0, Some(1), Some(-1)).unwrap();
	assert_eq!(array.get(), vec![1, 0, 0, 4]);
	assert_eq!(changed(&log), vec![splice(1, vec![0, 0], vec![2, 3])]);
}

#[test]
fn copy_within_keeps_the_length() {
	let array = ReactiveArray::new(vec![1, 2, 3, 4, 5]);
	let (log, _subs) = record(&array);

	array.copy_within(0, Some(3), None).unwrap();
	assert_eq!(array.get(), vec![4, 5, 3, 4, 5]);
	assert_eq!(changed(&log), vec![splice(0, vec![4, 5], vec![1, 2])]);
}

#[test]
fn reverse_sends_a_reversed_change() {
	let array = ReactiveArray::new(vec![1, 2, 3]);
	let (log, _subs) = record(&array);

	array.reverse().unwrap();
	assert_eq!(array.get(), vec![3, 2, 1]);
	assert_eq!(
		*log.borrow(),
		vec![
			(EventKind::Changing, ArrayChange::Reversed),
			(EventKind::Changed, ArrayChange::Reversed),
		]
	);
}

#[test]
fn sort_reports_the_permutation() {
	let array = ReactiveArray::new(vec![3, 1, 2]);
	let (log, _subs) = record(&array);

	let sorted_indices = array.sort().unwrap();
	assert_eq!(array.get(), vec![1, 2, 3]);
	assert_eq!(&*sorted_indices, &[1, 2, 0]);
	assert_eq!(
		*log.borrow(),
		vec![
			(EventKind::Changing, ArrayChange::Sort(SortFn::Default)),
			(
				EventKind::Changed,
				ArrayChange::Sorted {
					sorted_indices: sorted_indices.clone()
				}
			),
		]
	);
}

#[test]
fn sort_by_is_stable() {
	let array = ReactiveArray::new(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);

	let sorted_indices = array.sort_by(|a, b| a.0.cmp(&b.0)).unwrap();
	assert_eq!(array.get(), vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
	assert_eq!(&*sorted_indices, &[1, 3, 0, 2]);
}

#[test]
fn permutation_can_be_undone() {
	let before = vec!["d", "a", "c", "b"];
	let array = ReactiveArray::new(before.clone());

	let sorted_indices = array.sort().unwrap();
	let after = array.get();
	for (i, item) in after.iter().enumerate() {
		assert_eq!(*item, before[sorted_indices[i]]);
	}

	let back = invert(&sorted_indices);
	let restored: Vec<_> = back.iter().map(|&i| after[i]).collect();
	assert_eq!(restored, before);
}

#[test]
fn vetoed_mutations_change_nothing() {
	let array = ReactiveArray::new(vec![2, 1]);
	let _veto = array.on_changing(|event| event.prevent_default());
	let (log, _subs) = record(&array);

	assert_eq!(array.push([3]), Err(Error::Uncommitted));
	assert_eq!(array.sort(), Err(Error::Uncommitted));
	assert_eq!(array.reverse(), Err(Error::Uncommitted));
	assert_eq!(array.get(), vec![2, 1]);
	assert!(changed(&log).is_empty());
}

#[test]
fn writable_set_replaces_everything() {
	use rebind::Writable;

	let array = ReactiveArray::new(vec![1, 2]);
	let (log, _subs) = record(&array);

	assert_eq!(Writable::set(&array, vec![7]), Ok(vec![7]));
	assert_eq!(changed(&log), vec![splice(0, vec![7], vec![1, 2])]);
}

#[test]
fn map_follows_its_source() {
	let source = ReactiveArray::new(vec![1i64, 2, 3]);
	let mock = mock::SharedMock::new();
	mock.get().expect_mapped().times(3).return_const(());

	let mapped = source.map({
		let mock = mock.clone();
		move |item: &i64| {
			mock.get().mapped(*item);
			item * 10
		}
	});

	assert_eq!(mapped.get(), vec![10, 20, 30]);
	mock.get().checkpoint();

	mock.get()
		.expect_mapped()
		.with(predicate::eq(4))
		.times(1)
		.return_const(());
	source.push([4]).unwrap();
	assert_eq!(mapped.get(), vec![10, 20, 30, 40]);
	mock.get().checkpoint();

	// Moving items never maps them again.
	mock.get().expect_mapped().times(0).return_const(());
	source.reverse().unwrap();
	assert_eq!(mapped.get(), vec![40, 30, 20, 10]);
	source.sort().unwrap();
	assert_eq!(mapped.get(), vec![10, 20, 30, 40]);
	source.splice(1, Some(2), []).unwrap();
	assert_eq!(mapped.get(), vec![10, 40]);
	mock.get().checkpoint();
}

#[test]
fn map_sends_its_own_events() {
	let source = ReactiveArray::new(vec![1, 2]);
	let mapped = source.map(|item| item.to_string());
	let (log, _subs) = record(&mapped);

	source.shift().unwrap();
	source.sort().unwrap();

	assert_eq!(
		*log.borrow(),
		vec![
			(
				EventKind::Changing,
				splice(0, vec![], vec![String::from("1")])
			),
			(EventKind::Changed, splice(0, vec![], vec![String::from("1")])),
			(
				EventKind::Changing,
				ArrayChange::Sort(SortFn::Permutation(Rc::from([0])))
			),
			(
				EventKind::Changed,
				ArrayChange::Sorted {
					sorted_indices: Rc::from([0])
				}
			),
		]
	);
}

#[test]
fn projections_cannot_veto_their_source() {
	let source = ReactiveArray::new(vec![1]);
	let mapped = source.map(|item| item + 1);
	let _veto = mapped.on_changing(|event| event.prevent_default());

	source.push([2]).unwrap();
	assert_eq!(mapped.get(), vec![2, 3]);
}

#[test]
fn projections_are_read_only() {
	let source = ReactiveArray::new(vec![1, 2]);
	let mapped = source.map(|item| item * 2);

	assert!(mapped.is_read_only());
	assert!(!source.is_read_only());
	assert_eq!(mapped.binding(), Binding::To);
	assert_eq!(mapped.push([5]), Err(Error::ReadOnly));
	assert_eq!(mapped.pop(), Err(Error::ReadOnly));
	assert_eq!(mapped.sort(), Err(Error::ReadOnly));
	assert_eq!(mapped.reverse(), Err(Error::ReadOnly));
	assert_eq!(mapped.set(0, 9), Err(Error::ReadOnly));
	assert_eq!(mapped.get(), vec![2, 4]);
}

#[test]
fn dropping_a_projection_releases_its_listener() {
	let source = ReactiveArray::new(vec![1, 2]);
	let mapped = source.map(|item| item * 2);
	assert_eq!(source.notifier().listener_count(EventKind::Changed), 1);

	drop(mapped);
	assert_eq!(source.notifier().listener_count(EventKind::Changed), 0);
	source.push([3]).unwrap();
}

#[test]
fn projection_dropped_during_dispatch_unsubscribes() {
	let source = ReactiveArray::new(vec![1, 2]);
	let holder: Rc<RefCell<Option<ReactiveArray<i32>>>> = Default::default();

	// Registered first, so it runs before the projection's own listener.
	let _dropper = source.notifier().listen_until(EventKind::Changed, {
		let holder = holder.clone();
		move |_| {
			drop(holder.borrow_mut().take());
			Listen::Unsubscribe
		}
	});

	*holder.borrow_mut() = Some(source.map(|item| item * 2));
	assert_eq!(source.notifier().listener_count(EventKind::Changed), 2);

	assert_eq!(source.push([3]), Ok(3));
	assert!(holder.borrow().is_none());
	assert_eq!(source.notifier().listener_count(EventKind::Changed), 0);

	assert_eq!(source.push([4]), Ok(4));
}

#[test]
fn chained_projections() {
	let source = ReactiveArray::new(vec![1, 2, 3]);
	let doubled = source.map(|item| item * 2);
	let labels = doubled.map(|item| format!("#{item}"));

	source.splice(0, Some(1), [5]).unwrap();
	source.reverse().unwrap();

	assert_eq!(doubled.get(), vec![6, 4, 10]);
	assert_eq!(labels.get(), vec!["#6", "#4", "#10"]);
}

#[test]
fn auto_bind_pushes_the_whole_array() {
	let array = ReactiveArray::new(vec![1]);
	let seen = Rc::new(RefCell::new(Vec::new()));

	let _subscription = auto_bind(
		array.clone(),
		{
			let seen = seen.clone();
			move |items| seen.borrow_mut().push(items)
		},
		None,
	);

	array.push([2]).unwrap();
	assert_eq!(*seen.borrow(), vec![vec![1], vec![1, 2]]);
}

#[test]
fn optimistic_failure_undoes_the_update() {
	let array = ReactiveArray::new(vec![1]);

	let pending = array.optimistic(|a| a.push([2]), async { Err::<(), _>("x") });
	assert_eq!(array.get(), vec![1, 2]);

	assert_eq!(block_on(pending), Err("x"));
	assert_eq!(array.get(), vec![1]);
}

#[test]
fn optimistic_failure_undoes_every_step() {
	let array = ReactiveArray::new(vec![3, 1, 2]);
	let (tx, rx) = oneshot::channel::<Result<(), String>>();

	let pending = array.optimistic(
		|a| {
			a.push([0])?;
			a.sort()?;
			a.splice(1, Some(1), [7, 8])?;
			a.reverse()?;
			a.fill(9, Some(-1), None)
		},
		async move { rx.await.unwrap() },
	);
	assert_eq!(array.get(), vec![3, 2, 8, 7, 9]);

	let (log, _subs) = record(&array);
	tx.send(Err(String::from("rejected"))).unwrap();

	assert_eq!(block_on(pending), Err(String::from("rejected")));
	assert_eq!(array.get(), vec![3, 1, 2]);
	assert_eq!(changed(&log).len(), 5);
}

#[test]
fn optimistic_success_keeps_the_update() {
	let array = ReactiveArray::new(vec![1]);
	let calls = Rc::new(Cell::new(0));

	let pending = array.optimistic(
		{
			let calls = calls.clone();
			move |a| {
				calls.set(calls.get() + 1);
				a.unshift([0])
			}
		},
		async { Ok::<_, ()>(42) },
	);

	assert_eq!(block_on(pending), Ok(42));
	assert_eq!(array.get(), vec![0, 1]);
	assert_eq!(calls.get(), 1);
}

#[test]
fn changes_outside_the_updater_are_kept() {
	let array = ReactiveArray::new(vec![1]);
	let (tx, rx) = oneshot::channel::<Result<(), ()>>();

	let pending = array.optimistic(|a| a.push([2]), async move { rx.await.unwrap() });
	array.push([3]).unwrap();
	tx.send(Err(())).unwrap();

	assert_eq!(block_on(pending), Err(()));
	assert_eq!(array.get(), vec![1, 3]);
}

#[test]
fn outside_items_survive_an_undone_sort() {
	let array = ReactiveArray::new(vec![3, 1, 2]);
	let (tx, rx) = oneshot::channel::<Result<(), ()>>();

	let pending = array.optimistic(|a| a.sort(), async move { rx.await.unwrap() });
	array.push([0]).unwrap();
	assert_eq!(array.get(), vec![1, 2, 3, 0]);

	let (log, _subs) = record(&array);
	tx.send(Err(())).unwrap();

	assert_eq!(block_on(pending), Err(()));
	assert_eq!(array.get(), vec![1, 2, 3, 0]);
	assert!(log.borrow().is_empty());
}

#[test]
fn stale_splice_is_not_undone() {
	let array = ReactiveArray::new(vec![1, 2, 3]);
	let (tx, rx) = oneshot::channel::<Result<(), ()>>();

	let pending = array.optimistic(|a| a.push([4]), async move { rx.await.unwrap() });
	array.clear().unwrap();

	let (log, _subs) = record(&array);
	tx.send(Err(())).unwrap();

	assert_eq!(block_on(pending), Err(()));
	assert!(array.is_empty());
	assert!(log.borrow().is_empty());
}

#[test]
fn vetoed_updater_leaves_nothing_to_undo() {
	let array = ReactiveArray::new(vec![1]);
	let veto = array.on_changing(|event| event.prevent_default());

	let pending = array.optimistic(|a| a.push([2]), async { Err::<(), _>("x") });
	assert_eq!(array.get(), vec![1]);
	drop(veto);

	let (log, _subs) = record(&array);
	assert_eq!(block_on(pending), Err("x"));
	assert_eq!(array.get(), vec![1]);
	assert!(log.borrow().is_empty());
}

#[test]
fn pessimistic_applies_after_success() {
	let array = ReactiveArray::new(vec![1]);
	let (tx, rx) = oneshot::channel::<Result<i32, ()>>();

	let pending = array.pessimistic(async move { rx.await.unwrap() }, |a, id| a.push([*id]));
	assert_eq!(array.get(), vec![1]);

	tx.send(Ok(5)).unwrap();
	assert_eq!(block_on(pending), Ok(5));
	assert_eq!(array.get(), vec![1, 5]);

	let failed = array.pessimistic(async { Err::<i32, _>(()) }, |a, id| a.push([*id]));
	assert_eq!(block_on(failed), Err(()));
	assert_eq!(array.get(), vec![1, 5]);
}
