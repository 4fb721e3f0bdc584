mod change;
mod map;
mod rollback;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::rc::Rc;

pub use change::{invert, ArrayChange, Comparator, SortFn, Splice};

use crate::error::{Error, Result};
use crate::event::{ChangeEvent, EventKind};
use crate::notifier::{Listen, Notifier, Subscription};
use crate::value::{Source, Value};
use crate::{Binding, Observable, Writable};

use change::{permute, relative, stable_order};

/// An observable sequence whose mutators send an [`ArrayChange`]
/// describing exactly what moved.
///
/// Every mutator sends one `valuechanging` event and, unless a listener
/// vetoes it, one `valuechanged` event. Mutations that would not change
/// anything (popping an empty array, pushing no items, filling an empty
/// range) send nothing.
pub struct ReactiveArray<T> {
	body: Rc<ArrayBody<T>>,
}

impl<T> Clone for ReactiveArray<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Mode {
	Writable,
	/// Follows a source array and rejects direct mutation.
	Projection,
}

struct ArrayBody<T> {
	items: RefCell<Vec<T>>,
	notifier: Notifier<ArrayChange<T>>,
	mode: Mode,
	/// Applied changes are appended here while an optimistic update runs.
	journal: RefCell<Option<Vec<ArrayChange<T>>>>,
	/// Listener on the source array of a projection.
	source: RefCell<Option<Subscription>>,
}

impl<T> ArrayBody<T>
where
	T: Clone,
{
	fn new(items: Vec<T>, mode: Mode) -> Self {
		ArrayBody {
			items: RefCell::new(items),
			notifier: Notifier::new(),
			mode,
			journal: RefCell::new(None),
			source: RefCell::new(None),
		}
	}

	fn apply(&self, change: &ArrayChange<T>) {
		{
			let mut items = self.items.borrow_mut();
			match change {
				ArrayChange::Splice(splice) => {
					let start = splice.index.min(items.len());
					let end = (start + splice.old_items.len()).min(items.len());
					let removed: Vec<T> = items
						.splice(start..end, splice.new_items.iter().cloned())
						.collect();
					std::mem::drop(items);
					std::mem::drop(removed);
				}
				ArrayChange::Reversed => items.reverse(),
				ArrayChange::Sorted { sorted_indices } => {
					let current = std::mem::take(&mut *items);
					*items = permute(current, sorted_indices);
				}
				ArrayChange::Sort(_) => return,
			}
		}

		if let Some(journal) = self.journal.borrow_mut().as_mut() {
			journal.push(change.clone());
		}
	}
}

impl<T> ReactiveArray<T>
where
	T: Clone + 'static,
{
	pub fn new(items: Vec<T>) -> Self {
		ReactiveArray {
			body: Rc::new(ArrayBody::new(items, Mode::Writable)),
		}
	}

	pub fn is_read_only(&self) -> bool {
		self.body.mode == Mode::Projection
	}

	/// A copy of the current items.
	#[inline]
	pub fn get(&self) -> Vec<T> {
		self.body.items.borrow().clone()
	}

	/// Reads the items without copying them.
	/// `func` must not mutate this array.
	pub fn with<R>(&self, func: impl FnOnce(&[T]) -> R) -> R {
		func(&self.body.items.borrow())
	}

	pub fn at(&self, index: usize) -> Option<T> {
		self.body.items.borrow().get(index).cloned()
	}

	pub fn len(&self) -> usize {
		self.body.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn writable(&self) -> Result<()> {
		match self.body.mode {
			Mode::Writable => Ok(()),
			Mode::Projection => Err(Error::ReadOnly),
		}
	}

	fn commit(&self, change: ArrayChange<T>) -> Result<()> {
		self.try_change(change.clone(), || self.body.apply(&change))
	}

	fn commit_splice(&self, index: usize, new_items: Vec<T>, old_items: Vec<T>) -> Result<()> {
		if new_items.is_empty() && old_items.is_empty() {
			return Ok(());
		}

		self.commit(ArrayChange::Splice(Splice {
			index,
			new_items,
			old_items,
		}))
	}

	fn slice(&self, start: usize, end: usize) -> Vec<T> {
		self.body.items.borrow()[start..end].to_vec()
	}

	/// Appends `items` and returns the new length.
	pub fn push(&self, items: impl IntoIterator<Item = T>) -> Result<usize> {
		self.writable()?;
		let len = self.len();
		self.commit_splice(len, items.into_iter().collect(), Vec::new())?;
		Ok(self.len())
	}

	pub fn pop(&self) -> Result<Option<T>> {
		self.writable()?;
		let Some(index) = self.len().checked_sub(1) else {
			return Ok(None);
		};

		let last = self.slice(index, index + 1);
		self.commit_splice(index, Vec::new(), last.clone())?;
		Ok(last.into_iter().next())
	}

	pub fn shift(&self) -> Result<Option<T>> {
		self.writable()?;
		let Some(first) = self.at(0) else {
			return Ok(None);
		};

		self.commit_splice(0, Vec::new(), vec![first.clone()])?;
		Ok(Some(first))
	}

	/// Prepends `items` and returns the new length.
	pub fn unshift(&self, items: impl IntoIterator<Item = T>) -> Result<usize> {
		self.writable()?;
		self.commit_splice(0, items.into_iter().collect(), Vec::new())?;
		Ok(self.len())
	}

	pub fn insert(&self, index: usize, item: T) -> Result<()> {
		self.writable()?;
		let len = self.len();
		if index > len {
			return Err(Error::OutOfBounds { index, len });
		}

		self.commit_splice(index, vec![item], Vec::new())
	}

	pub fn remove(&self, index: usize) -> Result<T> {
		self.writable()?;
		let len = self.len();
		let Some(item) = self.at(index) else {
			return Err(Error::OutOfBounds { index, len });
		};

		self.commit_splice(index, Vec::new(), vec![item.clone()])?;
		Ok(item)
	}

	/// Removes `delete_count` items from `start` (all remaining ones when
	/// `None`), inserts `items` there and returns the removed items.
	///
	/// A negative `start` counts from the end.
	pub fn splice(
		&self,
		start: isize,
		delete_count: Option<usize>,
		items: impl IntoIterator<Item = T>,
	) -> Result<Vec<T>> {
		self.writable()?;
		let len = self.len();
		let start = relative(start, len);
		let count = delete_count.map_or(len - start, |count| count.min(len - start));

		let old_items = self.slice(start, start + count);
		self.commit_splice(start, items.into_iter().collect(), old_items.clone())?;
		Ok(old_items)
	}

	pub fn clear(&self) -> Result<Vec<T>> {
		self.splice(0, None, [])
	}

	/// Replaces every item.
	pub fn replace(&self, items: impl IntoIterator<Item = T>) -> Result<Vec<T>> {
		self.splice(0, None, items)
	}

	/// Index assignment. Returns the previous item.
	pub fn set(&self, index: usize, item: T) -> Result<T> {
		self.writable()?;
		let len = self.len();
		let Some(old) = self.at(index) else {
			return Err(Error::OutOfBounds { index, len });
		};

		self.commit_splice(index, vec![item], vec![old.clone()])?;
		Ok(old)
	}

	/// Truncates, or extends with default items.
	pub fn set_len(&self, new_len: usize) -> Result<()>
	where
		T: Default,
	{
		self.writable()?;
		let len = self.len();
		match new_len.cmp(&len) {
			Ordering::Less => self.commit_splice(new_len, Vec::new(), self.slice(new_len, len)),
			Ordering::Greater => {
				let tail = std::iter::repeat_with(T::default).take(new_len - len).collect();
				self.commit_splice(len, tail, Vec::new())
			}
			Ordering::Equal => Ok(()),
		}
	}

	/// Sets every item in `start..end` to `value`. Negative bounds count
	/// from the end; `None` means the start or the end of the array.
	pub fn fill(&self, value: T, start: Option<isize>, end: Option<isize>) -> Result<()> {
		self.writable()?;
		let len = self.len();
		let start = start.map_or(0, |start| relative(start, len));
		let end = end.map_or(len, |end| relative(end, len));
		if start >= end {
			return Ok(());
		}

		let new_items = vec![value; end - start];
		self.commit_splice(start, new_items, self.slice(start, end))
	}

	/// Copies the items of `start..end` over the items at `target`,
	/// without changing the length.
	pub fn copy_within(&self, target: isize, start: Option<isize>, end: Option<isize>) -> Result<()> {
		self.writable()?;
		let len = self.len();
		let target = relative(target, len);
		let start = start.map_or(0, |start| relative(start, len));
		let end = end.map_or(len, |end| relative(end, len));
		let count = end.saturating_sub(start).min(len - target);
		if count == 0 {
			return Ok(());
		}

		let new_items = self.slice(start, start + count);
		self.commit_splice(target, new_items, self.slice(target, target + count))
	}

	pub fn reverse(&self) -> Result<()> {
		self.writable()?;
		self.commit(ArrayChange::Reversed)
	}

	/// Stable sort in natural order. Returns the realized permutation.
	pub fn sort(&self) -> Result<Rc<[usize]>>
	where
		T: Ord,
	{
		self.writable()?;
		self.sort_with(SortFn::Default, |a, b| a.cmp(b))
	}

	/// Stable sort with `cmp`. Returns the realized permutation.
	pub fn sort_by(&self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Result<Rc<[usize]>> {
		self.writable()?;
		let cmp: Comparator<T> = Rc::new(cmp);
		self.sort_with(SortFn::By(cmp.clone()), |a, b| cmp(a, b))
	}

	/// Reorders the items so that `new[i] == old[order[i]]`.
	pub(crate) fn reorder(&self, order: Vec<usize>) -> Result<Rc<[usize]>> {
		let order: Rc<[usize]> = order.into();
		self.sort_with(SortFn::Permutation(order.clone()), move |_, _| Ordering::Equal)
			.map(|_| order)
	}

	/// The sort intent is announced first; the permutation is only known
	/// once the comparator ran, so it is sent with `valuechanged`.
	fn sort_with(&self, intent: SortFn<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Result<Rc<[usize]>> {
		let permutation = match &intent {
			SortFn::Permutation(order) => Some(order.clone()),
			_ => None,
		};

		if !self.notify_before(ArrayChange::Sort(intent)) {
			tracing::debug!("sort vetoed");
			return Err(Error::Uncommitted);
		}

		let sorted_indices: Rc<[usize]> = match permutation {
			Some(order) => order,
			None => self.with(|items| stable_order(items, cmp)).into(),
		};

		let change = ArrayChange::Sorted {
			sorted_indices: sorted_indices.clone(),
		};
		self.body.apply(&change);
		self.notify(change);

		Ok(sorted_indices)
	}

	/// Applies a change from the source of a projection. Listeners of the
	/// projection get both events but cannot veto them.
	fn follow(&self, change: ArrayChange<T>) {
		let before = match &change {
			ArrayChange::Sorted { sorted_indices } => {
				ArrayChange::Sort(SortFn::Permutation(sorted_indices.clone()))
			}
			other => other.clone(),
		};

		self.body
			.notifier
			.dispatch(&ChangeEvent::new(EventKind::Changing, before, false));
		self.body.apply(&change);
		self.body.notifier.notify(change);
	}
}

impl<T> Observable for ReactiveArray<T>
where
	T: Clone + 'static,
{
	type Item = Vec<T>;
	type Change = ArrayChange<T>;

	fn get(&self) -> Vec<T> {
		ReactiveArray::get(self)
	}

	fn notifier(&self) -> &Notifier<ArrayChange<T>> {
		&self.body.notifier
	}

	fn binding(&self) -> Binding {
		match self.body.mode {
			Mode::Writable => Binding::TwoWay,
			Mode::Projection => Binding::To,
		}
	}
}

impl<T> Writable for ReactiveArray<T>
where
	T: Clone + 'static,
{
	fn set(&self, items: Vec<T>) -> Result<Vec<T>> {
		self.replace(items)?;
		Ok(self.get())
	}
}

impl<T> Source<Vec<T>> for ReactiveArray<T>
where
	T: Clone + 'static,
{
	fn read(&self) -> Vec<T> {
		self.get()
	}

	fn direction(&self) -> Binding {
		Observable::binding(self)
	}

	fn subscribe(&self, on_value: Box<dyn Fn(Vec<T>)>) -> Subscription {
		let this = Rc::downgrade(&self.body);
		self.body
			.notifier
			.listen_until(EventKind::Changed, move |_| match this.upgrade() {
				Some(body) => {
					on_value(body.items.borrow().clone());
					Listen::Keep
				}
				None => Listen::Unsubscribe,
			})
	}
}

impl<T> From<ReactiveArray<T>> for Value<Vec<T>>
where
	T: Clone + 'static,
{
	fn from(array: ReactiveArray<T>) -> Self {
		Value::new(array)
	}
}

impl<T> From<Vec<T>> for ReactiveArray<T>
where
	T: Clone + 'static,
{
	fn from(items: Vec<T>) -> Self {
		ReactiveArray::new(items)
	}
}

impl<T> Default for ReactiveArray<T>
where
	T: Clone + 'static,
{
	fn default() -> Self {
		ReactiveArray::new(Vec::new())
	}
}

impl<T> Debug for ReactiveArray<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.body.items.borrow().iter()).finish()
	}
}
