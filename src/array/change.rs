use std::cmp::Ordering;
use std::fmt::Debug;
use std::rc::Rc;

pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Items replaced at a position: `old_items` were removed from `index`
/// and `new_items` inserted there. An empty list means nothing was
/// removed or inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice<T> {
	pub index: usize,
	pub new_items: Vec<T>,
	pub old_items: Vec<T>,
}

impl<T> Splice<T>
where
	T: Clone,
{
	/// The splice that undoes this one.
	pub fn inverse(&self) -> Splice<T> {
		Splice {
			index: self.index,
			new_items: self.old_items.clone(),
			old_items: self.new_items.clone(),
		}
	}
}

/// How a sort was requested.
pub enum SortFn<T> {
	/// Natural ordering of the items.
	Default,
	By(Comparator<T>),
	/// Reorder into a known permutation, read like the `sorted_indices`
	/// of [`ArrayChange::Sorted`]. Used when a sort is undone and when a
	/// projection follows its source.
	Permutation(Rc<[usize]>),
}

impl<T> Clone for SortFn<T> {
	fn clone(&self) -> Self {
		match self {
			SortFn::Default => SortFn::Default,
			SortFn::By(cmp) => SortFn::By(cmp.clone()),
			SortFn::Permutation(order) => SortFn::Permutation(order.clone()),
		}
	}
}

impl<T> PartialEq for SortFn<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(SortFn::Default, SortFn::Default) => true,
			(SortFn::By(a), SortFn::By(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
			(SortFn::Permutation(a), SortFn::Permutation(b)) => a == b,
			_ => false,
		}
	}
}

impl<T> Debug for SortFn<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SortFn::Default => f.write_str("Default"),
			SortFn::By(_) => f.write_str("By(<comparator>)"),
			SortFn::Permutation(order) => f.debug_tuple("Permutation").field(order).finish(),
		}
	}
}

/// Describes one structural mutation of a [`ReactiveArray`](crate::ReactiveArray).
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayChange<T> {
	Splice(Splice<T>),
	Reversed,
	/// Sent before a sort. The resulting order is only known afterwards.
	Sort(SortFn<T>),
	/// Sent after a sort. `sorted_indices[i]` is the position, before the
	/// sort, of the item now at position `i`.
	Sorted { sorted_indices: Rc<[usize]> },
}

/// The inverse permutation: re-applying it after `order` restores the
/// original sequence.
pub fn invert(order: &[usize]) -> Vec<usize> {
	let mut inverse = vec![0; order.len()];
	for (position, &previous) in order.iter().enumerate() {
		inverse[previous] = position;
	}
	inverse
}

/// Rearranges `items` so that `result[i] == items[order[i]]`.
/// Items `order` does not mention keep their relative order at the end.
pub(crate) fn permute<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
	let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
	let mut result: Vec<T> = order
		.iter()
		.filter_map(|&previous| slots.get_mut(previous).and_then(Option::take))
		.collect();
	result.extend(slots.into_iter().flatten());
	result
}

/// Positions of `items` in stable sorted order.
pub(crate) fn stable_order<T>(items: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<usize> {
	let mut order: Vec<usize> = (0..items.len()).collect();
	order.sort_by(|&a, &b| cmp(&items[a], &items[b]));
	order
}

/// Resolves a possibly negative index against `len`, clamped to `0..=len`.
pub(crate) fn relative(index: isize, len: usize) -> usize {
	if index < 0 {
		len.saturating_sub(index.unsigned_abs())
	} else {
		(index as usize).min(len)
	}
}
