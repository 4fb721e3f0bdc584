use std::rc::Rc;

use super::{ArrayBody, ArrayChange, Mode, ReactiveArray, Splice};
use crate::event::EventKind;
use crate::notifier::Listen;

impl<T> ReactiveArray<T>
where
	T: Clone + 'static,
{
	/// A read-only array of `mapper` applied to every item, kept in sync
	/// with this one.
	///
	/// Inserted items are mapped as they arrive; items already mapped are
	/// moved, never mapped again. The projection stops following this
	/// array once it is dropped.
	pub fn map<U, F>(&self, mapper: F) -> ReactiveArray<U>
	where
		U: Clone + 'static,
		F: Fn(&T) -> U + 'static,
	{
		let items: Vec<U> = self.with(|items| items.iter().map(&mapper).collect());
		let body = Rc::new(ArrayBody::new(items, Mode::Projection));

		let projection = Rc::downgrade(&body);
		let subscription = self
			.body
			.notifier
			.listen_until(EventKind::Changed, move |event| {
				let Some(body) = projection.upgrade() else {
					tracing::trace!("projection is gone, dropping its listener");
					return Listen::Unsubscribe;
				};

				let change = match event.change() {
					ArrayChange::Splice(splice) => {
						let start = splice.index;
						let end = start + splice.old_items.len();
						let old_items = body
							.items
							.borrow()
							.get(start..end)
							.map(<[U]>::to_vec)
							.unwrap_or_default();

						ArrayChange::Splice(Splice {
							index: start,
							new_items: splice.new_items.iter().map(&mapper).collect(),
							old_items,
						})
					}
					ArrayChange::Reversed => ArrayChange::Reversed,
					ArrayChange::Sorted { sorted_indices } => ArrayChange::Sorted {
						sorted_indices: sorted_indices.clone(),
					},
					ArrayChange::Sort(_) => return Listen::Keep,
				};

				tracing::trace!("projection follows its source");
				ReactiveArray { body }.follow(change);
				Listen::Keep
			});

		*body.source.borrow_mut() = Some(subscription);

		ReactiveArray { body }
	}
}
