use std::future::Future;

use super::{invert, ArrayBody, ArrayChange, ReactiveArray};
use crate::error::Result;

/// Collects the changes applied to an array until dropped.
/// Nested recordings hand their changes over to the outer one.
struct Recording<'a, T: Clone> {
	body: &'a ArrayBody<T>,
	outer: Option<Vec<ArrayChange<T>>>,
}

impl<'a, T: Clone> Recording<'a, T> {
	fn start(body: &'a ArrayBody<T>) -> Self {
		let outer = body.journal.replace(Some(Vec::new()));
		Recording { body, outer }
	}

	fn finish(mut self) -> Vec<ArrayChange<T>> {
		let recorded = self.body.journal.borrow().clone().unwrap_or_default();
		if let Some(outer) = self.outer.as_mut() {
			outer.extend(recorded.iter().cloned());
		}
		recorded
	}
}

impl<T: Clone> Drop for Recording<'_, T> {
	fn drop(&mut self) {
		self.body.journal.replace(self.outer.take());
	}
}

impl<T> ReactiveArray<T>
where
	T: Clone + 'static,
{
	/// Runs `updater` right away and undoes every change it made if
	/// `promise` fails.
	///
	/// Only changes made while `updater` runs are recorded, so it must do
	/// all its work synchronously. On failure the recorded changes are
	/// inverted and replayed newest first, then the error is returned.
	/// Steps that no longer fit the array are skipped.
	pub fn optimistic<R, Fut, O, E>(
		&self,
		updater: impl FnOnce(&ReactiveArray<T>) -> Result<R>,
		promise: Fut,
	) -> impl Future<Output = Result<O, E>>
	where
		Fut: Future<Output = Result<O, E>>,
	{
		let recording = Recording::start(&self.body);
		if let Err(error) = updater(self) {
			tracing::debug!(%error, "optimistic update was not fully applied");
		}
		let journal = recording.finish();

		let this = self.clone();
		async move {
			let outcome = promise.await;
			if outcome.is_err() {
				this.rollback(journal);
			}
			outcome
		}
	}

	/// Waits for `promise` and only then runs `apply`.
	/// Nothing changes if `promise` fails.
	pub fn pessimistic<R, Fut, O, E>(
		&self,
		promise: Fut,
		apply: impl FnOnce(&ReactiveArray<T>, &O) -> Result<R>,
	) -> impl Future<Output = Result<O, E>>
	where
		Fut: Future<Output = Result<O, E>>,
	{
		let this = self.clone();
		async move {
			let payload = match promise.await {
				Ok(payload) => payload,
				Err(error) => return Err(error),
			};

			if let Err(error) = apply(&this, &payload) {
				tracing::debug!(%error, "pessimistic update was not applied");
			}
			Ok(payload)
		}
	}

	fn rollback(&self, journal: Vec<ArrayChange<T>>) {
		tracing::debug!(changes = journal.len(), "rolling back optimistic update");

		for change in journal.into_iter().rev() {
			if !self.fits(&change) {
				tracing::warn!(len = self.len(), "array changed since the update, skipping rollback step");
				continue;
			}

			let undone = match change {
				ArrayChange::Splice(splice) => self.commit(ArrayChange::Splice(splice.inverse())),
				ArrayChange::Reversed => self.commit(ArrayChange::Reversed),
				ArrayChange::Sorted { sorted_indices } => {
					self.reorder(invert(&sorted_indices)).map(|_| ())
				}
				ArrayChange::Sort(_) => continue,
			};

			if let Err(error) = undone {
				tracing::warn!(%error, "rollback step was vetoed");
			}
		}
	}

	/// Whether undoing `change` still addresses items that exist.
	fn fits(&self, change: &ArrayChange<T>) -> bool {
		let len = self.len();
		match change {
			ArrayChange::Splice(splice) => splice.index + splice.new_items.len() <= len,
			ArrayChange::Sorted { sorted_indices } => sorted_indices.len() == len,
			ArrayChange::Reversed | ArrayChange::Sort(_) => true,
		}
	}
}
