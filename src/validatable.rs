use crate::error::Result;
use crate::notifier::{Notifier, Subscription};
use crate::value::Source;
use crate::{Binding, Computed, Observable, Writable};

/// An observable paired with a computed validity flag.
///
/// Reads, writes and events go straight to the wrapped observable.
pub struct Validatable<O> {
	inner: O,
	is_valid: Computed<bool>,
}

impl<O> Clone for Validatable<O>
where
	O: Clone,
{
	fn clone(&self) -> Self {
		Validatable {
			inner: self.inner.clone(),
			is_valid: self.is_valid.clone(),
		}
	}
}

impl<O> Validatable<O>
where
	O: Observable + Clone,
{
	pub fn new(inner: O, validator: impl Fn(&O::Item) -> bool + 'static) -> Self {
		let is_valid = inner.select(validator);
		Validatable { inner, is_valid }
	}

	pub fn is_valid(&self) -> &Computed<bool> {
		&self.is_valid
	}

	pub fn inner(&self) -> &O {
		&self.inner
	}
}

impl<O> Observable for Validatable<O>
where
	O: Observable,
{
	type Item = O::Item;
	type Change = O::Change;

	fn get(&self) -> O::Item {
		self.inner.get()
	}

	fn notifier(&self) -> &Notifier<O::Change> {
		self.inner.notifier()
	}

	fn binding(&self) -> Binding {
		self.inner.binding()
	}
}

impl<O> Writable for Validatable<O>
where
	O: Writable,
{
	fn set(&self, value: O::Item) -> Result<O::Item> {
		self.inner.set(value)
	}
}

impl<O, T> Source<T> for Validatable<O>
where
	O: Source<T>,
{
	fn read(&self) -> T {
		self.inner.read()
	}

	fn direction(&self) -> Binding {
		self.inner.direction()
	}

	fn subscribe(&self, on_value: Box<dyn Fn(T)>) -> Subscription {
		self.inner.subscribe(on_value)
	}
}
