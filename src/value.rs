use std::rc::Rc;

use crate::notifier::Subscription;
use crate::Binding;

/// Read side of an observable, without its change payload type.
pub trait Source<T>: 'static {
	fn read(&self) -> T;

	fn direction(&self) -> Binding;

	/// Calls `on_value` with the current value after every committed change.
	fn subscribe(&self, on_value: Box<dyn Fn(T)>) -> Subscription;
}

/// A type-erased handle to any observable producing `T`.
pub struct Value<T> {
	value: Rc<dyn Source<T>>,
}

impl<T> Clone for Value<T> {
	fn clone(&self) -> Self {
		Value {
			value: self.value.clone(),
		}
	}
}

impl<T> Value<T>
where
	T: 'static,
{
	pub fn new(value: impl Source<T>) -> Self {
		Value {
			value: Rc::new(value),
		}
	}

	pub fn get(&self) -> T {
		self.value.read()
	}

	pub fn binding(&self) -> Binding {
		self.value.direction()
	}

	pub fn subscribe(&self, on_value: impl Fn(T) + 'static) -> Subscription {
		self.value.subscribe(Box::new(on_value))
	}
}

impl<T> Source<T> for Value<T>
where
	T: 'static,
{
	fn read(&self) -> T {
		self.value.read()
	}

	fn direction(&self) -> Binding {
		self.value.direction()
	}

	fn subscribe(&self, on_value: Box<dyn Fn(T)>) -> Subscription {
		self.value.subscribe(on_value)
	}
}
