use std::cell::RefCell;
use std::fmt::Debug;
use std::future::Future;
use std::rc::Rc;

use crate::error::Result;
use crate::event::EventKind;
use crate::notifier::{Notifier, Subscription};
use crate::value::{Source, Value};
use crate::{Binding, Observable, Writable};

/// Payload of the events sent by a [`Var`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange<T> {
	pub old_value: T,
	pub new_value: T,
}

/// A mutable observable value.
///
/// Clones share the same value. [`Var::bind_to`] and [`Var::bind_from`]
/// return handles to the same value tagged with a different [`Binding`].
pub struct Var<T> {
	body: Rc<VarBody<T>>,
	binding: Binding,
}

struct VarBody<T> {
	value: RefCell<T>,
	notifier: Notifier<ValueChange<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
			binding: self.binding,
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + Clone + PartialEq + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

impl<T> Var<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn new(value: T) -> Self {
		Var {
			body: Rc::new(VarBody {
				value: RefCell::new(value),
				notifier: Notifier::new(),
			}),
			binding: Binding::TwoWay,
		}
	}

	#[inline]
	pub fn get(&self) -> T {
		self.body.value.borrow().clone()
	}

	/// Reads the value without cloning it.
	/// `func` must not write to this var.
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		func(&self.body.value.borrow())
	}

	/// Sets the value and returns it.
	///
	/// Setting a value equal to the current one does nothing and sends
	/// no events.
	pub fn set(&self, value: T) -> Result<T> {
		let current = self.get();
		if current == value {
			return Ok(current);
		}

		let change = ValueChange {
			old_value: current,
			new_value: value.clone(),
		};

		self.try_change(change, || {
			*self.body.value.borrow_mut() = value.clone();
			value
		})
	}

	#[inline]
	pub fn update(&self, func: impl FnOnce(&T) -> T) -> Result<T> {
		let next = func(&self.get());
		self.set(next)
	}

	/// A handle to the same value that only pushes changes to the UI.
	pub fn bind_to(&self) -> Var<T> {
		Var {
			body: self.body.clone(),
			binding: Binding::To,
		}
	}

	/// A handle to the same value that is only written from the UI.
	pub fn bind_from(&self) -> Var<T> {
		Var {
			body: self.body.clone(),
			binding: Binding::From,
		}
	}

	/// Applies `updater` right away and undoes it if `promise` fails.
	///
	/// The returned future resolves with the outcome of `promise`. On
	/// failure the value held before the update is set again before the
	/// error is returned.
	pub fn optimistic<Fut, O, E>(
		&self,
		updater: impl FnOnce(&T) -> T,
		promise: Fut,
	) -> impl Future<Output = std::result::Result<O, E>>
	where
		Fut: Future<Output = std::result::Result<O, E>>,
	{
		self.optimistic_with(updater, promise, |current, _| current.clone())
	}

	/// Like [`Var::optimistic`], reconciling the value with the resolved
	/// payload through `resolve` on success.
	pub fn optimistic_with<Fut, O, E>(
		&self,
		updater: impl FnOnce(&T) -> T,
		promise: Fut,
		resolve: impl FnOnce(&T, &O) -> T,
	) -> impl Future<Output = std::result::Result<O, E>>
	where
		Fut: Future<Output = std::result::Result<O, E>>,
	{
		let snapshot = self.get();
		let applied = self.update(updater).is_ok();
		let this = self.clone();

		async move {
			match promise.await {
				Ok(payload) => {
					if let Err(error) = this.update(|current| resolve(current, &payload)) {
						tracing::debug!(%error, "optimistic resolution was not applied");
					}
					Ok(payload)
				}
				Err(error) => {
					if applied {
						this.rollback(snapshot);
					}
					Err(error)
				}
			}
		}
	}

	/// Waits for `promise` and only then applies `updater` to the value.
	/// Nothing changes if `promise` fails.
	pub fn pessimistic<Fut, O, E>(
		&self,
		promise: Fut,
		updater: impl FnOnce(&T, &O) -> T,
	) -> impl Future<Output = std::result::Result<O, E>>
	where
		Fut: Future<Output = std::result::Result<O, E>>,
	{
		let this = self.clone();

		async move {
			let payload = match promise.await {
				Ok(payload) => payload,
				Err(error) => return Err(error),
			};

			if let Err(error) = this.update(|current| updater(current, &payload)) {
				tracing::debug!(%error, "pessimistic update was not applied");
			}

			Ok(payload)
		}
	}

	fn rollback(&self, snapshot: T) {
		tracing::debug!("rolling back optimistic update");
		if let Err(error) = self.set(snapshot) {
			tracing::warn!(%error, "rollback was vetoed");
		}
	}
}

impl<T> Observable for Var<T>
where
	T: Clone + PartialEq + 'static,
{
	type Item = T;
	type Change = ValueChange<T>;

	fn get(&self) -> T {
		Var::get(self)
	}

	fn notifier(&self) -> &Notifier<ValueChange<T>> {
		&self.body.notifier
	}

	fn binding(&self) -> Binding {
		self.binding
	}
}

impl<T> Writable for Var<T>
where
	T: Clone + PartialEq + 'static,
{
	fn set(&self, value: T) -> Result<T> {
		Var::set(self, value)
	}
}

impl<T> Source<T> for Var<T>
where
	T: Clone + PartialEq + 'static,
{
	fn read(&self) -> T {
		self.get()
	}

	fn direction(&self) -> Binding {
		self.binding
	}

	fn subscribe(&self, on_value: Box<dyn Fn(T)>) -> Subscription {
		self.body
			.notifier
			.listen(EventKind::Changed, move |event| on_value(event.new_value.clone()))
	}
}

impl<T> From<Var<T>> for Value<T>
where
	T: Clone + PartialEq + 'static,
{
	fn from(var: Var<T>) -> Self {
		Value::new(var)
	}
}

impl<T> Debug for Var<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Var")
			.field("value", &*self.body.value.borrow())
			.field("binding", &self.binding.name())
			.finish()
	}
}
