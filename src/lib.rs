//! Observable values, computed values and reactive arrays for projecting
//! application state onto DOM nodes.
//!
//! Every mutation follows the same protocol: a cancelable `valuechanging`
//! event, the mutation itself, then a `valuechanged` event. Renderers
//! subscribe to `valuechanged` and read the structured change payload to
//! patch only what moved.

pub mod macros;

mod array;
mod bind;
mod coercible;
mod computed;
mod error;
mod event;
mod notifier;
mod validatable;
mod value;
mod var;

pub use array::{invert, ArrayChange, Comparator, ReactiveArray, SortFn, Splice};
pub use bind::{auto_bind, Bindable};
pub use coercible::Coercible;
pub use computed::Computed;
pub use error::{Error, Result};
pub use event::{ChangeEvent, EventKind};
pub use notifier::{Listen, ListenerId, Notifier, Subscription};
pub use validatable::Validatable;
pub use value::{Source, Value};
pub use var::{ValueChange, Var};

/// Which way a binding propagates between an observable and the UI.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum Binding {
	/// State flows to the UI only.
	To,
	/// State is written from the UI only.
	From,
	#[default]
	TwoWay,
}

impl Binding {
	pub fn name(self) -> &'static str {
		match self {
			Binding::To => "to",
			Binding::From => "from",
			Binding::TwoWay => "two-way",
		}
	}

	/// Whether changes should be pushed to the UI.
	pub fn pushes(self) -> bool {
		matches!(self, Binding::To | Binding::TwoWay)
	}

	/// Whether the UI should write back into the observable.
	pub fn pulls(self) -> bool {
		matches!(self, Binding::From | Binding::TwoWay)
	}
}

pub trait Observable: 'static {
	type Item;
	type Change: Clone + 'static;

	/// Current value. Never has side effects.
	fn get(&self) -> Self::Item;

	fn notifier(&self) -> &Notifier<Self::Change>;

	fn binding(&self) -> Binding {
		Binding::TwoWay
	}

	fn on_changing(&self, listener: impl Fn(&ChangeEvent<Self::Change>) + 'static) -> Subscription {
		self.notifier().listen(EventKind::Changing, listener)
	}

	fn on_changed(&self, listener: impl Fn(&ChangeEvent<Self::Change>) + 'static) -> Subscription {
		self.notifier().listen(EventKind::Changed, listener)
	}

	/// Sends a cancelable `valuechanging` event carrying `change`.
	/// Returns `false` if a listener vetoed it.
	fn notify_before(&self, change: Self::Change) -> bool {
		self.notifier().notify_before(change)
	}

	fn notify(&self, change: Self::Change) {
		self.notifier().notify(change)
	}

	/// Runs `apply` between a `valuechanging` and a `valuechanged` event.
	///
	/// If the first event is vetoed, `apply` is not called, nothing else
	/// is dispatched and [`Error::Uncommitted`] is returned.
	fn try_change<R>(&self, change: Self::Change, apply: impl FnOnce() -> R) -> Result<R> {
		if !self.notify_before(change.clone()) {
			tracing::debug!("change vetoed");
			return Err(Error::Uncommitted);
		}

		let result = apply();
		self.notify(change);
		Ok(result)
	}

	/// A computed value of `selector` applied to this observable.
	fn select<R, F>(&self, selector: F) -> Computed<R>
	where
		Self: Clone,
		F: Fn(&Self::Item) -> R + 'static,
		R: Clone + 'static,
	{
		let this = self.clone();
		Computed::new(move || selector(&this.get()), &[self as &dyn Dependency])
	}

	fn validatable<F>(self, validator: F) -> Validatable<Self>
	where
		Self: Clone,
		F: Fn(&Self::Item) -> bool + 'static,
	{
		Validatable::new(self, validator)
	}

	fn coercible<I, F>(self, coerce: F) -> Coercible<Self, I>
	where
		Self: Writable + Sized,
		F: Fn(I) -> Self::Item + 'static,
		I: 'static,
	{
		Coercible::new(self, coerce)
	}
}

pub trait Writable: Observable {
	/// Replaces the value through [`Observable::try_change`] and
	/// returns the value now held.
	fn set(&self, value: Self::Item) -> Result<Self::Item>;
}

/// Anything a [`Computed`] can depend on.
pub trait Dependency {
	/// Calls `on_change` after every committed change until it
	/// returns [`Listen::Unsubscribe`] or the subscription is dropped.
	fn watch(&self, on_change: Box<dyn Fn() -> Listen>) -> Subscription;
}

impl<O> Dependency for O
where
	O: Observable,
{
	fn watch(&self, on_change: Box<dyn Fn() -> Listen>) -> Subscription {
		self.notifier()
			.listen_until(EventKind::Changed, move |_| on_change())
	}
}
