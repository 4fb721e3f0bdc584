use crate::notifier::Subscription;
use crate::value::{Source, Value};
use crate::{Computed, ReactiveArray, Validatable, Var};

/// Either a plain value or an observable to bind a UI property to.
pub enum Bindable<T> {
	Static(T),
	Observed(Value<T>),
}

impl<T> From<Value<T>> for Bindable<T> {
	fn from(value: Value<T>) -> Self {
		Bindable::Observed(value)
	}
}

impl<T> From<Var<T>> for Bindable<T>
where
	T: Clone + PartialEq + 'static,
{
	fn from(var: Var<T>) -> Self {
		Bindable::Observed(Value::new(var))
	}
}

impl<T> From<Computed<T>> for Bindable<T>
where
	T: Clone + 'static,
{
	fn from(computed: Computed<T>) -> Self {
		Bindable::Observed(Value::new(computed))
	}
}

impl<T> From<ReactiveArray<T>> for Bindable<Vec<T>>
where
	T: Clone + 'static,
{
	fn from(array: ReactiveArray<T>) -> Self {
		Bindable::Observed(Value::new(array))
	}
}

impl<O, T> From<Validatable<O>> for Bindable<T>
where
	O: Source<T> + Clone,
	T: 'static,
{
	fn from(validatable: Validatable<O>) -> Self {
		Bindable::Observed(Value::new(validatable))
	}
}

/// Wires `source` into a UI property.
///
/// `set` is called once with the current value. When the binding pushes
/// (`to` or `two-way`), `set` is also called after every change for as long
/// as the returned subscription is kept. When it pulls (`from` or `two-way`),
/// `observe` is called once with the current value; hooking up the UI event
/// that writes back into the observable is up to the caller.
pub fn auto_bind<T>(
	source: impl Into<Bindable<T>>,
	set: impl Fn(T) + 'static,
	observe: Option<&dyn Fn(T)>,
) -> Option<Subscription>
where
	T: 'static,
{
	match source.into() {
		Bindable::Static(value) => {
			set(value);
			None
		}
		Bindable::Observed(source) => {
			let binding = source.binding();
			set(source.get());

			let subscription = if binding.pushes() {
				Some(source.subscribe(set))
			} else {
				None
			};

			if binding.pulls() {
				if let Some(observe) = observe {
					observe(source.get());
				}
			}

			subscription
		}
	}
}
