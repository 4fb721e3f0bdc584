use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::notifier::{Listen, Notifier, Subscription};
use crate::value::Source;
use crate::{Binding, Dependency, Observable};

/// A value derived from other observables.
///
/// Every committed change of a dependency clears the cached value and
/// sends a `valuechanged` event; the value is recomputed on the next read.
/// Two dependencies changing one after the other produce two events.
pub struct Computed<T> {
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

struct ComputedBody<T> {
	func: Box<dyn Fn() -> T>,
	value: RefCell<Option<T>>,
	notifier: Notifier<()>,
	dependencies: RefCell<SmallVec<[Subscription; 2]>>,
}

impl<T> Drop for ComputedBody<T> {
	fn drop(&mut self) {
		let dependencies = std::mem::take(self.dependencies.get_mut());
		tracing::trace!(count = dependencies.len(), "releasing computed dependencies");
	}
}

impl<T> ComputedBody<T> {
	fn invalidate(&self) {
		let stale = self.value.borrow_mut().take();
		std::mem::drop(stale);
		self.notifier.notify(());
	}
}

impl<T> Computed<T>
where
	T: Clone + 'static,
{
	pub fn new(func: impl Fn() -> T + 'static, dependencies: &[&dyn Dependency]) -> Self {
		let body = Rc::new(ComputedBody {
			func: Box::new(func),
			value: RefCell::new(None),
			notifier: Notifier::new(),
			dependencies: RefCell::new(SmallVec::new()),
		});

		let subscriptions = dependencies
			.iter()
			.map(|dependency| {
				let this = Rc::downgrade(&body);
				dependency.watch(Box::new(move || match this.upgrade() {
					Some(body) => {
						body.invalidate();
						Listen::Keep
					}
					None => {
						tracing::trace!("computed is gone, dropping its listener");
						Listen::Unsubscribe
					}
				}))
			})
			.collect();

		*body.dependencies.borrow_mut() = subscriptions;

		Computed { body }
	}

	/// A computed value without dependencies. It never changes.
	pub fn constant(value: T) -> Self {
		Computed::new(move || value.clone(), &[])
	}

	pub fn get(&self) -> T {
		let cached = self.body.value.borrow().clone();
		if let Some(value) = cached {
			return value;
		}

		let value = (self.body.func)();
		*self.body.value.borrow_mut() = Some(value.clone());
		value
	}

	pub fn dependency_count(&self) -> usize {
		self.body.dependencies.borrow().len()
	}
}

impl<T> Observable for Computed<T>
where
	T: Clone + 'static,
{
	type Item = T;
	type Change = ();

	fn get(&self) -> T {
		Computed::get(self)
	}

	fn notifier(&self) -> &Notifier<()> {
		&self.body.notifier
	}

	fn binding(&self) -> Binding {
		Binding::To
	}
}

impl<T> Source<T> for Computed<T>
where
	T: Clone + 'static,
{
	fn read(&self) -> T {
		self.get()
	}

	fn direction(&self) -> Binding {
		Observable::binding(self)
	}

	fn subscribe(&self, on_value: Box<dyn Fn(T)>) -> Subscription {
		let this = Rc::downgrade(&self.body);
		self.body.notifier.listen_until(crate::EventKind::Changed, move |_| {
			match this.upgrade() {
				Some(body) => {
					on_value(Computed { body }.get());
					Listen::Keep
				}
				None => Listen::Unsubscribe,
			}
		})
	}
}

impl<T> Debug for Computed<T>
where
	T: Clone + Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get().fmt(f)
	}
}
