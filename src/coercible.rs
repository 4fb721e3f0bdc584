use std::rc::Rc;

use crate::error::Result;
use crate::notifier::Notifier;
use crate::{Binding, Observable, Writable};

/// Converts written input before handing it to the wrapped observable.
/// Reads are not converted.
///
/// ```
/// use rebind::{Observable, Var};
///
/// let age = Var::new(0u32).coercible(|input: String| input.trim().parse().unwrap_or(0));
/// age.set(" 42 ".to_string()).unwrap();
/// assert_eq!(age.get(), 42);
/// ```
pub struct Coercible<O, I>
where
	O: Observable,
{
	inner: O,
	coerce: Rc<dyn Fn(I) -> O::Item>,
}

impl<O, I> Clone for Coercible<O, I>
where
	O: Observable + Clone,
{
	fn clone(&self) -> Self {
		Coercible {
			inner: self.inner.clone(),
			coerce: self.coerce.clone(),
		}
	}
}

impl<O, I> Coercible<O, I>
where
	O: Writable,
	I: 'static,
{
	pub fn new(inner: O, coerce: impl Fn(I) -> O::Item + 'static) -> Self {
		Coercible {
			inner,
			coerce: Rc::new(coerce),
		}
	}

	pub fn set(&self, input: I) -> Result<O::Item> {
		self.inner.set((self.coerce)(input))
	}

	pub fn inner(&self) -> &O {
		&self.inner
	}
}

impl<O, I> Observable for Coercible<O, I>
where
	O: Observable,
	I: 'static,
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
