use std::cell::Cell;
use std::fmt::Debug;
use std::ops::Deref;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum EventKind {
	/// Sent before a mutation. Listeners may veto it.
	Changing,
	/// Sent after a mutation was committed.
	Changed,
}

impl EventKind {
	pub fn name(self) -> &'static str {
		match self {
			EventKind::Changing => "valuechanging",
			EventKind::Changed => "valuechanged",
		}
	}
}

/// An event whose payload fields are read directly off the event:
///
/// ```
/// use rebind::{Observable, Var};
///
/// let var = Var::new(1);
/// let _sub = var.on_changed(|event| {
///     assert_eq!(event.old_value, 1);
///     assert_eq!(event.new_value, 2);
/// });
/// var.set(2).unwrap();
/// ```
pub struct ChangeEvent<C> {
	kind: EventKind,
	cancelable: bool,
	canceled: Cell<bool>,
	change: C,
}

impl<C> ChangeEvent<C> {
	pub fn new(kind: EventKind, change: C, cancelable: bool) -> Self {
		ChangeEvent {
			kind,
			cancelable,
			canceled: Cell::new(false),
			change,
		}
	}

	pub fn kind(&self) -> EventKind {
		self.kind
	}

	pub fn cancelable(&self) -> bool {
		self.cancelable
	}

	/// Veto the pending change. Ignored when the event is not cancelable.
	pub fn prevent_default(&self) {
		if self.cancelable {
			self.canceled.set(true);
		}
	}

	pub fn default_prevented(&self) -> bool {
		self.canceled.get()
	}

	pub fn change(&self) -> &C {
		&self.change
	}

	pub fn into_change(self) -> C {
		self.change
	}
}

impl<C> Deref for ChangeEvent<C> {
	type Target = C;

	fn deref(&self) -> &Self::Target {
		&self.change
	}
}

impl<C> Debug for ChangeEvent<C>
where
	C: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChangeEvent")
			.field("type", &self.kind.name())
			.field("cancelable", &self.cancelable)
			.field("canceled", &self.canceled.get())
			.field("change", &self.change)
			.finish()
	}
}
