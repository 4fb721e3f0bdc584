use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::event::{ChangeEvent, EventKind};

pub type ListenerId = u64;

/// Most observables are watched by one or two renderer bindings
/// and a handful of computed values.
const INLINE_LISTENERS: usize = 4;

/// Returned by internal listeners to ask the notifier to drop them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Listen {
	Keep,
	Unsubscribe,
}

type ListenerFn<C> = dyn Fn(&ChangeEvent<C>) -> Listen;

struct Entry<C> {
	id: ListenerId,
	func: Rc<ListenerFn<C>>,
}

type EntryList<C> = SmallVec<[Entry<C>; INLINE_LISTENERS]>;

struct Listeners<C> {
	next_id: ListenerId,
	changing: EntryList<C>,
	changed: EntryList<C>,
}

impl<C> Listeners<C> {
	fn list(&self, kind: EventKind) -> &EntryList<C> {
		match kind {
			EventKind::Changing => &self.changing,
			EventKind::Changed => &self.changed,
		}
	}

	fn list_mut(&mut self, kind: EventKind) -> &mut EntryList<C> {
		match kind {
			EventKind::Changing => &mut self.changing,
			EventKind::Changed => &mut self.changed,
		}
	}
}

trait Detach {
	fn detach(&self, kind: EventKind, ids: &[ListenerId]);
	fn contains(&self, kind: EventKind, id: ListenerId) -> bool;
}

impl<C> Detach for RefCell<Listeners<C>> {
	fn detach(&self, kind: EventKind, ids: &[ListenerId]) {
		let removed: EntryList<C> = {
			let mut listeners = self.borrow_mut();
			let list = listeners.list_mut(kind);
			let mut removed = EntryList::new();
			let mut i = 0;
			while i < list.len() {
				if ids.contains(&list[i].id) {
					removed.push(list.remove(i));
				} else {
					i += 1;
				}
			}
			removed
		};

		// Closures may own subscriptions of their own, which would
		// re-enter this list when dropped.
		std::mem::drop(removed);
	}

	fn contains(&self, kind: EventKind, id: ListenerId) -> bool {
		self.borrow().list(kind).iter().any(|entry| entry.id == id)
	}
}

/// The event-dispatch surface of an observable.
///
/// Listeners are called synchronously, in registration order, over a
/// snapshot of the list. A listener added during a dispatch is first
/// called on the next one; a listener removed during a dispatch still
/// sees the current one.
pub struct Notifier<C> {
	listeners: Rc<RefCell<Listeners<C>>>,
}

impl<C> Default for Notifier<C> {
	fn default() -> Self {
		Notifier::new()
	}
}

impl<C> Notifier<C> {
	pub fn new() -> Self {
		Notifier {
			listeners: Rc::new(RefCell::new(Listeners {
				next_id: 0,
				changing: SmallVec::new_const(),
				changed: SmallVec::new_const(),
			})),
		}
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.borrow().list(kind).len()
	}
}

impl<C> Notifier<C>
where
	C: 'static,
{
	pub fn listen(&self, kind: EventKind, func: impl Fn(&ChangeEvent<C>) + 'static) -> Subscription {
		self.listen_until(kind, move |event| {
			func(event);
			Listen::Keep
		})
	}

	/// Like [`Notifier::listen`], but the listener removes itself
	/// by returning [`Listen::Unsubscribe`].
	pub fn listen_until(
		&self,
		kind: EventKind,
		func: impl Fn(&ChangeEvent<C>) -> Listen + 'static,
	) -> Subscription {
		let id = {
			let mut listeners = self.listeners.borrow_mut();
			let id = listeners.next_id;
			listeners.next_id += 1;
			listeners.list_mut(kind).push(Entry {
				id,
				func: Rc::new(func),
			});
			id
		};

		let target = Rc::downgrade(&self.listeners) as Weak<dyn Detach>;
		Subscription {
			handle: Some(Handle { target, kind, id }),
		}
	}

	pub fn dispatch(&self, event: &ChangeEvent<C>) {
		let kind = event.kind();
		let snapshot: SmallVec<[(ListenerId, Rc<ListenerFn<C>>); INLINE_LISTENERS]> = self
			.listeners
			.borrow()
			.list(kind)
			.iter()
			.map(|entry| (entry.id, entry.func.clone()))
			.collect();

		tracing::trace!(event = kind.name(), listeners = snapshot.len(), "dispatch");

		let mut finished = SmallVec::<[ListenerId; INLINE_LISTENERS]>::new();
		for (id, func) in snapshot {
			if func(event) == Listen::Unsubscribe {
				finished.push(id);
			}
		}

		if !finished.is_empty() {
			self.listeners.detach(kind, &finished);
		}
	}

	/// Sends a cancelable `valuechanging` event.
	/// Returns `false` when a listener vetoed the change.
	pub fn notify_before(&self, change: C) -> bool {
		let event = ChangeEvent::new(EventKind::Changing, change, true);
		self.dispatch(&event);
		!event.default_prevented()
	}

	pub fn notify(&self, change: C) {
		self.dispatch(&ChangeEvent::new(EventKind::Changed, change, false));
	}
}

struct Handle {
	target: Weak<dyn Detach>,
	kind: EventKind,
	id: ListenerId,
}

/// Keeps a listener registered. Dropping it removes the listener.
#[must_use = "dropping a `Subscription` removes its listener"]
pub struct Subscription {
	handle: Option<Handle>,
}

impl Subscription {
	/// Removes the listener now. Same as dropping the subscription.
	pub fn unsubscribe(self) {
		drop(self)
	}

	/// Leaves the listener registered for as long as the observable lives.
	pub fn detach(mut self) {
		self.handle = None;
	}

	/// `false` once the listener was removed or its observable dropped.
	pub fn is_active(&self) -> bool {
		match &self.handle {
			Some(handle) => handle
				.target
				.upgrade()
				.map_or(false, |target| target.contains(handle.kind, handle.id)),
			None => false,
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.take() {
			if let Some(target) = handle.target.upgrade() {
				target.detach(handle.kind, &[handle.id]);
			}
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut s = f.debug_struct("Subscription");
		if let Some(handle) = &self.handle {
			s.field("event", &handle.kind.name()).field("id", &handle.id);
		}
		s.finish()
	}
}
