//! Broadcast/subscribe channel owned by its publisher.
//!
//! A [`Signal`] holds an ordered list of listeners. Emission iterates a
//! snapshot of that list, so listeners may subscribe or unsubscribe while
//! being called. A listener that panics is logged and skipped; the remaining
//! listeners still run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Rc<RefCell<Box<dyn FnMut(&T)>>>;

/// A single-threaded observer list.
pub struct Signal<T> {
    name: &'static str,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Signal<T> {
    /// Creates an empty signal. `name` is used in log lines only.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers a listener; listeners are invoked in subscription order.
    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(Box::new(listener)))));
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Number of subscribed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Invokes every listener with `payload`.
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<(SubscriptionId, Listener<T>)> = self.listeners.borrow().clone();
        if snapshot.is_empty() {
            tracing::trace!(signal = self.name, "emitted with no listeners");
            return;
        }

        for (id, listener) in snapshot {
            // A listener re-emitting its own signal would re-enter itself.
            let Ok(mut callback) = listener.try_borrow_mut() else {
                tracing::warn!(signal = self.name, subscription = id.0, "skipping re-entrant listener");
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (callback)(payload)));
            if outcome.is_err() {
                tracing::error!(signal = self.name, subscription = id.0, "listener panicked");
            }
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_invokes_listeners_in_subscription_order() {
        // Arrange
        let signal = Signal::<u32>::new("test");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&seen);
        let second = Rc::clone(&seen);
        signal.subscribe(move |value| first.borrow_mut().push(("first", *value)));
        signal.subscribe(move |value| second.borrow_mut().push(("second", *value)));

        // Act
        signal.emit(&7);

        // Assert
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        // Arrange
        let signal = Signal::<()>::new("test");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        signal.subscribe(|()| panic!("listener failure"));
        signal.subscribe(move |()| counter.set(counter.get() + 1));

        // Act
        signal.emit(&());
        signal.emit(&());

        // Assert
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_listener() {
        // Arrange
        let signal = Signal::<()>::new("test");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = signal.subscribe(move |()| counter.set(counter.get() + 1));

        // Act
        let removed = signal.unsubscribe(id);
        signal.emit(&());

        // Assert
        assert!(removed);
        assert!(!signal.unsubscribe(id));
        assert_eq!(hits.get(), 0);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        // Arrange
        let signal = Rc::new(Signal::<()>::new("test"));
        let inner = Rc::clone(&signal);
        signal.subscribe(move |()| {
            inner.subscribe(|()| {});
        });

        // Act
        signal.emit(&());

        // Assert
        assert_eq!(signal.listener_count(), 2);
    }

    #[test]
    fn test_emit_without_listeners_is_a_no_op() {
        let signal = Signal::<String>::new("test");

        signal.emit(&"payload".to_owned());

        assert_eq!(signal.listener_count(), 0);
    }
}
