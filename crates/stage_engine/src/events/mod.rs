//! Observer lists for engine notifications
//!
//! A [`Signal`] keeps its handlers in registration order. Connecting returns a
//! [`ConnectionId`]; the id stays valid only while the publisher still holds
//! the registration, so callers check `is_connected` instead of holding
//! references into the signal.

use crate::foundation::ids::{ConnectionId, IdGenerator};

type Handler<A> = Box<dyn FnMut(&A)>;

/// Publisher with any number of subscribed handlers
pub struct Signal<A> {
    ids: IdGenerator,
    handlers: Vec<(ConnectionId, Handler<A>)>,
}

impl<A> Signal<A> {
    /// Signal with no handlers
    pub const fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            handlers: Vec::new(),
        }
    }

    /// Subscribe a handler
    pub fn connect(&mut self, handler: impl FnMut(&A) + 'static) -> ConnectionId {
        let id = self.ids.next();
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Whether the registration is still live
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.handlers.iter().any(|(handler_id, _)| *handler_id == id)
    }

    /// Call every handler in registration order
    pub fn emit(&mut self, args: &A) {
        for (_, handler) in &mut self.handlers {
            handler(args);
        }
    }

    /// Number of live handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_handlers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let first = Rc::clone(&seen);
        signal.connect(move |v| first.borrow_mut().push(("first", *v)));
        let second = Rc::clone(&seen);
        signal.connect(move |v| second.borrow_mut().push(("second", *v)));

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut signal = Signal::<()>::new();
        let id = signal.connect(|()| {});
        assert!(signal.is_connected(id));

        assert!(signal.disconnect(id));
        assert!(!signal.is_connected(id));
        assert!(!signal.disconnect(id));
        assert!(signal.is_empty());
    }

    #[test]
    fn test_disconnected_handler_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut signal = Signal::<()>::new();
        let counter = Rc::clone(&count);
        let id = signal.connect(move |()| *counter.borrow_mut() += 1);

        signal.emit(&());
        signal.disconnect(id);
        signal.emit(&());
        assert_eq!(*count.borrow(), 1);
    }
}
