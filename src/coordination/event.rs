use std::cell::RefCell;

/// Same-thread subscribe/emit capability for UI intent events.
///
/// Surfaces own one `EventSource` per intent (new bottle requested, update
/// requested, ...) and the controller connects its handlers during the
/// one-time bind phase. Everything stays on the GUI thread, so handlers are
/// plain boxed closures without `Send` bounds.
///
/// Handlers must be connected during setup, before events start flowing;
/// connecting from inside a handler of the same source is a construction
/// bug and will panic on the interior borrow.
pub struct EventSource<T> {
    handlers: RefCell<Vec<Box<dyn Fn(&T)>>>,
}

impl<T> EventSource<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler; every later `emit` invokes it.
    pub fn connect(&self, handler: impl Fn(&T) + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    /// Invoke all connected handlers, in subscription order.
    pub fn emit(&self, payload: &T) {
        for handler in self.handlers.borrow().iter() {
            handler(payload);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl<T> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}
