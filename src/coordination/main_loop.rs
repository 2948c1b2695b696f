// MainLoop - the GUI-thread event loop and its cross-thread wakeup
//
// A real toolkit would provide both halves of this: the loop that runs on
// the main thread and a "dispatch back to the main thread" primitive.
// Frontends pump the loop from their own event processing; everything else
// in the crate only sees Notifier/NotifierSignal.
//
// The channel is the synchronization point: a worker writes its error
// payload, then signals; the GUI handler runs strictly after the receive,
// so the write is visible without any extra locking discipline.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Identifies one notifier within its owning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierId(usize);

enum LoopMessage {
    Dispatch(NotifierId),
    Quit,
}

type GuiHandler = Box<dyn FnMut()>;
type Registry = Rc<RefCell<Vec<Option<GuiHandler>>>>;

/// Single-threaded event loop owning the GUI-side handler registry.
///
/// Construct it on the thread that will run it; [`Notifier`]s and the
/// handlers bound to them live on that thread and never move.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<LoopMessage>,
    // Keeping one sender alive means try_recv never reports a closed
    // channel while the loop itself exists.
    tx: mpsc::UnboundedSender<LoopMessage>,
    registry: Registry,
    quit_requested: bool,
}

impl MainLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            tx,
            registry: Rc::new(RefCell::new(Vec::new())),
            quit_requested: false,
        }
    }

    /// Create a new notifier endpoint. Must be bound with
    /// [`Notifier::bind`] before anything signals it.
    pub fn notifier(&self) -> Notifier {
        let id = {
            let mut registry = self.registry.borrow_mut();
            registry.push(None);
            NotifierId(registry.len() - 1)
        };
        Notifier {
            id,
            registry: Rc::clone(&self.registry),
            tx: self.tx.clone(),
        }
    }

    /// Cloneable, `Send` handle used to stop the loop from anywhere.
    pub fn handle(&self) -> MainLoopHandle {
        MainLoopHandle {
            tx: self.tx.clone(),
        }
    }

    /// Block processing messages until a quit request arrives.
    pub fn run(&mut self) {
        tracing::debug!("main loop running");
        while !self.quit_requested {
            match self.rx.blocking_recv() {
                Some(message) => self.process(message),
                None => break,
            }
        }
        tracing::debug!("main loop stopped");
    }

    /// Process at most one pending message without blocking.
    ///
    /// Returns whether a message was processed. Frontends and tests use
    /// this to interleave loop turns with their own input handling.
    pub fn turn(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(message) => {
                self.process(message);
                true
            }
            Err(_) => false,
        }
    }

    /// Process one message, waiting up to `timeout` for it to arrive.
    pub fn turn_wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.turn() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn process(&mut self, message: LoopMessage) {
        match message {
            LoopMessage::Dispatch(id) => {
                // Take the handler out for the call so it may freely signal
                // notifiers (its own included) while running.
                let mut handler = self.registry.borrow_mut()[id.0]
                    .take()
                    .unwrap_or_else(|| panic!("notifier {:?} signaled before bind", id));
                handler();
                self.registry.borrow_mut()[id.0] = Some(handler);
            }
            LoopMessage::Quit => {
                self.quit_requested = true;
            }
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle for requesting loop shutdown from any thread.
#[derive(Clone)]
pub struct MainLoopHandle {
    tx: mpsc::UnboundedSender<LoopMessage>,
}

impl MainLoopHandle {
    pub fn quit(&self) {
        let _ = self.tx.send(LoopMessage::Quit);
    }
}

/// GUI-side endpoint of a cross-thread notification.
///
/// Lives for the lifetime of its loop and is bound exactly once during the
/// wire-up phase; a second bind is a construction-order bug and aborts with
/// a diagnostic rather than silently replacing the handler.
pub struct Notifier {
    id: NotifierId,
    registry: Registry,
    tx: mpsc::UnboundedSender<LoopMessage>,
}

impl Notifier {
    /// Bind the GUI-thread handler invoked once per signal.
    ///
    /// # Panics
    /// Panics if the notifier is already bound.
    pub fn bind(&self, handler: impl FnMut() + 'static) {
        let mut registry = self.registry.borrow_mut();
        let slot = &mut registry[self.id.0];
        if slot.is_some() {
            panic!("notifier {:?} bound twice", self.id);
        }
        *slot = Some(Box::new(handler));
    }

    /// Detachable signaling half, safe to hand to worker threads.
    pub fn signal_handle(&self) -> NotifierSignal {
        NotifierSignal {
            id: self.id,
            tx: self.tx.clone(),
        }
    }

    /// Schedule one invocation of the bound handler on the loop thread.
    pub fn signal(&self) {
        let _ = self.tx.send(LoopMessage::Dispatch(self.id));
    }
}

/// `Send + Clone` signaling handle for a [`Notifier`].
///
/// Each `signal` call schedules exactly one handler invocation on the GUI
/// thread. Signals from the same thread arrive in order; no ordering is
/// guaranteed across different notifiers on different threads.
#[derive(Clone)]
pub struct NotifierSignal {
    id: NotifierId,
    tx: mpsc::UnboundedSender<LoopMessage>,
}

impl NotifierSignal {
    pub fn signal(&self) {
        if self.tx.send(LoopMessage::Dispatch(self.id)).is_err() {
            tracing::warn!("notifier {:?} signaled after its loop shut down", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_signal_invokes_bound_handler_once_per_call() {
        let mut main_loop = MainLoop::new();
        let notifier = main_loop.notifier();
        let hits = Rc::new(RefCell::new(0));

        let hits_clone = Rc::clone(&hits);
        notifier.bind(move || *hits_clone.borrow_mut() += 1);

        notifier.signal();
        notifier.signal();
        assert!(main_loop.turn());
        assert!(main_loop.turn());
        assert!(!main_loop.turn());
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_signals_from_one_thread_arrive_in_order() {
        let mut main_loop = MainLoop::new();
        let first = main_loop.notifier();
        let second = main_loop.notifier();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        first.bind(move || log_a.borrow_mut().push("first"));
        let log_b = Rc::clone(&log);
        second.bind(move || log_b.borrow_mut().push("second"));

        let signal_first = first.signal_handle();
        let signal_second = second.signal_handle();
        std::thread::spawn(move || {
            signal_first.signal();
            signal_second.signal();
            signal_first.signal();
        })
        .join()
        .unwrap();

        for _ in 0..3 {
            assert!(main_loop.turn_wait(Duration::from_secs(1)));
        }
        assert_eq!(*log.borrow(), vec!["first", "second", "first"]);
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn test_binding_twice_panics() {
        let main_loop = MainLoop::new();
        let notifier = main_loop.notifier();
        notifier.bind(|| {});
        notifier.bind(|| {});
    }

    #[test]
    fn test_quit_stops_run() {
        let mut main_loop = MainLoop::new();
        let handle = main_loop.handle();
        std::thread::spawn(move || handle.quit());
        main_loop.run();
        assert!(main_loop.quit_requested());
    }

    #[test]
    fn test_handler_may_signal_its_own_notifier() {
        let mut main_loop = MainLoop::new();
        let notifier = main_loop.notifier();
        let signal = notifier.signal_handle();
        let hits = Rc::new(RefCell::new(0));

        let hits_clone = Rc::clone(&hits);
        notifier.bind(move || {
            let mut count = hits_clone.borrow_mut();
            *count += 1;
            if *count == 1 {
                signal.signal();
            }
        });

        notifier.signal();
        assert!(main_loop.turn());
        assert!(main_loop.turn());
        assert_eq!(*hits.borrow(), 2);
    }
}
