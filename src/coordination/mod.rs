//! Coordination between the GUI thread and background work.
//!
//! Three small pieces carry the whole concurrency story of the
//! application:
//!
//! - [`MainLoop`] / [`Notifier`] / [`NotifierSignal`]: the GUI-thread event
//!   loop and its cross-thread wakeup. A worker signals; the bound handler
//!   runs on the loop thread, strictly after whatever the worker wrote
//!   before signaling (the channel provides the happens-before edge).
//! - [`TaskSlot`]: the single-occupancy worker guard. At most one
//!   background task is ever in flight; rejected submissions are dropped,
//!   not queued.
//! - [`EventSource`]: same-thread subscribe/emit used by UI surfaces to
//!   publish intent events to the controller.
//!
//! The GUI thread never blocks on a worker. The one blocking join lives in
//! [`TaskSlot::retire`], which only joins a worker that has already marked
//! itself complete.

pub mod event;
pub mod main_loop;
pub mod task_slot;

pub use event::EventSource;
pub use main_loop::{MainLoop, MainLoopHandle, Notifier, NotifierSignal};
pub use task_slot::{CompletionToken, TaskSlot, TaskSlotError};
