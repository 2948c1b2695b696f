//! Services - bottle business logic, free of any UI dependency.
//!
//! - [`Wine`]: wine discovery and prefix-scoped command execution
//! - [`BottleStore`] / [`WineBottleStore`]: synchronous create/update/
//!   install/remove operations over a bottles root directory, submitted by
//!   the coordination layer as background tasks
//! - [`ProgramRunner`]: launches Windows programs and reports abnormal
//!   exits back to the GUI thread through its failure notifier
//!
//! Nothing in here touches a UI surface. The only route from a background
//! thread back to the GUI is a `NotifierSignal`.

pub mod bottle_store;
pub mod runner;
pub mod wine;

pub use bottle_store::{BottleStore, StoreError, WineBottleStore};
pub use runner::ProgramRunner;
pub use wine::{Wine, WineError};
