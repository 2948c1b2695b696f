// winecellar - Wine bottle manager front-end core
//
// Library crate holding the coordination layer, domain services, and
// configuration. The binary crate (main.rs) wires a console frontend on
// top.

pub mod config;
pub mod coordination;
pub mod logging;
pub mod models;
pub mod services;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use coordination::{MainLoop, Notifier, NotifierSignal, TaskSlot, TaskSlotError};
pub use models::{Bottle, GeneralConfig, NewBottleSpec, UpdateRecord};
pub use services::{BottleStore, ProgramRunner, Wine, WineBottleStore};
pub use ui::CoordinationController;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
