//! Data models for the winecellar application.
//!
//! - [`Bottle`], [`NewBottleSpec`], [`UpdateRecord`], [`PackageInstall`]:
//!   the bottle domain values passed between the GUI thread and background
//!   tasks
//! - [`GeneralConfig`]: application settings persisted in the data directory
//! - [`BottleConfig`]: per-bottle settings persisted inside each prefix
//!
//! All of these are plain cloneable values; anything long-running receives
//! its own copy when a task is submitted, so there is no shared mutation.

pub mod bottle;
pub mod config;

pub use bottle::{
    is_valid_resolution, AudioDriver, Bit, Bottle, NewBottleSpec, Package, PackageInstall,
    RunProgramRequest, UpdateRecord, WindowsVersion, DEFAULT_DEBUG_LOG_LEVEL,
    DEFAULT_VIRTUAL_DESKTOP_RESOLUTION, MAX_DEBUG_LOG_LEVEL,
};
pub use config::{BottleConfig, GeneralConfig};
