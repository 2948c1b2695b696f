//! UI surface contracts.
//!
//! Surfaces are the windows of the application as the controller sees
//! them: thread-unsafe objects whose methods must only be invoked from the
//! GUI thread. Each surface exposes its intent events through
//! [`EventSource`]s the controller subscribes to during the bind phase.
//! Worker threads never touch a surface; their only way back is a
//! notifier signal.

use crate::coordination::EventSource;
use crate::models::{Bottle, NewBottleSpec, PackageInstall, RunProgramRequest, UpdateRecord};

/// Raw pointer event kind as delivered by a toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    ButtonPress,
    ButtonRelease,
    Motion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u8),
}

/// A raw pointer event, inspected by the controller's right-click routing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
}

/// The main window: error dialogs, the busy dialog, and the bottle list.
pub trait MainSurface {
    fn show_error_message(&self, message: &str);
    fn show_busy_dialog(&self, message: &str);
    fn close_busy_dialog(&self);
    fn refresh_bottle_list(&self, bottles: &[Bottle]);
    fn run_program_requested(&self) -> &EventSource<RunProgramRequest>;
}

/// The new-bottle wizard.
pub trait WizardSurface {
    /// Creation finished (or collapsed): reset and close the wizard.
    fn bottle_created(&self);
    fn new_bottle_requested(&self) -> &EventSource<NewBottleSpec>;
}

/// The edit window for an existing bottle.
pub trait EditSurface {
    /// Update finished (or collapsed): hide the busy indicator and close.
    fn bottle_updated(&self);
    fn bottle_removed(&self);
    fn update_requested(&self) -> &EventSource<UpdateRecord>;
    fn remove_requested(&self) -> &EventSource<String>;
}

/// The configure window offering package installs.
pub trait ConfigureSurface {
    /// An install finished: refresh the installed-packages view.
    fn update_installed(&self);
    fn install_requested(&self) -> &EventSource<PackageInstall>;
}

/// The context menu popped up over the bottle list.
pub trait MenuSurface {
    fn popup_machine_menu(&self, x: f64, y: f64);
}
