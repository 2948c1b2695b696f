//! UI layer: the coordination controller, the surface contracts it talks
//! to, form assembly, and the console frontend shipped with the binary.

pub mod console;
pub mod controller;
pub mod forms;
pub mod surfaces;

pub use controller::{CoordinationController, SharedErrorMessage, BUSY_MESSAGE};
pub use forms::{EditForm, WizardForm};
pub use surfaces::{
    ConfigureSurface, EditSurface, MainSurface, MenuSurface, MouseButton, PointerEvent,
    PointerEventKind, WizardSurface,
};
