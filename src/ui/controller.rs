// CoordinationController - routes UI intents and task completions
//
// The single place where intent events either become direct same-thread
// calls or background task submissions, and where task completions are
// routed back into surface mutations. One TaskSlot caps background work at
// a single worker; one notifier per event kind carries completions back to
// the GUI thread.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};

use crate::coordination::{MainLoop, Notifier, NotifierSignal, TaskSlot, TaskSlotError};
use crate::models::{NewBottleSpec, PackageInstall, RunProgramRequest, UpdateRecord};
use crate::services::{BottleStore, ProgramRunner};
use crate::ui::surfaces::{
    ConfigureSurface, EditSurface, MainSurface, MenuSurface, MouseButton, PointerEvent,
    PointerEventKind, WizardSurface,
};

/// Shown when a second task is requested while one is in flight.
pub const BUSY_MESSAGE: &str = "There is already running a thread. Please wait...";

/// Shown when a launched Windows program exits abnormally.
pub const EXEC_FAILURE_MESSAGE: &str =
    "Executing the selected Windows application on Wine went wrong.";

/// Single-writer/single-reader error handoff between a failing worker and
/// the GUI thread.
///
/// The worker sets the message before signaling its error notifier; the
/// handler takes it after the wakeup, so the notifier's channel ordering
/// makes the write visible. `take` clears the slot, keeping a later
/// failure from ever showing a stale message.
#[derive(Clone, Default)]
pub struct SharedErrorMessage {
    inner: Arc<Mutex<String>>,
}

impl SharedErrorMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, message: impl Into<String>) {
        *self.inner.lock().unwrap() = message.into();
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }
}

pub struct CoordinationController {
    // Handed to bound handlers, which must not keep the controller alive.
    self_weak: Weak<CoordinationController>,

    store: Arc<dyn BottleStore>,
    runner: ProgramRunner,

    main_surface: Rc<dyn MainSurface>,
    wizard: Rc<dyn WizardSurface>,
    edit: Rc<dyn EditSurface>,
    configure: Rc<dyn ConfigureSurface>,
    menu: Rc<dyn MenuSurface>,

    task_slot: RefCell<TaskSlot>,
    error_message: SharedErrorMessage,

    created: Notifier,
    created_signal: NotifierSignal,
    updated: Notifier,
    updated_signal: NotifierSignal,
    error_created: Notifier,
    error_created_signal: NotifierSignal,
    error_updated: Notifier,
    error_updated_signal: NotifierSignal,
    installed: Notifier,
    installed_signal: NotifierSignal,
    error_installed: Notifier,
    error_installed_signal: NotifierSignal,

    bound: Cell<bool>,
}

impl CoordinationController {
    /// Construct the controller and its notifiers.
    ///
    /// All surfaces must already exist; [`connect_signals`] performs the
    /// actual wiring.
    ///
    /// [`connect_signals`]: Self::connect_signals
    pub fn new(
        main_loop: &MainLoop,
        store: Arc<dyn BottleStore>,
        runner: ProgramRunner,
        main_surface: Rc<dyn MainSurface>,
        wizard: Rc<dyn WizardSurface>,
        edit: Rc<dyn EditSurface>,
        configure: Rc<dyn ConfigureSurface>,
        menu: Rc<dyn MenuSurface>,
    ) -> Rc<Self> {
        let created = main_loop.notifier();
        let updated = main_loop.notifier();
        let error_created = main_loop.notifier();
        let error_updated = main_loop.notifier();
        let installed = main_loop.notifier();
        let error_installed = main_loop.notifier();

        Rc::new_cyclic(|self_weak| Self {
            self_weak: self_weak.clone(),
            store,
            runner,
            main_surface,
            wizard,
            edit,
            configure,
            menu,
            task_slot: RefCell::new(TaskSlot::new()),
            error_message: SharedErrorMessage::new(),
            created_signal: created.signal_handle(),
            created,
            updated_signal: updated.signal_handle(),
            updated,
            error_created_signal: error_created.signal_handle(),
            error_created,
            error_updated_signal: error_updated.signal_handle(),
            error_updated,
            installed_signal: installed.signal_handle(),
            installed,
            error_installed_signal: error_installed.signal_handle(),
            error_installed,
            bound: Cell::new(false),
        })
    }

    /// One-time bind phase connecting every intent source and notifier.
    ///
    /// Handlers hold weak references back to the controller, so dropping
    /// the last strong reference tears everything down (and joins any
    /// in-flight worker through the TaskSlot).
    ///
    /// # Panics
    /// Panics when called twice; rebinding is a construction-order bug.
    pub fn connect_signals(&self) {
        if self.bound.replace(true) {
            panic!("controller signals bound twice");
        }

        // Intent events from the surfaces.
        let controller = self.self_weak.clone();
        self.wizard.new_bottle_requested().connect(move |spec| {
            if let Some(controller) = controller.upgrade() {
                controller.on_new_bottle(spec);
            }
        });
        let controller = self.self_weak.clone();
        self.edit.update_requested().connect(move |record| {
            if let Some(controller) = controller.upgrade() {
                controller.on_update_bottle(record);
            }
        });
        let controller = self.self_weak.clone();
        self.edit.remove_requested().connect(move |name| {
            if let Some(controller) = controller.upgrade() {
                controller.on_remove_bottle(name);
            }
        });
        let controller = self.self_weak.clone();
        self.configure.install_requested().connect(move |request| {
            if let Some(controller) = controller.upgrade() {
                controller.on_install_package(request);
            }
        });
        let controller = self.self_weak.clone();
        self.main_surface
            .run_program_requested()
            .connect(move |request| {
                if let Some(controller) = controller.upgrade() {
                    controller.on_run_program(request);
                }
            });

        // Completion and error notifiers, each bound exactly once.
        self.created.bind(self.handler(Self::on_bottle_created));
        self.updated.bind(self.handler(Self::on_bottle_updated));
        self.error_created
            .bind(self.handler(Self::on_error_during_create));
        self.error_updated
            .bind(self.handler(Self::on_error_during_update));
        self.installed.bind(self.handler(Self::on_package_installed));
        self.error_installed
            .bind(self.handler(Self::on_error_during_install));

        // Failures of launched programs are detected off the GUI thread;
        // the runner's notifier brings the message box back onto it.
        let main_surface = Rc::clone(&self.main_surface);
        self.runner
            .connect_failure(move || main_surface.show_error_message(EXEC_FAILURE_MESSAGE));

        tracing::debug!("controller signals connected");
    }

    fn handler(&self, method: fn(&Self)) -> Box<dyn FnMut() + 'static> {
        let weak: Weak<Self> = self.self_weak.clone();
        Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                method(&controller);
            }
        })
    }

    pub fn is_task_running(&self) -> bool {
        self.task_slot.borrow().is_occupied()
    }

    /// Read the bottle list from the store and push it to the main window.
    pub fn refresh_bottle_list(&self) {
        let bottles = self.store.bottles();
        self.main_surface.refresh_bottle_list(&bottles);
    }

    /// Right-click routing: a single press of the right button opens the
    /// machine context menu and consumes the event; everything else passes
    /// through unhandled.
    pub fn on_pointer_event(&self, event: &PointerEvent) -> bool {
        if event.kind == PointerEventKind::ButtonPress && event.button == MouseButton::Right {
            self.menu.popup_machine_menu(event.x, event.y);
            return true;
        }
        false
    }

    /*
     * Intent handlers: direct calls or task submission.
     */

    fn on_new_bottle(&self, spec: &NewBottleSpec) {
        tracing::info!(name = %spec.name, "new bottle requested");

        let store = Arc::clone(&self.store);
        let error_message = self.error_message.clone();
        let created = self.created_signal.clone();
        let failed = self.error_created_signal.clone();
        let spec = spec.clone();

        let submitted = self.task_slot.borrow_mut().try_submit("bottle-create", move |token| {
            match store.create(&spec) {
                Ok(bottle) => {
                    tracing::info!(name = %bottle.name, "creation task finished");
                    token.complete();
                    created.signal();
                }
                Err(err) => {
                    error_message.set(err.to_string());
                    token.complete();
                    failed.signal();
                }
            }
        });

        match submitted {
            Ok(()) => {}
            Err(TaskSlotError::Busy) => {
                self.main_surface.show_error_message(BUSY_MESSAGE);
                // Always close the wizard, as if the bottle was created.
                self.created_signal.signal();
            }
            Err(err) => self
                .main_surface
                .show_error_message(&format!("Could not start the background task: {err}")),
        }
    }

    fn on_update_bottle(&self, record: &UpdateRecord) {
        tracing::info!(name = %record.name, "bottle update requested");

        let store = Arc::clone(&self.store);
        let error_message = self.error_message.clone();
        let updated = self.updated_signal.clone();
        let failed = self.error_updated_signal.clone();
        let record = record.clone();

        let submitted = self.task_slot.borrow_mut().try_submit("bottle-update", move |token| {
            match store.update(&record) {
                Ok(bottle) => {
                    tracing::info!(name = %bottle.name, "update task finished");
                    token.complete();
                    updated.signal();
                }
                Err(err) => {
                    error_message.set(err.to_string());
                    token.complete();
                    failed.signal();
                }
            }
        });

        match submitted {
            Ok(()) => {}
            Err(TaskSlotError::Busy) => {
                self.main_surface.show_error_message(BUSY_MESSAGE);
                // Close the edit window, as if the bottle was updated.
                self.updated_signal.signal();
            }
            Err(err) => self
                .main_surface
                .show_error_message(&format!("Could not start the background task: {err}")),
        }
    }

    fn on_install_package(&self, request: &PackageInstall) {
        tracing::info!(bottle = %request.bottle, package = %request.package, "package install requested");
        self.main_surface
            .show_busy_dialog(&format!("Installing {}...", request.package));

        let store = Arc::clone(&self.store);
        let error_message = self.error_message.clone();
        let installed = self.installed_signal.clone();
        let failed = self.error_installed_signal.clone();
        let request = request.clone();

        let submitted = self.task_slot.borrow_mut().try_submit("package-install", move |token| {
            match store.install_package(&request) {
                Ok(()) => {
                    token.complete();
                    installed.signal();
                }
                Err(err) => {
                    error_message.set(err.to_string());
                    token.complete();
                    failed.signal();
                }
            }
        });

        match submitted {
            Ok(()) => {}
            Err(TaskSlotError::Busy) => {
                self.main_surface.show_error_message(BUSY_MESSAGE);
                // Close the busy dialog, as if the install had finished.
                self.installed_signal.signal();
            }
            Err(err) => {
                self.main_surface.close_busy_dialog();
                self.main_surface
                    .show_error_message(&format!("Could not start the background task: {err}"));
            }
        }
    }

    /// Direct route: launching a program returns immediately, failures
    /// arrive later through the runner's notifier.
    fn on_run_program(&self, request: &RunProgramRequest) {
        let bottles = self.store.bottles();
        let Some(bottle) = bottles.iter().find(|b| b.name == request.bottle) else {
            self.main_surface
                .show_error_message(&format!("No Wine bottle named '{}' exists.", request.bottle));
            return;
        };
        if let Err(err) = self.runner.run_program(bottle, &request.program) {
            self.main_surface.show_error_message(&err.to_string());
        }
    }

    /// Direct route: removal is a cheap filesystem operation.
    fn on_remove_bottle(&self, name: &str) {
        match self.store.remove(name) {
            Ok(()) => {
                self.edit.bottle_removed();
                self.refresh_bottle_list();
            }
            Err(err) => self.main_surface.show_error_message(&err.to_string()),
        }
    }

    /*
     * Notifier handlers, all running on the GUI thread.
     */

    fn on_bottle_created(&self) {
        let completed = self.task_slot.borrow_mut().retire();
        // On a collapse the worker is still running and closing the wizard
        // is the only effect; the refresh belongs to the genuine completion.
        self.wizard.bottle_created();
        if completed {
            self.refresh_bottle_list();
        }
    }

    fn on_bottle_updated(&self) {
        let completed = self.task_slot.borrow_mut().retire();
        self.edit.bottle_updated();
        if completed {
            self.refresh_bottle_list();
        }
    }

    fn on_error_during_create(&self) {
        self.task_slot.borrow_mut().retire();
        // Always close the wizard; the failure is reported separately.
        self.created_signal.signal();
        self.main_surface
            .show_error_message(&self.error_message.take());
    }

    fn on_error_during_update(&self) {
        self.task_slot.borrow_mut().retire();
        // Always close the edit window; the failure is reported separately.
        self.updated_signal.signal();
        self.main_surface
            .show_error_message(&self.error_message.take());
    }

    fn on_package_installed(&self) {
        let completed = self.task_slot.borrow_mut().retire();
        self.main_surface.close_busy_dialog();
        if completed {
            self.configure.update_installed();
        }
    }

    fn on_error_during_install(&self) {
        self.task_slot.borrow_mut().retire();
        self.installed_signal.signal();
        self.main_surface
            .show_error_message(&self.error_message.take());
    }
}
