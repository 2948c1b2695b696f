//! Integration tests for the GUI-loop / worker coordination layer.
//!
//! A fake store with a controllable gate stands in for the real bottle
//! store, and recording surfaces stand in for the windows, so the tests
//! can drive the full submit → signal → handler cycle deterministically
//! from the test thread (which plays the GUI thread).

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use winecellar::coordination::{EventSource, MainLoop};
use winecellar::models::{
    AudioDriver, Bit, Bottle, NewBottleSpec, Package, PackageInstall, RunProgramRequest,
    UpdateRecord, WindowsVersion,
};
use winecellar::services::{BottleStore, ProgramRunner, StoreError, Wine};
use winecellar::ui::controller::{BUSY_MESSAGE, EXEC_FAILURE_MESSAGE};
use winecellar::ui::surfaces::{
    ConfigureSurface, EditSurface, MainSurface, MenuSurface, MouseButton, PointerEvent,
    PointerEventKind, WizardSurface,
};
use winecellar::ui::CoordinationController;

fn bottle_named(name: &str) -> Bottle {
    Bottle {
        name: name.to_string(),
        folder_name: name.to_lowercase(),
        description: String::new(),
        prefix: format!("/tmp/bottles/{}", name.to_lowercase()).into(),
        windows_version: WindowsVersion::default(),
        bit: Bit::default(),
        virtual_desktop_resolution: None,
        audio_driver: AudioDriver::default(),
        is_debug_logging: false,
        debug_log_level: 1,
    }
}

fn spec_named(name: &str) -> NewBottleSpec {
    NewBottleSpec {
        name: name.to_string(),
        windows_version: WindowsVersion::default(),
        bit: Bit::default(),
        virtual_desktop_resolution: None,
        disable_gecko_mono: false,
        audio_driver: AudioDriver::default(),
    }
}

fn record_named(name: &str) -> UpdateRecord {
    UpdateRecord {
        name: name.to_string(),
        folder_name: name.to_lowercase(),
        description: String::new(),
        windows_version: WindowsVersion::default(),
        virtual_desktop_resolution: None,
        audio_driver: AudioDriver::default(),
        is_debug_logging: false,
        debug_log_level: 1,
    }
}

/// Store double. A gate receiver, when armed, blocks the next operation
/// until the test releases it; `fail_next` makes the next operation fail.
#[derive(Default)]
struct FakeStore {
    names: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed_ops: AtomicUsize,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
    fail_next: Mutex<Option<String>>,
}

struct InFlightGuard<'a>(&'a FakeStore);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Arm the gate; the next store operation blocks until the returned
    /// sender fires (or is dropped).
    fn gate(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    fn seed(&self, name: &str) {
        self.names.lock().unwrap().push(name.to_string());
    }

    fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }

    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    fn run_op(&self) -> Result<(), String> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            // Blocks until the test releases the gate.
            let _ = rx.recv();
        }
        match self.fail_next.lock().unwrap().take() {
            Some(message) => Err(message),
            None => {
                self.completed_ops.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

impl BottleStore for FakeStore {
    fn create(&self, spec: &NewBottleSpec) -> Result<Bottle, StoreError> {
        let _guard = self.enter();
        self.run_op().map_err(StoreError::Creation)?;
        self.names.lock().unwrap().push(spec.name.clone());
        Ok(bottle_named(&spec.name))
    }

    fn update(&self, record: &UpdateRecord) -> Result<Bottle, StoreError> {
        let _guard = self.enter();
        self.run_op().map_err(StoreError::Update)?;
        Ok(bottle_named(&record.name))
    }

    fn install_package(&self, _request: &PackageInstall) -> Result<(), StoreError> {
        let _guard = self.enter();
        self.run_op().map_err(StoreError::Install)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut names = self.names.lock().unwrap();
        match names.iter().position(|n| n == name) {
            Some(index) => {
                names.remove(index);
                Ok(())
            }
            None => Err(StoreError::UnknownBottle(name.to_string())),
        }
    }

    fn bottles(&self) -> Vec<Bottle> {
        self.names
            .lock()
            .unwrap()
            .iter()
            .map(|name| bottle_named(name))
            .collect()
    }
}

#[derive(Default)]
struct FakeMain {
    errors: RefCell<Vec<String>>,
    refreshes: Cell<usize>,
    busy_open: Cell<bool>,
    busy_closes: Cell<usize>,
    run_program: EventSource<RunProgramRequest>,
}

impl FakeMain {
    fn request_run(&self, request: RunProgramRequest) {
        self.run_program.emit(&request);
    }
}

impl MainSurface for FakeMain {
    fn show_error_message(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn show_busy_dialog(&self, _message: &str) {
        self.busy_open.set(true);
    }

    fn close_busy_dialog(&self) {
        if self.busy_open.replace(false) {
            self.busy_closes.set(self.busy_closes.get() + 1);
        }
    }

    fn refresh_bottle_list(&self, _bottles: &[Bottle]) {
        self.refreshes.set(self.refreshes.get() + 1);
    }

    fn run_program_requested(&self) -> &EventSource<RunProgramRequest> {
        &self.run_program
    }
}

#[derive(Default)]
struct FakeWizard {
    open: Cell<bool>,
    closes: Cell<usize>,
    new_bottle: EventSource<NewBottleSpec>,
}

impl FakeWizard {
    fn request(&self, spec: NewBottleSpec) {
        self.open.set(true);
        self.new_bottle.emit(&spec);
    }
}

impl WizardSurface for FakeWizard {
    fn bottle_created(&self) {
        if self.open.replace(false) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn new_bottle_requested(&self) -> &EventSource<NewBottleSpec> {
        &self.new_bottle
    }
}

#[derive(Default)]
struct FakeEdit {
    open: Cell<bool>,
    busy: Cell<bool>,
    closes: Cell<usize>,
    removed: Cell<usize>,
    update: EventSource<UpdateRecord>,
    remove: EventSource<String>,
}

impl FakeEdit {
    fn request(&self, record: UpdateRecord) {
        self.open.set(true);
        self.busy.set(true);
        self.update.emit(&record);
    }

    fn request_remove(&self, name: &str) {
        self.remove.emit(&name.to_string());
    }
}

impl EditSurface for FakeEdit {
    fn bottle_updated(&self) {
        self.busy.set(false);
        if self.open.replace(false) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn bottle_removed(&self) {
        self.removed.set(self.removed.get() + 1);
    }

    fn update_requested(&self) -> &EventSource<UpdateRecord> {
        &self.update
    }

    fn remove_requested(&self) -> &EventSource<String> {
        &self.remove
    }
}

#[derive(Default)]
struct FakeConfigure {
    installed_refreshes: Cell<usize>,
    install: EventSource<PackageInstall>,
}

impl FakeConfigure {
    fn request(&self, request: PackageInstall) {
        self.install.emit(&request);
    }
}

impl ConfigureSurface for FakeConfigure {
    fn update_installed(&self) {
        self.installed_refreshes.set(self.installed_refreshes.get() + 1);
    }

    fn install_requested(&self) -> &EventSource<PackageInstall> {
        &self.install
    }
}

#[derive(Default)]
struct FakeMenu {
    popups: RefCell<Vec<(f64, f64)>>,
}

impl MenuSurface for FakeMenu {
    fn popup_machine_menu(&self, x: f64, y: f64) {
        self.popups.borrow_mut().push((x, y));
    }
}

struct Harness {
    main_loop: MainLoop,
    controller: Rc<CoordinationController>,
    store: Arc<FakeStore>,
    main: Rc<FakeMain>,
    wizard: Rc<FakeWizard>,
    edit: Rc<FakeEdit>,
    configure: Rc<FakeConfigure>,
    menu: Rc<FakeMenu>,
}

impl Harness {
    fn with_wine(wine: Option<Wine>) -> Self {
        let main_loop = MainLoop::new();
        let store = FakeStore::new();
        let runner = ProgramRunner::new(wine, main_loop.notifier());

        let main = Rc::new(FakeMain::default());
        let wizard = Rc::new(FakeWizard::default());
        let edit = Rc::new(FakeEdit::default());
        let configure = Rc::new(FakeConfigure::default());
        let menu = Rc::new(FakeMenu::default());

        let store_handle: Arc<dyn BottleStore> = Arc::clone(&store) as _;
        let controller = CoordinationController::new(
            &main_loop,
            store_handle,
            runner,
            Rc::clone(&main) as _,
            Rc::clone(&wizard) as _,
            Rc::clone(&edit) as _,
            Rc::clone(&configure) as _,
            Rc::clone(&menu) as _,
        );
        controller.connect_signals();

        Self {
            main_loop,
            controller,
            store,
            main,
            wizard,
            edit,
            configure,
            menu,
        }
    }

    fn new() -> Self {
        Self::with_wine(None)
    }

    /// Drain every message already queued.
    fn pump(&mut self) {
        while self.main_loop.turn() {}
    }

    /// Wait for at least one message, then drain the rest.
    fn pump_wait(&mut self) {
        assert!(
            self.main_loop.turn_wait(Duration::from_secs(5)),
            "no loop message arrived within the timeout"
        );
        self.pump();
    }
}

#[test]
fn test_create_flow_success() {
    let mut harness = Harness::new();

    harness.wizard.request(spec_named("Games"));
    harness.pump_wait();

    assert_eq!(harness.store.names(), vec!["Games"]);
    assert_eq!(harness.wizard.closes.get(), 1);
    assert_eq!(harness.main.refreshes.get(), 1);
    assert!(harness.main.errors.borrow().is_empty());
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_busy_create_collapses_and_refreshes_exactly_once() {
    let mut harness = Harness::new();

    // Task A blocks inside the store until the gate releases.
    let gate = harness.store.gate();
    harness.wizard.request(spec_named("A"));
    assert!(harness.controller.is_task_running());

    // Task B is rejected while A is in flight.
    harness.wizard.request(spec_named("B"));
    assert_eq!(*harness.main.errors.borrow(), vec![BUSY_MESSAGE]);

    // The collapse closes the wizard immediately; A keeps running and no
    // refresh happens yet.
    harness.pump();
    assert_eq!(harness.wizard.closes.get(), 1);
    assert_eq!(harness.main.refreshes.get(), 0);
    assert!(harness.controller.is_task_running());

    // A completes: the slot empties and the refresh fires exactly once.
    gate.send(()).unwrap();
    harness.pump_wait();
    assert!(!harness.controller.is_task_running());
    assert_eq!(harness.main.refreshes.get(), 1);
    assert_eq!(harness.wizard.closes.get(), 1);
    assert_eq!(harness.store.names(), vec!["A"]);
    assert_eq!(harness.store.max_in_flight.load(Ordering::SeqCst), 1);
}

#[test]
fn test_create_failure_shows_exact_error_and_closes_wizard() {
    let mut harness = Harness::new();

    harness.store.fail_next("disk full");
    harness.wizard.request(spec_named("Broken"));
    harness.pump_wait();

    let expected = StoreError::Creation("disk full".to_string()).to_string();
    assert_eq!(*harness.main.errors.borrow(), vec![expected]);
    assert_eq!(harness.wizard.closes.get(), 1);
    // A failed creation never refreshes the list.
    assert_eq!(harness.main.refreshes.get(), 0);
    assert!(!harness.controller.is_task_running());
    assert!(harness.store.names().is_empty());
}

#[test]
fn test_error_message_is_not_stale_across_tasks() {
    let mut harness = Harness::new();

    harness.store.fail_next("first failure");
    harness.wizard.request(spec_named("One"));
    harness.pump_wait();

    harness.store.fail_next("second failure");
    harness.wizard.request(spec_named("Two"));
    harness.pump_wait();

    let errors = harness.main.errors.borrow();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("first failure"));
    assert!(errors[1].contains("second failure"));
}

#[test]
fn test_update_flow_hides_busy_indicator_and_closes_edit_window() {
    let mut harness = Harness::new();

    harness.edit.request(record_named("Games"));
    assert!(harness.edit.busy.get());
    harness.pump_wait();

    assert!(!harness.edit.busy.get());
    assert_eq!(harness.edit.closes.get(), 1);
    assert_eq!(harness.main.refreshes.get(), 1);
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_busy_update_collapses_edit_window() {
    let mut harness = Harness::new();

    let gate = harness.store.gate();
    harness.edit.request(record_named("First"));
    harness.edit.request(record_named("Second"));

    assert_eq!(*harness.main.errors.borrow(), vec![BUSY_MESSAGE]);
    harness.pump();
    assert_eq!(harness.edit.closes.get(), 1);
    assert!(!harness.edit.busy.get());
    assert!(harness.controller.is_task_running());

    gate.send(()).unwrap();
    harness.pump_wait();
    assert_eq!(harness.edit.closes.get(), 1);
    assert_eq!(harness.main.refreshes.get(), 1);
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_update_failure_collapses_and_reports() {
    let mut harness = Harness::new();

    harness.store.fail_next("registry write failed");
    harness.edit.request(record_named("Games"));
    harness.pump_wait();

    let expected = StoreError::Update("registry write failed".to_string()).to_string();
    assert_eq!(*harness.main.errors.borrow(), vec![expected]);
    assert_eq!(harness.edit.closes.get(), 1);
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_install_flow_closes_busy_dialog_exactly_once() {
    let mut harness = Harness::new();
    harness.store.seed("Games");

    harness.configure.request(PackageInstall {
        bottle: "Games".to_string(),
        package: Package::Dxvk,
    });
    assert!(harness.main.busy_open.get());
    harness.pump_wait();

    assert!(!harness.main.busy_open.get());
    assert_eq!(harness.main.busy_closes.get(), 1);
    assert_eq!(harness.configure.installed_refreshes.get(), 1);
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_busy_install_collapses_busy_dialog() {
    let mut harness = Harness::new();
    harness.store.seed("Games");

    let gate = harness.store.gate();
    harness.configure.request(PackageInstall {
        bottle: "Games".to_string(),
        package: Package::Dxvk,
    });
    harness.configure.request(PackageInstall {
        bottle: "Games".to_string(),
        package: Package::CoreFonts,
    });

    assert_eq!(*harness.main.errors.borrow(), vec![BUSY_MESSAGE]);
    harness.pump();
    // The collapse closed the dialog; the first install still runs.
    assert_eq!(harness.main.busy_closes.get(), 1);
    assert_eq!(harness.configure.installed_refreshes.get(), 0);
    assert!(harness.controller.is_task_running());

    gate.send(()).unwrap();
    harness.pump_wait();
    assert_eq!(harness.main.busy_closes.get(), 1);
    assert_eq!(harness.configure.installed_refreshes.get(), 1);
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_install_failure_reports_and_closes_dialog() {
    let mut harness = Harness::new();
    harness.store.seed("Games");

    harness.store.fail_next("verb not found");
    harness.configure.request(PackageInstall {
        bottle: "Games".to_string(),
        package: Package::DotNet,
    });
    harness.pump_wait();

    let expected = StoreError::Install("verb not found".to_string()).to_string();
    assert_eq!(*harness.main.errors.borrow(), vec![expected]);
    assert!(!harness.main.busy_open.get());
    assert!(!harness.controller.is_task_running());
}

#[test]
fn test_remove_is_direct_and_refreshes() {
    let mut harness = Harness::new();
    harness.store.seed("Games");

    harness.edit.request_remove("Games");
    assert_eq!(harness.edit.removed.get(), 1);
    assert_eq!(harness.main.refreshes.get(), 1);
    assert!(harness.store.names().is_empty());

    harness.edit.request_remove("Games");
    assert_eq!(
        harness.main.errors.borrow().last().unwrap(),
        "No Wine bottle named 'Games' exists."
    );
    harness.pump();
}

#[test]
fn test_right_click_opens_menu_and_consumes_event() {
    let harness = Harness::new();

    let right_press = PointerEvent {
        kind: PointerEventKind::ButtonPress,
        button: MouseButton::Right,
        x: 120.0,
        y: 48.0,
    };
    assert!(harness.controller.on_pointer_event(&right_press));
    assert_eq!(*harness.menu.popups.borrow(), vec![(120.0, 48.0)]);

    let left_press = PointerEvent {
        kind: PointerEventKind::ButtonPress,
        button: MouseButton::Left,
        x: 1.0,
        y: 1.0,
    };
    assert!(!harness.controller.on_pointer_event(&left_press));

    let right_release = PointerEvent {
        kind: PointerEventKind::ButtonRelease,
        button: MouseButton::Right,
        x: 1.0,
        y: 1.0,
    };
    assert!(!harness.controller.on_pointer_event(&right_release));
    assert_eq!(harness.menu.popups.borrow().len(), 1);
}

#[test]
fn test_exec_failure_surfaces_on_gui_thread() {
    let mut harness = Harness::with_wine(Some(Wine::at("/bin/false")));
    harness.store.seed("Games");

    harness.main.request_run(RunProgramRequest {
        bottle: "Games".to_string(),
        program: "notepad.exe".to_string(),
    });

    // The monitor thread observes the abnormal exit and signals; the
    // message box runs on the loop thread.
    harness.pump_wait();
    assert_eq!(*harness.main.errors.borrow(), vec![EXEC_FAILURE_MESSAGE]);
}

#[test]
fn test_run_program_unknown_bottle_is_immediate() {
    let harness = Harness::new();

    harness.main.request_run(RunProgramRequest {
        bottle: "Nope".to_string(),
        program: "notepad.exe".to_string(),
    });
    assert_eq!(
        *harness.main.errors.borrow(),
        vec!["No Wine bottle named 'Nope' exists.".to_string()]
    );
}

#[test]
fn test_run_program_without_wine_reports_missing_wine() {
    let harness = Harness::new();
    harness.store.seed("Games");

    harness.main.request_run(RunProgramRequest {
        bottle: "Games".to_string(),
        program: "notepad.exe".to_string(),
    });
    assert_eq!(
        harness.main.errors.borrow().last().unwrap(),
        "Could not find wine binary. Please first install wine on your machine."
    );
}

#[test]
#[should_panic(expected = "bound twice")]
fn test_binding_controller_twice_is_fatal() {
    let harness = Harness::new();
    harness.controller.connect_signals();
}

#[test]
fn test_teardown_joins_in_flight_worker() {
    let mut harness = Harness::new();

    let gate = harness.store.gate();
    harness.wizard.request(spec_named("Slow"));
    assert!(harness.controller.is_task_running());

    // Release shortly before teardown; dropping the controller joins the
    // worker through the task slot.
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        let _ = gate.send(());
    });

    harness.pump();
    let store = Arc::clone(&harness.store);
    drop(harness);
    assert_eq!(store.completed_ops.load(Ordering::SeqCst), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Rapid repeated submissions while a task is in flight: exactly one
    /// task executes, every excess request gets a busy notification, and
    /// the wizard closes exactly once.
    #[test]
    fn prop_rapid_submissions_run_exactly_one_task(extra in 1usize..8) {
        let mut harness = Harness::new();

        let gate = harness.store.gate();
        harness.wizard.request(spec_named("A"));
        for index in 0..extra {
            harness.wizard.request(spec_named(&format!("extra-{index}")));
        }

        let busy_count = harness
            .main
            .errors
            .borrow()
            .iter()
            .filter(|message| message.as_str() == BUSY_MESSAGE)
            .count();
        prop_assert_eq!(busy_count, extra);

        // Collapse signals close the wizard exactly once.
        harness.pump();
        prop_assert_eq!(harness.wizard.closes.get(), 1);
        prop_assert_eq!(harness.main.refreshes.get(), 0);

        gate.send(()).unwrap();
        harness.pump_wait();
        prop_assert_eq!(harness.main.refreshes.get(), 1);
        prop_assert_eq!(harness.store.max_in_flight.load(Ordering::SeqCst), 1);
        prop_assert_eq!(harness.store.names(), vec!["A".to_string()]);
        prop_assert!(!harness.controller.is_task_running());
    }
}
