//! winecellar - Wine bottle manager front-end core
//!
//! Binary entry point. Wires the console frontend to the coordination
//! layer:
//!
//! 1. Load the general configuration and initialize logging
//! 2. Detect wine and scan the bottles root
//! 3. Construct the surfaces, then the controller, then bind signals
//!    (surfaces must exist before the one-time bind phase runs)
//! 4. Pump the main loop, interleaved with stdin commands
//!
//! The main thread is the GUI thread: it runs the loop and is the only
//! thread that ever touches a surface. A reader thread feeds input lines
//! over a channel; the single background worker is managed by the
//! controller's task slot and joined before shutdown completes.

use anyhow::{Context, Result};
use std::io::BufRead;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use winecellar::coordination::MainLoop;
use winecellar::services::{BottleStore, ProgramRunner, Wine, WineBottleStore};
use winecellar::ui::console::ConsoleFrontend;
use winecellar::ui::CoordinationController;
use winecellar::ui::{
    ConfigureSurface, EditSurface, MainSurface, MenuSurface, WizardSurface,
};
use winecellar::{ConfigManager, APP_NAME, VERSION};

fn main() -> Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" {
            println!("{APP_NAME} {VERSION}");
            return Ok(());
        }
        eprintln!("Error: parameter not understood (only --version is accepted)!");
        std::process::exit(1);
    }

    let config_manager = ConfigManager::default_location()?;
    let general_config = config_manager.load_general_config()?;

    let _log_guard = winecellar::logging::setup_logging(
        &config_manager.data_dir().join("logs"),
        APP_NAME,
        general_config.enable_debug_logging,
        general_config.enable_logging_stderr,
    )?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let wine = match Wine::detect() {
        Ok(wine) => Some(wine),
        Err(err) => {
            // The app still starts; creation attempts will report this.
            tracing::warn!("{err}");
            None
        }
    };

    let bottles_root = config_manager.resolve_bottles_root(&general_config);
    let store = Arc::new(WineBottleStore::new(bottles_root, wine.clone()));
    store.scan().context("Failed to scan bottles directory")?;

    let mut main_loop = MainLoop::new();
    let runner = ProgramRunner::new(wine, main_loop.notifier());

    let frontend = ConsoleFrontend::new();
    let store_handle: Arc<dyn BottleStore> = Arc::clone(&store) as _;
    let main_surface: Rc<dyn MainSurface> = Rc::clone(&frontend.main) as _;
    let wizard_surface: Rc<dyn WizardSurface> = Rc::clone(&frontend.wizard) as _;
    let edit_surface: Rc<dyn EditSurface> = Rc::clone(&frontend.edit) as _;
    let configure_surface: Rc<dyn ConfigureSurface> = Rc::clone(&frontend.configure) as _;
    let menu_surface: Rc<dyn MenuSurface> = Rc::clone(&frontend.menu) as _;
    let controller = CoordinationController::new(
        &main_loop,
        store_handle,
        runner,
        main_surface,
        wizard_surface,
        edit_surface,
        configure_surface,
        menu_surface,
    );
    controller.connect_signals();
    controller.refresh_bottle_list();

    // Reader thread feeding input lines; the main thread stays the GUI
    // thread and is the only one touching surfaces.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        })?;

    println!("{APP_NAME} {VERSION} - type 'help' for commands");
    let loop_handle = main_loop.handle();

    'outer: loop {
        main_loop.turn_wait(Duration::from_millis(50));
        if main_loop.quit_requested() {
            break;
        }
        loop {
            match line_rx.try_recv() {
                Ok(line) => {
                    if frontend.handle_line(&line, &controller) {
                        loop_handle.quit();
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'outer,
            }
        }
    }

    if controller.is_task_running() {
        println!("Waiting for the running task to finish...");
    }
    // Joins any in-flight worker through the task slot's teardown.
    drop(controller);

    tracing::info!("Application shutdown complete");
    Ok(())
}
