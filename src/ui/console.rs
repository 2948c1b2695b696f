//! Console frontend.
//!
//! A thin stand-in for a real toolkit: each surface trait gets a terminal
//! implementation, and a small command language drives the same intent
//! events a window would emit. The coordination layer cannot tell the
//! difference, which is the point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::coordination::EventSource;
use crate::models::{
    AudioDriver, Bottle, NewBottleSpec, Package, PackageInstall, RunProgramRequest, UpdateRecord,
    WindowsVersion,
};
use crate::ui::controller::CoordinationController;
use crate::ui::forms::{EditForm, WizardForm};
use crate::ui::surfaces::{
    ConfigureSurface, EditSurface, MainSurface, MenuSurface, MouseButton, PointerEvent,
    PointerEventKind, WizardSurface,
};

pub struct ConsoleMainSurface {
    bottles: RefCell<Vec<Bottle>>,
    busy: Cell<bool>,
    run_program: EventSource<RunProgramRequest>,
}

impl ConsoleMainSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            bottles: RefCell::new(Vec::new()),
            busy: Cell::new(false),
            run_program: EventSource::new(),
        })
    }

    pub fn bottles(&self) -> Vec<Bottle> {
        self.bottles.borrow().clone()
    }

    pub fn request_run(&self, request: RunProgramRequest) {
        self.run_program.emit(&request);
    }
}

impl MainSurface for ConsoleMainSurface {
    fn show_error_message(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_busy_dialog(&self, message: &str) {
        self.busy.set(true);
        println!("[busy] {message}");
    }

    fn close_busy_dialog(&self) {
        if self.busy.replace(false) {
            println!("[busy dialog closed]");
        }
    }

    fn refresh_bottle_list(&self, bottles: &[Bottle]) {
        *self.bottles.borrow_mut() = bottles.to_vec();
        if bottles.is_empty() {
            println!("No bottles yet. Create one with: new <name>");
            return;
        }
        println!("Bottles:");
        for bottle in bottles {
            println!(
                "  {:<20} {} / {} / {}",
                bottle.name, bottle.windows_version, bottle.bit, bottle.audio_driver
            );
        }
    }

    fn run_program_requested(&self) -> &EventSource<RunProgramRequest> {
        &self.run_program
    }
}

pub struct ConsoleWizardSurface {
    open: Cell<bool>,
    new_bottle: EventSource<NewBottleSpec>,
}

impl ConsoleWizardSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            open: Cell::new(false),
            new_bottle: EventSource::new(),
        })
    }

    pub fn submit(&self, form: &WizardForm) {
        self.open.set(true);
        println!("Creating bottle '{}', please wait...", form.name.trim());
        self.new_bottle.emit(&form.to_spec());
    }
}

impl WizardSurface for ConsoleWizardSurface {
    fn bottle_created(&self) {
        if self.open.replace(false) {
            println!("[wizard closed]");
        }
    }

    fn new_bottle_requested(&self) -> &EventSource<NewBottleSpec> {
        &self.new_bottle
    }
}

pub struct ConsoleEditSurface {
    open: Cell<bool>,
    busy: Cell<bool>,
    update: EventSource<UpdateRecord>,
    remove: EventSource<String>,
}

impl ConsoleEditSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            open: Cell::new(false),
            busy: Cell::new(false),
            update: EventSource::new(),
            remove: EventSource::new(),
        })
    }

    pub fn submit(&self, form: &EditForm) {
        self.open.set(true);
        self.busy.set(true);
        println!("Applying changes to '{}', please wait...", form.name.trim());
        self.update.emit(&form.to_update_record());
    }

    pub fn request_remove(&self, name: &str) {
        self.remove.emit(&name.to_string());
    }
}

impl EditSurface for ConsoleEditSurface {
    fn bottle_updated(&self) {
        self.busy.set(false);
        if self.open.replace(false) {
            println!("[edit window closed]");
        }
    }

    fn bottle_removed(&self) {
        self.open.set(false);
        self.busy.set(false);
        println!("[bottle removed]");
    }

    fn update_requested(&self) -> &EventSource<UpdateRecord> {
        &self.update
    }

    fn remove_requested(&self) -> &EventSource<String> {
        &self.remove
    }
}

pub struct ConsoleConfigureSurface {
    install: EventSource<PackageInstall>,
}

impl ConsoleConfigureSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            install: EventSource::new(),
        })
    }

    pub fn request_install(&self, request: PackageInstall) {
        self.install.emit(&request);
    }
}

impl ConfigureSurface for ConsoleConfigureSurface {
    fn update_installed(&self) {
        println!("[installed packages refreshed]");
    }

    fn install_requested(&self) -> &EventSource<PackageInstall> {
        &self.install
    }
}

pub struct ConsoleMenuSurface;

impl ConsoleMenuSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self)
    }
}

impl MenuSurface for ConsoleMenuSurface {
    fn popup_machine_menu(&self, x: f64, y: f64) {
        println!("[machine menu at {x:.0},{y:.0}: edit / configure / remove]");
    }
}

/// The console surfaces plus the command language driving them.
pub struct ConsoleFrontend {
    pub main: Rc<ConsoleMainSurface>,
    pub wizard: Rc<ConsoleWizardSurface>,
    pub edit: Rc<ConsoleEditSurface>,
    pub configure: Rc<ConsoleConfigureSurface>,
    pub menu: Rc<ConsoleMenuSurface>,
}

impl ConsoleFrontend {
    pub fn new() -> Self {
        Self {
            main: ConsoleMainSurface::new(),
            wizard: ConsoleWizardSurface::new(),
            edit: ConsoleEditSurface::new(),
            configure: ConsoleConfigureSurface::new(),
            menu: ConsoleMenuSurface::new(),
        }
    }

    /// Handle one input line. Returns true when the user asked to quit.
    pub fn handle_line(&self, line: &str, controller: &CoordinationController) -> bool {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["help"] => Self::print_help(),
            ["quit"] | ["exit"] => return true,
            ["list"] => controller.refresh_bottle_list(),
            ["new", name, rest @ ..] => {
                let form = WizardForm {
                    name: (*name).to_string(),
                    windows_version_index: rest.first().unwrap_or(&"").to_string(),
                    bit_index: "1".to_string(),
                    audio_driver_index: rest.get(1).unwrap_or(&"").to_string(),
                    ..Default::default()
                };
                self.wizard.submit(&form);
            }
            ["edit", name, pairs @ ..] => match self.edit_form_for(name, pairs) {
                Some(form) => self.edit.submit(&form),
                None => eprintln!("error: no bottle named '{name}'"),
            },
            ["remove", name] => self.edit.request_remove(name),
            ["install", bottle, package] => match package_from_name(package) {
                Some(package) => self.configure.request_install(PackageInstall {
                    bottle: (*bottle).to_string(),
                    package,
                }),
                None => eprintln!("error: unknown package '{package}'"),
            },
            ["run", bottle, program @ ..] if !program.is_empty() => {
                self.main.request_run(RunProgramRequest {
                    bottle: (*bottle).to_string(),
                    program: program.join(" "),
                });
            }
            ["menu", x, y] => {
                let event = PointerEvent {
                    kind: PointerEventKind::ButtonPress,
                    button: MouseButton::Right,
                    x: x.parse().unwrap_or(0.0),
                    y: y.parse().unwrap_or(0.0),
                };
                if !controller.on_pointer_event(&event) {
                    println!("(event not handled)");
                }
            }
            _ => eprintln!("error: command not understood, try 'help'"),
        }
        false
    }

    /// Prefill the edit form from the bottle's current state, then apply
    /// the given key=value overrides.
    fn edit_form_for(&self, name: &str, pairs: &[&str]) -> Option<EditForm> {
        let bottles = self.main.bottles();
        let bottle = bottles.iter().find(|b| b.name == name)?;
        let mut form = EditForm {
            name: bottle.name.clone(),
            folder_name: bottle.folder_name.clone(),
            description: bottle.description.clone(),
            windows_version_index: index_of_windows(bottle.windows_version),
            audio_driver_index: index_of_audio(bottle.audio_driver),
            virtual_desktop_enabled: bottle.virtual_desktop_resolution.is_some(),
            virtual_desktop_resolution: bottle
                .virtual_desktop_resolution
                .clone()
                .unwrap_or_default(),
            enable_debug_logging: bottle.is_debug_logging,
            debug_log_level: bottle.debug_log_level.to_string(),
        };

        for pair in pairs {
            match pair.split_once('=') {
                Some(("name", value)) => form.name = value.to_string(),
                Some(("description", value)) => form.description = value.to_string(),
                Some(("windows", value)) => form.windows_version_index = value.to_string(),
                Some(("audio", value)) => form.audio_driver_index = value.to_string(),
                Some(("loglevel", value)) => {
                    form.enable_debug_logging = true;
                    form.debug_log_level = value.to_string();
                }
                Some(("desktop", "off")) => form.virtual_desktop_enabled = false,
                Some(("desktop", value)) => {
                    form.virtual_desktop_enabled = true;
                    form.virtual_desktop_resolution = value.to_string();
                }
                _ => eprintln!("warning: ignoring '{pair}'"),
            }
        }
        Some(form)
    }

    fn print_help() {
        println!("Commands:");
        println!("  list                                    show bottles");
        println!("  new <name> [windows-idx] [audio-idx]    create a bottle");
        println!("  edit <name> [key=value ...]             update a bottle");
        println!("       keys: name description windows audio loglevel desktop");
        println!("  remove <name>                           delete a bottle");
        println!("  install <bottle> <package>              install a package");
        println!("       packages: dxvk d3dx9 corefonts liberation dotnet vcrun");
        println!("  run <bottle> <program>                  launch a program");
        println!("  menu <x> <y>                            open the machine menu");
        println!("  quit");
    }
}

impl Default for ConsoleFrontend {
    fn default() -> Self {
        Self::new()
    }
}

fn package_from_name(name: &str) -> Option<Package> {
    match name.to_ascii_lowercase().as_str() {
        "dxvk" => Some(Package::Dxvk),
        "d3dx9" | "directx9" => Some(Package::DirectX9),
        "corefonts" => Some(Package::CoreFonts),
        "liberation" => Some(Package::LiberationFonts),
        "dotnet" => Some(Package::DotNet),
        "vcrun" | "visualcpp" => Some(Package::VisualCppRuntime),
        _ => None,
    }
}

fn index_of_windows(version: WindowsVersion) -> String {
    WindowsVersion::ALL
        .iter()
        .position(|v| *v == version)
        .unwrap_or_default()
        .to_string()
}

fn index_of_audio(driver: AudioDriver) -> String {
    AudioDriver::ALL
        .iter()
        .position(|d| *d == driver)
        .unwrap_or_default()
        .to_string()
}
