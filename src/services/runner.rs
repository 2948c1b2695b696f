//! Launching Windows programs and reporting their failures to the GUI.

use std::thread;

use crate::coordination::{Notifier, NotifierSignal};
use crate::models::Bottle;
use crate::services::wine::{Wine, WineError};

/// Runs Windows programs inside bottles.
///
/// Spawning returns immediately; a monitor thread waits on the child and,
/// when it exits abnormally, signals the runner's failure notifier so the
/// message box runs on the GUI thread. The notifier is owned here and its
/// signal handle is the only thing the monitor threads ever touch.
pub struct ProgramRunner {
    wine: Option<Wine>,
    failure: Notifier,
    failure_signal: NotifierSignal,
}

impl ProgramRunner {
    pub fn new(wine: Option<Wine>, failure: Notifier) -> Self {
        let failure_signal = failure.signal_handle();
        Self {
            wine,
            failure,
            failure_signal,
        }
    }

    /// Bind the GUI-thread handler invoked when a launched program fails.
    ///
    /// # Panics
    /// Panics if called twice; the failure notifier binds once.
    pub fn connect_failure(&self, handler: impl FnMut() + 'static) {
        self.failure.bind(handler);
    }

    /// Launch `program` inside the bottle's prefix.
    ///
    /// Returns once the process is spawned. Spawn failures surface to the
    /// caller synchronously; abnormal exits of the running program are
    /// reported through the failure notifier instead.
    pub fn run_program(&self, bottle: &Bottle, program: &str) -> Result<(), WineError> {
        let wine = self.wine.as_ref().ok_or(WineError::NotFound)?;
        let winedebug = winedebug_value(bottle.is_debug_logging, bottle.debug_log_level);
        let mut child = wine.spawn_in_prefix(&bottle.prefix, program, winedebug)?;

        tracing::info!(bottle = %bottle.name, program, "program launched");

        let signal = self.failure_signal.clone();
        let program = program.to_string();
        thread::Builder::new()
            .name("program-monitor".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => {
                    tracing::info!(program, "program exited normally");
                }
                Ok(status) => {
                    tracing::warn!(program, %status, "program exited abnormally");
                    signal.signal();
                }
                Err(err) => {
                    tracing::error!(program, "waiting on program failed: {err}");
                    signal.signal();
                }
            })?;
        Ok(())
    }
}

/// Map bottle logging settings to a `WINEDEBUG` value.
///
/// Level 1 is Wine's own default verbosity, so nothing is set for it.
fn winedebug_value(is_debug_logging: bool, level: u8) -> Option<&'static str> {
    if !is_debug_logging {
        return Some("-all");
    }
    match level {
        0 => Some("-all"),
        1 => None,
        2 => Some("warn+all"),
        _ => Some("+all"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winedebug_mapping() {
        assert_eq!(winedebug_value(false, 3), Some("-all"));
        assert_eq!(winedebug_value(true, 0), Some("-all"));
        assert_eq!(winedebug_value(true, 1), None);
        assert_eq!(winedebug_value(true, 2), Some("warn+all"));
        assert_eq!(winedebug_value(true, 5), Some("+all"));
    }
}
