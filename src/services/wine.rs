//! Wine installation discovery and prefix-scoped command execution.

use camino::{Utf8Path, Utf8PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use which::which;

#[derive(Debug, Error)]
pub enum WineError {
    #[error("Could not find wine binary. Please first install wine on your machine.")]
    NotFound,

    #[error("wine command failed: {0}")]
    CommandFailed(String),

    #[error("failed to run wine: {0}")]
    Io(#[from] std::io::Error),
}

/// A usable Wine installation.
#[derive(Debug, Clone)]
pub struct Wine {
    wine_bin: Utf8PathBuf,
    version: Option<String>,
}

impl Wine {
    /// Locate wine on `PATH` and probe its version.
    pub fn detect() -> Result<Self, WineError> {
        let path = which("wine").map_err(|_| WineError::NotFound)?;
        let wine_bin = Utf8PathBuf::try_from(path)
            .map_err(|err| WineError::CommandFailed(format!("non UTF-8 wine path: {err}")))?;
        let version = Self::probe_version(&wine_bin).ok();
        tracing::info!(bin = %wine_bin, version = version.as_deref().unwrap_or("unknown"), "wine detected");
        Ok(Self { wine_bin, version })
    }

    /// Wrap a known binary without probing. Used by tests and by setups
    /// pointing at a non-PATH wine build.
    pub fn at(wine_bin: impl Into<Utf8PathBuf>) -> Self {
        Self {
            wine_bin: wine_bin.into(),
            version: None,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn binary(&self) -> &Utf8Path {
        &self.wine_bin
    }

    fn probe_version(wine_bin: &Utf8Path) -> Result<String, WineError> {
        let output = Command::new(wine_bin.as_std_path())
            .arg("--version")
            .output()?;
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if raw.is_empty() {
            return Err(WineError::CommandFailed(
                "wine --version returned nothing".to_string(),
            ));
        }
        Ok(Self::strip_version(&raw))
    }

    /// Reduce a raw version string to its number, `"wine-8.0 (Staging)"` -> `"8.0"`.
    fn strip_version(raw: &str) -> String {
        raw.replace("wine-", "")
            .split_whitespace()
            .next()
            .unwrap_or(raw)
            .split("-rc")
            .next()
            .unwrap_or(raw)
            .to_string()
    }

    /// Initialize a fresh prefix directory via `wineboot`.
    pub fn init_prefix(
        &self,
        prefix: &Utf8Path,
        winearch: &str,
        disable_gecko_mono: bool,
    ) -> Result<(), WineError> {
        let mut command = Command::new(self.wine_bin.as_std_path());
        command
            .arg("wineboot")
            .arg("--init")
            .env("WINEPREFIX", prefix.as_str())
            .env("WINEARCH", winearch);
        if disable_gecko_mono {
            // Skip the Gecko/Mono installer prompts entirely.
            command.env("WINEDLLOVERRIDES", "mscoree=;mshtml=");
        }
        Self::run_checked(command)
    }

    /// Run a wine command inside an existing prefix and wait for it.
    pub fn run_in_prefix(&self, prefix: &Utf8Path, args: &[&str]) -> Result<(), WineError> {
        let mut command = Command::new(self.wine_bin.as_std_path());
        command.args(args).env("WINEPREFIX", prefix.as_str());
        Self::run_checked(command)
    }

    /// Spawn a Windows program inside a prefix without waiting.
    ///
    /// `winedebug` becomes the child's `WINEDEBUG`; `None` leaves Wine's
    /// own default logging in place.
    pub fn spawn_in_prefix(
        &self,
        prefix: &Utf8Path,
        program: &str,
        winedebug: Option<&str>,
    ) -> Result<Child, WineError> {
        let mut command = Command::new(self.wine_bin.as_std_path());
        command
            .arg(program)
            .env("WINEPREFIX", prefix.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(value) = winedebug {
            command.env("WINEDEBUG", value);
        }
        Ok(command.spawn()?)
    }

    fn run_checked(mut command: Command) -> Result<(), WineError> {
        let output = command.output()?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(WineError::CommandFailed(if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_version() {
        assert_eq!(Wine::strip_version("wine-8.0"), "8.0");
        assert_eq!(Wine::strip_version("wine-9.0 (Staging)"), "9.0");
        assert_eq!(Wine::strip_version("wine-10.1-rc2"), "10.1");
        assert_eq!(Wine::strip_version("5.0"), "5.0");
    }

    #[test]
    fn test_run_in_prefix_reports_failure() {
        let wine = Wine::at("/bin/false");
        let result = wine.run_in_prefix(Utf8Path::new("/tmp"), &["winecfg"]);
        assert!(matches!(result, Err(WineError::CommandFailed(_))));
    }

    #[test]
    fn test_run_in_prefix_success() {
        let wine = Wine::at("/bin/true");
        wine.run_in_prefix(Utf8Path::new("/tmp"), &["winecfg", "-v", "win10"])
            .unwrap();
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let wine = Wine::at("/nonexistent/wine");
        let result = wine.run_in_prefix(Utf8Path::new("/tmp"), &["wineboot"]);
        assert!(matches!(result, Err(WineError::Io(_))));
    }
}
