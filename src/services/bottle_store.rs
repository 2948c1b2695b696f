//! Bottle storage: creating, updating, and removing Wine prefixes.
//!
//! [`BottleStore`] is the synchronous contract the coordination layer
//! submits background work against; [`WineBottleStore`] implements it over
//! a bottles root directory. Every method is safe to call off the GUI
//! thread. Errors come back as values, never panics; the user-facing
//! message is the `Display` text of [`StoreError`].

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use std::process::Command;
use std::sync::RwLock;
use thiserror::Error;
use which::which;

use crate::config::ConfigManager;
use crate::models::{
    Bottle, BottleConfig, NewBottleSpec, PackageInstall, UpdateRecord, WindowsVersion,
};
use crate::services::wine::Wine;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not find wine binary. Please first install wine on your machine.")]
    WineNotFound,

    #[error("A Wine bottle with the same name already exists. Try another name.")]
    DuplicateName,

    #[error("No Wine bottle named '{0}' exists.")]
    UnknownBottle(String),

    #[error("The bottle name may not be empty.")]
    EmptyName,

    #[error("Something went wrong during creation of a new Windows machine!\n{0}")]
    Creation(String),

    #[error("Something went wrong during updating the Windows machine!\n{0}")]
    Update(String),

    #[error("Something went wrong during installation of the software package!\n{0}")]
    Install(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronous bottle operations, safe to run off the GUI thread.
pub trait BottleStore: Send + Sync {
    fn create(&self, spec: &NewBottleSpec) -> Result<Bottle, StoreError>;
    fn update(&self, record: &UpdateRecord) -> Result<Bottle, StoreError>;
    fn install_package(&self, request: &PackageInstall) -> Result<(), StoreError>;
    fn remove(&self, name: &str) -> Result<(), StoreError>;
    fn bottles(&self) -> Vec<Bottle>;
}

/// Bottle store backed by Wine prefixes under a root directory.
pub struct WineBottleStore {
    bottles_root: Utf8PathBuf,
    wine: Option<Wine>,
    /// Explicit winetricks binary; resolved from PATH when unset.
    winetricks: Option<Utf8PathBuf>,
    registry: RwLock<IndexMap<String, Bottle>>,
}

impl WineBottleStore {
    pub fn new(bottles_root: impl Into<Utf8PathBuf>, wine: Option<Wine>) -> Self {
        Self {
            bottles_root: bottles_root.into(),
            wine,
            winetricks: None,
            registry: RwLock::new(IndexMap::new()),
        }
    }

    /// Use a fixed winetricks binary instead of resolving it from PATH.
    pub fn with_winetricks(mut self, winetricks: impl Into<Utf8PathBuf>) -> Self {
        self.winetricks = Some(winetricks.into());
        self
    }

    pub fn bottles_root(&self) -> &Utf8Path {
        &self.bottles_root
    }

    /// Rebuild the in-memory registry from the prefixes on disk.
    ///
    /// A prefix whose config cannot be read is logged and skipped; one
    /// broken bottle must not hide the rest.
    pub fn scan(&self) -> Result<usize, StoreError> {
        fs::create_dir_all(&self.bottles_root)?;
        let mut found = IndexMap::new();

        for entry in fs::read_dir(&self.bottles_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(prefix) = Utf8PathBuf::try_from(entry.path()) else {
                tracing::warn!(path = ?entry.path(), "skipping non UTF-8 prefix path");
                continue;
            };
            let folder_name = prefix
                .file_name()
                .unwrap_or_default()
                .to_string();
            match ConfigManager::load_bottle_config(&prefix) {
                Ok(config) => {
                    let bottle = config.into_bottle(folder_name, prefix);
                    found.insert(bottle.name.clone(), bottle);
                }
                Err(err) => {
                    tracing::warn!(prefix = %prefix, "skipping bottle with unreadable config: {err:#}");
                }
            }
        }

        found.sort_keys();
        let count = found.len();
        *self.registry.write().unwrap() = found;
        tracing::info!(count, root = %self.bottles_root, "bottle scan complete");
        Ok(count)
    }

    fn wine(&self) -> Result<&Wine, StoreError> {
        self.wine.as_ref().ok_or(StoreError::WineNotFound)
    }

    /// Derive the prefix folder name from a display name.
    fn folder_name_for(name: &str) -> String {
        let folder: String = name
            .trim()
            .chars()
            .filter_map(|c| {
                if c.is_ascii_alphanumeric() {
                    Some(c.to_ascii_lowercase())
                } else if c == ' ' || c == '-' || c == '_' {
                    Some('_')
                } else {
                    None
                }
            })
            .collect();
        if folder.is_empty() {
            "bottle".to_string()
        } else {
            folder
        }
    }

    fn apply_windows_version(
        &self,
        prefix: &Utf8Path,
        version: WindowsVersion,
    ) -> Result<(), String> {
        self.wine()
            .map_err(|err| err.to_string())?
            .run_in_prefix(prefix, &["winecfg", "-v", version.winecfg_key()])
            .map_err(|err| err.to_string())
    }

    fn apply_audio_driver(&self, prefix: &Utf8Path, value: &str) -> Result<(), String> {
        self.wine()
            .map_err(|err| err.to_string())?
            .run_in_prefix(
                prefix,
                &[
                    "reg",
                    "add",
                    r"HKCU\Software\Wine\Drivers",
                    "/v",
                    "Audio",
                    "/t",
                    "REG_SZ",
                    "/d",
                    value,
                    "/f",
                ],
            )
            .map_err(|err| err.to_string())
    }

    fn apply_virtual_desktop(
        &self,
        prefix: &Utf8Path,
        resolution: Option<&str>,
    ) -> Result<(), String> {
        let wine = self.wine().map_err(|err| err.to_string())?;
        match resolution {
            Some(resolution) => {
                wine.run_in_prefix(
                    prefix,
                    &[
                        "reg",
                        "add",
                        r"HKCU\Software\Wine\Explorer",
                        "/v",
                        "Desktop",
                        "/t",
                        "REG_SZ",
                        "/d",
                        "Default",
                        "/f",
                    ],
                )
                .map_err(|err| err.to_string())?;
                wine.run_in_prefix(
                    prefix,
                    &[
                        "reg",
                        "add",
                        r"HKCU\Software\Wine\Explorer\Desktops",
                        "/v",
                        "Default",
                        "/t",
                        "REG_SZ",
                        "/d",
                        resolution,
                        "/f",
                    ],
                )
                .map_err(|err| err.to_string())
            }
            None => {
                // Absent key just means the desktop was never enabled.
                if let Err(err) = wine.run_in_prefix(
                    prefix,
                    &[
                        "reg",
                        "delete",
                        r"HKCU\Software\Wine\Explorer",
                        "/v",
                        "Desktop",
                        "/f",
                    ],
                ) {
                    tracing::debug!("virtual desktop key removal skipped: {err}");
                }
                Ok(())
            }
        }
    }
}

impl BottleStore for WineBottleStore {
    fn create(&self, spec: &NewBottleSpec) -> Result<Bottle, StoreError> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let folder_name = Self::folder_name_for(name);
        let prefix = self.bottles_root.join(&folder_name);
        {
            let registry = self.registry.read().unwrap();
            if registry.contains_key(name)
                || registry.values().any(|b| b.folder_name == folder_name)
                || prefix.exists()
            {
                return Err(StoreError::DuplicateName);
            }
        }

        let wine = self.wine()?;
        tracing::info!(name, prefix = %prefix, "creating bottle");

        fs::create_dir_all(&prefix)?;
        wine.init_prefix(&prefix, spec.bit.winearch(), spec.disable_gecko_mono)
            .map_err(|err| StoreError::Creation(err.to_string()))?;

        if spec.windows_version != WindowsVersion::default() {
            self.apply_windows_version(&prefix, spec.windows_version)
                .map_err(StoreError::Creation)?;
        }
        if let Some(resolution) = spec.virtual_desktop_resolution.as_deref() {
            self.apply_virtual_desktop(&prefix, Some(resolution))
                .map_err(StoreError::Creation)?;
        }
        if spec.audio_driver != Default::default() {
            self.apply_audio_driver(&prefix, spec.audio_driver.registry_value())
                .map_err(StoreError::Creation)?;
        }

        let bottle = Bottle {
            name: name.to_string(),
            folder_name,
            description: String::new(),
            prefix: prefix.clone(),
            windows_version: spec.windows_version,
            bit: spec.bit,
            virtual_desktop_resolution: spec.virtual_desktop_resolution.clone(),
            audio_driver: spec.audio_driver,
            is_debug_logging: false,
            debug_log_level: crate::models::DEFAULT_DEBUG_LOG_LEVEL,
        };
        ConfigManager::save_bottle_config(&prefix, &BottleConfig::from_bottle(&bottle))
            .map_err(|err| StoreError::Creation(format!("{err:#}")))?;

        self.registry
            .write()
            .unwrap()
            .insert(bottle.name.clone(), bottle.clone());
        tracing::info!(name = %bottle.name, "bottle created");
        Ok(bottle)
    }

    fn update(&self, record: &UpdateRecord) -> Result<Bottle, StoreError> {
        let existing = {
            let registry = self.registry.read().unwrap();
            registry
                .values()
                .find(|b| b.folder_name == record.folder_name)
                .cloned()
                .ok_or_else(|| StoreError::UnknownBottle(record.name.clone()))?
        };

        if record.name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        if record.name != existing.name
            && self.registry.read().unwrap().contains_key(&record.name)
        {
            return Err(StoreError::DuplicateName);
        }

        tracing::info!(name = %existing.name, "updating bottle");

        // Wine is only involved for settings Wine itself tracks; renames and
        // descriptions are pure config rewrites.
        if record.windows_version != existing.windows_version {
            self.apply_windows_version(&existing.prefix, record.windows_version)
                .map_err(StoreError::Update)?;
        }
        if record.audio_driver != existing.audio_driver {
            self.apply_audio_driver(&existing.prefix, record.audio_driver.registry_value())
                .map_err(StoreError::Update)?;
        }
        if record.virtual_desktop_resolution != existing.virtual_desktop_resolution {
            self.apply_virtual_desktop(
                &existing.prefix,
                record.virtual_desktop_resolution.as_deref(),
            )
            .map_err(StoreError::Update)?;
        }

        let bottle = Bottle {
            name: record.name.trim().to_string(),
            folder_name: existing.folder_name.clone(),
            description: record.description.clone(),
            prefix: existing.prefix.clone(),
            windows_version: record.windows_version,
            bit: existing.bit,
            virtual_desktop_resolution: record.virtual_desktop_resolution.clone(),
            audio_driver: record.audio_driver,
            is_debug_logging: record.is_debug_logging,
            debug_log_level: record.debug_log_level,
        };
        ConfigManager::save_bottle_config(&bottle.prefix, &BottleConfig::from_bottle(&bottle))
            .map_err(|err| StoreError::Update(format!("{err:#}")))?;

        let mut registry = self.registry.write().unwrap();
        registry.shift_remove(&existing.name);
        registry.insert(bottle.name.clone(), bottle.clone());
        tracing::info!(name = %bottle.name, "bottle updated");
        Ok(bottle)
    }

    fn install_package(&self, request: &PackageInstall) -> Result<(), StoreError> {
        let bottle = {
            let registry = self.registry.read().unwrap();
            registry
                .get(&request.bottle)
                .cloned()
                .ok_or_else(|| StoreError::UnknownBottle(request.bottle.clone()))?
        };
        self.wine()?;

        let winetricks = match &self.winetricks {
            Some(path) => path.clone(),
            None => which("winetricks")
                .ok()
                .and_then(|p| Utf8PathBuf::try_from(p).ok())
                .ok_or_else(|| {
                    StoreError::Install(
                        "Could not find winetricks binary. Please first install winetricks."
                            .to_string(),
                    )
                })?,
        };

        tracing::info!(bottle = %bottle.name, package = %request.package, "installing package");
        let output = Command::new(winetricks.as_std_path())
            .arg("-q")
            .arg(request.package.verb())
            .env("WINEPREFIX", bottle.prefix.as_str())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StoreError::Install(if stderr.is_empty() {
                format!("winetricks exited with {}", output.status)
            } else {
                stderr
            }));
        }
        tracing::info!(bottle = %bottle.name, package = %request.package, "package installed");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let bottle = self
            .registry
            .write()
            .unwrap()
            .shift_remove(name)
            .ok_or_else(|| StoreError::UnknownBottle(name.to_string()))?;
        if bottle.prefix.exists() {
            fs::remove_dir_all(&bottle.prefix)?;
        }
        tracing::info!(name, "bottle removed");
        Ok(())
    }

    fn bottles(&self) -> Vec<Bottle> {
        self.registry.read().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name_sanitization() {
        assert_eq!(WineBottleStore::folder_name_for("My Games"), "my_games");
        assert_eq!(WineBottleStore::folder_name_for("  Steam  "), "steam");
        assert_eq!(WineBottleStore::folder_name_for("a/b:c"), "abc");
        assert_eq!(WineBottleStore::folder_name_for("日本語"), "bottle");
    }

    #[test]
    fn test_create_without_wine_reports_wine_not_found() {
        let store = WineBottleStore::new("/tmp/nonexistent-bottles-root", None);
        let spec = NewBottleSpec {
            name: "Test".to_string(),
            windows_version: WindowsVersion::default(),
            bit: Default::default(),
            virtual_desktop_resolution: None,
            disable_gecko_mono: false,
            audio_driver: Default::default(),
        };
        let err = store.create(&spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find wine binary. Please first install wine on your machine."
        );
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let store = WineBottleStore::new("/tmp/nonexistent-bottles-root", None);
        let spec = NewBottleSpec {
            name: "   ".to_string(),
            windows_version: WindowsVersion::default(),
            bit: Default::default(),
            virtual_desktop_resolution: None,
            disable_gecko_mono: false,
            audio_driver: Default::default(),
        };
        assert!(matches!(store.create(&spec), Err(StoreError::EmptyName)));
    }
}
