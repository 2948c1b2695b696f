use serde::{Deserialize, Serialize};

use crate::models::bottle::{AudioDriver, Bit, Bottle, WindowsVersion};
use camino::Utf8PathBuf;

/// Application-wide configuration stored in the data directory.
///
/// Mirrors the fields of the general config window: where bottles live,
/// whether the default machine shows in the list, and logging preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(rename = "Default Folder", default)]
    pub default_folder: String,

    #[serde(rename = "Display Default Wine Machine", default = "default_true")]
    pub display_default_wine_machine: bool,

    #[serde(rename = "Prefer Wine64", default = "default_true")]
    pub prefer_wine64: bool,

    #[serde(rename = "Enable Logging Stderr", default)]
    pub enable_logging_stderr: bool,

    #[serde(rename = "Enable Debug Logging", default)]
    pub enable_debug_logging: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_folder: String::new(),
            display_default_wine_machine: true,
            prefer_wine64: true,
            enable_logging_stderr: false,
            enable_debug_logging: false,
        }
    }
}

/// Per-bottle configuration stored as YAML inside the bottle's prefix.
///
/// Version and driver fields are stored as their Wine-facing string keys so
/// the file stays readable next to the prefix it describes; unknown keys
/// fall back to the documented defaults when loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleConfig {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Windows Version", default)]
    pub windows_version: String,

    #[serde(rename = "Bitness", default)]
    pub bit: String,

    #[serde(rename = "Virtual Desktop Resolution", default)]
    pub virtual_desktop_resolution: Option<String>,

    #[serde(rename = "Audio Driver", default)]
    pub audio_driver: String,

    #[serde(rename = "Debug Logging", default)]
    pub is_debug_logging: bool,

    #[serde(rename = "Debug Log Level", default = "default_log_level")]
    pub debug_log_level: u8,
}

fn default_log_level() -> u8 {
    crate::models::bottle::DEFAULT_DEBUG_LOG_LEVEL
}

impl BottleConfig {
    /// Capture a bottle's persistent fields.
    pub fn from_bottle(bottle: &Bottle) -> Self {
        Self {
            name: bottle.name.clone(),
            description: bottle.description.clone(),
            windows_version: bottle.windows_version.winecfg_key().to_string(),
            bit: bottle.bit.winearch().to_string(),
            virtual_desktop_resolution: bottle.virtual_desktop_resolution.clone(),
            audio_driver: bottle.audio_driver.registry_value().to_string(),
            is_debug_logging: bottle.is_debug_logging,
            debug_log_level: bottle.debug_log_level,
        }
    }

    /// Rebuild a bottle from its config file plus its on-disk location.
    ///
    /// Unrecognized version/driver keys fall back to defaults rather than
    /// failing the load; a hand-edited config should never make a bottle
    /// disappear from the list.
    pub fn into_bottle(self, folder_name: String, prefix: Utf8PathBuf) -> Bottle {
        let windows_version =
            WindowsVersion::from_winecfg_key(&self.windows_version).unwrap_or_default();
        let audio_driver =
            AudioDriver::from_registry_value(&self.audio_driver).unwrap_or_default();
        let bit = match self.bit.as_str() {
            "win32" => Bit::Win32,
            _ => Bit::Win64,
        };
        Bottle {
            name: self.name,
            folder_name,
            description: self.description,
            prefix,
            windows_version,
            bit,
            virtual_desktop_resolution: self.virtual_desktop_resolution,
            audio_driver,
            is_debug_logging: self.is_debug_logging,
            debug_log_level: self.debug_log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bottle() -> Bottle {
        Bottle {
            name: "Games".to_string(),
            folder_name: "games".to_string(),
            description: "Gaming bottle".to_string(),
            prefix: Utf8PathBuf::from("/tmp/bottles/games"),
            windows_version: WindowsVersion::Windows7,
            bit: Bit::Win32,
            virtual_desktop_resolution: Some("1920x1080".to_string()),
            audio_driver: AudioDriver::Alsa,
            is_debug_logging: true,
            debug_log_level: 3,
        }
    }

    #[test]
    fn test_bottle_config_round_trip() {
        let bottle = sample_bottle();
        let config = BottleConfig::from_bottle(&bottle);
        let rebuilt = config.into_bottle(bottle.folder_name.clone(), bottle.prefix.clone());
        assert_eq!(rebuilt, bottle);
    }

    #[test]
    fn test_unknown_keys_fall_back_to_defaults() {
        let config = BottleConfig {
            name: "Old".to_string(),
            description: String::new(),
            windows_version: "win31".to_string(),
            bit: "powerpc".to_string(),
            virtual_desktop_resolution: None,
            audio_driver: "esound".to_string(),
            is_debug_logging: false,
            debug_log_level: 1,
        };
        let bottle = config.into_bottle("old".to_string(), Utf8PathBuf::from("/tmp/old"));
        assert_eq!(bottle.windows_version, WindowsVersion::Windows10);
        assert_eq!(bottle.audio_driver, AudioDriver::PulseAudio);
        assert_eq!(bottle.bit, Bit::Win64);
    }

    #[test]
    fn test_general_config_defaults() {
        let config: GeneralConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert!(config.display_default_wine_machine);
        assert!(config.prefer_wine64);
        assert!(!config.enable_logging_stderr);
        assert!(config.default_folder.is_empty());
    }
}
