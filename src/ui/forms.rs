//! Assembling task records from raw form values.
//!
//! Combobox selections arrive as raw id strings and entries as free text.
//! Anything unparseable falls back to a documented default instead of
//! surfacing an error; a save must never fail because a widget handed back
//! garbage.

use crate::models::{
    is_valid_resolution, AudioDriver, Bit, NewBottleSpec, UpdateRecord, WindowsVersion,
    DEFAULT_DEBUG_LOG_LEVEL, DEFAULT_VIRTUAL_DESKTOP_RESOLUTION, MAX_DEBUG_LOG_LEVEL,
};

/// Raw values collected from the new-bottle wizard.
#[derive(Debug, Clone, Default)]
pub struct WizardForm {
    pub name: String,
    pub windows_version_index: String,
    pub bit_index: String,
    pub virtual_desktop_enabled: bool,
    pub virtual_desktop_resolution: String,
    pub disable_gecko_mono: bool,
    pub audio_driver_index: String,
}

impl WizardForm {
    pub fn to_spec(&self) -> NewBottleSpec {
        NewBottleSpec {
            name: self.name.trim().to_string(),
            windows_version: parse_windows_version(&self.windows_version_index),
            bit: parse_bit(&self.bit_index),
            virtual_desktop_resolution: resolve_resolution(
                self.virtual_desktop_enabled,
                &self.virtual_desktop_resolution,
            ),
            disable_gecko_mono: self.disable_gecko_mono,
            audio_driver: parse_audio_driver(&self.audio_driver_index),
        }
    }
}

/// Raw values collected from the edit window.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    pub name: String,
    pub folder_name: String,
    pub description: String,
    pub windows_version_index: String,
    pub audio_driver_index: String,
    pub virtual_desktop_enabled: bool,
    pub virtual_desktop_resolution: String,
    pub enable_debug_logging: bool,
    pub debug_log_level: String,
}

impl EditForm {
    pub fn to_update_record(&self) -> UpdateRecord {
        UpdateRecord {
            name: self.name.trim().to_string(),
            folder_name: self.folder_name.clone(),
            description: self.description.trim().to_string(),
            windows_version: parse_windows_version(&self.windows_version_index),
            virtual_desktop_resolution: resolve_resolution(
                self.virtual_desktop_enabled,
                &self.virtual_desktop_resolution,
            ),
            audio_driver: parse_audio_driver(&self.audio_driver_index),
            is_debug_logging: self.enable_debug_logging,
            debug_log_level: parse_log_level(&self.debug_log_level),
        }
    }
}

fn parse_windows_version(raw: &str) -> WindowsVersion {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(WindowsVersion::from_index)
        .unwrap_or_default()
}

fn parse_audio_driver(raw: &str) -> AudioDriver {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(AudioDriver::from_index)
        .unwrap_or_default()
}

fn parse_bit(raw: &str) -> Bit {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(Bit::from_index)
        .unwrap_or_default()
}

fn parse_log_level(raw: &str) -> u8 {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|level| *level <= MAX_DEBUG_LOG_LEVEL)
        .unwrap_or(DEFAULT_DEBUG_LOG_LEVEL)
}

fn resolve_resolution(enabled: bool, raw: &str) -> Option<String> {
    if !enabled {
        return None;
    }
    let raw = raw.trim();
    if is_valid_resolution(raw) {
        Some(raw.to_string())
    } else {
        Some(DEFAULT_VIRTUAL_DESKTOP_RESOLUTION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_log_level_falls_back_to_default() {
        let form = EditForm {
            debug_log_level: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(form.to_update_record().debug_log_level, 1);
    }

    #[test]
    fn test_out_of_range_log_level_falls_back_to_default() {
        let form = EditForm {
            debug_log_level: "200".to_string(),
            ..Default::default()
        };
        assert_eq!(form.to_update_record().debug_log_level, 1);
    }

    #[test]
    fn test_out_of_range_windows_index_falls_back_to_default() {
        let form = EditForm {
            windows_version_index: "99".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.to_update_record().windows_version,
            WindowsVersion::Windows10
        );
    }

    #[test]
    fn test_unparseable_audio_index_falls_back_to_default() {
        let form = WizardForm {
            audio_driver_index: "xyz".to_string(),
            ..Default::default()
        };
        assert_eq!(form.to_spec().audio_driver, AudioDriver::PulseAudio);
    }

    #[test]
    fn test_valid_indices_are_honored() {
        let form = EditForm {
            windows_version_index: "2".to_string(),
            audio_driver_index: "1".to_string(),
            debug_log_level: "3".to_string(),
            ..Default::default()
        };
        let record = form.to_update_record();
        assert_eq!(record.windows_version, WindowsVersion::Windows7);
        assert_eq!(record.audio_driver, AudioDriver::Alsa);
        assert_eq!(record.debug_log_level, 3);
    }

    #[test]
    fn test_invalid_resolution_falls_back_when_desktop_enabled() {
        let form = WizardForm {
            virtual_desktop_enabled: true,
            virtual_desktop_resolution: "huge".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.to_spec().virtual_desktop_resolution.as_deref(),
            Some("1024x768")
        );
    }

    #[test]
    fn test_disabled_desktop_yields_no_resolution() {
        let form = WizardForm {
            virtual_desktop_enabled: false,
            virtual_desktop_resolution: "1920x1080".to_string(),
            ..Default::default()
        };
        assert_eq!(form.to_spec().virtual_desktop_resolution, None);
    }
}
