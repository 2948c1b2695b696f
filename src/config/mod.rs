use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::models::{BottleConfig, GeneralConfig};

/// File name of the per-bottle configuration inside each prefix.
pub const BOTTLE_CONFIG_FILE: &str = "bottle.yaml";

const GENERAL_CONFIG_FILE: &str = "config.yaml";

/// Configuration manager for the YAML files this application owns.
///
/// The general configuration lives in the data directory; per-bottle
/// configurations live inside the prefix they describe, so a bottle moved
/// or copied wholesale keeps its settings.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    data_dir: Utf8PathBuf,
    general_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager rooted at `data_dir`, creating it if needed.
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {data_dir}"))?;
        }
        Ok(Self {
            general_config_path: data_dir.join(GENERAL_CONFIG_FILE),
            data_dir,
        })
    }

    /// ConfigManager at the user's standard config location.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().context("No user config directory available")?;
        let base = Utf8PathBuf::try_from(base).context("Config directory is not UTF-8")?;
        Self::new(base.join("winecellar"))
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Where bottles live: the configured default folder, or the standard
    /// data location when none is configured.
    pub fn resolve_bottles_root(&self, general: &GeneralConfig) -> Utf8PathBuf {
        if !general.default_folder.trim().is_empty() {
            return Utf8PathBuf::from(general.default_folder.trim());
        }
        dirs::data_dir()
            .and_then(|base| Utf8PathBuf::try_from(base).ok())
            .map(|base| base.join("winecellar").join("bottles"))
            .unwrap_or_else(|| self.data_dir.join("bottles"))
    }

    /// Load the general configuration, defaulting when the file is absent.
    pub fn load_general_config(&self) -> Result<GeneralConfig> {
        if !self.general_config_path.exists() {
            tracing::warn!(
                "General config not found at {}, using defaults",
                self.general_config_path
            );
            return Ok(GeneralConfig::default());
        }

        let contents = fs::read_to_string(&self.general_config_path)
            .with_context(|| format!("Failed to read config: {}", self.general_config_path))?;
        let config: GeneralConfig = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", self.general_config_path))?;

        tracing::info!("Loaded general config from {}", self.general_config_path);
        Ok(config)
    }

    pub fn save_general_config(&self, config: &GeneralConfig) -> Result<()> {
        let yaml =
            serde_yaml_ng::to_string(config).context("Failed to serialize general config")?;
        fs::write(&self.general_config_path, yaml)
            .with_context(|| format!("Failed to write config: {}", self.general_config_path))?;
        tracing::info!("Saved general config to {}", self.general_config_path);
        Ok(())
    }

    /// Load the configuration stored inside a bottle prefix.
    pub fn load_bottle_config(prefix: &Utf8Path) -> Result<BottleConfig> {
        let path = prefix.join(BOTTLE_CONFIG_FILE);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read bottle config: {path}"))?;
        let config: BottleConfig = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse bottle config: {path}"))?;
        Ok(config)
    }

    /// Write a bottle's configuration into its prefix.
    pub fn save_bottle_config(prefix: &Utf8Path, config: &BottleConfig) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(config).context("Failed to serialize bottle config")?;
        let path = prefix.join(BOTTLE_CONFIG_FILE);
        fs::write(&path, yaml).with_context(|| format!("Failed to write bottle config: {path}"))?;
        Ok(())
    }
}
