use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location.
pub const SETTINGS_ENV: &str = "DIMURA_SETTINGS";

impl std::fmt::Display for AudioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Block Size: {}", self.block_size)?;
        match self.sample_rate_override {
            Some(rate) => writeln!(f, "Sample Rate Override: {rate}")?,
            None => writeln!(f, "Sample Rate Override: None")?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Samples handed to the engine per `process` call.
    pub block_size: usize,
    /// Process as if the input had this rate; the file's own rate otherwise.
    pub sample_rate_override: Option<u32>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            block_size: 512,
            sample_rate_override: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    /// Factory preset id applied before any command-line overrides.
    pub default_preset: Option<String>,
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "------------------------------")?;

        writeln!(f, "Audio Settings:")?;
        writeln!(f, "{}", self.audio)?;

        writeln!(
            f,
            "Default Preset: {}",
            self.default_preset.as_deref().unwrap_or("None")
        )?;
        Ok(())
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// `$DIMURA_SETTINGS`, else the XDG config directory, else the home
    /// directory, else the working directory.
    pub fn default_path() -> PathBuf {
        const SETTINGS_FILENAME: &str = "settings.json";

        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            PathBuf::from(path)
        } else if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join("dimura")
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("dimura")
                .join(SETTINGS_FILENAME)
        } else {
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }
}
