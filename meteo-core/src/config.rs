use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Location;

/// Fallback location override stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [fallback]
    /// latitude = 48.8566
    /// longitude = 2.3522
    /// name = "Paris"
    pub fallback: Option<FallbackLocation>,
}

impl Config {
    /// The location used whenever geocoding or the primary weather fetch
    /// fails: the configured override, or the built-in default.
    pub fn fallback_location(&self) -> Location {
        match &self.fallback {
            Some(fb) => Location::new(fb.latitude, fb.longitude, fb.name.clone()),
            None => Location::fallback(),
        }
    }

    pub fn set_fallback(&mut self, location: &Location) {
        self.fallback = Some(FallbackLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            name: location.display_name.clone(),
        });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
