//! Saved launcher configuration
//!
//! The game list and the global profile persist as one JSON document
//! under the user config directory. A missing file is replaced with a
//! freshly written default configuration on first load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::game::GameEntry;
use crate::profile::GlobalProfile;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SavedConfig {
    #[serde(default)]
    pub global: GlobalProfile,
    #[serde(default)]
    pub games: Vec<GameEntry>,
}

impl SavedConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load the saved configuration, creating a default file on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, creating default config");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;

        info!(games = config.games.len(), "loaded launcher config");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        info!(path = %path.display(), "saved launcher config");
        Ok(())
    }

    pub fn find_game(&self, app_id: &str) -> Option<&GameEntry> {
        self.games.iter().find(|g| g.app_id == app_id)
    }
}
