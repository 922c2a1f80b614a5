//! Configuration Management
//!
//! Handles persistent configuration storage for stackops.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Preferred AWS region (falls back to the ambient AWS environment)
    #[serde(default)]
    pub region: Option<String>,
    /// Last used snapshot file
    #[serde(default)]
    pub snapshot: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stackops").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Set the last used snapshot and save
    pub fn set_snapshot(&mut self, snapshot: &str) -> Result<()> {
        self.snapshot = Some(snapshot.to_string());
        self.save()
    }
}
