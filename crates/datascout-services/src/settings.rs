//! Client settings persisted as JSON in the user's config directory

use anyhow::{Context, Result};
use datascout_schema::AnnotationIngest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutSettings {
    /// Base URL of the DataScout backend the transport talks to
    pub api_base_url: String,
    /// How long a "saved" badge stays visible, in milliseconds
    pub save_revert_delay_ms: u64,
    pub annotation_ingest: AnnotationIngest,
}

impl Default for ScoutSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            save_revert_delay_ms: 2000,
            annotation_ingest: AnnotationIngest::Reset,
        }
    }
}

impl ScoutSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("datascout").join("settings.json"))
    }

    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.save_revert_delay_ms)
    }
}
