//! Settings Store - Atomic JSON Settings Persistence
//!
//! Saves the trading settings document using atomic writes (write to
//! tmp file, then rename), so the hot-reload watcher never observes a
//! half-written file.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::settings::Settings;

/// JSON settings file with atomic replace semantics.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Path to settings.json.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults when the file is absent.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or parsed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Settings> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read settings file")?;

        let settings: Settings =
            serde_json::from_str(&json).context("Failed to parse settings JSON")?;

        info!(
            enabled = settings.enabled_networks().len(),
            "Settings loaded"
        );

        Ok(settings)
    }

    /// Save settings atomically (tmp → rename).
    ///
    /// # Errors
    /// Fails on serialization or filesystem errors.
    #[instrument(skip(self, settings), fields(path = %self.path.display()))]
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create settings directory")?;
        }

        let json = serde_json::to_string_pretty(settings)
            .context("Failed to serialize settings")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp settings file")?;

        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename settings file")?;

        info!("Settings saved");
        Ok(())
    }

    /// Hash of the raw file contents, `None` if unreadable.
    pub async fn content_hash(&self) -> Option<u64> {
        let content = fs::read_to_string(&self.path).await.ok()?;
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Some(hasher.finish())
    }
}
