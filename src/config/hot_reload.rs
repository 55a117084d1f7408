//! Settings Hot-Reload - Poll settings.json for Changes
//!
//! Periodically re-reads the trading settings document and compares
//! it with the last seen contents. When it changes and still
//! validates, the full new `Settings` value is broadcast on a
//! `tokio::sync::watch` channel; the receiver side hands it to the
//! engine as a wholesale replacement.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use crate::adapters::persistence::SettingsStore;
use crate::domain::settings::Settings;

/// Watches the settings file and broadcasts validated replacements.
///
/// Polls rather than using a filesystem watcher, which has portability
/// issues across Linux/macOS/Docker volumes. Compares a hash of the
/// raw file contents to detect edits.
pub struct SettingsWatcher {
    /// Settings file access.
    store: SettingsStore,
    /// Poll interval.
    interval: Duration,
    /// Watch channel sender for settings updates.
    settings_tx: watch::Sender<Settings>,
    /// Last known content hash (for diff detection).
    last_hash: Option<u64>,
}

impl SettingsWatcher {
    /// Create a new settings watcher.
    ///
    /// Returns the watcher and a receiver that is notified whenever a
    /// valid new settings document is picked up.
    pub fn new(
        store: SettingsStore,
        interval: Duration,
        initial: Settings,
    ) -> (Self, watch::Receiver<Settings>) {
        let (settings_tx, settings_rx) = watch::channel(initial);

        let watcher = Self {
            store,
            interval,
            settings_tx,
            last_hash: None,
        };

        (watcher, settings_rx)
    }

    /// Run the watcher loop until shutdown.
    #[instrument(skip(self, shutdown_rx), fields(path = %self.store.path().display()))]
    pub async fn run(
        &mut self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Settings watcher started"
        );

        self.last_hash = self.store.content_hash().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Settings watcher shutting down");
                    return Ok(());
                }
                () = tokio::time::sleep(self.interval) => {
                    self.check_and_reload().await;
                }
            }
        }
    }

    /// Reload the settings if the file changed since the last check.
    pub async fn check_and_reload(&mut self) {
        let new_hash = self.store.content_hash().await;

        if new_hash == self.last_hash {
            debug!("Settings unchanged");
            return;
        }

        info!("Settings change detected, reloading...");

        match self.store.load().await {
            Ok(settings) => {
                self.last_hash = new_hash;
                if let Err(e) = settings.validate() {
                    warn!(error = %e, "Rejected invalid settings, keeping current");
                    return;
                }
                if self.settings_tx.send(settings).is_err() {
                    warn!("No settings subscribers, update dropped");
                } else {
                    info!("Settings reloaded");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to reload settings, keeping current");
            }
        }
    }
}
