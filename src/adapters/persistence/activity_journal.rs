//! Activity Journal - Append-only JSONL Activity Records
//!
//! Persists activity events to daily JSONL files in the format
//! `activity/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record, so a crash loses at most the line being written.
//!
//! The engine never writes here directly: events flow through a
//! `ChannelSink` and [`ActivityJournal::run`] drains them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, instrument, warn};

use crate::domain::activity::ActivityEvent;

/// Append-only JSONL activity log with daily file rotation.
pub struct ActivityJournal {
    /// Directory holding the daily files.
    activity_dir: PathBuf,
}

impl ActivityJournal {
    /// Create a journal in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let activity_dir = Path::new(data_dir).join("activity");

        fs::create_dir_all(&activity_dir)
            .await
            .context("Failed to create activity directory")?;

        Ok(Self { activity_dir })
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.activity_dir
            .join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append an event to the file for its own UTC day.
    pub async fn append(&self, event: &ActivityEvent) -> Result<()> {
        let path = self.day_path(event.timestamp.date_naive());

        let mut json = serde_json::to_string(event)
            .context("Failed to serialize activity event")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open activity file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write activity event")?;

        file.flush().await.context("Failed to flush activity file")?;

        Ok(())
    }

    /// Load one day's events in file order.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<ActivityEvent>> {
        let path = self.day_path(date);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut events = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed activity record"
                    );
                }
            }
        }

        Ok(events)
    }

    /// Today's events (UTC).
    pub async fn load_today(&self) -> Result<Vec<ActivityEvent>> {
        self.load_day(Utc::now().date_naive()).await
    }

    /// Drain a channel of events into the journal until shutdown or
    /// until every sender is dropped.
    #[instrument(skip_all, fields(dir = %self.activity_dir.display()))]
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<ActivityEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!("Activity journal started");

        loop {
            tokio::select! {
                biased;
                maybe = events.recv() => {
                    let Some(event) = maybe else { break };
                    if let Err(e) = self.append(&event).await {
                        warn!(error = %e, "Failed to journal activity event");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Flush whatever is already queued before exiting.
                    while let Ok(event) = events.try_recv() {
                        if let Err(e) = self.append(&event).await {
                            warn!(error = %e, "Failed to journal activity event");
                        }
                    }
                    break;
                }
            }
        }

        info!("Activity journal stopped");
    }

    /// Check if the activity directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let test_path = self.activity_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
