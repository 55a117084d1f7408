//! Tracing Sink - Activity Events as Log Lines
//!
//! Maps severities onto tracing levels; `success` logs at info with a
//! `success` field so it can be filtered.

use tracing::{error, info, warn};

use crate::domain::activity::{ActivityEvent, Severity};
use crate::ports::activity::ActivitySink;

/// Writes every activity event to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ActivitySink for TracingSink {
    fn notify(&self, event: ActivityEvent) {
        let id = event.id;
        match event.severity {
            Severity::Info => info!(activity = %id, "{}", event.message),
            Severity::Success => info!(activity = %id, success = true, "{}", event.message),
            Severity::Warning => warn!(activity = %id, "{}", event.message),
            Severity::Error => error!(activity = %id, "{}", event.message),
        }
    }
}
