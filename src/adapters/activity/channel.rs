//! Channel-backed sink.
//!
//! `notify` is a non-blocking `send` on an unbounded channel; the
//! receiving task owns buffering and any slow I/O.

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::activity::ActivityEvent;
use crate::ports::activity::ActivitySink;

/// Forwards events to an unbounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ActivityEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ActivityEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ActivitySink for ChannelSink {
    fn notify(&self, event: ActivityEvent) {
        if self.tx.send(event).is_err() {
            debug!("Activity receiver dropped, event discarded");
        }
    }
}
