//! Fan-out Sink - One Event, Several Destinations
//!
//! Lets the engine hold a single `ActivitySink` while events reach the
//! log, the metrics registry and the journal channel.

use std::sync::Arc;

use crate::domain::activity::ActivityEvent;
use crate::ports::activity::ActivitySink;

/// Forwards each event to every inner sink, in registration order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ActivitySink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn ActivitySink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ActivitySink for FanoutSink {
    fn notify(&self, event: ActivityEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.notify(event.clone());
            }
            last.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::activity::ChannelSink;

    #[test]
    fn test_every_sink_receives_the_event() {
        let (a, mut rx_a) = ChannelSink::new();
        let (b, mut rx_b) = ChannelSink::new();
        let fanout = FanoutSink::new().with(Arc::new(a)).with(Arc::new(b));

        fanout.notify(ActivityEvent::success("done"));

        let ea = rx_a.try_recv().unwrap();
        let eb = rx_b.try_recv().unwrap();
        assert_eq!(ea.id, eb.id);
        assert_eq!(eb.message, "done");
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_empty_fanout_drops_events() {
        FanoutSink::new().notify(ActivityEvent::info("nobody listens"));
    }
}
