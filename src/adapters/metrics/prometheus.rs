//! Prometheus Metrics Registry - Automation Observability
//!
//! Counts activity events by severity (as an `ActivitySink`) and
//! mirrors the engine's counters and running state into Prometheus
//! collectors whenever the exporter is scraped.

use std::sync::Mutex;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::activity::ActivityEvent;
use crate::domain::status::{EngineCounters, EngineStatus};
use crate::ports::activity::ActivitySink;

/// Centralized Prometheus metrics for the automation bot.
///
/// All metrics follow the naming convention `nft_bot_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Activity events emitted, by severity.
    pub activity_events: IntCounterVec,
    /// Engine lifecycle (1 = running, 0 = stopped).
    pub engine_running: IntGauge,
    /// Completed or failed cycles.
    pub cycles: IntCounter,
    /// Offers accepted by the marketplace.
    pub offers: IntCounter,
    /// Purchases accepted by the marketplace.
    pub purchases: IntCounter,
    /// Cycles skipped because the floor was outside the price band.
    pub policy_skips: IntCounter,
    /// Buy branches declined by the guard or the daily limit.
    pub buy_skips: IntCounter,
    /// Cycles that ended in an error.
    pub cycle_errors: IntCounter,
    /// Engine counters as of the last sync.
    last_synced: Mutex<EngineCounters>,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let activity_events = IntCounterVec::new(
            Opts::new("nft_bot_activity_events_total", "Activity events emitted"),
            &["severity"],
        )?;
        let engine_running = IntGauge::new(
            "nft_bot_engine_running",
            "Whether the automation loop is running (1=yes, 0=no)",
        )?;
        let cycles = IntCounter::new("nft_bot_cycles_total", "Automation cycles executed")?;
        let offers = IntCounter::new("nft_bot_offers_total", "Offers accepted by the marketplace")?;
        let purchases =
            IntCounter::new("nft_bot_purchases_total", "Purchases accepted by the marketplace")?;
        let policy_skips = IntCounter::new(
            "nft_bot_policy_skips_total",
            "Cycles skipped because the floor price was out of bounds",
        )?;
        let buy_skips = IntCounter::new(
            "nft_bot_buy_skips_total",
            "Buy attempts declined by the free-NFT guard or daily limit",
        )?;
        let cycle_errors =
            IntCounter::new("nft_bot_cycle_errors_total", "Automation cycles that failed")?;

        registry.register(Box::new(activity_events.clone()))?;
        registry.register(Box::new(engine_running.clone()))?;
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(offers.clone()))?;
        registry.register(Box::new(purchases.clone()))?;
        registry.register(Box::new(policy_skips.clone()))?;
        registry.register(Box::new(buy_skips.clone()))?;
        registry.register(Box::new(cycle_errors.clone()))?;

        Ok(Self {
            registry,
            activity_events,
            engine_running,
            cycles,
            offers,
            purchases,
            policy_skips,
            buy_skips,
            cycle_errors,
            last_synced: Mutex::new(EngineCounters::default()),
        })
    }

    /// Bring the collectors up to date with an engine snapshot.
    ///
    /// Counters only ever move forward by the difference since the
    /// previous sync.
    pub fn sync_status(&self, status: &EngineStatus) {
        self.engine_running.set(i64::from(status.is_running()));

        let Ok(mut last) = self.last_synced.lock() else {
            return;
        };
        let now = status.counters;
        advance(&self.cycles, last.cycles, now.cycles);
        advance(&self.offers, last.offers, now.offers);
        advance(&self.purchases, last.purchases, now.purchases);
        advance(&self.policy_skips, last.policy_skips, now.policy_skips);
        advance(&self.buy_skips, last.buy_skips, now.buy_skips);
        advance(&self.cycle_errors, last.cycle_errors, now.cycle_errors);
        *last = now;
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn advance(counter: &IntCounter, previous: u64, current: u64) {
    let delta = current.saturating_sub(previous);
    if delta > 0 {
        counter.inc_by(delta);
    }
}

impl ActivitySink for MetricsRegistry {
    fn notify(&self, event: ActivityEvent) {
        self.activity_events
            .with_label_values(&[event.severity.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::EngineState;

    fn status(state: EngineState, counters: EngineCounters) -> EngineStatus {
        EngineStatus {
            state,
            enabled_networks: Vec::new(),
            counters,
        }
    }

    #[test]
    fn test_events_counted_by_severity() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.notify(ActivityEvent::info("a"));
        metrics.notify(ActivityEvent::info("b"));
        metrics.notify(ActivityEvent::error("c"));

        assert_eq!(metrics.activity_events.with_label_values(&["info"]).get(), 2);
        assert_eq!(metrics.activity_events.with_label_values(&["error"]).get(), 1);
        assert_eq!(metrics.activity_events.with_label_values(&["success"]).get(), 0);
    }

    #[test]
    fn test_sync_advances_by_difference() {
        let metrics = MetricsRegistry::new().unwrap();
        let first = EngineCounters {
            cycles: 3,
            offers: 1,
            ..EngineCounters::default()
        };
        metrics.sync_status(&status(EngineState::Running, first));
        assert_eq!(metrics.cycles.get(), 3);
        assert_eq!(metrics.engine_running.get(), 1);

        let second = EngineCounters {
            cycles: 5,
            offers: 1,
            purchases: 2,
            ..EngineCounters::default()
        };
        metrics.sync_status(&status(EngineState::Stopped, second));
        assert_eq!(metrics.cycles.get(), 5);
        assert_eq!(metrics.offers.get(), 1);
        assert_eq!(metrics.purchases.get(), 2);
        assert_eq!(metrics.engine_running.get(), 0);
    }

    #[test]
    fn test_encode_contains_metric_names() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.notify(ActivityEvent::warning("w"));
        let text = metrics.encode().unwrap();
        assert!(text.contains("nft_bot_activity_events_total"));
        assert!(text.contains("nft_bot_engine_running"));
    }
}
