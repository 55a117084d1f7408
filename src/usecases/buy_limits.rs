//! Daily Buy Ledger - Per-network Purchase Limits
//!
//! Counts successful purchases per network within one UTC day and
//! answers whether another one is allowed under `maxDailyBuyLimit`.
//! Counters reset when the first query of a new day arrives.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::network::Network;

/// Purchase counts for the current UTC day.
#[derive(Debug, Clone)]
pub struct DailyBuyLedger {
  /// Day the counts belong to.
  day: NaiveDate,
  /// Successful purchases per network.
  counts: HashMap<Network, u32>,
}

impl DailyBuyLedger {
  /// Create an empty ledger for `today`.
  pub fn new(today: NaiveDate) -> Self {
    Self {
      day: today,
      counts: HashMap::new(),
    }
  }

  /// Whether another purchase on `network` stays within `limit`.
  pub fn can_buy(&mut self, network: Network, limit: u32, today: NaiveDate) -> bool {
    self.roll_over(today);
    self.count(network) < limit
  }

  /// Record one successful purchase.
  pub fn record_buy(&mut self, network: Network, today: NaiveDate) {
    self.roll_over(today);
    let count = self.counts.entry(network).or_insert(0);
    *count = count.saturating_add(1);
    debug!(network = %network, count = *count, "Recorded purchase");
  }

  /// Purchases recorded for `network` on the ledger's current day.
  pub fn count(&self, network: Network) -> u32 {
    self.counts.get(&network).copied().unwrap_or(0)
  }

  pub const fn day(&self) -> NaiveDate {
    self.day
  }

  /// Reset counters (called at day boundary).
  fn roll_over(&mut self, today: NaiveDate) {
    if today != self.day {
      info!(
        previous = %self.day,
        today = %today,
        purchases = self.counts.values().sum::<u32>(),
        "Resetting daily buy counters"
      );
      self.day = today;
      self.counts.clear();
    }
  }
}
