//! Automation Engine - Offer/Buy Decision Loop
//!
//! Owns the Running/Stopped lifecycle and the single decision loop:
//! 1. Pick an enabled network and an action (offer or buy)
//! 2. Pick one of the network's top collections
//! 3. Check the floor price against the network's price band
//! 4. Pick a listed item and submit an offer or a purchase
//! 5. Wait a randomized delay, then repeat
//!
//! Every start opens a new run generation. The loop captures its
//! generation and re-checks it before each marketplace call and each
//! wait, so a stopped (or restarted) engine never makes another call
//! from an old loop. Waits are woken by `stop()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::domain::activity::ActivityEvent;
use crate::domain::error::{CycleError, EngineError};
use crate::domain::market::MarketItem;
use crate::domain::network::Network;
use crate::domain::policy::{self, Action};
use crate::domain::settings::{NetworkSettings, Settings};
use crate::domain::status::{EngineCounters, EngineState, EngineStatus};
use crate::domain::units::to_wei;
use crate::ports::activity::ActivitySink;
use crate::ports::marketplace::MarketplaceClient;
use crate::ports::status::{AutomationControl, StatusSource};

use super::buy_limits::DailyBuyLedger;

/// Wait durations used by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimings {
  /// After a floor price outside the configured band.
  pub policy_skip: Duration,
  /// After any cycle error.
  pub error_backoff: Duration,
  /// Lower bound of the inter-cycle delay.
  pub min_delay: Duration,
  /// Upper bound of the inter-cycle delay.
  pub max_delay: Duration,
}

impl Default for EngineTimings {
  fn default() -> Self {
    Self {
      policy_skip: Duration::from_secs(30),
      error_backoff: Duration::from_secs(60),
      min_delay: Duration::from_secs(5 * 60),
      max_delay: Duration::from_secs(15 * 60),
    }
  }
}

impl From<&EngineConfig> for EngineTimings {
  fn from(config: &EngineConfig) -> Self {
    Self {
      policy_skip: Duration::from_secs(config.policy_skip_seconds),
      error_backoff: Duration::from_secs(config.error_backoff_seconds),
      min_delay: Duration::from_secs(config.min_delay_seconds),
      max_delay: Duration::from_secs(config.max_delay_seconds),
    }
  }
}

/// Lifecycle state plus the generation of the current (or last) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Lifecycle {
  state: EngineState,
  generation: u64,
}

impl Lifecycle {
  fn is_current(self, generation: u64) -> bool {
    self.state == EngineState::Running && self.generation == generation
  }
}

/// How a cycle ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
  /// Offer or buy branch finished; wait the randomized delay.
  Completed,
  /// Floor outside the price band; wait the short skip delay.
  PolicySkip,
  /// The run generation ended mid-cycle.
  Cancelled,
}

#[derive(Debug, Default)]
struct Counters {
  cycles: AtomicU64,
  offers: AtomicU64,
  purchases: AtomicU64,
  policy_skips: AtomicU64,
  buy_skips: AtomicU64,
  cycle_errors: AtomicU64,
}

impl Counters {
  fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  fn snapshot(&self) -> EngineCounters {
    EngineCounters {
      cycles: self.cycles.load(Ordering::Relaxed),
      offers: self.offers.load(Ordering::Relaxed),
      purchases: self.purchases.load(Ordering::Relaxed),
      policy_skips: self.policy_skips.load(Ordering::Relaxed),
      buy_skips: self.buy_skips.load(Ordering::Relaxed),
      cycle_errors: self.cycle_errors.load(Ordering::Relaxed),
    }
  }
}

struct EngineInner<M: MarketplaceClient, A: ActivitySink> {
  marketplace: Arc<M>,
  sink: A,
  timings: EngineTimings,
  lifecycle: watch::Sender<Lifecycle>,
  settings: watch::Sender<Arc<Settings>>,
  rng: Mutex<StdRng>,
  ledger: Mutex<DailyBuyLedger>,
  counters: Counters,
}

/// Handle to the automation engine. Clones share the same engine.
pub struct AutomationEngine<M: MarketplaceClient, A: ActivitySink> {
  inner: Arc<EngineInner<M, A>>,
}

impl<M: MarketplaceClient, A: ActivitySink> Clone for AutomationEngine<M, A> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<M: MarketplaceClient, A: ActivitySink> AutomationEngine<M, A> {
  /// Create a stopped engine. Settings are validated on `start()`.
  pub fn new(
    marketplace: Arc<M>,
    sink: A,
    settings: Settings,
    timings: EngineTimings,
    rng: StdRng,
  ) -> Self {
    let (lifecycle, _) = watch::channel(Lifecycle::default());
    let (settings, _) = watch::channel(Arc::new(settings));
    Self {
      inner: Arc::new(EngineInner {
        marketplace,
        sink,
        timings,
        lifecycle,
        settings,
        rng: Mutex::new(rng),
        ledger: Mutex::new(DailyBuyLedger::new(Utc::now().date_naive())),
        counters: Counters::default(),
      }),
    }
  }

  /// Transition to Running and spawn the loop; the first cycle starts
  /// immediately.
  ///
  /// # Errors
  /// `AlreadyRunning` if a loop is active (a warning event is emitted),
  /// `InvalidSettings` if the current snapshot fails validation.
  pub fn start(&self) -> Result<(), EngineError> {
    let snapshot = self.settings();
    let mut outcome = Err(EngineError::AlreadyRunning);
    self.inner.lifecycle.send_if_modified(|lifecycle| {
      if lifecycle.state == EngineState::Running {
        return false;
      }
      if let Err(e) = snapshot.validate() {
        outcome = Err(EngineError::InvalidSettings(e));
        return false;
      }
      lifecycle.state = EngineState::Running;
      lifecycle.generation += 1;
      outcome = Ok(lifecycle.generation);
      true
    });

    match outcome {
      Ok(generation) => {
        info!(generation, "Automation started");
        self.inner.emit(ActivityEvent::info("Starting automation"));
        tokio::spawn(Arc::clone(&self.inner).run_loop(generation));
        Ok(())
      }
      Err(EngineError::AlreadyRunning) => {
        self.inner.emit(ActivityEvent::warning("Automation is already running"));
        Err(EngineError::AlreadyRunning)
      }
      Err(e) => {
        warn!(error = %e, "Refusing to start with invalid settings");
        Err(e)
      }
    }
  }

  /// Transition to Stopped and wake any pending wait. No-op when
  /// already stopped. An in-flight marketplace call is allowed to
  /// finish, but the loop makes no further calls afterwards.
  pub fn stop(&self) {
    let stopped = self.inner.lifecycle.send_if_modified(|lifecycle| {
      if lifecycle.state == EngineState::Stopped {
        return false;
      }
      lifecycle.state = EngineState::Stopped;
      true
    });
    if stopped {
      info!("Automation stopped");
      self.inner.emit(ActivityEvent::warning("Stopping automation"));
    }
  }

  /// Replace the settings snapshot. The next cycle sees the new
  /// settings; a cycle in progress keeps the snapshot it started with.
  ///
  /// # Errors
  /// `InvalidSettings`; the previous snapshot stays in place.
  pub fn update_settings(&self, settings: Settings) -> Result<(), EngineError> {
    settings.validate()?;
    let enabled = settings.enabled_networks().len();
    self.inner.settings.send_replace(Arc::new(settings));
    info!(enabled_networks = enabled, "Settings updated");
    Ok(())
  }

  pub fn state(&self) -> EngineState {
    self.inner.lifecycle.borrow().state
  }

  pub fn is_running(&self) -> bool {
    self.state() == EngineState::Running
  }

  /// Current settings snapshot.
  pub fn settings(&self) -> Arc<Settings> {
    Arc::clone(&self.inner.settings.borrow())
  }

  /// Successful purchases recorded today on `network`.
  pub fn purchases_today(&self, network: Network) -> u32 {
    self.inner.ledger().count(network)
  }
}

impl<M: MarketplaceClient, A: ActivitySink> StatusSource for AutomationEngine<M, A> {
  fn status(&self) -> EngineStatus {
    EngineStatus {
      state: self.state(),
      enabled_networks: self
        .settings()
        .enabled_networks()
        .into_iter()
        .map(|(network, _)| network)
        .collect(),
      counters: self.inner.counters.snapshot(),
    }
  }
}

impl<M: MarketplaceClient, A: ActivitySink> AutomationControl for AutomationEngine<M, A> {
  fn start(&self) -> Result<(), EngineError> {
    Self::start(self)
  }

  fn stop(&self) {
    Self::stop(self);
  }
}

impl<M: MarketplaceClient, A: ActivitySink> EngineInner<M, A> {
  fn emit(&self, event: ActivityEvent) {
    self.sink.notify(event);
  }

  fn is_current(&self, generation: u64) -> bool {
    self.lifecycle.borrow().is_current(generation)
  }

  fn rng(&self) -> MutexGuard<'_, StdRng> {
    self.rng.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn ledger(&self) -> MutexGuard<'_, DailyBuyLedger> {
    self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
  }

  #[instrument(skip(self), name = "automation_loop")]
  async fn run_loop(self: Arc<Self>, generation: u64) {
    let mut lifecycle = self.lifecycle.subscribe();

    loop {
      if !self.is_current(generation) {
        break;
      }

      // One snapshot per cycle; later updates wait for the next cycle.
      let settings = Arc::clone(&self.settings.borrow());
      Counters::bump(&self.counters.cycles);

      let wait = match self.run_cycle(generation, &settings).await {
        Ok(CycleOutcome::Completed) => {
          let delay = {
            let mut rng = self.rng();
            policy::random_delay(&mut *rng, self.timings.min_delay, self.timings.max_delay)
          };
          self.emit(ActivityEvent::info(format!(
            "Waiting {} minutes before next action",
            delay.as_secs() / 60
          )));
          delay
        }
        Ok(CycleOutcome::PolicySkip) => self.timings.policy_skip,
        Ok(CycleOutcome::Cancelled) => break,
        Err(e) => {
          Counters::bump(&self.counters.cycle_errors);
          warn!(error = %e, "Cycle failed");
          self.emit(ActivityEvent::error(format!("Error during automation: {e}")));
          self.timings.error_backoff
        }
      };

      if !self.is_current(generation) {
        break;
      }
      debug!(wait_ms = wait.as_millis(), "Sleeping until next cycle");
      tokio::select! {
        () = sleep(wait) => {}
        _ = lifecycle.wait_for(|l| !l.is_current(generation)) => break,
      }
    }

    debug!(generation, "Automation loop exited");
  }

  async fn run_cycle(
    &self,
    generation: u64,
    settings: &Settings,
  ) -> Result<CycleOutcome, CycleError> {
    let (network, rules, action) = {
      let enabled = settings.enabled_networks();
      let mut rng = self.rng();
      let &(network, rules) = enabled
        .choose(&mut *rng)
        .ok_or(CycleError::NoEnabledNetworks)?;
      let action = Action::ALL[rng.gen_range(0..Action::ALL.len())];
      (network, rules, action)
    };
    debug!(network = %network, action = %action, "Cycle selected");

    self.emit(ActivityEvent::info(format!(
      "Checking {} network for opportunities...",
      network.display_name()
    )));

    if !self.is_current(generation) {
      return Ok(CycleOutcome::Cancelled);
    }
    let collections = self.marketplace.list_top_collections(network).await?;
    let collection = {
      let mut rng = self.rng();
      collections.choose(&mut *rng).cloned()
    }
    .ok_or(CycleError::NoCollectionsAvailable(network))?;

    self.emit(ActivityEvent::info(format!(
      "Analyzing collection: {}",
      collection.name
    )));

    if !self.is_current(generation) {
      return Ok(CycleOutcome::Cancelled);
    }
    let floor = self
      .marketplace
      .get_floor_price(&collection.slug, network)
      .await?
      .normalize();

    if !policy::is_price_within_limits(floor, rules) {
      Counters::bump(&self.counters.policy_skips);
      self.emit(ActivityEvent::info(format!(
        "Floor price {floor} {} outside limits for collection {}",
        network.native_symbol(),
        collection.name
      )));
      return Ok(CycleOutcome::PolicySkip);
    }

    if !self.is_current(generation) {
      return Ok(CycleOutcome::Cancelled);
    }
    let item = self
      .marketplace
      .get_random_item(&collection.slug, network)
      .await?;

    match action {
      Action::MakeOffer => self.make_offer(generation, network, rules, &item, floor).await,
      Action::Buy => self.buy(generation, network, rules, &item, floor).await,
    }
  }

  async fn make_offer(
    &self,
    generation: u64,
    network: Network,
    rules: &NetworkSettings,
    item: &MarketItem,
    floor: Decimal,
  ) -> Result<CycleOutcome, CycleError> {
    let price = policy::offer_price(floor, rules.max_offer_price)?.normalize();
    let price_wei = to_wei(price)?;
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let expiration = policy::offer_expiration(now);

    self.emit(ActivityEvent::info(format!(
      "Making offer for {} at {price} {}",
      item.name,
      network.native_symbol()
    )));

    if !self.is_current(generation) {
      return Ok(CycleOutcome::Cancelled);
    }
    let receipt = self
      .marketplace
      .submit_offer(network, item, price_wei, expiration)
      .await?;

    Counters::bump(&self.counters.offers);
    info!(
      network = %network,
      token = %item.token_id,
      order = ?receipt.order_id,
      price_wei = %receipt.price_wei,
      "Offer submitted"
    );
    self.emit(ActivityEvent::success(format!(
      "Successfully made offer for {}",
      item.name
    )));
    Ok(CycleOutcome::Completed)
  }

  async fn buy(
    &self,
    generation: u64,
    network: Network,
    rules: &NetworkSettings,
    item: &MarketItem,
    floor: Decimal,
  ) -> Result<CycleOutcome, CycleError> {
    if !policy::is_buy_allowed(floor, rules) {
      Counters::bump(&self.counters.buy_skips);
      self.emit(ActivityEvent::info(format!(
        "Skipping buy of {}: free NFTs are not allowed",
        item.name
      )));
      return Ok(CycleOutcome::Completed);
    }

    let today = Utc::now().date_naive();
    let limit = rules.max_daily_buy_limit;
    if !self.ledger().can_buy(network, limit, today) {
      Counters::bump(&self.counters.buy_skips);
      self.emit(ActivityEvent::info(format!(
        "Daily buy limit of {limit} reached on {}",
        network.display_name()
      )));
      return Ok(CycleOutcome::Completed);
    }

    let price_wei = to_wei(floor)?;
    self.emit(ActivityEvent::info(format!(
      "Attempting to buy {} at {floor} {}",
      item.name,
      network.native_symbol()
    )));

    if !self.is_current(generation) {
      return Ok(CycleOutcome::Cancelled);
    }
    let receipt = self
      .marketplace
      .submit_purchase(network, item, price_wei)
      .await?;

    self.ledger().record_buy(network, today);
    Counters::bump(&self.counters.purchases);
    info!(
      network = %network,
      token = %item.token_id,
      order = ?receipt.order_id,
      price_wei = %receipt.price_wei,
      "Purchase submitted"
    );
    self.emit(ActivityEvent::success(format!(
      "Successfully bought {}",
      item.name
    )));
    Ok(CycleOutcome::Completed)
  }
}
