//! Shared fakes for the engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use nft_automation_bot::domain::activity::{ActivityEvent, Severity};
use nft_automation_bot::domain::error::MarketplaceError;
use nft_automation_bot::domain::market::{Collection, MarketItem, OfferReceipt, PurchaseReceipt};
use nft_automation_bot::domain::network::Network;
use nft_automation_bot::domain::settings::{NetworkSettings, Settings};
use nft_automation_bot::ports::activity::ActivitySink;
use nft_automation_bot::ports::marketplace::MarketplaceClient;
use nft_automation_bot::usecases::{AutomationEngine, EngineTimings};

/// One recorded marketplace call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    TopCollections(Network),
    Floor(String),
    RandomItem(String),
    Offer { network: Network, price_wei: U256, expiration: u64 },
    Purchase { network: Network, price_wei: U256 },
}

/// Scriptable in-memory marketplace.
///
/// With a gate, every `list_top_collections` call records itself and
/// then waits for one permit, which lets a test hold a call in flight.
pub struct FakeMarketplace {
    pub floor: Mutex<Decimal>,
    pub collections: Mutex<Vec<Collection>>,
    pub fail_top_collections: AtomicBool,
    pub calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeMarketplace {
    pub fn new(floor: Decimal) -> Self {
        Self {
            floor: Mutex::new(floor),
            collections: Mutex::new(vec![
                collection("alpha", "Alpha"),
                collection("beta", "Beta"),
                collection("gamma", "Gamma"),
            ]),
            fail_top_collections: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(floor: Decimal) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut fake = Self::new(floor);
        fake.gate = Some(Arc::clone(&gate));
        (fake, gate)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn offers(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Offer { .. }))
            .collect()
    }

    pub fn purchases(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Purchase { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MarketplaceClient for FakeMarketplace {
    async fn list_top_collections(
        &self,
        network: Network,
    ) -> Result<Vec<Collection>, MarketplaceError> {
        self.record(Call::TopCollections(network));
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail_top_collections.load(Ordering::SeqCst) {
            return Err(MarketplaceError::Transport("connection reset".into()));
        }
        Ok(self.collections.lock().unwrap().clone())
    }

    async fn get_floor_price(
        &self,
        collection_slug: &str,
        _network: Network,
    ) -> Result<Decimal, MarketplaceError> {
        self.record(Call::Floor(collection_slug.to_string()));
        Ok(*self.floor.lock().unwrap())
    }

    async fn get_random_item(
        &self,
        collection_slug: &str,
        _network: Network,
    ) -> Result<MarketItem, MarketplaceError> {
        self.record(Call::RandomItem(collection_slug.to_string()));
        Ok(MarketItem {
            contract_address: "0x00000000000000000000000000000000000000aa".into(),
            token_id: "7".into(),
            name: format!("{collection_slug} #7"),
        })
    }

    async fn submit_offer(
        &self,
        network: Network,
        _item: &MarketItem,
        price_wei: U256,
        expiration_unix: u64,
    ) -> Result<OfferReceipt, MarketplaceError> {
        self.record(Call::Offer {
            network,
            price_wei,
            expiration: expiration_unix,
        });
        Ok(OfferReceipt {
            order_id: Some("0xoffer".into()),
            price_wei,
            expiration: expiration_unix,
            submitted_at: Utc::now(),
        })
    }

    async fn submit_purchase(
        &self,
        network: Network,
        _item: &MarketItem,
        price_wei: U256,
    ) -> Result<PurchaseReceipt, MarketplaceError> {
        self.record(Call::Purchase { network, price_wei });
        Ok(PurchaseReceipt {
            order_id: Some("0xbuy".into()),
            price_wei,
            submitted_at: Utc::now(),
        })
    }
}

/// Sink that keeps every event in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|e| e.message.contains(needle))
    }
}

impl ActivitySink for RecordingSink {
    fn notify(&self, event: ActivityEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn collection(slug: &str, name: &str) -> Collection {
    Collection {
        slug: slug.to_string(),
        name: name.to_string(),
    }
}

/// Settings with only `network` enabled.
pub fn single_network(network: Network, rules: NetworkSettings) -> Settings {
    let mut settings = Settings::default();
    for entry in settings.networks.values_mut() {
        entry.enabled = false;
    }
    settings.with_network(
        network,
        NetworkSettings {
            enabled: true,
            ..rules
        },
    )
}

pub fn build_engine<M: MarketplaceClient>(
    marketplace: Arc<M>,
    settings: Settings,
    seed: u64,
) -> (AutomationEngine<M, RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let engine = AutomationEngine::new(
        marketplace,
        sink.clone(),
        settings,
        EngineTimings::default(),
        StdRng::seed_from_u64(seed),
    );
    (engine, sink)
}
