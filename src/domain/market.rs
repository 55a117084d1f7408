//! Marketplace entities exchanged with the marketplace port.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A collection returned by the top-collections listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Marketplace identifier used in collection URLs.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// A single listed NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    pub contract_address: String,
    pub token_id: String,
    pub name: String,
}

/// Acknowledgement for a submitted offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferReceipt {
    /// Marketplace order hash, when the API returns one.
    pub order_id: Option<String>,
    pub price_wei: U256,
    /// Unix seconds.
    pub expiration: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement for a submitted purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub order_id: Option<String>,
    pub price_wei: U256,
    pub submitted_at: DateTime<Utc>,
}
