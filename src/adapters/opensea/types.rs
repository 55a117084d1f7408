//! Marketplace API Request/Response Types
//!
//! Serialization types for the OpenSea v2 REST API. Responses are
//! parsed leniently: unknown fields are ignored and the few fields the
//! bot needs are optional where the API is known to omit them.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::{Collection, MarketItem};

/// Native-currency payment token (the zero address).
pub const NATIVE_PAYMENT_TOKEN: &str = "0x0000000000000000000000000000000000000000";

/// `GET /collections/top` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TopCollectionsResponse {
  #[serde(default)]
  pub collections: Vec<CollectionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDto {
  /// Collection slug.
  #[serde(alias = "slug")]
  pub collection: String,
  /// Display name, when the collection has one.
  #[serde(default)]
  pub name: Option<String>,
}

impl From<CollectionDto> for Collection {
  fn from(dto: CollectionDto) -> Self {
    let name = dto
      .name
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| dto.collection.clone());
    Self {
      slug: dto.collection,
      name,
    }
  }
}

/// `GET /collection/{slug}/stats` response.
///
/// The floor is reported under `total` in current API versions and
/// under `stats` in older ones.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionStatsResponse {
  #[serde(default)]
  pub stats: Option<StatsDto>,
  #[serde(default)]
  pub total: Option<StatsDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsDto {
  #[serde(default)]
  pub floor_price: Option<serde_json::Value>,
}

impl CollectionStatsResponse {
  /// Floor price in whole native units, if reported.
  pub fn floor_price(&self) -> Option<Decimal> {
    [self.stats.as_ref(), self.total.as_ref()]
      .into_iter()
      .flatten()
      .filter_map(|s| s.floor_price.as_ref())
      .find_map(parse_price)
  }
}

/// Parse a JSON number or numeric string into a `Decimal`.
///
/// Accepts plain and scientific notation (`"1e-7"`). Non-numeric
/// values yield `None`.
pub fn parse_price(value: &serde_json::Value) -> Option<Decimal> {
  let text = match value {
    serde_json::Value::Number(n) => n.to_string(),
    serde_json::Value::String(s) => s.trim().to_string(),
    _ => return None,
  };
  Decimal::from_str(&text)
    .or_else(|_| Decimal::from_scientific(&text))
    .ok()
}

/// `GET /collection/{slug}/nfts` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NftsResponse {
  #[serde(default)]
  pub nfts: Vec<NftDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NftDto {
  /// Token id, as a decimal string.
  #[serde(alias = "token_id", alias = "tokenId")]
  pub identifier: String,
  /// Contract address.
  #[serde(alias = "contract_address")]
  pub contract: String,
  #[serde(default)]
  pub name: Option<String>,
}

impl From<NftDto> for MarketItem {
  fn from(dto: NftDto) -> Self {
    let name = dto
      .name
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| format!("#{}", dto.identifier));
    Self {
      contract_address: dto.contract,
      token_id: dto.identifier,
      name,
    }
  }
}

/// Unsigned offer body. Signed as canonical JSON, then sent wrapped in
/// [`SignedRequest`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
  pub chain: String,
  pub offerer: String,
  pub contract: String,
  pub token_id: String,
  pub quantity: u32,
  pub payment_token: String,
  /// Price in wei, decimal string.
  pub price: String,
  /// Unix seconds.
  pub expiration_time: u64,
}

/// Unsigned fulfillment (purchase) body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentPayload {
  pub chain: String,
  pub fulfiller: String,
  pub contract: String,
  pub token_id: String,
  pub quantity: u32,
  pub payment_token: String,
  /// Price in wei, decimal string.
  pub price: String,
}

/// Payload plus detached signature.
#[derive(Debug, Clone, Serialize)]
pub struct SignedRequest<T: Serialize> {
  #[serde(flatten)]
  pub payload: T,
  pub signature: String,
}

/// Response to an offer or fulfillment submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderResponse {
  #[serde(default, alias = "orderHash", alias = "id")]
  pub order_hash: Option<String>,
}
