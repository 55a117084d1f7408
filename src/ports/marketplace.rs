//! Marketplace Port - NFT Marketplace Interface
//!
//! The five operations the automation engine needs from a
//! marketplace. Implementations are thin: they translate calls and
//! normalize results, but carry no trading policy.
//!
//! All amounts crossing this boundary are wei (`U256`), except the
//! floor price, which is returned in whole native units so the engine
//! can compare it against settings without converting.

use alloy::primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::error::MarketplaceError;
use crate::domain::market::{Collection, MarketItem, OfferReceipt, PurchaseReceipt};
use crate::domain::network::Network;

/// Trait for marketplace providers.
///
/// A signing identity is attached at construction; submissions fail
/// with `SigningUnavailable` when none was provided.
#[async_trait]
pub trait MarketplaceClient: Send + Sync + 'static {
  /// Top collections on a network. Ordering is not meaningful.
  async fn list_top_collections(
    &self,
    network: Network,
  ) -> Result<Vec<Collection>, MarketplaceError>;

  /// Floor price of a collection in whole native units.
  ///
  /// # Errors
  /// `NotFound` if the collection has no price data.
  async fn get_floor_price(
    &self,
    collection_slug: &str,
    network: Network,
  ) -> Result<Decimal, MarketplaceError>;

  /// A random listed item from a collection.
  ///
  /// # Errors
  /// `NoItemsAvailable` if the collection is empty.
  async fn get_random_item(
    &self,
    collection_slug: &str,
    network: Network,
  ) -> Result<MarketItem, MarketplaceError>;

  /// Submit an offer for one item, expiring at `expiration_unix`.
  async fn submit_offer(
    &self,
    network: Network,
    item: &MarketItem,
    price_wei: U256,
    expiration_unix: u64,
  ) -> Result<OfferReceipt, MarketplaceError>;

  /// Submit a purchase of one item at `price_wei`.
  async fn submit_purchase(
    &self,
    network: Network,
    item: &MarketItem,
    price_wei: U256,
  ) -> Result<PurchaseReceipt, MarketplaceError>;
}
