//! OpenSea Marketplace - `MarketplaceClient` Port Implementation
//!
//! Translates the five port operations into OpenSea v2 REST calls.
//! No trading policy lives here: prices arrive already decided by the
//! engine, in wei.

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::auth::MarketplaceSession;
use super::client::MarketplaceHttp;
use super::types::{
    CollectionStatsResponse, FulfillmentPayload, NATIVE_PAYMENT_TOKEN, NftsResponse, OfferPayload,
    OrderResponse, SignedRequest, TopCollectionsResponse,
};
use crate::domain::error::MarketplaceError;
use crate::domain::market::{Collection, MarketItem, OfferReceipt, PurchaseReceipt};
use crate::domain::network::Network;
use crate::ports::marketplace::MarketplaceClient;

/// Every order is for a single token.
const ORDER_QUANTITY: u32 = 1;

/// Chain identifier used in OpenSea URLs and payloads.
pub const fn chain_id(network: Network) -> &'static str {
    match network {
        Network::Ethereum => "ethereum",
        Network::Bsc => "bsc",
        Network::Polygon => "matic",
        Network::Arbitrum => "arbitrum",
        Network::Base => "base",
    }
}

/// OpenSea-backed marketplace client.
pub struct OpenSeaMarketplace {
    http: MarketplaceHttp,
    session: MarketplaceSession,
    page_limit: u32,
}

impl OpenSeaMarketplace {
    pub fn new(http: MarketplaceHttp, session: MarketplaceSession, page_limit: u32) -> Self {
        Self {
            http,
            session,
            page_limit: page_limit.max(1),
        }
    }

    pub const fn session(&self) -> &MarketplaceSession {
        &self.session
    }

    /// Sign the canonical JSON of `payload` and wrap it for submission.
    async fn sign<T: Serialize>(&self, payload: T) -> Result<SignedRequest<T>, MarketplaceError> {
        let canonical = serde_json::to_vec(&payload)
            .map_err(|e| MarketplaceError::Transport(format!("payload encoding failed: {e}")))?;
        let signed = self.session.sign_payload(&canonical).await?;
        Ok(SignedRequest {
            payload,
            signature: signed.signature,
        })
    }

    fn signer_address(&self) -> Result<String, MarketplaceError> {
        self.session
            .address()
            .map(|a| a.to_string())
            .ok_or(MarketplaceError::SigningUnavailable)
    }
}

#[async_trait]
impl MarketplaceClient for OpenSeaMarketplace {
    #[instrument(skip(self), fields(network = %network))]
    async fn list_top_collections(
        &self,
        network: Network,
    ) -> Result<Vec<Collection>, MarketplaceError> {
        let response: TopCollectionsResponse = self
            .http
            .get_json(
                &["collections", "top"],
                &[
                    ("chain", chain_id(network).to_string()),
                    ("limit", self.page_limit.to_string()),
                ],
            )
            .await?;

        let collections: Vec<Collection> = response
            .collections
            .into_iter()
            .filter(|c| !c.collection.trim().is_empty())
            .map(Collection::from)
            .collect();
        debug!(count = collections.len(), "Fetched top collections");
        Ok(collections)
    }

    #[instrument(skip(self), fields(network = %network))]
    async fn get_floor_price(
        &self,
        collection_slug: &str,
        network: Network,
    ) -> Result<Decimal, MarketplaceError> {
        let stats: CollectionStatsResponse = self
            .http
            .get_json(&["collection", collection_slug, "stats"], &[])
            .await?;

        let floor = stats
            .floor_price()
            .ok_or_else(|| MarketplaceError::NotFound(format!("floor price for {collection_slug}")))?;
        if floor.is_sign_negative() && !floor.is_zero() {
            return Err(MarketplaceError::Transport(format!(
                "negative floor price {floor} for {collection_slug}"
            )));
        }
        Ok(floor)
    }

    #[instrument(skip(self), fields(network = %network))]
    async fn get_random_item(
        &self,
        collection_slug: &str,
        network: Network,
    ) -> Result<MarketItem, MarketplaceError> {
        let response: NftsResponse = self
            .http
            .get_json(
                &["collection", collection_slug, "nfts"],
                &[
                    ("chain", chain_id(network).to_string()),
                    ("limit", self.page_limit.to_string()),
                ],
            )
            .await?;

        response
            .nfts
            .choose(&mut rand::thread_rng())
            .cloned()
            .map(MarketItem::from)
            .ok_or_else(|| MarketplaceError::NoItemsAvailable(collection_slug.to_string()))
    }

    #[instrument(skip(self, item), fields(network = %network, token = %item.token_id))]
    async fn submit_offer(
        &self,
        network: Network,
        item: &MarketItem,
        price_wei: U256,
        expiration_unix: u64,
    ) -> Result<OfferReceipt, MarketplaceError> {
        let payload = OfferPayload {
            chain: chain_id(network).to_string(),
            offerer: self.signer_address()?,
            contract: item.contract_address.clone(),
            token_id: item.token_id.clone(),
            quantity: ORDER_QUANTITY,
            payment_token: NATIVE_PAYMENT_TOKEN.to_string(),
            price: price_wei.to_string(),
            expiration_time: expiration_unix,
        };
        let request = self.sign(payload).await?;
        let response: OrderResponse = self.http.post_json(&["offers"], &request).await?;

        info!(order = ?response.order_hash, price_wei = %price_wei, "Offer accepted");
        Ok(OfferReceipt {
            order_id: response.order_hash,
            price_wei,
            expiration: expiration_unix,
            submitted_at: Utc::now(),
        })
    }

    #[instrument(skip(self, item), fields(network = %network, token = %item.token_id))]
    async fn submit_purchase(
        &self,
        network: Network,
        item: &MarketItem,
        price_wei: U256,
    ) -> Result<PurchaseReceipt, MarketplaceError> {
        let payload = FulfillmentPayload {
            chain: chain_id(network).to_string(),
            fulfiller: self.signer_address()?,
            contract: item.contract_address.clone(),
            token_id: item.token_id.clone(),
            quantity: ORDER_QUANTITY,
            payment_token: NATIVE_PAYMENT_TOKEN.to_string(),
            price: price_wei.to_string(),
        };
        let request = self.sign(payload).await?;
        let response: OrderResponse = self.http.post_json(&["fulfillments"], &request).await?;

        info!(order = ?response.order_hash, price_wei = %price_wei, "Purchase accepted");
        Ok(PurchaseReceipt {
            order_id: response.order_hash,
            price_wei,
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::opensea::client::HttpClientConfig;

    fn unsigned_marketplace() -> OpenSeaMarketplace {
        let http = MarketplaceHttp::new("key".into(), HttpClientConfig::default()).unwrap();
        OpenSeaMarketplace::new(http, MarketplaceSession::new("key", None), 50)
    }

    fn item() -> MarketItem {
        MarketItem {
            contract_address: "0xabc".into(),
            token_id: "1".into(),
            name: "Test #1".into(),
        }
    }

    #[test]
    fn test_chain_ids() {
        assert_eq!(chain_id(Network::Ethereum), "ethereum");
        assert_eq!(chain_id(Network::Polygon), "matic");
        assert_eq!(chain_id(Network::Base), "base");
    }

    #[tokio::test]
    async fn test_offer_without_signer_fails_before_any_request() {
        let m = unsigned_marketplace();
        let err = m
            .submit_offer(Network::Ethereum, &item(), U256::from(1u8), 0)
            .await
            .unwrap_err();
        assert_eq!(err, MarketplaceError::SigningUnavailable);
    }

    #[tokio::test]
    async fn test_purchase_without_signer_fails_before_any_request() {
        let m = unsigned_marketplace();
        let err = m
            .submit_purchase(Network::Polygon, &item(), U256::from(1u8))
            .await
            .unwrap_err();
        assert_eq!(err, MarketplaceError::SigningUnavailable);
    }
}
