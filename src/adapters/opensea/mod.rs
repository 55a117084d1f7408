//! OpenSea Marketplace Adapter
//!
//! - `client`: rate-limited HTTP client with retries
//! - `auth`: API key and EIP-191 payload signing
//! - `types`: request/response DTOs
//! - `marketplace`: the `MarketplaceClient` implementation

pub mod auth;
pub mod client;
pub mod marketplace;
pub mod types;

pub use auth::MarketplaceSession;
pub use client::{HttpClientConfig, MarketplaceHttp};
pub use marketplace::OpenSeaMarketplace;
