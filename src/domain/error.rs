//! Error taxonomy for the automation core.
//!
//! Configuration, data-availability and transport failures inside a
//! cycle are all recoverable: the engine turns each of them into one
//! error event plus a backoff. Only `EngineError` escapes to callers,
//! and only at the `start`/`update_settings` boundary.

use rust_decimal::Decimal;
use thiserror::Error;

use super::network::Network;

/// A network identifier outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network '{0}'")]
pub struct UnknownNetwork(pub String);

/// Settings that violate the per-network bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{network}: minPrice must be >= 0, got {min}")]
    MinPriceNegative { network: Network, min: Decimal },

    #[error("{network}: maxPrice {max} is below minPrice {min}")]
    MaxBelowMin {
        network: Network,
        min: Decimal,
        max: Decimal,
    },

    #[error("{network}: maxOfferPrice must be above -100% and at most 100%, got {pct}%")]
    OfferPriceOutOfRange { network: Network, pct: Decimal },
}

/// Failures converting whole-unit amounts to wei.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount {0} is negative")]
    Negative(Decimal),

    #[error("amount {0} has a fractional wei component")]
    SubWeiPrecision(Decimal),

    #[error("price arithmetic overflowed")]
    Overflow,
}

/// Errors surfaced by a marketplace client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no items available in collection {0}")]
    NoItemsAvailable(String),

    #[error("no signing identity attached to the marketplace session")]
    SigningUnavailable,
}

/// Recoverable failures raised while running one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("no networks enabled")]
    NoEnabledNetworks,

    #[error("no collections available on {0}")]
    NoCollectionsAvailable(Network),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// Errors returned to callers of the engine's public API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("automation is already running")]
    AlreadyRunning,

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}
