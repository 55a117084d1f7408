//! Domain layer - Settings model, policy and core types.
//!
//! Pure data and pure functions only (hexagonal architecture inner
//! ring). Nothing in here performs I/O; the engine feeds it snapshots
//! and random sources explicitly.

pub mod activity;
pub mod error;
pub mod market;
pub mod network;
pub mod policy;
pub mod settings;
pub mod status;
pub mod units;

// Re-export core types for convenience
pub use activity::{ActivityEvent, Severity};
pub use error::{CycleError, EngineError, MarketplaceError, SettingsError, UnitsError};
pub use market::{Collection, MarketItem, OfferReceipt, PurchaseReceipt};
pub use network::Network;
pub use policy::Action;
pub use settings::{NetworkSettings, Settings};
pub use status::{EngineCounters, EngineState, EngineStatus};
