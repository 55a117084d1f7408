//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketplaceClient`: Collection data, offers and purchases
//! - `ActivitySink`: Fire-and-forget activity events
//! - `AccountStore`: Wallet secret persistence (save/restore)
//! - `StatusSource` / `AutomationControl`: Engine state and start/stop
//!   for the HTTP endpoints

pub mod account_store;
pub mod activity;
pub mod marketplace;
pub mod status;
