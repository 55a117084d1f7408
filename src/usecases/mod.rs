//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bot's core workflows.
//!
//! Use cases:
//! - `AutomationEngine`: Start/stop lifecycle and the offer/buy loop
//! - `DailyBuyLedger`: Per-network daily purchase limits
//! - `signing_session`: Selects the wallet key the marketplace signs with

pub mod automation_engine;
pub mod buy_limits;
pub mod signing_session;

pub use automation_engine::{AutomationEngine, EngineTimings};
pub use buy_limits::DailyBuyLedger;
