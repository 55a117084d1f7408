//! Engine lifecycle state and the counters reported by `/status`.

use std::fmt;

use serde::Serialize;

use super::network::Network;

/// Exactly one of the two lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
}

impl EngineState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic totals since process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineCounters {
    pub cycles: u64,
    pub offers: u64,
    pub purchases: u64,
    /// Floor outside the configured price band.
    pub policy_skips: u64,
    /// Buy branch declined by the free-NFT guard or the daily limit.
    pub buy_skips: u64,
    pub cycle_errors: u64,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub enabled_networks: Vec<Network>,
    pub counters: EngineCounters,
}

impl EngineStatus {
    pub const fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running)
    }
}
