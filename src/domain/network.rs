//! Supported networks.
//!
//! The set is closed: settings, the marketplace adapter and the
//! engine all key off this enum, never off free-form strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::UnknownNetwork;

/// A blockchain network the bot can trade on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Polygon,
    Arbitrum,
    Base,
}

impl Network {
    /// Every supported network, in display order.
    pub const ALL: [Self; 5] = [
        Self::Ethereum,
        Self::Bsc,
        Self::Polygon,
        Self::Arbitrum,
        Self::Base,
    ];

    /// Identifier used by the marketplace API (`chain` query parameter).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Base => "base",
        }
    }

    /// Human-readable name for activity messages.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Bsc => "BSC",
            Self::Polygon => "Polygon",
            Self::Arbitrum => "Arbitrum",
            Self::Base => "Base",
        }
    }

    /// Native currency symbol that floor prices are quoted in.
    pub const fn native_symbol(self) -> &'static str {
        match self {
            Self::Ethereum | Self::Arbitrum | Self::Base => "ETH",
            Self::Bsc => "BNB",
            Self::Polygon => "POL",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownNetwork(s.to_string()))
    }
}
