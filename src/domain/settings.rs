//! Per-network trading policy.
//!
//! Settings are plain data. They are replaced wholesale (never patched
//! field by field) so a running cycle always sees one coherent snapshot.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::SettingsError;
use super::network::Network;

/// Highest `max_offer_price`: an offer may bid at most twice the floor.
pub const MAX_OFFER_PREMIUM_PCT: Decimal = dec!(100);

/// Trading policy for a single network.
///
/// Prices are whole native units (ETH-equivalent). `max_offer_price`
/// is a signed percentage relative to the floor: `-20` bids 20% below.
/// Decimals are written as JSON numbers; both numbers and strings are
/// accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    /// Whether the engine may pick this network.
    pub enabled: bool,
    /// Lowest floor price the engine will act on.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub min_price: Decimal,
    /// Highest floor price the engine will act on.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub max_price: Decimal,
    /// Purchases allowed per UTC day on this network.
    pub max_daily_buy_limit: u32,
    /// Offer price relative to floor, in percent.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub max_offer_price: Decimal,
    /// Allow buying listings whose floor is zero.
    #[serde(rename = "buyFreeNFTs")]
    pub buy_free_nfts: bool,
}

impl NetworkSettings {
    /// Check the bounds for this network.
    ///
    /// # Errors
    /// Returns the first violated bound.
    pub fn validate(&self, network: Network) -> Result<(), SettingsError> {
        if self.min_price < Decimal::ZERO {
            return Err(SettingsError::MinPriceNegative {
                network,
                min: self.min_price,
            });
        }
        if self.max_price < self.min_price {
            return Err(SettingsError::MaxBelowMin {
                network,
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.max_offer_price <= dec!(-100) || self.max_offer_price > MAX_OFFER_PREMIUM_PCT {
            return Err(SettingsError::OfferPriceOutOfRange {
                network,
                pct: self.max_offer_price,
            });
        }
        Ok(())
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_price: dec!(0.01),
            max_price: dec!(1),
            max_daily_buy_limit: 5,
            max_offer_price: dec!(-20),
            buy_free_nfts: false,
        }
    }
}

/// Full policy: one entry per network.
///
/// A network missing from the map is treated as disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub networks: BTreeMap<Network, NetworkSettings>,
}

impl Settings {
    /// Settings for a network, if configured.
    pub fn network(&self, network: Network) -> Option<&NetworkSettings> {
        self.networks.get(&network)
    }

    /// Enabled networks in stable (declaration) order.
    pub fn enabled_networks(&self) -> Vec<(Network, &NetworkSettings)> {
        self.networks
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(n, s)| (*n, s))
            .collect()
    }

    /// Validate every configured network.
    ///
    /// # Errors
    /// Returns the first network whose bounds are violated.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.networks
            .iter()
            .try_for_each(|(network, s)| s.validate(*network))
    }

    /// Builder-style replacement of one network's settings.
    #[must_use]
    pub fn with_network(mut self, network: Network, settings: NetworkSettings) -> Self {
        self.networks.insert(network, settings);
        self
    }
}

impl Default for Settings {
    /// Ethereum and Polygon enabled; everything else present but off.
    fn default() -> Self {
        let networks = Network::ALL
            .into_iter()
            .map(|n| {
                let enabled = matches!(n, Network::Ethereum | Network::Polygon);
                (n, NetworkSettings::with_enabled(enabled))
            })
            .collect();
        Self { networks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_ethereum_and_polygon() {
        let settings = Settings::default();
        let enabled: Vec<_> = settings
            .enabled_networks()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(enabled, vec![Network::Ethereum, Network::Polygon]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_max_below_min_rejected() {
        let bad = NetworkSettings {
            min_price: dec!(2),
            max_price: dec!(1),
            ..NetworkSettings::default()
        };
        let settings = Settings::default().with_network(Network::Base, bad);
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MaxBelowMin { network: Network::Base, .. })
        ));
    }

    #[test]
    fn test_full_discount_rejected() {
        let bad = NetworkSettings {
            max_offer_price: dec!(-100),
            ..NetworkSettings::default()
        };
        assert!(bad.validate(Network::Ethereum).is_err());
    }

    #[test]
    fn test_offer_premium_upper_bound() {
        let at_bound = NetworkSettings {
            max_offer_price: dec!(100),
            ..NetworkSettings::default()
        };
        assert!(at_bound.validate(Network::Ethereum).is_ok());

        let huge = NetworkSettings {
            max_offer_price: dec!(70000000000000000000000000000),
            ..NetworkSettings::default()
        };
        assert!(matches!(
            huge.validate(Network::Ethereum),
            Err(SettingsError::OfferPriceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_prices_serialize_as_json_numbers() {
        let settings = Settings::default().with_network(
            Network::Bsc,
            NetworkSettings {
                min_price: dec!(0.05),
                max_price: dec!(2.5),
                max_offer_price: dec!(-12.5),
                ..NetworkSettings::default()
            },
        );
        let json = serde_json::to_value(&settings).unwrap();
        let bsc = &json["networks"]["bsc"];
        assert_eq!(bsc["minPrice"], serde_json::json!(0.05));
        assert_eq!(bsc["maxPrice"], serde_json::json!(2.5));
        assert_eq!(bsc["maxOfferPrice"], serde_json::json!(-12.5));
        assert!(json["networks"]["ethereum"]["minPrice"].is_number());

        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_string_prices_still_accepted() {
        let json = r#"{"enabled": true, "minPrice": "0.01", "maxPrice": "1",
            "maxDailyBuyLimit": 5, "maxOfferPrice": "-20", "buyFreeNFTs": false}"#;
        let parsed: NetworkSettings = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.min_price, dec!(0.01));
        assert_eq!(parsed.max_offer_price, dec!(-20));
    }

    #[test]
    fn test_parses_dashboard_json() {
        let json = r#"{
            "networks": {
                "ethereum": {
                    "enabled": true, "minPrice": 0.01, "maxPrice": 1,
                    "maxDailyBuyLimit": 5, "maxOfferPrice": -20, "buyFreeNFTs": false
                },
                "bsc": {
                    "enabled": false, "minPrice": 0.05, "maxPrice": 2.5,
                    "maxDailyBuyLimit": 0, "maxOfferPrice": -10, "buyFreeNFTs": true
                }
            }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        let bsc = settings.network(Network::Bsc).unwrap();
        assert_eq!(bsc.max_price, dec!(2.5));
        assert!(bsc.buy_free_nfts);
        assert!(settings.network(Network::Base).is_none());
        assert_eq!(settings.enabled_networks().len(), 1);
    }
}
