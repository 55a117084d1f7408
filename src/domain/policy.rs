//! Trading policy helpers.
//!
//! Pure functions evaluated by the automation engine once per cycle.
//! Nothing here touches the network, the clock or a random source
//! except through arguments.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::UnitsError;
use super::settings::NetworkSettings;
use super::units::round_to_wei;

/// Offers expire 24 hours after submission.
pub const OFFER_TTL_SECS: u64 = 24 * 60 * 60;

/// What a cycle attempts once a collection passes the price check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bid below (or at) the floor for a random item.
    MakeOffer,
    /// Purchase a random item at the floor.
    Buy,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::MakeOffer, Self::Buy];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MakeOffer => f.write_str("offer"),
            Self::Buy => f.write_str("buy"),
        }
    }
}

/// Inclusive `[min_price, max_price]` check on the floor.
pub fn is_price_within_limits(floor: Decimal, settings: &NetworkSettings) -> bool {
    floor >= settings.min_price && floor <= settings.max_price
}

/// `floor × (1 + pct/100)`, rounded to wei precision.
///
/// `pct` is usually negative: `-20` on a floor of 10 yields 8.
///
/// # Errors
/// `Overflow` when the product leaves the `Decimal` range.
pub fn offer_price(floor: Decimal, pct: Decimal) -> Result<Decimal, UnitsError> {
    pct.checked_div(dec!(100))
        .and_then(|ratio| Decimal::ONE.checked_add(ratio))
        .and_then(|factor| floor.checked_mul(factor))
        .map(round_to_wei)
        .ok_or(UnitsError::Overflow)
}

/// Buys require a non-zero floor unless free NFTs are explicitly allowed.
pub fn is_buy_allowed(floor: Decimal, settings: &NetworkSettings) -> bool {
    settings.buy_free_nfts || floor > Decimal::ZERO
}

/// Uniformly random duration in `[min, max]` at millisecond resolution.
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let lo = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let hi = u64::try_from(max.as_millis()).unwrap_or(u64::MAX).max(lo);
    Duration::from_millis(rng.gen_range(lo..=hi))
}

/// Absolute expiration for an offer submitted at `now_unix`.
pub const fn offer_expiration(now_unix: u64) -> u64 {
    now_unix + OFFER_TTL_SECS
}
