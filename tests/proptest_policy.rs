//! Property-Based Tests - Trading Policy and Unit Conversion
//!
//! Uses `proptest` to check the pricing and timing invariants the
//! engine relies on across random inputs.

use std::time::Duration;

use alloy::primitives::U256;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;

use nft_automation_bot::domain::policy::{
    OFFER_TTL_SECS, is_buy_allowed, is_price_within_limits, offer_expiration, offer_price,
    random_delay,
};
use nft_automation_bot::domain::settings::NetworkSettings;
use nft_automation_bot::domain::units::{round_to_wei, to_wei};

/// Decimal with up to `scale` fractional digits.
fn decimal(max_mantissa: i64, scale: u32) -> impl Strategy<Value = Decimal> {
    (0..=max_mantissa).prop_map(move |m| Decimal::new(m, scale))
}

fn band(min: Decimal, max: Decimal) -> NetworkSettings {
    NetworkSettings {
        enabled: true,
        min_price: min,
        max_price: max,
        ..NetworkSettings::default()
    }
}

// ── Offer pricing ───────────────────────────────────────────

proptest! {
    /// A discount never produces an offer above the floor or below zero.
    #[test]
    fn discounted_offer_stays_within_floor(
        floor in decimal(1_000_000_000, 6),
        pct in -99i64..=0,
    ) {
        let price = offer_price(floor, Decimal::from(pct)).unwrap();
        prop_assert!(price >= Decimal::ZERO, "negative offer {price}");
        prop_assert!(price <= floor, "offer {price} above floor {floor}");
    }

    /// Offer prices are always convertible to wei.
    #[test]
    fn offer_price_is_wei_exact(
        floor in decimal(i64::MAX / 1000, 9),
        pct in -9_999i64..=10_000,
    ) {
        let pct = Decimal::new(pct, 2);
        let price = offer_price(floor, pct).unwrap();
        prop_assert!(to_wei(price).is_ok(), "{price} not convertible");
    }

    /// Any floor and any percentage yield a value or an error, never a panic.
    #[test]
    fn offer_price_never_panics(
        floor_mantissa in any::<i64>().prop_map(i128::from),
        floor_scale in 0u32..28,
        pct_mantissa in any::<i64>(),
    ) {
        let floor = Decimal::from_i128_with_scale(floor_mantissa.abs() * 1_000_000_000, floor_scale);
        let pct = Decimal::new(pct_mantissa, 0);
        let _ = offer_price(floor, pct);
        let _ = offer_price(Decimal::MAX, pct);
    }

    /// Zero discount offers exactly the floor.
    #[test]
    fn zero_discount_is_floor(floor in decimal(1_000_000_000_000, 12)) {
        prop_assert_eq!(offer_price(floor, Decimal::ZERO).unwrap(), floor);
    }
}

// ── Wei conversion ──────────────────────────────────────────

proptest! {
    /// Whole numbers scale by exactly 10^18.
    #[test]
    fn whole_units_scale_by_ten_pow_eighteen(n in 0u64..1_000_000_000) {
        let wei = to_wei(Decimal::from(n)).unwrap();
        prop_assert_eq!(wei, U256::from(n) * U256::from(10u128.pow(18)));
    }

    /// Conversion is monotonic.
    #[test]
    fn to_wei_is_monotonic(
        a in decimal(1_000_000_000_000, 12),
        b in decimal(1_000_000_000_000, 12),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(to_wei(lo).unwrap() <= to_wei(hi).unwrap());
    }

    /// Negative amounts are always rejected.
    #[test]
    fn negative_amounts_rejected(m in 1i64..i64::MAX, scale in 0u32..18) {
        prop_assert!(to_wei(Decimal::new(-m, scale)).is_err());
    }

    /// Rounding to wei is idempotent.
    #[test]
    fn round_to_wei_idempotent(m in 0i64..i64::MAX, scale in 0u32..28) {
        let once = round_to_wei(Decimal::new(m, scale));
        prop_assert_eq!(round_to_wei(once), once);
    }
}

// ── Guards and timing ───────────────────────────────────────

proptest! {
    /// The band check agrees with the inclusive interval definition.
    #[test]
    fn price_band_is_inclusive(
        min in decimal(1_000_000, 4),
        width in decimal(1_000_000, 4),
        floor in decimal(3_000_000, 4),
    ) {
        let max = min + width;
        let within = is_price_within_limits(floor, &band(min, max));
        prop_assert_eq!(within, floor >= min && floor <= max);
        prop_assert!(is_price_within_limits(min, &band(min, max)));
        prop_assert!(is_price_within_limits(max, &band(min, max)));
    }

    /// Positive floors are always buyable; zero only when allowed.
    #[test]
    fn buy_guard(floor in decimal(1_000_000, 6), allow_free in any::<bool>()) {
        let rules = NetworkSettings {
            buy_free_nfts: allow_free,
            ..NetworkSettings::default()
        };
        let allowed = is_buy_allowed(floor, &rules);
        if floor > Decimal::ZERO {
            prop_assert!(allowed);
        } else {
            prop_assert_eq!(allowed, allow_free);
        }
    }

    /// Random delays always land inside the configured window.
    #[test]
    fn random_delay_within_window(
        seed in any::<u64>(),
        min_secs in 0u64..3_600,
        span_secs in 0u64..3_600,
    ) {
        let min = Duration::from_secs(min_secs);
        let max = Duration::from_secs(min_secs + span_secs);
        let mut rng = StdRng::seed_from_u64(seed);
        let delay = random_delay(&mut rng, min, max);
        prop_assert!(delay >= min && delay <= max, "{delay:?} outside [{min:?}, {max:?}]");
    }

    /// Expiration is exactly one TTL ahead.
    #[test]
    fn expiration_is_one_day_ahead(now in 0u64..4_000_000_000) {
        prop_assert_eq!(offer_expiration(now) - now, OFFER_TTL_SECS);
    }
}
