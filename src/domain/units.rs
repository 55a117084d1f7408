//! Whole-unit ↔ wei conversion.
//!
//! Prices are compared in whole native units (`Decimal`) but cross the
//! marketplace boundary as wei (`U256`). The conversion is exact: it
//! never rounds, and refuses amounts that would lose a fractional wei.

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::UnitsError;

/// Decimals of every supported native currency.
pub const NATIVE_DECIMALS: u32 = 18;

/// Convert a whole-unit amount into wei.
///
/// # Errors
/// `Negative` for amounts below zero, `SubWeiPrecision` when more than
/// 18 significant decimal places remain after normalization.
pub fn to_wei(amount: Decimal) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative(amount));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > NATIVE_DECIMALS {
        return Err(UnitsError::SubWeiPrecision(amount));
    }

    let mantissa = normalized.mantissa().unsigned_abs();
    let multiplier = 10u128.pow(NATIVE_DECIMALS - scale);
    Ok(U256::from(mantissa) * U256::from(multiplier))
}

/// Round an amount to wei precision (18 dp, midpoint away from zero).
///
/// Used by the policy layer for derived prices such as discounted
/// offers, so the result is always accepted by [`to_wei`].
pub fn round_to_wei(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(NATIVE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}
