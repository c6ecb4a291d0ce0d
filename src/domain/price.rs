//! Conversion between display prices and on-chain fixed-point integers.
//!
//! Shop contracts store prices as integers scaled by 10^18. In memory
//! prices are [`Decimal`]s so the conversion is exact in both directions.

use rust_decimal::Decimal;

/// Number of fractional digits of the on-chain representation.
pub const PRICE_DECIMALS: u32 = 18;

/// Error converting a price to or from its fixed-point form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price must not be negative: {0}")]
    Negative(Decimal),
    /// The value does not fit the target representation.
    #[error("price out of range")]
    Overflow,
}

/// Converts a decimal price into its 18-decimal fixed-point integer.
///
/// Digits beyond the 18th fractional place are rounded half-to-even.
///
/// # Errors
///
/// Returns [`PriceError::Negative`] for negative prices and
/// [`PriceError::Overflow`] if the scaled value does not fit in a `u128`.
pub fn to_fixed_point(price: Decimal) -> Result<u128, PriceError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Negative(price));
    }
    let rounded = price.round_dp(PRICE_DECIMALS).normalize();
    let mantissa = u128::try_from(rounded.mantissa()).map_err(|_| PriceError::Overflow)?;
    let shift = PRICE_DECIMALS.saturating_sub(rounded.scale());
    10u128
        .checked_pow(shift)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(PriceError::Overflow)
}

/// Converts an on-chain fixed-point integer back into a decimal price.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the value exceeds the 96-bit
/// mantissa a [`Decimal`] can hold.
pub fn from_fixed_point(raw: u128) -> Result<Decimal, PriceError> {
    let raw = i128::try_from(raw).map_err(|_| PriceError::Overflow)?;
    Decimal::try_from_i128_with_scale(raw, PRICE_DECIMALS)
        .map(|value| value.normalize())
        .map_err(|_| PriceError::Overflow)
}
