/// Currency helpers for escrow arithmetic.
///
/// All monetary values are `BigDecimal` rounded to 2 decimal places so that
/// deposit/final splits stay exact and conservation checks never drift.
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::ToPrimitive;
use std::str::FromStr;

/// Round a monetary value to 2 decimal places, half-up.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Take a fraction (e.g. 0.25) of an amount, rounded to money precision.
pub fn fraction_of(amount: &BigDecimal, fraction: &BigDecimal) -> BigDecimal {
    round_money(&(amount * fraction))
}

/// Take a percentage (0..=100) of an amount, rounded to money precision.
/// Non-finite or out-of-range percentages are rejected rather than folded
/// into a silent zero.
pub fn percentage_of(amount: &BigDecimal, percentage: f64) -> Result<BigDecimal, String> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err("Percentage must be between 0 and 100".to_string());
    }
    let pct = BigDecimal::try_from(percentage).map_err(|_| "Invalid percentage".to_string())?;
    Ok(round_money(&(amount * pct / BigDecimal::from(100))))
}

/// Parse an amount string to money, rejecting negatives.
pub fn parse_amount(amount_str: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(amount_str)
        .map_err(|_| "Invalid amount format".to_string())
        .and_then(|amount| {
            if amount < BigDecimal::from(0) {
                Err("Amount cannot be negative".to_string())
            } else {
                Ok(round_money(&amount))
            }
        })
}

/// Gateways take integer minor units (1 unit = 100 subunits).
pub fn to_minor_units(amount: &BigDecimal) -> i64 {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .unwrap_or(0)
}

pub fn money(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("literal money value")
}
