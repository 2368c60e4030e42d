//! Fixed-point money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Cash amounts are `rust_decimal::Decimal` from the wire to the store.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits reported for reconciliation figures.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to [`MONEY_SCALE`] places, half away from zero.
///
/// `-1.505` becomes `-1.51` and `2.345` becomes `2.35`.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses a decimal from its textual form.
///
/// Accepts plain notation (`"12.50"`, `"-5"`) and the scientific notation
/// JSON serializers may emit for numbers (`"1e3"`, `"2.5E-1"`). Returns
/// `None` for anything that is not a finite decimal, including `NaN`
/// and `inf`.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}
