//! Expected-vs-counted reconciliation.
//!
//! `expected = opening + Σ sign(type) * |amount|` and
//! `diff = round2(counted - expected)`. The diff is advisory: a non-zero
//! discrepancy never blocks a closure.

use std::collections::BTreeMap;

use lavo_shared::types::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CashError;
use super::types::{MovementLine, MovementType, is_storable};

/// Result of reconciling a batch of movements against a physical count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureTotals {
    /// Opening amount plus the signed sum of the movements.
    pub expected_amount: Decimal,
    /// `counted - expected`, rounded to two places.
    pub diff: Decimal,
}

/// Per-type subtotal of the open ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotal {
    /// Movement type.
    pub movement_type: MovementType,
    /// Number of movements of this type.
    pub count: u64,
    /// Sum of magnitudes (unsigned).
    pub total: Decimal,
}

/// Preview of what the next closure will expect, without sealing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Counted amount of the last closure, or zero.
    pub opening_amount: Decimal,
    /// Expected drawer content right now.
    pub expected_amount: Decimal,
    /// Number of open movements.
    pub movement_count: u64,
    /// Sum of inflows.
    pub cash_in: Decimal,
    /// Sum of outflows, as a positive magnitude.
    pub cash_out: Decimal,
    /// Subtotals by type, only for types present.
    pub by_type: Vec<TypeTotal>,
}

/// Opening amount of the next closure: the last closure's count, or zero for the first one.
#[must_use]
pub fn opening_amount(last_counted: Option<Decimal>) -> Decimal {
    last_counted.unwrap_or(Decimal::ZERO)
}

/// Sum of signed contributions of `lines`.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if the sum overflows.
pub fn signed_total(lines: &[MovementLine]) -> Result<Decimal, CashError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        acc.checked_add(line.signed_amount())
            .ok_or_else(|| out_of_range("signed total", acc))
    })
}

/// Expected drawer content after applying `lines` to `opening`.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if the result cannot be stored.
pub fn expected_amount(opening: Decimal, lines: &[MovementLine]) -> Result<Decimal, CashError> {
    let expected = opening
        .checked_add(signed_total(lines)?)
        .ok_or_else(|| out_of_range("expected amount", opening))?;
    storable("expected amount", expected)
}

/// Reconciles the complete open ledger against the counted amount.
///
/// `lines` must be every open movement; a partial batch would make the
/// closure lie about the drawer.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if the expected amount or the diff cannot be stored.
pub fn compute(
    opening: Decimal,
    lines: &[MovementLine],
    counted: Decimal,
) -> Result<ClosureTotals, CashError> {
    let expected_amount = expected_amount(opening, lines)?;
    let diff = counted
        .checked_sub(expected_amount)
        .ok_or_else(|| out_of_range("diff", counted))?;

    Ok(ClosureTotals {
        expected_amount,
        diff: storable("diff", round_money(diff))?,
    })
}

/// Summarizes the open ledger for the register screen.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if a subtotal overflows.
pub fn summarize(opening: Decimal, lines: &[MovementLine]) -> Result<LedgerSummary, CashError> {
    let mut by_type: BTreeMap<MovementType, TypeTotal> = BTreeMap::new();
    let mut cash_in = Decimal::ZERO;
    let mut cash_out = Decimal::ZERO;

    for line in lines {
        let magnitude = line.amount.abs();
        let bucket = if line.movement_type.is_outflow() {
            &mut cash_out
        } else {
            &mut cash_in
        };
        *bucket = bucket
            .checked_add(magnitude)
            .ok_or_else(|| out_of_range("cash flow", magnitude))?;

        let entry = by_type
            .entry(line.movement_type)
            .or_insert_with(|| TypeTotal {
                movement_type: line.movement_type,
                count: 0,
                total: Decimal::ZERO,
            });
        entry.count += 1;
        entry.total = entry
            .total
            .checked_add(magnitude)
            .ok_or_else(|| out_of_range("type subtotal", magnitude))?;
    }

    Ok(LedgerSummary {
        opening_amount: opening,
        expected_amount: expected_amount(opening, lines)?,
        movement_count: lines.len() as u64,
        cash_in,
        cash_out,
        by_type: by_type.into_values().collect(),
    })
}

fn storable(what: &str, value: Decimal) -> Result<Decimal, CashError> {
    if is_storable(value) {
        Ok(value)
    } else {
        Err(out_of_range(what, value))
    }
}

fn out_of_range(what: &str, near: Decimal) -> CashError {
    CashError::TotalOutOfRange(format!("{what} overflows near {near}"))
}
