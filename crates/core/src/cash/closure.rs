//! Closure planning.
//!
//! Turns the previous closure, the open ledger snapshot and the counted
//! amount into the exact row the sealer will persist. Closures form a chain:
//! the opening amount of closure N is the counted amount of closure N-1,
//! and `closed_at` strictly increases along the chain.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::calculator::{compute, opening_amount};
use super::error::CashError;
use super::types::MovementLine;

/// What the sealer needs to know about the most recent closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousClosure {
    /// Physical count recorded by that closure.
    pub counted_amount: Decimal,
    /// When it was sealed.
    pub closed_at: DateTime<Utc>,
}

/// Fully computed closure, ready to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosurePlan {
    /// Counted amount of the previous closure, or zero.
    pub opening_amount: Decimal,
    /// Opening plus signed movements.
    pub expected_amount: Decimal,
    /// Operator-supplied count.
    pub counted_amount: Decimal,
    /// Rounded discrepancy.
    pub diff: Decimal,
    /// Seal timestamp, strictly after the previous one.
    pub closed_at: DateTime<Utc>,
    /// Number of movements the closure seals.
    pub movements_included: u64,
}

/// Returns a `closed_at` strictly later than `previous`.
///
/// Uses `now` unless the clock lags the last closure, in which case the
/// previous stamp plus one microsecond (the store's resolution) is used.
#[must_use]
pub fn next_closed_at(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Plans the next closure from a consistent snapshot of the ledger.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if the closure figures cannot be stored.
pub fn plan_closure(
    previous: Option<&PreviousClosure>,
    open_movements: &[MovementLine],
    counted_amount: Decimal,
    now: DateTime<Utc>,
) -> Result<ClosurePlan, CashError> {
    let opening = opening_amount(previous.map(|p| p.counted_amount));
    let totals = compute(opening, open_movements, counted_amount)?;

    Ok(ClosurePlan {
        opening_amount: opening,
        expected_amount: totals.expected_amount,
        counted_amount,
        diff: totals.diff,
        closed_at: next_closed_at(previous.map(|p| p.closed_at), now),
        movements_included: open_movements.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash::types::MovementType;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_closure_opens_at_zero() {
        let lines = vec![MovementLine::new(MovementType::Opening, dec!(100))];
        let plan = plan_closure(None, &lines, dec!(100), at(20)).unwrap();

        assert_eq!(plan.opening_amount, Decimal::ZERO);
        assert_eq!(plan.expected_amount, dec!(100));
        assert_eq!(plan.diff, Decimal::ZERO);
        assert_eq!(plan.closed_at, at(20));
        assert_eq!(plan.movements_included, 1);
    }

    #[test]
    fn test_chain_carries_counted_amount() {
        let previous = PreviousClosure {
            counted_amount: dec!(138.50),
            closed_at: at(8),
        };
        let plan = plan_closure(Some(&previous), &[], dec!(140), at(20)).unwrap();

        assert_eq!(plan.opening_amount, dec!(138.50));
        assert_eq!(plan.expected_amount, dec!(138.50));
        assert_eq!(plan.diff, dec!(1.50));
        assert_eq!(plan.movements_included, 0);
    }

    #[test]
    fn test_unstorable_diff_refuses_to_plan() {
        let lines = vec![MovementLine::new(MovementType::Deposit, dec!(1))];
        let counted = Decimal::MIN;

        let result = plan_closure(None, &lines, counted, at(20));
        assert!(matches!(result, Err(CashError::TotalOutOfRange(_))));
    }

    #[test]
    fn test_closed_at_strictly_increases() {
        assert_eq!(next_closed_at(None, at(10)), at(10));
        assert_eq!(next_closed_at(Some(at(9)), at(10)), at(10));
        assert_eq!(
            next_closed_at(Some(at(10)), at(10)),
            at(10) + Duration::microseconds(1)
        );
        assert_eq!(
            next_closed_at(Some(at(11)), at(10)),
            at(11) + Duration::microseconds(1)
        );
    }
}
