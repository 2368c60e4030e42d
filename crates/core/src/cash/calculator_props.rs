//! Property-based tests for reconciliation and closure chaining.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::{compute, expected_amount, signed_total, summarize};
use super::closure::{PreviousClosure, plan_closure};
use super::types::{MovementLine, MovementType};

/// Strategy to generate a valid positive amount (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for any amount, counted amounts may be negative in theory.
fn any_amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop::sample::select(MovementType::ALL.to_vec())
}

fn lines_strategy(max_len: usize) -> impl Strategy<Value = Vec<MovementLine>> {
    prop::collection::vec(
        (movement_type_strategy(), positive_amount())
            .prop_map(|(t, amount)| MovementLine::new(t, amount)),
        0..=max_len,
    )
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The signed sum computed independently equals expected minus opening.
    #[test]
    fn prop_expected_minus_opening_is_signed_sum(
        opening in any_amount(),
        lines in lines_strategy(30),
        counted in any_amount(),
    ) {
        let external: Decimal = lines
            .iter()
            .map(|l| if l.movement_type.is_outflow() { -l.amount } else { l.amount })
            .sum();

        let totals = compute(opening, &lines, counted).unwrap();
        prop_assert_eq!(totals.expected_amount - opening, external);
        prop_assert_eq!(signed_total(&lines).unwrap(), external);
    }

    /// Recomputing with identical inputs yields the identical diff.
    #[test]
    fn prop_diff_is_deterministic(
        opening in any_amount(),
        lines in lines_strategy(20),
        counted in any_amount(),
    ) {
        let first = compute(opening, &lines, counted).unwrap();
        let second = compute(opening, &lines, counted).unwrap();
        prop_assert_eq!(first, second);
    }

    /// The diff never carries more than two decimal places and stays within half a cent.
    #[test]
    fn prop_diff_is_rounded_to_cents(
        opening in any_amount(),
        lines in lines_strategy(20),
        counted in any_amount(),
    ) {
        let totals = compute(opening, &lines, counted).unwrap();
        prop_assert!(totals.diff.scale() <= 2);

        let exact = counted - totals.expected_amount;
        prop_assert!((totals.diff - exact).abs() <= Decimal::new(5, 3));
    }

    /// Sum order does not matter.
    #[test]
    fn prop_order_independent(
        opening in any_amount(),
        lines in lines_strategy(20),
    ) {
        let mut reversed = lines.clone();
        reversed.reverse();
        prop_assert_eq!(
            expected_amount(opening, &lines).unwrap(),
            expected_amount(opening, &reversed).unwrap()
        );
    }

    /// The open-ledger preview agrees with the closure math.
    #[test]
    fn prop_summary_matches_compute(
        opening in any_amount(),
        lines in lines_strategy(30),
    ) {
        let summary = summarize(opening, &lines).unwrap();
        prop_assert_eq!(summary.expected_amount, expected_amount(opening, &lines).unwrap());
        prop_assert_eq!(summary.movement_count as usize, lines.len());

        let per_type_count: u64 = summary.by_type.iter().map(|t| t.count).sum();
        prop_assert_eq!(per_type_count as usize, lines.len());
    }

    /// A chain of closures keeps opening[n] == counted[n-1] and strictly increasing stamps.
    #[test]
    fn prop_closure_chain(
        batches in prop::collection::vec((lines_strategy(5), any_amount(), -5i64..5i64), 1..10),
    ) {
        let mut previous: Option<PreviousClosure> = None;

        for (lines, counted, clock_skew_secs) in batches {
            let now = base_time() + Duration::seconds(clock_skew_secs);
            let plan = plan_closure(previous.as_ref(), &lines, counted, now).unwrap();

            match previous {
                Some(prev) => {
                    prop_assert_eq!(plan.opening_amount, prev.counted_amount);
                    prop_assert!(plan.closed_at > prev.closed_at);
                }
                None => {
                    prop_assert_eq!(plan.opening_amount, Decimal::ZERO);
                }
            }
            prop_assert_eq!(plan.movements_included as usize, lines.len());

            previous = Some(PreviousClosure {
                counted_amount: plan.counted_amount,
                closed_at: plan.closed_at,
            });
        }
    }

    /// Two closures in a row with nothing in between: expected[1] == counted[0].
    #[test]
    fn prop_back_to_back_closures(
        lines in lines_strategy(10),
        counted_first in any_amount(),
        counted_second in any_amount(),
    ) {
        let first = plan_closure(None, &lines, counted_first, base_time()).unwrap();
        let previous = PreviousClosure {
            counted_amount: first.counted_amount,
            closed_at: first.closed_at,
        };
        let second = plan_closure(Some(&previous), &[], counted_second, base_time()).unwrap();

        prop_assert_eq!(second.opening_amount, counted_first);
        prop_assert_eq!(second.expected_amount, counted_first);
        prop_assert_eq!(second.movements_included, 0);
    }
}
