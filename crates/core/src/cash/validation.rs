//! Movement and closure input validation.
//!
//! Validation is pure: it never touches the store. The amount rules check
//! the value the client supplied before it is reduced to a magnitude, so a
//! negative amount is rejected rather than silently flipped.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lavo_shared::types::parse_decimal;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::error::CashError;
use super::types::{
    AMOUNT_LIMIT, AMOUNT_SCALE, MovementPatch, MovementPatchPayload, MovementPayload, MovementType,
    NewMovement, is_storable,
};

/// Which end of a date range a bound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// Lower bound; a bare date means the start of that day.
    From,
    /// Upper bound; a bare date means the last instant of that day.
    To,
}

/// Validates a payload for a new movement.
///
/// # Errors
///
/// - `InvalidType` if the type is missing or unknown
/// - `InvalidAmount` if the amount is missing, not finite, not > 0, or
///   has more than 15 integer digits
pub fn validate_new(payload: &MovementPayload) -> Result<NewMovement, CashError> {
    let movement_type = parse_type(payload.movement_type.as_deref())?;
    let amount = parse_amount(payload.amount.as_deref())?;

    Ok(NewMovement {
        movement_type,
        amount,
        note: normalize_text(payload.note.as_deref()),
        person_user_id: payload.person_user_id,
        person: normalize_text(payload.person.as_deref()),
        movement_at: payload.movement_at,
    })
}

/// Validates a partial update. Only supplied fields are checked.
///
/// # Errors
///
/// Same rules as [`validate_new`] for the fields present.
pub fn validate_patch(payload: &MovementPatchPayload) -> Result<MovementPatch, CashError> {
    let movement_type = payload
        .movement_type
        .as_deref()
        .map(|raw| parse_type(Some(raw)))
        .transpose()?;
    let amount = payload
        .amount
        .as_deref()
        .map(|raw| parse_amount(Some(raw)))
        .transpose()?;

    Ok(MovementPatch {
        movement_type,
        amount,
        note: payload.note.as_ref().map(|n| normalize_text(n.as_deref())),
        person_user_id: payload.person_user_id,
        person: payload.person.as_ref().map(|p| normalize_text(p.as_deref())),
    })
}

/// Rejects any mutation of a movement already sealed by a closure.
///
/// # Errors
///
/// Returns `MovementAlreadyClosed` when `closure_id` is set.
pub fn ensure_open(movement_id: Uuid, closure_id: Option<Uuid>) -> Result<(), CashError> {
    match closure_id {
        Some(_) => Err(CashError::MovementAlreadyClosed(movement_id)),
        None => Ok(()),
    }
}

/// Decides what an edit of a movement may write.
///
/// A sealed movement rejects every patch, including an empty one. For an
/// open movement, `None` means there is nothing to write.
///
/// # Errors
///
/// Returns `MovementAlreadyClosed` when `closure_id` is set.
pub fn admit_patch(
    movement_id: Uuid,
    closure_id: Option<Uuid>,
    patch: MovementPatch,
) -> Result<Option<MovementPatch>, CashError> {
    ensure_open(movement_id, closure_id)?;
    Ok((!patch.is_empty()).then_some(patch))
}

/// Validates the physically counted amount of a close request.
///
/// Any finite decimal the store can hold is accepted, including zero and
/// negative values.
///
/// # Errors
///
/// - `MissingCountedAmount` if absent
/// - `InvalidCountedAmount` if not a finite number or out of range
pub fn validate_counted_amount(raw: Option<&str>) -> Result<Decimal, CashError> {
    let raw = raw.ok_or(CashError::MissingCountedAmount)?;
    let counted = parse_decimal(raw)
        .ok_or_else(|| CashError::InvalidCountedAmount(format!("{raw:?} is not a number")))?;

    let counted = round_amount(counted);
    if !is_storable(counted) {
        return Err(CashError::InvalidCountedAmount(format!(
            "{counted} must be below {AMOUNT_LIMIT} in magnitude"
        )));
    }

    Ok(counted)
}

/// Parses a date filter bound: RFC 3339 timestamp or `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns `InvalidDateRange` if the value matches neither format.
pub fn parse_range_bound(raw: &str, bound: RangeBound) -> Result<DateTime<Utc>, CashError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CashError::InvalidDateRange(format!("{raw:?} is not a date")))?;
    let time = match bound {
        RangeBound::From => NaiveTime::MIN,
        RangeBound::To => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| CashError::InvalidDateRange("end of day".to_string()))?,
    };

    Ok(date.and_time(time).and_utc())
}

/// Checks that an inclusive range is not inverted.
///
/// # Errors
///
/// Returns `InvalidDateRange` if `from` is after `to`.
pub fn validate_date_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(), CashError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(CashError::InvalidDateRange(format!(
            "from {from} is after to {to}"
        ))),
        _ => Ok(()),
    }
}

fn parse_type(raw: Option<&str>) -> Result<MovementType, CashError> {
    raw.ok_or_else(|| CashError::InvalidType(String::new()))?
        .parse()
}

fn parse_amount(raw: Option<&str>) -> Result<Decimal, CashError> {
    let raw = raw.ok_or_else(|| CashError::InvalidAmount("amount is required".to_string()))?;
    let value = parse_decimal(raw)
        .ok_or_else(|| CashError::InvalidAmount(format!("{raw:?} is not a number")))?;

    if value <= Decimal::ZERO {
        return Err(CashError::InvalidAmount(format!(
            "{value} must be greater than zero"
        )));
    }

    let magnitude = round_amount(value.abs());
    if magnitude.is_zero() {
        return Err(CashError::InvalidAmount(format!(
            "{value} is below the smallest storable amount"
        )));
    }
    if !is_storable(magnitude) {
        return Err(CashError::InvalidAmount(format!(
            "{value} must be below {AMOUNT_LIMIT}"
        )));
    }

    Ok(magnitude)
}

fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn normalize_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavo_shared::types::UserId;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn payload(movement_type: &str, amount: &str) -> MovementPayload {
        MovementPayload {
            movement_type: Some(movement_type.to_string()),
            amount: Some(amount.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_movement() {
        let person = UserId::new();
        let input = MovementPayload {
            note: Some("  float for the day  ".to_string()),
            person_user_id: Some(person),
            person: Some("   ".to_string()),
            ..payload("opening", "100.00")
        };

        let movement = validate_new(&input).unwrap();
        assert_eq!(movement.movement_type, MovementType::Opening);
        assert_eq!(movement.amount, dec!(100.00));
        assert_eq!(movement.note.as_deref(), Some("float for the day"));
        assert_eq!(movement.person_user_id, Some(person));
        assert_eq!(movement.person, None);
    }

    #[test]
    fn test_bogus_type_rejected() {
        let result = validate_new(&payload("bogus", "10"));
        assert!(matches!(result, Err(CashError::InvalidType(t)) if t == "bogus"));
    }

    #[test]
    fn test_missing_type_rejected() {
        let input = MovementPayload {
            amount: Some("10".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_new(&input), Err(CashError::InvalidType(_))));
    }

    #[test]
    fn test_type_checked_before_amount() {
        let result = validate_new(&payload("bogus", "-5"));
        assert!(matches!(result, Err(CashError::InvalidType(_))));
    }

    #[rstest]
    #[case("-5")]
    #[case("0")]
    #[case("0.00")]
    #[case("NaN")]
    #[case("inf")]
    #[case("ten")]
    #[case("true")]
    #[case("")]
    #[case("0.00001")]
    fn test_invalid_amount_rejected(#[case] amount: &str) {
        let result = validate_new(&payload("deposit", amount));
        assert!(
            matches!(result, Err(CashError::InvalidAmount(_))),
            "{amount:?} should be rejected, got {result:?}"
        );
    }

    #[test]
    fn test_missing_amount_rejected() {
        let input = MovementPayload {
            movement_type: Some("deposit".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_new(&input), Err(CashError::InvalidAmount(_))));
    }

    #[rstest]
    #[case("50", dec!(50))]
    #[case("12.345678", dec!(12.3457))]
    #[case("1e2", dec!(100))]
    #[case("0.0001", dec!(0.0001))]
    fn test_amount_normalized(#[case] amount: &str, #[case] expected: Decimal) {
        let movement = validate_new(&payload("sale_cash_in", amount)).unwrap();
        assert_eq!(movement.amount, expected);
    }

    #[rstest]
    #[case("999999999999999.9999", Some(dec!(999999999999999.9999)))]
    #[case("999999999999999.99995", None)]
    #[case("1e15", None)]
    #[case("1e20", None)]
    #[case("79228162514264337593543950335", None)]
    fn test_amount_must_fit_storage(#[case] amount: &str, #[case] expected: Option<Decimal>) {
        let result = validate_new(&payload("deposit", amount));
        match expected {
            Some(value) => assert_eq!(result.unwrap().amount, value),
            None => assert!(
                matches!(result, Err(CashError::InvalidAmount(_))),
                "{amount:?} should be rejected, got {result:?}"
            ),
        }
    }

    #[test]
    fn test_patch_only_validates_supplied_fields() {
        let patch = validate_patch(&MovementPatchPayload {
            note: Some(Some("recount".to_string())),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.note, Some(Some("recount".to_string())));
        assert!(patch.movement_type.is_none());
        assert!(patch.amount.is_none());
    }

    #[test]
    fn test_patch_rejects_bad_fields() {
        let bad_type = MovementPatchPayload {
            movement_type: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_patch(&bad_type), Err(CashError::InvalidType(_))));

        let bad_amount = MovementPatchPayload {
            amount: Some("-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_patch(&bad_amount),
            Err(CashError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_patch_clears_note() {
        let patch = validate_patch(&MovementPatchPayload {
            note: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.note, Some(None));
    }

    #[test]
    fn test_ensure_open() {
        let id = Uuid::new_v4();
        assert!(ensure_open(id, None).is_ok());
        assert!(matches!(
            ensure_open(id, Some(Uuid::new_v4())),
            Err(CashError::MovementAlreadyClosed(m)) if m == id
        ));
    }

    #[test]
    fn test_admit_patch() {
        let id = Uuid::new_v4();
        let patch = MovementPatch {
            note: Some(Some("recount".to_string())),
            ..Default::default()
        };

        assert_eq!(admit_patch(id, None, patch.clone()).unwrap(), Some(patch.clone()));
        assert_eq!(admit_patch(id, None, MovementPatch::default()).unwrap(), None);
        assert!(matches!(
            admit_patch(id, Some(Uuid::new_v4()), MovementPatch::default()),
            Err(CashError::MovementAlreadyClosed(m)) if m == id
        ));
        assert!(matches!(
            admit_patch(id, Some(Uuid::new_v4()), patch),
            Err(CashError::MovementAlreadyClosed(_))
        ));
    }

    #[test]
    fn test_counted_amount() {
        assert!(matches!(
            validate_counted_amount(None),
            Err(CashError::MissingCountedAmount)
        ));
        assert!(matches!(
            validate_counted_amount(Some("lots")),
            Err(CashError::InvalidCountedAmount(_))
        ));
        assert_eq!(validate_counted_amount(Some("138.50")).unwrap(), dec!(138.50));
        assert_eq!(validate_counted_amount(Some("0")).unwrap(), Decimal::ZERO);
        assert_eq!(validate_counted_amount(Some("-3")).unwrap(), dec!(-3));
    }

    #[rstest]
    #[case("-999999999999999.9999", Some(dec!(-999999999999999.9999)))]
    #[case("999999999999999.9999", Some(dec!(999999999999999.9999)))]
    #[case("1e15", None)]
    #[case("-1e20", None)]
    #[case("-79228162514264337593543950335", None)]
    fn test_counted_amount_must_fit_storage(
        #[case] raw: &str,
        #[case] expected: Option<Decimal>,
    ) {
        let result = validate_counted_amount(Some(raw));
        match expected {
            Some(value) => assert_eq!(result.unwrap(), value),
            None => assert!(
                matches!(result, Err(CashError::InvalidCountedAmount(_))),
                "{raw:?} should be rejected, got {result:?}"
            ),
        }
    }

    #[test]
    fn test_range_bounds() {
        let from = parse_range_bound("2026-03-01", RangeBound::From).unwrap();
        assert_eq!(from.to_rfc3339(), "2026-03-01T00:00:00+00:00");

        let to = parse_range_bound("2026-03-01", RangeBound::To).unwrap();
        assert_eq!(to.to_rfc3339(), "2026-03-01T23:59:59.999999+00:00");

        let ts = parse_range_bound("2026-03-01T10:00:00+02:00", RangeBound::From).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T08:00:00+00:00");

        assert!(matches!(
            parse_range_bound("yesterday", RangeBound::From),
            Err(CashError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let from = parse_range_bound("2026-03-02", RangeBound::From).unwrap();
        let to = parse_range_bound("2026-03-01", RangeBound::To).unwrap();
        assert!(validate_date_range(Some(from), Some(to)).is_err());
        assert!(validate_date_range(Some(to), None).is_ok());
        assert!(validate_date_range(None, None).is_ok());
    }
}
