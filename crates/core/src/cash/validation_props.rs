//! Property-based tests for movement validation rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::CashError;
use super::types::{MovementPatchPayload, MovementPayload, MovementType};
use super::validation::{admit_patch, validate_new, validate_patch};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a zero or negative amount.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop::sample::select(MovementType::ALL.to_vec())
}

fn payload(movement_type: &str, amount: Decimal) -> MovementPayload {
    MovementPayload {
        movement_type: Some(movement_type.to_string()),
        amount: Some(amount.to_string()),
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Positive amounts of every known type are accepted and stored as-is.
    #[test]
    fn prop_positive_amounts_accepted(
        movement_type in movement_type_strategy(),
        amount in positive_amount(),
    ) {
        let movement = validate_new(&payload(movement_type.as_str(), amount)).unwrap();
        prop_assert_eq!(movement.movement_type, movement_type);
        prop_assert_eq!(movement.amount, amount);
        prop_assert!(movement.amount > Decimal::ZERO);
    }

    /// Zero and negative amounts are rejected before normalization.
    #[test]
    fn prop_non_positive_amounts_rejected(
        movement_type in movement_type_strategy(),
        amount in non_positive_amount(),
    ) {
        let result = validate_new(&payload(movement_type.as_str(), amount));
        prop_assert!(
            matches!(result, Err(CashError::InvalidAmount(_))),
            "{} should be rejected, got: {:?}",
            amount,
            result
        );
    }

    /// Any string outside the six wire names is an invalid type.
    #[test]
    fn prop_unknown_types_rejected(
        raw in "[a-z_]{0,20}",
        amount in positive_amount(),
    ) {
        prop_assume!(MovementType::ALL.iter().all(|t| t.as_str() != raw));
        let result = validate_new(&payload(&raw, amount));
        prop_assert!(matches!(result, Err(CashError::InvalidType(_))));
    }

    /// A sealed movement rejects every patch, while an open one admits exactly what was validated.
    #[test]
    fn prop_closed_movement_rejects_any_patch(
        set_type in any::<bool>(),
        set_amount in any::<bool>(),
        set_note in any::<bool>(),
        movement_type in movement_type_strategy(),
        amount in positive_amount(),
    ) {
        let payload = MovementPatchPayload {
            movement_type: set_type.then(|| movement_type.as_str().to_string()),
            amount: set_amount.then(|| amount.to_string()),
            note: set_note.then(|| Some("edited".to_string())),
            ..Default::default()
        };
        let patch = validate_patch(&payload).unwrap();
        prop_assert_eq!(patch.movement_type, set_type.then_some(movement_type));
        prop_assert_eq!(patch.amount, set_amount.then_some(amount));

        let movement_id = Uuid::new_v4();
        let sealed = admit_patch(movement_id, Some(Uuid::new_v4()), patch.clone());
        prop_assert!(
            matches!(sealed, Err(CashError::MovementAlreadyClosed(id)) if id == movement_id)
        );

        let open = admit_patch(movement_id, None, patch.clone()).unwrap();
        if set_type || set_amount || set_note {
            prop_assert_eq!(open, Some(patch));
        } else {
            prop_assert_eq!(open, None);
        }
    }
}
