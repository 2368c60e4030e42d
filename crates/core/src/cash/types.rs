//! Cash domain types.
//!
//! Amounts are unsigned magnitudes at rest; a movement's effect on the
//! drawer balance comes from its [`MovementType`].

use chrono::{DateTime, Utc};
use lavo_shared::types::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CashError;

/// Fractional digits kept for stored amounts (`NUMERIC(19, 4)`).
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive bound on stored magnitudes: `NUMERIC(19, 4)` keeps 15 integer digits.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Returns true if `value` fits an amount column.
#[must_use]
pub fn is_storable(value: Decimal) -> bool {
    value.abs() < AMOUNT_LIMIT
}

/// Kind of cash movement recorded in the drawer ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Cash received for a sale.
    SaleCashIn,
    /// Cash taken out of the drawer.
    Withdrawal,
    /// Cash put into the drawer.
    Deposit,
    /// Cash handed back to a client.
    RefundCashOut,
    /// Opening float.
    Opening,
    /// Documented correction. Always adds to the drawer.
    Correction,
}

impl MovementType {
    /// Every movement type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::SaleCashIn,
        Self::Withdrawal,
        Self::Deposit,
        Self::RefundCashOut,
        Self::Opening,
        Self::Correction,
    ];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SaleCashIn => "sale_cash_in",
            Self::Withdrawal => "withdrawal",
            Self::Deposit => "deposit",
            Self::RefundCashOut => "refund_cash_out",
            Self::Opening => "opening",
            Self::Correction => "correction",
        }
    }

    /// True for movements that take cash out of the drawer.
    #[must_use]
    pub const fn is_outflow(self) -> bool {
        matches!(self, Self::Withdrawal | Self::RefundCashOut)
    }

    /// Signed contribution factor to the drawer balance: `-1` for outflows, `+1` otherwise.
    #[must_use]
    pub fn sign(self) -> Decimal {
        if self.is_outflow() {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = CashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CashError::InvalidType(s.to_string()))
    }
}

/// The part of a movement the reconciliation math needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementLine {
    /// Movement type.
    pub movement_type: MovementType,
    /// Stored magnitude.
    pub amount: Decimal,
}

impl MovementLine {
    /// Creates a movement line.
    #[must_use]
    pub const fn new(movement_type: MovementType, amount: Decimal) -> Self {
        Self {
            movement_type,
            amount,
        }
    }

    /// Contribution to the drawer balance: `sign(type) * |amount|`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.movement_type.sign() * self.amount.abs()
    }
}

/// Unvalidated payload for recording a movement.
///
/// `amount` carries the textual form of whatever the client sent, so the
/// validator can reject non-numeric input with a domain error.
#[derive(Debug, Clone, Default)]
pub struct MovementPayload {
    /// Requested movement type.
    pub movement_type: Option<String>,
    /// Requested amount, as text.
    pub amount: Option<String>,
    /// Optional note.
    pub note: Option<String>,
    /// Staff member who recorded the movement.
    pub person_user_id: Option<UserId>,
    /// Free-text name of the person, for staff without an account.
    pub person: Option<String>,
    /// When the movement happened; defaults to the clock.
    pub movement_at: Option<DateTime<Utc>>,
}

/// Unvalidated partial update of an open movement.
///
/// For the nullable fields the outer `Option` means "field supplied" and
/// the inner one carries the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct MovementPatchPayload {
    /// New movement type.
    pub movement_type: Option<String>,
    /// New amount, as text.
    pub amount: Option<String>,
    /// New note.
    pub note: Option<Option<String>>,
    /// New staff reference.
    pub person_user_id: Option<Option<UserId>>,
    /// New free-text person name.
    pub person: Option<Option<String>>,
}

/// Validated movement ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    /// Movement type.
    pub movement_type: MovementType,
    /// Positive magnitude, rounded to [`AMOUNT_SCALE`].
    pub amount: Decimal,
    /// Trimmed note, `None` when blank.
    pub note: Option<String>,
    /// Staff reference.
    pub person_user_id: Option<UserId>,
    /// Trimmed person name, `None` when blank.
    pub person: Option<String>,
    /// Explicit movement time.
    pub movement_at: Option<DateTime<Utc>>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementPatch {
    /// New movement type.
    pub movement_type: Option<MovementType>,
    /// New positive magnitude.
    pub amount: Option<Decimal>,
    /// New note.
    pub note: Option<Option<String>>,
    /// New staff reference.
    pub person_user_id: Option<Option<UserId>>,
    /// New person name.
    pub person: Option<Option<String>>,
}

impl MovementPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movement_type.is_none()
            && self.amount.is_none()
            && self.note.is_none()
            && self.person_user_id.is_none()
            && self.person.is_none()
    }
}
