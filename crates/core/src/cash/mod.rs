//! Cash drawer bookkeeping.
//!
//! This module implements the cash register core:
//! - Movement types and their sign in the drawer balance
//! - Validation of movement payloads and counted amounts
//! - Expected-vs-counted reconciliation
//! - Closure planning (opening amount, chain ordering)
//! - Error types for cash operations

pub mod calculator;
pub mod closure;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod calculator_props;
#[cfg(test)]
mod validation_props;

pub use calculator::{ClosureTotals, LedgerSummary, TypeTotal};
pub use closure::{ClosurePlan, PreviousClosure, next_closed_at, plan_closure};
pub use error::CashError;
pub use types::{
    AMOUNT_LIMIT, AMOUNT_SCALE, MovementLine, MovementPatch, MovementPatchPayload, MovementPayload,
    MovementType, NewMovement,
};
pub use validation::{
    admit_patch, ensure_open, validate_counted_amount, validate_new, validate_patch,
};
