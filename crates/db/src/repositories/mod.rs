//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod cash;
pub mod user;

pub use cash::{
    CASH_CLOSURE_LOCK_KEY, CashRepository, ClosureFilter, ClosureResult, ClosureWithMovements,
    MovementWithStaff, OpenLedgerSummary,
};
pub use user::{CreateStaffInput, StaffSummary, UserRepository};
