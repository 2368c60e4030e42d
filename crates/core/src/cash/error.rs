//! Cash error types for validation, state and store failures.
//!
//! Every failure of a cash operation is one of these variants. Validation
//! errors are caller-fixable, `MovementAlreadyClosed` means the client's
//! view of the open ledger is stale, and `ConcurrentModification` asks the
//! caller to retry the whole close.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during cash operations.
#[derive(Debug, Error)]
pub enum CashError {
    // ========== Validation Errors ==========
    /// Movement type is not one of the known types.
    #[error("Invalid movement type: {0:?}")]
    InvalidType(String),

    /// Amount is missing, not a finite number, or not strictly positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Identifier could not be parsed.
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// Close request without a counted amount.
    #[error("Counted amount is required")]
    MissingCountedAmount,

    /// Counted amount is not a finite number.
    #[error("Invalid counted amount: {0}")]
    InvalidCountedAmount(String),

    /// Date filter could not be parsed or is inverted.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// A closure figure would not fit the stored precision.
    #[error("Total out of range: {0}")]
    TotalOutOfRange(String),

    // ========== State Errors ==========
    /// Movement is sealed by a closure and can no longer change.
    #[error("Cash movement {0} is already closed")]
    MovementAlreadyClosed(Uuid),

    // ========== Not Found ==========
    /// Movement not found.
    #[error("Cash movement not found: {0}")]
    MovementNotFound(Uuid),

    /// Closure not found.
    #[error("Cash closure not found: {0}")]
    ClosureNotFound(Uuid),

    // ========== Concurrency Errors ==========
    /// The open ledger changed while a closure was being sealed.
    #[error("Open ledger changed during closure: read {expected} movements, stamped {stamped}")]
    ConcurrentModification {
        /// Movements read in the closure snapshot.
        expected: u64,
        /// Movements actually stamped.
        stamped: u64,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CashError {
    /// Returns the error code sent to API clients.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidType(_) => "invalid_type",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidId(_) => "invalid_id",
            Self::MissingCountedAmount => "missing_counted_amount",
            Self::InvalidCountedAmount(_) => "invalid_counted_amount",
            Self::InvalidDateRange(_) => "invalid_date_range",
            Self::TotalOutOfRange(_) => "total_out_of_range",
            Self::MovementAlreadyClosed(_) => "movement_already_closed",
            Self::MovementNotFound(_) | Self::ClosureNotFound(_) => "not_found",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::Database(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidType(_)
            | Self::InvalidAmount(_)
            | Self::InvalidId(_)
            | Self::MissingCountedAmount
            | Self::InvalidCountedAmount(_)
            | Self::InvalidDateRange(_) => 400,

            // 422 Unprocessable - valid input, unstorable result
            Self::TotalOutOfRange(_) => 422,

            // 404 Not Found
            Self::MovementNotFound(_) | Self::ClosureNotFound(_) => 404,

            // 409 Conflict - stale view or concurrent close
            Self::MovementAlreadyClosed(_) | Self::ConcurrentModification { .. } => 409,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns true if the caller should retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CashError::InvalidType("x".into()).error_code(), "invalid_type");
        assert_eq!(CashError::InvalidAmount("-5".into()).error_code(), "invalid_amount");
        assert_eq!(CashError::InvalidId("7".into()).error_code(), "invalid_id");
        assert_eq!(
            CashError::MissingCountedAmount.error_code(),
            "missing_counted_amount"
        );
        assert_eq!(
            CashError::MovementAlreadyClosed(Uuid::nil()).error_code(),
            "movement_already_closed"
        );
        assert_eq!(CashError::MovementNotFound(Uuid::nil()).error_code(), "not_found");
        assert_eq!(CashError::ClosureNotFound(Uuid::nil()).error_code(), "not_found");
        assert_eq!(
            CashError::TotalOutOfRange(String::new()).error_code(),
            "total_out_of_range"
        );
        assert_eq!(CashError::Database("down".into()).error_code(), "internal_error");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(CashError::InvalidType(String::new()).http_status_code(), 400);
        assert_eq!(
            CashError::InvalidCountedAmount(String::new()).http_status_code(),
            400
        );
        assert_eq!(
            CashError::MovementNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            CashError::MovementAlreadyClosed(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(
            CashError::ConcurrentModification {
                expected: 3,
                stamped: 2
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            CashError::TotalOutOfRange(String::new()).http_status_code(),
            422
        );
        assert_eq!(CashError::Database("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            CashError::ConcurrentModification {
                expected: 1,
                stamped: 0
            }
            .is_retryable()
        );
        assert!(!CashError::MovementAlreadyClosed(Uuid::nil()).is_retryable());
        assert!(!CashError::InvalidAmount(String::new()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            CashError::InvalidType("bogus".into()).to_string(),
            "Invalid movement type: \"bogus\""
        );
        assert_eq!(
            CashError::ConcurrentModification {
                expected: 4,
                stamped: 3
            }
            .to_string(),
            "Open ledger changed during closure: read 4 movements, stamped 3"
        );
    }
}
