//! Application-wide error types.

use thiserror::Error;

/// Application error types that are not tied to a single domain module.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request (unreadable body, wrong content type).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code sent to API clients.
    ///
    /// Server-side failures share `internal_error`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Configuration(_) | Self::Internal(_) => "internal_error",
        }
    }
}
