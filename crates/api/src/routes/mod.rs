//! API route definitions.

use axum::Router;
use axum::http::Uri;

use crate::{AppState, error::ApiError};
use lavo_shared::AppError;

pub mod cash;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(health::routes()).merge(cash::routes())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ApiError {
    AppError::NotFound(format!("No route for {}", uri.path())).into()
}
