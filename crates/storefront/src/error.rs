//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors
//! to Sentry before responding. Route handlers that cannot render a
//! page-scope message return `Result<T, AppError>`; expected API
//! failures (bad credentials, stale token, rejected checkout) are
//! handled at the call site instead and never reach this type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bookshop API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An expired credential falls back to the login redirect even
        // when a handler propagated it with `?` instead of handling
        // it explicitly.
        if let Self::Api(api_err) = &self
            && api_err.is_unauthorized()
        {
            return Redirect::to("/auth/login").into_response();
        }

        // Capture backend failures to Sentry
        if matches!(self, Self::Api(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let (status, message) = match &self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => {
                (StatusCode::NOT_FOUND, "Not found")
            }
            Self::Api(_) => (StatusCode::BAD_GATEWAY, "External service error"),
        };

        (status, message).into_response()
    }
}
