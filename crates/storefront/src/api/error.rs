//! Bookshop API error type.

use thiserror::Error;

/// Errors from the bookshop REST API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request path could not be joined onto the base URL.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the bearer credential (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status, with the backend's message if it
    /// supplied one.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this error means the credential is invalid or expired.
    ///
    /// Callers treat this as "log the user out", never as something to
    /// retry.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// A single human-readable message for page-scope display.
    ///
    /// Prefers the backend-supplied message and falls back to a
    /// generic string; internals (transport, decode details) are never
    /// shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) | Self::Backend { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            Self::NotFound(_) => "Not found".to_owned(),
            _ => "Something went wrong talking to the bookshop service".to_owned(),
        }
    }
}
