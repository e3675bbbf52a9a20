//! Session-stored types and keys.

use serde::{Deserialize, Serialize};

/// The opaque bearer credential issued by `POST /auth/login`.
///
/// Its presence in the session *is* the authenticated state: a
/// request with a token is treated as logged in even before any
/// profile fetch has confirmed the token, matching the storefront's
/// original behavior. An invalid token surfaces as a 401 on the next
/// API call and is cleared at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Session keys.
pub mod keys {
    /// Key for the bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the serialized cart.
    pub const CART: &str = "cart";
}
