//! Middleware and extractors.

pub mod auth;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_token, set_token};
pub use session::create_session_layer;
