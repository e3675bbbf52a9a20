//! Authentication middleware and extractors.
//!
//! Authenticated state is simply "a bearer token is present in the
//! session". The token is not validated here; pages that call the
//! API learn about an expired token via a 401 and route it through
//! [`invalidate`], which clears the whole session and sends the user
//! back to the login page.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::models::{BearerToken, session_keys};

/// Extractor that requires a logged-in session.
///
/// If no token is stored, page requests are redirected to the login
/// page and fragment requests get a plain 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(token): RequireAuth,
/// ) -> impl IntoResponse {
///     // token.as_str() authorizes API calls
/// }
/// ```
pub struct RequireAuth(pub BearerToken);

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Session is placed in extensions by SessionManagerLayer.
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let token: BearerToken = session
            .get(session_keys::TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                let is_fragment = parts
                    .headers
                    .get("HX-Request")
                    .is_some_and(|v| v == "true");
                if is_fragment {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(token))
    }
}

/// Extractor that optionally reads the bearer token.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<BearerToken>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<BearerToken>(session_keys::TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(token))
    }
}

/// Store the bearer token in the session after a successful login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_token(
    session: &Session,
    token: &BearerToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::TOKEN, token).await
}

/// Remove the bearer token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<BearerToken>(session_keys::TOKEN).await?;
    Ok(())
}

/// Tear down the session entirely and send the user to the login
/// page. Used on logout and whenever the backend rejects the stored
/// credential - the session flush guarantees the cart and any other
/// per-user state goes with it on logout's full-navigation semantics.
pub async fn invalidate(session: &Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("failed to flush session: {e}");
    }
    Redirect::to("/auth/login").into_response()
}

/// Route an API error from a page handler: a 401 invalidates the
/// credential and redirects to login, anything else becomes a
/// page-scope message for the caller to render.
///
/// # Errors
///
/// The `Err` variant carries the ready-made redirect response.
pub async fn recover(session: &Session, err: ApiError) -> Result<String, Response> {
    if err.is_unauthorized() {
        tracing::warn!("stored credential rejected by backend, logging out");
        if let Err(e) = clear_token(session).await {
            tracing::error!("failed to clear token: {e}");
        }
        return Err(Redirect::to("/auth/login").into_response());
    }
    Ok(err.user_message())
}
