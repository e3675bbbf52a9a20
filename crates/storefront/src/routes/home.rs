//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{IntoResponse, Redirect, Response};

use crate::filters;
use crate::middleware::auth::OptionalAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate;

/// Display the home page, or jump straight to the catalog for a
/// signed-in session.
pub async fn home(OptionalAuth(token): OptionalAuth) -> Response {
    if token.is_some() {
        return Redirect::to("/books").into_response();
    }

    HomeTemplate.into_response()
}
