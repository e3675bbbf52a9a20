//! Authentication route handlers.
//!
//! Login exchanges credentials for a bearer token at the bookshop API
//! and stores it in the session, then confirms it with a profile
//! fetch. Registration never logs the user in; it lands on the login
//! page with a success note. Logout tears the whole session down,
//! cart included.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bitshelf_core::Email;

use crate::filters;
use crate::middleware::auth;
use crate::models::BearerToken;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Per-field validation messages for the registration form.
#[derive(Debug, Default)]
pub struct RegisterErrors {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterErrors {
    fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Query parameters carried to the login page (e.g. after register).
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub username: String,
    pub email: String,
    pub errors: RegisterErrors,
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    let notice = query
        .registered
        .map(|_| "Account created. Sign in to continue.".to_string());

    LoginTemplate {
        email: String::new(),
        error: None,
        notice,
    }
}

/// Handle a login attempt.
///
/// Bad credentials and backend failures re-render the form with a
/// message; nothing is stored in the session until the token has been
/// confirmed by a profile fetch.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();

    if let Err(e) = Email::parse(email) {
        return LoginTemplate {
            email: email.to_owned(),
            error: Some(format!("Email: {e}")),
            notice: None,
        }
        .into_response();
    }
    if form.password.is_empty() {
        return LoginTemplate {
            email: email.to_owned(),
            error: Some("Password is required".to_string()),
            notice: None,
        }
        .into_response();
    }

    let token = match state.api().login(email, &form.password).await {
        Ok(data) => BearerToken::new(data.access_token),
        Err(e) => {
            tracing::warn!("login rejected: {e}");
            return LoginTemplate {
                email: email.to_owned(),
                error: Some(e.user_message()),
                notice: None,
            }
            .into_response();
        }
    };

    // A token the backend won't honor for a profile fetch is useless;
    // treat it the same as bad credentials.
    if let Err(e) = state.api().me(token.as_str()).await {
        tracing::warn!("post-login profile fetch failed: {e}");
        return LoginTemplate {
            email: email.to_owned(),
            error: Some(e.user_message()),
            notice: None,
        }
        .into_response();
    }

    if let Err(e) = auth::set_token(&session, &token).await {
        tracing::error!("failed to store token in session: {e}");
        return LoginTemplate {
            email: email.to_owned(),
            error: Some("Could not start a session, try again".to_string()),
            notice: None,
        }
        .into_response();
    }

    Redirect::to("/books").into_response()
}

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        username: String::new(),
        email: String::new(),
        errors: RegisterErrors::default(),
        error: None,
    }
}

fn validate_register(form: &RegisterForm) -> RegisterErrors {
    let mut errors = RegisterErrors::default();

    if form.username.trim().is_empty() {
        errors.username = Some("Username is required".to_string());
    }
    if let Err(e) = Email::parse(form.email.trim()) {
        errors.email = Some(e.to_string());
    }
    if form.password.len() < 6 {
        errors.password = Some("Password must be at least 6 characters".to_string());
    }

    errors
}

/// Handle a registration attempt.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let errors = validate_register(&form);
    if !errors.is_empty() {
        return RegisterTemplate {
            username: form.username,
            email: form.email,
            errors,
            error: None,
        }
        .into_response();
    }

    match state
        .api()
        .register(form.username.trim(), form.email.trim(), &form.password)
        .await
    {
        Ok(()) => Redirect::to("/auth/login?registered=1").into_response(),
        Err(e) => {
            tracing::warn!("registration rejected: {e}");
            RegisterTemplate {
                username: form.username,
                email: form.email,
                errors: RegisterErrors::default(),
                error: Some(e.user_message()),
            }
            .into_response()
        }
    }
}

/// Log out: drop the session (token and cart both) and return to the
/// login page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    auth::invalidate(&session).await
}
