//! Bookshop REST API client.
//!
//! Wraps `reqwest` for the remote backend that owns every piece of
//! durable state: accounts, books, genres, and orders. The storefront
//! talks to nothing else.
//!
//! Two conventions are enforced here so they never leak into route
//! handlers:
//!
//! - The bearer credential is attached in exactly one place.
//! - The backend's inconsistent response envelopes (`{data: T}`,
//!   bare `T`, and `{genres: [...]}` for the genre list) are
//!   normalized by [`from_envelope`] / [`genre_list`] at this
//!   boundary, never guessed at call sites.
//!
//! The genre list is slow-changing reference data and is cached with
//! `moka` (5-minute TTL). Nothing here retries: every failure is
//! surfaced once to the caller.

mod error;
pub mod types;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use bitshelf_core::{BookId, GenreId, TransactionId};

use types::{
    Book, BookInput, BookPage, CreateOrderRequest, Genre, LoginData, OrderCreated, Profile,
    Statistics, Transaction,
};

/// Backend page size used while accumulating the full result set.
/// Large on purpose, to minimize round trips.
pub const BACKEND_PAGE_LIMIT: u32 = 100;

const GENRE_CACHE_KEY: &str = "genres";
const GENRE_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the bookshop REST API.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    genres: moka::future::Cache<String, Vec<Genre>>,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let genres = moka::future::Cache::builder()
            .max_capacity(1)
            .time_to_live(GENRE_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                genres,
            }),
        }
    }

    /// Execute one request and return the parsed JSON body.
    ///
    /// Status handling happens here: 401 becomes
    /// [`ApiError::Unauthorized`] (callers treat it as an invalid
    /// credential), 404 becomes [`ApiError::NotFound`], any other
    /// non-success becomes [`ApiError::Backend`] with the backend's
    /// message extracted from the body when possible.
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;

        let mut request = self.inner.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(extract_message(&text)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(extract_message(&text)));
        }
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "bookshop API returned non-success status"
            );
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: extract_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in and obtain a bearer token.
    ///
    /// # Errors
    ///
    /// Returns the backend's error untouched on bad credentials; the
    /// caller decides how to present it.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self
            .request(Method::POST, "/auth/login", None, &[], Some(body))
            .await?;
        from_envelope(value)
    }

    /// Register a new account. No auto-login; the caller sends the
    /// user to the login page afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        self.request(Method::POST, "/auth/register", None, &[], Some(body))
            .await?;
        Ok(())
    }

    /// Fetch the profile behind a bearer token.
    ///
    /// # Errors
    ///
    /// A 401 here means the stored credential is invalid or expired;
    /// callers clear it and treat the session as unauthenticated.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &str) -> Result<Profile, ApiError> {
        let value = self
            .request(Method::GET, "/auth/me", Some(token), &[], None)
            .await?;
        from_envelope(value)
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Fetch one backend page of books.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the catalog pipeline
    /// aborts its accumulation loop on the first failure.
    #[instrument(skip(self, token))]
    pub async fn list_books(&self, token: &str, query: &BookListQuery) -> Result<BookPage, ApiError> {
        let value = self
            .request(Method::GET, "/books", Some(token), &query.params(), None)
            .await?;
        book_page(value)
    }

    /// Fetch a single book by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    #[instrument(skip(self, token))]
    pub async fn get_book(&self, token: &str, id: &BookId) -> Result<Book, ApiError> {
        let value = self
            .request(Method::GET, &format!("/books/{id}"), Some(token), &[], None)
            .await?;
        from_envelope(value)
    }

    /// Create a book listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the payload.
    #[instrument(skip(self, token, input))]
    pub async fn create_book(&self, token: &str, input: &BookInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(input)?;
        self.request(Method::POST, "/books", Some(token), &[], Some(body))
            .await?;
        Ok(())
    }

    /// Update a book listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the payload.
    #[instrument(skip(self, token, input))]
    pub async fn update_book(
        &self,
        token: &str,
        id: &BookId,
        input: &BookInput,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(input)?;
        self.request(
            Method::PATCH,
            &format!("/books/{id}"),
            Some(token),
            &[],
            Some(body),
        )
        .await?;
        Ok(())
    }

    /// Delete a book listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion is rejected.
    #[instrument(skip(self, token))]
    pub async fn delete_book(&self, token: &str, id: &BookId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/books/{id}"),
            Some(token),
            &[],
            None,
        )
        .await?;
        Ok(())
    }

    /// Fetch the genre list (cached for 5 minutes).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and no cached value is
    /// available.
    #[instrument(skip(self, token))]
    pub async fn genres(&self, token: &str) -> Result<Vec<Genre>, ApiError> {
        if let Some(cached) = self.inner.genres.get(GENRE_CACHE_KEY).await {
            debug!("cache hit for genres");
            return Ok(cached);
        }

        let value = self
            .request(Method::GET, "/genre", Some(token), &[], None)
            .await?;
        let genres = genre_list(value)?;

        self.inner
            .genres
            .insert(GENRE_CACHE_KEY.to_owned(), genres.clone())
            .await;

        Ok(genres)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order for the given cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is rejected; the caller leaves
    /// the cart intact in that case.
    #[instrument(skip(self, token, order), fields(lines = order.items.len()))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &CreateOrderRequest,
    ) -> Result<OrderCreated, ApiError> {
        let body = serde_json::to_value(order)?;
        let value = self
            .request(Method::POST, "/transactions", Some(token), &[], Some(body))
            .await?;
        from_envelope(value)
    }

    /// Fetch the caller's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &str) -> Result<Vec<Transaction>, ApiError> {
        let value = self
            .request(Method::GET, "/transactions", Some(token), &[], None)
            .await?;
        from_envelope(value)
    }

    /// Fetch one order by transaction ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    #[instrument(skip(self, token))]
    pub async fn get_order(&self, token: &str, id: &TransactionId) -> Result<Transaction, ApiError> {
        let value = self
            .request(
                Method::GET,
                &format!("/transactions/{id}"),
                Some(token),
                &[],
                None,
            )
            .await?;
        from_envelope(value)
    }

    /// Fetch sales statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn statistics(&self, token: &str) -> Result<Statistics, ApiError> {
        let value = self
            .request(
                Method::GET,
                "/transactions/statistics",
                Some(token),
                &[],
                None,
            )
            .await?;
        from_envelope(value)
    }
}

// =============================================================================
// Query building
// =============================================================================

/// Query parameters for one `GET /books` call.
#[derive(Debug, Clone, Default)]
pub struct BookListQuery {
    pub search: String,
    pub genre_id: Option<GenreId>,
    pub condition: Option<String>,
    /// Backend sort expression, e.g. `"title asc"`. Omitted entirely
    /// for publication-year sorting, which happens client-side.
    pub sort: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl BookListQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("search", self.search.clone()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(genre_id) = &self.genre_id {
            params.push(("genre_id", genre_id.to_string()));
        }
        if let Some(condition) = &self.condition {
            params.push(("condition", condition.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }
}

// =============================================================================
// Envelope normalization
// =============================================================================

/// Unwrap the backend's response envelope into the expected type.
///
/// Handles both known shapes: `{data: T}` and bare `T`. This is the
/// only place envelope shapes are interpreted.
fn from_envelope<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let inner = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(inner)?)
}

/// Normalize the genre list, which arrives as a bare array,
/// `{genres: [...]}`, or `{data: [...]}` depending on backend version.
fn genre_list(value: Value) -> Result<Vec<Genre>, ApiError> {
    let inner = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("genres")
            .or_else(|| map.remove("data"))
            .unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    Ok(serde_json::from_value(inner)?)
}

/// Normalize one `GET /books` response into a [`BookPage`].
///
/// `data` is usually an array but occasionally a single object; a
/// missing envelope means the body itself is the array.
fn book_page(value: Value) -> Result<BookPage, ApiError> {
    let next_page = value
        .get("meta")
        .and_then(|meta| meta.get("next_page"))
        .and_then(Value::as_i64);

    let data = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            match map.remove("data").unwrap_or(Value::Null) {
                Value::Array(items) => serde_json::from_value(Value::Array(items))?,
                Value::Null => Vec::new(),
                single => vec![serde_json::from_value(single)?],
            }
        }
        Value::Array(_) => serde_json::from_value(value)?,
        _ => Vec::new(),
    };

    Ok(BookPage { data, next_page })
}

/// Best-effort extraction of a human-readable message from an error
/// body. Falls back to a truncated copy of the raw body.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_owned();
            }
        }
    }
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_envelope_wrapped_and_bare() {
        let wrapped = serde_json::json!({"data": {"access_token": "tok"}});
        let login: LoginData = from_envelope(wrapped).unwrap();
        assert_eq!(login.access_token, "tok");

        let bare = serde_json::json!({"access_token": "tok2"});
        let login: LoginData = from_envelope(bare).unwrap();
        assert_eq!(login.access_token, "tok2");
    }

    #[test]
    fn test_genre_list_three_shapes() {
        let raw = serde_json::json!([{"id": "g-1", "name": "Networking"}]);
        assert_eq!(genre_list(raw).unwrap().len(), 1);

        let keyed = serde_json::json!({"genres": [{"id": "g-1", "name": "Networking"}]});
        assert_eq!(genre_list(keyed).unwrap().len(), 1);

        let enveloped = serde_json::json!({"data": [{"id": "g-1", "name": "Networking"}]});
        assert_eq!(genre_list(enveloped).unwrap().len(), 1);
    }

    #[test]
    fn test_book_page_array_and_single() {
        let paged = serde_json::json!({
            "data": [{"id": "b-1", "title": "TCP Illustrated", "price": 90000}],
            "meta": {"next_page": 2}
        });
        let page = book_page(paged).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_page, Some(2));

        let single = serde_json::json!({
            "data": {"id": "b-1", "title": "TCP Illustrated", "price": 90000}
        });
        let page = book_page(single).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_book_page_unwrapped_array() {
        let raw = serde_json::json!([{"id": "b-1", "title": "K&R", "price": 50000}]);
        let page = book_page(raw).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(extract_message(r#"{"message": "Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(extract_message(r#"{"error": "boom"}"#), "boom");
        assert_eq!(extract_message("plain text"), "plain text");
    }

    #[test]
    fn test_book_list_query_params() {
        let query = BookListQuery {
            search: "rust".to_owned(),
            genre_id: Some(bitshelf_core::GenreId::new("g-1")),
            condition: Some("New".to_owned()),
            sort: Some("title asc".to_owned()),
            page: 2,
            limit: 100,
        };
        let params = query.params();
        assert!(params.contains(&("search", "rust".to_owned())));
        assert!(params.contains(&("genre_id", "g-1".to_owned())));
        assert!(params.contains(&("sort", "title asc".to_owned())));
        assert!(params.contains(&("page", "2".to_owned())));
    }

    #[test]
    fn test_book_list_query_omits_absent_params() {
        let query = BookListQuery {
            search: String::new(),
            page: 1,
            limit: 100,
            ..Default::default()
        };
        let params = query.params();
        assert!(!params.iter().any(|(k, _)| *k == "sort"));
        assert!(!params.iter().any(|(k, _)| *k == "genre_id"));
        assert!(!params.iter().any(|(k, _)| *k == "condition"));
    }
}
