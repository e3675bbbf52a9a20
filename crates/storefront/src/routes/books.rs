//! Book catalog route handlers.
//!
//! The catalog page runs the full list pipeline (fetch every backend
//! page, sort client-side, slice a display page) on each request; any
//! change to the filter form lands the user back on page 1 because
//! the form simply does not carry a page field. Listings can also be
//! created, edited and deleted from here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::str::FromStr;
use tower_sessions::Session;
use tracing::instrument;

use bitshelf_core::{BookCondition, BookId, GenreId, Price};

use crate::api::types::{Book, BookInput, Genre};
use crate::api::{ApiError, BACKEND_PAGE_LIMIT, BookListQuery};
use crate::catalog::{self, CatalogFilter, CatalogQuery, PageLink, Paged, SortField};
use crate::error::AppError;
use crate::filters;
use crate::middleware::auth::{self, RequireAuth};
use crate::models::BearerToken;
use crate::state::AppState;

/// Number of related books shown on a detail page.
const RELATED_LIMIT: usize = 4;

/// Oldest publication year the form accepts.
const MIN_PUBLICATION_YEAR: i32 = 1000;

// =============================================================================
// View Types
// =============================================================================

/// Book display data for templates.
#[derive(Clone)]
pub struct BookView {
    pub id: String,
    pub title: String,
    pub writer: String,
    pub publisher: String,
    pub publication_year: i32,
    pub description: String,
    pub price: String,
    pub stock_quantity: i64,
    pub condition: String,
    pub genre_id: String,
    pub genre_name: String,
    pub image_url: Option<String>,
    /// Raw amount for the add-to-cart form.
    pub unit_price: i64,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title.clone(),
            writer: book.writer.clone(),
            publisher: book.publisher.clone(),
            publication_year: book.publication_year,
            description: book.description.clone(),
            price: book.price.display(),
            stock_quantity: book.stock_quantity,
            condition: book.condition.clone(),
            genre_id: book
                .genre_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            genre_name: book.genre_name().unwrap_or_default().to_owned(),
            image_url: book.image_url.clone(),
            unit_price: book.price.amount(),
        }
    }
}

/// Genre display data for templates.
#[derive(Clone)]
pub struct GenreView {
    pub id: String,
    pub name: String,
}

impl From<&Genre> for GenreView {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id.to_string(),
            name: genre.name.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "books/index.html")]
pub struct BooksIndexTemplate {
    pub heading: String,
    pub books: Vec<BookView>,
    pub genres: Vec<GenreView>,
    pub search: String,
    pub selected_genre: String,
    pub selected_condition: String,
    /// Current sort as a URL token, e.g. `price_desc`.
    pub sort: String,
    /// Sort tokens each column header links to.
    pub sort_title: String,
    pub sort_year: String,
    pub sort_price: String,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub pages: Vec<PageLink>,
    /// Query string (no page param) reused by pagination links.
    pub filter_query: String,
    pub error: Option<String>,
}

/// Book detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "books/show.html")]
pub struct BookShowTemplate {
    pub book: BookView,
    pub related: Vec<BookView>,
}

/// Add/edit book form page template.
#[derive(Template, WebTemplate)]
#[template(path = "books/form.html")]
pub struct BookFormTemplate {
    pub heading: String,
    /// Where the form posts back to.
    pub action: String,
    pub form: BookForm,
    pub errors: BookFormErrors,
    pub genres: Vec<GenreView>,
    pub error: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// Display the catalog page.
#[instrument(skip(state, session, token))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Query(query): Query<CatalogQuery>,
) -> Response {
    render_catalog(&state, &session, &token, &query, None).await
}

/// Display the catalog restricted to one genre.
#[instrument(skip(state, session, token))]
pub async fn by_genre(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(genre_id): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    render_catalog(&state, &session, &token, &query, Some(GenreId::new(genre_id))).await
}

async fn render_catalog(
    state: &AppState,
    session: &Session,
    token: &BearerToken,
    query: &CatalogQuery,
    forced_genre: Option<GenreId>,
) -> Response {
    let mut filter = query.filter();
    if let Some(genre_id) = forced_genre.clone() {
        filter.genre_id = Some(genre_id);
    }

    // The dropdown degrades to empty when the genre endpoint is down;
    // the catalog itself still renders.
    let genres = match state.api().genres(token.as_str()).await {
        Ok(genres) => genres,
        Err(e) if e.is_unauthorized() => return auth::invalidate(session).await,
        Err(e) => {
            tracing::warn!("genre list unavailable: {e}");
            Vec::new()
        }
    };

    let (paged, error) = match catalog::fetch_catalog(state.api(), token.as_str(), &filter, query.page())
        .await
    {
        Ok(paged) => (paged, None),
        Err(e) => match auth::recover(session, e).await {
            Ok(message) => (
                Paged {
                    items: Vec::new(),
                    page: 1,
                    total_pages: 0,
                    total_items: 0,
                },
                Some(message),
            ),
            Err(redirect) => return redirect,
        },
    };

    let heading = match &forced_genre {
        Some(genre_id) => genres
            .iter()
            .find(|g| g.id == *genre_id)
            .map_or_else(|| "Genre".to_string(), |g| g.name.clone()),
        None => "All Books".to_string(),
    };

    let sort = filter.sort;
    BooksIndexTemplate {
        heading,
        books: paged.items.iter().map(BookView::from).collect(),
        genres: genres.iter().map(GenreView::from).collect(),
        search: filter.search.clone(),
        selected_genre: filter
            .genre_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        selected_condition: filter
            .condition
            .map(|c| c.as_str().to_owned())
            .unwrap_or_default(),
        sort: sort.token(),
        sort_title: sort.toggled(SortField::Title).token(),
        sort_year: sort.toggled(SortField::PublicationYear).token(),
        sort_price: sort.toggled(SortField::Price).token(),
        page: paged.page,
        total_pages: paged.total_pages,
        total_items: paged.total_items,
        pages: paged.page_links(),
        filter_query: filter_query_string(&filter),
        error,
    }
    .into_response()
}

/// Serialize the active filter back into a query string so sort and
/// pagination links preserve it. Deliberately excludes the sort token
/// (the links append their own) and the page number.
fn filter_query_string(filter: &CatalogFilter) -> String {
    let mut parts = Vec::new();

    if !filter.search.is_empty() {
        parts.push(format!("search={}", urlencoding::encode(&filter.search)));
    }
    if let Some(genre_id) = &filter.genre_id {
        parts.push(format!("genre={}", urlencoding::encode(genre_id.as_str())));
    }
    if let Some(condition) = filter.condition {
        parts.push(format!("condition={}", condition.as_str()));
    }

    parts.join("&")
}

// =============================================================================
// Detail
// =============================================================================

/// Display a book detail page with a strip of related books.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = BookId::new(id);

    let book = match state.api().get_book(token.as_str(), &id).await {
        Ok(book) => book,
        Err(e) if e.is_unauthorized() => return Ok(auth::invalidate(&session).await),
        Err(ApiError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("book {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    let related = fetch_related(&state, token.as_str(), &book).await;

    Ok(BookShowTemplate {
        book: BookView::from(&book),
        related,
    }
    .into_response())
}

/// Other books in the same genre. Failure here never breaks the
/// detail page; the strip just comes back empty.
async fn fetch_related(state: &AppState, token: &str, book: &Book) -> Vec<BookView> {
    let Some(genre_id) = book.genre_id.clone() else {
        return Vec::new();
    };

    let query = BookListQuery {
        search: String::new(),
        genre_id: Some(genre_id),
        condition: None,
        sort: None,
        page: 1,
        limit: BACKEND_PAGE_LIMIT,
    };

    match state.api().list_books(token, &query).await {
        Ok(page) => page
            .data
            .iter()
            .filter(|other| other.id != book.id)
            .take(RELATED_LIMIT)
            .map(BookView::from)
            .collect(),
        Err(e) => {
            tracing::warn!("related books unavailable for {}: {e}", book.id);
            Vec::new()
        }
    }
}

// =============================================================================
// Create / Edit / Delete
// =============================================================================

/// Add/edit book form data. Everything arrives as a string and is
/// validated into a [`BookInput`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub writer: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub publication_year: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock_quantity: String,
    #[serde(default)]
    pub genre_name: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub image_url: String,
}

impl BookForm {
    fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            writer: book.writer.clone(),
            publisher: book.publisher.clone(),
            publication_year: book.publication_year.to_string(),
            description: book.description.clone(),
            price: book.price.amount().to_string(),
            stock_quantity: book.stock_quantity.to_string(),
            genre_name: book.genre_name().unwrap_or_default().to_owned(),
            condition: book.condition.clone(),
            image_url: book.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Per-field validation messages for the book form.
#[derive(Debug, Default)]
pub struct BookFormErrors {
    pub title: Option<String>,
    pub writer: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<String>,
    pub price: Option<String>,
    pub stock_quantity: Option<String>,
    pub genre_name: Option<String>,
    pub condition: Option<String>,
    pub image_url: Option<String>,
}

impl BookFormErrors {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.writer.is_none()
            && self.publisher.is_none()
            && self.publication_year.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
            && self.genre_name.is_none()
            && self.condition.is_none()
            && self.image_url.is_none()
    }
}

fn validate_book_form(form: &BookForm) -> Result<BookInput, BookFormErrors> {
    use chrono::Datelike;

    let mut errors = BookFormErrors::default();

    if form.title.trim().is_empty() {
        errors.title = Some("Title is required".to_string());
    }
    if form.writer.trim().is_empty() {
        errors.writer = Some("Writer is required".to_string());
    }
    if form.publisher.trim().is_empty() {
        errors.publisher = Some("Publisher is required".to_string());
    }
    if form.genre_name.trim().is_empty() {
        errors.genre_name = Some("Genre is required".to_string());
    }

    let max_year = chrono::Utc::now().year() + 1;
    let publication_year = match form.publication_year.trim().parse::<i32>() {
        Ok(year) if (MIN_PUBLICATION_YEAR..=max_year).contains(&year) => year,
        Ok(_) => {
            errors.publication_year =
                Some(format!("Year must be between {MIN_PUBLICATION_YEAR} and {max_year}"));
            0
        }
        Err(_) => {
            errors.publication_year = Some("Year must be a number".to_string());
            0
        }
    };

    let price = match form.price.trim().parse::<i64>() {
        Ok(amount) if amount > 0 => Price::new(amount),
        Ok(_) => {
            errors.price = Some("Price must be greater than zero".to_string());
            Price::ZERO
        }
        Err(_) => {
            errors.price = Some("Price must be a whole number".to_string());
            Price::ZERO
        }
    };

    let stock_quantity = match form.stock_quantity.trim().parse::<i64>() {
        Ok(quantity) if quantity >= 0 => quantity,
        Ok(_) => {
            errors.stock_quantity = Some("Stock cannot be negative".to_string());
            0
        }
        Err(_) => {
            errors.stock_quantity = Some("Stock must be a whole number".to_string());
            0
        }
    };

    let condition = match BookCondition::from_str(form.condition.trim()) {
        Ok(condition) => condition.as_str().to_owned(),
        Err(_) => {
            errors.condition = Some("Condition must be New or Used".to_string());
            String::new()
        }
    };

    let image_url = match form.image_url.trim() {
        "" => None,
        raw => match url::Url::parse(raw) {
            Ok(_) => Some(raw.to_owned()),
            Err(_) => {
                errors.image_url = Some("Image URL is not a valid URL".to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookInput {
        title: form.title.trim().to_owned(),
        writer: form.writer.trim().to_owned(),
        publisher: form.publisher.trim().to_owned(),
        publication_year,
        description: form.description.trim().to_owned(),
        price,
        stock_quantity,
        genre_name: form.genre_name.trim().to_owned(),
        condition,
        image_url,
    })
}

/// Genres for the form's datalist; failure just means no suggestions.
async fn genre_options(state: &AppState, token: &str) -> Vec<GenreView> {
    match state.api().genres(token).await {
        Ok(genres) => genres.iter().map(GenreView::from).collect(),
        Err(e) => {
            tracing::warn!("genre list unavailable: {e}");
            Vec::new()
        }
    }
}

/// Display the add-book form.
#[instrument(skip(state, token))]
pub async fn new_page(
    State(state): State<AppState>,
    RequireAuth(token): RequireAuth,
) -> impl IntoResponse {
    BookFormTemplate {
        heading: "Add Book".to_string(),
        action: "/books/new".to_string(),
        form: BookForm::default(),
        errors: BookFormErrors::default(),
        genres: genre_options(&state, token.as_str()).await,
        error: None,
    }
}

/// Create a book listing.
#[instrument(skip(state, session, token, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Form(form): Form<BookForm>,
) -> Response {
    let input = match validate_book_form(&form) {
        Ok(input) => input,
        Err(errors) => {
            return BookFormTemplate {
                heading: "Add Book".to_string(),
                action: "/books/new".to_string(),
                form,
                errors,
                genres: genre_options(&state, token.as_str()).await,
                error: None,
            }
            .into_response();
        }
    };

    match state.api().create_book(token.as_str(), &input).await {
        Ok(()) => Redirect::to("/books").into_response(),
        Err(e) => match auth::recover(&session, e).await {
            Ok(message) => BookFormTemplate {
                heading: "Add Book".to_string(),
                action: "/books/new".to_string(),
                form,
                errors: BookFormErrors::default(),
                genres: genre_options(&state, token.as_str()).await,
                error: Some(message),
            }
            .into_response(),
            Err(redirect) => redirect,
        },
    }
}

/// Display the edit-book form, prefilled from the current record.
#[instrument(skip(state, session, token))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = BookId::new(id);

    let book = match state.api().get_book(token.as_str(), &id).await {
        Ok(book) => book,
        Err(e) if e.is_unauthorized() => return Ok(auth::invalidate(&session).await),
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(format!("book {id}"))),
        Err(e) => return Err(e.into()),
    };

    Ok(BookFormTemplate {
        heading: format!("Edit: {}", book.title),
        action: format!("/books/{id}/edit"),
        form: BookForm::from_book(&book),
        errors: BookFormErrors::default(),
        genres: genre_options(&state, token.as_str()).await,
        error: None,
    }
    .into_response())
}

/// Update a book listing.
#[instrument(skip(state, session, token, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<BookForm>,
) -> Response {
    let id = BookId::new(id);
    let action = format!("/books/{id}/edit");

    let input = match validate_book_form(&form) {
        Ok(input) => input,
        Err(errors) => {
            return BookFormTemplate {
                heading: "Edit Book".to_string(),
                action,
                form,
                errors,
                genres: genre_options(&state, token.as_str()).await,
                error: None,
            }
            .into_response();
        }
    };

    match state.api().update_book(token.as_str(), &id, &input).await {
        Ok(()) => Redirect::to(&format!("/books/{id}")).into_response(),
        Err(e) => match auth::recover(&session, e).await {
            Ok(message) => BookFormTemplate {
                heading: "Edit Book".to_string(),
                action,
                form,
                errors: BookFormErrors::default(),
                genres: genre_options(&state, token.as_str()).await,
                error: Some(message),
            }
            .into_response(),
            Err(redirect) => redirect,
        },
    }
}

/// Delete a book listing.
#[instrument(skip(state, session, token))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = BookId::new(id);

    match state.api().delete_book(token.as_str(), &id).await {
        Ok(()) => Ok(Redirect::to("/books").into_response()),
        Err(e) if e.is_unauthorized() => Ok(auth::invalidate(&session).await),
        // Already gone; the listing page is the right place either way.
        Err(ApiError::NotFound(_)) => Ok(Redirect::to("/books").into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::BookSort;

    fn valid_form() -> BookForm {
        BookForm {
            title: "The Pragmatic Programmer".to_string(),
            writer: "Hunt & Thomas".to_string(),
            publisher: "Addison-Wesley".to_string(),
            publication_year: "1999".to_string(),
            description: "Classic.".to_string(),
            price: "250000".to_string(),
            stock_quantity: "3".to_string(),
            genre_name: "Software Engineering".to_string(),
            condition: "Used".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_validate_book_form_accepts_valid_input() {
        let input = validate_book_form(&valid_form()).unwrap();
        assert_eq!(input.publication_year, 1999);
        assert_eq!(input.price, Price::new(250_000));
        assert_eq!(input.condition, "Used");
        assert!(input.image_url.is_none());
    }

    #[test]
    fn test_validate_book_form_rejects_bad_fields() {
        let form = BookForm {
            title: String::new(),
            publication_year: "soon".to_string(),
            price: "-5".to_string(),
            condition: "Mint".to_string(),
            image_url: "not a url".to_string(),
            ..valid_form()
        };

        let errors = validate_book_form(&form).unwrap_err();
        assert!(errors.title.is_some());
        assert!(errors.publication_year.is_some());
        assert!(errors.price.is_some());
        assert!(errors.condition.is_some());
        assert!(errors.image_url.is_some());
        assert!(errors.writer.is_none());
    }

    #[test]
    fn test_filter_query_string_skips_empty_fields() {
        let filter = CatalogFilter {
            search: "rust".to_string(),
            genre_id: None,
            condition: Some(BookCondition::New),
            sort: BookSort::default(),
        };

        assert_eq!(filter_query_string(&filter), "search=rust&condition=New");
    }
}
