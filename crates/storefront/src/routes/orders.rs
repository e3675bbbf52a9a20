//! Order history route handlers.
//!
//! The backend returns the whole transaction list in one shot; search,
//! sorting and pagination all happen here. Detail pages double as the
//! post-checkout confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bitshelf_core::TransactionId;

use crate::api::ApiError;
use crate::api::types::{Statistics, Transaction, TransactionItem};
use crate::catalog::{self, PageLink, Paged};
use crate::error::AppError;
use crate::filters;
use crate::middleware::auth::{self, RequireAuth};
use crate::state::AppState;

/// Number of orders on one history page.
const ORDERS_PAGE_SIZE: usize = 10;

// =============================================================================
// View Types
// =============================================================================

/// Order summary display data for the history list.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub created_at: String,
    pub item_count: i64,
    pub total: String,
}

impl From<&Transaction> for OrderView {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            created_at: format_timestamp(tx.created_at.as_deref()),
            item_count: tx.total_quantity.unwrap_or_else(|| {
                tx.lines().iter().map(|line| i64::from(line.quantity)).sum()
            }),
            total: tx.total().display(),
        }
    }
}

/// Order line display data for the detail page.
#[derive(Clone)]
pub struct OrderLineView {
    pub title: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&TransactionItem> for OrderLineView {
    fn from(item: &TransactionItem) -> Self {
        Self {
            title: item
                .book_title
                .clone()
                .unwrap_or_else(|| item.book_id.to_string()),
            quantity: item.quantity,
            unit_price: item.unit().display(),
            line_total: item.line_total().display(),
        }
    }
}

fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or_else(
            || raw.unwrap_or("-").to_owned(),
            |dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        )
}

/// Sort key: orders without a parseable timestamp sink to the epoch.
fn created_at_key(tx: &Transaction) -> i64 {
    tx.created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(0, |dt| dt.timestamp())
}

// =============================================================================
// Queries and Templates
// =============================================================================

/// Order history query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl OrdersQuery {
    /// Newest first unless explicitly asked otherwise.
    fn newest_first(&self) -> bool {
        self.sort.as_deref() != Some("created_at_asc")
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
    pub search: String,
    pub sort: String,
    /// Token the date column header links to.
    pub sort_toggle: String,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub pages: Vec<PageLink>,
    pub filter_query: String,
    pub error: Option<String>,
}

/// Order detail / confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderView,
    pub lines: Vec<OrderLineView>,
}

/// Statistics page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/statistics.html")]
pub struct StatisticsTemplate {
    pub total_transactions: i64,
    pub average_amount: String,
    pub genre_most: String,
    pub genre_least: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the order history page.
#[instrument(skip(state, session, token))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let (transactions, error) = match state.api().list_orders(token.as_str()).await {
        Ok(transactions) => (transactions, None),
        Err(e) => match auth::recover(&session, e).await {
            Ok(message) => (Vec::new(), Some(message)),
            Err(redirect) => return redirect,
        },
    };

    let search = query.search.clone().unwrap_or_default();
    let newest_first = query.newest_first();

    let mut filtered: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| {
            search.is_empty()
                || tx
                    .id
                    .as_str()
                    .to_lowercase()
                    .contains(&search.to_lowercase())
        })
        .collect();

    filtered.sort_by_key(created_at_key);
    if newest_first {
        filtered.reverse();
    }

    let page = query.page.unwrap_or(1).max(1);
    let paged: Paged<Transaction> = catalog::paginate(filtered, page, ORDERS_PAGE_SIZE);

    let sort = if newest_first {
        "created_at_desc"
    } else {
        "created_at_asc"
    };
    let sort_toggle = if newest_first {
        "created_at_asc"
    } else {
        "created_at_desc"
    };

    // Search only; sort and page are appended by each link.
    let filter_query = if search.is_empty() {
        String::new()
    } else {
        format!("search={}", urlencoding::encode(&search))
    };

    OrdersIndexTemplate {
        orders: paged.items.iter().map(OrderView::from).collect(),
        search,
        sort: sort.to_string(),
        sort_toggle: sort_toggle.to_string(),
        page: paged.page,
        total_pages: paged.total_pages,
        total_items: paged.total_items,
        pages: paged.page_links(),
        filter_query,
        error,
    }
    .into_response()
}

/// Display one order. Also the post-checkout confirmation page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = TransactionId::new(id);

    let tx = match state.api().get_order(token.as_str(), &id).await {
        Ok(tx) => tx,
        Err(e) if e.is_unauthorized() => return Ok(auth::invalidate(&session).await),
        Err(ApiError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("order {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(OrderShowTemplate {
        order: OrderView::from(&tx),
        lines: tx.lines().iter().map(OrderLineView::from).collect(),
    }
    .into_response())
}

/// Display the sales statistics page.
#[instrument(skip(state, session, token))]
pub async fn statistics(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> Result<Response, AppError> {
    let stats: Statistics = match state.api().statistics(token.as_str()).await {
        Ok(stats) => stats,
        Err(e) if e.is_unauthorized() => return Ok(auth::invalidate(&session).await),
        Err(e) => return Err(e.into()),
    };

    // The backend reports the average as a float; display it rounded
    // to whole rupiah like every other price.
    #[allow(clippy::cast_possible_truncation)]
    let average_amount = stats.average_amount.map_or_else(
        || "-".to_string(),
        |avg| bitshelf_core::Price::new(avg.round() as i64).display(),
    );

    Ok(StatisticsTemplate {
        total_transactions: stats.total_transactions,
        average_amount,
        genre_most: stats.genre_most_transactions.unwrap_or_else(|| "-".to_string()),
        genre_least: stats
            .genre_least_transactions
            .unwrap_or_else(|| "-".to_string()),
    }
    .into_response())
}
