//! Wire types for the bookshop REST API.
//!
//! The backend's envelopes and field sets are not entirely consistent
//! between endpoints, so most optional fields default rather than
//! failing deserialization. Normalization of the outer envelope lives
//! in [`super::ApiClient`]; these types describe the payloads inside.

use serde::{Deserialize, Serialize};

use bitshelf_core::{BookId, GenreId, Price, TransactionId, UserId};

/// A book record as returned by `GET /books` and `GET /books/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub writer: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub publication_year: i32,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub genre_id: Option<GenreId>,
    /// Either a bare genre name or an embedded `{name}` object,
    /// depending on the endpoint.
    #[serde(default)]
    pub genre: Option<GenreRef>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Book {
    /// The genre name to display, if the record carries one.
    #[must_use]
    pub fn genre_name(&self) -> Option<&str> {
        self.genre.as_ref().map(GenreRef::name)
    }
}

/// The two shapes the backend uses for an embedded genre.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreRef {
    Name(String),
    Object { name: String },
}

impl GenreRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// A genre as returned by `GET /genre`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// One backend page of books plus the "is there more" signal.
#[derive(Debug, Clone, Default)]
pub struct BookPage {
    pub data: Vec<Book>,
    /// Present when the backend has a further page.
    pub next_page: Option<i64>,
}

/// Payload for `POST /books` and `PATCH /books/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct BookInput {
    pub title: String,
    pub writer: String,
    pub publisher: String,
    pub publication_year: i32,
    pub description: String,
    pub price: Price,
    pub stock_quantity: i64,
    pub genre_name: String,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The authenticated user's profile from `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Payload inside the `POST /auth/login` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub access_token: String,
}

/// One line of an order-creation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItemInput {
    pub book_id: BookId,
    pub quantity: u32,
}

/// Payload for `POST /transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// Payload inside the `POST /transactions` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    pub transaction_id: TransactionId,
}

/// A past order.
///
/// The list endpoint embeds lines under `order_items`, the detail
/// endpoint under `items`; both are kept and [`Transaction::lines`]
/// picks whichever is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub order_items: Vec<TransactionItem>,
    #[serde(default)]
    pub items: Vec<TransactionItem>,
    #[serde(default)]
    pub total_price: Option<Price>,
    #[serde(default)]
    pub total_quantity: Option<i64>,
}

impl Transaction {
    /// The order lines, regardless of which field the endpoint used.
    #[must_use]
    pub fn lines(&self) -> &[TransactionItem] {
        if self.order_items.is_empty() {
            &self.items
        } else {
            &self.order_items
        }
    }

    /// Total price, computed from lines when the backend omits it.
    #[must_use]
    pub fn total(&self) -> Price {
        self.total_price.unwrap_or_else(|| {
            self.lines()
                .iter()
                .map(TransactionItem::line_total)
                .sum()
        })
    }
}

/// One line of a past order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItem {
    pub book_id: BookId,
    pub quantity: u32,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Price>,
    #[serde(default)]
    pub subtotal: Option<Price>,
    #[serde(default)]
    pub subtotal_price: Option<Price>,
}

impl TransactionItem {
    /// The line total, from whichever field the backend supplied.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.subtotal
            .or(self.subtotal_price)
            .or_else(|| self.unit_price.map(|p| p.times(self.quantity)))
            .unwrap_or(Price::ZERO)
    }

    /// Unit price, derived from the subtotal when not given directly.
    #[must_use]
    pub fn unit(&self) -> Price {
        self.unit_price.unwrap_or_else(|| {
            if self.quantity == 0 {
                Price::ZERO
            } else {
                Price::new(self.line_total().amount() / i64::from(self.quantity))
            }
        })
    }
}

/// Aggregates from `GET /transactions/statistics`.
///
/// Every field is optional on the wire; the page tolerates whatever
/// subset the backend returns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_transactions: i64,
    #[serde(default)]
    pub average_amount: Option<f64>,
    #[serde(default)]
    pub genre_most_transactions: Option<String>,
    #[serde(default)]
    pub genre_least_transactions: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_book_tolerates_sparse_record() {
        let book: Book = serde_json::from_str(
            r#"{"id": "b-1", "title": "The C Programming Language", "price": 150000}"#,
        )
        .unwrap();
        assert_eq!(book.stock_quantity, 0);
        assert!(book.genre_name().is_none());
    }

    #[test]
    fn test_genre_ref_both_shapes() {
        let bare: GenreRef = serde_json::from_str(r#""Databases""#).unwrap();
        let object: GenreRef = serde_json::from_str(r#"{"name": "Databases"}"#).unwrap();
        assert_eq!(bare.name(), "Databases");
        assert_eq!(object.name(), "Databases");
    }

    #[test]
    fn test_transaction_lines_prefers_order_items() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": "t-1",
                "order_items": [{"book_id": "b-1", "quantity": 2, "unit_price": 10000}],
                "items": []
            }"#,
        )
        .unwrap();
        assert_eq!(tx.lines().len(), 1);
        assert_eq!(tx.total(), Price::new(20_000));
    }

    #[test]
    fn test_transaction_detail_shape() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": "t-2",
                "items": [
                    {"book_id": "b-1", "quantity": 3, "book_title": "SICP", "subtotal_price": 150000}
                ]
            }"#,
        )
        .unwrap();
        let line = &tx.lines()[0];
        assert_eq!(line.line_total(), Price::new(150_000));
        assert_eq!(line.unit(), Price::new(50_000));
        assert_eq!(tx.total(), Price::new(150_000));
    }

    #[test]
    fn test_statistics_tolerates_missing_fields() {
        let stats: Statistics = serde_json::from_str(r#"{"total_transactions": 7}"#).unwrap();
        assert_eq!(stats.total_transactions, 7);
        assert!(stats.average_amount.is_none());
    }
}
