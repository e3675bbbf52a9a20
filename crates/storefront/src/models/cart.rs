//! The shopping cart.
//!
//! State transitions are pure methods on [`Cart`] so they can be
//! tested without a session backend; persistence is the separate
//! [`Cart::load`] / [`Cart::save`] pair, called around every mutation
//! by the cart routes. The backend never sees the cart until
//! checkout.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use bitshelf_core::{BookId, Price};

use crate::api::types::OrderItemInput;
use crate::models::session_keys;

/// One row in the cart: a distinct book and its requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Client-generated line identifier (stable across re-renders).
    pub line_id: String,
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An ordered list of cart lines with at most one line per book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a book to the cart.
    ///
    /// If the book is already present its quantity is incremented;
    /// otherwise a new line is appended. Adding zero of something is
    /// a no-op.
    pub fn add(&mut self, book_id: BookId, title: &str, unit_price: Price, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.book_id == book_id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                line_id: Uuid::new_v4().to_string(),
                book_id,
                title: title.to_owned(),
                unit_price,
                quantity,
            });
        }
    }

    /// Overwrite a line's quantity. Zero removes the line entirely.
    ///
    /// No upper bound is enforced here; the backend is the authority
    /// on stock limits at checkout time.
    pub fn update_quantity(&mut self, book_id: &BookId, quantity: u32) {
        if quantity == 0 {
            self.remove(book_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.book_id == *book_id) {
            line.quantity = quantity;
        }
    }

    /// Remove the line for a book, if present.
    pub fn remove(&mut self, book_id: &BookId) {
        self.lines.retain(|line| line.book_id != *book_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines. Derived on demand.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line totals. Derived on demand.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The order-creation payload for checkout.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|line| OrderItemInput {
                book_id: line.book_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Restore the cart from the session.
    ///
    /// A missing or malformed stored value yields an empty cart,
    /// never an error.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Persist the cart to the session. Called after every mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn book_a() -> BookId {
        BookId::new("book-a")
    }

    #[test]
    fn test_add_same_book_merges_into_one_line() {
        let mut cart = Cart::default();
        cart.add(book_a(), "Refactoring", Price::new(50_000), 2);
        cart.add(book_a(), "Refactoring", Price::new(50_000), 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_distinct_books_appends() {
        let mut cart = Cart::default();
        cart.add(book_a(), "Refactoring", Price::new(50_000), 1);
        cart.add(BookId::new("book-b"), "DDIA", Price::new(80_000), 1);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[1].book_id, BookId::new("book-b"));
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(book_a(), "Refactoring", Price::new(50_000), 2);
        cart.update_quantity(&book_a(), 0);

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_update_quantity_overwrites() {
        let mut cart = Cart::default();
        cart.add(book_a(), "Refactoring", Price::new(50_000), 2);
        cart.update_quantity(&book_a(), 7);

        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::default();
        cart.add(book_a(), "A", Price::new(10_000), 2);
        cart.add(BookId::new("book-b"), "B", Price::new(5_000), 1);

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Price::new(25_000));
    }

    #[test]
    fn test_add_twice_scenario() {
        // cart [] -> add A qty 1 -> add A qty 2 -> one line, qty 3
        let mut cart = Cart::default();
        cart.add(book_a(), "A", Price::new(50_000), 1);
        cart.add(book_a(), "A", Price::new(50_000), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_price(), Price::new(150_000));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add(book_a(), "A", Price::new(10_000), 1);
        cart.add(BookId::new("book-b"), "B", Price::new(10_000), 1);

        cart.remove(&book_a());
        assert_eq!(cart.lines().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::default();
        cart.add(book_a(), "A", Price::new(10_000), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_order_items_payload() {
        let mut cart = Cart::default();
        cart.add(book_a(), "A", Price::new(10_000), 2);

        let items = cart.order_items();
        assert_eq!(
            items,
            vec![OrderItemInput {
                book_id: book_a(),
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_malformed_serialized_cart_becomes_empty() {
        // Direct deserialization failure is what Cart::load swallows.
        let parsed: Result<Cart, _> = serde_json::from_str(r#"{"lines": "garbage"}"#);
        assert!(parsed.is_err());
    }
}
