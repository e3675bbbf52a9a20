//! Order and statistics tests against a mock bookshop backend.
//!
//! The list and detail endpoints deliberately use the divergent line
//! shapes the real backend emits (`order_items` with `subtotal` vs
//! `items` with `subtotal_price`) to pin the normalization down.

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, routing::get, routing::post};
use serde_json::{Value, json};

use bitshelf_core::{BookId, Price, TransactionId};
use bitshelf_integration_tests::serve;
use bitshelf_storefront::api::ApiClient;
use bitshelf_storefront::api::types::{CreateOrderRequest, OrderItemInput};

#[derive(Clone, Default)]
struct Captured {
    order_body: Arc<Mutex<Option<Value>>>,
}

async fn create_order(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    *captured.order_body.lock().expect("lock") = Some(body);
    Json(json!({ "data": { "transaction_id": "trx-77" } }))
}

async fn list_orders() -> Json<Value> {
    Json(json!({
        "data": [{
            "id": "trx-77",
            "created_at": "2026-08-20T09:00:00Z",
            "total_price": 120_000,
            "total_quantity": 3,
            "order_items": [
                { "book_id": "b-1", "quantity": 2, "subtotal": 100_000 },
                { "book_id": "b-2", "quantity": 1, "subtotal": 20_000 }
            ]
        }]
    }))
}

async fn get_order() -> Json<Value> {
    Json(json!({
        "data": {
            "id": "trx-77",
            "created_at": "2026-08-20T09:00:00Z",
            "items": [
                {
                    "book_id": "b-1",
                    "book_title": "SICP",
                    "quantity": 2,
                    "unit_price": 50_000,
                    "subtotal_price": 100_000
                },
                {
                    "book_id": "b-2",
                    "book_title": "The Little Schemer",
                    "quantity": 1,
                    "unit_price": 20_000,
                    "subtotal_price": 20_000
                }
            ]
        }
    }))
}

async fn statistics() -> Json<Value> {
    Json(json!({
        "data": {
            "total_transactions": 42,
            "average_amount": 87_500.5,
            "genre_most_transactions": "Programming",
            "genre_least_transactions": "Networking"
        }
    }))
}

async fn start_backend() -> (ApiClient, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/transactions", post(create_order).get(list_orders))
        .route("/transactions/statistics", get(statistics))
        .route("/transactions/{id}", get(get_order))
        .with_state(captured.clone());

    (ApiClient::new(serve(app).await), captured)
}

#[tokio::test]
async fn create_order_sends_cart_lines_and_returns_transaction_id() {
    let (api, captured) = start_backend().await;

    let order = CreateOrderRequest {
        items: vec![
            OrderItemInput {
                book_id: BookId::new("b-1"),
                quantity: 2,
            },
            OrderItemInput {
                book_id: BookId::new("b-2"),
                quantity: 1,
            },
        ],
    };

    let created = api.create_order("tok", &order).await.expect("create");
    assert_eq!(created.transaction_id, TransactionId::new("trx-77"));

    let body = captured
        .order_body
        .lock()
        .expect("lock")
        .clone()
        .expect("captured body");
    assert_eq!(body["items"][0]["book_id"], "b-1");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn list_orders_normalizes_order_items_shape() {
    let (api, _) = start_backend().await;

    let orders = api.list_orders("tok").await.expect("list");
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.total(), Price::new(120_000));
    assert_eq!(order.lines()[0].line_total(), Price::new(100_000));
}

#[tokio::test]
async fn order_detail_normalizes_items_shape() {
    let (api, _) = start_backend().await;

    let order = api
        .get_order("tok", &TransactionId::new("trx-77"))
        .await
        .expect("detail");

    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.lines()[0].book_title.as_deref(), Some("SICP"));
    assert_eq!(order.lines()[0].unit(), Price::new(50_000));
    // No total_price on the detail shape; it falls back to the lines.
    assert_eq!(order.total(), Price::new(120_000));
}

#[tokio::test]
async fn statistics_deserialize_from_envelope() {
    let (api, _) = start_backend().await;

    let stats = api.statistics("tok").await.expect("stats");
    assert_eq!(stats.total_transactions, 42);
    assert_eq!(stats.genre_most_transactions.as_deref(), Some("Programming"));
    assert!(stats.average_amount.is_some());
}
