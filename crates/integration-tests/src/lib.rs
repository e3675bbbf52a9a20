//! Integration test support for Bitshelf.
//!
//! The storefront's only external dependency is the bookshop REST
//! API, so the tests stand up a small axum mock of it on an ephemeral
//! port and point the real [`ApiClient`] at it. No network access or
//! running services required.
//!
//! Run with: `cargo test -p bitshelf-integration-tests`
//!
//! [`ApiClient`]: bitshelf_storefront::api::ApiClient

use axum::Router;
use url::Url;

/// Serve a mock bookshop router on an ephemeral local port and return
/// its base URL.
///
/// The server task is detached; it lives until the test process ends.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    Url::parse(&format!("http://{addr}/")).expect("mock base url")
}

/// Build a minimal book record the way the bookshop API emits them.
#[must_use]
pub fn book_json(id: &str, title: &str, publication_year: i32, price: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "writer": "Writer",
        "publisher": "Publisher",
        "publication_year": publication_year,
        "description": "",
        "price": price,
        "stock_quantity": 5,
        "condition": "New",
        "genre_id": "g-1",
        "genre": { "name": "Programming" },
    })
}
