//! Catalog pipeline tests against a mock bookshop backend.
//!
//! The mock caps its page size at 10 regardless of the requested
//! limit, so a 25-book corpus forces the client to walk three backend
//! pages before sorting and slicing display pages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::Query, extract::State, routing::get};
use serde_json::{Value, json};

use bitshelf_integration_tests::{book_json, serve};
use bitshelf_storefront::api::ApiClient;
use bitshelf_storefront::catalog::{self, BookSort, CatalogFilter, SortDirection, SortField};

/// Largest page the mock backend will return.
const BACKEND_CAP: usize = 10;

#[derive(Clone, Default)]
struct Observed {
    /// The `sort` parameter of each `/books` request, if present.
    sorts: Arc<Mutex<Vec<Option<String>>>>,
}

fn corpus() -> Vec<Value> {
    (0..25)
        .map(|i| {
            // Titles deliberately out of order so sorting is visible.
            let title = format!("Book {:02}", (i * 7 + 3) % 25);
            book_json(&format!("b-{i:02}"), &title, 2000 + (i % 10), 10_000 * (i64::from(i) + 1))
        })
        .collect()
}

async fn list_books(
    State(observed): State<Observed>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    observed
        .sorts
        .lock()
        .expect("lock")
        .push(params.get("sort").cloned());

    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let search = params
        .get("search")
        .cloned()
        .unwrap_or_default()
        .to_lowercase();

    let matching: Vec<Value> = corpus()
        .into_iter()
        .filter(|book| {
            search.is_empty()
                || book["title"]
                    .as_str()
                    .is_some_and(|t| t.to_lowercase().contains(&search))
        })
        .collect();

    let start = (page - 1) * BACKEND_CAP;
    let slice: Vec<Value> = matching.iter().skip(start).take(BACKEND_CAP).cloned().collect();
    let next_page = if start + BACKEND_CAP < matching.len() {
        json!(page + 1)
    } else {
        Value::Null
    };

    Json(json!({ "data": slice, "meta": { "next_page": next_page } }))
}

async fn start_backend() -> (ApiClient, Observed) {
    let observed = Observed::default();
    let app = Router::new()
        .route("/books", get(list_books))
        .route(
            "/genre",
            get(|| async {
                Json(json!({ "genres": [{ "id": "g-1", "name": "Programming" }] }))
            }),
        )
        .with_state(observed.clone());

    let base_url = serve(app).await;
    (ApiClient::new(base_url), observed)
}

#[tokio::test]
async fn fetches_every_backend_page_and_slices_display_pages() {
    let (api, _) = start_backend().await;
    let filter = CatalogFilter::default();

    let page1 = catalog::fetch_catalog(&api, "tok", &filter, 1)
        .await
        .expect("page 1");
    assert_eq!(page1.total_items, 25);
    assert_eq!(page1.total_pages, 3);
    assert_eq!(page1.items.len(), 12);

    let page3 = catalog::fetch_catalog(&api, "tok", &filter, 3)
        .await
        .expect("page 3");
    assert_eq!(page3.items.len(), 1);

    // Past the end is empty, not an error.
    let page9 = catalog::fetch_catalog(&api, "tok", &filter, 9)
        .await
        .expect("page 9");
    assert!(page9.items.is_empty());
}

#[tokio::test]
async fn default_sort_is_title_ascending_across_the_whole_corpus() {
    let (api, _) = start_backend().await;
    let filter = CatalogFilter::default();

    let page1 = catalog::fetch_catalog(&api, "tok", &filter, 1)
        .await
        .expect("page 1");

    // "Book 00" is on backend page 3 of the shuffled corpus; global
    // sorting must still surface it first.
    assert_eq!(page1.items[0].title, "Book 00");
    let titles: Vec<&str> = page1.items.iter().map(|b| b.title.as_str()).collect();
    let mut sorted = titles.clone();
    sorted.sort_unstable();
    assert_eq!(titles, sorted);
}

#[tokio::test]
async fn price_descending_orders_globally() {
    let (api, _) = start_backend().await;
    let filter = CatalogFilter {
        sort: BookSort {
            field: SortField::Price,
            direction: SortDirection::Desc,
        },
        ..CatalogFilter::default()
    };

    let page1 = catalog::fetch_catalog(&api, "tok", &filter, 1)
        .await
        .expect("page 1");
    assert_eq!(page1.items[0].price.amount(), 250_000);
    assert!(page1.items[0].price >= page1.items[11].price);
}

#[tokio::test]
async fn publication_year_sort_sends_no_backend_sort_param() {
    let (api, observed) = start_backend().await;

    let year_filter = CatalogFilter {
        sort: BookSort {
            field: SortField::PublicationYear,
            direction: SortDirection::Desc,
        },
        ..CatalogFilter::default()
    };
    catalog::fetch_catalog(&api, "tok", &year_filter, 1)
        .await
        .expect("year sort");

    let title_filter = CatalogFilter::default();
    catalog::fetch_catalog(&api, "tok", &title_filter, 1)
        .await
        .expect("title sort");

    let sorts = observed.sorts.lock().expect("lock");
    // Three backend pages each: the first three requests carry no
    // sort param, the next three say "title asc".
    assert_eq!(sorts.len(), 6);
    assert!(sorts[..3].iter().all(Option::is_none));
    assert!(sorts[3..].iter().all(|s| s.as_deref() == Some("title asc")));
}

#[tokio::test]
async fn search_is_passed_through_to_the_backend() {
    let (api, _) = start_backend().await;
    let filter = CatalogFilter {
        search: "Book 07".to_string(),
        ..CatalogFilter::default()
    };

    let page1 = catalog::fetch_catalog(&api, "tok", &filter, 1)
        .await
        .expect("search");
    assert_eq!(page1.total_items, 1);
    assert_eq!(page1.items[0].title, "Book 07");
}

#[tokio::test]
async fn genre_list_is_normalized_from_keyed_shape() {
    let (api, _) = start_backend().await;

    let genres = api.genres("tok").await.expect("genres");
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].name, "Programming");
}
