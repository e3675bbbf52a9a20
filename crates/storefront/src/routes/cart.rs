//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page
//! reloads. The cart itself lives in the session; no backend call is
//! made until checkout, so these handlers are load / mutate / save
//! around the pure [`Cart`] methods.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bitshelf_core::{BookId, Price};

use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::{Cart, CartLine};

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub line_id: String,
    pub book_id: String,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            line_id: line.line_id.clone(),
            book_id: line.book_id.to_string(),
            title: line.title.clone(),
            quantity: line.quantity,
            price: line.unit_price.display(),
            line_price: line.line_total().display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            subtotal: cart.total_price().display(),
            item_count: cart.total_items(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data. Title and price ride along from the page
/// that rendered the button; the backend revalidates everything at
/// checkout anyway.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub book_id: String,
    pub title: String,
    pub unit_price: i64,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub book_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub book_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(_auth, session))]
pub async fn show(_auth: RequireAuth, session: Session) -> impl IntoResponse {
    let cart = Cart::load(&session).await;

    CartShowTemplate {
        cart: CartView::from(&cart),
    }
}

/// Add an item to the cart (HTMX).
///
/// Returns the count badge with an HTMX trigger so other fragments
/// can refresh themselves.
#[instrument(skip(_auth, session, form))]
pub async fn add(
    _auth: RequireAuth,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let mut cart = Cart::load(&session).await;
    cart.add(
        BookId::new(form.book_id),
        &form.title,
        Price::new(form.unit_price),
        form.quantity.unwrap_or(1),
    );

    if let Err(e) = cart.save(&session).await {
        tracing::error!("failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.total_items(),
        },
    )
        .into_response()
}

/// Update a cart line's quantity (HTMX). Quantity zero removes the
/// line.
#[instrument(skip(_auth, session, form))]
pub async fn update(
    _auth: RequireAuth,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut cart = Cart::load(&session).await;
    cart.update_quantity(&BookId::new(form.book_id), form.quantity);

    if let Err(e) = cart.save(&session).await {
        tracing::error!("failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    )
        .into_response()
}

/// Remove an item from the cart (HTMX).
#[instrument(skip(_auth, session, form))]
pub async fn remove(
    _auth: RequireAuth,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut cart = Cart::load(&session).await;
    cart.remove(&BookId::new(form.book_id));

    if let Err(e) = cart.save(&session).await {
        tracing::error!("failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    )
        .into_response()
}

/// Cart count badge for the navbar (HTMX fragment).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = Cart::load(&session).await;

    CartCountTemplate {
        count: cart.total_items(),
    }
}
