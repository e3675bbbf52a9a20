//! Checkout route handlers.
//!
//! Checkout is the one place the cart crosses the wire. An empty cart
//! is rejected before any network call; a rejected order leaves the
//! cart exactly as it was so the user can adjust and retry.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::types::CreateOrderRequest;
use crate::filters;
use crate::middleware::auth::{self, RequireAuth};
use crate::models::Cart;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Display the checkout page.
#[instrument(skip(_auth, session))]
pub async fn show(_auth: RequireAuth, session: Session) -> impl IntoResponse {
    let cart = Cart::load(&session).await;

    CheckoutTemplate {
        cart: CartView::from(&cart),
        error: None,
    }
}

/// Place the order.
///
/// On success the cart is cleared and the user lands on the order
/// confirmation page.
#[instrument(skip(state, session, token))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> Response {
    let mut cart = Cart::load(&session).await;

    if cart.is_empty() {
        return CheckoutTemplate {
            cart: CartView::from(&cart),
            error: Some("Your cart is empty".to_string()),
        }
        .into_response();
    }

    let order = CreateOrderRequest {
        items: cart.order_items(),
    };

    match state.api().create_order(token.as_str(), &order).await {
        Ok(created) => {
            cart.clear();
            if let Err(e) = cart.save(&session).await {
                tracing::error!("failed to clear cart after checkout: {e}");
            }

            Redirect::to(&format!("/orders/{}", created.transaction_id)).into_response()
        }
        Err(e) => match auth::recover(&session, e).await {
            // Cart untouched; the user can fix quantities and retry.
            Ok(message) => CheckoutTemplate {
                cart: CartView::from(&cart),
                error: Some(message),
            }
            .into_response(),
            Err(redirect) => redirect,
        },
    }
}
