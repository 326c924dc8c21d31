//! Cart route handlers.
//!
//! The cart lives in the session; every page view re-prices it from the
//! catalog. Adding accepts both a plain form post and the `cart.js` fetch
//! call, which gets JSON back instead of a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use iranmarket_core::checkout::CheckoutSummary;
use iranmarket_core::{ProductId, Toman};

use crate::cart::{self, next_quantity};
use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::flash;
use crate::routes::context::PageContext;
use crate::services::pricing::{PricedCart, price_cart, shipping_for};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: PricedCart,
    pub summary: CheckoutSummary,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<String>,
}

/// Quantity form of the cart page.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub action: Option<String>,
    pub current_quantity: Option<String>,
    pub quantity: Option<String>,
}

/// Reply to an XHR add-to-cart.
#[derive(Debug, Serialize)]
pub struct CartAddResponse {
    pub success: bool,
    pub cart_count: i64,
    pub message: &'static str,
}

const ADDED_MESSAGE: &str = "محصول به سبد خرید اضافه شد.";

/// Whether the request came from `cart.js`.
fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Requested quantity; anything missing or below 1 adds one unit.
fn requested_quantity(raw: Option<&str>) -> i32 {
    raw.and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|q| *q >= 1)
        .unwrap_or(1)
}

async fn require_active_product(state: &AppState, id: i32) -> Result<ProductId> {
    CatalogRepository::new(state.pool())
        .active_product(ProductId::new(id))
        .await?
        .map(|p| p.id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display the cart.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let mut stored = cart::load(&session).await;
    let (priced, dropped) = price_cart(state.pool(), &mut stored).await?;
    if dropped {
        cart::save(&session, &stored).await?;
        ctx.cart_count = stored.count();
    }

    let shipping = if priced.is_empty() {
        Toman::ZERO
    } else {
        shipping_for(ctx.current_city.as_ref(), priced.items_total)
    };
    let summary = CheckoutSummary::compute(priced.items_total, Toman::ZERO, shipping);

    Ok(CartShowTemplate {
        ctx,
        cart: priced,
        summary,
    })
}

/// Add a product to the cart.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<i32>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = require_active_product(&state, product_id).await?;
    let quantity = requested_quantity(form.quantity.as_deref());

    let mut stored = cart::load(&session).await;
    stored.add(product_id, quantity);
    cart::save(&session, &stored).await?;

    if is_ajax(&headers) {
        return Ok(Json(CartAddResponse {
            success: true,
            cart_count: stored.count(),
            message: ADDED_MESSAGE,
        })
        .into_response());
    }

    flash::success(&session, ADDED_MESSAGE).await;
    Ok(Redirect::to("/cart/").into_response())
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<i32>) -> Result<Redirect> {
    let mut stored = cart::load(&session).await;
    stored.remove(ProductId::new(product_id));
    cart::save(&session, &stored).await?;
    Ok(Redirect::to("/cart/"))
}

/// Change a line's quantity with the `+`/`-` buttons or a typed value.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<i32>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let product_id = require_active_product(&state, product_id).await?;
    let quantity = next_quantity(
        form.action.as_deref(),
        form.current_quantity.as_deref(),
        form.quantity.as_deref(),
    );

    let mut stored = cart::load(&session).await;
    stored.set(product_id, quantity);
    cart::save(&session, &stored).await?;
    Ok(Redirect::to("/cart/"))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));
    }

    #[test]
    fn test_requested_quantity() {
        assert_eq!(requested_quantity(None), 1);
        assert_eq!(requested_quantity(Some("3")), 3);
        assert_eq!(requested_quantity(Some("0")), 1);
        assert_eq!(requested_quantity(Some("-2")), 1);
        assert_eq!(requested_quantity(Some("lots")), 1);
    }

    #[test]
    fn test_add_response_shape() {
        let body = serde_json::to_value(CartAddResponse {
            success: true,
            cart_count: 4,
            message: ADDED_MESSAGE,
        })
        .unwrap_or_default();
        assert_eq!(body["success"], true);
        assert_eq!(body["cart_count"], 4);
        assert_eq!(body["message"], ADDED_MESSAGE);
    }
}
