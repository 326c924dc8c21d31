//! Built-in test payment gateway.
//!
//! The payment page offers a "successful" and a "failed" button; both land
//! on the callback route the way a real gateway redirect would.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{instrument, warn};

use iranmarket_core::OrderId;
use iranmarket_core::order::{Order, OrderLine};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::flash::{self, FlashLevel};
use crate::routes::context::PageContext;
use crate::services::orders::{can_access, complete_payment, placed_orders};
use crate::state::AppState;

/// Test gateway page.
#[derive(Template, WebTemplate)]
#[template(path = "payment/start.html")]
pub struct PaymentStartTemplate {
    pub ctx: PageContext,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Shown once an order is paid.
#[derive(Template, WebTemplate)]
#[template(path = "payment/success.html")]
pub struct PaymentSuccessTemplate {
    pub ctx: PageContext,
    pub order: Order,
}

/// Load an order the visitor may pay for; anything else is a 404.
async fn accessible_order(
    state: &AppState,
    session: &Session,
    ctx: &PageContext,
    id: OrderId,
) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let placed = placed_orders(session).await;
    if !can_access(&order, ctx.user.as_ref(), &placed) {
        return Err(AppError::NotFound(format!("order {id}")));
    }
    Ok(order)
}

/// Show the gateway, or the success page when already paid.
#[instrument(skip(state, session, ctx))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Path(order_id): Path<i32>,
) -> Result<Response> {
    let order = accessible_order(&state, &session, &ctx, OrderId::new(order_id)).await?;

    if order.paid {
        ctx.push(FlashLevel::Info, "این سفارش قبلاً پرداخت شده است.");
        return Ok(PaymentSuccessTemplate { ctx, order }.into_response());
    }

    let lines = OrderRepository::new(state.pool()).lines(order.id).await?;
    Ok(PaymentStartTemplate { ctx, order, lines }.into_response())
}

/// Gateway callback; `status` is `success` or `failed`.
#[instrument(skip(state, session, ctx))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Path((order_id, status)): Path<(i32, String)>,
) -> Result<Response> {
    let order = accessible_order(&state, &session, &ctx, OrderId::new(order_id)).await?;
    let payment_page = format!("/payment/{}/", order.id);

    match status.as_str() {
        "success" => match complete_payment(&state, order.id).await {
            Ok(_) => {
                let order = OrderRepository::new(state.pool())
                    .get(order.id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                ctx.push(FlashLevel::Success, "پرداخت شما با موفقیت انجام شد.");
                Ok(PaymentSuccessTemplate { ctx, order }.into_response())
            }
            Err(RepositoryError::Payment(e)) => {
                warn!(order_id = %order.id, error = %e, "payment rejected");
                flash::error(
                    &session,
                    format!(
                        "پرداخت انجام شد اما پردازش سفارش به دلیل خطا در موجودی با مشکل مواجه شد: {e}"
                    ),
                )
                .await;
                Ok(Redirect::to(&payment_page).into_response())
            }
            Err(e) => Err(e.into()),
        },
        "failed" => {
            flash::error(&session, "پرداخت شما ناموفق بود یا توسط شما لغو شد.").await;
            Ok(Redirect::to(&payment_page).into_response())
        }
        _ => Err(AppError::NotFound(format!("payment status {status}"))),
    }
}
