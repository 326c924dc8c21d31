//! Order list, order detail and bulk status changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use iranmarket_core::order::{Order, OrderFilter, OrderLine};
use iranmarket_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::routes::context::PageContext;
use crate::routes::paging::{PAGE_SIZE, Pager};
use crate::services::{parse_bulk_form, run_bulk};
use crate::state::AppState;

/// List query: `?status=sent&paid=1&q=0912&page=2`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub paid: String,
    #[serde(default)]
    pub q: String,
    pub page: Option<i64>,
}

impl OrderQuery {
    /// Unknown values are ignored rather than rejected.
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.parse::<OrderStatus>().ok(),
            paid: match self.paid.as_str() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            query: Some(self.q.trim())
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
        }
    }
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrderListTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub query: OrderQuery,
    pub pager: Pager,
    pub statuses: &'static [OrderStatus],
}

impl OrderListTemplate {
    fn is_status(&self, status: &OrderStatus) -> bool {
        self.query.status == status.as_str()
    }
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub ctx: PageContext,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Filterable order list, newest first.
#[instrument(skip(state, ctx))]
pub async fn list(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());
    let filter = query.filter();
    let total = orders.count(&filter).await?;
    let pager = Pager::new(
        "/orders",
        query.page,
        total,
        &[
            ("status", query.status.as_str()),
            ("paid", query.paid.as_str()),
            ("q", query.q.as_str()),
        ],
    );
    let rows = orders.search(&filter, PAGE_SIZE, pager.offset()).await?;

    Ok(OrderListTemplate {
        ctx,
        orders: rows,
        query,
        pager,
        statuses: OrderStatus::ALL,
    })
}

/// One order with its lines and the status actions.
#[instrument(skip(state, ctx))]
pub async fn detail(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let lines = orders.lines(id).await?;

    Ok(OrderDetailTemplate { ctx, order, lines })
}

/// Apply one action to the selected orders.
///
/// The form repeats `order_ids`, which `axum::Form` cannot collect, so the
/// body is parsed directly. An optional `next` path brings staff back to the
/// page they came from.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn bulk(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(admin): RequireEditor,
    body: Bytes,
) -> Redirect {
    let next = return_path(&body);

    let request = match parse_bulk_form(&body) {
        Ok(request) => request,
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            return Redirect::to(&next);
        }
    };

    let report = run_bulk(&state, &request).await;
    if report.succeeded > 0 {
        flash::success(&session, request.action.success_message(report.succeeded)).await;
    }
    if report.failed > 0 {
        flash::error(&session, request.action.failure_message(report.failed)).await;
    }

    Redirect::to(&next)
}

/// `next` from the form when it is an order page, else the list.
fn return_path(body: &[u8]) -> String {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .filter(|next| next.starts_with("/orders"))
        .unwrap_or_else(|| "/orders".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_ignores_unknown_values() {
        let query = OrderQuery {
            status: "lost".to_owned(),
            paid: "yes".to_owned(),
            q: "  ".to_owned(),
            page: None,
        };
        assert_eq!(query.filter(), OrderFilter::default());
    }

    #[test]
    fn test_query_filter() {
        let query = OrderQuery {
            status: "sent".to_owned(),
            paid: "1".to_owned(),
            q: " 0912 ".to_owned(),
            page: Some(2),
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::Sent));
        assert_eq!(filter.paid, Some(true));
        assert_eq!(filter.query.as_deref(), Some("0912"));
    }

    #[test]
    fn test_return_path() {
        assert_eq!(return_path(b"action=mark_sent&next=%2Forders%2F12"), "/orders/12");
        assert_eq!(return_path(b"next=https%3A%2F%2Fevil.example"), "/orders");
        assert_eq!(return_path(b"action=mark_sent"), "/orders");
    }
}
