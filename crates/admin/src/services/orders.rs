//! Bulk order actions from the order list.

use std::str::FromStr;

use iranmarket_core::OrderId;

use crate::db::{CancelOutcome, OrderRepository, PaymentOutcome, RepositoryError};
use crate::state::AppState;

/// An action staff can apply to every selected order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Deduct stock and mark paid.
    MarkPaid,
    MarkSent,
    MarkDelivered,
    /// Cancel and return deducted stock.
    MarkCancelled,
}

impl FromStr for BulkAction {
    type Err = BulkFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark_paid" => Ok(Self::MarkPaid),
            "mark_sent" => Ok(Self::MarkSent),
            "mark_delivered" => Ok(Self::MarkDelivered),
            "mark_cancelled" => Ok(Self::MarkCancelled),
            _ => Err(BulkFormError::UnknownAction),
        }
    }
}

impl BulkAction {
    /// Flash message for the orders the action went through on.
    #[must_use]
    pub fn success_message(self, count: usize) -> String {
        match self {
            Self::MarkPaid => {
                format!("{count} سفارش با موفقیت به عنوان پرداخت‌شده ثبت و موجودی آن‌ها کسر شد.")
            }
            Self::MarkSent => format!("وضعیت {count} سفارش به «ارسال شده» تغییر کرد."),
            Self::MarkDelivered => format!("وضعیت {count} سفارش به «تحویل شده» تغییر کرد."),
            Self::MarkCancelled => {
                format!("{count} سفارش لغو شد و موجودی آن‌ها در صورت امکان برگشت داده شد.")
            }
        }
    }

    /// Flash message for the orders it failed on.
    #[must_use]
    pub fn failure_message(self, count: usize) -> String {
        match self {
            Self::MarkPaid => format!(
                "برای {count} سفارش به دلیل عدم موجودی کافی یا خطای دیگر، عملیات انجام نشد."
            ),
            _ => format!("برای {count} سفارش عملیات انجام نشد."),
        }
    }
}

/// Problems with a submitted bulk form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkFormError {
    #[error("یک عملیات معتبر انتخاب کنید.")]
    UnknownAction,
    #[error("هیچ سفارشی انتخاب نشده است.")]
    NoOrders,
}

/// A parsed bulk form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub action: BulkAction,
    pub order_ids: Vec<OrderId>,
}

/// Parse an urlencoded bulk form with one `action` and repeated `order_ids`.
///
/// Unparseable ids are skipped and duplicates collapsed.
///
/// # Errors
///
/// Returns [`BulkFormError`] for a missing/unknown action or an empty
/// selection.
pub fn parse_bulk_form(body: &[u8]) -> Result<BulkRequest, BulkFormError> {
    let mut action = None;
    let mut order_ids: Vec<OrderId> = Vec::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "action" => action = Some(value.parse::<BulkAction>()?),
            "order_ids" => {
                if let Ok(id) = value.trim().parse::<i32>() {
                    let id = OrderId::new(id);
                    if !order_ids.contains(&id) {
                        order_ids.push(id);
                    }
                }
            }
            _ => {}
        }
    }

    let action = action.ok_or(BulkFormError::UnknownAction)?;
    if order_ids.is_empty() {
        return Err(BulkFormError::NoOrders);
    }
    Ok(BulkRequest { action, order_ids })
}

/// Per-order results of a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// What happened to one order.
enum Applied {
    /// Changed; the customer is told.
    Changed,
    /// Already in the target state.
    Unchanged,
}

/// Run `request` order by order. One failing order does not stop the rest.
pub async fn run_bulk(state: &AppState, request: &BulkRequest) -> BulkReport {
    let orders = OrderRepository::new(state.pool());
    let mut report = BulkReport::default();

    for &id in &request.order_ids {
        match apply(&orders, request.action, id).await {
            Ok(Applied::Changed) => {
                report.succeeded += 1;
                match orders.notice(id).await {
                    Ok(Some(notice)) => state.notifier().order_status_changed(&notice).await,
                    Ok(None) => {}
                    Err(e) => tracing::warn!(order_id = %id, error = %e, "order notice lookup failed"),
                }
            }
            Ok(Applied::Unchanged) => report.succeeded += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(order_id = %id, action = ?request.action, error = %e, "bulk order action failed");
            }
        }
    }

    tracing::info!(
        action = ?request.action,
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk order action completed"
    );
    report
}

async fn apply(
    orders: &OrderRepository<'_>,
    action: BulkAction,
    id: OrderId,
) -> Result<Applied, RepositoryError> {
    match action {
        BulkAction::MarkPaid => Ok(match orders.apply_payment(id).await? {
            PaymentOutcome::Applied => Applied::Changed,
            PaymentOutcome::AlreadyApplied => Applied::Unchanged,
        }),
        BulkAction::MarkSent => orders.mark_sent(id).await.map(|()| Applied::Changed),
        BulkAction::MarkDelivered => orders.mark_delivered(id).await.map(|()| Applied::Changed),
        BulkAction::MarkCancelled => Ok(match orders.cancel(id, true).await? {
            CancelOutcome::Cancelled { .. } => Applied::Changed,
            CancelOutcome::AlreadyCancelled | CancelOutcome::NotCancellable => Applied::Unchanged,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_order_ids() {
        let body = b"action=mark_sent&order_ids=3&order_ids=7&order_ids=3&order_ids=x";
        let request = parse_bulk_form(body).unwrap();
        assert_eq!(request.action, BulkAction::MarkSent);
        assert_eq!(request.order_ids, vec![OrderId::new(3), OrderId::new(7)]);
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert_eq!(
            parse_bulk_form(b"order_ids=1"),
            Err(BulkFormError::UnknownAction)
        );
        assert_eq!(
            parse_bulk_form(b"action=archive&order_ids=1"),
            Err(BulkFormError::UnknownAction)
        );
        assert_eq!(
            parse_bulk_form(b"action=mark_paid"),
            Err(BulkFormError::NoOrders)
        );
    }

    #[test]
    fn test_messages_include_count() {
        assert_eq!(
            BulkAction::MarkSent.success_message(4),
            "وضعیت 4 سفارش به «ارسال شده» تغییر کرد."
        );
        assert!(BulkAction::MarkPaid.failure_message(2).contains("عدم موجودی کافی"));
        assert!(BulkAction::MarkCancelled.success_message(1).starts_with("1 سفارش لغو شد"));
    }
}
