//! Order access and completion of test-gateway payments.

use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::OrderId;
use iranmarket_core::order::{GatewayRefs, Order};

use crate::db::{OrderRepository, PaymentOutcome, RepositoryError};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Whether the visitor may see an order's payment pages.
///
/// Customers see their own orders; anyone sees orders placed from their
/// current session.
#[must_use]
pub fn can_access(order: &Order, user: Option<&CurrentUser>, placed: &[OrderId]) -> bool {
    let owns = matches!((order.user_id, user), (Some(owner), Some(user)) if owner == user.id);
    owns || placed.contains(&order.id)
}

/// Orders placed from this session.
pub async fn placed_orders(session: &Session) -> Vec<OrderId> {
    session
        .get::<Vec<OrderId>>(session_keys::PLACED_ORDERS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Remember an order placed from this session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn remember_placed(
    session: &Session,
    id: OrderId,
) -> Result<(), tower_sessions::session::Error> {
    let mut placed = placed_orders(session).await;
    if !placed.contains(&id) {
        placed.push(id);
    }
    session.insert(session_keys::PLACED_ORDERS, placed).await
}

/// Apply a successful gateway callback: deduct stock, mark paid, store the
/// gateway references and mail the customer.
///
/// A repeated callback for a paid order changes nothing and sends nothing.
///
/// # Errors
///
/// Returns `RepositoryError::Payment` when stock ran out; the order is left
/// untouched.
#[instrument(skip(state))]
pub async fn complete_payment(state: &AppState, id: OrderId) -> Result<PaymentOutcome, RepositoryError> {
    let orders = OrderRepository::new(state.pool());
    let outcome = orders.apply_payment(id).await?;

    if outcome == PaymentOutcome::Applied {
        orders.set_payment_refs(id, &GatewayRefs::generate()).await?;
        if let Some(notice) = orders.notice(id).await? {
            state.notifier().payment_success(&notice).await;
        }
        info!(order_id = %id, "test gateway payment completed");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use iranmarket_core::{OrderStatus, Toman, UserId};

    use super::*;

    fn order(id: i32, user_id: Option<i32>) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: user_id.map(UserId::new),
            first_name: "سارا".to_owned(),
            last_name: "محمدی".to_owned(),
            phone: "09120000000".to_owned(),
            address: "تهران".to_owned(),
            city_id: None,
            city_name: None,
            shipping_cost: Toman::ZERO,
            discount_amount: Toman::ZERO,
            coupon_code: String::new(),
            total_price: Toman::new(100_000),
            payment_ref: String::new(),
            gateway_tracking_code: String::new(),
            status: OrderStatus::Pending,
            paid: false,
            stock_deducted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(id: i32) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            username: "09120000000".to_owned(),
        }
    }

    #[test]
    fn test_owner_can_access() {
        assert!(can_access(&order(1, Some(7)), Some(&user(7)), &[]));
        assert!(!can_access(&order(1, Some(7)), Some(&user(8)), &[]));
    }

    #[test]
    fn test_session_placed_order_is_accessible() {
        assert!(can_access(&order(3, None), None, &[OrderId::new(3)]));
        assert!(can_access(&order(3, Some(7)), Some(&user(8)), &[OrderId::new(3)]));
        assert!(!can_access(&order(3, None), None, &[OrderId::new(4)]));
        assert!(!can_access(&order(3, None), Some(&user(7)), &[]));
    }

    #[tokio::test]
    async fn test_remember_placed_dedupes() {
        use std::sync::Arc;
        use tower_sessions::MemoryStore;

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        remember_placed(&session, OrderId::new(5)).await.ok();
        remember_placed(&session, OrderId::new(5)).await.ok();
        remember_placed(&session, OrderId::new(6)).await.ok();
        assert_eq!(
            placed_orders(&session).await,
            vec![OrderId::new(5), OrderId::new(6)]
        );
    }
}
