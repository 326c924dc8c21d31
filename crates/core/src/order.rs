//! Order lifecycle rules.
//!
//! The functions here decide what a payment or cancellation should do; the
//! order repository (feature `postgres`) applies the plan inside a transaction
//! after locking the order and product rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CityId, CouponId, OrderId, OrderItemId, OrderStatus, ProductId, Toman, UserId};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city_id: Option<CityId>,
    /// Joined for display; `None` when the order has no city.
    pub city_name: Option<String>,
    pub shipping_cost: Toman,
    pub discount_amount: Toman,
    pub coupon_code: String,
    /// Amount payable, shipping included.
    pub total_price: Toman,
    pub payment_ref: String,
    pub gateway_tracking_code: String,
    pub status: OrderStatus,
    pub paid: bool,
    pub stock_deducted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn state(&self) -> OrderState {
        OrderState {
            status: self.status,
            paid: self.paid,
            stock_deducted: self.stock_deducted,
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Placement time in store-local time.
    #[must_use]
    pub fn created_local(&self) -> String {
        crate::tz::format_local(self.created_at)
    }
}

/// A line of a placed order with the product it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    /// Unit price captured at checkout.
    pub price: Toman,
    pub quantity: i32,
}

impl OrderLine {
    #[must_use]
    pub fn total(&self) -> Toman {
        self.price.times(i64::from(self.quantity))
    }
}

/// Who to tell about an order and what to tell them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotice {
    pub order_id: OrderId,
    pub customer_name: String,
    /// Profile email first, then the account email. `None` skips mail.
    pub email: Option<crate::types::Email>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Toman,
    pub status: OrderStatus,
    pub payment_ref: String,
}

/// Everything needed to insert an order and its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city_id: Option<CityId>,
    pub shipping_cost: Toman,
    pub discount_amount: Toman,
    pub coupon_id: Option<CouponId>,
    pub coupon_code: String,
    pub total_price: Toman,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub price: Toman,
    pub quantity: i32,
}

/// Staff order list filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub paid: Option<bool>,
    /// Order number, customer name or phone.
    pub query: Option<String>,
}

impl OrderFilter {
    /// The search term as an order number, when it is one.
    #[must_use]
    pub fn order_number(&self) -> Option<OrderId> {
        self.query
            .as_deref()
            .map(|q| q.trim().trim_start_matches('#'))
            .and_then(|q| q.parse::<i32>().ok())
            .map(OrderId::new)
    }
}

/// The mutable lifecycle fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub status: OrderStatus,
    pub paid: bool,
    pub stock_deducted: bool,
}

impl OrderState {
    /// A freshly placed order.
    #[must_use]
    pub const fn placed() -> Self {
        Self {
            status: OrderStatus::Pending,
            paid: false,
            stock_deducted: false,
        }
    }

    /// Stock may only move while the order has not left the warehouse.
    #[must_use]
    pub const fn can_modify_stock(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Customers can cancel unpaid orders that have not shipped.
    #[must_use]
    pub const fn customer_can_cancel(&self) -> bool {
        !self.paid && self.can_modify_stock()
    }
}

/// An order line together with the product's current stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub stock: i32,
}

/// New stock level for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub new_stock: i32,
}

/// Why a payment could not be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("موجودی کالای «{product_name}» کافی نیست.")]
    InsufficientStock { product_name: String },
}

/// What applying a payment will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPlan {
    /// Paid with stock already taken; nothing to do.
    AlreadyApplied,
    Apply {
        stock: Vec<StockChange>,
        next: OrderState,
    },
}

/// Plan a successful payment.
///
/// Every line must have enough stock before anything is deducted, so a
/// failure leaves the order and products untouched. Quantities for the same
/// product on several lines are deducted cumulatively.
///
/// # Errors
///
/// [`PaymentError::InsufficientStock`] naming the first product that runs out.
pub fn plan_payment(state: OrderState, lines: &[StockLine]) -> Result<PaymentPlan, PaymentError> {
    if state.paid && state.stock_deducted {
        return Ok(PaymentPlan::AlreadyApplied);
    }

    let mut stock: Vec<StockChange> = Vec::with_capacity(lines.len());
    if !state.stock_deducted {
        for line in lines {
            let available = stock
                .iter()
                .find(|c| c.product_id == line.product_id)
                .map_or(line.stock, |c| c.new_stock);
            if available < line.quantity {
                return Err(PaymentError::InsufficientStock {
                    product_name: line.product_name.clone(),
                });
            }
            let new_stock = (available - line.quantity).max(0);
            match stock.iter_mut().find(|c| c.product_id == line.product_id) {
                Some(change) => change.new_stock = new_stock,
                None => stock.push(StockChange {
                    product_id: line.product_id,
                    new_stock,
                }),
            }
        }
    }

    let status = if state.status == OrderStatus::Cancelled {
        OrderStatus::Cancelled
    } else {
        OrderStatus::Processing
    };
    Ok(PaymentPlan::Apply {
        stock,
        next: OrderState {
            status,
            paid: true,
            stock_deducted: true,
        },
    })
}

/// Who asked for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelBy {
    /// Staff may cancel any order that is not already cancelled.
    Staff,
    /// Customers may only cancel unpaid orders that have not shipped.
    Customer,
}

/// What cancelling an order will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationPlan {
    AlreadyCancelled,
    /// The requester may not cancel the order in its current state.
    NotAllowed,
    Cancel { restock: bool, next: OrderState },
}

/// Plan a cancellation. Stock is returned only if it was taken and the order
/// has not shipped.
///
/// Must be called on the locked state so the customer rule sees a payment
/// committed a moment earlier.
#[must_use]
pub const fn plan_cancellation(
    state: OrderState,
    restock: bool,
    by: CancelBy,
) -> CancellationPlan {
    if matches!(state.status, OrderStatus::Cancelled) {
        return CancellationPlan::AlreadyCancelled;
    }
    if matches!(by, CancelBy::Customer) && !state.customer_can_cancel() {
        return CancellationPlan::NotAllowed;
    }
    let restock = restock && state.stock_deducted && state.can_modify_stock();
    CancellationPlan::Cancel {
        restock,
        next: OrderState {
            status: OrderStatus::Cancelled,
            paid: false,
            stock_deducted: state.stock_deducted && !restock,
        },
    }
}

/// References issued by the built-in test gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRefs {
    pub payment_ref: String,
    pub tracking_code: String,
}

impl GatewayRefs {
    /// `TEST-XXXXXXXX` and `GW-XXXXXXXX` from fresh UUIDs.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            payment_ref: format!("TEST-{}", short_hex()),
            tracking_code: format!("GW-{}", short_hex()),
        }
    }
}

fn short_hex() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(id: i32, qty: i32, stock: i32) -> StockLine {
        StockLine {
            product_id: ProductId::new(id),
            product_name: format!("p{id}"),
            quantity: qty,
            stock,
        }
    }

    #[test]
    fn test_payment_deducts_stock_and_moves_to_processing() {
        let plan = plan_payment(OrderState::placed(), &[line(1, 2, 5), line(2, 1, 1)]).unwrap();
        let PaymentPlan::Apply { stock, next } = plan else {
            panic!("expected apply");
        };
        assert_eq!(
            stock,
            vec![
                StockChange {
                    product_id: ProductId::new(1),
                    new_stock: 3
                },
                StockChange {
                    product_id: ProductId::new(2),
                    new_stock: 0
                },
            ]
        );
        assert_eq!(next.status, OrderStatus::Processing);
        assert!(next.paid && next.stock_deducted);
    }

    #[test]
    fn test_second_payment_is_noop() {
        let paid = OrderState {
            status: OrderStatus::Processing,
            paid: true,
            stock_deducted: true,
        };
        assert_eq!(
            plan_payment(paid, &[line(1, 2, 5)]),
            Ok(PaymentPlan::AlreadyApplied)
        );
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = plan_payment(OrderState::placed(), &[line(1, 1, 9), line(2, 4, 3)]).unwrap_err();
        assert_eq!(
            err,
            PaymentError::InsufficientStock {
                product_name: "p2".to_owned()
            }
        );
    }

    #[test]
    fn test_repeated_product_lines_accumulate() {
        let err = plan_payment(OrderState::placed(), &[line(1, 3, 5), line(1, 3, 5)]).unwrap_err();
        assert!(matches!(err, PaymentError::InsufficientStock { .. }));
    }

    #[test]
    fn test_payment_on_cancelled_order_stays_cancelled() {
        let state = OrderState {
            status: OrderStatus::Cancelled,
            paid: false,
            stock_deducted: false,
        };
        let PaymentPlan::Apply { next, .. } = plan_payment(state, &[]).unwrap() else {
            panic!("expected apply");
        };
        assert_eq!(next.status, OrderStatus::Cancelled);
        assert!(next.paid);
    }

    #[test]
    fn test_cancel_processing_order_restocks() {
        let state = OrderState {
            status: OrderStatus::Processing,
            paid: true,
            stock_deducted: true,
        };
        assert_eq!(
            plan_cancellation(state, true, CancelBy::Staff),
            CancellationPlan::Cancel {
                restock: true,
                next: OrderState {
                    status: OrderStatus::Cancelled,
                    paid: false,
                    stock_deducted: false,
                },
            }
        );
    }

    #[test]
    fn test_cancel_sent_order_keeps_stock() {
        let state = OrderState {
            status: OrderStatus::Sent,
            paid: true,
            stock_deducted: true,
        };
        let CancellationPlan::Cancel { restock, next } =
            plan_cancellation(state, true, CancelBy::Staff)
        else {
            panic!("expected cancel");
        };
        assert!(!restock);
        assert!(next.stock_deducted);
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let cancelled = OrderState {
            status: OrderStatus::Cancelled,
            paid: false,
            stock_deducted: false,
        };
        assert_eq!(
            plan_cancellation(cancelled, true, CancelBy::Staff),
            CancellationPlan::AlreadyCancelled
        );
    }

    #[test]
    fn test_customer_cannot_cancel_paid_order() {
        let paid = OrderState {
            status: OrderStatus::Processing,
            paid: true,
            stock_deducted: true,
        };
        assert_eq!(
            plan_cancellation(paid, true, CancelBy::Customer),
            CancellationPlan::NotAllowed
        );
        assert!(matches!(
            plan_cancellation(paid, true, CancelBy::Staff),
            CancellationPlan::Cancel { restock: true, .. }
        ));
    }

    #[test]
    fn test_customer_cannot_cancel_shipped_order() {
        let sent = OrderState {
            status: OrderStatus::Sent,
            paid: false,
            stock_deducted: false,
        };
        assert_eq!(
            plan_cancellation(sent, true, CancelBy::Customer),
            CancellationPlan::NotAllowed
        );
    }

    #[test]
    fn test_customer_cancels_unpaid_order() {
        assert_eq!(
            plan_cancellation(OrderState::placed(), true, CancelBy::Customer),
            CancellationPlan::Cancel {
                restock: false,
                next: OrderState {
                    status: OrderStatus::Cancelled,
                    paid: false,
                    stock_deducted: false,
                },
            }
        );
    }

    #[test]
    fn test_customer_can_cancel() {
        assert!(OrderState::placed().customer_can_cancel());
        let paid = OrderState {
            paid: true,
            ..OrderState::placed()
        };
        assert!(!paid.customer_can_cancel());
    }

    #[test]
    fn test_gateway_refs_shape() {
        let refs = GatewayRefs::generate();
        assert!(refs.payment_ref.starts_with("TEST-"));
        assert_eq!(refs.payment_ref.len(), 13);
        assert!(refs.tracking_code.starts_with("GW-"));
        assert!(
            refs.tracking_code[3..]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_order_filter_number() {
        let filter = |q: &str| OrderFilter {
            query: Some(q.to_owned()),
            ..OrderFilter::default()
        };
        assert_eq!(filter(" #1024 ").order_number(), Some(OrderId::new(1024)));
        assert_eq!(filter("09121234567").order_number(), None);
        assert_eq!(filter("رضایی").order_number(), None);
        assert_eq!(OrderFilter::default().order_number(), None);
    }
}
