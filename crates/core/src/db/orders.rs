//! Order persistence and the payment/cancellation transactions.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, like_pattern};
use crate::order::{
    CancelBy, CancellationPlan, GatewayRefs, NewOrder, Order, OrderFilter, OrderLine, OrderNotice, OrderState,
    PaymentPlan, StockLine, plan_cancellation, plan_payment,
};
use crate::types::{
    CityId, Email, OrderId, OrderItemId, OrderStatus, ProductId, Toman, UserId,
};

// =============================================================================
// Internal Row Types
// =============================================================================

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, o.first_name, o.last_name, o.phone, o.address,
           o.city_id, c.name AS city_name, o.shipping_cost, o.discount_amount,
           o.coupon_code, o.total_price, o.payment_ref, o.gateway_tracking_code,
           o.status, o.paid, o.stock_deducted, o.created_at, o.updated_at
    FROM shop.orders o
    LEFT JOIN shop.city c ON c.id = o.city_id
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    first_name: String,
    last_name: String,
    phone: String,
    address: String,
    city_id: Option<CityId>,
    city_name: Option<String>,
    shipping_cost: Toman,
    discount_amount: Toman,
    coupon_code: String,
    total_price: Toman,
    payment_ref: String,
    gateway_tracking_code: String,
    status: OrderStatus,
    paid: bool,
    stock_deducted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            address: row.address,
            city_id: row.city_id,
            city_name: row.city_name,
            shipping_cost: row.shipping_cost,
            discount_amount: row.discount_amount,
            coupon_code: row.coupon_code,
            total_price: row.total_price,
            payment_ref: row.payment_ref,
            gateway_tracking_code: row.gateway_tracking_code,
            status: row.status,
            paid: row.paid,
            stock_deducted: row.stock_deducted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderItemId,
    product_id: ProductId,
    product_name: String,
    product_slug: String,
    price: Toman,
    quantity: i32,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_slug: row.product_slug,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    status: OrderStatus,
    paid: bool,
    stock_deducted: bool,
}

impl From<StateRow> for OrderState {
    fn from(row: StateRow) -> Self {
        Self {
            status: row.status,
            paid: row.paid,
            stock_deducted: row.stock_deducted,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockLineRow {
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct NoticeRow {
    id: OrderId,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
    total_price: Toman,
    status: OrderStatus,
    payment_ref: String,
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of [`OrderRepository::apply_payment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Stock was deducted and the order marked paid.
    Applied,
    /// The order was already paid; nothing changed.
    AlreadyApplied,
}

/// Result of [`OrderRepository::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled { restocked: bool },
    AlreadyCancelled,
    /// The order was paid or shipped by the time the lock was taken.
    NotCancellable,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their lifecycle transitions.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO shop.orders
                (user_id, first_name, last_name, phone, address, city_id,
                 shipping_cost, discount_amount, coupon_id, coupon_code, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(order.user_id)
        .bind(&order.first_name)
        .bind(&order.last_name)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(order.city_id)
        .bind(order.shipping_cost)
        .bind(order.discount_amount)
        .bind(order.coupon_id)
        .bind(&order.coupon_code)
        .bind(order.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, price, quantity)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(id)
            .bind(item.product_id)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(order_id = %id, items = order.items.len(), "order created");
        Ok(id)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Orders placed by a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Staff order list, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDER_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build_query_as::<OrderRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of orders matching a staff filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &OrderFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.orders o");
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Lines of an order with product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.id, oi.product_id, p.name AS product_name, p.slug AS product_slug,
                   oi.price, oi.quantity
            FROM shop.order_item oi
            JOIN shop.product p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether the customer has any paid order (for first-order coupons).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_paid_order(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.orders WHERE user_id = $1 AND paid)",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Mark an order paid and deduct stock, atomically.
    ///
    /// The order row and then its product rows (in id order) are locked for
    /// the duration of the transaction, so concurrent callbacks for the same
    /// order serialize and only the first one deducts stock.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist.
    /// - `RepositoryError::Payment` if any product lacks stock; nothing changes.
    /// - `RepositoryError::Database` on query failure.
    pub async fn apply_payment(&self, id: OrderId) -> Result<PaymentOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let state = lock_state(&mut tx, id).await?;
        let lines: Vec<StockLine> = sqlx::query_as::<_, StockLineRow>(
            r"
            SELECT oi.product_id, p.name AS product_name, oi.quantity, p.stock
            FROM shop.order_item oi
            JOIN shop.product p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.product_id, oi.id
            FOR UPDATE OF p
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| StockLine {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            stock: row.stock,
        })
        .collect();

        let (stock, next) = match plan_payment(state, &lines)? {
            PaymentPlan::AlreadyApplied => return Ok(PaymentOutcome::AlreadyApplied),
            PaymentPlan::Apply { stock, next } => (stock, next),
        };

        for change in &stock {
            sqlx::query("UPDATE shop.product SET stock = $2, updated_at = NOW() WHERE id = $1")
                .bind(change.product_id)
                .bind(change.new_stock)
                .execute(&mut *tx)
                .await?;
        }
        write_state(&mut tx, id, next).await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, products = stock.len(), "payment applied");
        Ok(PaymentOutcome::Applied)
    }

    /// Store the gateway references after a successful payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_refs(
        &self,
        id: OrderId,
        refs: &GatewayRefs,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.orders
            SET payment_ref = $2, gateway_tracking_code = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&refs.payment_ref)
        .bind(&refs.tracking_code)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Cancel an order, returning deducted stock when `restock` is set and the
    /// order has not shipped yet. Cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist.
    /// - `RepositoryError::Database` on query failure.
    pub async fn cancel(&self, id: OrderId, restock: bool) -> Result<CancelOutcome, RepositoryError> {
        self.cancel_as(id, restock, CancelBy::Staff).await
    }

    /// Customer cancellation: only unpaid orders that have not shipped, checked
    /// on the locked row. Taken stock is returned.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist.
    /// - `RepositoryError::Database` on query failure.
    pub async fn cancel_unpaid(&self, id: OrderId) -> Result<CancelOutcome, RepositoryError> {
        self.cancel_as(id, true, CancelBy::Customer).await
    }

    async fn cancel_as(
        &self,
        id: OrderId,
        restock: bool,
        by: CancelBy,
    ) -> Result<CancelOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let state = lock_state(&mut tx, id).await?;
        let (restocked, next) = match plan_cancellation(state, restock, by) {
            CancellationPlan::AlreadyCancelled => return Ok(CancelOutcome::AlreadyCancelled),
            CancellationPlan::NotAllowed => return Ok(CancelOutcome::NotCancellable),
            CancellationPlan::Cancel { restock, next } => (restock, next),
        };

        if restocked {
            sqlx::query(
                r"
                UPDATE shop.product p
                SET stock = p.stock + oi.quantity, updated_at = NOW()
                FROM (
                    SELECT product_id, SUM(quantity)::INT AS quantity
                    FROM shop.order_item
                    WHERE order_id = $1
                    GROUP BY product_id
                ) oi
                WHERE p.id = oi.product_id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        write_state(&mut tx, id, next).await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, restocked, "order cancelled");
        Ok(CancelOutcome::Cancelled { restocked })
    }

    /// Mark an order as handed to the courier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn mark_sent(&self, id: OrderId) -> Result<(), RepositoryError> {
        self.set_status(id, OrderStatus::Sent).await
    }

    /// Mark an order as delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<(), RepositoryError> {
        self.set_status(id, OrderStatus::Delivered).await
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(order_id = %id, %status, "order status changed");
        Ok(())
    }

    /// Contact details for order emails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn notice(&self, id: OrderId) -> Result<Option<OrderNotice>, RepositoryError> {
        let row = sqlx::query_as::<_, NoticeRow>(
            r"
            SELECT o.id, o.first_name, o.last_name, o.phone,
                   COALESCE(NULLIF(up.email, ''), u.email) AS email,
                   o.created_at, o.total_price, o.status, o.payment_ref
            FROM shop.orders o
            LEFT JOIN shop.user_account u ON u.id = o.user_id
            LEFT JOIN shop.user_profile up ON up.user_id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| OrderNotice {
            order_id: row.id,
            customer_name: format!("{} {}", row.first_name, row.last_name)
                .trim()
                .to_owned(),
            email: row.email.as_deref().and_then(|e| Email::parse(e).ok()),
            phone: row.phone,
            created_at: row.created_at,
            total_price: row.total_price,
            status: row.status,
            payment_ref: row.payment_ref,
        }))
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(paid) = filter.paid {
        qb.push(" AND o.paid = ").push_bind(paid);
    }
    if let Some(term) = filter.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        qb.push(" AND (o.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.phone ILIKE ")
            .push_bind(pattern);
        if let Some(id) = filter.order_number() {
            qb.push(" OR o.id = ").push_bind(id);
        }
        qb.push(")");
    }
}

async fn lock_state(conn: &mut PgConnection, id: OrderId) -> Result<OrderState, RepositoryError> {
    let row = sqlx::query_as::<_, StateRow>(
        "SELECT status, paid, stock_deducted FROM shop.orders WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;
    Ok(row.into())
}

async fn write_state(
    conn: &mut PgConnection,
    id: OrderId,
    state: OrderState,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.orders
        SET status = $2, paid = $3, stock_deducted = $4, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(state.status)
    .bind(state.paid)
    .bind(state.stock_deducted)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(filter: &OrderFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.orders o");
        push_filter(&mut qb, filter);
        qb.sql().to_owned()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(sql(&OrderFilter::default()).ends_with(" WHERE TRUE"));
    }

    #[test]
    fn test_numeric_query_also_matches_order_id() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Sent),
            paid: Some(true),
            query: Some("42".to_owned()),
        };
        let sql = sql(&filter);
        assert!(sql.contains("o.status = $1"));
        assert!(sql.contains("o.paid = $2"));
        assert!(sql.contains("o.phone ILIKE $5"));
        assert!(sql.contains("o.id = $6"));
    }

    #[test]
    fn test_text_query_skips_order_id() {
        let filter = OrderFilter {
            query: Some("رضایی".to_owned()),
            ..OrderFilter::default()
        };
        assert!(!sql(&filter).contains("o.id ="));
    }
}
