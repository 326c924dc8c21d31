//! Customer account route handlers.
//!
//! Everything here requires a logged-in customer; [`RequireAuth`] sends
//! guests to the login page with a `next` back to the requested path.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::order::{Order, OrderLine};
use iranmarket_core::{AddressId, OrderId, ProductId, Toman};

use crate::db::addresses::{AddressInput, AddressRepository};
use crate::db::catalog::CatalogRepository;
use crate::db::customers::{NotificationPrefs, ProfileUpdate, UserRepository};
use crate::db::tickets::TicketRepository;
use crate::db::wishlist::WishlistRepository;
use crate::db::{CancelOutcome, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::flash::{self, FlashLevel};
use crate::middleware::RequireAuth;
use crate::models::{Address, CurrentUser, Profile, Ticket, WishlistEntry};
use crate::routes::context::PageContext;
use crate::state::AppState;

/// Label given to addresses saved without one.
const UNNAMED_ADDRESS: &str = "آدرس بدون نام";

/// Window for the dashboard's spend total.
const SPEND_WINDOW_DAYS: i64 = 30;

const NOT_CANCELLABLE: &str =
    "امکان لغو این سفارش وجود ندارد (ممکن است قبلاً ارسال یا تحویل شده باشد).";

// =============================================================================
// Dashboard
// =============================================================================

/// Figures shown on the account dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub last_order: Option<Order>,
    /// Newest order still pending, processing or on its way.
    pub active_order: Option<Order>,
    pub total_orders: usize,
    /// Sum of all orders placed in the last 30 days, paid or not.
    pub spent_last_month: Toman,
}

impl DashboardSummary {
    /// Summarize a customer's orders, which may come in any order.
    #[must_use]
    pub fn from_orders(orders: &[Order], now: DateTime<Utc>) -> Self {
        let since = now - Duration::days(SPEND_WINDOW_DAYS);
        let newest = |filter: fn(&Order) -> bool| {
            orders
                .iter()
                .filter(|o| filter(o))
                .max_by_key(|o| o.created_at)
                .cloned()
        };

        Self {
            last_order: newest(|_| true),
            active_order: newest(|o| o.status.is_active()),
            total_orders: orders.len(),
            spent_last_month: orders
                .iter()
                .filter(|o| o.created_at >= since)
                .map(|o| o.total_price)
                .sum(),
        }
    }
}

/// Account dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "account/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub profile: Profile,
    pub summary: DashboardSummary,
}

/// Profile form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub profile: Profile,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub addresses: Vec<Address>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub orders: Vec<Order>,
}

/// Single order template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub can_cancel: bool,
}

/// Wishlist template.
#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub items: Vec<WishlistEntry>,
}

/// Notification settings template.
#[derive(Template, WebTemplate)]
#[template(path = "account/notifications.html")]
pub struct NotificationsTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub profile: Profile,
}

/// Support tickets template.
#[derive(Template, WebTemplate)]
#[template(path = "account/support.html")]
pub struct SupportTemplate {
    pub ctx: PageContext,
    pub active_tab: &'static str,
    pub tickets: Vec<Ticket>,
    pub subject: String,
    pub message: String,
}

/// The logged-in customer's profile. A session pointing at a deleted
/// account is treated as a missing page.
async fn load_profile(state: &AppState, user: &CurrentUser) -> Result<Profile> {
    let users = UserRepository::new(state.pool());
    let account = users
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", user.id)))?;
    Ok(users.profile(&account).await?)
}

/// Display the dashboard.
#[instrument(skip(state, user, ctx))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let profile = load_profile(&state, &user).await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(DashboardTemplate {
        ctx,
        active_tab: "dashboard",
        profile,
        summary: DashboardSummary::from_orders(&orders, Utc::now()),
    })
}

// =============================================================================
// Profile
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: Option<String>,
}

impl ProfileForm {
    /// Trimmed update; an unparseable birth date is left unset.
    #[must_use]
    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            date_of_birth: self
                .date_of_birth
                .as_deref()
                .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok()),
        }
    }
}

/// Display the profile form.
#[instrument(skip(state, user, ctx))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let profile = load_profile(&state, &user).await?;
    Ok(ProfileTemplate {
        ctx,
        active_tab: "profile",
        profile,
    })
}

/// Save the profile form and show it again.
#[instrument(skip(state, user, ctx, form))]
pub async fn profile_save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .update_profile(user.id, &form.into_update())
        .await?;
    let profile = load_profile(&state, &user).await?;

    ctx.push(FlashLevel::Success, "اطلاعات حساب با موفقیت ذخیره شد.");
    Ok(ProfileTemplate {
        ctx,
        active_tab: "profile",
        profile,
    })
}

// =============================================================================
// Addresses
// =============================================================================

/// Address form data. `addr_id` is set when editing.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    pub addr_id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub plaque: String,
    #[serde(default)]
    pub postal_code: String,
    pub is_default: Option<String>,
}

impl AddressForm {
    /// The address being edited, if any.
    #[must_use]
    pub fn address_id(&self) -> Option<AddressId> {
        self.addr_id
            .as_deref()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(AddressId::new)
    }

    /// Trimmed fields, with a placeholder label when none was given.
    #[must_use]
    pub fn to_input(&self) -> AddressInput {
        let label = self.label.trim();
        AddressInput {
            label: if label.is_empty() {
                UNNAMED_ADDRESS.to_owned()
            } else {
                label.to_owned()
            },
            city: self.city.trim().to_owned(),
            district: self.district.trim().to_owned(),
            street: self.street.trim().to_owned(),
            plaque: self.plaque.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            latitude: None,
            longitude: None,
            is_default: self.is_default.as_deref().is_some_and(|v| !v.is_empty()),
        }
    }
}

/// Display the address book.
#[instrument(skip(state, user, ctx))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(AddressesTemplate {
        ctx,
        active_tab: "addresses",
        addresses,
    })
}

/// Create or edit an address.
#[instrument(skip(state, session, user, form))]
pub async fn address_save(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let repo = AddressRepository::new(state.pool());
    let mut input = form.to_input();

    let id = form.address_id();
    if let Some(id) = id {
        // Map pins are set elsewhere; keep them across edits.
        let existing = repo
            .get(user.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;
        input.latitude = existing.latitude;
        input.longitude = existing.longitude;
    }
    repo.save(user.id, id, &input).await?;

    flash::success(&session, "آدرس ذخیره شد.").await;
    Ok(Redirect::to("/account/addresses/"))
}

/// Delete an address.
#[instrument(skip(state, session, user))]
pub async fn address_delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(address_id): Path<i32>,
) -> Result<Redirect> {
    AddressRepository::new(state.pool())
        .delete(user.id, AddressId::new(address_id))
        .await?;

    flash::info(&session, "آدرس حذف شد.").await;
    Ok(Redirect::to("/account/addresses/"))
}

/// Make an address the default.
#[instrument(skip(state, session, user))]
pub async fn address_set_default(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(address_id): Path<i32>,
) -> Result<Redirect> {
    AddressRepository::new(state.pool())
        .set_default(user.id, AddressId::new(address_id))
        .await?;

    flash::success(&session, "آدرس پیش‌فرض بروزرسانی شد.").await;
    Ok(Redirect::to("/account/addresses/"))
}

// =============================================================================
// Orders
// =============================================================================

/// One of the customer's own orders; other people's orders are a 404.
async fn own_order(state: &AppState, user: &CurrentUser, id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|order| order.user_id == Some(user.id))
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Display the order history.
#[instrument(skip(state, user, ctx))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(OrdersTemplate {
        ctx,
        active_tab: "orders",
        orders,
    })
}

/// Display one order.
#[instrument(skip(state, user, ctx))]
pub async fn order_detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order = own_order(&state, &user, OrderId::new(order_id)).await?;
    let lines = OrderRepository::new(state.pool()).lines(order.id).await?;
    let can_cancel = order.state().customer_can_cancel();

    Ok(OrderDetailTemplate {
        ctx,
        active_tab: "orders",
        order,
        lines,
        can_cancel,
    })
}

/// Cancel an unpaid order that has not shipped, returning any taken stock.
#[instrument(skip(state, session, user))]
pub async fn order_cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<i32>,
) -> Result<Redirect> {
    let order = own_order(&state, &user, OrderId::new(order_id)).await?;
    let detail = format!("/account/orders/{}/", order.id);

    if !order.state().customer_can_cancel() {
        flash::error(&session, NOT_CANCELLABLE).await;
        return Ok(Redirect::to(&detail));
    }

    let orders = OrderRepository::new(state.pool());
    match orders.cancel_unpaid(order.id).await? {
        CancelOutcome::Cancelled { restocked } => {
            info!(order_id = %order.id, restocked, "order cancelled by customer");
            if let Some(notice) = orders.notice(order.id).await? {
                state.notifier().order_status_changed(&notice).await;
            }
        }
        CancelOutcome::AlreadyCancelled => {}
        CancelOutcome::NotCancellable => {
            info!(order_id = %order.id, "customer cancel lost to a concurrent payment");
            flash::error(&session, NOT_CANCELLABLE).await;
            return Ok(Redirect::to(&detail));
        }
    }

    flash::success(&session, format!("سفارش شماره {} با موفقیت لغو شد.", order.id)).await;
    Ok(Redirect::to(&detail))
}

// =============================================================================
// Wishlist
// =============================================================================

/// Display the wishlist.
#[instrument(skip(state, user, ctx))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let items = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(WishlistTemplate {
        ctx,
        active_tab: "wishlist",
        items,
    })
}

/// Add a product and go back to it.
#[instrument(skip(state, session, user))]
pub async fn wishlist_add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Redirect> {
    let product = CatalogRepository::new(state.pool())
        .active_product(ProductId::new(product_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    WishlistRepository::new(state.pool())
        .add(user.id, product.id)
        .await?;

    flash::success(&session, "محصول به علاقه‌مندی‌ها اضافه شد.").await;
    Ok(Redirect::to(&format!(
        "/product/{}/",
        urlencoding::encode(&product.slug)
    )))
}

/// Remove a product from the wishlist.
#[instrument(skip(state, session, user))]
pub async fn wishlist_remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Redirect> {
    WishlistRepository::new(state.pool())
        .remove(user.id, ProductId::new(product_id))
        .await?;

    flash::info(&session, "محصول از علاقه‌مندی‌ها حذف شد.").await;
    Ok(Redirect::to("/account/wishlist/"))
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification switches; unchecked boxes are simply absent.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsForm {
    pub notify_order_sms: Option<String>,
    pub notify_promotions: Option<String>,
    pub notify_site_notifications: Option<String>,
}

impl NotificationsForm {
    #[must_use]
    pub fn prefs(&self) -> NotificationPrefs {
        let checked = |v: &Option<String>| v.as_deref().is_some_and(|v| !v.is_empty());
        NotificationPrefs {
            order_sms: checked(&self.notify_order_sms),
            promotions: checked(&self.notify_promotions),
            site_notifications: checked(&self.notify_site_notifications),
        }
    }
}

/// Display the notification settings.
#[instrument(skip(state, user, ctx))]
pub async fn notifications_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let profile = load_profile(&state, &user).await?;
    Ok(NotificationsTemplate {
        ctx,
        active_tab: "notifications",
        profile,
    })
}

/// Save the notification settings.
#[instrument(skip(state, user, ctx, form))]
pub async fn notifications_save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
    Form(form): Form<NotificationsForm>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .update_notifications(user.id, form.prefs())
        .await?;
    let profile = load_profile(&state, &user).await?;

    ctx.push(FlashLevel::Success, "تنظیمات اطلاع‌رسانی ذخیره شد.");
    Ok(NotificationsTemplate {
        ctx,
        active_tab: "notifications",
        profile,
    })
}

// =============================================================================
// Support
// =============================================================================

/// New ticket form data.
#[derive(Debug, Default, Deserialize)]
pub struct SupportForm {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Display the customer's tickets and the new ticket form.
#[instrument(skip(state, user, ctx))]
pub async fn support(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let tickets = TicketRepository::new(state.pool()).list(user.id).await?;
    Ok(SupportTemplate {
        ctx,
        active_tab: "support",
        tickets,
        subject: String::new(),
        message: String::new(),
    })
}

/// Open a ticket. Subject and message are both required.
#[instrument(skip(state, session, user, ctx, form))]
pub async fn support_submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
    Form(form): Form<SupportForm>,
) -> Result<Response> {
    let subject = form.subject.trim();
    let message = form.message.trim();
    let tickets = TicketRepository::new(state.pool());

    if subject.is_empty() || message.is_empty() {
        ctx.push_error("لطفاً موضوع و متن پیام را وارد کنید.");
        return Ok(SupportTemplate {
            ctx,
            active_tab: "support",
            tickets: tickets.list(user.id).await?,
            subject: subject.to_owned(),
            message: message.to_owned(),
        }
        .into_response());
    }

    let ticket_id = tickets.create(user.id, subject, message).await?;
    info!(ticket_id = %ticket_id, "support ticket opened");

    flash::success(&session, "درخواست شما ثبت شد. به زودی پاسخ داده می‌شود.").await;
    Ok(Redirect::to("/account/support/").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use iranmarket_core::{OrderStatus, UserId};

    use super::*;

    fn order(id: i32, status: OrderStatus, days_ago: i64, total: i64, now: DateTime<Utc>) -> Order {
        let created_at = now - Duration::days(days_ago);
        Order {
            id: OrderId::new(id),
            user_id: Some(UserId::new(1)),
            first_name: "علی".to_owned(),
            last_name: "رضایی".to_owned(),
            phone: "09121234567".to_owned(),
            address: "تهران".to_owned(),
            city_id: None,
            city_name: None,
            shipping_cost: Toman::ZERO,
            discount_amount: Toman::ZERO,
            coupon_code: String::new(),
            total_price: Toman::new(total),
            payment_ref: String::new(),
            gateway_tracking_code: String::new(),
            status,
            paid: false,
            stock_deducted: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_dashboard_summary() {
        let now = Utc::now();
        let orders = vec![
            order(3, OrderStatus::Delivered, 1, 100_000, now),
            order(2, OrderStatus::Sent, 10, 50_000, now),
            order(1, OrderStatus::Pending, 45, 70_000, now),
        ];

        let summary = DashboardSummary::from_orders(&orders, now);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.last_order.unwrap().id, OrderId::new(3));
        assert_eq!(summary.active_order.unwrap().id, OrderId::new(2));
        assert_eq!(summary.spent_last_month, Toman::new(150_000));
    }

    #[test]
    fn test_dashboard_summary_without_orders() {
        let summary = DashboardSummary::from_orders(&[], Utc::now());
        assert_eq!(summary.total_orders, 0);
        assert!(summary.last_order.is_none());
        assert!(summary.active_order.is_none());
        assert_eq!(summary.spent_last_month, Toman::ZERO);
    }

    #[test]
    fn test_address_form_defaults_label() {
        let form = AddressForm {
            label: "  ".to_owned(),
            city: " تهران ".to_owned(),
            is_default: Some("on".to_owned()),
            ..AddressForm::default()
        };
        let input = form.to_input();
        assert_eq!(input.label, UNNAMED_ADDRESS);
        assert_eq!(input.city, "تهران");
        assert!(input.is_default);
        assert!(form.address_id().is_none());
    }

    #[test]
    fn test_address_form_id() {
        let form = AddressForm {
            addr_id: Some("12".to_owned()),
            ..AddressForm::default()
        };
        assert_eq!(form.address_id(), Some(AddressId::new(12)));
    }

    #[test]
    fn test_notification_checkboxes() {
        let form = NotificationsForm {
            notify_order_sms: Some("on".to_owned()),
            ..NotificationsForm::default()
        };
        let prefs = form.prefs();
        assert!(prefs.order_sms);
        assert!(!prefs.promotions);
        assert!(!prefs.site_notifications);
    }

    #[test]
    fn test_profile_form_ignores_bad_date() {
        let update = ProfileForm {
            full_name: " مریم احمدی ".to_owned(),
            email: String::new(),
            date_of_birth: Some("1370/01/01".to_owned()),
        }
        .into_update();
        assert_eq!(update.full_name, "مریم احمدی");
        assert!(update.date_of_birth.is_none());

        let update = ProfileForm {
            full_name: String::new(),
            email: String::new(),
            date_of_birth: Some("1991-03-21".to_owned()),
        }
        .into_update();
        assert_eq!(update.date_of_birth, NaiveDate::from_ymd_opt(1991, 3, 21));
    }
}
