//! Checkout: delivery details, coupon and order placement.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::checkout::CheckoutSummary;
use iranmarket_core::coupon::{CouponContext, CouponError};
use iranmarket_core::order::{NewOrder, NewOrderItem};
use iranmarket_core::{CouponId, Toman};

use crate::cart;
use crate::db::OrderRepository;
use crate::db::addresses::AddressRepository;
use crate::db::coupons::CouponRepository;
use crate::db::customers::UserRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::flash;
use crate::models::CurrentUser;
use crate::routes::context::PageContext;
use crate::services::orders::remember_placed;
use crate::services::pricing::{PricedCart, price_cart, shipping_for};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coupon_code: String,
}

impl CheckoutForm {
    /// Trim every field.
    #[must_use]
    pub fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            coupon_code: self.coupon_code.trim().to_owned(),
        }
    }

    /// Name, phone and address are required.
    #[must_use]
    pub fn missing_required(&self) -> bool {
        [&self.first_name, &self.last_name, &self.phone, &self.address]
            .iter()
            .any(|field| field.is_empty())
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: PricedCart,
    pub form: CheckoutForm,
    pub summary: CheckoutSummary,
}

/// A coupon that passed every rule for this cart.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AppliedCoupon {
    id: CouponId,
    code: String,
    discount: Toman,
}

async fn apply_coupon(
    state: &AppState,
    raw_code: &str,
    items_total: Toman,
    user: Option<&CurrentUser>,
) -> Result<std::result::Result<AppliedCoupon, CouponError>> {
    let Some(coupon) = CouponRepository::new(state.pool())
        .find_by_code(raw_code)
        .await?
    else {
        return Ok(Err(CouponError::Invalid));
    };

    let customer_has_paid_order = match user {
        Some(user) => Some(
            OrderRepository::new(state.pool())
                .has_paid_order(user.id)
                .await?,
        ),
        None => None,
    };

    Ok(coupon
        .rules
        .apply(CouponContext {
            now: Utc::now(),
            items_total,
            customer_has_paid_order,
        })
        .map(|discount| AppliedCoupon {
            id: coupon.id,
            code: coupon.code,
            discount,
        }))
}

/// Prefill the form from the customer's profile and default address.
async fn prefilled_form(state: &AppState, user: Option<&CurrentUser>) -> Result<CheckoutForm> {
    let Some(user) = user else {
        return Ok(CheckoutForm::default());
    };
    let users = UserRepository::new(state.pool());
    let Some(account) = users.get(user.id).await? else {
        return Ok(CheckoutForm::default());
    };
    let profile = users.profile(&account).await?;
    let (first_name, last_name) = split_full_name(&profile.full_name);
    let address = AddressRepository::new(state.pool())
        .list(user.id)
        .await?
        .into_iter()
        .next()
        .map(|a| a.one_line())
        .unwrap_or_default();

    Ok(CheckoutForm {
        first_name,
        last_name,
        phone: profile.phone,
        address,
        coupon_code: String::new(),
    })
}

/// "First Last Parts" becomes ("First", "Last Parts").
fn split_full_name(full_name: &str) -> (String, String) {
    let full_name = full_name.trim();
    match full_name.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_owned(), last.trim().to_owned()),
        None => (full_name.to_owned(), String::new()),
    }
}

async fn priced_or_redirect(
    state: &AppState,
    session: &Session,
) -> Result<std::result::Result<PricedCart, Redirect>> {
    let mut stored = cart::load(session).await;
    let (priced, dropped) = price_cart(state.pool(), &mut stored).await?;
    if dropped {
        cart::save(session, &stored).await?;
    }
    if priced.is_empty() {
        flash::error(session, "سبد خرید شما خالی است.").await;
        return Ok(Err(Redirect::to("/cart/")));
    }
    Ok(Ok(priced))
}

/// Display the checkout form.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    let priced = match priced_or_redirect(&state, &session).await? {
        Ok(priced) => priced,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let shipping = shipping_for(ctx.current_city.as_ref(), priced.items_total);
    let summary = CheckoutSummary::compute(priced.items_total, Toman::ZERO, shipping);
    let form = prefilled_form(&state, ctx.user.as_ref()).await?;

    Ok(CheckoutTemplate {
        ctx,
        cart: priced,
        form,
        summary,
    }
    .into_response())
}

/// Validate the form and coupon, then place the order.
#[instrument(skip(state, session, ctx, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let priced = match priced_or_redirect(&state, &session).await? {
        Ok(priced) => priced,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let form = form.trimmed();
    let items_total = priced.items_total;
    let shipping = shipping_for(ctx.current_city.as_ref(), items_total);

    let rerender = |mut ctx: PageContext, message: String, form: CheckoutForm, cart| {
        ctx.push_error(message);
        CheckoutTemplate {
            ctx,
            cart,
            form,
            summary: CheckoutSummary::compute(items_total, Toman::ZERO, shipping),
        }
        .into_response()
    };

    if form.missing_required() {
        let message = "لطفاً نام، نام خانوادگی، شماره تماس و آدرس را وارد کنید.".to_owned();
        return Ok(rerender(ctx, message, form, priced));
    }

    let coupon = if form.coupon_code.is_empty() {
        None
    } else {
        match apply_coupon(&state, &form.coupon_code, items_total, ctx.user.as_ref()).await? {
            Ok(applied) => Some(applied),
            Err(e) => return Ok(rerender(ctx, e.to_string(), form, priced)),
        }
    };

    let discount = coupon.as_ref().map_or(Toman::ZERO, |c| c.discount);
    let summary = CheckoutSummary::compute(items_total, discount, shipping);
    let new_order = NewOrder {
        user_id: ctx.user.as_ref().map(|u| u.id),
        first_name: form.first_name,
        last_name: form.last_name,
        phone: form.phone,
        address: form.address,
        city_id: ctx.current_city.as_ref().map(|c| c.city.id),
        shipping_cost: shipping,
        discount_amount: discount,
        coupon_id: coupon.as_ref().map(|c| c.id),
        coupon_code: coupon.map(|c| c.code).unwrap_or_default(),
        total_price: summary.payable,
        items: priced
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product.id,
                price: line.unit_price(),
                quantity: line.quantity(),
            })
            .collect(),
    };

    let orders = OrderRepository::new(state.pool());
    let order_id = orders.create(&new_order).await?;
    info!(order_id = %order_id, total = %summary.payable, "order placed");

    cart::clear(&session).await?;
    remember_placed(&session, order_id).await?;

    if let Some(notice) = orders.notice(order_id).await? {
        state.notifier().order_created(&notice).await;
    }

    flash::success(
        &session,
        "سفارش شما ثبت شد. اکنون می‌توانید پرداخت را انجام دهید.",
    )
    .await;
    Ok(Redirect::to(&format!("/payment/{order_id}/")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required() {
        let form = CheckoutForm {
            first_name: "علی".to_owned(),
            last_name: "رضایی".to_owned(),
            phone: "09121234567".to_owned(),
            address: "تهران، خیابان آزادی".to_owned(),
            coupon_code: String::new(),
        };
        assert!(!form.missing_required());

        let blank_phone = CheckoutForm {
            phone: "   ".to_owned(),
            ..form
        }
        .trimmed();
        assert!(blank_phone.missing_required());
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(
            split_full_name("علی  رضایی نژاد"),
            ("علی".to_owned(), "رضایی نژاد".to_owned())
        );
        assert_eq!(split_full_name(" علی "), ("علی".to_owned(), String::new()));
        assert_eq!(split_full_name(""), (String::new(), String::new()));
    }
}
