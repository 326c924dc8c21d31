//! Banners and coupons.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::coupon::{CouponDefinition, CouponRules};
use iranmarket_core::{BannerId, BannerPosition, CouponId, Toman};

use crate::db::{PromotionRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::models::{Banner, BannerInput, Coupon};
use crate::routes::context::PageContext;
use crate::routes::forms;
use crate::state::AppState;

// =============================================================================
// Banners
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default)]
    pub position: String,
    pub is_active: Option<String>,
    #[serde(default)]
    pub sort_order: String,
}

impl BannerForm {
    fn blank() -> Self {
        Self {
            position: BannerPosition::Hero.as_str().to_owned(),
            is_active: Some("on".to_owned()),
            sort_order: "0".to_owned(),
            ..Self::default()
        }
    }

    fn from_banner(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone(),
            image: banner.image.clone(),
            link_url: banner.link_url.clone(),
            position: banner.position.as_str().to_owned(),
            is_active: banner.is_active.then(|| "on".to_owned()),
            sort_order: banner.sort_order.to_string(),
        }
    }

    fn parse(&self) -> std::result::Result<BannerInput, String> {
        Ok(BannerInput {
            title: self.title.trim().to_owned(),
            subtitle: self.subtitle.trim().to_owned(),
            image: forms::required(&self.image, "تصویر بنر")?,
            link_url: self.link_url.trim().to_owned(),
            position: self
                .position
                .parse::<BannerPosition>()
                .map_err(|_| "جایگاه بنر معتبر نیست.".to_owned())?,
            is_active: forms::checked(self.is_active.as_deref()),
            sort_order: forms::int_or(&self.sort_order, 0, "ترتیب")?,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/list.html")]
pub struct BannerListTemplate {
    pub ctx: PageContext,
    pub banners: Vec<Banner>,
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/form.html")]
pub struct BannerFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: BannerForm,
    pub positions: &'static [BannerPosition],
}

fn banner_page(ctx: PageContext, id: Option<BannerId>, form: BannerForm) -> Response {
    BannerFormTemplate {
        ctx,
        action: id.map_or_else(|| "/banners/new".to_owned(), |id| format!("/banners/{id}/edit")),
        form,
        positions: BannerPosition::ALL,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn banners(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let banners = PromotionRepository::new(state.pool()).banners().await?;
    Ok(BannerListTemplate { ctx, banners })
}

pub async fn new_banner(ctx: PageContext) -> Response {
    banner_page(ctx, None, BannerForm::blank())
}

#[instrument(skip(state, ctx))]
pub async fn edit_banner(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    let banner = PromotionRepository::new(state.pool())
        .banner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("banner {id}")))?;
    Ok(banner_page(ctx, Some(id), BannerForm::from_banner(&banner)))
}

async fn save_banner(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<BannerId>,
    form: BannerForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return Ok(banner_page(ctx, id, form));
        }
    };

    let promotions = PromotionRepository::new(state.pool());
    let id = match id {
        Some(id) => {
            promotions.update_banner(id, &input).await?;
            id
        }
        None => promotions.create_banner(&input).await?,
    };
    info!(banner_id = %id, "banner saved");
    flash::success(session, "بنر ذخیره شد.").await;
    Ok(Redirect::to("/banners").into_response())
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_banner(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    save_banner(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_banner(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<BannerId>,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    save_banner(&state, &session, ctx, Some(id), form).await
}

#[instrument(skip(state, session))]
pub async fn delete_banner(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    Path(id): Path<BannerId>,
) -> Result<Redirect> {
    PromotionRepository::new(state.pool())
        .delete_banner(id)
        .await?;
    info!(banner_id = %id, "banner deleted");
    flash::success(&session, "بنر حذف شد.").await;
    Ok(Redirect::to("/banners"))
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount_percent: String,
    #[serde(default)]
    pub discount_amount: String,
    #[serde(default)]
    pub min_order_amount: String,
    pub active: Option<String>,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_to: String,
    pub for_first_order_only: Option<String>,
}

impl CouponForm {
    /// Active for a month from now.
    fn blank() -> Self {
        let now = Utc::now();
        Self {
            min_order_amount: "0".to_owned(),
            active: Some("on".to_owned()),
            valid_from: forms::datetime_input(now),
            valid_to: forms::datetime_input(now + Duration::days(30)),
            ..Self::default()
        }
    }

    fn from_coupon(coupon: &Coupon) -> Self {
        let rules = &coupon.rules;
        Self {
            code: coupon.code.clone(),
            description: coupon.description.clone(),
            discount_percent: rules
                .discount_percent
                .map(|p| p.to_string())
                .unwrap_or_default(),
            discount_amount: rules
                .discount_amount
                .map(|a| a.amount().to_string())
                .unwrap_or_default(),
            min_order_amount: rules.min_order_amount.amount().to_string(),
            active: rules.active.then(|| "on".to_owned()),
            valid_from: forms::datetime_input(rules.valid_from),
            valid_to: forms::datetime_input(rules.valid_to),
            for_first_order_only: rules.for_first_order_only.then(|| "on".to_owned()),
        }
    }

    /// Parse the fields, then apply the coupon's own rules.
    fn parse(&self) -> std::result::Result<CouponDefinition, String> {
        let discount_percent = match forms::normalize_number(&self.discount_percent).as_str() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .map_err(|_| "درصد تخفیف باید عدد باشد.".to_owned())?,
            ),
        };
        let rules = CouponRules {
            discount_percent,
            discount_amount: forms::optional_toman(&self.discount_amount, "مبلغ تخفیف")?,
            min_order_amount: forms::optional_toman(&self.min_order_amount, "حداقل مبلغ سفارش")?
                .unwrap_or(Toman::ZERO),
            active: forms::checked(self.active.as_deref()),
            valid_from: forms::local_datetime(&self.valid_from, "تاریخ شروع")?,
            valid_to: forms::local_datetime(&self.valid_to, "تاریخ پایان")?,
            for_first_order_only: forms::checked(self.for_first_order_only.as_deref()),
        };

        CouponDefinition {
            code: self.code.clone(),
            rules,
        }
        .validate()
        .map_err(|e| e.to_string())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/list.html")]
pub struct CouponListTemplate {
    pub ctx: PageContext,
    pub coupons: Vec<Coupon>,
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/form.html")]
pub struct CouponFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: CouponForm,
}

fn coupon_page(ctx: PageContext, id: Option<CouponId>, form: CouponForm) -> Response {
    CouponFormTemplate {
        ctx,
        action: id.map_or_else(|| "/coupons/new".to_owned(), |id| format!("/coupons/{id}/edit")),
        form,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn coupons(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let coupons = PromotionRepository::new(state.pool()).coupons().await?;
    Ok(CouponListTemplate { ctx, coupons })
}

pub async fn new_coupon(ctx: PageContext) -> Response {
    coupon_page(ctx, None, CouponForm::blank())
}

#[instrument(skip(state, ctx))]
pub async fn edit_coupon(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<CouponId>,
) -> Result<Response> {
    let coupon = PromotionRepository::new(state.pool())
        .coupon(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("coupon {id}")))?;
    Ok(coupon_page(ctx, Some(id), CouponForm::from_coupon(&coupon)))
}

async fn save_coupon(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<CouponId>,
    form: CouponForm,
) -> Result<Response> {
    let coupon = match form.parse() {
        Ok(coupon) => coupon,
        Err(message) => {
            ctx.push_error(message);
            return Ok(coupon_page(ctx, id, form));
        }
    };

    let promotions = PromotionRepository::new(state.pool());
    let description = form.description.trim();
    let saved = match id {
        Some(id) => promotions
            .update_coupon(id, &coupon, description)
            .await
            .map(|()| id),
        None => promotions.create_coupon(&coupon, description).await,
    };
    match saved {
        Ok(id) => {
            info!(coupon_id = %id, code = %coupon.code, "coupon saved");
            flash::success(session, format!("کد تخفیف {} ذخیره شد.", coupon.code)).await;
            Ok(Redirect::to("/coupons").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error("این کد تخفیف قبلا ثبت شده است.");
            Ok(coupon_page(ctx, id, form))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    save_coupon(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<CouponId>,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    save_coupon(&state, &session, ctx, Some(id), form).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn coupon_form() -> CouponForm {
        CouponForm {
            code: " norooz ".to_owned(),
            discount_percent: "۱۰".to_owned(),
            valid_from: "2025-03-20T00:00".to_owned(),
            valid_to: "2025-04-02T23:59".to_owned(),
            ..CouponForm::blank()
        }
    }

    #[test]
    fn test_coupon_form_parses() {
        let coupon = coupon_form().parse().unwrap();
        assert_eq!(coupon.rules.discount_percent, Some(10));
        assert_eq!(coupon.rules.discount_amount, None);
        assert_eq!(coupon.rules.min_order_amount, Toman::ZERO);
        assert!(coupon.rules.active);
    }

    #[test]
    fn test_coupon_needs_a_discount() {
        let form = CouponForm {
            discount_percent: String::new(),
            ..coupon_form()
        };
        assert_eq!(
            form.parse().unwrap_err(),
            "حداقل یکی از درصد یا مبلغ تخفیف باید مشخص شود."
        );
    }

    #[test]
    fn test_coupon_dates_must_be_ordered() {
        let form = CouponForm {
            valid_to: "2025-03-01T00:00".to_owned(),
            ..coupon_form()
        };
        assert_eq!(
            form.parse().unwrap_err(),
            "تاریخ پایان باید بعد از تاریخ شروع باشد."
        );
    }

    #[test]
    fn test_banner_requires_image_and_position() {
        assert_eq!(
            BannerForm::blank().parse().unwrap_err(),
            "تصویر بنر الزامی است."
        );
        let form = BannerForm {
            image: "banners/norooz.jpg".to_owned(),
            position: "sidebar".to_owned(),
            ..BannerForm::blank()
        };
        assert_eq!(form.parse().unwrap_err(), "جایگاه بنر معتبر نیست.");
    }
}
