//! Shipping zones, provinces and cities.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::location::{Province, ShippingZone};
use iranmarket_core::{CityId, ProvinceId, ShippingZoneId};

use crate::db::locations::{CityInput, CityListing, ProvinceInput, ZoneInput};
use crate::db::{LocationAdminRepository, LocationRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::routes::context::PageContext;
use crate::routes::forms;
use crate::state::AppState;

fn on(flag: bool) -> Option<String> {
    flag.then(|| "on".to_owned())
}

// =============================================================================
// Shipping zones
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_shipping_cost: String,
    #[serde(default)]
    pub free_shipping_threshold: String,
    pub is_active: Option<String>,
    #[serde(default)]
    pub sort_order: String,
}

impl ZoneForm {
    fn blank() -> Self {
        Self {
            base_shipping_cost: "0".to_owned(),
            is_active: on(true),
            sort_order: "0".to_owned(),
            ..Self::default()
        }
    }

    fn from_zone(zone: &ShippingZone) -> Self {
        Self {
            name: zone.name.clone(),
            base_shipping_cost: zone.base_shipping_cost.amount().to_string(),
            free_shipping_threshold: zone
                .free_shipping_threshold
                .map(|t| t.amount().to_string())
                .unwrap_or_default(),
            is_active: on(zone.is_active),
            sort_order: zone.sort_order.to_string(),
        }
    }

    fn parse(&self) -> std::result::Result<ZoneInput, String> {
        Ok(ZoneInput {
            name: forms::required(&self.name, "نام منطقه")?,
            base_shipping_cost: forms::toman(&self.base_shipping_cost, "هزینه ارسال")?,
            free_shipping_threshold: forms::optional_toman(
                &self.free_shipping_threshold,
                "حد ارسال رایگان",
            )?,
            is_active: forms::checked(self.is_active.as_deref()),
            sort_order: forms::int_or(&self.sort_order, 0, "ترتیب")?,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "zones/list.html")]
pub struct ZoneListTemplate {
    pub ctx: PageContext,
    pub zones: Vec<ShippingZone>,
}

#[derive(Template, WebTemplate)]
#[template(path = "zones/form.html")]
pub struct ZoneFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: ZoneForm,
}

fn zone_page(ctx: PageContext, id: Option<ShippingZoneId>, form: ZoneForm) -> Response {
    ZoneFormTemplate {
        ctx,
        action: id.map_or_else(
            || "/shipping-zones/new".to_owned(),
            |id| format!("/shipping-zones/{id}/edit"),
        ),
        form,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn zones(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let zones = LocationRepository::new(state.pool()).zones().await?;
    Ok(ZoneListTemplate { ctx, zones })
}

pub async fn new_zone(ctx: PageContext) -> Response {
    zone_page(ctx, None, ZoneForm::blank())
}

#[instrument(skip(state, ctx))]
pub async fn edit_zone(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ShippingZoneId>,
) -> Result<Response> {
    let zone = LocationAdminRepository::new(state.pool())
        .zone(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shipping zone {id}")))?;
    Ok(zone_page(ctx, Some(id), ZoneForm::from_zone(&zone)))
}

async fn save_zone(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<ShippingZoneId>,
    form: ZoneForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return Ok(zone_page(ctx, id, form));
        }
    };

    let locations = LocationAdminRepository::new(state.pool());
    let id = match id {
        Some(id) => {
            locations.update_zone(id, &input).await?;
            id
        }
        None => locations.create_zone(&input).await?,
    };
    info!(zone_id = %id, "shipping zone saved");
    flash::success(session, format!("منطقه «{}» ذخیره شد.", input.name)).await;
    Ok(Redirect::to("/shipping-zones").into_response())
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_zone(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<ZoneForm>,
) -> Result<Response> {
    save_zone(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_zone(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<ShippingZoneId>,
    Form(form): Form<ZoneForm>,
) -> Result<Response> {
    save_zone(&state, &session, ctx, Some(id), form).await
}

// =============================================================================
// Provinces
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvinceForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub sort_order: String,
    pub is_active: Option<String>,
}

impl ProvinceForm {
    fn blank() -> Self {
        Self {
            sort_order: "0".to_owned(),
            is_active: on(true),
            ..Self::default()
        }
    }

    fn from_province(province: &Province) -> Self {
        Self {
            name: province.name.clone(),
            slug: province.slug.clone(),
            sort_order: province.sort_order.to_string(),
            is_active: on(province.is_active),
        }
    }

    fn parse(&self) -> std::result::Result<ProvinceInput, String> {
        Ok(ProvinceInput {
            name: forms::required(&self.name, "نام استان")?,
            slug: self.slug.trim().to_owned(),
            sort_order: forms::int_or(&self.sort_order, 0, "ترتیب")?,
            is_active: forms::checked(self.is_active.as_deref()),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "provinces/list.html")]
pub struct ProvinceListTemplate {
    pub ctx: PageContext,
    pub provinces: Vec<Province>,
}

#[derive(Template, WebTemplate)]
#[template(path = "provinces/form.html")]
pub struct ProvinceFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: ProvinceForm,
}

fn province_page(ctx: PageContext, id: Option<ProvinceId>, form: ProvinceForm) -> Response {
    ProvinceFormTemplate {
        ctx,
        action: id.map_or_else(
            || "/provinces/new".to_owned(),
            |id| format!("/provinces/{id}/edit"),
        ),
        form,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn provinces(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let provinces = LocationRepository::new(state.pool()).provinces().await?;
    Ok(ProvinceListTemplate { ctx, provinces })
}

pub async fn new_province(ctx: PageContext) -> Response {
    province_page(ctx, None, ProvinceForm::blank())
}

#[instrument(skip(state, ctx))]
pub async fn edit_province(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ProvinceId>,
) -> Result<Response> {
    let province = LocationAdminRepository::new(state.pool())
        .province(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("province {id}")))?;
    Ok(province_page(ctx, Some(id), ProvinceForm::from_province(&province)))
}

async fn save_province(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<ProvinceId>,
    form: ProvinceForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return Ok(province_page(ctx, id, form));
        }
    };

    let locations = LocationAdminRepository::new(state.pool());
    let saved = match id {
        Some(id) => locations.update_province(id, &input).await.map(|()| id),
        None => locations.create_province(&input).await,
    };
    match saved {
        Ok(id) => {
            info!(province_id = %id, "province saved");
            flash::success(session, format!("استان «{}» ذخیره شد.", input.name)).await;
            Ok(Redirect::to("/provinces").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error("استانی با این نام یا نامک وجود دارد.");
            Ok(province_page(ctx, id, form))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_province(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<ProvinceForm>,
) -> Result<Response> {
    save_province(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_province(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<ProvinceId>,
    Form(form): Form<ProvinceForm>,
) -> Result<Response> {
    save_province(&state, &session, ctx, Some(id), form).await
}

// =============================================================================
// Cities
// =============================================================================

/// `?province=3`.
#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub province: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityForm {
    #[serde(default)]
    pub province_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub sort_order: String,
    pub is_active: Option<String>,
    pub is_popular: Option<String>,
    pub delivery_available: Option<String>,
    #[serde(default)]
    pub shipping_zone_id: String,
}

impl CityForm {
    fn blank(province_id: Option<ProvinceId>) -> Self {
        Self {
            province_id: province_id.map(|id| id.to_string()).unwrap_or_default(),
            sort_order: "0".to_owned(),
            is_active: on(true),
            delivery_available: on(true),
            ..Self::default()
        }
    }

    fn from_listing(listing: &CityListing) -> Self {
        let city = &listing.city;
        Self {
            province_id: city.province_id.to_string(),
            name: city.name.clone(),
            slug: city.slug.clone(),
            sort_order: city.sort_order.to_string(),
            is_active: on(city.is_active),
            is_popular: on(city.is_popular),
            delivery_available: on(city.delivery_available),
            shipping_zone_id: city
                .shipping_zone_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    fn parse(&self) -> std::result::Result<CityInput, String> {
        Ok(CityInput {
            province_id: forms::optional_id(&self.province_id)
                .map(ProvinceId::new)
                .ok_or_else(|| "استان را انتخاب کنید.".to_owned())?,
            name: forms::required(&self.name, "نام شهر")?,
            slug: self.slug.trim().to_owned(),
            sort_order: forms::int_or(&self.sort_order, 0, "ترتیب")?,
            is_active: forms::checked(self.is_active.as_deref()),
            is_popular: forms::checked(self.is_popular.as_deref()),
            delivery_available: forms::checked(self.delivery_available.as_deref()),
            shipping_zone_id: forms::optional_id(&self.shipping_zone_id).map(ShippingZoneId::new),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "cities/list.html")]
pub struct CityListTemplate {
    pub ctx: PageContext,
    pub cities: Vec<CityListing>,
    pub provinces: Vec<Province>,
    pub selected_province: Option<ProvinceId>,
    pub new_href: String,
}

impl CityListTemplate {
    fn is_selected(&self, province: &Province) -> bool {
        self.selected_province == Some(province.id)
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "cities/form.html")]
pub struct CityFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: CityForm,
    pub provinces: Vec<Province>,
    pub zones: Vec<ShippingZone>,
}

async fn city_page(
    state: &AppState,
    ctx: PageContext,
    id: Option<CityId>,
    form: CityForm,
) -> Result<Response> {
    let locations = LocationRepository::new(state.pool());
    Ok(CityFormTemplate {
        ctx,
        action: id.map_or_else(|| "/cities/new".to_owned(), |id| format!("/cities/{id}/edit")),
        form,
        provinces: locations.provinces().await?,
        zones: locations.zones().await?,
    }
    .into_response())
}

/// Cities, optionally of one province.
#[instrument(skip(state, ctx))]
pub async fn cities(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CityQuery>,
) -> Result<impl IntoResponse> {
    let selected_province = forms::optional_id(&query.province).map(ProvinceId::new);
    let cities = LocationAdminRepository::new(state.pool())
        .cities(selected_province)
        .await?;
    let provinces = LocationRepository::new(state.pool()).provinces().await?;

    Ok(CityListTemplate {
        ctx,
        cities,
        provinces,
        selected_province,
        new_href: selected_province.map_or_else(
            || "/cities/new".to_owned(),
            |id| format!("/cities/new?province={id}"),
        ),
    })
}

#[instrument(skip(state, ctx))]
pub async fn new_city(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CityQuery>,
) -> Result<Response> {
    let province = forms::optional_id(&query.province).map(ProvinceId::new);
    city_page(&state, ctx, None, CityForm::blank(province)).await
}

#[instrument(skip(state, ctx))]
pub async fn edit_city(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<CityId>,
) -> Result<Response> {
    let listing = LocationAdminRepository::new(state.pool())
        .city(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("city {id}")))?;
    city_page(&state, ctx, Some(id), CityForm::from_listing(&listing)).await
}

async fn save_city(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<CityId>,
    form: CityForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return city_page(state, ctx, id, form).await;
        }
    };

    let locations = LocationAdminRepository::new(state.pool());
    let saved = match id {
        Some(id) => locations.update_city(id, &input).await.map(|()| id),
        None => locations.create_city(&input).await,
    };
    match saved {
        Ok(id) => {
            info!(city_id = %id, "city saved");
            flash::success(session, format!("شهر «{}» ذخیره شد.", input.name)).await;
            Ok(Redirect::to(&format!("/cities?province={}", input.province_id)).into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error("این شهر در این استان یا این نامک قبلا ثبت شده است.");
            city_page(state, ctx, id, form).await
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_city(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<CityForm>,
) -> Result<Response> {
    save_city(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_city(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<CityId>,
    Form(form): Form<CityForm>,
) -> Result<Response> {
    save_city(&state, &session, ctx, Some(id), form).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use iranmarket_core::Toman;

    use super::*;

    #[test]
    fn test_zone_threshold_is_optional() {
        let input = ZoneForm {
            name: "تهران".to_owned(),
            base_shipping_cost: "۳۵۰۰۰".to_owned(),
            ..ZoneForm::blank()
        }
        .parse()
        .unwrap();
        assert_eq!(input.base_shipping_cost, Toman::new(35_000));
        assert_eq!(input.free_shipping_threshold, None);
        assert!(input.is_active);
    }

    #[test]
    fn test_city_needs_province() {
        let form = CityForm {
            name: "کرج".to_owned(),
            ..CityForm::blank(None)
        };
        assert_eq!(form.parse().unwrap_err(), "استان را انتخاب کنید.");
    }

    #[test]
    fn test_city_form_parses() {
        let input = CityForm {
            name: "کرج".to_owned(),
            shipping_zone_id: "2".to_owned(),
            ..CityForm::blank(Some(ProvinceId::new(5)))
        }
        .parse()
        .unwrap();
        assert_eq!(input.province_id, ProvinceId::new(5));
        assert_eq!(input.shipping_zone_id, Some(ShippingZoneId::new(2)));
        assert!(input.delivery_available);
        assert!(!input.is_popular);
    }

    #[test]
    fn test_province_requires_name() {
        assert_eq!(
            ProvinceForm::blank().parse().unwrap_err(),
            "نام استان الزامی است."
        );
    }
}
