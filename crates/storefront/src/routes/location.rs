//! Delivery city picker.

use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use iranmarket_core::CityId;

use crate::db::LocationRepository;
use crate::db::customers::UserRepository;
use crate::error::Result;
use crate::middleware::{OptionalAuth, flash, safe_next};
use crate::models::session_keys;
use crate::state::AppState;

/// City picker form data.
#[derive(Debug, Deserialize)]
pub struct SetCityForm {
    pub city_id: Option<String>,
    pub next: Option<String>,
}

/// Remember the chosen city in the session and, for customers, the profile.
///
/// Only active cities with delivery can be chosen.
#[instrument(skip(state, session, user))]
pub async fn set_city(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<SetCityForm>,
) -> Result<Redirect> {
    let next = safe_next(form.next.as_deref()).to_owned();

    let Some(city_id) = form
        .city_id
        .as_deref()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .map(CityId::new)
    else {
        flash::error(&session, "لطفاً یک شهر را انتخاب کنید.").await;
        return Ok(Redirect::to(&next));
    };

    let city = LocationRepository::new(state.pool())
        .city_with_zone(city_id)
        .await?
        .filter(|c| c.city.is_active && c.city.delivery_available);
    let Some(city) = city else {
        flash::error(
            &session,
            "شهر انتخاب‌شده معتبر نیست یا فعلاً برای آن ارسال نداریم.",
        )
        .await;
        return Ok(Redirect::to(&next));
    };

    session
        .insert(session_keys::SELECTED_CITY_ID, city.city.id)
        .await?;
    if let Some(user) = user {
        UserRepository::new(state.pool())
            .set_current_city(user.id, city.city.id)
            .await?;
    }

    flash::success(&session, format!("شهر شما روی «{}» تنظیم شد.", city.city.name)).await;
    Ok(Redirect::to(&next))
}
