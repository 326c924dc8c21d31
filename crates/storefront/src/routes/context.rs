//! Data every storefront page renders in its header and footer.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use iranmarket_core::location::{CityWithZone, ProvinceWithCities};
use iranmarket_core::settings::SiteSettings;
use iranmarket_core::CityId;

use crate::cart;
use crate::db::LocationRepository;
use crate::db::customers::UserRepository;
use crate::error::AppError;
use crate::middleware::flash::{self, Flash, FlashLevel};
use crate::middleware::login_url;
use crate::models::{Category, CurrentUser, session_keys};
use crate::state::AppState;

/// Shared page context, extracted once per rendered page.
///
/// Extracting it drains the pending flash messages, so handlers that only
/// redirect should not ask for it.
pub struct PageContext {
    pub settings: SiteSettings,
    pub categories: Vec<Category>,
    pub provinces: Vec<ProvinceWithCities>,
    pub current_city: Option<CityWithZone>,
    pub cart_count: i64,
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    /// Request path; the `next` target of the city picker and login link.
    pub path: String,
}

impl PageContext {
    /// Show a message on the page being rendered now.
    pub fn push(&mut self, level: FlashLevel, text: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            text: text.into(),
        });
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push(FlashLevel::Error, text);
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Header label of the city picker.
    #[must_use]
    pub fn city_label(&self) -> String {
        self.current_city
            .as_ref()
            .map_or_else(|| "انتخاب شهر".to_owned(), CityWithZone::display_name)
    }

    #[must_use]
    pub fn is_current_city(&self, id: CityId) -> bool {
        self.current_city.as_ref().is_some_and(|c| c.city.id == id)
    }

    #[must_use]
    pub fn login_href(&self) -> String {
        login_url(&self.path)
    }
}

/// The delivery city for this request: the one picked in this session if it
/// is still active, else the one saved on the customer's profile.
///
/// # Errors
///
/// Returns `AppError::Database` if a lookup fails.
pub async fn current_city(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<Option<CityWithZone>, AppError> {
    let locations = LocationRepository::new(state.pool());

    let selected = session
        .get::<CityId>(session_keys::SELECTED_CITY_ID)
        .await
        .ok()
        .flatten();
    if let Some(id) = selected
        && let Some(city) = locations.city_with_zone(id).await?
        && city.city.is_active
    {
        return Ok(Some(city));
    }

    let Some(user) = user else {
        return Ok(None);
    };
    let Some(id) = UserRepository::new(state.pool())
        .current_city_id(user.id)
        .await?
    else {
        return Ok(None);
    };
    Ok(locations
        .city_with_zone(id)
        .await?
        .filter(|c| c.city.is_active))
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let cache = state.cache();
        let settings = cache.settings(state.pool()).await?;
        let categories = cache.categories(state.pool()).await?;
        let provinces = cache.provinces(state.pool()).await?;
        let current_city = current_city(state, &session, user.as_ref()).await?;
        let cart_count = cart::load(&session).await.count();
        let flashes = flash::take(&session).await;

        Ok(Self {
            settings,
            categories,
            provinces,
            current_city,
            cart_count,
            user,
            flashes,
            path: parts.uri.path().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use iranmarket_core::location::City;
    use iranmarket_core::{ProvinceId, UserId};

    use super::*;

    fn context(current_city: Option<CityWithZone>) -> PageContext {
        PageContext {
            settings: SiteSettings::default(),
            categories: Vec::new(),
            provinces: Vec::new(),
            current_city,
            cart_count: 0,
            user: None,
            flashes: Vec::new(),
            path: "/cart/".to_owned(),
        }
    }

    fn karaj() -> CityWithZone {
        CityWithZone {
            city: City {
                id: CityId::new(7),
                province_id: ProvinceId::new(2),
                name: "کرج".to_owned(),
                slug: "البرز-کرج".to_owned(),
                sort_order: 0,
                is_active: true,
                is_popular: true,
                delivery_available: true,
                shipping_zone_id: None,
            },
            province_name: "البرز".to_owned(),
            zone: None,
        }
    }

    #[test]
    fn test_city_label() {
        assert_eq!(context(None).city_label(), "انتخاب شهر");
        assert_eq!(context(Some(karaj())).city_label(), "کرج، البرز");
    }

    #[test]
    fn test_is_current_city() {
        let ctx = context(Some(karaj()));
        assert!(ctx.is_current_city(CityId::new(7)));
        assert!(!ctx.is_current_city(CityId::new(8)));
        assert!(!context(None).is_current_city(CityId::new(7)));
    }

    #[test]
    fn test_push_error_and_login_href() {
        let mut ctx = context(None);
        ctx.user = Some(CurrentUser {
            id: UserId::new(1),
            username: "09121234567".to_owned(),
        });
        ctx.push_error("خطا");
        assert_eq!(ctx.flashes.len(), 1);
        assert_eq!(ctx.flashes[0].level, FlashLevel::Error);
        assert!(ctx.is_logged_in());
        assert_eq!(ctx.login_href(), "/auth/login/?next=%2Fcart%2F");
    }
}
