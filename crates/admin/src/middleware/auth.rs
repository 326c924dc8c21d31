//! Authentication extractors for admin.
//!
//! Every page requires a logged-in staff member. Handlers that change data
//! take [`RequireEditor`], which also turns viewers away.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires admin authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("سلام {}", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Rejection for the admin extractors.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Not logged in.
    RedirectToLogin,
    /// No session layer in front of the handler.
    Unauthorized,
    /// Logged in with a read-only role.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "دسترسی شما فقط برای مشاهده است",
            )
                .into_response(),
        }
    }
}

async fn session_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or(AdminAuthRejection::RedirectToLogin)
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_admin(parts).await.map(Self)
    }
}

/// Extractor that requires an admin allowed to change data.
///
/// Viewers get 403 Forbidden.
pub struct RequireEditor(pub CurrentAdmin);

impl RequireEditor {
    fn check(admin: CurrentAdmin) -> Result<Self, AdminAuthRejection> {
        if admin.can_write() {
            Ok(Self(admin))
        } else {
            Err(AdminAuthRejection::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for RequireEditor
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::check(session_admin(parts).await?)
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_admin(parts).await.ok()))
    }
}

/// Log an admin in: rotate the session id, then store the admin.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Log out and drop the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use iranmarket_core::{AdminRole, AdminUserId, Email};

    use super::*;

    fn admin(role: AdminRole) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new(1),
            email: Email::parse("ops@iranmarket.ir").unwrap(),
            name: "مریم".to_owned(),
            role,
        }
    }

    #[test]
    fn test_viewer_is_not_an_editor() {
        assert!(RequireEditor::check(admin(AdminRole::Admin)).is_ok());
        assert!(RequireEditor::check(admin(AdminRole::SuperAdmin)).is_ok());
        assert!(matches!(
            RequireEditor::check(admin(AdminRole::Viewer)),
            Err(AdminAuthRejection::Forbidden)
        ));
    }

    #[test]
    fn test_rejection_redirects_to_login() {
        let response = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }
}
