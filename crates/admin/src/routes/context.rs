//! Data every admin page renders in its chrome.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::middleware::RequireAdminAuth;
use crate::middleware::flash::{self, Flash, FlashLevel};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Title shown in the header of every page.
pub const SITE_HEADER: &str = "مدیریت فروشگاه ایران مارکت";

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
    pub can_write: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role_label: admin.role.label(),
            can_write: admin.role.can_write(),
        }
    }
}

/// Shared page context for logged-in pages. Extracting it drains the
/// pending flash messages.
pub struct PageContext {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flashes: Vec<Flash>,
}

impl PageContext {
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
    pub const fn site_header(&self) -> &'static str {
        SITE_HEADER
    }

    /// Whether the sidebar link for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.current_path == "/";
        }
        self.current_path == prefix
            || self
                .current_path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.admin_user.can_write
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let RequireAdminAuth(admin) = RequireAdminAuth::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()).into_response())?;
        set_sentry_user(admin.id.as_i32(), admin.email.as_str());

        Ok(Self {
            admin_user: AdminUserView::from(&admin),
            current_path: parts.uri.path().to_owned(),
            flashes: flash::take(&session).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use iranmarket_core::AdminRole;

    use super::*;

    fn context(path: &str) -> PageContext {
        PageContext {
            admin_user: AdminUserView {
                name: "مریم".to_owned(),
                email: "ops@iranmarket.ir".to_owned(),
                role_label: AdminRole::Viewer.label(),
                can_write: false,
            },
            current_path: path.to_owned(),
            flashes: Vec::new(),
        }
    }

    #[test]
    fn test_is_active_matches_section() {
        let ctx = context("/orders/12");
        assert!(ctx.is_active("/orders"));
        assert!(!ctx.is_active("/"));
        assert!(!context("/ordersx").is_active("/orders"));
        assert!(context("/").is_active("/"));
    }

    #[test]
    fn test_viewer_cannot_write() {
        assert!(!context("/").can_write());
    }
}
