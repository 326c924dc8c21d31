//! Staff login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::context::SITE_HEADER;
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub site_header: &'static str,
    pub email: String,
    pub error: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Show the login form; logged-in staff go to the dashboard.
pub async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        site_header: SITE_HEADER,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Check the credentials and start a session.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AdminAuthError::InvalidCredentials | AdminAuthError::InvalidEmail(_)) => {
            tracing::info!("admin login rejected");
            return Ok(LoginTemplate {
                site_header: SITE_HEADER,
                email: form.email,
                error: Some("ایمیل یا رمز عبور نادرست است."),
            }
            .into_response());
        }
        Err(AdminAuthError::Repository(e)) => return Err(AppError::Database(e)),
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let admin = CurrentAdmin::from(&user);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(admin.id.as_i32(), admin.email.as_str());

    Ok(Redirect::to("/").into_response())
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to(crate::middleware::auth::LOGIN_PATH))
}
