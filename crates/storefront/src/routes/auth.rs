//! OTP login route handlers.
//!
//! `/auth/login/` takes a phone number or email and sends a code;
//! `/auth/verify/` checks the code and logs the customer in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use iranmarket_core::{IdentifierError, LoginIdentifier};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, flash, safe_next, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::routes::context::PageContext;
use crate::services::login::{LoginService, VerifyOutcome};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub identifier: String,
    pub next: String,
}

/// Code entry template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify.html")]
pub struct VerifyTemplate {
    pub ctx: PageContext,
    pub identifier: String,
}

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub identifier: String,
    pub next: Option<String>,
}

/// Code form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub code: String,
}

/// Persian message for a rejected identifier.
const fn identifier_error_message(err: &IdentifierError) -> &'static str {
    match err {
        IdentifierError::Empty => "لطفاً شماره موبایل یا ایمیل خود را وارد کنید.",
        IdentifierError::Email(_) => "ایمیل وارد شده معتبر نیست.",
        IdentifierError::Phone => "شماره موبایل وارد شده معتبر نیست.",
    }
}

async fn pending_identifier(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::LOGIN_IDENTIFIER)
        .await
        .ok()
        .flatten()
}

/// Display the login form.
#[instrument(skip(session, ctx))]
pub async fn login_page(
    session: Session,
    ctx: PageContext,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        identifier: pending_identifier(&session).await.unwrap_or_default(),
        next: safe_next(query.next.as_deref()).to_owned(),
    }
}

/// Issue a code and continue to the verify page.
#[instrument(skip(state, session, ctx, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_owned();
    let identifier = match LoginIdentifier::parse(&form.identifier) {
        Ok(identifier) => identifier,
        Err(e) => {
            ctx.push_error(identifier_error_message(&e));
            return Ok(LoginTemplate {
                ctx,
                identifier: form.identifier.trim().to_owned(),
                next,
            }
            .into_response());
        }
    };

    LoginService::new(state.pool(), state.notifier())
        .request_code(&identifier)
        .await?;

    session
        .insert(session_keys::LOGIN_IDENTIFIER, identifier.as_str())
        .await?;
    session.insert(session_keys::LOGIN_NEXT, &next).await?;
    add_breadcrumb("auth", "Login code requested", None);

    flash::info(&session, "کد ورود برای شما ارسال شد.").await;
    Ok(Redirect::to("/auth/verify/").into_response())
}

/// Display the code form.
#[instrument(skip(session, ctx))]
pub async fn verify_page(session: Session, ctx: PageContext) -> Result<Response> {
    let Some(identifier) = pending_identifier(&session).await else {
        flash::error(&session, "ابتدا شماره موبایل یا ایمیل خود را وارد کنید.").await;
        return Ok(Redirect::to("/auth/login/").into_response());
    };
    Ok(VerifyTemplate { ctx, identifier }.into_response())
}

/// Check the code and log the customer in.
#[instrument(skip(state, session, ctx, form))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Form(form): Form<VerifyForm>,
) -> Result<Response> {
    let Some(identifier) = pending_identifier(&session).await else {
        flash::error(&session, "ابتدا شماره موبایل یا ایمیل خود را وارد کنید.").await;
        return Ok(Redirect::to("/auth/login/").into_response());
    };

    let outcome = LoginService::new(state.pool(), state.notifier())
        .verify(&identifier, form.code.trim())
        .await?;

    let account = match outcome {
        VerifyOutcome::LoggedIn(account) => account,
        rejected => {
            let message = rejected.error_message().unwrap_or_default();
            if rejected.needs_new_code() {
                flash::error(&session, message).await;
                return Ok(Redirect::to("/auth/login/").into_response());
            }
            ctx.push_error(message);
            return Ok(VerifyTemplate { ctx, identifier }.into_response());
        }
    };

    let next: Option<String> = session.remove(session_keys::LOGIN_NEXT).await?;
    session
        .remove::<String>(session_keys::LOGIN_IDENTIFIER)
        .await?;
    let user = CurrentUser {
        id: account.id,
        username: account.username,
    };
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, &user.username);
    add_breadcrumb("auth", "Customer logged in", None);

    flash::success(&session, "با موفقیت وارد شدید.").await;
    Ok(Redirect::to(safe_next(next.as_deref())).into_response())
}

/// Log out and go home.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    flash::info(&session, "با موفقیت خارج شدید.").await;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use iranmarket_core::EmailError;

    use super::*;

    #[test]
    fn test_identifier_error_messages_are_distinct() {
        let empty = identifier_error_message(&IdentifierError::Empty);
        let phone = identifier_error_message(&IdentifierError::Phone);
        let email = identifier_error_message(&IdentifierError::Email(EmailError::Empty));
        assert_ne!(empty, phone);
        assert_ne!(phone, email);
        assert!(empty.contains("موبایل"));
    }
}
