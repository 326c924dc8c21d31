//! Review approval and support tickets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::{ReviewId, TicketId, TicketStatus};

use crate::db::ModerationRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::models::{Review, Ticket};
use crate::routes::context::PageContext;
use crate::state::AppState;

// =============================================================================
// Reviews
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "reviews/list.html")]
pub struct ReviewListTemplate {
    pub ctx: PageContext,
    pub reviews: Vec<Review>,
}

/// Reviews, those waiting for approval first.
#[instrument(skip(state, ctx))]
pub async fn reviews(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let reviews = ModerationRepository::new(state.pool()).reviews().await?;
    Ok(ReviewListTemplate { ctx, reviews })
}

async fn set_approved(
    state: &AppState,
    session: &Session,
    id: ReviewId,
    approved: bool,
) -> Result<Redirect> {
    ModerationRepository::new(state.pool())
        .set_review_approved(id, approved)
        .await?;
    info!(review_id = %id, approved, "review moderated");
    let message = if approved {
        "نظر تایید شد و در صفحه محصول نمایش داده می‌شود."
    } else {
        "نظر رد شد و نمایش داده نمی‌شود."
    };
    flash::success(session, message).await;
    Ok(Redirect::to("/reviews"))
}

#[instrument(skip(state, session))]
pub async fn approve_review(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    set_approved(&state, &session, id, true).await
}

#[instrument(skip(state, session))]
pub async fn reject_review(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    set_approved(&state, &session, id, false).await
}

// =============================================================================
// Tickets
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "tickets/list.html")]
pub struct TicketListTemplate {
    pub ctx: PageContext,
    pub tickets: Vec<Ticket>,
}

#[derive(Template, WebTemplate)]
#[template(path = "tickets/detail.html")]
pub struct TicketDetailTemplate {
    pub ctx: PageContext,
    pub ticket: Ticket,
    pub statuses: &'static [TicketStatus],
    /// Status preselected in the reply form.
    pub next_status: TicketStatus,
}

impl TicketDetailTemplate {
    fn is_next(&self, status: &TicketStatus) -> bool {
        *status == self.next_status
    }

    fn render_page(ctx: PageContext, ticket: Ticket) -> Response {
        // Replying to an open ticket usually answers it.
        let next_status = match ticket.status {
            TicketStatus::Open => TicketStatus::Answered,
            other => other,
        };
        Self {
            ctx,
            ticket,
            statuses: TicketStatus::ALL,
            next_status,
        }
        .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketReplyForm {
    #[serde(default)]
    pub admin_reply: String,
    #[serde(default)]
    pub status: String,
}

/// Tickets, open ones first.
#[instrument(skip(state, ctx))]
pub async fn tickets(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let tickets = ModerationRepository::new(state.pool()).tickets().await?;
    Ok(TicketListTemplate { ctx, tickets })
}

async fn load_ticket(state: &AppState, id: TicketId) -> Result<Ticket> {
    ModerationRepository::new(state.pool())
        .ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))
}

#[instrument(skip(state, ctx))]
pub async fn ticket(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<TicketId>,
) -> Result<Response> {
    let ticket = load_ticket(&state, id).await?;
    Ok(TicketDetailTemplate::render_page(ctx, ticket))
}

/// Save the staff reply and status.
#[instrument(skip(state, session, ctx, form))]
pub async fn answer_ticket(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    mut ctx: PageContext,
    Path(id): Path<TicketId>,
    Form(form): Form<TicketReplyForm>,
) -> Result<Response> {
    let Ok(status) = form.status.parse::<TicketStatus>() else {
        let ticket = load_ticket(&state, id).await?;
        ctx.push_error("وضعیت معتبر نیست.");
        return Ok(TicketDetailTemplate::render_page(ctx, ticket));
    };

    ModerationRepository::new(state.pool())
        .answer_ticket(id, form.admin_reply.trim(), status)
        .await?;
    info!(ticket_id = %id, status = %status, "ticket answered");
    flash::success(&session, "پاسخ تیکت ذخیره شد.").await;
    Ok(Redirect::to(&format!("/tickets/{id}")).into_response())
}
