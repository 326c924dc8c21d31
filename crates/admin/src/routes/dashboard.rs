//! Sales dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::routes::context::PageContext;
use crate::services::{Dashboard, load_dashboard};
use crate::state::AppState;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub dashboard: Dashboard,
}

/// Order counts, revenue, the last seven days and the best sellers.
#[instrument(skip(state, ctx))]
pub async fn show(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let dashboard = load_dashboard(state.pool(), Utc::now()).await?;
    Ok(DashboardTemplate { ctx, dashboard })
}
