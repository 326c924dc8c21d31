//! Customer list and login codes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use crate::db::CustomerRepository;
use crate::db::customers::CUSTOMER_PAGE_SIZE;
use crate::error::Result;
use crate::filters;
use crate::models::{Customer, LoginCode};
use crate::routes::context::PageContext;
use crate::state::AppState;

/// `?q=0912&page=2`.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<i64>,
}

impl CustomerQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn page_href(&self, page: i64) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if !self.q.trim().is_empty() {
            query.append_pair("q", self.q.trim());
        }
        query.append_pair("page", &page.to_string());
        format!("/customers?{}", query.finish())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/list.html")]
pub struct CustomerListTemplate {
    pub ctx: PageContext,
    pub customers: Vec<Customer>,
    pub query: CustomerQuery,
    pub prev_href: Option<String>,
    /// Set when the page came back full.
    pub next_href: Option<String>,
}

/// Customers with their order totals, newest first.
#[instrument(skip(state, ctx))]
pub async fn customers(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CustomerQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page();
    let customers = CustomerRepository::new(state.pool())
        .search(Some(query.q.as_str()), (page - 1) * CUSTOMER_PAGE_SIZE)
        .await?;

    let full = i64::try_from(customers.len()).unwrap_or(i64::MAX) >= CUSTOMER_PAGE_SIZE;
    Ok(CustomerListTemplate {
        prev_href: (page > 1).then(|| query.page_href(page - 1)),
        next_href: full.then(|| query.page_href(page + 1)),
        ctx,
        customers,
        query,
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/otps.html")]
pub struct LoginCodeListTemplate {
    pub ctx: PageContext,
    pub codes: Vec<LoginCode>,
    pub now: DateTime<Utc>,
}

impl LoginCodeListTemplate {
    fn code_state(&self, code: &LoginCode) -> &'static str {
        if code.is_used {
            "استفاده شده"
        } else if code.is_expired_at(self.now) {
            "منقضی"
        } else {
            "معتبر"
        }
    }
}

/// Recent login codes, read-only, for helping customers who cannot log in.
#[instrument(skip(state, ctx))]
pub async fn login_codes(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let codes = CustomerRepository::new(state.pool())
        .recent_login_codes()
        .await?;
    Ok(LoginCodeListTemplate {
        ctx,
        codes,
        now: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_href_keeps_search() {
        let query = CustomerQuery {
            q: " علی ".to_owned(),
            page: Some(2),
        };
        assert_eq!(query.page(), 2);
        assert_eq!(query.page_href(3), "/customers?q=%D8%B9%D9%84%DB%8C&page=3");
        assert_eq!(
            CustomerQuery::default().page_href(1),
            "/customers?page=1"
        );
    }

    #[test]
    fn test_page_is_at_least_one() {
        let query = CustomerQuery {
            q: String::new(),
            page: Some(-4),
        };
        assert_eq!(query.page(), 1);
    }
}
