//! Category, collection and search listings.
//!
//! Every listing renders the same template and accepts the filters in
//! [`crate::listing`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, RawQuery, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::db::catalog::{CatalogRepository, ListingScope};
use crate::error::{AppError, Result};
use crate::filters;
use crate::listing::{ListingFilter, ListingQuery, Page, querystring_without_page};
use crate::models::{Brand, Category, Product};
use crate::routes::context::PageContext;
use crate::state::AppState;

/// Category index template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
}

/// Shared listing template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/listing.html")]
pub struct ListingTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub category: Option<Category>,
    /// Brands offered in the filter box; only category pages have them.
    pub brands: Vec<Brand>,
    pub products: Vec<Product>,
    pub page: Page,
    /// Filters of this request, to refill the filter form.
    pub query: ListingQuery,
    pub filter: ListingFilter,
    /// Filter query string without `page`, for the pager links.
    pub querystring: String,
    pub is_search: bool,
}

impl ListingTemplate {
    /// Link to another page of this listing.
    #[must_use]
    pub fn page_href(&self, number: i64) -> String {
        if self.querystring.is_empty() {
            format!("?page={number}")
        } else {
            format!("?{}&page={number}", self.querystring)
        }
    }

    #[must_use]
    pub fn brand_selected(&self, brand: &Brand) -> bool {
        self.filter.brand == Some(brand.id)
    }

    #[must_use]
    pub fn sort_selected(&self, value: &str) -> bool {
        self.query.sort.as_deref().unwrap_or("new") == value
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        self.query.q.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn min_price_value(&self) -> String {
        self.filter
            .min_price
            .map(|p| p.amount().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn max_price_value(&self) -> String {
        self.filter
            .max_price
            .map(|p| p.amount().to_string())
            .unwrap_or_default()
    }
}

struct Listing {
    title: String,
    category: Option<Category>,
    brands: Vec<Brand>,
    is_search: bool,
}

async fn render_listing(
    state: &AppState,
    ctx: PageContext,
    scope: ListingScope<'_>,
    listing: Listing,
    query: ListingQuery,
    raw_query: Option<&str>,
) -> Result<ListingTemplate> {
    let filter = ListingFilter::from_query(&query);
    let (products, page) = CatalogRepository::new(state.pool())
        .list(scope, &filter, query.page.as_deref())
        .await?;

    Ok(ListingTemplate {
        ctx,
        title: listing.title,
        category: listing.category,
        brands: listing.brands,
        products,
        page,
        query,
        filter,
        querystring: querystring_without_page(raw_query),
        is_search: listing.is_search,
    })
}

/// List active categories.
#[instrument(skip(ctx))]
pub async fn categories(ctx: PageContext) -> impl IntoResponse {
    CategoriesTemplate { ctx }
}

/// Products of one category.
#[instrument(skip(state, ctx, query, raw))]
pub async fn category(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());
    let category = catalog
        .active_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    let brands = catalog.brands_in_category(category.id).await?;

    render_listing(
        &state,
        ctx,
        ListingScope::Category(category.id),
        Listing {
            title: category.name.clone(),
            category: Some(category),
            brands,
            is_search: false,
        },
        query,
        raw.as_deref(),
    )
    .await
}

/// Discounted and special-offer products.
#[instrument(skip(state, ctx, query, raw))]
pub async fn offers(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let listing = collection("پیشنهادهای ویژه و تخفیف‌ها");
    render_listing(&state, ctx, ListingScope::Offers, listing, query, raw.as_deref()).await
}

/// Newest products.
#[instrument(skip(state, ctx, query, raw))]
pub async fn newest(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let listing = collection("جدیدترین محصولات");
    render_listing(&state, ctx, ListingScope::Newest, listing, query, raw.as_deref()).await
}

/// Best sellers.
#[instrument(skip(state, ctx, query, raw))]
pub async fn best_sellers(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let listing = collection("پرفروش‌ترین محصولات");
    render_listing(&state, ctx, ListingScope::BestSellers, listing, query, raw.as_deref()).await
}

/// Search by `q`. An empty term lists every active product, still filtered
/// and sorted.
#[instrument(skip(state, ctx, query, raw))]
pub async fn search(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default().to_owned();
    let listing = Listing {
        title: search_title(&term),
        category: None,
        brands: Vec::new(),
        is_search: true,
    };

    render_listing(&state, ctx, search_scope(&term), listing, query, raw.as_deref()).await
}

fn search_scope(term: &str) -> ListingScope<'_> {
    if term.is_empty() {
        ListingScope::All
    } else {
        ListingScope::Search(term)
    }
}

fn search_title(term: &str) -> String {
    if term.is_empty() {
        "جستجو".to_owned()
    } else {
        format!("نتایج جستجو برای «{term}»")
    }
}

fn collection(title: &str) -> Listing {
    Listing {
        title: title.to_owned(),
        category: None,
        brands: Vec::new(),
        is_search: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_lists_all_products() {
        assert!(matches!(search_scope(""), ListingScope::All));
        assert_eq!(search_title(""), "جستجو");
    }

    #[test]
    fn test_search_term_scopes_listing() {
        assert!(matches!(search_scope("برنج"), ListingScope::Search("برنج")));
        assert_eq!(search_title("برنج"), "نتایج جستجو برای «برنج»");
    }
}
