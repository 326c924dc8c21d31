//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use iranmarket_core::BannerPosition;

use crate::db::catalog::{CatalogRepository, HOME_SECTION_SIZE, ListingScope};
use crate::error::Result;
use crate::filters;
use crate::listing::SortOrder;
use crate::models::{Banner, Product};
use crate::routes::context::PageContext;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub hero_banners: Vec<Banner>,
    pub middle_banners: Vec<Banner>,
    pub special_offers: Vec<Product>,
    pub best_sellers: Vec<Product>,
    pub newest: Vec<Product>,
    pub discounted: Vec<Product>,
}

/// Display the home page.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());

    let hero_banners = catalog.banners(BannerPosition::Hero).await?;
    let middle_banners = catalog.banners(BannerPosition::Middle).await?;
    let special_offers = catalog
        .section(ListingScope::Offers, SortOrder::Newest, HOME_SECTION_SIZE)
        .await?;
    let best_sellers = catalog
        .section(ListingScope::BestSellers, SortOrder::Newest, HOME_SECTION_SIZE)
        .await?;
    let newest = catalog
        .section(ListingScope::Newest, SortOrder::Newest, HOME_SECTION_SIZE)
        .await?;
    let discounted = catalog
        .section(ListingScope::Discounted, SortOrder::Newest, HOME_SECTION_SIZE)
        .await?;

    Ok(HomeTemplate {
        ctx,
        hero_banners,
        middle_banners,
        special_offers,
        best_sellers,
        newest,
        discounted,
    })
}
