//! Product detail and review route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use iranmarket_core::ProductId;

use crate::db::catalog::CatalogRepository;
use crate::db::reviews::{ReviewInput, ReviewRepository};
use crate::db::wishlist::WishlistRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, flash};
use crate::models::{Product, Review, ReviewStats};
use crate::routes::context::PageContext;
use crate::state::AppState;

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub stats: ReviewStats,
    pub reviews: Vec<Review>,
    /// The visitor's own review, approved or not, to prefill the form.
    pub user_review: Option<Review>,
    pub in_wishlist: bool,
    pub canonical_url: String,
}

impl ProductShowTemplate {
    #[must_use]
    pub fn seo_title(&self) -> String {
        format!("{} | خرید آنلاین | {}", self.product.name, self.ctx.settings.store_name)
    }

    /// Rating preselected in the review form.
    #[must_use]
    pub fn form_rating(&self) -> i16 {
        self.user_review.as_ref().map_or(5, |r| r.rating)
    }

    #[must_use]
    pub fn form_title(&self) -> &str {
        self.user_review.as_ref().map_or("", |r| r.title.as_str())
    }

    #[must_use]
    pub fn form_comment(&self) -> &str {
        self.user_review.as_ref().map_or("", |r| r.comment.as_str())
    }
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewForm {
    /// Validate the submission. Only the 1..=5 rating is required; titles
    /// are cut to 100 characters.
    #[must_use]
    pub fn into_input(self) -> Option<ReviewInput> {
        let rating = self.rating?.trim().parse::<i16>().ok()?;
        if !(1..=5).contains(&rating) {
            return None;
        }
        Some(ReviewInput {
            rating,
            title: self.title.trim().chars().take(100).collect(),
            comment: self.comment.trim().to_owned(),
        })
    }
}

/// Display a product.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = CatalogRepository::new(state.pool())
        .product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let reviews = ReviewRepository::new(state.pool());
    let stats = reviews.stats(product.id).await?;
    let approved = reviews.approved_for_product(product.id).await?;
    let (user_review, in_wishlist) = match &ctx.user {
        Some(user) => (
            reviews.by_user(product.id, user.id).await?,
            WishlistRepository::new(state.pool())
                .contains(user.id, product.id)
                .await?,
        ),
        None => (None, false),
    };

    let canonical_url = state
        .config()
        .base_url
        .join(&format!("/product/{}/", urlencoding::encode(&product.slug)))
        .map(|u| u.to_string())
        .unwrap_or_default();

    Ok(ProductShowTemplate {
        ctx,
        product,
        stats,
        reviews: approved,
        user_review,
        in_wishlist,
        canonical_url,
    })
}

/// Create or update the customer's review, then go back to the product.
#[instrument(skip(state, session, form))]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let product = CatalogRepository::new(state.pool())
        .active_product(ProductId::new(product_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
    let back = format!("/product/{}/", urlencoding::encode(&product.slug));

    let Some(input) = form.into_input() else {
        flash::error(&session, "لطفاً خطاهای فرم را بررسی کنید.").await;
        return Ok(Redirect::to(&back));
    };

    let created = ReviewRepository::new(state.pool())
        .upsert(product.id, user.id, &input)
        .await?;
    let message = if created {
        "نظر شما ثبت شد. ممنون از همراهی شما."
    } else {
        "نظر شما بروزرسانی شد. ممنون از همراهی شما."
    };
    flash::success(&session, message).await;

    Ok(Redirect::to(&back))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rating: Option<&str>, comment: &str) -> ReviewForm {
        ReviewForm {
            rating: rating.map(str::to_owned),
            title: "  خوب ".to_owned(),
            comment: comment.to_owned(),
        }
    }

    #[test]
    fn test_review_form_accepts_valid_input() {
        let input = form(Some("4"), " تازه بود ").into_input();
        let input = input.as_ref();
        assert_eq!(input.map(|i| i.rating), Some(4));
        assert_eq!(input.map(|i| i.title.as_str()), Some("خوب"));
        assert_eq!(input.map(|i| i.comment.as_str()), Some("تازه بود"));
    }

    #[test]
    fn test_review_form_rejects_bad_rating() {
        assert!(form(Some("0"), "x").into_input().is_none());
        assert!(form(Some("6"), "x").into_input().is_none());
        assert!(form(Some("abc"), "x").into_input().is_none());
        assert!(form(None, "x").into_input().is_none());
    }

    #[test]
    fn test_review_form_comment_is_optional() {
        let input = form(Some("5"), "   ").into_input();
        assert_eq!(input.map(|i| i.comment), Some(String::new()));
    }
}
