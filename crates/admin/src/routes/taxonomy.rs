//! Categories and brands.

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

use iranmarket_core::{BrandId, CategoryId};

use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::models::{Brand, BrandInput, Category, CategoryInput};
use crate::routes::context::PageContext;
use crate::routes::forms;
use crate::state::AppState;

const SLUG_TAKEN: &str = "این نامک قبلا استفاده شده است.";

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub icon_image: String,
    #[serde(default)]
    pub discount_percent: String,
    pub discount_active: Option<String>,
    pub is_active: Option<String>,
    #[serde(default)]
    pub sort_order: String,
}

impl CategoryForm {
    fn blank() -> Self {
        Self {
            discount_percent: "0".to_owned(),
            sort_order: "0".to_owned(),
            is_active: Some("on".to_owned()),
            ..Self::default()
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon_image: category.icon_image.clone(),
            discount_percent: category.discount_percent.to_string(),
            discount_active: category.discount_active.then(|| "on".to_owned()),
            is_active: category.is_active.then(|| "on".to_owned()),
            sort_order: category.sort_order.to_string(),
        }
    }

    fn parse(&self) -> std::result::Result<CategoryInput, String> {
        let discount_percent = forms::int_or(&self.discount_percent, 0, "درصد تخفیف")?;
        if !(0..=100).contains(&discount_percent) {
            return Err("درصد تخفیف باید بین ۰ تا ۱۰۰ باشد.".to_owned());
        }
        Ok(CategoryInput {
            name: forms::required(&self.name, "نام دسته‌بندی")?,
            slug: self.slug.trim().to_owned(),
            icon_image: self.icon_image.trim().to_owned(),
            discount_percent,
            discount_active: forms::checked(self.discount_active.as_deref()),
            is_active: forms::checked(self.is_active.as_deref()),
            sort_order: forms::int_or(&self.sort_order, 0, "ترتیب")?,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/list.html")]
pub struct CategoryListTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: CategoryForm,
}

fn category_page(ctx: PageContext, id: Option<CategoryId>, form: CategoryForm) -> Response {
    CategoryFormTemplate {
        ctx,
        action: id.map_or_else(
            || "/categories/new".to_owned(),
            |id| format!("/categories/{id}/edit"),
        ),
        form,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn categories(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let categories = CatalogRepository::new(state.pool()).categories().await?;
    Ok(CategoryListTemplate { ctx, categories })
}

pub async fn new_category(ctx: PageContext) -> Response {
    category_page(ctx, None, CategoryForm::blank())
}

#[instrument(skip(state, ctx))]
pub async fn edit_category(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let category = CatalogRepository::new(state.pool())
        .category(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    Ok(category_page(ctx, Some(id), CategoryForm::from_category(&category)))
}

/// Create (`id` = `None`) or update a category.
async fn save_category(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return Ok(category_page(ctx, id, form));
        }
    };

    let catalog = CatalogRepository::new(state.pool());
    let saved = match id {
        Some(id) => catalog.update_category(id, &input).await.map(|()| id),
        None => catalog.create_category(&input).await,
    };
    match saved {
        Ok(id) => {
            info!(category_id = %id, "category saved");
            flash::success(session, format!("دسته‌بندی «{}» ذخیره شد.", input.name)).await;
            Ok(Redirect::to("/categories").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error(SLUG_TAKEN);
            Ok(category_page(ctx, id, form))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_category(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save_category(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_category(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save_category(&state, &session, ctx, Some(id), form).await
}

// =============================================================================
// Brands
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub logo: String,
}

impl BrandForm {
    fn from_brand(brand: &Brand) -> Self {
        Self {
            name: brand.name.clone(),
            slug: brand.slug.clone(),
            logo: brand.logo.clone(),
        }
    }

    fn parse(&self) -> std::result::Result<BrandInput, String> {
        Ok(BrandInput {
            name: forms::required(&self.name, "نام برند")?,
            slug: self.slug.trim().to_owned(),
            logo: self.logo.trim().to_owned(),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "brands/list.html")]
pub struct BrandListTemplate {
    pub ctx: PageContext,
    pub brands: Vec<Brand>,
}

#[derive(Template, WebTemplate)]
#[template(path = "brands/form.html")]
pub struct BrandFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub form: BrandForm,
}

fn brand_page(ctx: PageContext, id: Option<BrandId>, form: BrandForm) -> Response {
    BrandFormTemplate {
        ctx,
        action: id.map_or_else(|| "/brands/new".to_owned(), |id| format!("/brands/{id}/edit")),
        form,
    }
    .into_response()
}

#[instrument(skip(state, ctx))]
pub async fn brands(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let brands = CatalogRepository::new(state.pool()).brands().await?;
    Ok(BrandListTemplate { ctx, brands })
}

pub async fn new_brand(ctx: PageContext) -> Response {
    brand_page(ctx, None, BrandForm::default())
}

#[instrument(skip(state, ctx))]
pub async fn edit_brand(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<BrandId>,
) -> Result<Response> {
    let brand = CatalogRepository::new(state.pool())
        .brand(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("brand {id}")))?;
    Ok(brand_page(ctx, Some(id), BrandForm::from_brand(&brand)))
}

async fn save_brand(
    state: &AppState,
    session: &Session,
    mut ctx: PageContext,
    id: Option<BrandId>,
    form: BrandForm,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return Ok(brand_page(ctx, id, form));
        }
    };

    let catalog = CatalogRepository::new(state.pool());
    let saved = match id {
        Some(id) => catalog.update_brand(id, &input).await.map(|()| id),
        None => catalog.create_brand(&input).await,
    };
    match saved {
        Ok(id) => {
            info!(brand_id = %id, "brand saved");
            flash::success(session, format!("برند «{}» ذخیره شد.", input.name)).await;
            Ok(Redirect::to("/brands").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error(SLUG_TAKEN);
            Ok(brand_page(ctx, id, form))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create_brand(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Form(form): Form<BrandForm>,
) -> Result<Response> {
    save_brand(&state, &session, ctx, None, form).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update_brand(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    ctx: PageContext,
    Path(id): Path<BrandId>,
    Form(form): Form<BrandForm>,
) -> Result<Response> {
    save_brand(&state, &session, ctx, Some(id), form).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_discount_range() {
        let form = CategoryForm {
            name: "لبنیات".to_owned(),
            discount_percent: "120".to_owned(),
            ..CategoryForm::blank()
        };
        assert_eq!(form.parse().unwrap_err(), "درصد تخفیف باید بین ۰ تا ۱۰۰ باشد.");
    }

    #[test]
    fn test_category_form_parses() {
        let input = CategoryForm {
            name: " لبنیات ".to_owned(),
            discount_percent: "۱۵".to_owned(),
            discount_active: Some("on".to_owned()),
            ..CategoryForm::blank()
        }
        .parse()
        .unwrap();
        assert_eq!(input.name, "لبنیات");
        assert_eq!(input.discount_percent, 15);
        assert!(input.discount_active);
        assert!(input.is_active);
        assert_eq!(input.slug, "");
    }

    #[test]
    fn test_brand_requires_name() {
        assert_eq!(
            BrandForm::default().parse().unwrap_err(),
            "نام برند الزامی است."
        );
    }
}
