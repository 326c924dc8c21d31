//! Product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::{BrandId, CategoryId, ProductId, ProductUnit};

use crate::db::catalog::ProductFilter;
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::models::{Brand, Category, Product, ProductInput};
use crate::routes::context::PageContext;
use crate::routes::forms;
use crate::routes::paging::{PAGE_SIZE, Pager};
use crate::state::AppState;

/// List query: `?q=برنج&category=4&page=2`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    pub page: Option<i64>,
}

impl ProductQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            query: Some(self.q.trim())
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            category_id: forms::optional_id(&self.category).map(CategoryId::new),
        }
    }
}

/// The product form as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub brand_id: String,
    #[serde(default)]
    pub external_code: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub discount_price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_value: String,
    pub is_active: Option<String>,
    pub is_best_seller: Option<String>,
    pub show_in_special_offer: Option<String>,
}

impl ProductForm {
    /// Defaults for a new product.
    fn blank() -> Self {
        Self {
            unit: ProductUnit::Piece.as_str().to_owned(),
            unit_value: "1".to_owned(),
            stock: "0".to_owned(),
            is_active: Some("on".to_owned()),
            ..Self::default()
        }
    }

    fn from_product(product: &Product) -> Self {
        let on = |flag: bool| flag.then(|| "on".to_owned());
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            category_id: product.category_id.to_string(),
            brand_id: product.brand_id.map(|id| id.to_string()).unwrap_or_default(),
            external_code: product.external_code.clone(),
            image: product.image.clone(),
            short_description: product.short_description.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            discount_price: product
                .discount_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            stock: product.stock.to_string(),
            unit: product.unit.as_str().to_owned(),
            unit_value: product.unit_value.normalize().to_string(),
            is_active: on(product.is_active),
            is_best_seller: on(product.is_best_seller),
            show_in_special_offer: on(product.show_in_special_offer),
        }
    }

    /// Validate the form. The first problem is returned for display.
    fn parse(&self) -> std::result::Result<ProductInput, String> {
        let name = forms::required(&self.name, "نام محصول")?;
        let category_id = forms::optional_id(&self.category_id)
            .map(CategoryId::new)
            .ok_or_else(|| "دسته‌بندی را انتخاب کنید.".to_owned())?;
        let price = forms::toman(&self.price, "قیمت")?;
        let discount_price = forms::optional_toman(&self.discount_price, "قیمت با تخفیف")?;
        if discount_price.is_some_and(|d| d >= price) {
            return Err("قیمت با تخفیف باید کمتر از قیمت اصلی باشد.".to_owned());
        }
        let stock = forms::int_or(&self.stock, 0, "موجودی")?;
        if stock < 0 {
            return Err("موجودی نمی‌تواند منفی باشد.".to_owned());
        }
        let unit = self
            .unit
            .parse::<ProductUnit>()
            .map_err(|_| "واحد معتبر نیست.".to_owned())?;
        let unit_value = match forms::normalize_number(&self.unit_value).as_str() {
            "" => Decimal::ONE,
            raw => raw
                .parse::<Decimal>()
                .ok()
                .filter(|v| v.is_sign_positive() && !v.is_zero())
                .ok_or_else(|| "مقدار واحد باید عددی مثبت باشد.".to_owned())?,
        };

        Ok(ProductInput {
            category_id,
            brand_id: forms::optional_id(&self.brand_id).map(BrandId::new),
            name,
            slug: self.slug.trim().to_owned(),
            external_code: self.external_code.trim().to_owned(),
            image: self.image.trim().to_owned(),
            short_description: self.short_description.trim().to_owned(),
            description: self.description.trim().to_owned(),
            price,
            discount_price,
            stock,
            unit,
            unit_value,
            is_active: forms::checked(self.is_active.as_deref()),
            is_best_seller: forms::checked(self.is_best_seller.as_deref()),
            show_in_special_offer: forms::checked(self.show_in_special_offer.as_deref()),
        })
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub query: ProductQuery,
    pub pager: Pager,
}

impl ProductListTemplate {
    fn is_category(&self, category: &Category) -> bool {
        self.query.category == category.id.to_string()
    }
}

/// Product create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub units: &'static [ProductUnit],
}

impl ProductFormTemplate {
    fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products/new".to_owned(), |id| format!("/products/{id}/edit"))
    }
}

async fn form_page(
    state: &AppState,
    ctx: PageContext,
    product_id: Option<ProductId>,
    form: ProductForm,
) -> Result<Response> {
    let catalog = CatalogRepository::new(state.pool());
    Ok(ProductFormTemplate {
        ctx,
        product_id,
        form,
        categories: catalog.categories().await?,
        brands: catalog.brands().await?,
        units: ProductUnit::ALL,
    }
    .into_response())
}

/// Searchable product list.
#[instrument(skip(state, ctx))]
pub async fn list(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());
    let filter = query.filter();
    let total = catalog.count_products(&filter).await?;
    let pager = Pager::new(
        "/products",
        query.page,
        total,
        &[("q", query.q.as_str()), ("category", query.category.as_str())],
    );

    Ok(ProductListTemplate {
        products: catalog.products(&filter, PAGE_SIZE, pager.offset()).await?,
        categories: catalog.categories().await?,
        ctx,
        query,
        pager,
    })
}

#[instrument(skip(state, ctx))]
pub async fn new_page(State(state): State<AppState>, ctx: PageContext) -> Result<Response> {
    form_page(&state, ctx, None, ProductForm::blank()).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    mut ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return form_page(&state, ctx, None, form).await;
        }
    };

    match CatalogRepository::new(state.pool()).create_product(&input).await {
        Ok(id) => {
            info!(product_id = %id, "product created");
            flash::success(&session, format!("محصول «{}» اضافه شد.", input.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error("این نامک یا کد محصول قبلا استفاده شده است.");
            form_page(&state, ctx, None, form).await
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, ctx))]
pub async fn edit_page(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = CatalogRepository::new(state.pool())
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    form_page(&state, ctx, Some(id), ProductForm::from_product(&product)).await
}

#[instrument(skip(state, session, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    mut ctx: PageContext,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            ctx.push_error(message);
            return form_page(&state, ctx, Some(id), form).await;
        }
    };

    match CatalogRepository::new(state.pool())
        .update_product(id, &input)
        .await
    {
        Ok(()) => {
            info!(product_id = %id, "product updated");
            flash::success(&session, format!("محصول «{}» ذخیره شد.", input.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.push_error("این نامک یا کد محصول قبلا استفاده شده است.");
            form_page(&state, ctx, Some(id), form).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product that no order references.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match CatalogRepository::new(state.pool()).delete_product(id).await {
        Ok(()) => {
            info!(product_id = %id, "product deleted");
            flash::success(&session, "محصول حذف شد.").await;
        }
        Err(RepositoryError::Conflict(_)) => {
            flash::error(
                &session,
                "این محصول در سفارش‌ها استفاده شده و قابل حذف نیست؛ آن را غیرفعال کنید.",
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/products"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use iranmarket_core::Toman;

    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "برنج هاشمی".to_owned(),
            category_id: "3".to_owned(),
            price: "۴۵۰٬۰۰۰".to_owned(),
            unit: "kilogram".to_owned(),
            unit_value: "10".to_owned(),
            stock: "12".to_owned(),
            is_active: Some("on".to_owned()),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let input = form().parse().unwrap();
        assert_eq!(input.category_id, CategoryId::new(3));
        assert_eq!(input.price, Toman::new(450_000));
        assert_eq!(input.unit, ProductUnit::Kilogram);
        assert_eq!(input.unit_value, Decimal::TEN);
        assert!(input.is_active);
        assert!(!input.is_best_seller);
        assert_eq!(input.brand_id, None);
    }

    #[test]
    fn test_discount_must_be_below_price() {
        let mut f = form();
        f.discount_price = "450000".to_owned();
        assert_eq!(
            f.parse().unwrap_err(),
            "قیمت با تخفیف باید کمتر از قیمت اصلی باشد."
        );
    }

    #[test]
    fn test_parse_errors() {
        let mut f = form();
        f.category_id.clear();
        assert_eq!(f.parse().unwrap_err(), "دسته‌بندی را انتخاب کنید.");

        let mut f = form();
        f.stock = "-1".to_owned();
        assert!(f.parse().is_err());

        let mut f = form();
        f.unit_value = "0".to_owned();
        assert!(f.parse().is_err());
    }

    #[test]
    fn test_blank_form_defaults_to_active_piece() {
        let input = ProductForm {
            name: "نان".to_owned(),
            category_id: "1".to_owned(),
            price: "1000".to_owned(),
            ..ProductForm::blank()
        }
        .parse()
        .unwrap();
        assert_eq!(input.unit, ProductUnit::Piece);
        assert_eq!(input.unit_value, Decimal::ONE);
        assert!(input.is_active);
    }
}
