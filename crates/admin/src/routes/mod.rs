//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready              - Health checks
//! GET|POST /login                          - Staff login
//! POST /logout                             - Logout
//! GET  /                                   - Sales dashboard
//!
//! # Orders
//! GET  /orders?status=&paid=&q=&page=      - Order list
//! POST /orders/bulk                        - Bulk status change
//! GET  /orders/{id}                        - Order detail
//!
//! # Catalog
//! GET  /products?q=&category=&page=        - Product list
//! GET|POST /products/new
//! GET|POST /products/{id}/edit
//! POST /products/{id}/delete
//! GET  /categories, GET|POST /categories/new, GET|POST /categories/{id}/edit
//! GET  /brands, GET|POST /brands/new, GET|POST /brands/{id}/edit
//!
//! # Promotions
//! GET  /banners, GET|POST /banners/new, GET|POST /banners/{id}/edit
//! POST /banners/{id}/delete
//! GET  /coupons, GET|POST /coupons/new, GET|POST /coupons/{id}/edit
//!
//! # Shipping
//! GET  /shipping-zones, GET|POST /shipping-zones/new, GET|POST /shipping-zones/{id}/edit
//! GET  /provinces, GET|POST /provinces/new, GET|POST /provinces/{id}/edit
//! GET  /cities?province=, GET|POST /cities/new, GET|POST /cities/{id}/edit
//!
//! # Customers and moderation
//! GET  /reviews
//! POST /reviews/{id}/approve, POST /reviews/{id}/reject
//! GET  /tickets, GET|POST /tickets/{id}
//! GET  /customers?q=&page=
//! GET  /otps                               - Recent login codes (read-only)
//!
//! # Site
//! GET|POST /settings
//! ```
//!
//! Every page needs a logged-in admin. POST handlers also take
//! [`RequireEditor`](crate::middleware::RequireEditor), so viewers can read
//! everything and change nothing.

pub mod auth;
pub mod context;
pub mod customers;
pub mod dashboard;
pub mod forms;
pub mod locations;
pub mod moderation;
pub mod orders;
pub mod paging;
pub mod products;
pub mod promotions;
pub mod settings;
pub mod taxonomy;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list))
        .route("/orders/bulk", post(orders::bulk))
        .route("/orders/{id}", get(orders::detail))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route(
            "/products/new",
            get(products::new_page).post(products::create),
        )
        .route(
            "/products/{id}/edit",
            get(products::edit_page).post(products::update),
        )
        .route("/products/{id}/delete", post(products::delete))
        .route("/categories", get(taxonomy::categories))
        .route(
            "/categories/new",
            get(taxonomy::new_category).post(taxonomy::create_category),
        )
        .route(
            "/categories/{id}/edit",
            get(taxonomy::edit_category).post(taxonomy::update_category),
        )
        .route("/brands", get(taxonomy::brands))
        .route(
            "/brands/new",
            get(taxonomy::new_brand).post(taxonomy::create_brand),
        )
        .route(
            "/brands/{id}/edit",
            get(taxonomy::edit_brand).post(taxonomy::update_brand),
        )
}

/// Create the banner and coupon routes router.
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/banners", get(promotions::banners))
        .route(
            "/banners/new",
            get(promotions::new_banner).post(promotions::create_banner),
        )
        .route(
            "/banners/{id}/edit",
            get(promotions::edit_banner).post(promotions::update_banner),
        )
        .route("/banners/{id}/delete", post(promotions::delete_banner))
        .route("/coupons", get(promotions::coupons))
        .route(
            "/coupons/new",
            get(promotions::new_coupon).post(promotions::create_coupon),
        )
        .route(
            "/coupons/{id}/edit",
            get(promotions::edit_coupon).post(promotions::update_coupon),
        )
}

/// Create the shipping zone, province and city routes router.
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/shipping-zones", get(locations::zones))
        .route(
            "/shipping-zones/new",
            get(locations::new_zone).post(locations::create_zone),
        )
        .route(
            "/shipping-zones/{id}/edit",
            get(locations::edit_zone).post(locations::update_zone),
        )
        .route("/provinces", get(locations::provinces))
        .route(
            "/provinces/new",
            get(locations::new_province).post(locations::create_province),
        )
        .route(
            "/provinces/{id}/edit",
            get(locations::edit_province).post(locations::update_province),
        )
        .route("/cities", get(locations::cities))
        .route(
            "/cities/new",
            get(locations::new_city).post(locations::create_city),
        )
        .route(
            "/cities/{id}/edit",
            get(locations::edit_city).post(locations::update_city),
        )
}

/// Create the customer and moderation routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(moderation::reviews))
        .route("/reviews/{id}/approve", post(moderation::approve_review))
        .route("/reviews/{id}/reject", post(moderation::reject_review))
        .route("/tickets", get(moderation::tickets))
        .route(
            "/tickets/{id}",
            get(moderation::ticket).post(moderation::answer_ticket),
        )
        .route("/customers", get(customers::customers))
        .route("/otps", get(customers::login_codes))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/", get(dashboard::show))
        .merge(order_routes())
        .merge(catalog_routes())
        .merge(promotion_routes())
        .merge(location_routes())
        .merge(customer_routes())
        .route("/settings", get(settings::show).post(settings::save))
}
