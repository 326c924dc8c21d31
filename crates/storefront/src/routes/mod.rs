//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Home page
//! GET  /health, /health/ready              - Health checks
//!
//! # Catalog
//! GET  /categories/                        - All categories
//! GET  /category/{slug}/                   - Category listing (filters, sort, pages)
//! GET  /offers/                            - Discounted products
//! GET  /products/new/                      - Newest products
//! GET  /products/best-sellers/             - Best sellers
//! GET  /search/?q=                         - Search
//! GET  /product/{slug}/                    - Product detail
//! POST /product/{id}/review/               - Upsert own review (auth)
//!
//! # Cart and checkout
//! GET  /cart/                              - Cart page
//! POST /cart/add/{product_id}/             - Add (JSON for XHR)
//! POST /cart/remove/{product_id}/          - Remove line
//! POST /cart/update/{product_id}/          - Change quantity
//! GET|POST /checkout/                      - Checkout form and placement
//! POST /set-city/                          - Choose delivery city
//! GET  /payment/{order_id}/                - Test gateway
//! GET  /payment/{order_id}/{status}/       - Gateway callback
//!
//! # Auth (rate limited)
//! GET|POST /auth/login/                    - Request a login code
//! GET|POST /auth/verify/                   - Enter the code
//! POST /auth/logout/                       - Logout
//!
//! # Account (requires auth)
//! GET  /account/                           - Dashboard
//! GET|POST /account/profile/               - Profile
//! GET|POST /account/addresses/             - Address book
//! POST /account/addresses/{id}/delete/
//! POST /account/addresses/{id}/default/
//! GET  /account/orders/                    - Order history
//! GET  /account/orders/{id}/               - Order detail
//! POST /account/orders/{id}/cancel/        - Cancel
//! GET  /account/wishlist/
//! POST /account/wishlist/add/{product_id}/
//! POST /account/wishlist/remove/{product_id}/
//! GET|POST /account/notifications/
//! GET|POST /account/support/
//!
//! # Help pages
//! GET  /about/, /buying-guide/, /shipping-methods/, /return-policy/, /faq/
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod context;
pub mod home;
pub mod location;
pub mod pages;
pub mod payment;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router. Only the POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();
    Router::new()
        .route(
            "/auth/login/",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/auth/verify/",
            get(auth::verify_page).merge(post(auth::verify).layer(limiter.clone())),
        )
        .route("/auth/logout/", post(auth::logout).layer(limiter))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(catalog::categories))
        .route("/category/{slug}/", get(catalog::category))
        .route("/offers/", get(catalog::offers))
        .route("/products/new/", get(catalog::newest))
        .route("/products/best-sellers/", get(catalog::best_sellers))
        .route("/search/", get(catalog::search))
        .route("/product/{slug}/", get(products::show))
        .route("/product/{id}/review/", post(products::review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::show))
        .route("/cart/add/{product_id}/", post(cart::add))
        .route("/cart/remove/{product_id}/", post(cart::remove))
        .route("/cart/update/{product_id}/", post(cart::update))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/", get(account::dashboard))
        .route(
            "/account/profile/",
            get(account::profile_page).post(account::profile_save),
        )
        .route(
            "/account/addresses/",
            get(account::addresses).post(account::address_save),
        )
        .route("/account/addresses/{id}/delete/", post(account::address_delete))
        .route(
            "/account/addresses/{id}/default/",
            post(account::address_set_default),
        )
        .route("/account/orders/", get(account::orders))
        .route("/account/orders/{id}/", get(account::order_detail))
        .route("/account/orders/{id}/cancel/", post(account::order_cancel))
        .route("/account/wishlist/", get(account::wishlist))
        .route("/account/wishlist/add/{product_id}/", post(account::wishlist_add))
        .route(
            "/account/wishlist/remove/{product_id}/",
            post(account::wishlist_remove),
        )
        .route(
            "/account/notifications/",
            get(account::notifications_page).post(account::notifications_save),
        )
        .route(
            "/account/support/",
            get(account::support).post(account::support_submit),
        )
}

/// Create the help page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/about/", get(pages::about))
        .route("/buying-guide/", get(pages::buying_guide))
        .route("/shipping-methods/", get(pages::shipping_methods))
        .route("/return-policy/", get(pages::return_policy))
        .route("/faq/", get(pages::faq))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .merge(cart_routes())
        .route("/checkout/", get(checkout::show).post(checkout::submit))
        .route("/set-city/", post(location::set_city))
        .route("/payment/{order_id}/", get(payment::start))
        .route("/payment/{order_id}/{status}/", get(payment::callback))
        .merge(auth_routes())
        .merge(account_routes())
        .merge(page_routes())
}
