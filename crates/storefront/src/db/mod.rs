//! Storefront database access.
//!
//! Repositories for the tables only the public site touches: catalog reads,
//! customers, addresses, wishlists, reviews, tickets, login codes and
//! coupon lookups. Orders, locations and site settings are shared with the
//! admin and live in `iranmarket_core::db`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p iranmarket-cli -- migrate storefront
//! ```

pub mod addresses;
pub mod catalog;
pub mod coupons;
pub mod customers;
pub mod otp;
pub mod reviews;
pub mod tickets;
pub mod wishlist;

pub use iranmarket_core::db::{
    CancelOutcome, LocationRepository, OrderRepository, PaymentOutcome, RepositoryError,
    SiteSettingRepository, create_pool, like_pattern,
};
