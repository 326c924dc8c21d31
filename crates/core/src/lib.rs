//! IranMarket Core - Shared domain types and business rules.
//!
//! This crate is used by every IranMarket component:
//! - `storefront` - Public shop (catalog, cart, checkout, OTP login, account)
//! - `admin` - Staff dashboard (orders, catalog, coupons, shipping, reports)
//! - `cli` - Migrations, admin users and location import
//!
//! # Architecture
//!
//! The default build is pure: types and rules with no I/O. Pricing, coupon,
//! shipping and order lifecycle decisions are plain functions so both
//! binaries agree on them and they can be tested without a database.
//!
//! Two features add I/O shared by the binaries:
//! - `postgres` - `sqlx` impls for the types plus [`db`] repositories for
//!   orders, locations and site settings
//! - `mail` - the [`notify`] module (lettre + askama email templates)
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money, emails, login identifiers, slugs, statuses
//! - [`pricing`] - Effective product price and discount badges
//! - [`coupon`] - Coupon eligibility and discount arithmetic
//! - [`shipping`] - Shipping cost by zone and free-shipping threshold
//! - [`checkout`] - Checkout totals
//! - [`order`] - Order lifecycle planning (payment, cancellation)
//! - [`otp`] - One-time login codes
//! - [`location`] - Provinces, cities and shipping zones
//! - [`settings`] - Site settings
//! - [`tz`] - Tehran local time helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod coupon;
pub mod location;
pub mod order;
pub mod otp;
pub mod pricing;
pub mod settings;
pub mod shipping;
pub mod types;
pub mod tz;

#[cfg(feature = "postgres")]
pub mod db;

#[cfg(feature = "mail")]
pub mod notify;

pub use types::*;
