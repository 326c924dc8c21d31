//! Domain models for admin.

pub mod admin_user;
pub mod catalog;
pub mod customers;
pub mod session;

pub use admin_user::{AdminRole, AdminUser};
pub use catalog::{
    Banner, BannerInput, Brand, BrandInput, Category, CategoryInput, Coupon, Product, ProductInput,
};
pub use customers::{Customer, LoginCode, Review, Ticket};
pub use session::{CurrentAdmin, keys as session_keys};
