//! Domain models for storefront.
//!
//! Row types stay private to `db`; these are what handlers and templates see.

pub mod account;
pub mod catalog;
pub mod session;

pub use account::{Address, Profile, Ticket, UserAccount, WishlistEntry};
pub use catalog::{Banner, Brand, Category, Product, Review, ReviewStats};
pub use session::{CurrentUser, keys as session_keys};
