//! Core types for IranMarket.
//!
//! Type-safe wrappers for ids, money, emails, login identifiers, slugs and
//! the status enums persisted as Postgres enum types.

pub mod email;
pub mod id;
pub mod identifier;
pub mod money;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identifier::{IdentifierError, LoginIdentifier};
pub use money::{Toman, group_thousands};
pub use slug::{city_slug, slugify, unique_slug};
pub use status::*;
