//! Business logic services for storefront.
//!
//! # Services
//!
//! - `login` - OTP login: issuing, delivering and checking codes
//! - `pricing` - Cart pricing against the live catalog
//! - `orders` - Guest/customer order access and payment

pub mod login;
pub mod orders;
pub mod pricing;
