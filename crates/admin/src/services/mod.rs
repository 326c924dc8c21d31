//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email and password login, staff account creation
//! - `orders` - Bulk order actions
//! - `reports` - Dashboard figures

pub mod auth;
pub mod orders;
pub mod reports;

pub use auth::{AdminAuthError, AdminAuthService};
pub use orders::{BulkAction, BulkReport, BulkRequest, parse_bulk_form, run_bulk};
pub use reports::{Dashboard, load_dashboard};
