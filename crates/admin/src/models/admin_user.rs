//! Staff accounts.

use chrono::{DateTime, Utc};

use iranmarket_core::{AdminUserId, Email};

pub use iranmarket_core::AdminRole;

/// A staff member who can log into the panel.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
