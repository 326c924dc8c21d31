//! Customer-facing records staff review: accounts, reviews, tickets and
//! login codes.

use chrono::{DateTime, Utc};

use iranmarket_core::{ReviewId, TicketId, TicketStatus, Toman, UserId, tz};

/// A customer account with its order totals.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub order_count: i64,
    /// Sum of paid order totals.
    pub paid_total: Toman,
}

impl Customer {
    #[must_use]
    pub fn joined_local(&self) -> String {
        tz::format_local_date(self.date_joined)
    }

    #[must_use]
    pub fn last_login_local(&self) -> String {
        self.last_login.map_or_else(|| "-".to_owned(), tz::format_local)
    }
}

/// A product review awaiting or past moderation.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub product_name: String,
    pub product_slug: String,
    pub username: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    #[must_use]
    pub fn created_local(&self) -> String {
        tz::format_local(self.created_at)
    }
}

/// A support ticket with the customer's username.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub username: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub admin_reply: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    #[must_use]
    pub fn created_local(&self) -> String {
        tz::format_local(self.created_at)
    }

    #[must_use]
    pub fn updated_local(&self) -> String {
        tz::format_local(self.updated_at)
    }
}

/// A one-time login code, shown read-only for support calls.
#[derive(Debug, Clone)]
pub struct LoginCode {
    pub identifier: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub attempts: i32,
}

impl LoginCode {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    #[must_use]
    pub fn created_local(&self) -> String {
        tz::format_local(self.created_at)
    }

    #[must_use]
    pub fn expires_local(&self) -> String {
        tz::format_local(self.expires_at)
    }
}
