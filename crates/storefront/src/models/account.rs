//! Customer account types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use iranmarket_core::{AddressId, CityId, TicketId, TicketStatus, UserId, tz};

use super::catalog::Product;

/// A storefront customer. The username is the phone or email they log in with.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Per-customer profile and notification preferences.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub current_city_id: Option<CityId>,
    pub notify_order_sms: bool,
    pub notify_promotions: bool,
    pub notify_site_notifications: bool,
}

/// A saved delivery address.
#[derive(Debug, Clone)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub city: String,
    pub district: String,
    pub street: String,
    pub plaque: String,
    pub postal_code: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// A wishlisted product.
#[derive(Debug, Clone)]
pub struct WishlistEntry {
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

/// A support ticket.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub admin_reply: String,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    #[must_use]
    pub fn created_local(&self) -> String {
        tz::format_local(self.created_at)
    }
}

impl Profile {
    /// Birth date as `YYYY-MM-DD` for the date input, empty when unset.
    #[must_use]
    pub fn date_of_birth_input(&self) -> String {
        self.date_of_birth
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

impl Address {
    /// One-line address for lists and the checkout prefill.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            self.city.as_str(),
            self.district.as_str(),
            self.street.as_str(),
            self.plaque.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("، ")
    }
}
