//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use iranmarket_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Phone number or email the customer logged in with.
    pub username: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart lines.
    pub const CART: &str = "cart";

    /// Key for the delivery city picked in the header.
    pub const SELECTED_CITY_ID: &str = "selected_city_id";

    /// Key for the identifier waiting for its login code.
    pub const LOGIN_IDENTIFIER: &str = "login_identifier";

    /// Key for the page to return to after logging in.
    pub const LOGIN_NEXT: &str = "login_next";

    /// Key for orders placed from this session (guest payment access).
    pub const PLACED_ORDERS: &str = "placed_orders";

    /// Key for pending flash messages.
    pub const FLASH: &str = "_flash";
}
