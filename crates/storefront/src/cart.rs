//! Session-backed shopping cart.
//!
//! The session only holds product ids and quantities. Prices are resolved
//! from the catalog every time the cart is shown so a price change is picked
//! up immediately.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use iranmarket_core::ProductId;

use crate::models::session_keys;

/// One cart line as stored in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The cart: product quantities in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Add `quantity` units, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: i32) {
        let quantity = quantity.max(1);
        match self.entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
            None => self.entries.push(CartEntry {
                product_id,
                quantity,
            }),
        }
    }

    /// Replace a line's quantity; anything below 1 removes the line.
    pub fn set(&mut self, product_id: ProductId, quantity: i32) {
        if quantity < 1 {
            self.remove(product_id);
            return;
        }
        match self.entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(entry) => entry.quantity = quantity,
            None => self.entries.push(CartEntry {
                product_id,
                quantity,
            }),
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.entries.retain(|e| e.product_id != product_id);
    }

    /// Keep only lines whose product is still sold.
    pub fn retain_products(&mut self, available: &[ProductId]) {
        self.entries.retain(|e| available.contains(&e.product_id));
    }

    /// Total number of units (the header badge).
    #[must_use]
    pub fn count(&self) -> i64 {
        self.entries.iter().map(|e| i64::from(e.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.iter().map(|e| e.product_id).collect()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| e.quantity)
    }
}

/// Quantity after a `+`/`-` button or a typed value on the cart page.
#[must_use]
pub fn next_quantity(action: Option<&str>, current: Option<&str>, typed: Option<&str>) -> i32 {
    let current = current
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(1);
    match action {
        Some("increase") => current.saturating_add(1),
        Some("decrease") => current.saturating_sub(1),
        _ => typed
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(current),
    }
}

/// Load the cart from the session; a missing or unreadable cart is empty.
pub async fn load(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MILK: ProductId = ProductId::new(1);
    const RICE: ProductId = ProductId::new(2);

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        cart.add(MILK, 1);
        cart.add(RICE, 2);
        cart.add(MILK, 3);
        assert_eq!(cart.entries().len(), 2);
        assert_eq!(cart.quantity_of(MILK), Some(4));
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_add_clamps_to_one() {
        let mut cart = Cart::default();
        cart.add(MILK, 0);
        cart.add(RICE, -5);
        assert_eq!(cart.quantity_of(MILK), Some(1));
        assert_eq!(cart.quantity_of(RICE), Some(1));
    }

    #[test]
    fn test_set_below_one_removes() {
        let mut cart = Cart::default();
        cart.add(MILK, 2);
        cart.set(MILK, 5);
        assert_eq!(cart.quantity_of(MILK), Some(5));
        cart.set(MILK, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_retain_products_drops_missing() {
        let mut cart = Cart::default();
        cart.add(MILK, 1);
        cart.add(RICE, 1);
        cart.retain_products(&[RICE]);
        assert_eq!(cart.product_ids(), vec![RICE]);
    }

    #[test]
    fn test_next_quantity() {
        assert_eq!(next_quantity(Some("increase"), Some("2"), None), 3);
        assert_eq!(next_quantity(Some("decrease"), Some("1"), None), 0);
        assert_eq!(next_quantity(None, Some("2"), Some("7")), 7);
        assert_eq!(next_quantity(None, Some("2"), Some("abc")), 2);
        assert_eq!(next_quantity(Some("decrease"), None, None), 0);
    }

    #[test]
    fn test_session_shape_round_trips() {
        let mut cart = Cart::default();
        cart.add(MILK, 2);
        let json = serde_json::to_value(&cart).unwrap_or_default();
        assert_eq!(json["entries"][0]["product_id"], 1);
        let back: Cart = serde_json::from_value(json).unwrap_or_default();
        assert_eq!(back, cart);
    }
}
