use serde::{Deserialize, Serialize};

use super::aggregate::{totals, Totals};

/// A shopping cart and all of its items.
///
/// `total` and `count` are derived from `items` when the cart is built and
/// cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    cart_id: String,
    items: Vec<CartItem>,
    total: f64,
    count: i64,
}

impl Cart {
    pub fn new(cart_id: impl Into<String>, items: Vec<CartItem>) -> Self {
        let Totals { total, count } = totals(&items);
        Self {
            cart_id: cart_id.into(),
            items,
            total,
            count,
        }
    }

    pub fn cart_id(&self) -> &str {
        &self.cart_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `price * quantity` over all items.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Sum of quantities over all items.
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }
}

/// One line of a cart.
///
/// `description` and `price` are copied from the catalog when the item is
/// added and are not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
}

/// Payload for adding an item, and for creating a cart with its first item.
///
/// `price` and `quantity` are `None` when the caller left them out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub cart_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Payload for replacing an item's quantity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateItem {
    #[serde(default)]
    pub cart_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Payload for removing an item from a cart.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteItem {
    #[serde(default)]
    pub cart_id: String,
    #[serde(default)]
    pub item_id: String,
}
