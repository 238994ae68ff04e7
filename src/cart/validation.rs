//! Payload validation.
//!
//! Fields are checked in a fixed order and the first failure is returned:
//! `cart_id`, `item_id`, `description`, price present, price within
//! `0..=MAX_PRICE`, quantity present, quantity within `1..=MAX_QUANTITY`.

use super::error::CartError;
use super::model::{DeleteItem, NewItem, UpdateItem};

/// Largest unit price a request may carry.
pub const MAX_PRICE: f64 = 1_000_000_000.0;

/// Largest quantity a single request may add or set.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// A [`NewItem`] whose fields all passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidItem<'a> {
    pub cart_id: &'a str,
    pub item_id: &'a str,
    pub description: &'a str,
    pub price: f64,
    pub quantity: i64,
}

/// An [`UpdateItem`] whose fields all passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidUpdate<'a> {
    pub cart_id: &'a str,
    pub item_id: &'a str,
    pub quantity: i64,
}

/// A [`DeleteItem`] whose fields all passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidDelete<'a> {
    pub cart_id: &'a str,
    pub item_id: &'a str,
}

pub fn validate_new_item(item: &NewItem) -> Result<ValidItem<'_>, CartError> {
    Ok(ValidItem {
        cart_id: cart_id(&item.cart_id)?,
        item_id: item_id(&item.item_id)?,
        description: description(&item.description)?,
        price: price(item.price)?,
        quantity: quantity(item.quantity)?,
    })
}

pub fn validate_update(update: &UpdateItem) -> Result<ValidUpdate<'_>, CartError> {
    Ok(ValidUpdate {
        cart_id: cart_id(&update.cart_id)?,
        item_id: item_id(&update.item_id)?,
        quantity: quantity(update.quantity)?,
    })
}

pub fn validate_delete(delete: &DeleteItem) -> Result<ValidDelete<'_>, CartError> {
    Ok(ValidDelete {
        cart_id: cart_id(&delete.cart_id)?,
        item_id: item_id(&delete.item_id)?,
    })
}

pub fn cart_id(value: &str) -> Result<&str, CartError> {
    required(value, CartError::CartIdIsEmpty)
}

pub fn item_id(value: &str) -> Result<&str, CartError> {
    required(value, CartError::ItemIdIsEmpty)
}

pub fn description(value: &str) -> Result<&str, CartError> {
    required(value, CartError::DescriptionIsEmpty)
}

pub fn price(value: Option<f64>) -> Result<f64, CartError> {
    match value {
        None => Err(CartError::PriceIsEmpty),
        Some(price) if !price.is_finite() || !(0.0..=MAX_PRICE).contains(&price) => {
            Err(CartError::PriceIsInvalid)
        }
        Some(price) => Ok(price),
    }
}

pub fn quantity(value: Option<i64>) -> Result<i64, CartError> {
    match value {
        None => Err(CartError::QuantityIsEmpty),
        Some(quantity) if !(1..=MAX_QUANTITY).contains(&quantity) => {
            Err(CartError::QuantityIsInvalid)
        }
        Some(quantity) => Ok(quantity),
    }
}

fn required(value: &str, error: CartError) -> Result<&str, CartError> {
    if value.is_empty() {
        Err(error)
    } else {
        Ok(value)
    }
}
