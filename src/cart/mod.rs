//! # Cart
//!
//! The cart transaction engine and its domain types.
//!
//! A cart is a header row `CART#<id>` plus one row per item under the same
//! partition. [`CartService`] validates each payload, turns it into a single
//! atomic store request, classifies any store failure into a [`CartError`]
//! and returns the cart as loaded after the write.

mod aggregate;
mod classify;
mod error;
mod model;
mod observer;
mod service;
pub mod validation;

pub use aggregate::{totals, Totals};
pub use classify::classify;
pub use error::CartError;
pub use model::{Cart, CartItem, DeleteItem, NewItem, UpdateItem};
pub use observer::{CartObserver, Operation, TracingObserver};
pub use service::CartService;
