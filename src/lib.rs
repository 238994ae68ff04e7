//! Shopping carts stored in a single DynamoDB table.
//!
//! [`cart::CartService`] creates carts, adds and merges items, replaces
//! quantities, removes items and loads carts, each mutation as one atomic
//! conditional store request. [`catalog::Catalog`] lists the item master the
//! carts draw from. Both run over any [`store::Store`]: DynamoDB through
//! [`dynamodb::DynamoDb`], or [`store::InMemoryStore`].

pub mod cart;
pub mod catalog;
pub mod config;
pub mod dynamodb;
pub mod keys;
pub mod logging;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;
