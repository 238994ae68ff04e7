//! # DynamoDB Module
//!
//! Thin layer over the AWS SDK for the cart store's single table.
//!
//! ## Components
//!
//! - `DynamoDb`: client wrapper; table management here, row operations via
//!   its [`Store`](crate::store::Store) implementation.
//! - `Row`: one table row as a map of named attributes.
//! - `Table`: table name, key attributes and secondary indexes.
//!
//! ## Usage
//!
//! The SDK reads its settings from the environment:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//!
//! Optionally, you can also set:
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., DynamoDB Local).

mod client;
mod row;
mod table;

pub use client::DynamoDb;
pub(crate) use row::{format_number, key_attributes};
pub use row::Row;
pub use table::Table;
