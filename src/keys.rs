//! Key codec for the single store table.
//!
//! Every row lives in one table keyed by `(pk, sk)`:
//!
//! | row          | pk                 | sk                 | gsi1pk               | gsi1sk         |
//! |--------------|--------------------|--------------------|----------------------|----------------|
//! | cart header  | `CART#<cart_id>`   | `CART#<cart_id>`   |                      |                |
//! | cart item    | `CART#<cart_id>`   | `ITEM#<item_id>`   |                      |                |
//! | catalog item | `ITEM#<item_id>`   | `ITEM#<item_id>`   | `CATEGORY#<cat_id>`  | `ITEM#<item_id>` |
//!
//! Callers never build these strings themselves.

use std::fmt;

pub const CART_PREFIX: &str = "CART#";
pub const ITEM_PREFIX: &str = "ITEM#";
pub const CATEGORY_PREFIX: &str = "CATEGORY#";

pub const PARTITION_KEY: &str = "pk";
pub const SORT_KEY: &str = "sk";
pub const KIND_ATTRIBUTE: &str = "kind";

/// The secondary index used to list catalog items by category.
pub const CATEGORY_INDEX: SecondaryIndex = SecondaryIndex {
    name: "gsi1",
    partition_key: "gsi1pk",
    sort_key: "gsi1sk",
};

/// A global secondary index over the store table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: &'static str,
    pub partition_key: &'static str,
    pub sort_key: &'static str,
}

/// What a row in the table represents.
///
/// Stored on every row as the `kind` attribute and used to tag the steps of a
/// multi-item transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    CartHeader,
    CartItem,
    CatalogItem,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::CartHeader => "cart",
            RowKind::CartItem => "cart_item",
            RowKind::CatalogItem => "catalog_item",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key of a single row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub partition: String,
    pub sort: String,
}

impl Key {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key of the header row marking a cart's existence.
    pub fn cart_header(cart_id: &str) -> Self {
        let pk = cart_key(cart_id);
        Self::new(pk.clone(), pk)
    }

    /// Key of one line item inside a cart.
    pub fn cart_item(cart_id: &str, item_id: &str) -> Self {
        Self::new(cart_key(cart_id), item_key(item_id))
    }

    /// Key of the catalog entry for an item.
    pub fn catalog_item(item_id: &str) -> Self {
        let pk = item_key(item_id);
        Self::new(pk.clone(), pk)
    }
}

pub fn cart_key(cart_id: &str) -> String {
    format!("{CART_PREFIX}{cart_id}")
}

pub fn item_key(item_id: &str) -> String {
    format!("{ITEM_PREFIX}{item_id}")
}

pub fn category_index_key(category_id: &str) -> String {
    format!("{CATEGORY_PREFIX}{category_id}")
}
