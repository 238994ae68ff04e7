//! Read-only access to the item catalog.
//!
//! Catalog rows are addressed by `ITEM#<item_id>` and indexed by category on
//! the `gsi1` secondary index. The cart engine only checks that a catalog
//! row exists; listing lives here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dynamodb::Row;
use crate::keys::{category_index_key, item_key, Key, RowKind, CATEGORY_INDEX, ITEM_PREFIX};
use crate::store::{Query, Store};

const PROJECTION: [&str; 3] = ["item_id", "description", "price"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("CategoryIDIsEmpty")]
    CategoryIdIsEmpty,

    #[error("CouldNotLoadItems")]
    CouldNotLoadItems,

    #[error("StoreTableNameIsEmpty")]
    StoreTableNameIsEmpty,
}

/// An entry of the item master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: String,
    pub description: String,
    pub price: f64,
}

impl CatalogItem {
    /// The row storing this item under `category_id`.
    pub fn to_row(&self, category_id: &str) -> Row {
        Row::keyed(&Key::catalog_item(&self.item_id), RowKind::CatalogItem)
            .set_string("item_id", self.item_id.as_str())
            .set_string("description", self.description.as_str())
            .set_number("price", self.price)
            .set_string(CATEGORY_INDEX.partition_key, category_index_key(category_id))
            .set_string(CATEGORY_INDEX.sort_key, item_key(&self.item_id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogList {
    pub items: Vec<CatalogItem>,
}

/// Lists catalog items by category.
#[derive(Debug)]
pub struct Catalog<S> {
    store: S,
    table_name: String,
}

impl<S: Store> Catalog<S> {
    pub fn new(store: S, table_name: impl Into<String>) -> Result<Self, CatalogError> {
        let table_name = table_name.into();
        if table_name.is_empty() {
            return Err(CatalogError::StoreTableNameIsEmpty);
        }
        Ok(Self { store, table_name })
    }

    /// Returns the items of a category in item id order.
    pub async fn list(&self, category_id: &str) -> Result<CatalogList, CatalogError> {
        if category_id.is_empty() {
            return Err(CatalogError::CategoryIdIsEmpty);
        }

        let query = Query::new(category_index_key(category_id), ITEM_PREFIX)
            .on_index(CATEGORY_INDEX)
            .project(&PROJECTION);

        let rows = self
            .store
            .query(&self.table_name, query)
            .await
            .map_err(|e| {
                tracing::error!("Error loading items for category {category_id}: {e}");
                CatalogError::CouldNotLoadItems
            })?;

        let items = rows
            .into_iter()
            .map(Row::deserialize::<CatalogItem>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!("Error decoding items for category {category_id}: {e}");
                CatalogError::CouldNotLoadItems
            })?;

        tracing::debug!("Loaded {} items for category {category_id}", items.len());
        Ok(CatalogList { items })
    }
}
