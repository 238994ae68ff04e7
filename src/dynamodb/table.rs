use crate::keys::{SecondaryIndex, CATEGORY_INDEX, PARTITION_KEY, SORT_KEY};

/// DynamoDB table configuration.
///
/// Describes the table's name, its key attributes and the global secondary
/// indexes to create alongside it. All key attributes are strings.
///
/// The cart store keeps carts, cart items and catalog items in one table;
/// [`Table::store`] returns that layout.
///
/// # Example
///
/// ```
/// use cart_store::dynamodb::Table;
///
/// let table = Table::store("Store");
///
/// assert_eq!(table.partition_key(), "pk");
/// assert_eq!(table.sort_key(), Some("sk"));
/// assert_eq!(table.indexes().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Table<'a> {
    name: &'a str,
    partition_key: &'a str,
    sort_key: Option<&'a str>,
    indexes: Vec<SecondaryIndex>,
}

impl<'a> Table<'a> {
    /// Creates a new `Table` instance.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `partition_key` - The name of the partition key attribute.
    /// * `sort_key` - The name of the sort key attribute, if any.
    pub fn new(name: &'a str, partition_key: &'a str, sort_key: Option<&'a str>) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
            indexes: Vec::new(),
        }
    }

    /// The single table holding carts and the catalog.
    pub fn store(name: &'a str) -> Self {
        Self::new(name, PARTITION_KEY, Some(SORT_KEY)).with_index(CATEGORY_INDEX)
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Returns the partition key of the table.
    pub fn partition_key(&self) -> &str {
        self.partition_key
    }

    /// Returns the sort key of the table, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key
    }

    /// Adds a global secondary index and returns the modified `Table`.
    pub fn with_index(mut self, index: SecondaryIndex) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn indexes(&self) -> &[SecondaryIndex] {
        &self.indexes
    }
}
