use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    CancelReason, Condition, Query, StepFailure, Store, StoreError, StoreResult, TransactStep,
    Update, UpdateAction, WriteOp,
};
use crate::dynamodb::{key_attributes, Row};
use crate::keys::Key;

type Rows = BTreeMap<Key, Row>;

/// In-memory store implementation for testing.
///
/// Keeps every table as an ordered map from primary key to row and applies
/// the same conditional semantics as DynamoDB. Each request takes the write
/// lock once, so a transaction's condition checks and writes happen as one
/// step, and concurrent increments never lose updates.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Rows>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following request fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of rows stored in a table.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Rows::len)
    }

    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }

    /// Returns a copy of a single row.
    pub async fn get(&self, table: &str, key: &Key) -> Option<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .and_then(|rows| rows.get(key))
            .cloned()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Request("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("unavailable", &self.unavailable.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put(&self, table: &str, row: Row, condition: Condition) -> StoreResult<()> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        apply(
            tables.entry(table.to_string()).or_default(),
            WriteOp::Put(row, condition),
        )
    }

    async fn update(&self, table: &str, update: Update) -> StoreResult<()> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        apply(
            tables.entry(table.to_string()).or_default(),
            WriteOp::Update(update),
        )
    }

    async fn delete(&self, table: &str, key: Key, condition: Condition) -> StoreResult<()> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        apply(
            tables.entry(table.to_string()).or_default(),
            WriteOp::Delete(key, condition),
        )
    }

    async fn transact_write(&self, table: &str, steps: Vec<TransactStep>) -> StoreResult<()> {
        self.ensure_available()?;

        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(target(&step.op)?) {
                return Err(StoreError::Request(
                    "transaction touches the same row more than once".to_string(),
                ));
            }
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let mut failures = Vec::new();
        for step in &steps {
            let (key, condition) = match &step.op {
                WriteOp::Put(row, condition) => (row_key(row)?, *condition),
                WriteOp::Update(update) => (update.key.clone(), update.condition),
                WriteOp::Delete(key, condition) | WriteOp::Check(key, condition) => {
                    (key.clone(), *condition)
                }
            };
            if !holds(rows, &key, condition) {
                failures.push(StepFailure {
                    kind: step.kind,
                    reason: CancelReason::ConditionalCheckFailed,
                });
            }
        }
        if !failures.is_empty() {
            return Err(StoreError::TransactionCancelled(failures));
        }

        let mut staged = rows.clone();
        for step in steps {
            apply(&mut staged, step.op)?;
        }
        *rows = staged;
        Ok(())
    }

    async fn query(&self, table: &str, query: Query) -> StoreResult<Vec<Row>> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<(&String, &Row)> = match query.index {
            None => rows
                .iter()
                .filter(|(key, _)| {
                    key.partition == query.partition && key.sort.starts_with(&query.sort_prefix)
                })
                .map(|(key, row)| (&key.sort, row))
                .collect(),
            Some(index) => rows
                .values()
                .filter_map(|row| {
                    let partition = row.get_string(index.partition_key)?;
                    let sort = row.get_string(index.sort_key)?;
                    (*partition == query.partition && sort.starts_with(&query.sort_prefix))
                        .then_some((sort, row))
                })
                .collect(),
        };
        matches.sort_by(|a, b| a.0.cmp(b.0));

        Ok(matches
            .into_iter()
            .map(|(_, row)| row.clone().project(&query.projection))
            .collect())
    }
}

fn row_key(row: &Row) -> StoreResult<Key> {
    row.key()
        .ok_or_else(|| StoreError::Request("row is missing its key attributes".to_string()))
}

fn target(op: &WriteOp) -> StoreResult<Key> {
    match op {
        WriteOp::Put(row, _) => row_key(row),
        WriteOp::Update(update) => Ok(update.key.clone()),
        WriteOp::Delete(key, _) | WriteOp::Check(key, _) => Ok(key.clone()),
    }
}

fn holds(rows: &Rows, key: &Key, condition: Condition) -> bool {
    match condition {
        Condition::None => true,
        Condition::Exists => rows.contains_key(key),
        Condition::NotExists => !rows.contains_key(key),
    }
}

fn apply(rows: &mut Rows, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Put(row, condition) => {
            let key = row_key(&row)?;
            if !holds(rows, &key, condition) {
                return Err(StoreError::ConditionFailed);
            }
            rows.insert(key, row);
        }
        WriteOp::Update(update) => {
            if !holds(rows, &update.key, update.condition) {
                return Err(StoreError::ConditionFailed);
            }
            let mut attributes = rows
                .get(&update.key)
                .map(|row| row.clone().into_attributes())
                .unwrap_or_else(|| key_attributes(&update.key));
            for action in update.actions {
                match action {
                    UpdateAction::Set(name, value) => {
                        attributes.insert(name, value);
                    }
                    UpdateAction::Increment(name, delta) => {
                        let current = match attributes.get(&name) {
                            None => 0,
                            Some(value) => value
                                .as_n()
                                .ok()
                                .and_then(|n| n.parse::<i64>().ok())
                                .ok_or_else(|| {
                                    StoreError::Request(format!(
                                        "attribute '{name}' is not an integer"
                                    ))
                                })?,
                        };
                        let next = current.checked_add(delta).ok_or_else(|| {
                            StoreError::Request(format!("attribute '{name}' would overflow"))
                        })?;
                        attributes.insert(
                            name,
                            aws_sdk_dynamodb::types::AttributeValue::N(next.to_string()),
                        );
                    }
                }
            }
            rows.insert(update.key, Row::from_attributes(attributes));
        }
        WriteOp::Delete(key, condition) => {
            if !holds(rows, &key, condition) {
                return Err(StoreError::ConditionFailed);
            }
            rows.remove(&key);
        }
        WriteOp::Check(key, condition) => {
            if !holds(rows, &key, condition) {
                return Err(StoreError::ConditionFailed);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{RowKind, CATEGORY_INDEX};
    use anyhow::Result;
    use aws_sdk_dynamodb::types::AttributeValue;

    const TABLE: &str = "Store";

    fn cart_item_row(cart_id: &str, item_id: &str) -> Row {
        Row::keyed(&Key::cart_item(cart_id, item_id), RowKind::CartItem)
            .set_string("item_id", item_id)
            .set_integer("quantity", 1)
    }

    #[tokio::test]
    async fn test_put_conditions() -> Result<()> {
        let store = InMemoryStore::new();
        let row = cart_item_row("c1", "i1");

        store.put(TABLE, row.clone(), Condition::NotExists).await?;
        assert_eq!(
            store.put(TABLE, row.clone(), Condition::NotExists).await,
            Err(StoreError::ConditionFailed)
        );
        store.put(TABLE, row, Condition::Exists).await?;
        assert_eq!(store.len(TABLE).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_increment_initializes_missing_attribute() -> Result<()> {
        let store = InMemoryStore::new();
        let key = Key::cart_item("c1", "i1");

        store
            .update(TABLE, Update::new(key.clone()).increment("quantity", 2))
            .await?;
        store
            .update(TABLE, Update::new(key.clone()).increment("quantity", 3))
            .await?;

        let row = store.get(TABLE, &key).await.unwrap();
        assert_eq!(row.get_integer("quantity"), Some(5));
        assert_eq!(row.key(), Some(key));
        Ok(())
    }

    #[tokio::test]
    async fn test_increment_overflow_is_rejected() -> Result<()> {
        let store = InMemoryStore::new();
        let key = Key::cart_item("c1", "i1");
        store
            .put(
                TABLE,
                Row::keyed(&key, RowKind::CartItem).set_integer("quantity", i64::MAX - 1),
                Condition::None,
            )
            .await?;

        let result = store
            .update(TABLE, Update::new(key.clone()).increment("quantity", 5))
            .await;

        assert!(matches!(result, Err(StoreError::Request(_))));
        let row = store.get(TABLE, &key).await.unwrap();
        assert_eq!(row.get_integer("quantity"), Some(i64::MAX - 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_require_existing_row() {
        let store = InMemoryStore::new();
        let key = Key::cart_item("c1", "missing");

        let update = Update::new(key.clone())
            .set("quantity", AttributeValue::N("5".to_string()))
            .when(Condition::Exists);
        assert_eq!(
            store.update(TABLE, update).await,
            Err(StoreError::ConditionFailed)
        );
        assert_eq!(
            store.delete(TABLE, key, Condition::Exists).await,
            Err(StoreError::ConditionFailed)
        );
        assert!(store.is_empty(TABLE).await);
    }

    #[tokio::test]
    async fn test_cancelled_transaction_writes_nothing() {
        let store = InMemoryStore::new();
        let steps = vec![
            TransactStep::new(
                RowKind::CartHeader,
                WriteOp::Put(
                    Row::keyed(&Key::cart_header("c1"), RowKind::CartHeader),
                    Condition::NotExists,
                ),
            ),
            TransactStep::new(
                RowKind::CatalogItem,
                WriteOp::Check(Key::catalog_item("i1"), Condition::Exists),
            ),
        ];

        let err = store.transact_write(TABLE, steps).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::TransactionCancelled(vec![StepFailure {
                kind: RowKind::CatalogItem,
                reason: CancelReason::ConditionalCheckFailed,
            }])
        );
        assert!(store.is_empty(TABLE).await);
    }

    #[tokio::test]
    async fn test_transaction_rejects_duplicate_targets() {
        let store = InMemoryStore::new();
        let key = Key::cart_item("c1", "i1");
        let steps = vec![
            TransactStep::new(
                RowKind::CartItem,
                WriteOp::Check(key.clone(), Condition::None),
            ),
            TransactStep::new(
                RowKind::CartItem,
                WriteOp::Delete(key, Condition::None),
            ),
        ];

        assert!(matches!(
            store.transact_write(TABLE, steps).await,
            Err(StoreError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_query_prefix_order_and_projection() -> Result<()> {
        let store = InMemoryStore::new();
        for item_id in ["b", "a", "c"] {
            store
                .put(TABLE, cart_item_row("c1", item_id), Condition::None)
                .await?;
        }
        store
            .put(TABLE, cart_item_row("c2", "z"), Condition::None)
            .await?;
        store
            .put(
                TABLE,
                Row::keyed(&Key::cart_header("c1"), RowKind::CartHeader),
                Condition::None,
            )
            .await?;

        let rows = store
            .query(TABLE, Query::new("CART#c1", "ITEM#").project(&["item_id"]))
            .await?;

        let ids: Vec<_> = rows
            .iter()
            .filter_map(|row| row.get_string("item_id").cloned())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(rows.iter().all(|row| row.get("pk").is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn test_query_on_index() -> Result<()> {
        let store = InMemoryStore::new();
        for (item_id, category) in [("2", "1"), ("1", "1"), ("3", "2")] {
            let row = Row::keyed(&Key::catalog_item(item_id), RowKind::CatalogItem)
                .set_string("item_id", item_id)
                .set_string("gsi1pk", format!("CATEGORY#{category}"))
                .set_string("gsi1sk", format!("ITEM#{item_id}"));
            store.put(TABLE, row, Condition::None).await?;
        }

        let rows = store
            .query(
                TABLE,
                Query::new("CATEGORY#1", "ITEM#").on_index(CATEGORY_INDEX),
            )
            .await?;

        let ids: Vec<_> = rows
            .iter()
            .filter_map(|row| row.get_string("item_id").cloned())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.query(TABLE, Query::new("CART#c1", "ITEM#")).await,
            Err(StoreError::Request(_))
        ));
    }
}
