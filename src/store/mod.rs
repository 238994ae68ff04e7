//! # Store
//!
//! The capabilities the cart engine needs from the key-value store, expressed
//! as the [`Store`] trait:
//!
//! - point put, update and delete, each guarded by an optional existence
//!   [`Condition`];
//! - an all-or-nothing [`Store::transact_write`] over a handful of
//!   [`TransactStep`]s;
//! - a range [`Query`] by partition key and sort-key prefix, on the table or
//!   a secondary index, with attribute projection.
//!
//! Two implementations are provided: [`DynamoDb`](crate::dynamodb::DynamoDb)
//! over the AWS SDK and [`InMemoryStore`] for tests and local runs.
//!
//! Each transaction step is tagged with the [`RowKind`] it touches. When the
//! store cancels a transaction it reports a [`StepFailure`] for each step that
//! failed, carrying that tag, so callers classify failures by what the step
//! was rather than by where it sat in the request.

mod dynamo;
mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

use crate::dynamodb::Row;
use crate::keys::{Key, RowKind, SecondaryIndex};

/// Existence predicate a write must satisfy to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    #[default]
    None,
    /// The row must already exist.
    Exists,
    /// The row must not exist yet.
    NotExists,
}

/// One clause of an update expression.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// `SET name = value`
    Set(String, AttributeValue),
    /// `SET name = if_not_exists(name, 0) + delta`
    Increment(String, i64),
}

/// A conditional in-place update of one row.
///
/// If the row does not exist and the condition allows it, the update creates
/// it with the key attributes plus whatever the actions set.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub key: Key,
    pub actions: Vec<UpdateAction>,
    pub condition: Condition,
}

impl Update {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            actions: Vec::new(),
            condition: Condition::None,
        }
    }

    pub fn set(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.actions.push(UpdateAction::Set(name.into(), value));
        self
    }

    pub fn increment(mut self, name: impl Into<String>, delta: i64) -> Self {
        self.actions.push(UpdateAction::Increment(name.into(), delta));
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

/// A single write inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put(Row, Condition),
    Update(Update),
    Delete(Key, Condition),
    /// Asserts a condition on a row without writing it.
    Check(Key, Condition),
}

/// A transaction step and the kind of row it touches.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactStep {
    pub kind: RowKind,
    pub op: WriteOp,
}

impl TransactStep {
    pub fn new(kind: RowKind, op: WriteOp) -> Self {
        Self { kind, op }
    }
}

/// Why the store refused one step of a cancelled transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    ConditionalCheckFailed,
    Other(String),
}

/// The outcome reported for one step of a cancelled transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub kind: RowKind,
    pub reason: CancelReason,
}

/// A range query over the table or one of its secondary indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub partition: String,
    pub sort_prefix: String,
    pub index: Option<SecondaryIndex>,
    pub projection: Vec<&'static str>,
}

impl Query {
    pub fn new(partition: impl Into<String>, sort_prefix: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_prefix: sort_prefix.into(),
            index: None,
            projection: Vec::new(),
        }
    }

    pub fn on_index(mut self, index: SecondaryIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn project(mut self, attributes: &[&'static str]) -> Self {
        self.projection = attributes.to_vec();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("conditional check failed")]
    ConditionFailed,

    #[error("transaction cancelled: {0:?}")]
    TransactionCancelled(Vec<StepFailure>),

    #[error("store request failed: {0}")]
    Request(String),

    #[error("could not decode row: {0}")]
    Decode(String),
}

impl From<serde_dynamo::Error> for StoreError {
    fn from(err: serde_dynamo::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl StoreError {
    /// True when a transaction was cancelled because the condition on a step
    /// of the given kind did not hold.
    pub fn failed_condition_on(&self, kind: RowKind) -> bool {
        match self {
            StoreError::TransactionCancelled(steps) => steps
                .iter()
                .any(|s| s.kind == kind && s.reason == CancelReason::ConditionalCheckFailed),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations a single-table key-value store exposes to the cart engine.
///
/// Every method performs exactly one request against the store. Dropping the
/// returned future abandons the request; a transaction either commits every
/// step or none.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put(&self, table: &str, row: Row, condition: Condition) -> StoreResult<()>;

    async fn update(&self, table: &str, update: Update) -> StoreResult<()>;

    async fn delete(&self, table: &str, key: Key, condition: Condition) -> StoreResult<()>;

    /// Commits all steps atomically or none of them.
    ///
    /// On cancellation the error lists a [`StepFailure`] for every step that
    /// did not succeed.
    async fn transact_write(&self, table: &str, steps: Vec<TransactStep>) -> StoreResult<()>;

    /// Returns matching rows in ascending sort-key order.
    async fn query(&self, table: &str, query: Query) -> StoreResult<Vec<Row>>;
}
