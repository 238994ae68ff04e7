use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::{BuildError, DisplayErrorContext},
    operation::{
        delete_item::DeleteItemError, put_item::PutItemError,
        transact_write_items::TransactWriteItemsError, update_item::UpdateItemError,
    },
    types::{self as ddb, AttributeValue, CancellationReason, TransactWriteItem},
};
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::{
    CancelReason, Condition, Query, StepFailure, Store, StoreError, StoreResult, TransactStep,
    Update, UpdateAction, WriteOp,
};
use crate::dynamodb::{key_attributes, DynamoDb, Row};
use crate::keys::{Key, RowKind, PARTITION_KEY, SORT_KEY};

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

#[async_trait]
impl Store for DynamoDb {
    async fn put(&self, table: &str, row: Row, condition: Condition) -> StoreResult<()> {
        self.client()
            .put_item()
            .table_name(table)
            .set_item(Some(row.into_attributes()))
            .set_condition_expression(condition_expression(condition))
            .set_expression_attribute_names(condition_names(condition))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(PutItemError::ConditionalCheckFailedException(_)) => {
                    StoreError::ConditionFailed
                }
                _ => request_error(&e),
            })?;

        info!("Item added to '{table}'");
        Ok(())
    }

    async fn update(&self, table: &str, update: Update) -> StoreResult<()> {
        let rendered = RenderedUpdate::new(&update);

        self.client()
            .update_item()
            .table_name(table)
            .set_key(Some(key_attributes(&update.key)))
            .update_expression(rendered.expression)
            .set_condition_expression(condition_expression(update.condition))
            .set_expression_attribute_names(Some(rendered.names))
            .set_expression_attribute_values(Some(rendered.values))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(UpdateItemError::ConditionalCheckFailedException(_)) => {
                    StoreError::ConditionFailed
                }
                _ => request_error(&e),
            })?;

        info!("Item updated in '{table}'");
        Ok(())
    }

    async fn delete(&self, table: &str, key: Key, condition: Condition) -> StoreResult<()> {
        self.client()
            .delete_item()
            .table_name(table)
            .set_key(Some(key_attributes(&key)))
            .set_condition_expression(condition_expression(condition))
            .set_expression_attribute_names(condition_names(condition))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(DeleteItemError::ConditionalCheckFailedException(_)) => {
                    StoreError::ConditionFailed
                }
                _ => request_error(&e),
            })?;

        info!("Item deleted from '{table}'");
        Ok(())
    }

    async fn transact_write(&self, table: &str, steps: Vec<TransactStep>) -> StoreResult<()> {
        let kinds: Vec<RowKind> = steps.iter().map(|step| step.kind).collect();
        let items = steps
            .into_iter()
            .map(|step| transact_item(table, step.op))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        debug!("Writing {} transaction steps to '{table}'", items.len());

        self.client()
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(TransactWriteItemsError::TransactionCanceledException(cancelled)) => {
                    StoreError::TransactionCancelled(step_failures(
                        &kinds,
                        cancelled.cancellation_reasons(),
                    ))
                }
                _ => request_error(&e),
            })?;

        info!("Transaction committed to '{table}'");
        Ok(())
    }

    async fn query(&self, table: &str, query: Query) -> StoreResult<Vec<Row>> {
        let (partition_key, sort_key) = match query.index {
            Some(index) => (index.partition_key, index.sort_key),
            None => (PARTITION_KEY, SORT_KEY),
        };

        let mut rows = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let mut request = self
                .client()
                .query()
                .table_name(table)
                .set_index_name(query.index.map(|index| index.name.to_string()))
                .key_condition_expression("#pk = :pkval AND begins_with(#sk, :skprefix)")
                .expression_attribute_names("#pk", partition_key)
                .expression_attribute_names("#sk", sort_key)
                .expression_attribute_values(":pkval", AttributeValue::S(query.partition.clone()))
                .expression_attribute_values(
                    ":skprefix",
                    AttributeValue::S(query.sort_prefix.clone()),
                )
                .scan_index_forward(true);

            if !query.projection.is_empty() {
                let mut placeholders = Vec::with_capacity(query.projection.len());
                for (i, attr) in query.projection.iter().enumerate() {
                    let placeholder = format!("#proj{i}");
                    request = request.expression_attribute_names(&placeholder, *attr);
                    placeholders.push(placeholder);
                }
                request = request.projection_expression(placeholders.join(", "));
            }

            if let Some(key) = last_evaluated_key {
                request = request.set_exclusive_start_key(Some(key));
            }

            let response = request.send().await.map_err(|e| request_error(&e))?;

            if let Some(items) = response.items {
                rows.extend(items.into_iter().map(Row::from_attributes));
            }

            last_evaluated_key = response.last_evaluated_key;

            if last_evaluated_key.is_none() {
                break;
            }
        }

        debug!("Query on '{table}' returned {} rows", rows.len());
        Ok(rows)
    }
}

fn request_error<E: std::error::Error>(err: &E) -> StoreError {
    let message = DisplayErrorContext(err).to_string();
    error!("DynamoDB request failed: {message}");
    StoreError::Request(message)
}

fn condition_expression(condition: Condition) -> Option<String> {
    match condition {
        Condition::None => None,
        Condition::Exists => Some("attribute_exists(#pk) AND attribute_exists(#sk)".to_string()),
        Condition::NotExists => {
            Some("attribute_not_exists(#pk) AND attribute_not_exists(#sk)".to_string())
        }
    }
}

fn condition_names(condition: Condition) -> Option<HashMap<String, String>> {
    match condition {
        Condition::None => None,
        Condition::Exists | Condition::NotExists => Some(HashMap::from([
            ("#pk".to_string(), PARTITION_KEY.to_string()),
            ("#sk".to_string(), SORT_KEY.to_string()),
        ])),
    }
}

/// An update expression with its placeholder maps.
struct RenderedUpdate {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl RenderedUpdate {
    fn new(update: &Update) -> Self {
        let mut clauses = Vec::with_capacity(update.actions.len());
        let mut names = condition_names(update.condition).unwrap_or_default();
        let mut values = HashMap::new();

        for (i, action) in update.actions.iter().enumerate() {
            let placeholder = format!("#attr{i}");
            let value_placeholder = format!(":val{i}");

            match action {
                UpdateAction::Set(attr_name, attr_value) => {
                    clauses.push(format!("{placeholder} = {value_placeholder}"));
                    names.insert(placeholder, attr_name.clone());
                    values.insert(value_placeholder, attr_value.clone());
                }
                UpdateAction::Increment(attr_name, delta) => {
                    clauses.push(format!(
                        "{placeholder} = if_not_exists({placeholder}, :zero) + {value_placeholder}"
                    ));
                    names.insert(placeholder, attr_name.clone());
                    values.insert(value_placeholder, AttributeValue::N(delta.to_string()));
                    values.insert(":zero".to_string(), AttributeValue::N("0".to_string()));
                }
            }
        }

        Self {
            expression: format!("SET {}", clauses.join(", ")),
            names,
            values,
        }
    }
}

fn transact_item(table: &str, op: WriteOp) -> Result<TransactWriteItem, BuildError> {
    let item = match op {
        WriteOp::Put(row, condition) => TransactWriteItem::builder().put(
            ddb::Put::builder()
                .table_name(table)
                .set_item(Some(row.into_attributes()))
                .set_condition_expression(condition_expression(condition))
                .set_expression_attribute_names(condition_names(condition))
                .build()?,
        ),
        WriteOp::Update(update) => {
            let rendered = RenderedUpdate::new(&update);
            TransactWriteItem::builder().update(
                ddb::Update::builder()
                    .table_name(table)
                    .set_key(Some(key_attributes(&update.key)))
                    .update_expression(rendered.expression)
                    .set_condition_expression(condition_expression(update.condition))
                    .set_expression_attribute_names(Some(rendered.names))
                    .set_expression_attribute_values(Some(rendered.values))
                    .build()?,
            )
        }
        WriteOp::Delete(key, condition) => TransactWriteItem::builder().delete(
            ddb::Delete::builder()
                .table_name(table)
                .set_key(Some(key_attributes(&key)))
                .set_condition_expression(condition_expression(condition))
                .set_expression_attribute_names(condition_names(condition))
                .build()?,
        ),
        WriteOp::Check(key, condition) => TransactWriteItem::builder().condition_check(
            ddb::ConditionCheck::builder()
                .table_name(table)
                .set_key(Some(key_attributes(&key)))
                .set_condition_expression(condition_expression(condition))
                .set_expression_attribute_names(condition_names(condition))
                .build()?,
        ),
    };
    Ok(item.build())
}

/// Pairs each cancellation reason with the kind of the step it belongs to.
///
/// DynamoDB reports one reason per request item, in request order, with code
/// `None` for the steps that did not fail.
fn step_failures(kinds: &[RowKind], reasons: &[CancellationReason]) -> Vec<StepFailure> {
    kinds
        .iter()
        .zip(reasons)
        .filter_map(|(kind, reason)| {
            let reason = match reason.code() {
                None | Some("None") => return None,
                Some(CONDITIONAL_CHECK_FAILED) => CancelReason::ConditionalCheckFailed,
                Some(code) => CancelReason::Other(code.to_string()),
            };
            Some(StepFailure {
                kind: *kind,
                reason,
            })
        })
        .collect()
}
