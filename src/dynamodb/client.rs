use anyhow::{anyhow, Result};
use aws_sdk_dynamodb::{
    operation::{create_table::CreateTableOutput, describe_table::DescribeTableOutput},
    types::{
        AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        Projection, ProjectionType, ScalarAttributeType,
    },
    Client,
};
use tracing::{error, info};

use crate::dynamodb::Table;

/// DynamoDB client wrapper.
///
/// Owns the AWS SDK client and provides table management for the cart store:
/// verifying credentials and creating the single store table with its
/// secondary index. Row-level operations are exposed through the
/// [`Store`](crate::store::Store) implementation for this type.
///
/// # Example
///
/// ```no_run
/// use cart_store::dynamodb::{DynamoDb, Table};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = aws_config::load_from_env().await;
/// let ddb = DynamoDb::new(&config);
///
/// ddb.check_auth().await?;
/// ddb.create_table_if_not_exists(&Table::store("Store")).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// Table management returns `anyhow::Result`; row operations return
/// [`StoreError`](crate::store::StoreError) so the engine can classify them.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> Result<()> {
        self.client.list_tables().send().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            anyhow!("Authentication failed")
        })?;
        info!("Authentication successful");
        Ok(())
    }

    // --- Table Operations ---

    /// Creates a table and its secondary indexes if it doesn't exist.
    pub async fn create_table_if_not_exists(
        &self,
        table: &Table<'_>,
    ) -> Result<Option<CreateTableOutput>> {
        if self.table_exists(table.name()).await? {
            info!("Table '{}' exists", table.name());
            return Ok(None);
        }

        let mut attribute_names = vec![table.partition_key()];
        let mut key_schema = vec![key_element(table.partition_key(), KeyType::Hash)?];

        if let Some(sort_key) = table.sort_key() {
            attribute_names.push(sort_key);
            key_schema.push(key_element(sort_key, KeyType::Range)?);
        }

        let mut indexes = Vec::with_capacity(table.indexes().len());
        for index in table.indexes() {
            attribute_names.push(index.partition_key);
            attribute_names.push(index.sort_key);
            indexes.push(
                GlobalSecondaryIndex::builder()
                    .index_name(index.name)
                    .key_schema(key_element(index.partition_key, KeyType::Hash)?)
                    .key_schema(key_element(index.sort_key, KeyType::Range)?)
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()?,
            );
        }

        let attribute_definitions = attribute_names
            .into_iter()
            .map(|name| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .create_table()
            .table_name(table.name())
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .set_global_secondary_indexes((!indexes.is_empty()).then_some(indexes))
            .send()
            .await?;
        info!("Table '{}' created", table.name());
        Ok(Some(output))
    }

    /// Deletes a table if it exists.
    pub async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await?;
        info!("Table '{table_name}' deleted");
        Ok(())
    }

    /// Checks if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let tables = self.client.list_tables().send().await?;
        Ok(tables.table_names().contains(&table_name.to_string()))
    }

    /// Retrieves table description.
    pub async fn describe_table(&self, table_name: &str) -> Result<DescribeTableOutput> {
        self.client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(Into::into)
    }
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    Ok(KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()?)
}
