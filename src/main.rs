mod command_line;

use anyhow::Result;
use aws_config::BehaviorVersion;
use cart_store::cart::{CartService, TracingObserver};
use cart_store::catalog::Catalog;
use cart_store::config::Config;
use cart_store::dynamodb::{DynamoDb, Table};
use cart_store::logging;
use cart_store::utils::retry_with_backoff;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init_logging(config.log_level, config.log_pretty)?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;

    let ddb = DynamoDb::new(&sdk_config);
    ddb.check_auth().await?;

    let table = Table::store(&config.table_name);
    match retry_with_backoff(
        || ddb.create_table_if_not_exists(&table),
        Duration::from_secs(1),
        5,
    )
    .await?
    {
        Some(output) => {
            if let Some(description) = output.table_description() {
                info!("Table status: {:?}", description.table_status());
            }
        }
        None => info!("Using table '{}'", table.name()),
    }

    let carts = CartService::new(ddb.clone(), config.table_name.as_str())?
        .with_observer(Arc::new(TracingObserver));
    let catalog = Catalog::new(ddb.clone(), config.table_name.as_str())?;

    command_line::run(&ddb, &table, &carts, &catalog).await
}
