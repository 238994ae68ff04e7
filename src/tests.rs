//! Tests for the cart engine and catalog.
//!
//! These tests cover:
//! - Creating carts and merging repeated adds of the same item
//! - Validation order and create-time preconditions
//! - Quantity replacement and item deletion
//! - Totals, empty carts and unknown carts
//! - Transaction atomicity when the catalog item is missing
//! - Concurrent adds of the same item
//! - Store failures and what observers see
//! - Catalog listing by category
//!
//! Everything runs against `InMemoryStore`, except `test_dynamodb_cart_flow`
//! which needs a reachable DynamoDB (e.g. DynamoDB Local with
//! `AWS_ENDPOINT_URL=http://localhost:8000`) and is ignored by default:
//!
//! ```text
//! cargo test -- --ignored
//! ```

use crate::cart::validation::MAX_QUANTITY;
use crate::cart::{
    Cart, CartError, CartObserver, CartService, DeleteItem, NewItem, Operation, UpdateItem,
};
use crate::catalog::{Catalog, CatalogError, CatalogItem};
use crate::dynamodb::{DynamoDb, Table};
use crate::keys::Key;
use crate::store::{Condition, InMemoryStore, Store, StoreError};
use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tracing::{info, instrument};

const TEST_TABLE_NAME: &str = "test-store";
const CATEGORY_ID: &str = "1";

fn mug() -> CatalogItem {
    CatalogItem {
        item_id: "11aa".to_string(),
        description: "Coffee mug".to_string(),
        price: 10.0,
    }
}

fn kettle() -> CatalogItem {
    CatalogItem {
        item_id: "22bb".to_string(),
        description: "Kettle".to_string(),
        price: 5.0,
    }
}

fn new_item(cart_id: &str, item: &CatalogItem, quantity: i64) -> NewItem {
    NewItem {
        cart_id: cart_id.to_string(),
        item_id: item.item_id.clone(),
        description: item.description.clone(),
        price: Some(item.price),
        quantity: Some(quantity),
    }
}

async fn seed_catalog<S: Store>(store: &S, items: &[CatalogItem]) -> Result<()> {
    for item in items {
        store
            .put(TEST_TABLE_NAME, item.to_row(CATEGORY_ID), Condition::None)
            .await?;
    }
    Ok(())
}

#[instrument]
async fn setup() -> Result<(InMemoryStore, CartService<InMemoryStore>)> {
    let store = InMemoryStore::new();
    seed_catalog(&store, &[mug(), kettle()]).await?;
    let carts = CartService::new(store.clone(), TEST_TABLE_NAME)?;
    Ok((store, carts))
}

#[derive(Default)]
struct RecordingObserver {
    succeeded: Mutex<Vec<(Operation, String)>>,
    failed: Mutex<Vec<(Operation, CartError, Option<StoreError>)>>,
}

impl CartObserver for RecordingObserver {
    fn succeeded(&self, operation: Operation, cart: &Cart) {
        self.succeeded
            .lock()
            .unwrap()
            .push((operation, cart.cart_id().to_string()));
    }

    fn failed(
        &self,
        operation: Operation,
        _cart_id: &str,
        error: CartError,
        cause: Option<&StoreError>,
    ) {
        self.failed
            .lock()
            .unwrap()
            .push((operation, error, cause.cloned()));
    }
}

#[tokio::test]
async fn test_create_then_add_merges_quantity() -> Result<()> {
    let (_store, carts) = setup().await?;

    info!("Creating cart");
    let cart = carts.create_and_add_item(new_item("", &mug(), 2)).await?;
    assert!(!cart.cart_id().is_empty());
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 2);

    info!("Adding the same item again");
    let cart = carts
        .add_item(new_item(cart.cart_id(), &mug(), 2))
        .await?;
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 4);

    let loaded = carts.load(cart.cart_id()).await?;
    assert_eq!(loaded, cart);
    assert_eq!(loaded.count(), 4);
    assert_eq!(loaded.total(), 40.0);
    Ok(())
}

#[tokio::test]
async fn test_create_generates_distinct_ids() -> Result<()> {
    let (_store, carts) = setup().await?;

    let first = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    let second = carts.create_and_add_item(new_item("", &mug(), 1)).await?;

    assert_ne!(first.cart_id(), second.cart_id());
    assert_eq!(carts.load(first.cart_id()).await?.count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_create_with_cart_id_is_rejected_first() -> Result<()> {
    let (store, carts) = setup().await?;
    let rows_before = store.len(TEST_TABLE_NAME).await;

    let err = carts
        .create_and_add_item(NewItem {
            cart_id: "wrongID".to_string(),
            ..NewItem::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err, CartError::CartIdProvidedOnCreate);
    assert_eq!(store.len(TEST_TABLE_NAME).await, rows_before);
    Ok(())
}

#[tokio::test]
async fn test_create_validation_order() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cases = [
        (
            NewItem {
                item_id: String::new(),
                description: String::new(),
                ..new_item("", &mug(), 1)
            },
            CartError::ItemIdIsEmpty,
        ),
        (
            NewItem {
                description: String::new(),
                ..new_item("", &mug(), 1)
            },
            CartError::DescriptionIsEmpty,
        ),
        (
            NewItem {
                price: None,
                ..new_item("", &mug(), 1)
            },
            CartError::PriceIsEmpty,
        ),
        (
            NewItem {
                price: Some(-1.0),
                quantity: None,
                ..new_item("", &mug(), 1)
            },
            CartError::PriceIsInvalid,
        ),
        (
            NewItem {
                quantity: None,
                ..new_item("", &mug(), 1)
            },
            CartError::QuantityIsEmpty,
        ),
        (new_item("", &mug(), -1), CartError::QuantityIsInvalid),
    ];

    for (item, expected) in cases {
        assert_eq!(carts.create_and_add_item(item).await, Err(expected));
    }
    Ok(())
}

#[tokio::test]
async fn test_add_item_requires_cart_id() -> Result<()> {
    let (_store, carts) = setup().await?;

    assert_eq!(
        carts.add_item(NewItem::default()).await,
        Err(CartError::CartIdIsEmpty)
    );
    Ok(())
}

#[tokio::test]
async fn test_add_second_item() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cart = carts.create_and_add_item(new_item("", &mug(), 2)).await?;
    let cart = carts
        .add_item(new_item(cart.cart_id(), &kettle(), 3))
        .await?;

    let ids: Vec<_> = cart.items().iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids, vec!["11aa", "22bb"]);
    assert_eq!(cart.total(), 35.0);
    assert_eq!(cart.count(), 5);
    Ok(())
}

#[tokio::test]
async fn test_oversized_quantity_and_price_are_rejected() -> Result<()> {
    let (store, carts) = setup().await?;
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    let rows_before = store.len(TEST_TABLE_NAME).await;

    assert_eq!(
        carts.add_item(new_item(cart.cart_id(), &mug(), i64::MAX)).await,
        Err(CartError::QuantityIsInvalid)
    );
    assert_eq!(
        carts
            .add_item(NewItem {
                price: Some(1e300),
                ..new_item(cart.cart_id(), &mug(), 1)
            })
            .await,
        Err(CartError::PriceIsInvalid)
    );
    assert_eq!(
        carts
            .update_item(UpdateItem {
                cart_id: cart.cart_id().to_string(),
                item_id: mug().item_id,
                quantity: Some(i64::MAX),
            })
            .await,
        Err(CartError::QuantityIsInvalid)
    );

    let cart = carts
        .add_item(new_item(cart.cart_id(), &mug(), MAX_QUANTITY))
        .await?;
    assert_eq!(cart.count(), MAX_QUANTITY + 1);
    assert_eq!(store.len(TEST_TABLE_NAME).await, rows_before);
    Ok(())
}

#[tokio::test]
async fn test_tiny_price_is_stored_rounded() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cart = carts
        .create_and_add_item(NewItem {
            price: Some(5e-324),
            ..new_item("", &mug(), 1)
        })
        .await?;
    let cart = carts
        .add_item(NewItem {
            price: Some(0.1 + 0.2),
            ..new_item(cart.cart_id(), &mug(), 1)
        })
        .await?;

    assert_eq!(cart.items()[0].price, 0.3);
    Ok(())
}

#[tokio::test]
async fn test_stored_quantity_near_overflow() -> Result<()> {
    let (store, carts) = setup().await?;
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    for item in [&mug(), &kettle()] {
        let row = crate::dynamodb::Row::keyed(
            &Key::cart_item(cart.cart_id(), &item.item_id),
            crate::keys::RowKind::CartItem,
        )
        .set_string("item_id", item.item_id.as_str())
        .set_string("description", item.description.as_str())
        .set_number("price", item.price)
        .set_integer("quantity", i64::MAX - 1);
        store.put(TEST_TABLE_NAME, row, Condition::None).await?;
    }

    info!("Incrementing past i64::MAX");
    assert_eq!(
        carts.add_item(new_item(cart.cart_id(), &mug(), 5)).await,
        Err(CartError::CouldNotAddItem)
    );

    let cart = carts.load(cart.cart_id()).await?;
    assert_eq!(cart.item("11aa").map(|i| i.quantity), Some(i64::MAX - 1));
    assert_eq!(cart.count(), i64::MAX);
    Ok(())
}

#[tokio::test]
async fn test_add_to_unknown_cart_fails() -> Result<()> {
    let (store, carts) = setup().await?;
    let rows_before = store.len(TEST_TABLE_NAME).await;

    assert_eq!(
        carts.add_item(new_item("no-such-cart", &mug(), 1)).await,
        Err(CartError::CouldNotAddItem)
    );
    assert_eq!(store.len(TEST_TABLE_NAME).await, rows_before);
    Ok(())
}

#[tokio::test]
async fn test_missing_catalog_item_leaves_nothing_behind() -> Result<()> {
    let (store, carts) = setup().await?;
    let rows_before = store.len(TEST_TABLE_NAME).await;
    let ghost = CatalogItem {
        item_id: "99zz".to_string(),
        description: "Not in the catalog".to_string(),
        price: 1.0,
    };

    info!("Creating cart with an unknown item");
    assert_eq!(
        carts.create_and_add_item(new_item("", &ghost, 1)).await,
        Err(CartError::ItemDoesNotExist)
    );
    assert_eq!(store.len(TEST_TABLE_NAME).await, rows_before);

    info!("Adding an unknown item to an existing cart");
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    assert_eq!(
        carts.add_item(new_item(cart.cart_id(), &ghost, 1)).await,
        Err(CartError::ItemDoesNotExist)
    );

    let loaded = carts.load(cart.cart_id()).await?;
    assert!(loaded.item("99zz").is_none());
    assert_eq!(
        store
            .get(TEST_TABLE_NAME, &Key::cart_item(cart.cart_id(), "99zz"))
            .await,
        None
    );
    Ok(())
}

#[tokio::test]
async fn test_update_replaces_quantity() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cart = carts.create_and_add_item(new_item("", &mug(), 3)).await?;
    let cart = carts
        .update_item(UpdateItem {
            cart_id: cart.cart_id().to_string(),
            item_id: mug().item_id,
            quantity: Some(5),
        })
        .await?;

    assert_eq!(cart.item("11aa").map(|i| i.quantity), Some(5));
    assert_eq!(cart.count(), 5);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_item_fails() -> Result<()> {
    let (store, carts) = setup().await?;
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;

    let err = carts
        .update_item(UpdateItem {
            cart_id: cart.cart_id().to_string(),
            item_id: kettle().item_id,
            quantity: Some(2),
        })
        .await
        .unwrap_err();

    assert_eq!(err, CartError::CouldNotUpdateItem);
    assert_eq!(
        store
            .get(TEST_TABLE_NAME, &Key::cart_item(cart.cart_id(), "22bb"))
            .await,
        None
    );
    Ok(())
}

#[tokio::test]
async fn test_update_validation() -> Result<()> {
    let (_store, carts) = setup().await?;

    assert_eq!(
        carts
            .update_item(UpdateItem {
                cart_id: "c1".to_string(),
                item_id: "11aa".to_string(),
                quantity: Some(0),
            })
            .await,
        Err(CartError::QuantityIsInvalid)
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_item() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    carts
        .add_item(new_item(cart.cart_id(), &kettle(), 1))
        .await?;

    let delete = DeleteItem {
        cart_id: cart.cart_id().to_string(),
        item_id: mug().item_id,
    };
    let cart = carts.delete_item(delete.clone()).await?;
    assert!(cart.item("11aa").is_none());
    assert_eq!(cart.items().len(), 1);

    info!("Deleting the same item twice");
    assert_eq!(
        carts.delete_item(delete).await,
        Err(CartError::CouldNotDeleteItem)
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_last_item_leaves_empty_cart() -> Result<()> {
    let (_store, carts) = setup().await?;

    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    let cart = carts
        .delete_item(DeleteItem {
            cart_id: cart.cart_id().to_string(),
            item_id: mug().item_id,
        })
        .await?;

    assert!(cart.is_empty());
    assert_eq!(cart.total(), 0.0);
    assert_eq!(cart.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_load_unknown_cart_is_empty() -> Result<()> {
    let (store, carts) = setup().await?;
    let rows_before = store.len(TEST_TABLE_NAME).await;

    let cart = carts.load("never-created").await?;
    assert_eq!(cart.cart_id(), "never-created");
    assert!(cart.is_empty());
    assert_eq!(carts.load("never-created").await?, cart);
    assert_eq!(store.len(TEST_TABLE_NAME).await, rows_before);

    assert_eq!(carts.load("").await, Err(CartError::CartIdIsEmpty));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_adds_do_not_lose_updates() -> Result<()> {
    let (_store, carts) = setup().await?;
    let carts = Arc::new(carts);
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let carts = Arc::clone(&carts);
            let item = new_item(cart.cart_id(), &mug(), 1);
            tokio::spawn(async move { carts.add_item(item).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let cart = carts.load(cart.cart_id()).await?;
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 11);
    Ok(())
}

#[tokio::test]
async fn test_store_failures_map_to_generic_errors() -> Result<()> {
    let (store, carts) = setup().await?;
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;

    store.set_unavailable(true);
    assert_eq!(
        carts.load(cart.cart_id()).await,
        Err(CartError::CouldNotLoadItems)
    );
    assert_eq!(
        carts.create_and_add_item(new_item("", &mug(), 1)).await,
        Err(CartError::CouldNotCreateCart)
    );
    assert_eq!(
        carts.add_item(new_item(cart.cart_id(), &mug(), 1)).await,
        Err(CartError::CouldNotAddItem)
    );

    store.set_unavailable(false);
    assert_eq!(carts.load(cart.cart_id()).await?.count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_undecodable_rows() -> Result<()> {
    let (store, carts) = setup().await?;
    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;

    let broken = crate::dynamodb::Row::keyed(
        &Key::cart_item(cart.cart_id(), "broken"),
        crate::keys::RowKind::CartItem,
    )
    .set_string("item_id", "broken");
    store
        .put(TEST_TABLE_NAME, broken, Condition::None)
        .await?;

    assert_eq!(
        carts.load(cart.cart_id()).await,
        Err(CartError::CouldNotLoadCart)
    );
    Ok(())
}

#[tokio::test]
async fn test_observer_sees_causes() -> Result<()> {
    let (_store, carts) = setup().await?;
    let observer = Arc::new(RecordingObserver::default());
    let carts = carts.with_observer(observer.clone());

    let cart = carts.create_and_add_item(new_item("", &mug(), 1)).await?;
    let _ = carts
        .update_item(UpdateItem {
            cart_id: cart.cart_id().to_string(),
            item_id: kettle().item_id,
            quantity: Some(2),
        })
        .await;
    let _ = carts.load("").await;

    let succeeded = observer.succeeded.lock().unwrap().clone();
    assert_eq!(
        succeeded,
        vec![(Operation::CreateAndAddItem, cart.cart_id().to_string())]
    );

    let failed = observer.failed.lock().unwrap().clone();
    assert_eq!(
        failed,
        vec![
            (
                Operation::UpdateItem,
                CartError::CouldNotUpdateItem,
                Some(StoreError::ConditionFailed)
            ),
            (Operation::Load, CartError::CartIdIsEmpty, None),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_catalog_list() -> Result<()> {
    let (store, _carts) = setup().await?;
    store
        .put(
            TEST_TABLE_NAME,
            CatalogItem {
                item_id: "33cc".to_string(),
                description: "Teapot".to_string(),
                price: 20.0,
            }
            .to_row("2"),
            Condition::None,
        )
        .await?;
    let catalog = Catalog::new(store, TEST_TABLE_NAME)?;

    let list = catalog.list(CATEGORY_ID).await?;
    assert_eq!(list.items, vec![mug(), kettle()]);

    assert!(catalog.list("404").await?.items.is_empty());
    assert_eq!(
        catalog.list("").await.unwrap_err(),
        CatalogError::CategoryIdIsEmpty
    );
    Ok(())
}

#[test]
fn test_catalog_requires_table_name() {
    assert_eq!(
        Catalog::new(InMemoryStore::new(), "").unwrap_err(),
        CatalogError::StoreTableNameIsEmpty
    );
}

#[tokio::test]
#[ignore = "needs a reachable DynamoDB"]
async fn test_dynamodb_cart_flow() -> Result<()> {
    dotenv::dotenv().ok();

    let sdk_config = aws_config::load_from_env().await;
    let ddb = DynamoDb::new(&sdk_config);
    ddb.check_auth().await?;

    let table = Table::store(TEST_TABLE_NAME);
    if !ddb.table_exists(TEST_TABLE_NAME).await? {
        crate::utils::retry_with_backoff(
            || ddb.create_table_if_not_exists(&table),
            Duration::from_secs(3),
            5,
        )
        .await?;
    }

    seed_catalog(&ddb, &[mug(), kettle()]).await?;
    let carts = CartService::new(ddb, TEST_TABLE_NAME)?;

    let cart = carts.create_and_add_item(new_item("", &mug(), 2)).await?;
    let cart = carts
        .add_item(new_item(cart.cart_id(), &mug(), 2))
        .await?;
    assert_eq!(cart.items()[0].quantity, 4);

    let cart = carts
        .add_item(new_item(cart.cart_id(), &kettle(), 3))
        .await?;
    assert_eq!(cart.total(), 55.0);
    assert_eq!(cart.count(), 7);

    let cart = carts
        .delete_item(DeleteItem {
            cart_id: cart.cart_id().to_string(),
            item_id: kettle().item_id,
        })
        .await?;
    assert_eq!(cart.count(), 4);

    info!("Cleaning up");
    carts.store().delete_table(TEST_TABLE_NAME).await?;
    Ok(())
}
