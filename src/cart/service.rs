use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use uuid::Uuid;

use super::classify::classify;
use super::error::CartError;
use super::model::{Cart, CartItem, DeleteItem, NewItem, UpdateItem};
use super::observer::{CartObserver, Operation};
use super::validation::{self, ValidItem};
use crate::dynamodb::{format_number, Row};
use crate::keys::{cart_key, Key, RowKind, ITEM_PREFIX, KIND_ATTRIBUTE};
use crate::store::{Condition, Query, Store, StoreError, TransactStep, Update, WriteOp};

const CART_ID: &str = "cart_id";
const ITEM_ID: &str = "item_id";
const DESCRIPTION: &str = "description";
const PRICE: &str = "price";
const QUANTITY: &str = "quantity";

/// Attributes read back for each cart item.
const ITEM_PROJECTION: [&str; 4] = [ITEM_ID, DESCRIPTION, PRICE, QUANTITY];

/// The cart transaction engine.
///
/// Every mutation is a single atomic store request: a multi-item transaction
/// for adding items, a conditional update or delete otherwise. Mutations then
/// load the cart again and return it, so the result reflects committed state
/// (possibly including writes from concurrent requests that landed between
/// the two calls).
///
/// The engine holds no locks and never retries. Concurrent adds of the same
/// item rely on the store applying the quantity increment atomically.
///
/// # Example
///
/// ```
/// use cart_store::cart::{CartService, NewItem};
/// use cart_store::store::InMemoryStore;
///
/// # async fn example() -> Result<(), cart_store::cart::CartError> {
/// let carts = CartService::new(InMemoryStore::new(), "Store")?;
///
/// let cart = carts.load("unknown").await?;
/// assert!(cart.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct CartService<S> {
    store: S,
    table_name: String,
    observer: Option<Arc<dyn CartObserver>>,
}

impl<S> std::fmt::Debug for CartService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("table_name", &self.table_name)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Store> CartService<S> {
    /// Creates the engine over a store table.
    ///
    /// Fails with [`CartError::StoreTableNameIsEmpty`] when `table_name` is
    /// empty.
    pub fn new(store: S, table_name: impl Into<String>) -> Result<Self, CartError> {
        let table_name = table_name.into();
        if table_name.is_empty() {
            return Err(CartError::StoreTableNameIsEmpty);
        }
        Ok(Self {
            store,
            table_name,
            observer: None,
        })
    }

    /// Reports every operation outcome to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn CartObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a cart holding its first item.
    ///
    /// The cart id is generated here; a payload that already carries one is
    /// rejected with [`CartError::CartIdProvidedOnCreate`] before anything
    /// else is checked. The header row, the catalog check and the item row
    /// are committed in one transaction.
    pub async fn create_and_add_item(&self, mut item: NewItem) -> Result<Cart, CartError> {
        let operation = Operation::CreateAndAddItem;
        if !item.cart_id.is_empty() {
            return Err(self.fail(
                operation,
                &item.cart_id,
                CartError::CartIdProvidedOnCreate,
                None,
            ));
        }

        item.cart_id = Uuid::new_v4().to_string();
        let valid = validation::validate_new_item(&item)
            .map_err(|e| self.fail(operation, &item.cart_id, e, None))?;

        let steps = vec![
            TransactStep::new(
                RowKind::CartHeader,
                WriteOp::Put(cart_header_row(valid.cart_id), Condition::NotExists),
            ),
            catalog_check(valid.item_id),
            TransactStep::new(
                RowKind::CartItem,
                WriteOp::Put(cart_item_row(&valid), Condition::NotExists),
            ),
        ];

        self.transact(operation, valid.cart_id, steps).await?;
        self.reload(operation, valid.cart_id).await
    }

    /// Adds an item to an existing cart, or raises its quantity if the cart
    /// already holds it.
    ///
    /// First adds and repeat adds run the same update: the denormalized
    /// fields are overwritten and `quantity` becomes its current value (zero
    /// when absent) plus the requested amount.
    pub async fn add_item(&self, item: NewItem) -> Result<Cart, CartError> {
        let operation = Operation::AddItem;
        let valid = validation::validate_new_item(&item)
            .map_err(|e| self.fail(operation, &item.cart_id, e, None))?;

        let update = Update::new(Key::cart_item(valid.cart_id, valid.item_id))
            .set(KIND_ATTRIBUTE, string(RowKind::CartItem.as_str()))
            .set(CART_ID, string(valid.cart_id))
            .set(ITEM_ID, string(valid.item_id))
            .set(DESCRIPTION, string(valid.description))
            .set(PRICE, AttributeValue::N(format_number(valid.price)))
            .increment(QUANTITY, valid.quantity);

        let steps = vec![
            catalog_check(valid.item_id),
            TransactStep::new(
                RowKind::CartHeader,
                WriteOp::Check(Key::cart_header(valid.cart_id), Condition::Exists),
            ),
            TransactStep::new(RowKind::CartItem, WriteOp::Update(update)),
        ];

        self.transact(operation, valid.cart_id, steps).await?;
        self.reload(operation, valid.cart_id).await
    }

    /// Replaces the quantity of an item already in the cart.
    pub async fn update_item(&self, update: UpdateItem) -> Result<Cart, CartError> {
        let operation = Operation::UpdateItem;
        let valid = validation::validate_update(&update)
            .map_err(|e| self.fail(operation, &update.cart_id, e, None))?;

        let request = Update::new(Key::cart_item(valid.cart_id, valid.item_id))
            .set(QUANTITY, AttributeValue::N(valid.quantity.to_string()))
            .when(Condition::Exists);

        if let Err(e) = self.store.update(&self.table_name, request).await {
            return Err(self.fail(operation, valid.cart_id, classify(operation, &e), Some(e)));
        }
        self.reload(operation, valid.cart_id).await
    }

    /// Removes an item from the cart.
    pub async fn delete_item(&self, delete: DeleteItem) -> Result<Cart, CartError> {
        let operation = Operation::DeleteItem;
        let valid = validation::validate_delete(&delete)
            .map_err(|e| self.fail(operation, &delete.cart_id, e, None))?;

        let key = Key::cart_item(valid.cart_id, valid.item_id);
        if let Err(e) = self
            .store
            .delete(&self.table_name, key, Condition::Exists)
            .await
        {
            return Err(self.fail(operation, valid.cart_id, classify(operation, &e), Some(e)));
        }
        self.reload(operation, valid.cart_id).await
    }

    /// Reads a cart and all of its items.
    ///
    /// A cart without items, including one that was never created, loads as
    /// an empty cart.
    pub async fn load(&self, cart_id: &str) -> Result<Cart, CartError> {
        let operation = Operation::Load;
        let cart_id =
            validation::cart_id(cart_id).map_err(|e| self.fail(operation, cart_id, e, None))?;
        self.reload(operation, cart_id).await
    }

    async fn transact(
        &self,
        operation: Operation,
        cart_id: &str,
        steps: Vec<TransactStep>,
    ) -> Result<(), CartError> {
        self.store
            .transact_write(&self.table_name, steps)
            .await
            .map_err(|e| self.fail(operation, cart_id, classify(operation, &e), Some(e)))
    }

    async fn reload(&self, operation: Operation, cart_id: &str) -> Result<Cart, CartError> {
        let query = Query::new(cart_key(cart_id), ITEM_PREFIX).project(&ITEM_PROJECTION);

        let rows = match self.store.query(&self.table_name, query).await {
            Ok(rows) => rows,
            Err(e) => {
                return Err(self.fail(operation, cart_id, classify(Operation::Load, &e), Some(e)))
            }
        };

        let items = match rows
            .into_iter()
            .map(Row::deserialize::<CartItem>)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(items) => items,
            Err(e) => {
                return Err(self.fail(
                    operation,
                    cart_id,
                    CartError::CouldNotLoadCart,
                    Some(StoreError::from(e)),
                ))
            }
        };

        let cart = Cart::new(cart_id, items);
        if let Some(observer) = &self.observer {
            observer.succeeded(operation, &cart);
        }
        Ok(cart)
    }

    fn fail(
        &self,
        operation: Operation,
        cart_id: &str,
        error: CartError,
        cause: Option<StoreError>,
    ) -> CartError {
        if let Some(observer) = &self.observer {
            observer.failed(operation, cart_id, error, cause.as_ref());
        }
        error
    }
}

fn string(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn catalog_check(item_id: &str) -> TransactStep {
    TransactStep::new(
        RowKind::CatalogItem,
        WriteOp::Check(Key::catalog_item(item_id), Condition::Exists),
    )
}

fn cart_header_row(cart_id: &str) -> Row {
    Row::keyed(&Key::cart_header(cart_id), RowKind::CartHeader).set_string(CART_ID, cart_id)
}

fn cart_item_row(item: &ValidItem<'_>) -> Row {
    Row::keyed(&Key::cart_item(item.cart_id, item.item_id), RowKind::CartItem)
        .set_string(CART_ID, item.cart_id)
        .set_string(ITEM_ID, item.item_id)
        .set_string(DESCRIPTION, item.description)
        .set_number(PRICE, item.price)
        .set_integer(QUANTITY, item.quantity)
}
