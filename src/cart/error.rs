use thiserror::Error;

/// Every failure the cart engine reports.
///
/// The set is closed and each variant displays as its kind name, which is
/// what the transport layer maps to a status code. No variant carries the
/// underlying store error; observers receive that separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CartError {
    #[error("CartIDIsEmpty")]
    CartIdIsEmpty,

    /// A cart id was supplied when asking for a new cart.
    #[error("CartIDProvidedOnCreate")]
    CartIdProvidedOnCreate,

    #[error("ItemIDIsEmpty")]
    ItemIdIsEmpty,

    #[error("DescriptionIsEmpty")]
    DescriptionIsEmpty,

    #[error("PriceIsEmpty")]
    PriceIsEmpty,

    /// Price is negative or not a finite number.
    #[error("PriceIsInvalid")]
    PriceIsInvalid,

    #[error("QuantityIsEmpty")]
    QuantityIsEmpty,

    /// Quantity is below one.
    #[error("QuantityIsInvalid")]
    QuantityIsInvalid,

    /// The catalog has no entry for the item being added.
    #[error("ItemDoesNotExist")]
    ItemDoesNotExist,

    #[error("CouldNotCreateCart")]
    CouldNotCreateCart,

    #[error("CouldNotAddItem")]
    CouldNotAddItem,

    #[error("CouldNotUpdateItem")]
    CouldNotUpdateItem,

    #[error("CouldNotDeleteItem")]
    CouldNotDeleteItem,

    /// The range query for the cart's rows failed.
    #[error("CouldNotLoadItems")]
    CouldNotLoadItems,

    /// Rows came back but could not be decoded into items.
    #[error("CouldNotLoadCart")]
    CouldNotLoadCart,

    /// The engine was constructed without a table name.
    #[error("StoreTableNameIsEmpty")]
    StoreTableNameIsEmpty,
}

impl CartError {
    /// True for failures caused by the request payload rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CartError::CartIdIsEmpty
                | CartError::CartIdProvidedOnCreate
                | CartError::ItemIdIsEmpty
                | CartError::DescriptionIsEmpty
                | CartError::PriceIsEmpty
                | CartError::PriceIsInvalid
                | CartError::QuantityIsEmpty
                | CartError::QuantityIsInvalid
        )
    }
}
