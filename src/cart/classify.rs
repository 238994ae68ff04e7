//! Maps store failures to cart errors.
//!
//! Only one store failure is business-meaningful: a cancelled transaction
//! whose catalog check failed means the item is not in the catalog. Any other
//! failure becomes the generic error of the operation that hit it.

use super::error::CartError;
use super::observer::Operation;
use crate::keys::RowKind;
use crate::store::StoreError;

pub fn classify(operation: Operation, err: &StoreError) -> CartError {
    match operation {
        Operation::CreateAndAddItem | Operation::AddItem
            if err.failed_condition_on(RowKind::CatalogItem) =>
        {
            CartError::ItemDoesNotExist
        }
        Operation::CreateAndAddItem => CartError::CouldNotCreateCart,
        Operation::AddItem => CartError::CouldNotAddItem,
        Operation::UpdateItem => CartError::CouldNotUpdateItem,
        Operation::DeleteItem => CartError::CouldNotDeleteItem,
        Operation::Load => CartError::CouldNotLoadItems,
    }
}
