use std::fmt;

use tracing::{error, info, warn};

use super::error::CartError;
use super::model::Cart;
use crate::store::StoreError;

/// The public operations of the cart engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAndAddItem,
    AddItem,
    UpdateItem,
    DeleteItem,
    Load,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::CreateAndAddItem => "create_and_add_item",
            Operation::AddItem => "add_item",
            Operation::UpdateItem => "update_item",
            Operation::DeleteItem => "delete_item",
            Operation::Load => "load",
        })
    }
}

/// Receives the outcome of every engine operation.
///
/// Injected into [`CartService`](super::CartService) for diagnostics. On
/// failure the observer also sees the store error the cart error was
/// classified from, e.g. to tell a missing row apart from an unreachable
/// store.
pub trait CartObserver: Send + Sync {
    fn succeeded(&self, _operation: Operation, _cart: &Cart) {}

    fn failed(
        &self,
        _operation: Operation,
        _cart_id: &str,
        _error: CartError,
        _cause: Option<&StoreError>,
    ) {
    }
}

/// Forwards engine outcomes to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CartObserver for TracingObserver {
    fn succeeded(&self, operation: Operation, cart: &Cart) {
        info!(
            %operation,
            cart_id = cart.cart_id(),
            items = cart.items().len(),
            count = cart.count(),
            "Cart operation succeeded"
        );
    }

    fn failed(
        &self,
        operation: Operation,
        cart_id: &str,
        error: CartError,
        cause: Option<&StoreError>,
    ) {
        match cause {
            Some(cause) => error!(%operation, cart_id, %error, %cause, "Cart operation failed"),
            None if error.is_validation() => {
                warn!(%operation, cart_id, %error, "Cart request rejected")
            }
            None => error!(%operation, cart_id, %error, "Cart operation failed"),
        }
    }
}
