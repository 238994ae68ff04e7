use super::model::CartItem;

/// Derived totals of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub total: f64,
    pub count: i64,
}

/// Sums `price * quantity` and `quantity` over the items in order.
///
/// The total is accumulated in `f64` in sequence order, so for pathological
/// inputs the order of the items can change its last bits. The count
/// saturates at `i64::MAX`.
pub fn totals(items: &[CartItem]) -> Totals {
    items.iter().fold(Totals::default(), |acc, item| Totals {
        total: acc.total + item.price * item.quantity as f64,
        count: acc.count.saturating_add(item.quantity),
    })
}
