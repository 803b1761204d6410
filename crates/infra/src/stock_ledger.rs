//! Stock accounting in lockstep with the order lifecycle.
//!
//! Every stock mutation in the system goes through [`StockLedger`]. A
//! mutation is a read-modify-write of the product record guarded by an
//! expected-version check; a stale read loses the race and the whole
//! attempt is retried, which serializes concurrent reservations per product
//! and makes overselling impossible.
//!
//! Ordering within an operation: the product write commits first, then the
//! order record follows. The stock side errs toward over-reserving, never
//! over-selling; a reader between the two writes sees stock already taken
//! for an order that is about to appear. If the order write fails, the
//! reservation is compensated before the error surfaces.

use chrono::Utc;

use storefront_catalog::{Product, ProductId};
use storefront_core::{DomainError, DomainResult, ExpectedVersion, RecordId};
use storefront_orders::{Order, OrderId, OrderStatus};

use crate::datastore::{Datastore, StoreError};

/// Attempts per product write before giving up with a conflict. A retry is
/// only spent when another writer commits in between.
const MAX_STOCK_RETRIES: usize = 16;

/// Combined order mutation: either field may be absent; when both are
/// present the quantity adjustment applies first, then the transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderChange {
    pub quantity: Option<i64>,
    pub status: Option<OrderStatus>,
}

/// Orchestrates order lifecycle operations against a [`Datastore`] handle.
pub struct StockLedger<S> {
    store: S,
}

impl<S: Datastore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserve stock and create a PENDING order as one logical unit.
    pub fn reserve(&self, product_id: ProductId, quantity: i64) -> DomainResult<Order> {
        let now = Utc::now();
        let order = Order::new(OrderId::new(RecordId::new()), product_id, quantity, now)?;

        self.apply_stock_delta(product_id, -quantity)?;

        match self.store.insert_order(order) {
            Ok(stored) => {
                tracing::info!(
                    order_id = %stored.id_typed(),
                    product_id = %product_id,
                    quantity,
                    "stock reserved"
                );
                Ok(stored)
            }
            Err(e) => {
                self.compensate(product_id, quantity);
                Err(e.into())
            }
        }
    }

    /// Load an order and apply a combined quantity/status mutation.
    pub fn update_order(&self, order_id: OrderId, change: OrderChange) -> DomainResult<Order> {
        let mut order = self.store.get_order(order_id)?;

        if let Some(quantity) = change.quantity {
            order = self.adjust_quantity(&order, quantity)?;
        }
        if let Some(status) = change.status {
            order = self.transition(&order, status)?;
        }

        Ok(order)
    }

    /// Webhook entrypoint: transition the order to PAID.
    pub fn mark_paid(&self, order_id: OrderId) -> DomainResult<Order> {
        let order = self.update_order(
            order_id,
            OrderChange {
                quantity: None,
                status: Some(OrderStatus::Paid),
            },
        )?;
        tracing::info!(order_id = %order_id, "order marked paid");
        Ok(order)
    }

    /// Delete a PENDING order, releasing its reservation.
    pub fn delete_order(&self, order_id: OrderId) -> DomainResult<()> {
        let order = self.store.get_order(order_id)?;
        order.ensure_deletable()?;

        self.apply_stock_delta(order.product_id(), order.quantity())?;

        match self.store.delete_order(order_id) {
            Ok(()) => {
                tracing::info!(order_id = %order_id, "order deleted, stock released");
                Ok(())
            }
            Err(e) => {
                self.compensate(order.product_id(), -order.quantity());
                Err(e.into())
            }
        }
    }

    /// Change an order's quantity, moving the stock delta on the product.
    fn adjust_quantity(&self, order: &Order, new_quantity: i64) -> DomainResult<Order> {
        if !order.status().accepts_quantity_change() {
            return Err(DomainError::invalid_operation(
                "canceled orders cannot change quantity",
            ));
        }

        let updated = order.with_quantity(new_quantity, Utc::now())?;
        let delta = new_quantity - order.quantity();

        if delta != 0 {
            self.apply_stock_delta(order.product_id(), -delta)?;
        }

        match self.store.update_order(updated, ExpectedVersion::Any) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                if delta != 0 {
                    self.compensate(order.product_id(), delta);
                }
                Err(e.into())
            }
        }
    }

    /// Assign a status, applying the reservation accounting for the edge:
    /// leaving PENDING/PAID for CANCELED releases the quantity; leaving
    /// CANCELED re-reserves it. SHIPPED has consumed the reservation, so
    /// cancelling after shipping changes no stock.
    fn transition(&self, order: &Order, next: OrderStatus) -> DomainResult<Order> {
        let current = order.status();
        current.validate_transition(next)?;

        let released: i64 = if current.holds_reservation() && next == OrderStatus::Canceled {
            order.quantity()
        } else if current == OrderStatus::Canceled && next != OrderStatus::Canceled {
            -order.quantity()
        } else {
            0
        };

        if released != 0 {
            self.apply_stock_delta(order.product_id(), released)?;
        }

        let updated = order.with_status(next, Utc::now());
        match self.store.update_order(updated, ExpectedVersion::Any) {
            Ok(stored) => {
                if released != 0 {
                    tracing::info!(
                        order_id = %order.id_typed(),
                        product_id = %order.product_id(),
                        released,
                        status = %next,
                        "reservation accounting applied"
                    );
                }
                Ok(stored)
            }
            Err(e) => {
                if released != 0 {
                    self.compensate(order.product_id(), -released);
                }
                Err(e.into())
            }
        }
    }

    /// Versioned read-modify-write of the product's stock. A negative delta
    /// takes stock (failing with a conflict when insufficient); a positive
    /// delta returns it.
    fn apply_stock_delta(&self, product_id: ProductId, delta: i64) -> DomainResult<Product> {
        for _ in 0..MAX_STOCK_RETRIES {
            let product = self.store.get_product(product_id)?;

            let next = product.stock() + delta;
            if next < 0 {
                return Err(DomainError::conflict("insufficient stock"));
            }

            let updated = product.with_stock(next)?;
            match self
                .store
                .update_product(updated, ExpectedVersion::Exact(product.version()))
            {
                Ok(stored) => return Ok(stored),
                // Stale read: somebody else moved the stock first. Retry.
                Err(StoreError::Concurrency(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict("stock is contended, retry the request"))
    }

    /// Best-effort rollback of a stock movement after a failed record write.
    fn compensate(&self, product_id: ProductId, quantity: i64) {
        if let Err(e) = self.apply_stock_delta(product_id, quantity) {
            tracing::warn!(
                product_id = %product_id,
                quantity,
                error = %e,
                "failed to compensate stock movement"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::InMemoryDatastore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn ledger() -> (Arc<InMemoryDatastore>, StockLedger<Arc<InMemoryDatastore>>) {
        let store = Arc::new(InMemoryDatastore::new());
        (store.clone(), StockLedger::new(store))
    }

    fn seed_product(store: &InMemoryDatastore, sku: &str, stock: i64) -> Product {
        store
            .insert_product(
                Product::new(
                    ProductId::new(RecordId::new()),
                    sku.to_string(),
                    "Widget".to_string(),
                    dec!(10.00),
                    stock,
                )
                .unwrap(),
            )
            .unwrap()
    }

    fn stock_of(store: &InMemoryDatastore, id: ProductId) -> i64 {
        store.get_product(id).unwrap().stock()
    }

    #[test]
    fn reserve_decrements_stock_and_creates_pending_order() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);

        let order = ledger.reserve(product.id_typed(), 5).unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.quantity(), 5);
        assert_eq!(stock_of(&store, product.id_typed()), 0);
    }

    #[test]
    fn reserve_beyond_stock_is_a_conflict_and_leaves_stock_alone() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        ledger.reserve(product.id_typed(), 5).unwrap();

        let err = ledger.reserve(product.id_typed(), 1).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 0);
        assert_eq!(store.list_orders().len(), 1);
    }

    #[test]
    fn reserve_on_unknown_product_is_not_found() {
        let (_store, ledger) = ledger();
        let err = ledger
            .reserve(ProductId::new(RecordId::new()), 1)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn reserve_rejects_non_positive_quantity_before_touching_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);

        let err = ledger.reserve(product.id_typed(), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 5);
    }

    #[test]
    fn lowering_quantity_returns_the_difference() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 5).unwrap();

        let updated = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: Some(2),
                    status: None,
                },
            )
            .unwrap();
        assert_eq!(updated.quantity(), 2);
        assert_eq!(stock_of(&store, product.id_typed()), 3);
    }

    #[test]
    fn raising_quantity_beyond_stock_is_a_conflict_and_changes_nothing() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 3).unwrap();

        let err = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: Some(6),
                    status: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 2);
        assert_eq!(store.get_order(order.id_typed()).unwrap().quantity(), 3);
    }

    #[test]
    fn raising_quantity_within_stock_takes_the_difference() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 3).unwrap();

        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: Some(5),
                    status: None,
                },
            )
            .unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 0);
    }

    #[test]
    fn canceling_a_pending_order_restores_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 4).unwrap();

        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 5);
    }

    #[test]
    fn canceling_a_paid_order_restores_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 4).unwrap();
        ledger.mark_paid(order.id_typed()).unwrap();

        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 5);
    }

    #[test]
    fn canceling_a_shipped_order_changes_no_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 4).unwrap();
        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Shipped),
                },
            )
            .unwrap();

        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 1);
    }

    #[test]
    fn reviving_a_canceled_order_re_reserves() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 4).unwrap();
        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 5);

        // Someone else takes most of the stock in the meantime.
        let interloper = ledger.reserve(product.id_typed(), 3).unwrap();

        let err = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Pending),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(
            store.get_order(order.id_typed()).unwrap().status(),
            OrderStatus::Canceled
        );

        // Once stock frees up, the revival takes its quantity again.
        ledger.delete_order(interloper.id_typed()).unwrap();
        let revived = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Pending),
                },
            )
            .unwrap();
        assert_eq!(revived.status(), OrderStatus::Pending);
        assert_eq!(stock_of(&store, product.id_typed()), 1);
    }

    #[test]
    fn quantity_changes_on_canceled_orders_are_rejected() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 2).unwrap();
        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();

        let err = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: Some(1),
                    status: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 5);
    }

    #[test]
    fn deleting_a_pending_order_restores_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 5).unwrap();

        ledger.delete_order(order.id_typed()).unwrap();
        assert_eq!(stock_of(&store, product.id_typed()), 5);
        assert!(store.get_order(order.id_typed()).is_err());
    }

    #[test]
    fn deleting_a_shipped_order_is_rejected_with_no_state_change() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 2).unwrap();
        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Shipped),
                },
            )
            .unwrap();

        let err = ledger.delete_order(order.id_typed()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 3);
        assert_eq!(
            store.get_order(order.id_typed()).unwrap().status(),
            OrderStatus::Shipped
        );
    }

    #[test]
    fn shipped_to_pending_is_an_invalid_transition() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 2).unwrap();
        ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Shipped),
                },
            )
            .unwrap();

        let err = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: None,
                    status: Some(OrderStatus::Pending),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(stock_of(&store, product.id_typed()), 3);
    }

    #[test]
    fn mark_paid_transitions_without_touching_stock() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 5);
        let order = ledger.reserve(product.id_typed(), 2).unwrap();

        let paid = ledger.mark_paid(order.id_typed()).unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);
        assert_eq!(stock_of(&store, product.id_typed()), 3);
    }

    #[test]
    fn combined_quantity_and_cancel_applies_both() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 10);
        let order = ledger.reserve(product.id_typed(), 4).unwrap();

        // Quantity adjusts first (while the reservation is held), then the
        // cancellation releases the new quantity.
        let updated = ledger
            .update_order(
                order.id_typed(),
                OrderChange {
                    quantity: Some(6),
                    status: Some(OrderStatus::Canceled),
                },
            )
            .unwrap();
        assert_eq!(updated.quantity(), 6);
        assert_eq!(updated.status(), OrderStatus::Canceled);
        assert_eq!(stock_of(&store, product.id_typed()), 10);
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let (store, ledger) = ledger();
        let product = seed_product(&store, "SKU-1", 10);
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let product_id = product.id_typed();
                std::thread::spawn(move || ledger.reserve(product_id, 1).is_ok())
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 10);
        assert_eq!(stock_of(&store, product.id_typed()), 0);
        assert_eq!(store.list_orders().len(), 10);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(i64),
            AdjustQuantity(usize, i64),
            Transition(usize, OrderStatus),
            Delete(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            let status = prop_oneof![
                Just(OrderStatus::Pending),
                Just(OrderStatus::Paid),
                Just(OrderStatus::Shipped),
                Just(OrderStatus::Canceled),
            ];
            prop_oneof![
                (1..6i64).prop_map(Op::Reserve),
                (0..8usize, 1..6i64).prop_map(|(i, q)| Op::AdjustQuantity(i, q)),
                (0..8usize, status).prop_map(|(i, s)| Op::Transition(i, s)),
                (0..8usize).prop_map(Op::Delete),
            ]
        }

        proptest! {
            /// Stock never goes negative, and every unit is accounted for:
            /// on-hand stock plus open deductions (PENDING/PAID/SHIPPED
            /// orders) plus consumed units (orders canceled after shipping)
            /// always equals the initial stock.
            #[test]
            fn stock_stays_consistent_under_random_operations(
                initial in 0..40i64,
                ops in proptest::collection::vec(op_strategy(), 1..40),
            ) {
                let (store, ledger) = ledger();
                let product = seed_product(&store, "SKU-P", initial);
                let product_id = product.id_typed();

                let mut order_ids: Vec<OrderId> = Vec::new();
                let mut consumed: i64 = 0;

                for op in ops {
                    match op {
                        Op::Reserve(quantity) => {
                            if let Ok(order) = ledger.reserve(product_id, quantity) {
                                order_ids.push(order.id_typed());
                            }
                        }
                        Op::AdjustQuantity(i, quantity) => {
                            if let Some(&id) = order_ids.get(i) {
                                let _ = ledger.update_order(id, OrderChange {
                                    quantity: Some(quantity),
                                    status: None,
                                });
                            }
                        }
                        Op::Transition(i, status) => {
                            if let Some(&id) = order_ids.get(i) {
                                let before = store.get_order(id).ok().map(|o| (o.status(), o.quantity()));
                                if ledger.update_order(id, OrderChange {
                                    quantity: None,
                                    status: Some(status),
                                }).is_ok() {
                                    if let Some((OrderStatus::Shipped, quantity)) = before {
                                        if status == OrderStatus::Canceled {
                                            consumed += quantity;
                                        }
                                    }
                                }
                            }
                        }
                        Op::Delete(i) => {
                            if let Some(&id) = order_ids.get(i) {
                                if ledger.delete_order(id).is_ok() {
                                    order_ids.retain(|&o| o != id);
                                }
                            }
                        }
                    }

                    let stock = stock_of(&store, product_id);
                    prop_assert!(stock >= 0, "stock went negative: {stock}");

                    let deducted: i64 = store
                        .list_orders()
                        .iter()
                        .filter(|o| o.status() != OrderStatus::Canceled)
                        .map(|o| o.quantity())
                        .sum();
                    prop_assert_eq!(stock + deducted + consumed, initial);
                }
            }
        }
    }
}
