use thiserror::Error;

use storefront_catalog::{Product, ProductId};
use storefront_core::{DomainError, ExpectedVersion};
use storefront_orders::{Order, OrderId};

/// Store-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given id.
    #[error("record not found")]
    NotFound,

    /// A unique index was violated (product SKU).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// An expected-version check failed (stale read).
    #[error("concurrency: {0}")]
    Concurrency(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => DomainError::NotFound,
            StoreError::Duplicate(msg) => DomainError::conflict(msg),
            StoreError::Concurrency(msg) => DomainError::conflict(msg),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for products and orders.
///
/// Each call is atomic. `insert` assigns version 1; `update` checks the
/// caller's [`ExpectedVersion`] against the stored record and bumps the
/// version on success. SKU uniqueness is enforced by the store on both
/// product inserts and updates.
pub trait Datastore: Send + Sync {
    fn get_product(&self, id: ProductId) -> StoreResult<Product>;
    fn list_products(&self) -> Vec<Product>;
    fn insert_product(&self, product: Product) -> StoreResult<Product>;
    fn update_product(&self, product: Product, expected: ExpectedVersion) -> StoreResult<Product>;
    fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    fn get_order(&self, id: OrderId) -> StoreResult<Order>;
    fn list_orders(&self) -> Vec<Order>;
    fn insert_order(&self, order: Order) -> StoreResult<Order>;
    fn update_order(&self, order: Order, expected: ExpectedVersion) -> StoreResult<Order>;
    fn delete_order(&self, id: OrderId) -> StoreResult<()>;
}

impl<S> Datastore for std::sync::Arc<S>
where
    S: Datastore + ?Sized,
{
    fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        (**self).get_product(id)
    }

    fn list_products(&self) -> Vec<Product> {
        (**self).list_products()
    }

    fn insert_product(&self, product: Product) -> StoreResult<Product> {
        (**self).insert_product(product)
    }

    fn update_product(&self, product: Product, expected: ExpectedVersion) -> StoreResult<Product> {
        (**self).update_product(product, expected)
    }

    fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id)
    }

    fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        (**self).get_order(id)
    }

    fn list_orders(&self) -> Vec<Order> {
        (**self).list_orders()
    }

    fn insert_order(&self, order: Order) -> StoreResult<Order> {
        (**self).insert_order(order)
    }

    fn update_order(&self, order: Order, expected: ExpectedVersion) -> StoreResult<Order> {
        (**self).update_order(order, expected)
    }

    fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        (**self).delete_order(id)
    }
}
