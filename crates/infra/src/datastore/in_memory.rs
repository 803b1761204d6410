use std::collections::HashMap;
use std::sync::RwLock;

use storefront_catalog::{Product, ProductId};
use storefront_core::ExpectedVersion;
use storefront_orders::{Order, OrderId};

use super::r#trait::{Datastore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Records {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    /// Unique index: SKU -> owning product.
    sku_index: HashMap<String, ProductId>,
}

/// In-memory record store.
///
/// Products, orders, and the SKU index live under a single lock, so every
/// trait call is atomic. Intended for tests/dev. Not optimized for
/// performance.
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    records: RwLock<Records>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|_| StoreError::Concurrency("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|_| StoreError::Concurrency("lock poisoned".to_string()))
    }
}

impl Datastore for InMemoryDatastore {
    fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let records = self.read()?;
        records.products.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn list_products(&self) -> Vec<Product> {
        match self.read() {
            Ok(records) => records.products.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn insert_product(&self, product: Product) -> StoreResult<Product> {
        let mut records = self.write()?;

        let id = product.id_typed();
        if records.products.contains_key(&id) {
            return Err(StoreError::Duplicate("product id already exists".to_string()));
        }
        if records.sku_index.contains_key(product.sku()) {
            return Err(StoreError::Duplicate("SKU already exists".to_string()));
        }

        let stored = product.at_version(1);
        records.sku_index.insert(stored.sku().to_string(), id);
        records.products.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_product(&self, product: Product, expected: ExpectedVersion) -> StoreResult<Product> {
        let mut records = self.write()?;

        let id = product.id_typed();
        let (current_version, current_sku) = match records.products.get(&id) {
            Some(current) => (current.version(), current.sku().to_string()),
            None => return Err(StoreError::NotFound),
        };

        if !expected.matches(current_version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {current_version}"
            )));
        }

        // Re-check the unique index when the SKU changes hands.
        if current_sku != product.sku() {
            if records.sku_index.contains_key(product.sku()) {
                return Err(StoreError::Duplicate("SKU already exists".to_string()));
            }
            records.sku_index.remove(&current_sku);
            records.sku_index.insert(product.sku().to_string(), id);
        }

        let stored = product.at_version(current_version + 1);
        records.products.insert(id, stored.clone());
        Ok(stored)
    }

    fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut records = self.write()?;
        let removed = records.products.remove(&id).ok_or(StoreError::NotFound)?;
        records.sku_index.remove(removed.sku());
        Ok(())
    }

    fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let records = self.read()?;
        records.orders.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn list_orders(&self) -> Vec<Order> {
        match self.read() {
            Ok(records) => records.orders.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let mut records = self.write()?;

        let id = order.id_typed();
        if records.orders.contains_key(&id) {
            return Err(StoreError::Duplicate("order id already exists".to_string()));
        }

        let stored = order.at_version(1);
        records.orders.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_order(&self, order: Order, expected: ExpectedVersion) -> StoreResult<Order> {
        let mut records = self.write()?;

        let id = order.id_typed();
        let current_version = match records.orders.get(&id) {
            Some(current) => current.version(),
            None => return Err(StoreError::NotFound),
        };

        if !expected.matches(current_version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {current_version}"
            )));
        }

        let stored = order.at_version(current_version + 1);
        records.orders.insert(id, stored.clone());
        Ok(stored)
    }

    fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        let mut records = self.write()?;
        records.orders.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}
