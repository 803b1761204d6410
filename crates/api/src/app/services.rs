use std::sync::Arc;

use rust_decimal::Decimal;

use storefront_catalog::{Product, ProductId, ProductPatch};
use storefront_core::{DomainResult, ExpectedVersion, RecordId};
use storefront_infra::{Datastore, InMemoryDatastore, StockLedger};
use storefront_orders::{Order, OrderId};
use storefront_webhook::SignatureVerifier;

/// Application services shared by all handlers.
///
/// The datastore handle is built once and passed explicitly (never a
/// process-wide global), so the same wiring runs in production and in tests.
pub struct AppServices {
    store: Arc<InMemoryDatastore>,
    ledger: StockLedger<Arc<InMemoryDatastore>>,
    verifier: SignatureVerifier,
}

/// Build services with an in-memory datastore.
pub fn build_services(webhook_secret: String) -> AppServices {
    let store = Arc::new(InMemoryDatastore::new());
    AppServices {
        ledger: StockLedger::new(Arc::clone(&store)),
        verifier: SignatureVerifier::new(webhook_secret),
        store,
    }
}

impl AppServices {
    pub fn ledger(&self) -> &StockLedger<Arc<InMemoryDatastore>> {
        &self.ledger
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    // ---- products -------------------------------------------------------

    pub fn create_product(
        &self,
        sku: String,
        name: String,
        price: Decimal,
        stock: i64,
    ) -> DomainResult<Product> {
        let product = Product::new(ProductId::new(RecordId::new()), sku, name, price, stock)?;
        Ok(self.store.insert_product(product)?)
    }

    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        Ok(self.store.get_product(id)?)
    }

    pub fn list_products(&self) -> Vec<Product> {
        self.store.list_products()
    }

    pub fn update_product(&self, id: ProductId, patch: &ProductPatch) -> DomainResult<Product> {
        let current = self.store.get_product(id)?;
        let updated = current.apply(patch)?;
        Ok(self
            .store
            .update_product(updated, ExpectedVersion::Exact(current.version()))?)
    }

    pub fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        Ok(self.store.delete_product(id)?)
    }

    // ---- orders ---------------------------------------------------------

    pub fn get_order(&self, id: OrderId) -> DomainResult<Order> {
        Ok(self.store.get_order(id)?)
    }

    pub fn list_orders(&self) -> Vec<Order> {
        self.store.list_orders()
    }
}
