use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, RecordId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

const SKU_MAX_LEN: usize = 50;
const NAME_MAX_LEN: usize = 100;
const PRICE_SCALE: u32 = 2;
// 10 digits total, 2 of them after the decimal point.
const PRICE_DIGITS_LIMIT: i64 = 100_000_000;

/// Catalog entity: Product.
///
/// `stock` is mutated exclusively through the stock ledger; `version` is
/// store-managed and used for optimistic concurrency on stock writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    price: Decimal,
    stock: i64,
    version: u64,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: String,
        name: String,
        price: Decimal,
        stock: i64,
    ) -> DomainResult<Self> {
        Self::validate_sku(&sku)?;
        Self::validate_name(&name)?;
        Self::validate_price(price)?;
        Self::validate_stock(stock)?;

        Ok(Self {
            id,
            sku,
            name,
            price,
            stock,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Copy with the given stock level. Used by the stock ledger;
    /// `stock >= 0` is enforced here as well.
    pub fn with_stock(&self, stock: i64) -> DomainResult<Self> {
        Self::validate_stock(stock)?;
        Ok(Self {
            stock,
            ..self.clone()
        })
    }

    /// Copy with the fields of a partial update applied and re-validated.
    pub fn apply(&self, patch: &ProductPatch) -> DomainResult<Self> {
        let sku = patch.sku.clone().unwrap_or_else(|| self.sku.clone());
        let name = patch.name.clone().unwrap_or_else(|| self.name.clone());
        let price = patch.price.unwrap_or(self.price);
        let stock = patch.stock.unwrap_or(self.stock);

        Self::validate_sku(&sku)?;
        Self::validate_name(&name)?;
        Self::validate_price(price)?;
        Self::validate_stock(stock)?;

        Ok(Self {
            id: self.id,
            sku,
            name,
            price,
            stock,
            version: self.version,
        })
    }

    /// Copy at the given version. Store-managed; domain code never calls this.
    pub fn at_version(self, version: u64) -> Self {
        Self { version, ..self }
    }

    fn validate_sku(sku: &str) -> DomainResult<()> {
        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if sku.chars().count() > SKU_MAX_LEN {
            return Err(DomainError::validation(format!(
                "SKU cannot exceed {SKU_MAX_LEN} characters"
            )));
        }
        Ok(())
    }

    fn validate_name(name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(DomainError::validation(format!(
                "name cannot exceed {NAME_MAX_LEN} characters"
            )));
        }
        Ok(())
    }

    fn validate_price(price: Decimal) -> DomainResult<()> {
        if price <= Decimal::ZERO {
            return Err(DomainError::validation("price must be greater than 0"));
        }
        if price.normalize().scale() > PRICE_SCALE {
            return Err(DomainError::validation(
                "price cannot have more than 2 decimal places",
            ));
        }
        if price >= Decimal::from(PRICE_DIGITS_LIMIT) {
            return Err(DomainError::validation("price is out of range"));
        }
        Ok(())
    }

    fn validate_stock(stock: i64) -> DomainResult<()> {
        if stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(())
    }
}

/// Partial update for a product (absent fields are left unchanged).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}
