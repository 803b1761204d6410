use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::ProductId;
use storefront_core::{DomainError, DomainResult, RecordId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub RecordId);

impl OrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// Whether the order's quantity is currently deducted from the product's
    /// stock and still reversible (released again on cancellation/deletion).
    ///
    /// SHIPPED is deliberately not included: shipping consumes the
    /// reservation, so a later cancellation changes no stock.
    pub fn holds_reservation(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    /// Whether a quantity change may still be applied. CANCELED orders have
    /// no reservation left to adjust.
    pub fn accepts_quantity_change(self) -> bool {
        !matches!(self, OrderStatus::Canceled)
    }

    /// Validate a status assignment.
    ///
    /// The single rejected transition is SHIPPED -> PENDING; every other
    /// assignment is accepted, matching the upstream service's behavior.
    pub fn validate_transition(self, next: OrderStatus) -> DomainResult<()> {
        if self == OrderStatus::Shipped && next == OrderStatus::Pending {
            return Err(DomainError::invalid_transition(
                "shipped orders cannot return to pending",
            ));
        }
        Ok(())
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales entity: Order.
///
/// A single-product order holding a stock reservation from creation until it
/// is shipped, canceled, or deleted. `version` is store-managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    product_id: ProductId,
    quantity: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Order {
    /// Create a new PENDING order. The caller (the stock ledger) is
    /// responsible for reserving stock before persisting it.
    pub fn new(
        id: OrderId,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::validate_quantity(quantity)?;
        Ok(Self {
            id,
            product_id,
            quantity,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Copy with the status assigned. Transition validity must already have
    /// been checked via [`OrderStatus::validate_transition`].
    pub fn with_status(&self, status: OrderStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Copy with the quantity replaced.
    pub fn with_quantity(&self, quantity: i64, now: DateTime<Utc>) -> DomainResult<Self> {
        Self::validate_quantity(quantity)?;
        Ok(Self {
            quantity,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Deletion is only allowed while the order is still PENDING; anything
    /// else must be canceled instead of removed.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invalid_operation(
                "cannot delete non-pending orders",
            ));
        }
        Ok(())
    }

    /// Copy at the given version. Store-managed; domain code never calls this.
    pub fn at_version(self, version: u64) -> Self {
        Self { version, ..self }
    }

    fn validate_quantity(quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than 0"));
        }
        Ok(())
    }
}
