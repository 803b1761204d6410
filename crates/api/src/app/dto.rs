use rust_decimal::Decimal;
use serde::Deserialize;

use storefront_catalog::{Product, ProductId, ProductPatch};
use storefront_infra::OrderChange;
use storefront_orders::{Order, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl UpdateProductRequest {
    pub fn into_patch(self) -> ProductPatch {
        ProductPatch {
            sku: self.sku,
            name: self.name,
            price: self.price,
            stock: self.stock,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub quantity: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl UpdateOrderRequest {
    pub fn into_change(self) -> OrderChange {
        OrderChange {
            quantity: self.quantity,
            status: self.status,
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id_typed().to_string(),
        "sku": product.sku(),
        "name": product.name(),
        "price": product.price(),
        "stock": product.stock(),
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id_typed().to_string(),
        "product_id": order.product_id().to_string(),
        "quantity": order.quantity(),
        "status": order.status(),
        "created_at": order.created_at(),
        "updated_at": order.updated_at(),
    })
}
