use serde::Deserialize;

use storefront_orders::OrderId;

use crate::signature::WebhookError;

/// Event type that transitions the referenced order to PAID.
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment.succeeded";

/// Parsed webhook payload: `{ "event": ..., "data": { "order_id": ... } }`.
///
/// Only parsed **after** signature verification. Unrecognized event types are
/// valid payloads; they are acknowledged without any state change.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    pub event: String,
    #[serde(default)]
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEventData {
    pub order_id: Option<OrderId>,
}

impl PaymentEvent {
    pub fn parse(raw_body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(raw_body).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
    }

    pub fn is_payment_succeeded(&self) -> bool {
        self.event == EVENT_PAYMENT_SUCCEEDED
    }

    /// The order referenced by a recognized event. Missing `order_id` on a
    /// `payment.succeeded` event is a malformed payload.
    pub fn order_id(&self) -> Result<OrderId, WebhookError> {
        self.data.order_id.ok_or_else(|| {
            WebhookError::MalformedPayload("data.order_id is required".to_string())
        })
    }
}
