use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use storefront_webhook::{PaymentEvent, SIGNATURE_HEADER};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/payment", post(payment_webhook))
}

/// Payment provider callback.
///
/// Verification runs over the raw request bytes before any parsing; the
/// body is only trusted once the signature checks out.
pub async fn payment_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    if let Err(e) = services.verifier().verify(&body, signature) {
        return errors::webhook_error_to_response(e);
    }

    let event = match PaymentEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => return errors::webhook_error_to_response(e),
    };

    if event.is_payment_succeeded() {
        let order_id = match event.order_id() {
            Ok(id) => id,
            Err(e) => return errors::webhook_error_to_response(e),
        };
        if let Err(e) = services.ledger().mark_paid(order_id) {
            return errors::domain_error_to_response(e);
        }
    } else {
        // Acknowledged, not acted on.
        tracing::info!(event = %event.event, "ignoring unrecognized webhook event");
    }

    (StatusCode::OK, Json(serde_json::json!({ "received": true }))).into_response()
}
