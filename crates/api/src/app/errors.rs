use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::DomainError;
use storefront_webhook::WebhookError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvalidTransition(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", msg)
        }
        DomainError::InvalidOperation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_operation", msg)
        }
    }
}

pub fn webhook_error_to_response(err: WebhookError) -> axum::response::Response {
    match err {
        WebhookError::MissingSignature => {
            json_error(StatusCode::UNAUTHORIZED, "missing_signature", "missing signature")
        }
        WebhookError::InvalidSignature => {
            json_error(StatusCode::FORBIDDEN, "invalid_signature", "invalid signature")
        }
        WebhookError::MalformedPayload(msg) => {
            json_error(StatusCode::BAD_REQUEST, "malformed_payload", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
