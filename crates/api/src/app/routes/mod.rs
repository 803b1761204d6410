use axum::Router;

pub mod orders;
pub mod products;
pub mod system;
pub mod webhooks;

/// Router for all service endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/webhooks", webhooks::router())
}
