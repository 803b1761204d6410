#[tokio::main]
async fn main() {
    storefront_observability::init();

    let webhook_secret = std::env::var("WEBHOOK_SECRET").unwrap_or_else(|_| {
        tracing::warn!("WEBHOOK_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let app = storefront_api::app::build_app(webhook_secret);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000")
        .await
        .expect("failed to bind 0.0.0.0:8000");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
