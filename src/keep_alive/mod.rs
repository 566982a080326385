use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Tiny HTTP surface so free-tier hosts and uptime monitors see the bot as
/// alive. Runs on its own task; failure to bind is logged, not fatal.
pub fn spawn(port: u16) {
    tokio::spawn(async move {
        let app = Router::new()
            .route("/", get(root))
            .route("/health", get(health));

        let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!("keep-alive server could not bind port {port}: {e}");
                return;
            }
        };

        info!("keep-alive server listening on port {port}");
        if let Err(e) = axum::serve(listener, app).await {
            warn!("keep-alive server stopped: {e}");
        }
    });
}

async fn root() -> &'static str {
    "Bot is alive!"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
