use axum::Json;
use serde_json::{json, Value};

/// GET /healthz
/// Liveness only; collaborators are not probed.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME")
    }))
}
