pub mod embedding;
pub mod items;
pub mod link_preview;
pub mod upstream;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "clippy-server",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
