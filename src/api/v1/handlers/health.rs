/*
 * Responsibility
 * - GET /health (疎通用)
 * - identity flow と store には触れない
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
