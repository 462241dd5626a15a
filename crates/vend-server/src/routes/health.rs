use axum::Json;

/// GET /: liveness check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello World" }))
}
