use axum::{extract::State, Json};
use lib_core::Config;
use lib_utils::{format_time, now_utc};
use serde_json::{json, Value};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(health))]
pub struct HealthApi;

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Status, timestamp and environment", body = serde_json::Value),
    )
)]
pub async fn health(State(config): State<Config>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": format_time(now_utc()),
        "environment": config.environment,
    }))
}
