//! Liveness check that also round-trips the database.

use crate::transport::http::error::ApiError;
use crate::transport::http::handlers::common::ok;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use std::time::Instant;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Process is up and Postgres answers", body = ApiResponse),
        (status = 503, description = "Postgres did not answer", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let started = Instant::now();
    let ping: Result<i32, sqlx::Error> = sqlx::query_scalar("SELECT 1").fetch_one(state.db.pool()).await;
    if let Err(e) = ping {
        tracing::warn!(error = %e, "health check could not reach the database");
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unreachable"));
    }
    ok(json!({
        "status": "ok",
        "database_latency_ms": started.elapsed().as_millis() as u64,
    }))
}
