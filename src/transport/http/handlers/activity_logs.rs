use crate::app::activity_service;
use crate::storage::repo::activity::NewActivity;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::{created, ok};
use crate::transport::http::types::{ActivityLogRequest, ApiResponse, AppState, HistoryQuery};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/activity-logs/log",
    tag = "activity-logs",
    security(("bearer" = [])),
    request_body = ActivityLogRequest,
    responses(
        (status = 201, description = "Activity recorded", body = ApiResponse),
        (status = 400, description = "Missing type or description", body = ApiResponse),
        (status = 404, description = "Citizen profile not found", body = ApiResponse)
    )
)]
pub async fn log_activity_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<ActivityLogRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| {
        json_422(e, "{\"activity_type\": \"...\", \"activity_description\": \"...\"}")
    })?;
    let activity = NewActivity {
        activity_type: request.activity_type,
        activity_description: request.activity_description,
        entity_type: request.entity_type,
        entity_id: request.entity_id,
        metadata: request.metadata,
    };

    let mut tx = state.db.begin().await?;
    let activity_id = activity_service::log(&mut tx, &user.identity_hash, activity).await?;
    tx.commit().await?;

    created(json!({ "activity_id": activity_id, "message": "Activity logged" }))
}

#[utoipa::path(
    get,
    path = "/activity-logs/my-history",
    tag = "activity-logs",
    security(("bearer" = [])),
    params(
        ("activity_type" = Option<String>, Query, description = "Only entries of this type"),
        ("limit" = Option<i64>, Query, description = "Maximum entries (default 100, at most 500)")
    ),
    responses((status = 200, description = "The caller's activity, newest first", body = ApiResponse))
)]
pub async fn my_history_handler(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let mut conn = state.db.pool().acquire().await?;
    ok(activity_service::history(
        &mut conn,
        &user.identity_hash,
        query.activity_type.as_deref(),
        query.limit,
    )
    .await?)
}
