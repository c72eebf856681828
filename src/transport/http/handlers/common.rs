use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub fn respond<T: Serialize>(status: StatusCode, data: T) -> Result<Response, ApiError> {
    let data = serde_json::to_value(data).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode response: {}", e),
        )
    })?;
    Ok((
        status,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
        .into_response())
}

pub fn ok<T: Serialize>(data: T) -> Result<Response, ApiError> {
    respond(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Result<Response, ApiError> {
    respond(StatusCode::CREATED, data)
}

/// Like `Json<T>` but treats a request without a JSON body as `T::default()`.
pub fn body_or_default<T: Default>(
    body: Result<Json<T>, JsonRejection>,
    expected: &str,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(e) => Err(json_422(e, expected)),
    }
}
