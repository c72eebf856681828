//! Bearer-token authentication.
//!
//! The token only proves who the caller is. The role is re-read from `users` on every
//! request, so a promotion to SERVICE_PROVIDER takes effect without a new login.

use crate::app::AppError;
use crate::domain::identity::Role;
use crate::storage::repo::users;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub identity_hash: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role != role {
            return Err(AppError::Forbidden(format!("This endpoint requires the {} role", role)).into());
        }
        Ok(())
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
        let claims = state
            .tokens
            .validate(token)
            .map_err(|_| AppError::Unauthorized("Could not validate credentials".to_string()))?;

        let mut conn = state.db.pool().acquire().await?;
        let user = users::find_by_id(&mut conn, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;
        let role = user.role.parse::<Role>().map_err(AppError::from)?;

        Ok(AuthUser {
            user_id: user.user_id,
            identity_hash: user.identity_hash,
            role,
        })
    }
}
