//! Citizen OTP login and admin password login.

use crate::app::error::{AppError, AppResult};
use crate::app::otp_service::{IssuedOtp, OtpService};
use crate::crypto::{admin_identity, hash_identity, hash_password, TokenIssuer};
use crate::domain::identity::{validate_identity, Role};
use crate::storage::repo::{admins, citizens, users};
use sqlx::PgConnection;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const INVALID_OTP: &str = "Invalid or expired OTP";
const INVALID_ADMIN_LOGIN: &str = "Invalid username or password";

/// A signed access token and the account it was issued for.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: String,
    pub user_id: i64,
    pub role: Role,
}

/// First login step: makes sure the user and citizen records exist, then issues an OTP.
pub async fn start_login(
    conn: &mut PgConnection,
    otp: &OtpService,
    salt: &str,
    raw_identity: &str,
) -> AppResult<IssuedOtp> {
    let identity = validate_identity(raw_identity)?;
    let identity_hash = hash_identity(salt, identity);

    let (user, created) = users::get_or_create(conn, &identity_hash, Role::Citizen).await?;
    if created {
        tracing::info!(user_id = user.user_id, "new citizen account created");
    }
    citizens::ensure_exists(conn, &identity_hash).await?;

    Ok(otp.issue(&identity_hash).await?)
}

/// Second login step: exchanges a valid OTP for an access token.
pub async fn verify_login(
    conn: &mut PgConnection,
    otp: &OtpService,
    tokens: &TokenIssuer,
    salt: &str,
    raw_identity: &str,
    otp_id: Uuid,
    code: &str,
) -> AppResult<AccessGrant> {
    let identity = validate_identity(raw_identity)?;
    let identity_hash = hash_identity(salt, identity);

    if !otp.verify(otp_id, &identity_hash, code).await? {
        return Err(AppError::Unauthorized(INVALID_OTP.to_string()));
    }

    let (user, _) = users::get_or_create(conn, &identity_hash, Role::Citizen).await?;
    users::touch_login(conn, user.user_id).await?;
    let role: Role = user.role.parse()?;
    grant(tokens, user.user_id, role)
}

pub async fn admin_login(
    conn: &mut PgConnection,
    tokens: &TokenIssuer,
    username: &str,
    password: &str,
) -> AppResult<AccessGrant> {
    let Some(admin) = admins::find_by_username(conn, username.trim()).await? else {
        return Err(AppError::Unauthorized(INVALID_ADMIN_LOGIN.to_string()));
    };
    let supplied = hash_password(password);
    let matches: bool = supplied.as_bytes().ct_eq(admin.password_hash.as_bytes()).into();
    if !matches {
        return Err(AppError::Unauthorized(INVALID_ADMIN_LOGIN.to_string()));
    }

    let (user, _) = users::get_or_create(conn, &admin_identity(&admin.username), Role::Admin).await?;
    if user.role != Role::Admin.as_str() {
        users::set_role(conn, user.user_id, Role::Admin).await?;
    }
    if admin.user_id != Some(user.user_id) {
        admins::link_user(conn, admin.admin_id, user.user_id).await?;
    }
    users::touch_login(conn, user.user_id).await?;
    tracing::info!(admin = %admin.username, user_id = user.user_id, "admin logged in");

    grant(tokens, user.user_id, Role::Admin)
}

fn grant(tokens: &TokenIssuer, user_id: i64, role: Role) -> AppResult<AccessGrant> {
    let access_token = tokens
        .issue(user_id, role)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(AccessGrant {
        access_token,
        user_id,
        role,
    })
}
