//! Centralized configuration (environment variables + defaults).
//!
//! The configuration is read once at startup into an immutable [`Config`] and handed to the
//! components that need it. Nothing reads the environment after that point.

use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_IDENTITY_SALT: &str = "jansetu_secret_salt";
const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
/// One year; token `exp` must stay representable as a timestamp.
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Where issued OTP codes are kept until they are verified or expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// CORS origins accepted by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub length: usize,
    pub ttl: Duration,
    pub max_attempts: u32,
    pub store: OtpStoreKind,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL must be provided (no default) for safety.
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Salt mixed into every national-ID hash.
    pub identity_hash_salt: String,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub otp: OtpSettings,
    pub cors_origins: CorsOrigins,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` (if present) and builds the configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let db_max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 5u32)?.max(1);

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8000")?;

        let identity_hash_salt =
            get("AADHAAR_HASH_SALT").unwrap_or_else(|| DEFAULT_IDENTITY_SALT.to_string());
        let jwt_secret = get("JWT_SECRET_KEY").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        let jwt_minutes = parse_or(&get, "JWT_ACCESS_TOKEN_EXPIRE_MINUTES", 30u64)?.max(1);
        let jwt_seconds = jwt_minutes
            .checked_mul(60)
            .filter(|s| *s <= MAX_TOKEN_TTL_SECS)
            .ok_or_else(|| {
                anyhow!(
                    "JWT_ACCESS_TOKEN_EXPIRE_MINUTES must be at most {} (got {})",
                    MAX_TOKEN_TTL_SECS / 60,
                    jwt_minutes
                )
            })?;

        let otp_length = parse_or(&get, "OTP_LENGTH", 6usize)?;
        if !(4..=10).contains(&otp_length) {
            return Err(anyhow!("OTP_LENGTH must be between 4 and 10 (got {})", otp_length));
        }
        let otp_seconds = parse_or(&get, "OTP_EXPIRE_SECONDS", 300u64)?.max(1);
        let otp_max_attempts = parse_or(&get, "OTP_MAX_ATTEMPTS", 5u32)?.max(1);
        let otp_store = match get("OTP_STORE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("memory") => OtpStoreKind::Memory,
            Some("postgres") => OtpStoreKind::Postgres,
            Some(other) => return Err(anyhow!("OTP_STORE must be 'memory' or 'postgres' (got '{}')", other)),
        };

        let cors_origins = match get("CORS_ORIGINS") {
            None => CorsOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ]),
            Some(v) if v == "*" => CorsOrigins::Any,
            Some(v) => CorsOrigins::List(
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr,
            identity_hash_salt,
            jwt_secret,
            jwt_ttl: Duration::from_secs(jwt_seconds),
            otp: OtpSettings {
                length: otp_length,
                ttl: Duration::from_secs(otp_seconds),
                max_attempts: otp_max_attempts,
                store: otp_store,
            },
            cors_origins,
            log_format,
        })
    }

    /// True when the salt or signing key were left at their development defaults.
    pub fn uses_default_secrets(&self) -> bool {
        self.identity_hash_salt == DEFAULT_IDENTITY_SALT || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| anyhow!("{} must be a valid number (got '{}')", key, v)),
    }
}
