//! Persistent OTP store implementation using PostgreSQL (`otp_codes`).

use crate::storage::otp::store::{OtpEntry, OtpStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// An OTP store shared by every API instance pointed at the same database.
#[derive(Clone)]
pub struct PostgresOtpStore {
    pool: PgPool,
}

impl PostgresOtpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PostgresOtpStore {
    async fn replace(&self, otp_id: Uuid, entry: OtpEntry) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM otp_codes WHERE identity_hash = $1")
            .bind(&entry.identity_hash)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO otp_codes (otp_id, identity_hash, code, attempts, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(otp_id)
        .bind(&entry.identity_hash)
        .bind(&entry.code)
        .bind(entry.attempts as i32)
        .bind(entry.expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn take(&self, otp_id: Uuid) -> Result<Option<OtpEntry>> {
        let row = sqlx::query(
            "DELETE FROM otp_codes WHERE otp_id = $1
             RETURNING identity_hash, code, attempts, expires_at",
        )
        .bind(otp_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let attempts: i32 = row.try_get("attempts")?;
                Ok(Some(OtpEntry {
                    identity_hash: row.try_get("identity_hash")?,
                    code: row.try_get("code")?,
                    attempts: attempts.max(0) as u32,
                    expires_at: row.try_get("expires_at")?,
                }))
            }
        }
    }

    async fn restore(&self, otp_id: Uuid, entry: OtpEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO otp_codes (otp_id, identity_hash, code, attempts, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT DO NOTHING",
        )
        .bind(otp_id)
        .bind(&entry.identity_hash)
        .bind(&entry.code)
        .bind(entry.attempts as i32)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
