//! Storage contract for issued one-time passwords.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A code waiting to be verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub identity_hash: String,
    pub code: String,
    /// Failed verification attempts so far.
    pub attempts: u32,
    pub expires_at: DateTime<Utc>,
}

impl OtpEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Keyed by the `otp_id` handed to the client. At most one live entry per identity.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores `entry` under `otp_id`, dropping any code previously issued to the same identity.
    async fn replace(&self, otp_id: Uuid, entry: OtpEntry) -> anyhow::Result<()>;

    /// Atomically removes and returns the entry, so two verifications can never both see it.
    async fn take(&self, otp_id: Uuid) -> anyhow::Result<Option<OtpEntry>>;

    /// Puts an entry back after a failed attempt. A newer code for the same identity wins.
    async fn restore(&self, otp_id: Uuid, entry: OtpEntry) -> anyhow::Result<()>;

    /// Deletes every entry that expired before `now`; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
}
