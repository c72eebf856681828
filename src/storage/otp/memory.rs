//! Process-local OTP store. Codes do not survive a restart.

use crate::storage::otp::store::{OtpEntry, OtpStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<Uuid, OtpEntry>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn replace(&self, otp_id: Uuid, entry: OtpEntry) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.identity_hash != entry.identity_hash);
        entries.insert(otp_id, entry);
        Ok(())
    }

    async fn take(&self, otp_id: Uuid) -> anyhow::Result<Option<OtpEntry>> {
        Ok(self.entries.lock().await.remove(&otp_id))
    }

    async fn restore(&self, otp_id: Uuid, entry: OtpEntry) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.values().any(|e| e.identity_hash == entry.identity_hash) {
            return Ok(());
        }
        entries.insert(otp_id, entry);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        Ok((before - entries.len()) as u64)
    }
}
