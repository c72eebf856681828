//! One-time password issuance and verification.
//!
//! Codes are numeric, fixed length, single-use and expire after the configured TTL. A code is
//! discarded after too many wrong guesses, and issuing a new code for an identity invalidates
//! the previous one.

use crate::infra::config::OtpSettings;
use crate::storage::otp::{OtpEntry, OtpStore};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::sync::Notify;
use tokio::time::interval;
use uuid::Uuid;

/// Sends a freshly issued code to its owner.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn deliver(&self, identity_hash: &str, otp_id: Uuid, code: &str) -> anyhow::Result<()>;
}

/// Writes the code to the log. Used until an SMS gateway is wired in.
pub struct LogDelivery;

#[async_trait]
impl OtpDelivery for LogDelivery {
    async fn deliver(&self, identity_hash: &str, otp_id: Uuid, code: &str) -> anyhow::Result<()> {
        let prefix = identity_hash.get(..8).unwrap_or(identity_hash);
        tracing::info!(%otp_id, identity = %prefix, code, "OTP issued");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    pub otp_id: Uuid,
    pub code: String,
    pub expires_in: Duration,
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    delivery: Arc<dyn OtpDelivery>,
    settings: OtpSettings,
    shutdown: Arc<Notify>,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, delivery: Arc<dyn OtpDelivery>, settings: OtpSettings) -> Self {
        Self {
            store,
            delivery,
            settings,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.settings.ttl
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.settings.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Issues a new code for `identity_hash`, replacing any code still outstanding.
    pub async fn issue(&self, identity_hash: &str) -> anyhow::Result<IssuedOtp> {
        let otp_id = Uuid::new_v4();
        let code = self.generate_code();
        let ttl = chrono::Duration::from_std(self.settings.ttl)?;

        self.store
            .replace(
                otp_id,
                OtpEntry {
                    identity_hash: identity_hash.to_string(),
                    code: code.clone(),
                    attempts: 0,
                    expires_at: Utc::now() + ttl,
                },
            )
            .await?;
        self.delivery.deliver(identity_hash, otp_id, &code).await?;

        Ok(IssuedOtp {
            otp_id,
            code,
            expires_in: self.settings.ttl,
        })
    }

    /// True exactly once for a matching, unexpired code issued to `identity_hash`.
    ///
    /// Unknown, expired and wrong codes are indistinguishable to the caller.
    pub async fn verify(&self, otp_id: Uuid, identity_hash: &str, code: &str) -> anyhow::Result<bool> {
        let Some(mut entry) = self.store.take(otp_id).await? else {
            return Ok(false);
        };
        if entry.is_expired(Utc::now()) {
            return Ok(false);
        }

        let identity_ok = entry.identity_hash == identity_hash;
        let code_ok: bool = entry.code.as_bytes().ct_eq(code.trim().as_bytes()).into();
        if identity_ok && code_ok {
            return Ok(true);
        }

        entry.attempts += 1;
        if entry.attempts < self.settings.max_attempts {
            self.store.restore(otp_id, entry).await?;
        } else {
            tracing::warn!(%otp_id, "OTP discarded after too many failed attempts");
        }
        Ok(false)
    }

    pub async fn purge_expired(&self) -> anyhow::Result<u64> {
        self.store.purge_expired(Utc::now()).await
    }

    /// Periodically drops expired codes until [`OtpService::shutdown`] is called.
    pub fn start_purge_task(self: Arc<Self>, every: Duration) {
        tokio::spawn(async move {
            let mut timer = interval(every);
            let shutdown = self.shutdown.clone();
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        match self.purge_expired().await {
                            Ok(0) => {}
                            Ok(n) => tracing::debug!(purged = n, "expired OTPs removed"),
                            Err(e) => tracing::warn!(error = %e, "OTP purge failed"),
                        }
                    }
                    _ = shutdown.notified() => {
                        tracing::info!("OTP purge task shutting down");
                        break;
                    }
                }
            }
        });
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
