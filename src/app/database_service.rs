//! The platform database handle.
//!
//! Owns the Postgres pool, makes sure the schema exists on startup and hands out transactions
//! to the workflows in `app`.

use crate::infra::Config;
use crate::storage::ensure_schema;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

pub struct DatabaseService {
    pool: PgPool,
}

impl DatabaseService {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connects to `config.database_url` and creates any missing tables.
    pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        ensure_schema(&pool).await?;
        tracing::info!(max_connections = config.db_max_connections, "database ready");

        Ok(Self { pool })
    }

    /// Wraps an existing pool (tests and the seed binary).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
