//! Database connection pool, migrations, and health check.
//!
//! Every piece of shared state lives in Postgres; this process keeps no
//! in-memory tally of leases or counts. The submodules hold the SQL for each
//! write owner: `lease` (grants), `annotation` (commits), `catalogue`
//! (imports and reads), `stats` (reporting).

pub mod annotation;
pub mod catalogue;
pub mod lease;
pub mod stats;

use crate::error::{Error, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Database handle. Owns the connection pool; cheap to clone.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests point theirs at a scratch schema).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;
        Ok(())
    }

    /// Simple health check: run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Postgres has no unsigned ints; counts come back as `i32`/`i64`.
pub(crate) fn to_count(n: i32) -> u32 {
    u32::try_from(n).unwrap_or(0)
}

pub(crate) fn to_total(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
