//! Error types for clipq.

use thiserror::Error;

/// SQLSTATE codes Postgres raises when a transaction lost a race for a lock
/// or a serializable snapshot. Callers retry these with backoff.
const TRANSIENT_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available (lock_timeout)
];

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store contention, retry with backoff: {0}")]
    Contention(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure came from lock or serialization contention in the
    /// store. The engine never retries on its own; the caller owns the
    /// latency budget.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Contention(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::PoolTimedOut = err {
            return Error::Contention("timed out waiting for a pooled connection".to_string());
        }
        let transient = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| TRANSIENT_SQLSTATES.iter().any(|c| code == *c));
        if transient {
            Error::Contention(err.to_string())
        } else {
            Error::Database(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
