//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The database URL is wrapped in `secrecy::SecretString` so it
//! never lands in logs.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_LEASE_MINUTES: u64 = 15;
const DEFAULT_MAX_ANNOTATIONS: u32 = 2;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const MAX_LEASE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub max_connections: u32,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let engine = EngineConfig {
            lease_duration: Duration::from_secs(
                parsed_var::<u64>("LEASE_DURATION_MINUTES", DEFAULT_LEASE_MINUTES)?
                    .saturating_mul(60),
            ),
            max_annotations_per_unit: parsed_var(
                "MAX_ANNOTATIONS_PER_UNIT",
                DEFAULT_MAX_ANNOTATIONS,
            )?,
            lock_timeout: Duration::from_millis(parsed_var(
                "LOCK_TIMEOUT_MS",
                DEFAULT_LOCK_TIMEOUT_MS,
            )?),
        };
        engine.validate()?;

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            max_connections: parsed_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            engine,
        })
    }
}

/// Tunables handed to [`crate::engine::Engine::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a grant stays valid before another `acquire` may reclaim it.
    pub lease_duration: Duration,
    /// Soft target: units at or above this count are no longer leased, and
    /// commits past it are flagged (but still recorded).
    pub max_annotations_per_unit: u32,
    /// Upper bound a `commit` waits for the unit's row lock.
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lease_duration: Duration::from_secs(DEFAULT_LEASE_MINUTES * 60),
            max_annotations_per_unit: DEFAULT_MAX_ANNOTATIONS,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

/// `[engine]` table of a TOML config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    lease_duration_minutes: Option<u64>,
    max_annotations_per_unit: Option<u32>,
    lock_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    engine: EngineSection,
}

impl EngineConfig {
    /// Parse an `[engine]` table; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| Error::Config(format!("bad engine config: {e}")))?;
        let defaults = Self::default();
        let section = file.engine;

        let config = Self {
            lease_duration: section
                .lease_duration_minutes
                .map(|m| Duration::from_secs(m.saturating_mul(60)))
                .unwrap_or(defaults.lease_duration),
            max_annotations_per_unit: section
                .max_annotations_per_unit
                .unwrap_or(defaults.max_annotations_per_unit),
            lock_timeout: section
                .lock_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load an `[engine]` table from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read engine config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lease_duration.is_zero() {
            return Err(Error::Config("lease duration must be positive".to_string()));
        }
        if self.max_annotations_per_unit == 0 {
            return Err(Error::Config(
                "max annotations per unit must be at least 1".to_string(),
            ));
        }
        if i32::try_from(self.max_annotations_per_unit).is_err() {
            return Err(Error::Config(format!(
                "max annotations per unit {} is out of range",
                self.max_annotations_per_unit
            )));
        }
        if self.lease_duration > MAX_LEASE {
            return Err(Error::Config(format!(
                "lease duration {:?} exceeds 30 days",
                self.lease_duration
            )));
        }
        Ok(())
    }

    /// Lease duration as a chrono offset for timestamp arithmetic.
    pub(crate) fn lease_offset(&self) -> chrono::Duration {
        // validate() caps the lease well inside chrono's range
        chrono::Duration::from_std(self.lease_duration)
            .unwrap_or_else(|_| chrono::Duration::days(30))
    }

    pub(crate) fn max_count(&self) -> i32 {
        i32::try_from(self.max_annotations_per_unit).unwrap_or(i32::MAX)
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}
