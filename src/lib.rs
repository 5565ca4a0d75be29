//! # clipq
//!
//! Hands out audio clips to concurrent transcribers with time-bounded
//! leases, records the finished transcriptions, and keeps the clip
//! catalogue in step with the content store.
//!
//! All coordination happens in Postgres: a grant is one
//! `FOR UPDATE SKIP LOCKED` statement, a commit is one short transaction,
//! and abandoned leases are reclaimed lazily by the next grant.

pub mod config;
pub mod content;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod telemetry;

pub use config::{Config, EngineConfig};
pub use engine::Engine;
pub use error::{Error, Result};
