//! Fetch URLs for leased clips.
//!
//! The catalogue stores labels only. Turning a label into something a
//! browser can fetch belongs to the content store, behind [`ContentResolver`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::Lease;

/// Mints a time-limited fetch URL for a content-store key.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(&self, label: &str, ttl: Duration) -> Result<String>;
}

/// Joins labels onto a fixed base URL. For stores that serve clips publicly
/// or behind a proxy that handles auth; `ttl` is not encoded.
#[derive(Debug, Clone)]
pub struct BaseUrlResolver {
    base: String,
}

impl BaseUrlResolver {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "content base URL must be http(s): {base}"
            )));
        }
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentResolver for BaseUrlResolver {
    async fn resolve(&self, label: &str, _ttl: Duration) -> Result<String> {
        let path = label
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!("{}/{path}", self.base))
    }
}

/// A lease plus the URL to fetch its clip.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub lease: Lease,
    pub fetch_url: String,
}

/// Acquire a unit, then resolve its URL.
///
/// Resolution runs after the lease has committed, so no row lock is held
/// across the call to the content store. If resolution fails the lease
/// simply runs out.
pub async fn assign(
    engine: &Engine,
    resolver: &dyn ContentResolver,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Option<Assignment>> {
    let Some(lease) = engine.acquire(now).await? else {
        return Ok(None);
    };
    let fetch_url = resolver.resolve(&lease.reference_label, ttl).await?;
    Ok(Some(Assignment { lease, fetch_url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn base_resolver_joins_and_escapes() {
        let resolver = BaseUrlResolver::new("https://cdn.example.org/clips/").unwrap();
        let url = resolver
            .resolve("batch 1/a.wav", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.org/clips/batch%201/a.wav");
    }

    #[tokio::test]
    async fn base_resolver_escapes_url_delimiters_in_labels() {
        let resolver = BaseUrlResolver::new("https://cdn.example.org/clips").unwrap();
        let ttl = Duration::from_secs(60);

        let take = resolver.resolve("take#2.wav", ttl).await.unwrap();
        assert_eq!(take, "https://cdn.example.org/clips/take%232.wav");

        let query = resolver.resolve("clip?.wav", ttl).await.unwrap();
        assert_eq!(query, "https://cdn.example.org/clips/clip%3F.wav");

        let plus = resolver.resolve("a+b/100%.wav", ttl).await.unwrap();
        assert_eq!(plus, "https://cdn.example.org/clips/a%2Bb/100%25.wav");
    }

    #[test]
    fn base_resolver_rejects_non_http() {
        assert!(BaseUrlResolver::new("gs://bucket").is_err());
    }
}
