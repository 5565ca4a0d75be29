//! Catalogue reconciliation: label normalization, drift detection, and the
//! listing sources that report what the content store holds.
//!
//! Drift is only reported. Nothing here inserts or deletes units.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::CatalogueDiff;

/// Audio extensions the content store serves.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac"];

/// Trimmed label, or `None` if nothing is left.
pub fn normalize_label(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Trimmed reference text; blank becomes `None`.
pub fn normalize_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Set comparison between catalogue labels and content-store keys.
pub fn diff_labels(catalogue: &BTreeSet<String>, external: &BTreeSet<String>) -> CatalogueDiff {
    CatalogueDiff {
        only_external: external.difference(catalogue).cloned().collect(),
        only_catalogue: catalogue.difference(external).cloned().collect(),
        matched_count: catalogue.intersection(external).count(),
    }
}

/// Something that can list every key currently in the content store.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn list_labels(&self) -> Result<BTreeSet<String>>;
}

#[async_trait]
impl ListingSource for BTreeSet<String> {
    async fn list_labels(&self) -> Result<BTreeSet<String>> {
        Ok(self.clone())
    }
}

/// Lists files under a local directory (a mounted bucket, a staging dir).
/// Keys are `/`-separated paths relative to the root.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    root: PathBuf,
    audio_only: bool,
}

impl DirectoryListing {
    /// List only files with one of [`AUDIO_EXTENSIONS`].
    pub fn audio(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            audio_only: true,
        }
    }

    /// List every regular file.
    pub fn all_files(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            audio_only: false,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if !self.audio_only {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|audio| audio.eq_ignore_ascii_case(ext))
            })
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ListingSource for DirectoryListing {
    async fn list_labels(&self) -> Result<BTreeSet<String>> {
        let mut labels = BTreeSet::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
                Error::Other(format!("cannot list {}: {e}", dir.display()))
            })?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.accepts(&path) {
                    match self.key_for(&path) {
                        Some(key) => {
                            labels.insert(key);
                        }
                        None => tracing::warn!(path = %path.display(), "skipping non-UTF-8 path"),
                    }
                }
            }
        }

        Ok(labels)
    }
}

/// Reads keys from a text file, one per line (e.g. a saved bucket listing).
#[derive(Debug, Clone)]
pub struct KeysFileListing {
    path: PathBuf,
}

impl KeysFileListing {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ListingSource for KeysFileListing {
    async fn list_labels(&self) -> Result<BTreeSet<String>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Other(format!("cannot read key listing {}: {e}", self.path.display()))
        })?;
        Ok(content
            .lines()
            .filter_map(normalize_label)
            .map(str::to_string)
            .collect())
    }
}
