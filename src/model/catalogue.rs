//! Import and reconciliation types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(alias = "filename")]
    pub label: String,
    #[serde(default, alias = "transcription")]
    pub reference_text: Option<String>,
}

impl ImportRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reference_text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.reference_text = Some(text.into());
        self
    }
}

/// Why an import row did not produce a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SkipCause {
    BlankLabel,
    Duplicate,
    /// The insert itself failed; the message is from the store.
    StoreError { message: String },
}

impl SkipCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipCause::BlankLabel => "blank_label",
            SkipCause::Duplicate => "duplicate",
            SkipCause::StoreError { .. } => "store_error",
        }
    }
}

impl std::fmt::Display for SkipCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipCause::StoreError { message } => write!(f, "store_error: {message}"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based position in the submitted batch.
    pub row_index: usize,
    pub label: String,
    #[serde(flatten)]
    pub cause: SkipCause,
}

/// Outcome of a bulk import. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn count_by(&self, cause: &str) -> usize {
        self.skipped
            .iter()
            .filter(|row| row.cause.as_str() == cause)
            .count()
    }
}

/// Drift between the catalogue and the external content store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueDiff {
    /// Present in the content store, never imported.
    pub only_external: BTreeSet<String>,
    /// Catalogued, but gone from the content store.
    pub only_catalogue: BTreeSet<String>,
    pub matched_count: usize,
}

impl CatalogueDiff {
    pub fn is_in_sync(&self) -> bool {
        self.only_external.is_empty() && self.only_catalogue.is_empty()
    }
}
