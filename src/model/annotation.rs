//! Completed work recorded against a unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnitId;
use super::uuid_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

uuid_id!(AnnotationId);

/// One finished transcription. Written once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub unit_id: UnitId,
    /// Transcript text and metadata. Passed through as-is.
    pub payload: serde_json::Value,
    /// Who submitted it, when attributed.
    pub contributor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input to a commit.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub(crate) payload: serde_json::Value,
    pub(crate) contributor: Option<String>,
}

impl NewAnnotation {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            contributor: None,
        }
    }

    pub fn contributor(mut self, contributor: impl Into<String>) -> Self {
        let contributor = contributor.into();
        let trimmed = contributor.trim();
        self.contributor = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

/// What happened when an annotation was committed. Both variants mean the
/// annotation was stored and the lease released.
#[derive(Debug)]
pub enum CommitResult {
    Recorded(Annotation),
    /// The unit had already reached its target before this commit. Advisory
    /// only: the annotation is kept and the count still moves past the target.
    AlreadyExhausted(Annotation),
}

impl CommitResult {
    pub fn annotation(&self) -> &Annotation {
        match self {
            CommitResult::Recorded(a) | CommitResult::AlreadyExhausted(a) => a,
        }
    }

    pub fn into_annotation(self) -> Annotation {
        match self {
            CommitResult::Recorded(a) | CommitResult::AlreadyExhausted(a) => a,
        }
    }

    pub fn was_exhausted(&self) -> bool {
        matches!(self, CommitResult::AlreadyExhausted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_contributor_is_dropped() {
        let new = NewAnnotation::new(json!({})).contributor("   ");
        assert_eq!(new.contributor, None);
    }

    #[test]
    fn contributor_is_trimmed() {
        let new = NewAnnotation::new(json!({})).contributor(" sahan ");
        assert_eq!(new.contributor.as_deref(), Some("sahan"));
    }
}
