//! Core data model.
//!
//! A unit is one clip waiting for human transcription. A lease is a
//! time-bounded claim on a unit; an annotation is one finished piece of
//! work against it.

pub mod annotation;
pub mod catalogue;
pub mod report;
pub mod unit;

pub use annotation::{Annotation, AnnotationId, CommitResult, NewAnnotation};
pub use catalogue::{CatalogueDiff, ImportReport, ImportRow, SkipCause, SkippedRow};
pub use report::{LeaderboardEntry, Progress, Range};
pub use unit::{Lease, Unit, UnitId};

/// Generates the newtype-over-UUID boilerplate shared by the id types.
macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

pub(crate) use uuid_id;
