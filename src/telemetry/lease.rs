//! Span helpers for engine operations.

use tracing::Span;

use crate::model::{Lease, UnitId};

/// Span around one acquire. `unit.id` is filled in by [`record_grant`].
pub fn acquire_span() -> Span {
    tracing::info_span!(
        "lease.acquire",
        "unit.id" = tracing::field::Empty,
        "unit.annotation_count" = tracing::field::Empty,
    )
}

/// Record the granted unit on an acquire span.
pub fn record_grant(span: &Span, lease: &Lease) {
    span.record("unit.id", tracing::field::display(lease.unit_id));
    span.record("unit.annotation_count", lease.annotation_count);
}

/// Span around one commit.
pub fn commit_span(unit_id: UnitId) -> Span {
    tracing::info_span!(
        "annotation.commit",
        "unit.id" = %unit_id,
        "unit.exhausted" = tracing::field::Empty,
    )
}

/// Span around a bulk import.
pub fn import_span(rows: usize) -> Span {
    tracing::info_span!("catalogue.import", "import.rows" = rows)
}
