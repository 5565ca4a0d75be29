//! Metric instrument factories for clipq.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op, so recording is
//! always safe.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("clipq")
}

/// Counter: acquire calls.
/// Labels: `result` ("granted" | "empty" | "error").
pub fn leases_acquired() -> Counter<u64> {
    meter()
        .u64_counter("clipq.lease.acquired")
        .with_description("Number of acquire calls by outcome")
        .build()
}

/// Counter: committed annotations.
/// Labels: `exhausted` ("true" when the unit was already at target).
pub fn annotations_committed() -> Counter<u64> {
    meter()
        .u64_counter("clipq.annotation.committed")
        .with_description("Number of annotations recorded")
        .build()
}

/// Counter: import rows by outcome.
/// Labels: `result` ("inserted" | "blank_label" | "duplicate" | "store_error").
pub fn import_rows() -> Counter<u64> {
    meter()
        .u64_counter("clipq.catalogue.import_rows")
        .with_description("Number of catalogue import rows processed")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("clipq.operation.duration_ms")
        .with_description("Engine operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
