//! The engine: the public surface for leasing, committing, and reconciling.
//!
//! `acquire` and `commit` are each a single bounded transaction against
//! Postgres. Nothing is retried here; `Error::is_transient` tells the caller
//! when a retry with backoff makes sense.

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{Instrument, debug, info, warn};

use crate::config::EngineConfig;
use crate::db::Db;
use crate::error::Result;
use crate::model::*;
use crate::reconcile::{self, ListingSource};
use crate::telemetry::lease::{acquire_span, commit_span, import_span, record_grant};
use crate::telemetry::metrics;

/// Lease-based work assignment over the unit catalogue.
#[derive(Clone)]
pub struct Engine {
    db: Db,
    config: EngineConfig,
}

impl Engine {
    pub fn new(db: Db, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { db, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    // -----------------------------------------------------------------------
    // Lease manager
    // -----------------------------------------------------------------------

    /// Lease one eligible unit until `now + lease_duration`.
    ///
    /// Eligible means below the annotation target and either unleased or
    /// with a lease that expired at or before `now`. The lowest count wins,
    /// ties broken at random. `Ok(None)` is an empty queue, not a failure.
    pub async fn acquire(&self, now: DateTime<Utc>) -> Result<Option<Lease>> {
        let span = acquire_span();
        let started = Instant::now();
        let expires_at = now + self.config.lease_offset();

        let granted = self
            .db
            .grant_lease(now, expires_at, self.config.max_count())
            .instrument(span.clone())
            .await;

        let outcome = match &granted {
            Ok(Some(lease)) => {
                record_grant(&span, lease);
                span.in_scope(|| {
                    info!(
                        unit = %lease.unit_id,
                        label = %lease.reference_label,
                        count = lease.annotation_count,
                        %expires_at,
                        "lease granted"
                    )
                });
                "granted"
            }
            Ok(None) => {
                span.in_scope(|| debug!("no eligible unit"));
                "empty"
            }
            Err(e) => {
                span.in_scope(|| warn!(error = %e, transient = e.is_transient(), "acquire failed"));
                "error"
            }
        };

        metrics::leases_acquired().add(1, &[KeyValue::new("result", outcome)]);
        record_duration("lease.acquire", started);
        granted
    }

    // -----------------------------------------------------------------------
    // Annotation recorder
    // -----------------------------------------------------------------------

    /// Record an annotation, bump the unit's count, and release its lease.
    ///
    /// The caller's lease is not required to still be live. A unit that was
    /// already at its target still takes the annotation; the result says so
    /// with [`CommitResult::AlreadyExhausted`].
    pub async fn commit(
        &self,
        unit_id: UnitId,
        new: NewAnnotation,
        now: DateTime<Utc>,
    ) -> Result<CommitResult> {
        let span = commit_span(unit_id);
        let started = Instant::now();

        let (annotation, before) = self
            .db
            .record_annotation(unit_id, &new, now, self.config.lock_timeout)
            .instrument(span.clone())
            .await?;

        let exhausted = before >= self.config.max_annotations_per_unit;
        span.record("unit.exhausted", exhausted);
        span.in_scope(|| {
            if exhausted {
                warn!(
                    annotation = %annotation.id,
                    count = before + 1,
                    target = self.config.max_annotations_per_unit,
                    "annotation recorded past target"
                );
            } else {
                info!(annotation = %annotation.id, count = before + 1, "annotation recorded");
            }
        });

        metrics::annotations_committed()
            .add(1, &[KeyValue::new("exhausted", exhausted.to_string())]);
        record_duration("annotation.commit", started);

        Ok(if exhausted {
            CommitResult::AlreadyExhausted(annotation)
        } else {
            CommitResult::Recorded(annotation)
        })
    }

    // -----------------------------------------------------------------------
    // Catalogue reconciler
    // -----------------------------------------------------------------------

    /// Insert one unit per row. Blank and duplicate labels (including
    /// repeats within the batch) are skipped; a store error on one row is
    /// recorded against that row and the rest carry on.
    pub async fn import_batch<I>(&self, rows: I) -> ImportReport
    where
        I: IntoIterator<Item = ImportRow>,
    {
        let rows: Vec<ImportRow> = rows.into_iter().collect();
        let span = import_span(rows.len());
        let started = Instant::now();
        let mut report = ImportReport::default();

        async {
            let now = Utc::now();
            for (index, row) in rows.into_iter().enumerate() {
                let row_index = index + 1;
                let Some(label) = reconcile::normalize_label(&row.label) else {
                    report.skip(row_index, row.label.clone(), SkipCause::BlankLabel);
                    continue;
                };
                let text = reconcile::normalize_text(row.reference_text.as_deref());

                match self.db.insert_unit(label, text.as_deref(), now).await {
                    Ok(Some(_)) => {
                        report.inserted += 1;
                        metrics::import_rows().add(1, &[KeyValue::new("result", "inserted")]);
                    }
                    Ok(None) => report.skip(row_index, label.to_string(), SkipCause::Duplicate),
                    Err(e) => {
                        warn!(row = row_index, label, error = %e, "import row failed");
                        report.skip(
                            row_index,
                            label.to_string(),
                            SkipCause::StoreError {
                                message: e.to_string(),
                            },
                        );
                    }
                }
            }

            info!(
                inserted = report.inserted,
                skipped = report.skipped_count(),
                "import finished"
            );
        }
        .instrument(span)
        .await;

        record_duration("catalogue.import", started);
        report
    }

    /// Compare the catalogue against the content store's keys. Read-only.
    pub async fn diff(&self, external: &BTreeSet<String>) -> Result<CatalogueDiff> {
        let catalogue = self.db.catalogue_labels().await?;
        let diff = reconcile::diff_labels(&catalogue, external);
        info!(
            only_external = diff.only_external.len(),
            only_catalogue = diff.only_catalogue.len(),
            matched = diff.matched_count,
            "catalogue diff"
        );
        Ok(diff)
    }

    /// [`Engine::diff`] against a listing source. The listing completes
    /// before the catalogue is read.
    pub async fn diff_with(&self, source: &dyn ListingSource) -> Result<CatalogueDiff> {
        let external = source.list_labels().await?;
        self.diff(&external).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_unit(&self, id: UnitId) -> Result<Unit> {
        self.db.get_unit(id).await
    }

    /// Annotations for a unit; `NotFound` if the unit does not exist.
    pub async fn annotations_for(&self, id: UnitId) -> Result<Vec<Annotation>> {
        self.db.get_unit(id).await?;
        self.db.annotations_for(id).await
    }

    pub async fn list_units(&self) -> Result<Vec<Unit>> {
        self.db.list_units().await
    }

    /// Units below the target, fewest annotations first.
    pub async fn backlog(&self, limit: i64) -> Result<Vec<Unit>> {
        self.db.backlog(self.config.max_count(), limit).await
    }

    pub async fn progress(&self, now: DateTime<Utc>) -> Result<Progress> {
        self.db.progress(now, self.config.max_count()).await
    }

    pub async fn leaderboard(
        &self,
        range: Range,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.db.leaderboard(range, now).await
    }
}

impl ImportReport {
    fn skip(&mut self, row_index: usize, label: String, cause: SkipCause) {
        metrics::import_rows().add(1, &[KeyValue::new("result", cause.as_str())]);
        self.skipped.push(SkippedRow {
            row_index,
            label,
            cause,
        });
    }
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}
