//! Annotation commits: insert, bump the count, release the lease.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Annotation, AnnotationId, NewAnnotation, UnitId};

#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: Uuid,
    unit_id: Uuid,
    payload: serde_json::Value,
    contributor: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AnnotationRow> for Annotation {
    fn from(row: AnnotationRow) -> Self {
        Self {
            id: AnnotationId(row.id),
            unit_id: UnitId(row.unit_id),
            payload: row.payload,
            contributor: row.contributor,
            created_at: row.created_at,
        }
    }
}

impl super::Db {
    /// Record an annotation against `unit_id` in one transaction. Returns the
    /// stored annotation and the unit's count *before* this commit.
    ///
    /// The caller's lease is not checked: a late commit against an expired or
    /// re-granted lease still lands. Waiting on the unit's row lock is capped
    /// by `lock_timeout`; hitting it surfaces as `Error::Contention`.
    pub async fn record_annotation(
        &self,
        unit_id: UnitId,
        new: &NewAnnotation,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> Result<(Annotation, u32)> {
        let mut tx = self.pool().begin().await?;

        // SET LOCAL cannot take bind parameters; set_config(.., true) is the
        // transaction-scoped equivalent that can.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", lock_timeout.as_millis().max(1)))
            .execute(&mut *tx)
            .await?;

        let before: Option<(i32,)> =
            sqlx::query_as("SELECT annotation_count FROM units WHERE id = $1 FOR UPDATE")
                .bind(unit_id.0)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((before,)) = before else {
            // dropping tx rolls back
            return Err(Error::NotFound(format!("unit {unit_id}")));
        };

        let row: AnnotationRow = sqlx::query_as(
            "INSERT INTO annotations (id, unit_id, payload, contributor, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, unit_id, payload, contributor, created_at",
        )
        .bind(AnnotationId::new().0)
        .bind(unit_id.0)
        .bind(&new.payload)
        .bind(new.contributor.as_deref())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE units SET annotation_count = annotation_count + 1, lease_expiry = NULL
             WHERE id = $1",
        )
        .bind(unit_id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row.into(), super::to_count(before)))
    }

    /// All annotations recorded against a unit, oldest first.
    pub async fn annotations_for(&self, unit_id: UnitId) -> Result<Vec<Annotation>> {
        let rows: Vec<AnnotationRow> = sqlx::query_as(
            "SELECT id, unit_id, payload, contributor, created_at
             FROM annotations WHERE unit_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(unit_id.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Annotation::from).collect())
    }
}
