//! Unit inserts and catalogue reads.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Unit, UnitId};

const UNIT_COLUMNS: &str =
    "id, reference_label, reference_text, annotation_count, lease_expiry, created_at";

#[derive(sqlx::FromRow)]
struct UnitRow {
    id: Uuid,
    reference_label: String,
    reference_text: Option<String>,
    annotation_count: i32,
    lease_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Self {
            id: UnitId(row.id),
            reference_label: row.reference_label,
            reference_text: row.reference_text,
            annotation_count: super::to_count(row.annotation_count),
            lease_expiry: row.lease_expiry,
            created_at: row.created_at,
        }
    }
}

impl super::Db {
    /// Insert a fresh unit (count 0, unleased). Returns `None` when a unit
    /// with that label already exists.
    ///
    /// Runs as its own statement so one failing row never takes a batch down
    /// with it.
    pub async fn insert_unit(
        &self,
        label: &str,
        reference_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<UnitId>> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO units (id, reference_label, reference_text, annotation_count, lease_expiry, created_at)
             VALUES ($1, $2, $3, 0, NULL, $4)
             ON CONFLICT (reference_label) DO NOTHING
             RETURNING id",
        )
        .bind(UnitId::new().0)
        .bind(label)
        .bind(reference_text)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(inserted.map(|(id,)| UnitId(id)))
    }

    /// Every label in the catalogue.
    pub async fn catalogue_labels(&self) -> Result<BTreeSet<String>> {
        let labels: Vec<String> = sqlx::query_scalar("SELECT reference_label FROM units")
            .fetch_all(self.pool())
            .await?;
        Ok(labels.into_iter().collect())
    }

    /// Get a unit by ID.
    pub async fn get_unit(&self, id: UnitId) -> Result<Unit> {
        let row: Option<UnitRow> =
            sqlx::query_as(&format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(self.pool())
                .await?;

        row.map(Unit::from)
            .ok_or_else(|| Error::NotFound(format!("unit {id}")))
    }

    /// Whole catalogue in import order.
    pub async fn list_units(&self) -> Result<Vec<Unit>> {
        let rows: Vec<UnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM units ORDER BY created_at ASC, reference_label ASC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Unit::from).collect())
    }

    /// Units still below the target, fewest annotations first. Ignores leases.
    pub async fn backlog(&self, max_annotations: i32, limit: i64) -> Result<Vec<Unit>> {
        let rows: Vec<UnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM units
             WHERE annotation_count < $1
             ORDER BY annotation_count ASC, reference_label ASC
             LIMIT $2"
        ))
        .bind(max_annotations)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Unit::from).collect())
    }
}
