//! Lease grants: the select-and-claim statement.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Lease, UnitId};

/// Picks the eligible unit with the lowest count (random among ties) and
/// stamps its lease in one statement.
///
/// `FOR UPDATE SKIP LOCKED` makes a concurrent caller pass over a row that
/// another grant or commit is holding instead of queueing behind it. Under
/// READ COMMITTED, a row whose lease was granted and committed after our
/// snapshot fails the re-check on lock and is skipped as well, so the same
/// unit is never handed out twice while its lease is live.
const ACQUIRE_SQL: &str = "
UPDATE units
   SET lease_expiry = $2
 WHERE id = (
        SELECT id
          FROM units
         WHERE annotation_count < $3
           AND (lease_expiry IS NULL OR lease_expiry <= $1)
         ORDER BY annotation_count ASC, random()
         LIMIT 1
           FOR UPDATE SKIP LOCKED
       )
RETURNING id, reference_label, reference_text, annotation_count";

#[derive(sqlx::FromRow)]
struct GrantedRow {
    id: Uuid,
    reference_label: String,
    reference_text: Option<String>,
    annotation_count: i32,
}

impl super::Db {
    /// Grant a lease valid until `expires_at` on one eligible unit, judging
    /// expiry of existing leases against `now`. `None` when nothing is
    /// eligible.
    pub async fn grant_lease(
        &self,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        max_annotations: i32,
    ) -> Result<Option<Lease>> {
        let row: Option<GrantedRow> = sqlx::query_as(ACQUIRE_SQL)
            .bind(now)
            .bind(expires_at)
            .bind(max_annotations)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| Lease {
            unit_id: UnitId(row.id),
            reference_label: row.reference_label,
            reference_text: row.reference_text,
            annotation_count: super::to_count(row.annotation_count),
            expires_at,
        }))
    }
}
