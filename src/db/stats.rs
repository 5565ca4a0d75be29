//! Read-only reporting queries.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{LeaderboardEntry, Progress, Range};

#[derive(sqlx::FromRow)]
struct ProgressRow {
    total_units: i64,
    total_annotations: i64,
    exhausted_units: i64,
    leased_units: i64,
    untouched_units: i64,
}

impl super::Db {
    /// Catalogue totals as of `now`.
    pub async fn progress(&self, now: DateTime<Utc>, max_annotations: i32) -> Result<Progress> {
        let row: ProgressRow = sqlx::query_as(
            "SELECT count(*) AS total_units,
                    (SELECT count(*) FROM annotations) AS total_annotations,
                    count(*) FILTER (WHERE annotation_count >= $2) AS exhausted_units,
                    count(*) FILTER (WHERE lease_expiry > $1) AS leased_units,
                    count(*) FILTER (WHERE annotation_count = 0) AS untouched_units
             FROM units",
        )
        .bind(now)
        .bind(max_annotations)
        .fetch_one(self.pool())
        .await?;

        Ok(Progress {
            total_units: super::to_total(row.total_units),
            total_annotations: super::to_total(row.total_annotations),
            exhausted_units: super::to_total(row.exhausted_units),
            leased_units: super::to_total(row.leased_units),
            untouched_units: super::to_total(row.untouched_units),
        })
    }

    /// Attributed annotations per contributor within `range` of `now`,
    /// highest count first, ties by name.
    pub async fn leaderboard(
        &self,
        range: Range,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT contributor, count(*) AS count
             FROM annotations
             WHERE contributor IS NOT NULL
               AND ($1::text IS NULL OR created_at >= date_trunc($1, $2::timestamptz))
             GROUP BY contributor
             ORDER BY count DESC, contributor ASC",
        )
        .bind(range.trunc_field())
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(contributor, count)| LeaderboardEntry {
                contributor,
                count: super::to_total(count),
            })
            .collect())
    }
}
