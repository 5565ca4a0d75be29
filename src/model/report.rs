//! Read-only reporting over the catalogue.

use serde::{Deserialize, Serialize};

/// Dataset progress at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total_units: u64,
    pub total_annotations: u64,
    /// Units at or past the annotation target.
    pub exhausted_units: u64,
    /// Units with a live lease.
    pub leased_units: u64,
    pub untouched_units: u64,
}

impl Progress {
    /// Fraction of units that reached the target, in `[0, 1]`.
    pub fn completion(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        self.exhausted_units as f64 / self.total_units as f64
    }
}

/// Time window for the contributor leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Range {
    #[default]
    All,
    /// Since the start of the current ISO week.
    Week,
    /// Since the start of the current month.
    Month,
}

impl Range {
    /// Postgres `date_trunc` field, `None` for all-time.
    pub(crate) fn trunc_field(self) -> Option<&'static str> {
        match self {
            Range::All => None,
            Range::Week => Some("week"),
            Range::Month => Some("month"),
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Range::All => "all",
            Range::Week => "week",
            Range::Month => "month",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Range {
    type Err = crate::error::Error;

    /// Unknown values fall back to all-time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "week" => Range::Week,
            "month" => Range::Month,
            _ => Range::All,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub contributor: String,
    pub count: u64,
}
