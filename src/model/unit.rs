//! Catalogue units and the leases granted on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::uuid_id;

/// Identifier of a unit in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

uuid_id!(UnitId);

/// One assignable clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,

    /// Key of the clip in the external content store. Unique.
    pub reference_label: String,

    /// Machine transcript imported alongside the label, if any.
    pub reference_text: Option<String>,

    /// Completed annotations so far. Only the annotation recorder bumps this.
    pub annotation_count: u32,

    /// `None` when unleased. A past value is an expired lease that nobody
    /// has reclaimed yet.
    pub lease_expiry: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Unit {
    /// Whether `acquire` at `now` would consider this unit.
    pub fn is_eligible(&self, now: DateTime<Utc>, max_annotations: u32) -> bool {
        self.annotation_count < max_annotations && !self.is_leased(now)
    }

    /// Whether a lease on this unit is still live at `now`.
    pub fn is_leased(&self, now: DateTime<Utc>) -> bool {
        self.lease_expiry.is_some_and(|expiry| expiry > now)
    }
}

/// A granted lease: what the requester needs to go and work the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub unit_id: UnitId,
    pub reference_label: String,
    pub reference_text: Option<String>,
    /// Count at grant time.
    pub annotation_count: u32,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn unit(count: u32, lease_expiry: Option<DateTime<Utc>>) -> Unit {
        Unit {
            id: UnitId::new(),
            reference_label: "clip.wav".to_string(),
            reference_text: None,
            annotation_count: count,
            lease_expiry,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unleased_unit_below_target_is_eligible() {
        assert!(unit(1, None).is_eligible(Utc::now(), 2));
    }

    #[test]
    fn unit_at_target_is_not_eligible() {
        assert!(!unit(2, None).is_eligible(Utc::now(), 2));
    }

    #[test]
    fn live_lease_blocks_and_expired_lease_does_not() {
        let now = Utc::now();
        assert!(!unit(0, Some(now + Duration::minutes(1))).is_eligible(now, 2));
        assert!(unit(0, Some(now - Duration::minutes(1))).is_eligible(now, 2));
        // expiry instant itself counts as expired
        assert!(unit(0, Some(now)).is_eligible(now, 2));
    }

    #[test]
    fn unit_id_parses_from_display() {
        let id = UnitId::new();
        let parsed: UnitId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
