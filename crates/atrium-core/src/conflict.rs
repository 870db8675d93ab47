use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Half-open interval overlap. Two blocks that touch exactly at a boundary
/// (`end == start`) do not overlap.
pub fn overlaps(
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    existing_start: DateTime<Utc>,
    existing_end: DateTime<Utc>,
) -> bool {
    candidate_start < existing_end && candidate_end > existing_start
}

/// Condensed view of an existing activity returned in conflict reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivitySummary {
    pub id: Uuid,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: Option<String>,
}

/// Transient result of validating a candidate time block. Never persisted:
/// either attached to a `CoreError::Conflict` rejection or returned as
/// advisory metadata on acceptance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Overlapping existing activities, ascending by start time.
    pub conflicts: Vec<ActivitySummary>,
    pub outside_business_hours: bool,
}

impl ConflictReport {
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty() && !self.outside_business_hours
    }

    /// Fold another report in, deduplicating conflicts by activity id and
    /// keeping the combined list ordered by start time.
    pub fn merge(&mut self, other: ConflictReport) {
        self.outside_business_hours |= other.outside_business_hours;
        for summary in other.conflicts {
            if !self.conflicts.iter().any(|c| c.id == summary.id) {
                self.conflicts.push(summary);
            }
        }
        self.conflicts.sort_by_key(|c| c.start_at);
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} overlapping activities", self.conflicts.len())?;
        if self.outside_business_hours {
            write!(f, ", outside business hours")?;
        }
        Ok(())
    }
}
