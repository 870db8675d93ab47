use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::conflict::ConflictReport;
use crate::recurrence::RecurrenceRule;

/// One checklist entry on an activity (setup steps, supplies, sign-offs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub done: bool,
}

/// A single adaptation toggle with optional facility-specific wording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptationFlag {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_text: Option<String>,
}

/// Resident-adaptation flags carried by activities. Stored as a typed JSON
/// column rather than a loose blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adaptations {
    #[serde(default)]
    pub bed_bound: AdaptationFlag,
    #[serde(default)]
    pub dementia_friendly: AdaptationFlag,
    #[serde(default)]
    pub low_vision_hearing: AdaptationFlag,
    #[serde(default)]
    pub one_to_one_mini: AdaptationFlag,
    /// Free-text overrides keyed by adaptation name.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

/// Lifecycle tag for an activity instance.
///
/// `SeriesGenerated` rows were materialized from a series and are still
/// attached to it; editing one detaches it into `SeriesOverride`, a one-way
/// transition. `Standalone` rows never had a series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    SeriesGenerated,
    SeriesOverride,
    Standalone,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::SeriesGenerated => write!(f, "series_generated"),
            InstanceState::SeriesOverride => write!(f, "series_override"),
            InstanceState::Standalone => write!(f, "standalone"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid instance state: {0}")]
pub struct ParseInstanceStateError(String);

impl FromStr for InstanceState {
    type Err = ParseInstanceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "series_generated" => Ok(InstanceState::SeriesGenerated),
            "series_override" => Ok(InstanceState::SeriesOverride),
            "standalone" => Ok(InstanceState::Standalone),
            _ => Err(ParseInstanceStateError(s.to_string())),
        }
    }
}

/// A recurring activity definition owned by one facility.
///
/// `dtstart` and `timezone` anchor all occurrence arithmetic and are never
/// recomputed from materialized instances.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivitySeries {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub title: String,
    pub location: Option<String>,
    pub template_id: Option<Uuid>,
    /// Absolute instant of the first occurrence start.
    pub dtstart: DateTime<Utc>,
    pub duration_minutes: i64,
    /// Compact rule text (`FREQ=…;INTERVAL=…[;BYDAY=…][;COUNT=…][;UNTIL=…]`).
    pub rrule: String,
    /// IANA timezone for the rule.
    pub timezone: String,
    pub checklist: Json<Vec<ChecklistItem>>,
    pub adaptations: Json<Adaptations>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivitySeries {
    pub fn rule(&self) -> Result<RecurrenceRule, crate::error::CoreError> {
        RecurrenceRule::parse(&self.rrule, &self.timezone)
    }
}

/// One concrete bookable time block.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityInstance {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub series_id: Option<Uuid>,
    /// The canonical instant the series expansion computed for this slot.
    /// Correlates instance to series and keys exception records; retained
    /// across the override transition.
    pub occurrence_key: Option<DateTime<Utc>>,
    pub state: InstanceState,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: Option<String>,
    pub checklist: Json<Vec<ChecklistItem>>,
    pub adaptations: Json<Adaptations>,
    /// Audit record that the creator explicitly accepted a reported
    /// conflict or outside-hours warning.
    pub conflict_override: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityInstance {
    /// Whether this row is still attached to its series' default
    /// generation (and must convert to an exception on delete).
    pub fn is_series_generated(&self) -> bool {
        self.state == InstanceState::SeriesGenerated
    }
}

/// A suppressed occurrence: any occurrence whose computed start equals a
/// recorded exception is excluded from all future materialization and
/// listing for its series.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeriesException {
    pub series_id: Uuid,
    pub occurrence_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request and patch DTOs
// ============================================================================

/// Candidate payload for a standalone activity.
#[derive(Debug, Clone, Default)]
pub struct NewActivityData {
    pub title: String,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub template_id: Option<Uuid>,
    pub checklist: Vec<ChecklistItem>,
    pub adaptations: Adaptations,
}

/// Candidate payload for a recurring series.
#[derive(Debug, Clone)]
pub struct NewSeriesData {
    pub title: String,
    pub dtstart: DateTime<Utc>,
    pub duration_minutes: i64,
    pub rule: RecurrenceRule,
    pub location: Option<String>,
    pub template_id: Option<Uuid>,
    pub checklist: Vec<ChecklistItem>,
    pub adaptations: Adaptations,
}

/// Patch for a single instance. `None` leaves a field untouched; the inner
/// `Option` on `location` distinguishes clearing from skipping.
#[derive(Debug, Clone, Default)]
pub struct UpdateActivityData {
    pub title: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub adaptations: Option<Adaptations>,
}

/// Caller-supplied acceptance of advisory warnings. Conflict detection
/// reports and these flags decide; nothing ever hard-blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverridePolicy {
    pub allow_conflicts: bool,
    pub allow_outside_hours: bool,
}

/// Scope of an edit request. Only `Instance` is handled by this engine;
/// series-wide edits belong to a different surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    Instance,
    Series,
}

impl std::fmt::Display for EditScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditScope::Instance => write!(f, "instance"),
            EditScope::Series => write!(f, "series"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instance" | "occurrence" | "this" => Ok(EditScope::Instance),
            "series" | "all" => Ok(EditScope::Series),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

// ============================================================================
// Operation outcomes
// ============================================================================

/// Result of creating or updating one instance. The report is advisory
/// metadata: non-empty only when the caller overrode the warnings.
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub activity: ActivityInstance,
    pub report: ConflictReport,
}

/// Result of creating a series with its initial materialized window.
#[derive(Debug, Clone)]
pub struct SeriesCreation {
    pub series: ActivitySeries,
    pub materialized: usize,
    pub report: ConflictReport,
}

/// Result of deleting an instance.
#[derive(Debug, Clone, Copy)]
pub struct DeleteOutcome {
    pub id: Uuid,
    /// True when the row was still series-generated and its slot was
    /// converted to a `SeriesException`.
    pub skipped_series_occurrence: bool,
}

/// Materialization policy for series instances.
#[derive(Debug, Clone)]
pub struct MaterializationConfig {
    /// Width of the initial window materialized at series creation, and of
    /// the lazy top-up window on listing, in days.
    pub lookahead_days: i64,
    /// Limit on instances created per series in one materialization pass.
    pub max_batch_size: usize,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            max_batch_size: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_state_round_trip() {
        for state in [
            InstanceState::SeriesGenerated,
            InstanceState::SeriesOverride,
            InstanceState::Standalone,
        ] {
            assert_eq!(state.to_string().parse::<InstanceState>().unwrap(), state);
        }
        assert!("generated".parse::<InstanceState>().is_err());
    }

    #[test]
    fn test_edit_scope_parsing() {
        assert_eq!("instance".parse::<EditScope>().unwrap(), EditScope::Instance);
        assert_eq!("series".parse::<EditScope>().unwrap(), EditScope::Series);
        assert!("everything".parse::<EditScope>().is_err());
    }

    #[test]
    fn test_adaptations_json_shape() {
        let mut adaptations = Adaptations::default();
        adaptations.bed_bound.enabled = true;
        adaptations.bed_bound.override_text = Some("seated variant".to_string());
        adaptations
            .overrides
            .insert("music".to_string(), "lower volume".to_string());

        let json = serde_json::to_value(&adaptations).unwrap();
        assert_eq!(json["bed_bound"]["enabled"], true);
        assert_eq!(json["bed_bound"]["override_text"], "seated variant");
        assert_eq!(json["overrides"]["music"], "lower volume");

        let back: Adaptations = serde_json::from_value(json).unwrap();
        assert_eq!(back, adaptations);
    }
}
