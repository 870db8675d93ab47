//! The scheduling orchestrator: composes recurrence expansion, conflict
//! detection, and the business-hours check over the repository, and owns
//! the instance state machine.

use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::conflict::ConflictReport;
use crate::error::CoreError;
use crate::hours::outside_business_hours;
use crate::models::{
    ActivityInstance, ActivityOutcome, ActivitySeries, DeleteOutcome, EditScope, InstanceState,
    MaterializationConfig, NewActivityData, NewSeriesData, OverridePolicy, SeriesCreation,
    UpdateActivityData,
};
use crate::repository::Repository;
use crate::settings::{FacilitySettings, SettingsProvider};
use crate::timezone::parse_timezone;

pub struct ScheduleService<R, S> {
    repo: R,
    settings: S,
    materialization: MaterializationConfig,
}

impl<R: Repository, S: SettingsProvider> ScheduleService<R, S> {
    pub fn new(repo: R, settings: S) -> Self {
        Self {
            repo,
            settings,
            materialization: MaterializationConfig::default(),
        }
    }

    pub fn with_materialization(mut self, config: MaterializationConfig) -> Self {
        self.materialization = config;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Create a standalone activity. Rejected with the structured report
    /// when warnings are present and the caller did not override; nothing
    /// is persisted on rejection.
    pub async fn create_standalone(
        &self,
        facility_id: Uuid,
        data: NewActivityData,
        policy: OverridePolicy,
    ) -> Result<ActivityOutcome, CoreError> {
        let title = required_title(&data.title)?;
        let start_at = data
            .start_at
            .ok_or_else(|| CoreError::Validation("start time is required".to_string()))?;
        let end_at = data
            .end_at
            .ok_or_else(|| CoreError::Validation("end time is required".to_string()))?;
        require_ordered(start_at, end_at)?;

        let settings = self.settings.settings_for(facility_id).await?;
        let report = self
            .assess_candidate(
                facility_id,
                start_at,
                end_at,
                data.location.as_deref(),
                None,
                &settings,
            )
            .await?;
        let override_exercised = enforce_overrides(&report, policy)?;

        let now = Utc::now();
        let instance = ActivityInstance {
            id: Uuid::now_v7(),
            facility_id,
            series_id: None,
            occurrence_key: None,
            state: InstanceState::Standalone,
            title,
            start_at,
            end_at,
            location: data.location,
            checklist: Json(data.checklist),
            adaptations: Json(data.adaptations),
            conflict_override: override_exercised,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_instance(&instance).await?;

        Ok(ActivityOutcome {
            activity: instance,
            report,
        })
    }

    /// Create a series and materialize its initial window atomically.
    /// Conflict and hours checks run per generated occurrence and
    /// aggregate into one report gating the whole creation.
    pub async fn create_series(
        &self,
        facility_id: Uuid,
        data: NewSeriesData,
        policy: OverridePolicy,
    ) -> Result<SeriesCreation, CoreError> {
        let title = required_title(&data.title)?;
        if data.duration_minutes < 1 {
            return Err(CoreError::Validation(
                "duration must be at least one minute".to_string(),
            ));
        }
        data.rule.validate()?;

        let window_end = data.dtstart + Duration::days(self.materialization.lookahead_days);
        let mut occurrences = data
            .rule
            .occurrences_between(data.dtstart, data.dtstart, window_end)?;
        if occurrences.is_empty() {
            // Sparse rules (long intervals, off-anchor weekday sets) may
            // have nothing inside the lookahead; seed with the first
            // occurrence of the next year instead of an empty series.
            occurrences = data.rule.occurrences_between(
                data.dtstart,
                data.dtstart,
                data.dtstart + Duration::days(366),
            )?;
            occurrences.truncate(1);
        }
        if occurrences.is_empty() {
            return Err(CoreError::Validation(
                "recurrence rule produces no occurrences".to_string(),
            ));
        }
        occurrences.truncate(self.materialization.max_batch_size);

        let settings = self.settings.settings_for(facility_id).await?;
        let duration = Duration::minutes(data.duration_minutes);
        let mut report = ConflictReport::default();
        for occurrence in &occurrences {
            let occurrence_report = self
                .assess_candidate(
                    facility_id,
                    *occurrence,
                    *occurrence + duration,
                    data.location.as_deref(),
                    None,
                    &settings,
                )
                .await?;
            report.merge(occurrence_report);
        }
        let override_exercised = enforce_overrides(&report, policy)?;

        let now = Utc::now();
        let series = ActivitySeries {
            id: Uuid::now_v7(),
            facility_id,
            title,
            location: data.location,
            template_id: data.template_id,
            dtstart: data.dtstart,
            duration_minutes: data.duration_minutes,
            rrule: data.rule.to_storage_string(),
            timezone: data.rule.timezone.clone(),
            checklist: Json(data.checklist),
            adaptations: Json(data.adaptations),
            created_at: now,
            updated_at: now,
        };

        let instances: Vec<ActivityInstance> = occurrences
            .iter()
            .map(|occurrence| ActivityInstance {
                id: Uuid::now_v7(),
                facility_id,
                series_id: Some(series.id),
                occurrence_key: Some(*occurrence),
                state: InstanceState::SeriesGenerated,
                title: series.title.clone(),
                start_at: *occurrence,
                end_at: *occurrence + duration,
                location: series.location.clone(),
                checklist: series.checklist.clone(),
                adaptations: series.adaptations.clone(),
                conflict_override: override_exercised,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.repo
            .create_series_with_instances(&series, &instances)
            .await?;

        Ok(SeriesCreation {
            series,
            materialized: instances.len(),
            report,
        })
    }

    /// Patch one instance. Editing a series-generated row detaches it into
    /// an override; the transition is one-way and never reverts.
    pub async fn update_instance(
        &self,
        facility_id: Uuid,
        id: Uuid,
        patch: UpdateActivityData,
        scope: EditScope,
        policy: OverridePolicy,
    ) -> Result<ActivityOutcome, CoreError> {
        if scope == EditScope::Series {
            return Err(CoreError::Validation(
                "series-wide edits are not supported on an instance; use the series surface"
                    .to_string(),
            ));
        }

        let instance = self
            .repo
            .find_instance(facility_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Activity {} not found", id)))?;

        let mut updated = instance.clone();
        if let Some(title) = patch.title {
            updated.title = required_title(&title)?;
        }
        if let Some(start_at) = patch.start_at {
            updated.start_at = start_at;
        }
        if let Some(end_at) = patch.end_at {
            updated.end_at = end_at;
        }
        if let Some(location) = patch.location {
            updated.location = location;
        }
        if let Some(checklist) = patch.checklist {
            updated.checklist = Json(checklist);
        }
        if let Some(adaptations) = patch.adaptations {
            updated.adaptations = Json(adaptations);
        }
        require_ordered(updated.start_at, updated.end_at)?;

        let settings = self.settings.settings_for(facility_id).await?;
        let report = self
            .assess_candidate(
                facility_id,
                updated.start_at,
                updated.end_at,
                updated.location.as_deref(),
                Some(id),
                &settings,
            )
            .await?;
        let override_exercised = enforce_overrides(&report, policy)?;

        if updated.state == InstanceState::SeriesGenerated {
            updated.state = InstanceState::SeriesOverride;
        }
        updated.conflict_override |= override_exercised;
        updated.updated_at = Utc::now();

        self.repo.update_instance_row(&updated).await?;

        Ok(ActivityOutcome {
            activity: updated,
            report,
        })
    }

    /// Delete one instance. A still-attached series row converts to an
    /// exception so the slot never regenerates; overrides and standalone
    /// rows just disappear, since they sit outside the series' default
    /// generation.
    pub async fn delete_instance(
        &self,
        facility_id: Uuid,
        id: Uuid,
    ) -> Result<DeleteOutcome, CoreError> {
        let instance = self
            .repo
            .find_instance(facility_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Activity {} not found", id)))?;

        match (instance.is_series_generated(), instance.series_id, instance.occurrence_key) {
            (true, Some(series_id), Some(occurrence_at)) => {
                self.repo
                    .delete_instance_with_exception(facility_id, id, series_id, occurrence_at)
                    .await?;
                Ok(DeleteOutcome {
                    id,
                    skipped_series_occurrence: true,
                })
            }
            _ => {
                self.repo.delete_instance_row(facility_id, id).await?;
                Ok(DeleteOutcome {
                    id,
                    skipped_series_occurrence: false,
                })
            }
        }
    }

    /// List the facility's activities in a window, lazily topping up
    /// series materialization first.
    pub async fn list_window(
        &self,
        facility_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ActivityInstance>, CoreError> {
        require_ordered(window_start, window_end)?;
        self.repo
            .materialize_window(facility_id, window_start, window_end, &self.materialization)
            .await?;
        self.repo
            .list_window(facility_id, window_start, window_end)
            .await
    }

    /// Read-then-decide with no serializing lock: two concurrent creates
    /// can both pass this check and commit overlapping rows. Conflict
    /// detection is advisory; it reports, it does not lock.
    async fn assess_candidate(
        &self,
        facility_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        location: Option<&str>,
        exclude: Option<Uuid>,
        settings: &FacilitySettings,
    ) -> Result<ConflictReport, CoreError> {
        let mut report = ConflictReport::default();
        if settings.warn_activity_overlap {
            report.conflicts = self
                .repo
                .find_overlapping(facility_id, start_at, end_at, location, exclude)
                .await?;
        }
        if settings.warn_outside_business_hours {
            let tz = parse_timezone(&settings.timezone)?;
            report.outside_business_hours =
                outside_business_hours(start_at, end_at, &tz, &settings.business_hours);
        }
        Ok(report)
    }
}

fn required_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn require_ordered(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), CoreError> {
    if end_at <= start_at {
        return Err(CoreError::Validation(
            "end time must be after start time".to_string(),
        ));
    }
    Ok(())
}

/// Apply the caller's override flags to a computed report. Returns whether
/// an override was actually exercised, for the audit flag on the row.
fn enforce_overrides(
    report: &ConflictReport,
    policy: OverridePolicy,
) -> Result<bool, CoreError> {
    if !report.conflicts.is_empty() && !policy.allow_conflicts {
        return Err(CoreError::Conflict(Box::new(report.clone())));
    }
    if report.outside_business_hours && !policy.allow_outside_hours {
        return Err(CoreError::Conflict(Box::new(report.clone())));
    }
    Ok(!report.is_clear())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ActivitySummary;
    use chrono::TimeZone;

    fn summary() -> ActivitySummary {
        ActivitySummary {
            id: Uuid::now_v7(),
            title: "Morning stretch".to_string(),
            start_at: Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
            end_at: Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap(),
            location: None,
        }
    }

    #[test]
    fn test_overrides_reject_without_flags() {
        let report = ConflictReport {
            conflicts: vec![summary()],
            outside_business_hours: false,
        };
        let err = enforce_overrides(&report, OverridePolicy::default()).unwrap_err();
        assert!(err.conflict_report().is_some());
    }

    #[test]
    fn test_overrides_each_flag_gates_its_own_warning() {
        let conflicted = ConflictReport {
            conflicts: vec![summary()],
            outside_business_hours: false,
        };
        let accepted = enforce_overrides(
            &conflicted,
            OverridePolicy {
                allow_conflicts: true,
                allow_outside_hours: false,
            },
        )
        .unwrap();
        assert!(accepted);

        let after_hours = ConflictReport {
            conflicts: vec![],
            outside_business_hours: true,
        };
        assert!(enforce_overrides(
            &after_hours,
            OverridePolicy {
                allow_conflicts: true,
                allow_outside_hours: false,
            },
        )
        .is_err());
    }

    #[test]
    fn test_clear_report_exercises_no_override() {
        let clear = ConflictReport::default();
        let exercised = enforce_overrides(
            &clear,
            OverridePolicy {
                allow_conflicts: true,
                allow_outside_hours: true,
            },
        )
        .unwrap();
        assert!(!exercised);
    }

    #[test]
    fn test_required_title() {
        assert!(required_title("  ").is_err());
        assert_eq!(required_title(" Bingo ").unwrap(), "Bingo");
    }
}
