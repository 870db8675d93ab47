use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ActivityInstance, InstanceState, MaterializationConfig};
use crate::repository::{SeriesRepository, SqliteRepository};

#[async_trait]
impl super::MaterializationRepository for SqliteRepository {
    async fn materialize_window(
        &self,
        facility_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        config: &MaterializationConfig,
    ) -> Result<usize, CoreError> {
        let mut created_total = 0;
        for series in self.find_series_for_facility(facility_id).await? {
            created_total += self
                .materialize_series_window(&series, window_start, window_end, config)
                .await?;
        }
        Ok(created_total)
    }
}

impl SqliteRepository {
    /// Create the missing series-generated rows for one series within the
    /// window. Occurrences with a recorded exception are suppressed;
    /// occurrence keys that already have a row (generated or overridden)
    /// are left alone, so an override is never regenerated or overwritten.
    async fn materialize_series_window(
        &self,
        series: &crate::models::ActivitySeries,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        config: &MaterializationConfig,
    ) -> Result<usize, CoreError> {
        let rule = series.rule()?;
        let occurrences = rule.occurrences_between(series.dtstart, window_start, window_end)?;
        if occurrences.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool().begin().await?;

        let exceptions: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"SELECT occurrence_at FROM series_exceptions
            WHERE series_id = $1 AND occurrence_at >= $2 AND occurrence_at < $3"#,
        )
        .bind(series.id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&mut *tx)
        .await?;
        let suppressed: HashSet<DateTime<Utc>> = exceptions.into_iter().map(|(dt,)| dt).collect();

        // Keyed on occurrence_key, not start_at: an override moved outside
        // the window still claims its original slot.
        let existing: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"SELECT occurrence_key FROM activity_instances
            WHERE facility_id = $1 AND series_id = $2 AND occurrence_key IS NOT NULL
              AND occurrence_key >= $3 AND occurrence_key < $4"#,
        )
        .bind(series.facility_id)
        .bind(series.id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&mut *tx)
        .await?;
        let materialized: HashSet<DateTime<Utc>> = existing.into_iter().map(|(dt,)| dt).collect();

        let duration = Duration::minutes(series.duration_minutes);
        let mut created = 0;
        for occurrence in occurrences {
            if suppressed.contains(&occurrence) || materialized.contains(&occurrence) {
                continue;
            }

            let now = Utc::now();
            let instance = ActivityInstance {
                id: Uuid::now_v7(),
                facility_id: series.facility_id,
                series_id: Some(series.id),
                occurrence_key: Some(occurrence),
                state: InstanceState::SeriesGenerated,
                title: series.title.clone(),
                start_at: occurrence,
                end_at: occurrence + duration,
                location: series.location.clone(),
                checklist: series.checklist.clone(),
                adaptations: series.adaptations.clone(),
                conflict_override: false,
                created_at: now,
                updated_at: now,
            };
            Self::insert_instance_in_transaction(&mut tx, &instance).await?;

            created += 1;
            if created >= config.max_batch_size {
                break;
            }
        }

        tx.commit().await?;
        Ok(created)
    }
}
