use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ActivityInstance, ActivitySeries};
use crate::repository::SqliteRepository;

#[async_trait]
impl super::SeriesRepository for SqliteRepository {
    async fn create_series_with_instances(
        &self,
        series: &ActivitySeries,
        instances: &[ActivityInstance],
    ) -> Result<(), CoreError> {
        // Series plus initial window commit together: a failure anywhere
        // leaves no orphaned series and no dangling instances.
        let mut tx = self.pool().begin().await?;

        Self::insert_series_in_transaction(&mut tx, series).await?;
        for instance in instances {
            Self::insert_instance_in_transaction(&mut tx, instance).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_series(
        &self,
        facility_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ActivitySeries>, CoreError> {
        let series =
            sqlx::query_as("SELECT * FROM activity_series WHERE facility_id = $1 AND id = $2")
                .bind(facility_id)
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(series)
    }

    async fn find_series_for_facility(
        &self,
        facility_id: Uuid,
    ) -> Result<Vec<ActivitySeries>, CoreError> {
        let series = sqlx::query_as(
            "SELECT * FROM activity_series WHERE facility_id = $1 ORDER BY created_at",
        )
        .bind(facility_id)
        .fetch_all(self.pool())
        .await?;
        Ok(series)
    }
}

impl SqliteRepository {
    pub(crate) async fn insert_series_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        series: &ActivitySeries,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO activity_series
            (id, facility_id, title, location, template_id, dtstart, duration_minutes,
             rrule, timezone, checklist, adaptations, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(series.id)
        .bind(series.facility_id)
        .bind(&series.title)
        .bind(&series.location)
        .bind(series.template_id)
        .bind(series.dtstart)
        .bind(series.duration_minutes)
        .bind(&series.rrule)
        .bind(&series.timezone)
        .bind(&series.checklist)
        .bind(&series.adaptations)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
