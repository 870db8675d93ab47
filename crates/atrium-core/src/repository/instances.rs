use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

use crate::conflict::ActivitySummary;
use crate::error::CoreError;
use crate::models::ActivityInstance;
use crate::repository::SqliteRepository;

#[async_trait]
impl super::InstanceRepository for SqliteRepository {
    async fn insert_instance(&self, instance: &ActivityInstance) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::insert_instance_in_transaction(&mut tx, instance).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_instance(
        &self,
        facility_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ActivityInstance>, CoreError> {
        let instance = sqlx::query_as(
            "SELECT * FROM activity_instances WHERE facility_id = $1 AND id = $2",
        )
        .bind(facility_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(instance)
    }

    async fn update_instance_row(&self, instance: &ActivityInstance) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"UPDATE activity_instances
            SET state = $1, title = $2, start_at = $3, end_at = $4, location = $5,
                checklist = $6, adaptations = $7, conflict_override = $8, updated_at = $9
            WHERE facility_id = $10 AND id = $11"#,
        )
        .bind(instance.state)
        .bind(&instance.title)
        .bind(instance.start_at)
        .bind(instance.end_at)
        .bind(&instance.location)
        .bind(&instance.checklist)
        .bind(&instance.adaptations)
        .bind(instance.conflict_override)
        .bind(instance.updated_at)
        .bind(instance.facility_id)
        .bind(instance.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Activity {} not found",
                instance.id
            )));
        }
        Ok(())
    }

    async fn delete_instance_row(&self, facility_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let result =
            sqlx::query("DELETE FROM activity_instances WHERE facility_id = $1 AND id = $2")
                .bind(facility_id)
                .bind(id)
                .execute(self.pool())
                .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Activity {} not found", id)));
        }
        Ok(())
    }

    async fn delete_instance_with_exception(
        &self,
        facility_id: Uuid,
        id: Uuid,
        series_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        Self::add_exception_in_transaction(&mut tx, series_id, occurrence_at).await?;

        let result =
            sqlx::query("DELETE FROM activity_instances WHERE facility_id = $1 AND id = $2")
                .bind(facility_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Activity {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_overlapping(
        &self,
        facility_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        location: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ActivitySummary>, CoreError> {
        // Half-open overlap: touching boundaries do not collide.
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, start_at, end_at, location FROM activity_instances WHERE facility_id = ",
        );
        qb.push_bind(facility_id);
        qb.push(" AND start_at < ");
        qb.push_bind(end_at);
        qb.push(" AND end_at > ");
        qb.push_bind(start_at);
        if let Some(location) = location {
            qb.push(" AND location = ");
            qb.push_bind(location.to_string());
        }
        if let Some(exclude) = exclude {
            qb.push(" AND id != ");
            qb.push_bind(exclude);
        }
        qb.push(" ORDER BY start_at");

        let summaries = qb
            .build_query_as::<ActivitySummary>()
            .fetch_all(self.pool())
            .await?;
        Ok(summaries)
    }

    async fn list_window(
        &self,
        facility_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ActivityInstance>, CoreError> {
        let instances = sqlx::query_as(
            r#"SELECT * FROM activity_instances
            WHERE facility_id = $1 AND start_at >= $2 AND start_at < $3
            ORDER BY start_at"#,
        )
        .bind(facility_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(self.pool())
        .await?;
        Ok(instances)
    }
}

impl SqliteRepository {
    /// Insert an instance row within an existing transaction.
    pub(crate) async fn insert_instance_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        instance: &ActivityInstance,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO activity_instances
            (id, facility_id, series_id, occurrence_key, state, title, start_at, end_at,
             location, checklist, adaptations, conflict_override, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(instance.id)
        .bind(instance.facility_id)
        .bind(instance.series_id)
        .bind(instance.occurrence_key)
        .bind(instance.state)
        .bind(&instance.title)
        .bind(instance.start_at)
        .bind(instance.end_at)
        .bind(&instance.location)
        .bind(&instance.checklist)
        .bind(&instance.adaptations)
        .bind(instance.conflict_override)
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
