use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::error::CoreError;
use crate::repository::SqliteRepository;

#[async_trait]
impl super::ExceptionRepository for SqliteRepository {
    async fn add_exception(
        &self,
        series_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::add_exception_in_transaction(&mut tx, series_id, occurrence_at).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_exceptions(
        &self,
        series_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"SELECT occurrence_at FROM series_exceptions
            WHERE series_id = $1 AND occurrence_at >= $2 AND occurrence_at < $3
            ORDER BY occurrence_at"#,
        )
        .bind(series_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(dt,)| dt).collect())
    }
}

impl SqliteRepository {
    /// Exceptions are additive and never removed automatically; the insert
    /// is idempotent so a re-delete of the same slot cannot fail.
    pub(crate) async fn add_exception_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        series_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT OR IGNORE INTO series_exceptions (series_id, occurrence_at, created_at)
            VALUES ($1, $2, $3)"#,
        )
        .bind(series_id)
        .bind(occurrence_at)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
