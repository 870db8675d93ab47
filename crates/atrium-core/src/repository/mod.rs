use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::conflict::ActivitySummary;
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{ActivityInstance, ActivitySeries, MaterializationConfig};

pub mod exceptions;
pub mod instances;
pub mod materialization;
pub mod series;

/// Series persistence. Creation is atomic with its initial materialized
/// instances: a partial failure leaves zero rows.
#[async_trait]
pub trait SeriesRepository {
    async fn create_series_with_instances(
        &self,
        series: &ActivitySeries,
        instances: &[ActivityInstance],
    ) -> Result<(), CoreError>;
    async fn find_series(
        &self,
        facility_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ActivitySeries>, CoreError>;
    async fn find_series_for_facility(
        &self,
        facility_id: Uuid,
    ) -> Result<Vec<ActivitySeries>, CoreError>;
}

/// Instance persistence and the overlap query behind conflict detection.
#[async_trait]
pub trait InstanceRepository {
    async fn insert_instance(&self, instance: &ActivityInstance) -> Result<(), CoreError>;
    async fn find_instance(
        &self,
        facility_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ActivityInstance>, CoreError>;
    async fn update_instance_row(&self, instance: &ActivityInstance) -> Result<(), CoreError>;
    async fn delete_instance_row(&self, facility_id: Uuid, id: Uuid) -> Result<(), CoreError>;
    /// Delete a still-attached series row and record its exception in one
    /// transaction, so the slot can never regenerate.
    async fn delete_instance_with_exception(
        &self,
        facility_id: Uuid,
        id: Uuid,
        series_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> Result<(), CoreError>;
    /// Existing bookings overlapping the half-open candidate range,
    /// ascending by start. `location` narrows to an exact match;
    /// `exclude` omits the row being updated from its own check.
    async fn find_overlapping(
        &self,
        facility_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        location: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ActivitySummary>, CoreError>;
    async fn list_window(
        &self,
        facility_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ActivityInstance>, CoreError>;
}

/// Exception persistence (the exdate list per series).
#[async_trait]
pub trait ExceptionRepository {
    async fn add_exception(
        &self,
        series_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> Result<(), CoreError>;
    async fn list_exceptions(
        &self,
        series_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError>;
}

/// Lazy materialization of series occurrences into instance rows.
#[async_trait]
pub trait MaterializationRepository {
    /// Top up missing series-generated instances for every series of the
    /// facility within the window. Idempotent; returns rows created.
    async fn materialize_window(
        &self,
        facility_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        config: &MaterializationConfig,
    ) -> Result<usize, CoreError>;
}

/// Main repository trait composing all persistence domains.
pub trait Repository:
    SeriesRepository
    + InstanceRepository
    + ExceptionRepository
    + MaterializationRepository
    + Send
    + Sync
{
}

/// SQLite implementation of the repository pattern.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
