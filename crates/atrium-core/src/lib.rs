//! # Atrium Core Library
//!
//! A recurring activity scheduling engine for facility operations, with
//! advisory conflict detection, business-hours validation, and exception
//! tracking for edited or cancelled occurrences.
//!
//! ## Features
//!
//! - **Series-Based Recurrence**: Daily, weekly, and monthly rules with
//!   intervals, weekday sets, and COUNT/UNTIL bounds, expanded in the
//!   series' IANA timezone with DST-aware wall-clock preservation
//! - **Advisory Conflict Detection**: Overlap and business-hours warnings
//!   that the scheduler can accept explicitly, with an audit flag on the
//!   stored activity
//! - **Exception Tracking**: Deleting or editing one occurrence never
//!   regenerates it, while the rest of the series keeps materializing
//! - **Facility Isolation**: Every query is scoped to a single facility
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: Recurrence rule parsing and expansion
//! - [`conflict`]: Overlap predicate and conflict reports
//! - [`hours`]: Business-hours policy and validation
//! - [`service`]: The scheduling orchestrator
//! - [`settings`]: Per-facility scheduling settings
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Comprehensive error types with context
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use atrium_core::{
//!     db,
//!     models::{NewActivityData, OverridePolicy},
//!     repository::SqliteRepository,
//!     service::ScheduleService,
//!     settings::StaticSettingsProvider,
//! };
//! use chrono::{TimeZone, Utc};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("atrium.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!     let service = ScheduleService::new(repo, StaticSettingsProvider::default());
//!
//!     let facility_id = Uuid::now_v7();
//!     let data = NewActivityData {
//!         title: "Morning stretch".to_string(),
//!         start_at: Some(Utc.with_ymd_and_hms(2024, 1, 8, 14, 0, 0).unwrap()),
//!         end_at: Some(Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap()),
//!         ..Default::default()
//!     };
//!     let outcome = service
//!         .create_standalone(facility_id, data, OverridePolicy::default())
//!         .await?;
//!     println!("Created activity: {}", outcome.activity.title);
//!
//!     Ok(())
//! }
//! ```

pub mod conflict;
pub mod db;
pub mod error;
pub mod hours;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod service;
pub mod settings;
pub mod timezone;
