use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use uuid::Uuid;

use atrium_core::error::CoreError;
use atrium_core::hours::BusinessHoursPolicy;
use atrium_core::models::MaterializationConfig;
use atrium_core::settings::{days_from_sunday_indices, FacilitySettings};
use atrium_core::timezone::parse_timezone;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database: String,
    /// The facility this CLI operates on. Every engine call is scoped to it.
    pub facility_id: Uuid,
    #[serde(rename = "scheduling")]
    pub scheduling: SchedulingConfig,
    #[serde(rename = "materialization")]
    pub materialization: MaterializationSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "atrium.db".to_string(),
            facility_id: Uuid::nil(),
            scheduling: SchedulingConfig::default(),
            materialization: MaterializationSection::default(),
        }
    }
}

/// The CLI's stand-in for the facility-settings service: scheduling policy
/// read from `atrium.toml` / environment and handed to the engine as
/// static settings.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct SchedulingConfig {
    /// IANA timezone for business-hours evaluation and new series.
    pub timezone: String,
    pub warn_activity_overlap: bool,
    pub warn_outside_business_hours: bool,
    /// Allowed days as Sunday-first indices (0 = Sunday).
    pub business_days: Vec<u8>,
    pub opens_at: String,
    pub closes_at: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: detect_system_timezone(),
            warn_activity_overlap: true,
            warn_outside_business_hours: true,
            business_days: vec![1, 2, 3, 4, 5],
            opens_at: "08:00".to_string(),
            closes_at: "17:00".to_string(),
        }
    }
}

impl SchedulingConfig {
    pub fn to_settings(&self) -> Result<FacilitySettings, CoreError> {
        parse_timezone(&self.timezone)?;
        Ok(FacilitySettings {
            timezone: self.timezone.clone(),
            warn_activity_overlap: self.warn_activity_overlap,
            warn_outside_business_hours: self.warn_outside_business_hours,
            business_hours: BusinessHoursPolicy::new(
                days_from_sunday_indices(&self.business_days)?,
                &self.opens_at,
                &self.closes_at,
            )?,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct MaterializationSection {
    pub lookahead_days: i64,
    pub max_batch_size: usize,
}

impl Default for MaterializationSection {
    fn default() -> Self {
        let defaults = MaterializationConfig::default();
        Self {
            lookahead_days: defaults.lookahead_days,
            max_batch_size: defaults.max_batch_size,
        }
    }
}

impl From<&MaterializationSection> for MaterializationConfig {
    fn from(section: &MaterializationSection) -> Self {
        Self {
            lookahead_days: section.lookahead_days,
            max_batch_size: section.max_batch_size,
        }
    }
}

impl Config {
    /// `atrium.toml` in the working directory, overridden by `ATRIUM_`
    /// environment variables (`__` separates nested keys).
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("atrium.toml"))
            .merge(Env::prefixed("ATRIUM_").split("__"))
            .extract()
    }
}

/// Detects the system timezone, falling back to UTC if detection fails.
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if parse_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if parse_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}
