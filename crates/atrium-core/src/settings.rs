use async_trait::async_trait;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::CoreError;
use crate::hours::BusinessHoursPolicy;

/// Per-facility scheduling policy, resolved by an external settings
/// collaborator and injected into the service. Both warn flags gate
/// checks that only ever warn; nothing here hard-blocks a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySettings {
    /// IANA timezone used for business-hours evaluation.
    pub timezone: String,
    pub warn_activity_overlap: bool,
    pub warn_outside_business_hours: bool,
    pub business_hours: BusinessHoursPolicy,
}

impl Default for FacilitySettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            warn_activity_overlap: true,
            warn_outside_business_hours: true,
            business_hours: BusinessHoursPolicy::default(),
        }
    }
}

/// Seam to the facility-settings collaborator. Passed into
/// `ScheduleService` explicitly so tests can inject policy fixtures.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn settings_for(&self, facility_id: Uuid) -> Result<FacilitySettings, CoreError>;
}

/// In-memory provider: a default plus per-facility overrides. Used by the
/// CLI (whose config file is the settings source) and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsProvider {
    default: FacilitySettings,
    overrides: HashMap<Uuid, FacilitySettings>,
}

impl StaticSettingsProvider {
    pub fn new(default: FacilitySettings) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_facility(mut self, facility_id: Uuid, settings: FacilitySettings) -> Self {
        self.overrides.insert(facility_id, settings);
        self
    }
}

#[async_trait]
impl SettingsProvider for StaticSettingsProvider {
    async fn settings_for(&self, facility_id: Uuid) -> Result<FacilitySettings, CoreError> {
        Ok(self
            .overrides
            .get(&facility_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Convert the wire form of allowed days (`0..6`, Sunday-first) into
/// weekdays.
pub fn days_from_sunday_indices(indices: &[u8]) -> Result<Vec<Weekday>, CoreError> {
    let mut days = Vec::with_capacity(indices.len());
    for &index in indices {
        let day = match index {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => {
                return Err(CoreError::Validation(format!(
                    "day index out of range: {}",
                    index
                )))
            }
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}
