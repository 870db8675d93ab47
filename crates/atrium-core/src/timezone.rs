use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::CoreError;

/// Validate and parse an IANA timezone name.
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// Resolve a facility-local wall-clock time to a UTC instant.
///
/// Ambiguous local times (fall-back transition) resolve to the earlier
/// instant. A nonexistent local time (spring-forward gap) shifts one hour
/// later; if even that fails to resolve, `None` is returned and the caller
/// skips the slot.
pub fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => Some(local.with_timezone(&Utc)),
        None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|local| local.with_timezone(&Utc)),
    }
}
