use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Facility operating-hours policy: allowed weekdays plus a local
/// time-of-day window. Activities outside the window are flagged, never
/// blocked; the override flag on the scheduling operation decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursPolicy {
    pub days: Vec<Weekday>,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl Default for BusinessHoursPolicy {
    fn default() -> Self {
        Self {
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            opens_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }
}

impl BusinessHoursPolicy {
    pub fn new(days: Vec<Weekday>, opens_at: &str, closes_at: &str) -> Result<Self, CoreError> {
        let opens_at = parse_hhmm(opens_at)?;
        let closes_at = parse_hhmm(closes_at)?;
        if closes_at <= opens_at {
            return Err(CoreError::Validation(
                "business hours close must be after open".to_string(),
            ));
        }
        Ok(Self {
            days,
            opens_at,
            closes_at,
        })
    }

    pub fn allows_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

/// Parse an `HH:MM` time-of-day.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| CoreError::Validation(format!("invalid time of day: '{}'", value)))
}

/// Whether a time block falls outside the facility's operating hours.
///
/// Both endpoints are converted to facility-local weekday and time-of-day.
/// A block spanning local midnight is always flagged, even when both
/// calendar days are individually allowed.
pub fn outside_business_hours(
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    tz: &Tz,
    policy: &BusinessHoursPolicy,
) -> bool {
    let local_start = start_at.with_timezone(tz);
    let local_end = end_at.with_timezone(tz);

    if !policy.allows_day(local_start.weekday()) || !policy.allows_day(local_end.weekday()) {
        return true;
    }
    if local_start.date_naive() != local_end.date_naive() {
        return true;
    }

    let start_minutes = local_start.time().num_seconds_from_midnight() / 60;
    let end_minutes = local_end.time().num_seconds_from_midnight() / 60;
    start_minutes < policy.opens_at.num_seconds_from_midnight() / 60
        || end_minutes > policy.closes_at.num_seconds_from_midnight() / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    // Policy: 08:00-17:00, Mon-Fri, evaluated in UTC.
    // 2024-01-06 is a Saturday; 2024-01-05 a Friday; 2024-01-08 a Monday.
    #[rstest]
    #[case(utc(2024, 1, 6, 10, 0), utc(2024, 1, 6, 11, 0), true)] // Saturday
    #[case(utc(2024, 1, 5, 16, 30), utc(2024, 1, 5, 17, 30), true)] // ends past close
    #[case(utc(2024, 1, 8, 9, 0), utc(2024, 1, 8, 10, 0), false)] // Monday morning
    #[case(utc(2024, 1, 8, 7, 30), utc(2024, 1, 8, 9, 0), true)] // starts before open
    #[case(utc(2024, 1, 8, 8, 0), utc(2024, 1, 8, 17, 0), false)] // exactly the window
    #[case(utc(2024, 1, 8, 16, 0), utc(2024, 1, 9, 9, 0), true)] // spans midnight
    fn test_outside_business_hours(
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
        #[case] expected: bool,
    ) {
        let tz: Tz = "UTC".parse().unwrap();
        let policy = BusinessHoursPolicy::default();
        assert_eq!(outside_business_hours(start, end, &tz, &policy), expected);
    }

    #[test]
    fn test_local_weekday_decides() {
        // 2024-01-06 01:00 UTC is still Friday evening in Los Angeles.
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let policy = BusinessHoursPolicy::default();
        let start = utc(2024, 1, 6, 0, 0); // Friday 16:00 local
        let end = utc(2024, 1, 6, 1, 0); // Friday 17:00 local
        assert!(!outside_business_hours(start, end, &tz, &policy));
    }

    #[test]
    fn test_policy_rejects_inverted_window() {
        let result = BusinessHoursPolicy::new(vec![Weekday::Mon], "17:00", "08:00");
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(
            parse_hhmm("08:30").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert!(parse_hhmm("8 am").is_err());
        assert!(parse_hhmm("25:00").is_err());
    }
}
