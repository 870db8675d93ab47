//! Recurrence rules and the pure occurrence expander.
//!
//! The engine supports exactly the rule shape the product exposes: a fixed
//! frequency (DAILY, WEEKLY, MONTHLY), an interval, an optional weekday set
//! for weekly rules, count-or-until termination, and a single IANA
//! timezone. Rules are stored in a compact text form
//! (`FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE,FR;COUNT=10`) with the timezone
//! kept in its own column alongside.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;
use crate::timezone::{parse_timezone, resolve_local};

/// Hard cap on COUNT values accepted from callers.
pub const MAX_COUNT: u32 = 1000;
/// Hard cap on INTERVAL values accepted from callers.
pub const MAX_INTERVAL: u32 = 366;
/// Safety bound on period iteration; window bounds terminate expansion long
/// before this in any valid configuration.
const MAX_PERIODS: i64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "DAILY"),
            Frequency::Weekly => write!(f, "WEEKLY"),
            Frequency::Monthly => write!(f, "MONTHLY"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn weekday_from_token(token: &str) -> Result<Weekday, CoreError> {
    match token.to_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => Err(CoreError::InvalidRecurrence(format!(
            "unknown BYDAY token: '{}'",
            token
        ))),
    }
}

/// A validated recurrence rule. `count` and `until` are mutually exclusive
/// in practice; when both are present, `count` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub interval: u32,
    /// Weekday set for WEEKLY rules, evaluated in the series timezone.
    /// Empty means a single weekly anchor on dtstart's own weekday.
    pub by_day: Vec<Weekday>,
    pub count: Option<u32>,
    /// Absolute instant, inclusive: an occurrence exactly at `until` is
    /// still generated.
    pub until: Option<DateTime<Utc>>,
    /// IANA timezone anchoring all occurrence arithmetic.
    pub timezone: String,
}

impl RecurrenceRule {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval < 1 || self.interval > MAX_INTERVAL {
            return Err(CoreError::InvalidRecurrence(format!(
                "INTERVAL must be between 1 and {}",
                MAX_INTERVAL
            )));
        }
        if let Some(count) = self.count {
            if count < 1 || count > MAX_COUNT {
                return Err(CoreError::InvalidRecurrence(format!(
                    "COUNT must be between 1 and {}",
                    MAX_COUNT
                )));
            }
        }
        if !self.by_day.is_empty() && self.freq != Frequency::Weekly {
            return Err(CoreError::InvalidRecurrence(
                "BYDAY is only valid with FREQ=WEEKLY".to_string(),
            ));
        }
        parse_timezone(&self.timezone)?;
        Ok(())
    }

    /// Parse the compact storage form. The timezone lives in its own
    /// column and is supplied separately.
    pub fn parse(text: &str, timezone: &str) -> Result<Self, CoreError> {
        let mut freq: Option<Frequency> = None;
        let mut interval: u32 = 1;
        let mut by_day: Vec<Weekday> = Vec::new();
        let mut count: Option<u32> = None;
        let mut until: Option<DateTime<Utc>> = None;

        for part in text.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                CoreError::InvalidRecurrence(format!("malformed component: '{}'", part))
            })?;
            match key.to_uppercase().as_str() {
                "FREQ" => {
                    freq = Some(value.parse().map_err(|_| {
                        CoreError::InvalidRecurrence(format!("unknown frequency: '{}'", value))
                    })?)
                }
                "INTERVAL" => {
                    interval = value.parse().map_err(|_| {
                        CoreError::InvalidRecurrence(format!("invalid INTERVAL: '{}'", value))
                    })?
                }
                "BYDAY" => {
                    by_day = value
                        .split(',')
                        .map(weekday_from_token)
                        .collect::<Result<Vec<_>, _>>()?;
                    by_day.sort_by_key(|d| d.num_days_from_monday());
                    by_day.dedup();
                }
                "COUNT" => {
                    count = Some(value.parse().map_err(|_| {
                        CoreError::InvalidRecurrence(format!("invalid COUNT: '{}'", value))
                    })?)
                }
                "UNTIL" => {
                    until = Some(
                        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
                            .map_err(|_| {
                                CoreError::InvalidRecurrence(format!("invalid UNTIL: '{}'", value))
                            })?
                            .and_utc(),
                    )
                }
                _ => {
                    return Err(CoreError::InvalidRecurrence(format!(
                        "unsupported component: '{}'",
                        key
                    )))
                }
            }
        }

        let rule = Self {
            freq: freq
                .ok_or_else(|| CoreError::InvalidRecurrence("missing FREQ".to_string()))?,
            interval,
            by_day,
            count,
            until,
            timezone: timezone.to_string(),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Compact text form for storage. The UNTIL instant strips separators
    /// and sub-second precision (`20240115T000000Z` style).
    pub fn to_storage_string(&self) -> String {
        let mut out = format!("FREQ={};INTERVAL={}", self.freq, self.interval);
        if !self.by_day.is_empty() {
            let days: Vec<&str> = self.by_day.iter().map(|d| weekday_token(*d)).collect();
            out.push_str(";BYDAY=");
            out.push_str(&days.join(","));
        }
        if let Some(count) = self.count {
            out.push_str(&format!(";COUNT={}", count));
        }
        if let Some(until) = self.until {
            out.push_str(&format!(";UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
        }
        out
    }

    /// Expand the rule into ordered occurrence instants within the
    /// half-open window `[window_start, window_end)`.
    ///
    /// Pure and deterministic: identical inputs always yield the identical
    /// ordered list. COUNT bounds the global ordinal sequence from
    /// `dtstart`, not the count within the queried window, so repeated
    /// calls with different windows still observe one finite sequence.
    /// Exceptions are applied by the caller, never here.
    pub fn occurrences_between(
        &self,
        dtstart: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        self.validate()?;
        let tz = parse_timezone(&self.timezone)?;

        let mut acc = Accumulator {
            dtstart,
            window_start,
            window_end,
            // COUNT is authoritative when both terminators are present.
            until: if self.count.is_some() { None } else { self.until },
            count: self.count,
            emitted: 0,
            out: Vec::new(),
        };

        if window_end <= window_start || window_end <= dtstart {
            return Ok(acc.out);
        }

        let local_anchor = dtstart.with_timezone(&tz);
        let anchor_date = local_anchor.date_naive();
        let anchor_time = local_anchor.time();
        let step = self.interval as i64;

        match self.freq {
            Frequency::Daily => {
                'days: for k in 0..MAX_PERIODS {
                    let date = anchor_date + Duration::days(k * step);
                    if let Some(candidate) = resolve_local(&tz, date.and_time(anchor_time)) {
                        if acc.visit(candidate) == Step::Done {
                            break 'days;
                        }
                    }
                }
            }
            Frequency::Weekly => {
                let mut days: Vec<Weekday> = if self.by_day.is_empty() {
                    vec![anchor_date.weekday()]
                } else {
                    self.by_day.clone()
                };
                days.sort_by_key(|d| d.num_days_from_monday());
                days.dedup();

                // Week 0 is the ISO week containing dtstart; weekday slots
                // earlier in that week than dtstart itself are dropped by
                // the accumulator.
                let week_start = anchor_date
                    - Duration::days(anchor_date.weekday().num_days_from_monday() as i64);
                'weeks: for k in 0..MAX_PERIODS {
                    let base = week_start + Duration::weeks(k * step);
                    for day in &days {
                        let date = base + Duration::days(day.num_days_from_monday() as i64);
                        if let Some(candidate) = resolve_local(&tz, date.and_time(anchor_time)) {
                            if acc.visit(candidate) == Step::Done {
                                break 'weeks;
                            }
                        }
                    }
                }
            }
            Frequency::Monthly => {
                let day_of_month = anchor_date.day();
                let base_index = anchor_date.year() * 12 + anchor_date.month0() as i32;
                'months: for k in 0..MAX_PERIODS as i32 {
                    let index = base_index + k * self.interval as i32;
                    let (year, month0) = (index.div_euclid(12), index.rem_euclid(12) as u32);
                    // A target month without this day-of-month contributes
                    // no occurrence: the slot is skipped, never clamped to
                    // month-end, and consumes no COUNT ordinal.
                    let Some(date) = NaiveDate::from_ymd_opt(year, month0 + 1, day_of_month)
                    else {
                        continue;
                    };
                    if let Some(candidate) = resolve_local(&tz, date.and_time(anchor_time)) {
                        if acc.visit(candidate) == Step::Done {
                            break 'months;
                        }
                    }
                }
            }
        }

        Ok(acc.out)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Step {
    Continue,
    Done,
}

/// Walks the ascending candidate stream, applying the dtstart floor, the
/// COUNT/UNTIL terminators, and the query window.
struct Accumulator {
    dtstart: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
    count: Option<u32>,
    emitted: u32,
    out: Vec<DateTime<Utc>>,
}

impl Accumulator {
    fn visit(&mut self, candidate: DateTime<Utc>) -> Step {
        if candidate < self.dtstart {
            return Step::Continue;
        }
        if let Some(until) = self.until {
            if candidate > until {
                return Step::Done;
            }
        }
        if candidate >= self.window_end {
            return Step::Done;
        }
        if let Some(count) = self.count {
            if self.emitted >= count {
                return Step::Done;
            }
        }
        self.emitted += 1;
        if candidate >= self.window_start {
            self.out.push(candidate);
        }
        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn weekly_mwf() -> RecurrenceRule {
        RecurrenceRule {
            freq: Frequency::Weekly,
            interval: 1,
            by_day: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            count: None,
            until: None,
            timezone: "UTC".to_string(),
        }
    }

    #[test]
    fn test_weekly_byday_first_week() {
        // 2024-01-01 is a Monday.
        let dtstart = utc(2024, 1, 1, 9);
        let occurrences = weekly_mwf()
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 8, 0))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 1, 9), utc(2024, 1, 3, 9), utc(2024, 1, 5, 9)]
        );
    }

    #[test]
    fn test_weekly_slots_before_dtstart_dropped() {
        // Anchor on the Wednesday; the Monday of week 0 precedes dtstart.
        let dtstart = utc(2024, 1, 3, 9);
        let occurrences = weekly_mwf()
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 9, 0))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 3, 9), utc(2024, 1, 5, 9), utc(2024, 1, 8, 9)]
        );
    }

    #[test]
    fn test_weekly_empty_byday_uses_anchor_weekday() {
        let rule = RecurrenceRule {
            by_day: vec![],
            ..weekly_mwf()
        };
        let dtstart = utc(2024, 1, 2, 14); // Tuesday
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 17, 0))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 2, 14), utc(2024, 1, 9, 14), utc(2024, 1, 16, 14)]
        );
    }

    #[test]
    fn test_weekly_interval_two() {
        let rule = RecurrenceRule {
            interval: 2,
            by_day: vec![Weekday::Mon],
            ..weekly_mwf()
        };
        let dtstart = utc(2024, 1, 1, 9);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 2, 1, 0))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 1, 9), utc(2024, 1, 15, 9), utc(2024, 1, 29, 9)]
        );
    }

    #[test]
    fn test_weekday_set_evaluated_in_series_timezone() {
        // 03:00 UTC on Tuesday is 22:00 Monday in New York; the rule fires
        // on local Mondays.
        let rule = RecurrenceRule {
            by_day: vec![Weekday::Mon],
            timezone: "America/New_York".to_string(),
            ..weekly_mwf()
        };
        let dtstart = utc(2024, 1, 2, 3);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 17, 0))
            .unwrap();
        assert_eq!(occurrences, vec![utc(2024, 1, 2, 3), utc(2024, 1, 9, 3), utc(2024, 1, 16, 3)]);
    }

    #[test]
    fn test_daily_interval() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 3,
            by_day: vec![],
            count: None,
            until: None,
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 1, 8);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 9, 0))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 1, 8), utc(2024, 1, 4, 8), utc(2024, 1, 7, 8)]
        );
    }

    #[test]
    fn test_count_bounds_global_sequence_not_per_window() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            by_day: vec![],
            count: Some(3),
            until: None,
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 1, 9);

        // A window holding ten raw candidates still yields three.
        let all = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 11, 0))
            .unwrap();
        assert_eq!(all.len(), 3);

        // A later window sees only the remainder of the same sequence.
        let tail = rule
            .occurrences_between(dtstart, utc(2024, 1, 2, 0), utc(2024, 1, 11, 0))
            .unwrap();
        assert_eq!(tail, vec![utc(2024, 1, 2, 9), utc(2024, 1, 3, 9)]);

        // Past the third ordinal nothing is ever generated.
        let beyond = rule
            .occurrences_between(dtstart, utc(2024, 1, 5, 0), utc(2024, 1, 11, 0))
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_until_is_inclusive() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            by_day: vec![],
            count: None,
            until: Some(utc(2024, 1, 3, 9)),
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 1, 9);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 10, 0))
            .unwrap();
        // Exactly at `until` is included; one interval later is not.
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 1, 9), utc(2024, 1, 2, 9), utc(2024, 1, 3, 9)]
        );
    }

    #[test]
    fn test_monthly_short_months_skipped_not_clamped() {
        let rule = RecurrenceRule {
            freq: Frequency::Monthly,
            interval: 1,
            by_day: vec![],
            count: None,
            until: None,
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 31, 10);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 7, 1, 0))
            .unwrap();
        // February and April (and June) have no 31st and contribute nothing.
        assert_eq!(
            occurrences,
            vec![utc(2024, 1, 31, 10), utc(2024, 3, 31, 10), utc(2024, 5, 31, 10)]
        );
    }

    #[test]
    fn test_monthly_skipped_month_consumes_no_count_ordinal() {
        let rule = RecurrenceRule {
            freq: Frequency::Monthly,
            interval: 1,
            by_day: vec![],
            count: Some(2),
            until: None,
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 31, 10);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2025, 1, 1, 0))
            .unwrap();
        assert_eq!(occurrences, vec![utc(2024, 1, 31, 10), utc(2024, 3, 31, 10)]);
    }

    #[test]
    fn test_count_authoritative_over_until() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            by_day: vec![],
            count: Some(5),
            until: Some(utc(2024, 1, 2, 9)),
            timezone: "UTC".to_string(),
        };
        let dtstart = utc(2024, 1, 1, 9);
        let occurrences = rule
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 1, 20, 0))
            .unwrap();
        assert_eq!(occurrences.len(), 5);
    }

    #[test]
    fn test_window_entirely_before_dtstart() {
        let dtstart = utc(2024, 6, 1, 9);
        let occurrences = weekly_mwf()
            .occurrences_between(dtstart, utc(2024, 1, 1, 0), utc(2024, 2, 1, 0))
            .unwrap();
        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_storage_string_round_trip() {
        let rule = RecurrenceRule {
            freq: Frequency::Weekly,
            interval: 2,
            by_day: vec![Weekday::Mon, Weekday::Fri],
            count: Some(10),
            until: None,
            timezone: "America/Chicago".to_string(),
        };
        let text = rule.to_storage_string();
        assert_eq!(text, "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,FR;COUNT=10");
        let parsed = RecurrenceRule::parse(&text, "America/Chicago").unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_storage_string_until_compact_form() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            by_day: vec![],
            count: None,
            until: Some(utc(2024, 1, 15, 0)),
            timezone: "UTC".to_string(),
        };
        let text = rule.to_storage_string();
        assert_eq!(text, "FREQ=DAILY;INTERVAL=1;UNTIL=20240115T000000Z");
        assert_eq!(RecurrenceRule::parse(&text, "UTC").unwrap(), rule);
    }

    #[test]
    fn test_parse_rejects_invalid_rules() {
        assert!(matches!(
            RecurrenceRule::parse("FREQ=YEARLY;INTERVAL=1", "UTC"),
            Err(CoreError::InvalidRecurrence(_))
        ));
        assert!(matches!(
            RecurrenceRule::parse("INTERVAL=1", "UTC"),
            Err(CoreError::InvalidRecurrence(_))
        ));
        assert!(matches!(
            RecurrenceRule::parse("FREQ=DAILY;INTERVAL=0", "UTC"),
            Err(CoreError::InvalidRecurrence(_))
        ));
        assert!(matches!(
            RecurrenceRule::parse("FREQ=DAILY;BYDAY=MO", "UTC"),
            Err(CoreError::InvalidRecurrence(_))
        ));
        assert!(matches!(
            RecurrenceRule::parse("FREQ=DAILY;INTERVAL=1;COUNT=5000", "UTC"),
            Err(CoreError::InvalidRecurrence(_))
        ));
        assert!(matches!(
            RecurrenceRule::parse("FREQ=DAILY;INTERVAL=1", "Mars/Olympus"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_expansion_is_deterministic_ordered_and_windowed(
            freq_pick in 0u8..3,
            interval in 1u32..4,
            count in proptest::option::of(1u32..40),
            start_offset_days in 0i64..60,
            span_days in 1i64..90,
        ) {
            let freq = match freq_pick {
                0 => Frequency::Daily,
                1 => Frequency::Weekly,
                _ => Frequency::Monthly,
            };
            let rule = RecurrenceRule {
                freq,
                interval,
                by_day: if freq == Frequency::Weekly {
                    vec![Weekday::Mon, Weekday::Thu]
                } else {
                    vec![]
                },
                count,
                until: None,
                timezone: "America/New_York".to_string(),
            };
            let dtstart = Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap();
            let window_start = dtstart + Duration::days(start_offset_days);
            let window_end = window_start + Duration::days(span_days);

            let first = rule.occurrences_between(dtstart, window_start, window_end).unwrap();
            let second = rule.occurrences_between(dtstart, window_start, window_end).unwrap();
            prop_assert_eq!(&first, &second);

            for pair in first.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for occurrence in &first {
                prop_assert!(*occurrence >= window_start);
                prop_assert!(*occurrence < window_end);
                prop_assert!(*occurrence >= dtstart);
            }
        }
    }
}
