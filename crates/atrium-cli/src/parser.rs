use anyhow::Result;
use chrono::{DateTime, Utc, Weekday};
use chrono_english::{parse_date_string, Dialect};

/// Accepts RFC 3339 first, then falls back to natural language
/// ("next monday 9am", "tomorrow 14:00") relative to now.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_date_string(input, Utc::now(), Dialect::Us)
        .map_err(|e| anyhow::anyhow!("Failed to parse time '{}': {}", input, e))
}

/// Parse a weekday list like "mon,wed,fri", or the groups "weekdays" and
/// "weekends".
pub fn parse_days(input: &str) -> Result<Vec<Weekday>> {
    let normalized = input.trim().to_lowercase();

    match normalized.as_str() {
        "weekdays" | "workdays" => {
            return Ok(vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]);
        }
        "weekends" => return Ok(vec![Weekday::Sat, Weekday::Sun]),
        _ => {}
    }

    let mut days = Vec::new();
    for part in normalized.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day = match part {
            "mon" | "monday" => Weekday::Mon,
            "tue" | "tuesday" => Weekday::Tue,
            "wed" | "wednesday" => Weekday::Wed,
            "thu" | "thursday" => Weekday::Thu,
            "fri" | "friday" => Weekday::Fri,
            "sat" | "saturday" => Weekday::Sat,
            "sun" | "sunday" => Weekday::Sun,
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid day '{}'. Use mon,tue,wed,thu,fri,sat,sun or the groups 'weekdays'/'weekends'",
                    part
                ));
            }
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }

    if days.is_empty() {
        return Err(anyhow::anyhow!("No valid days in '{}'", input));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc3339_passthrough() {
        assert_eq!(
            parse_datetime("2030-01-07T09:00:00Z").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_day_lists_and_groups() {
        assert_eq!(
            parse_days("mon, wed ,fri").unwrap(),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert_eq!(parse_days("weekends").unwrap(), vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(parse_days("mon,mon").unwrap().len(), 1);
        assert!(parse_days("noday").is_err());
    }
}
