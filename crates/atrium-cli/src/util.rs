use anyhow::{anyhow, Result};
use atrium_core::error::CoreError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn parse_activity_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).map_err(|_| {
        anyhow!(CoreError::Validation(format!(
            "'{}' is not a valid activity id",
            input
        )))
    })
}

pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn format_instant(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
