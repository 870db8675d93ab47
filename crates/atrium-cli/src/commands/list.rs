use anyhow::Result;
use chrono::{Duration, Utc};

use crate::cli::ListCommand;
use crate::config::Config;
use crate::parser::parse_datetime;
use crate::views::table::display_activities;

use super::CliService;

pub async fn list_activities(
    service: &CliService,
    config: &Config,
    command: ListCommand,
) -> Result<()> {
    let window_start = command
        .from
        .as_deref()
        .map(parse_datetime)
        .transpose()?
        .unwrap_or_else(Utc::now);
    let window_end = command
        .to
        .as_deref()
        .map(parse_datetime)
        .transpose()?
        .unwrap_or_else(|| window_start + Duration::days(config.materialization.lookahead_days));

    let activities = service
        .list_window(config.facility_id, window_start, window_end)
        .await?;
    display_activities(&activities);

    Ok(())
}
