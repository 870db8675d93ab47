use anyhow::Result;
use owo_colors::{OwoColorize, Style};

use atrium_core::models::{
    Adaptations, ChecklistItem, NewActivityData, NewSeriesData, OverridePolicy,
};
use atrium_core::recurrence::RecurrenceRule;

use crate::cli::AddCommand;
use crate::config::Config;
use crate::parser::{parse_datetime, parse_days};
use crate::views::warnings::print_accepted_warnings;

use super::CliService;

pub async fn add_activity(
    service: &CliService,
    config: &Config,
    command: AddCommand,
) -> Result<()> {
    let start_at = parse_datetime(&command.from)?;
    let end_at = parse_datetime(&command.to)?;
    let policy = OverridePolicy {
        allow_conflicts: command.allow_conflicts,
        allow_outside_hours: command.allow_outside_hours,
    };

    let checklist: Vec<ChecklistItem> = command
        .checklist
        .iter()
        .map(|label| ChecklistItem {
            label: label.clone(),
            done: false,
        })
        .collect();
    let mut adaptations = Adaptations::default();
    adaptations.bed_bound.enabled = command.bed_bound;
    adaptations.dementia_friendly.enabled = command.dementia_friendly;
    adaptations.low_vision_hearing.enabled = command.low_vision_hearing;
    adaptations.one_to_one_mini.enabled = command.one_to_one;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if let Some(frequency) = command.every {
        let by_day = command.on.as_deref().map(parse_days).transpose()?;
        let until = command.until.as_deref().map(parse_datetime).transpose()?;
        let timezone = command
            .timezone
            .clone()
            .unwrap_or_else(|| config.scheduling.timezone.clone());

        let rule = RecurrenceRule {
            freq: frequency.into(),
            interval: command.interval.unwrap_or(1),
            by_day: by_day.unwrap_or_default(),
            count: command.count,
            until,
            timezone,
        };

        let data = NewSeriesData {
            title: command.title,
            dtstart: start_at,
            duration_minutes: (end_at - start_at).num_minutes(),
            rule,
            location: command.location,
            template_id: None,
            checklist,
            adaptations,
        };

        let creation = service
            .create_series(config.facility_id, data, policy)
            .await?;
        println!(
            "{} Created recurring activity: {}",
            "✓".style(success_style),
            creation.series.title.bright_white().bold()
        );
        println!(
            "  {} Series ID: {}",
            "→".style(info_style),
            creation.series.id.to_string().yellow()
        );
        println!(
            "  {} {} occurrences scheduled over the next {} days",
            "→".style(info_style),
            creation.materialized,
            config.materialization.lookahead_days
        );
        print_accepted_warnings(&creation.report);
    } else {
        let data = NewActivityData {
            title: command.title,
            start_at: Some(start_at),
            end_at: Some(end_at),
            location: command.location,
            template_id: None,
            checklist,
            adaptations,
        };

        let outcome = service
            .create_standalone(config.facility_id, data, policy)
            .await?;
        println!(
            "{} Created activity: {}",
            "✓".style(success_style),
            outcome.activity.title.bright_white().bold()
        );
        println!(
            "  {} Activity ID: {}",
            "→".style(info_style),
            outcome.activity.id.to_string().yellow()
        );
        print_accepted_warnings(&outcome.report);
    }

    Ok(())
}
