use anyhow::{anyhow, Result};
use owo_colors::{OwoColorize, Style};

use atrium_core::error::CoreError;
use atrium_core::models::{EditScope, InstanceState, OverridePolicy, UpdateActivityData};

use crate::cli::EditCommand;
use crate::config::Config;
use crate::parser::parse_datetime;
use crate::util::parse_activity_id;
use crate::views::warnings::print_accepted_warnings;

use super::CliService;

pub async fn edit_activity(
    service: &CliService,
    config: &Config,
    command: EditCommand,
) -> Result<()> {
    let id = parse_activity_id(&command.id)?;
    let scope: EditScope = command
        .scope
        .parse()
        .map_err(|_| anyhow!(CoreError::Validation(format!(
            "'{}' is not a valid scope (use 'instance' or 'series')",
            command.scope
        ))))?;

    let location = if command.clear_location {
        Some(None)
    } else {
        command.location.map(Some)
    };

    let patch = UpdateActivityData {
        title: command.title,
        start_at: command.from.as_deref().map(parse_datetime).transpose()?,
        end_at: command.to.as_deref().map(parse_datetime).transpose()?,
        location,
        checklist: None,
        adaptations: None,
    };

    let policy = OverridePolicy {
        allow_conflicts: command.allow_conflicts,
        allow_outside_hours: command.allow_outside_hours,
    };

    let outcome = service
        .update_instance(config.facility_id, id, patch, scope, policy)
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Updated activity: {}",
        "✓".style(success_style),
        outcome.activity.title.bright_white().bold()
    );
    if outcome.activity.state == InstanceState::SeriesOverride {
        println!(
            "  {} This occurrence is now detached from its series and will keep its own details",
            "→".style(info_style)
        );
    }
    print_accepted_warnings(&outcome.report);

    Ok(())
}
