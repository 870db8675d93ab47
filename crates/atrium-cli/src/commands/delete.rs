use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use atrium_core::error::CoreError;
use atrium_core::repository::InstanceRepository;

use crate::cli::DeleteCommand;
use crate::config::Config;
use crate::util::parse_activity_id;

use super::CliService;

pub async fn delete_activity(
    service: &CliService,
    config: &Config,
    command: DeleteCommand,
) -> Result<()> {
    let id = parse_activity_id(&command.id)?;

    let activity = service
        .repository()
        .find_instance(config.facility_id, id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Activity {} not found", id))))?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete activity '{}'?",
                activity.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let outcome = service.delete_instance(config.facility_id, id).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Deleted activity: {}",
        "✓".style(success_style),
        activity.title.bright_white().bold()
    );
    if outcome.skipped_series_occurrence {
        println!(
            "  {} This occurrence is now skipped; the rest of the series is unaffected",
            "→".style(info_style)
        );
    }

    Ok(())
}
