use clap::Parser;
use owo_colors::{OwoColorize, Style};

use atrium_core::db;
use atrium_core::error::CoreError;
use atrium_core::repository::SqliteRepository;
use atrium_core::service::ScheduleService;
use atrium_core::settings::StaticSettingsProvider;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    };
    let settings = match config.scheduling.to_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    let db_pool = match db::establish_connection(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let repository = SqliteRepository::new(db_pool);
    let service = ScheduleService::new(repository, StaticSettingsProvider::new(settings))
        .with_materialization((&config.materialization).into());

    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_activity(&service, &config, command).await,
        cli::Commands::Edit(command) => {
            commands::edit::edit_activity(&service, &config, command).await
        }
        cli::Commands::Delete(command) => {
            commands::delete::delete_activity(&service, &config, command).await
        }
        cli::Commands::List(command) => {
            commands::list::list_activities(&service, &config, command).await
        }
    };

    if let Err(e) = result {
        std::process::exit(handle_error(e));
    }
}

/// Deterministic boundary mapping: validation problems exit 2, missing
/// activities 3, unaccepted scheduling warnings 4 (with the report
/// printed), anything else 1.
fn handle_error(err: anyhow::Error) -> i32 {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::Validation(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
                2
            }
            CoreError::InvalidRecurrence(s) => {
                eprintln!("{} Invalid recurrence: {}", "Error:".style(error_style), s);
                2
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!(
                    "{} Invalid timezone: '{}'. Use IANA names like 'America/New_York'",
                    "Error:".style(error_style),
                    s
                );
                2
            }
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
                3
            }
            CoreError::Conflict(report) => {
                eprintln!(
                    "{} Scheduling rejected ({})",
                    "Error:".style(error_style),
                    report
                );
                for line in views::warnings::report_lines(report) {
                    eprintln!("  {} {}", "•".yellow(), line);
                }
                eprintln!(
                    "Re-run with {} and/or {} to schedule anyway.",
                    "--allow-conflicts".yellow(),
                    "--allow-outside-hours".yellow()
                );
                4
            }
            _ => {
                eprintln!("{} {}", "Error:".style(error_style), err);
                1
            }
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
        1
    }
}
