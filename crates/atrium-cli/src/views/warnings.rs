use atrium_core::conflict::ConflictReport;
use owo_colors::{OwoColorize, Style};

use crate::util::{format_instant, short_id};

/// Lines describing each warning in a report, printed to stderr on a
/// conflict rejection and to stdout when an override accepted them.
pub fn report_lines(report: &ConflictReport) -> Vec<String> {
    let mut lines = Vec::new();
    for conflict in &report.conflicts {
        let mut line = format!(
            "overlaps '{}' ({}) {} - {}",
            conflict.title,
            short_id(&conflict.id),
            format_instant(conflict.start_at),
            format_instant(conflict.end_at),
        );
        if let Some(location) = &conflict.location {
            line.push_str(&format!(" in {}", location));
        }
        lines.push(line);
    }
    if report.outside_business_hours {
        lines.push("outside the facility's business hours".to_string());
    }
    lines
}

pub fn print_accepted_warnings(report: &ConflictReport) {
    if report.is_clear() {
        return;
    }
    let warn_style = Style::new().yellow().bold();
    println!("  {} Scheduled despite warnings:", "⚠".style(warn_style));
    for line in report_lines(report) {
        println!("    {} {}", "•".yellow(), line);
    }
}
