use clap::{Parser, Subcommand, ValueEnum};
use atrium_core::recurrence::Frequency;

/// Activity scheduling for facility operations: recurring series,
/// conflict warnings, and business-hours checks.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a standalone activity or a recurring series
    Add(AddCommand),
    /// Edit a single activity occurrence
    Edit(EditCommand),
    /// Delete an activity occurrence
    Delete(DeleteCommand),
    /// List scheduled activities in a window
    List(ListCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the activity
    pub title: String,
    /// Start time (RFC 3339 or natural language, e.g. 'next monday 9am')
    #[clap(long)]
    pub from: String,
    /// End time of the first (or only) occurrence
    #[clap(long)]
    pub to: String,
    /// Room or area the activity occupies
    #[clap(short, long)]
    pub location: Option<String>,
    /// Recurrence frequency; omit for a one-off activity
    #[clap(long, value_enum)]
    pub every: Option<FrequencyArg>,
    /// Repeat every N periods
    #[clap(long, requires = "every")]
    pub interval: Option<u32>,
    /// Days of week for weekly recurrence (mon,wed,fri / weekdays / weekends)
    #[clap(long, requires = "every")]
    pub on: Option<String>,
    /// Maximum number of occurrences
    #[clap(long, requires = "every")]
    pub count: Option<u32>,
    /// Last date an occurrence may start (inclusive)
    #[clap(long, requires = "every", conflicts_with = "count")]
    pub until: Option<String>,
    /// IANA timezone for the series (defaults to the configured facility timezone)
    #[clap(long, requires = "every")]
    pub timezone: Option<String>,
    /// Checklist entries for the activity
    #[clap(long, num_args = 1..)]
    pub checklist: Vec<String>,
    /// Flag the activity as adapted for bed-bound residents
    #[clap(long)]
    pub bed_bound: bool,
    /// Flag the activity as dementia-friendly
    #[clap(long)]
    pub dementia_friendly: bool,
    /// Flag the activity as adapted for low vision or hearing
    #[clap(long)]
    pub low_vision_hearing: bool,
    /// Flag the activity as a one-to-one mini session
    #[clap(long)]
    pub one_to_one: bool,
    /// Schedule even when it overlaps existing activities
    #[clap(long)]
    pub allow_conflicts: bool,
    /// Schedule even outside the facility's business hours
    #[clap(long)]
    pub allow_outside_hours: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the activity occurrence to edit
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    /// New start time
    #[arg(long)]
    pub from: Option<String>,
    /// New end time
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, conflicts_with = "location")]
    pub clear_location: bool,
    /// How to apply the change (instance|series)
    #[arg(long, default_value = "instance")]
    pub scope: String,
    /// Apply even when the new time overlaps existing activities
    #[arg(long)]
    pub allow_conflicts: bool,
    /// Apply even outside the facility's business hours
    #[arg(long)]
    pub allow_outside_hours: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the activity occurrence to delete
    pub id: String,
    /// Force deletion without confirmation
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Window start (defaults to now)
    #[clap(long)]
    pub from: Option<String>,
    /// Window end (defaults to the configured lookahead past the start)
    #[clap(long)]
    pub to: Option<String>,
}

/// Recurrence frequencies exposed on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyArg {
    /// Every day
    Daily,
    /// Every week
    Weekly,
    /// Every month (same date; short months skip)
    Monthly,
}

impl From<FrequencyArg> for Frequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
        }
    }
}
