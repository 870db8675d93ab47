pub mod add;
pub mod delete;
pub mod edit;
pub mod list;

use atrium_core::repository::SqliteRepository;
use atrium_core::service::ScheduleService;
use atrium_core::settings::StaticSettingsProvider;

pub type CliService = ScheduleService<SqliteRepository, StaticSettingsProvider>;
