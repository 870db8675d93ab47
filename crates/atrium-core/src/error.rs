use thiserror::Error;

use crate::conflict::ConflictReport;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    /// The only error variant carrying business data: the structured report
    /// the boundary layer returns to the caller alongside the rejection.
    #[error("Scheduling conflict: {0}")]
    Conflict(Box<ConflictReport>),
}

impl CoreError {
    /// The conflict report attached to a `Conflict` rejection, if any.
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            CoreError::Conflict(report) => Some(report),
            _ => None,
        }
    }
}
