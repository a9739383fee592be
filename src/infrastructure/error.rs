use crate::domain::schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}

impl InfraError {
    /// Errors worth another attempt against the schedule store.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Sqlite(_))
    }
}
