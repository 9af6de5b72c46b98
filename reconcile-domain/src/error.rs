use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures that must never mutate any stored state.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("file path must not be empty")]
    EmptyFilePath,

    #[error("at least one bank statement file path is required")]
    NoBankFiles,
}
