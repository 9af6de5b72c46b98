use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error(transparent)]
    Store(#[from] reconcile_store::StoreError),
}
