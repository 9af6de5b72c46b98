use thiserror::Error;

/// Per-line parse failure. The ingestion worker logs these and counts the
/// row toward `lines_processed` without failing the job (§4.2 step 3).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("row has {found} fields, need at least {required}")]
    TooFewFields { found: usize, required: usize },

    #[error("unparseable amount {0:?}")]
    InvalidAmount(String),

    #[error("unparseable transaction type {0:?}")]
    InvalidType(String),

    #[error("unparseable timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("unparseable date {0:?}")]
    InvalidDate(String),
}
