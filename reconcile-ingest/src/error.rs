use reconcile_domain::FileKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no parser registered for file kind {0:?}")]
    NoParser(FileKind),

    #[error(transparent)]
    Storage(#[from] reconcile_storage::StorageError),

    #[error(transparent)]
    Store(#[from] reconcile_store::StoreError),

    #[error("malformed csv row: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv reader task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}
