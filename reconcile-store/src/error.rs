use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[cfg(feature = "postgres-store")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
