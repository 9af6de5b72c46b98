use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to build object store client: {0}")]
    Build(#[source] object_store::Error),

    #[error("object {path} not found in bucket")]
    NotFound { path: String },

    #[error("object store error for {path}: {source}")]
    Backend {
        path: String,
        #[source]
        source: object_store::Error,
    },
}

impl StorageError {
    pub fn from_object_store(path: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                path: path.to_string(),
            },
            other => StorageError::Backend {
                path: path.to_string(),
                source: other,
            },
        }
    }
}
