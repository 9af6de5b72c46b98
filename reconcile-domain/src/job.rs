use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{FileKind, JobStatus};

/// The unit of work that turns one CSV file into persisted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: Uuid,
    pub file_kind: FileKind,
    pub source_file: String,
    pub lines_processed: u64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionJob {
    pub fn new(file_kind: FileKind, source_file: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_kind,
            source_file: source_file.into(),
            lines_processed: 0,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
