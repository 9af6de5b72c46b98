use async_trait::async_trait;
use reconcile_domain::{FileKind, IngestionJob, JobStatus};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::IngestionJobStore;

use super::PgStore;

fn file_kind_tag(kind: FileKind) -> &'static str {
    match kind {
        FileKind::SystemTx => "SYSTEM_TX",
        FileKind::BankStmt => "BANK_STMT",
    }
}

fn status_tag(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "PENDING",
        JobStatus::InProgress => "IN_PROGRESS",
        JobStatus::Completed => "COMPLETED",
        JobStatus::Failed => "FAILED",
    }
}

fn parse_file_kind(tag: &str) -> FileKind {
    match tag {
        "BANK_STMT" => FileKind::BankStmt,
        _ => FileKind::SystemTx,
    }
}

fn parse_status(tag: &str) -> JobStatus {
    match tag {
        "IN_PROGRESS" => JobStatus::InProgress,
        "COMPLETED" => JobStatus::Completed,
        "FAILED" => JobStatus::Failed,
        _ => JobStatus::Pending,
    }
}

#[async_trait]
impl IngestionJobStore for PgStore {
    async fn create(&self, job: &IngestionJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ingestion_jobs (job_id, file_kind, source_file, lines_processed, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            "#,
        )
        .bind(job.id)
        .bind(file_kind_tag(job.file_kind))
        .bind(&job.source_file)
        .bind(job.lines_processed as i64)
        .bind(status_tag(job.status))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<IngestionJob, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, file_kind, source_file, lines_processed, status, created_at, updated_at
            FROM ingestion_jobs
            WHERE job_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "ingestion_job",
            id: id.to_string(),
        })?;
        Ok(row.into())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        lines_processed: u64,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE ingestion_jobs
            SET lines_processed = $1, status = $2, updated_at = NOW()
            WHERE job_id = $3
            "#,
        )
        .bind(lines_processed as i64)
        .bind(status_tag(status))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: Uuid,
    file_kind: String,
    source_file: String,
    lines_processed: i64,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRow> for IngestionJob {
    fn from(row: JobRow) -> Self {
        IngestionJob {
            id: row.job_id,
            file_kind: parse_file_kind(&row.file_kind),
            source_file: row.source_file,
            lines_processed: row.lines_processed.max(0) as u64,
            status: parse_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
