use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reconcile_domain::{BankJobSlot, Workflow, WorkflowStatus};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::WorkflowStore;

use super::PgStore;

fn status_tag(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::InProgress => "IN_PROGRESS",
        WorkflowStatus::Completed => "COMPLETED",
        WorkflowStatus::Failed => "FAILED",
    }
}

fn parse_status(tag: &str) -> WorkflowStatus {
    match tag {
        "COMPLETED" => WorkflowStatus::Completed,
        "FAILED" => WorkflowStatus::Failed,
        _ => WorkflowStatus::InProgress,
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn create(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO reconciliation_workflows
                (workflow_id, system_ingestion_job_id, system_ingestion_success,
                 reconciliation_job_id, status, start_date, end_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            "#,
        )
        .bind(workflow.id)
        .bind(workflow.system_job_id)
        .bind(workflow.system_job_success)
        .bind(workflow.reconciliation_job_id)
        .bind(status_tag(workflow.status))
        .bind(workflow.start_date)
        .bind(workflow.end_date)
        .execute(&mut *tx)
        .await?;

        for slot in &workflow.bank_jobs {
            sqlx::query(
                r#"
                INSERT INTO reconciliation_workflow_bank_jobs (workflow_id, job_id, success)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(workflow.id)
            .bind(slot.job_id)
            .bind(slot.success)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Workflow, StoreError> {
        let row = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT workflow_id, system_ingestion_job_id, system_ingestion_success,
                   reconciliation_job_id, status, start_date, end_date, created_at, updated_at
            FROM reconciliation_workflows
            WHERE workflow_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "workflow",
            id: id.to_string(),
        })?;

        let slot_rows = sqlx::query_as::<_, BankJobRow>(
            r#"
            SELECT job_id, success
            FROM reconciliation_workflow_bank_jobs
            WHERE workflow_id = $1
            ORDER BY job_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(row.into_workflow(slot_rows))
    }

    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE reconciliation_workflows
            SET system_ingestion_job_id = $1,
                system_ingestion_success = $2,
                reconciliation_job_id = $3,
                status = $4,
                updated_at = NOW()
            WHERE workflow_id = $5
            "#,
        )
        .bind(workflow.system_job_id)
        .bind(workflow.system_job_success)
        .bind(workflow.reconciliation_job_id)
        .bind(status_tag(workflow.status))
        .bind(workflow.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "workflow",
                id: workflow.id.to_string(),
            });
        }

        for slot in &workflow.bank_jobs {
            sqlx::query(
                r#"
                INSERT INTO reconciliation_workflow_bank_jobs (workflow_id, job_id, success)
                VALUES ($1, $2, $3)
                ON CONFLICT (workflow_id, job_id) DO UPDATE SET success = EXCLUDED.success
                "#,
            )
            .bind(workflow.id)
            .bind(slot.job_id)
            .bind(slot.success)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct WorkflowRow {
    workflow_id: Uuid,
    system_ingestion_job_id: Option<Uuid>,
    system_ingestion_success: Option<bool>,
    reconciliation_job_id: Option<Uuid>,
    status: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BankJobRow {
    job_id: Uuid,
    success: Option<bool>,
}

impl WorkflowRow {
    fn into_workflow(self, slot_rows: Vec<BankJobRow>) -> Workflow {
        Workflow {
            id: self.workflow_id,
            system_job_id: self.system_ingestion_job_id,
            system_job_success: self.system_ingestion_success,
            bank_jobs: slot_rows
                .into_iter()
                .map(|r| BankJobSlot {
                    job_id: r.job_id,
                    success: r.success,
                })
                .collect(),
            reconciliation_job_id: self.reconciliation_job_id,
            status: parse_status(&self.status),
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
