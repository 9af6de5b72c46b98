use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reconcile_domain::{
    BankStatement, IngestionJob, MatchedRecord, ReconciliationJob, ReconciliationResult,
    SystemTransaction, UnmatchedBankTx, UnmatchedSystemTx, Workflow,
};
use uuid::Uuid;

use crate::error::StoreError;

/// `create`/`get`/`update` for the workflow record (§4.3).
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create(&self, workflow: &Workflow) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Workflow, StoreError>;
    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError>;
}

#[async_trait]
pub trait IngestionJobStore: Send + Sync {
    async fn create(&self, job: &IngestionJob) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<IngestionJob, StoreError>;
    async fn update_progress(
        &self,
        id: Uuid,
        lines_processed: u64,
        status: reconcile_domain::JobStatus,
    ) -> Result<(), StoreError>;
}

/// Batch-insert and date-range queries for transactions and statements
/// (§4.3). Batch inserts are idempotent upserts keyed per §3.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn batch_insert_system_tx(&self, rows: &[SystemTransaction]) -> Result<(), StoreError>;
    async fn batch_insert_bank_stmts(&self, rows: &[BankStatement]) -> Result<(), StoreError>;
    /// Inclusive range over the *date* component of `transactionTime`.
    async fn find_system_tx_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SystemTransaction>, StoreError>;
    async fn find_bank_stmts_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BankStatement>, StoreError>;
}

#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    async fn create_job(&self, job: &ReconciliationJob) -> Result<(), StoreError>;
    async fn store_result(&self, result: &ReconciliationResult) -> Result<(), StoreError>;
    async fn store_matched_record(&self, record: &MatchedRecord) -> Result<(), StoreError>;
    async fn store_unmatched_system_tx(&self, rows: &[UnmatchedSystemTx]) -> Result<(), StoreError>;
    async fn store_unmatched_bank_tx(&self, rows: &[UnmatchedBankTx]) -> Result<(), StoreError>;
    async fn get_result(&self, job_id: Uuid) -> Result<Option<ReconciliationResult>, StoreError>;
    async fn get_unmatched_system_tx(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UnmatchedSystemTx>, StoreError>;
    async fn get_unmatched_bank_tx_grouped_by_bank(
        &self,
        job_id: Uuid,
    ) -> Result<BTreeMap<String, Vec<UnmatchedBankTx>>, StoreError>;
}
