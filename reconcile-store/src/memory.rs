use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use reconcile_domain::{
    BankStatement, IngestionJob, JobStatus, MatchedRecord, ReconciliationJob,
    ReconciliationResult, SystemTransaction, UnmatchedBankTx, UnmatchedSystemTx, Workflow,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::{IngestionJobStore, ReconciliationStore, TransactionStore, WorkflowStore};

/// A process-local store backed by `RwLock<HashMap<..>>`, used for tests
/// and the default dev profile. Mirrors the in-memory/Postgres-behind-a-
/// feature split the teacher already uses for its reconciliation store.
#[derive(Default)]
pub struct InMemoryStore {
    workflows: RwLock<HashMap<Uuid, Workflow>>,
    ingestion_jobs: RwLock<HashMap<Uuid, IngestionJob>>,
    system_tx: RwLock<HashMap<String, SystemTransaction>>,
    bank_stmts: RwLock<HashMap<String, BankStatement>>,
    reconciliation_jobs: RwLock<HashMap<Uuid, ReconciliationJob>>,
    reconciliation_results: RwLock<HashMap<Uuid, ReconciliationResult>>,
    matched_records: RwLock<Vec<MatchedRecord>>,
    unmatched_system: RwLock<Vec<UnmatchedSystemTx>>,
    unmatched_bank: RwLock<Vec<UnmatchedBankTx>>,
    next_system_id: AtomicI64,
    next_bank_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn create(&self, workflow: &Workflow) -> Result<(), StoreError> {
        self.workflows
            .write()
            .await
            .insert(workflow.id, workflow.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Workflow, StoreError> {
        self.workflows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "workflow",
                id: id.to_string(),
            })
    }

    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let mut guard = self.workflows.write().await;
        if !guard.contains_key(&workflow.id) {
            return Err(StoreError::NotFound {
                entity: "workflow",
                id: workflow.id.to_string(),
            });
        }
        guard.insert(workflow.id, workflow.clone());
        Ok(())
    }
}

#[async_trait]
impl IngestionJobStore for InMemoryStore {
    async fn create(&self, job: &IngestionJob) -> Result<(), StoreError> {
        self.ingestion_jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<IngestionJob, StoreError> {
        self.ingestion_jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "ingestion_job",
                id: id.to_string(),
            })
    }

    async fn update_progress(
        &self,
        id: Uuid,
        lines_processed: u64,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        let mut guard = self.ingestion_jobs.write().await;
        let job = guard.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "ingestion_job",
            id: id.to_string(),
        })?;
        job.lines_processed = lines_processed;
        job.status = status;
        job.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn batch_insert_system_tx(&self, rows: &[SystemTransaction]) -> Result<(), StoreError> {
        let mut guard = self.system_tx.write().await;
        for row in rows {
            if guard.contains_key(&row.trx_id) {
                continue;
            }
            let mut row = row.clone();
            row.id = Some(self.next_system_id.fetch_add(1, Ordering::SeqCst) + 1);
            guard.insert(row.trx_id.clone(), row);
        }
        Ok(())
    }

    async fn batch_insert_bank_stmts(&self, rows: &[BankStatement]) -> Result<(), StoreError> {
        let mut guard = self.bank_stmts.write().await;
        for row in rows {
            if guard.contains_key(&row.hash_code) {
                continue;
            }
            let mut row = row.clone();
            row.id = Some(self.next_bank_id.fetch_add(1, Ordering::SeqCst) + 1);
            guard.insert(row.hash_code.clone(), row);
        }
        Ok(())
    }

    async fn find_system_tx_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SystemTransaction>, StoreError> {
        let guard = self.system_tx.read().await;
        let mut rows: Vec<SystemTransaction> = guard
            .values()
            .filter(|tx| {
                let day = tx.transaction_time.date_naive();
                day >= start && day <= end
            })
            .cloned()
            .collect();
        rows.sort_by_key(|tx| tx.transaction_time);
        Ok(rows)
    }

    async fn find_bank_stmts_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BankStatement>, StoreError> {
        let guard = self.bank_stmts.read().await;
        let mut rows: Vec<BankStatement> = guard
            .values()
            .filter(|stmt| stmt.statement_time >= start && stmt.statement_time <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|stmt| stmt.statement_time);
        Ok(rows)
    }
}

#[async_trait]
impl ReconciliationStore for InMemoryStore {
    async fn create_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        self.reconciliation_jobs.write().await.insert(job.id, *job);
        Ok(())
    }

    async fn store_result(&self, result: &ReconciliationResult) -> Result<(), StoreError> {
        self.reconciliation_results
            .write()
            .await
            .insert(result.job_id, result.clone());
        Ok(())
    }

    async fn store_matched_record(&self, record: &MatchedRecord) -> Result<(), StoreError> {
        self.matched_records.write().await.push(record.clone());
        Ok(())
    }

    async fn store_unmatched_system_tx(&self, rows: &[UnmatchedSystemTx]) -> Result<(), StoreError> {
        self.unmatched_system
            .write()
            .await
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn store_unmatched_bank_tx(&self, rows: &[UnmatchedBankTx]) -> Result<(), StoreError> {
        self.unmatched_bank.write().await.extend(rows.iter().cloned());
        Ok(())
    }

    async fn get_result(&self, job_id: Uuid) -> Result<Option<ReconciliationResult>, StoreError> {
        Ok(self.reconciliation_results.read().await.get(&job_id).cloned())
    }

    async fn get_unmatched_system_tx(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UnmatchedSystemTx>, StoreError> {
        let guard = self.unmatched_system.read().await;
        let mut rows: Vec<UnmatchedSystemTx> = guard
            .iter()
            .filter(|tx| tx.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|tx| tx.transaction_time);
        Ok(rows)
    }

    async fn get_unmatched_bank_tx_grouped_by_bank(
        &self,
        job_id: Uuid,
    ) -> Result<BTreeMap<String, Vec<UnmatchedBankTx>>, StoreError> {
        let guard = self.unmatched_bank.read().await;
        let mut rows: Vec<UnmatchedBankTx> = guard
            .iter()
            .filter(|tx| tx.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.bank_code
                .cmp(&b.bank_code)
                .then(a.statement_time.cmp(&b.statement_time))
        });
        let mut grouped: BTreeMap<String, Vec<UnmatchedBankTx>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.bank_code.clone()).or_default().push(row);
        }
        Ok(grouped)
    }
}
