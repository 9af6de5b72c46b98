//! The workflow coordinator (§4.5): validates a reconciliation request,
//! stats every input file up front, fans ingestion out across one
//! `tokio::spawn`ed task per file via a `JoinSet`, and gates the
//! reconciliation engine behind all ingestion tasks succeeding. Workflow
//! state is mutated only under a single coordinator-wide mutex,
//! read-modify-write, per §5.

mod error;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use object_store::ObjectStore;
use reconcile_domain::{
    BankJobSlot, DomainError, FileKind, IngestionJob, ReconciliationSummary, Workflow,
    WorkflowStatus,
};
use reconcile_engine::ReconciliationEngine;
use reconcile_ingest::IngestionWorker;
use reconcile_store::{IngestionJobStore, ReconciliationStore, TransactionStore, WorkflowStore};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use uuid::Uuid;

pub use error::WorkflowError;

/// Coordinates one reconciliation workflow's ingestion fan-out and the
/// reconciliation gate, backed by any store implementing all four store
/// traits (mirrors `InMemoryStore`/`PgStore`).
pub struct WorkflowCoordinator<S> {
    store: Arc<S>,
    objects: Arc<dyn ObjectStore>,
    ingest: Arc<IngestionWorker<S>>,
    engine: ReconciliationEngine<S>,
    /// Serializes every workflow-record read-mutate-write (§5); never
    /// held across ingestion or reconciliation I/O.
    gate: Mutex<()>,
}

impl<S> WorkflowCoordinator<S>
where
    S: WorkflowStore + IngestionJobStore + TransactionStore + ReconciliationStore + 'static,
{
    pub fn new(store: Arc<S>, objects: Arc<dyn ObjectStore>) -> Self {
        let ingest = IngestionWorker::new(Arc::clone(&store), Arc::clone(&objects));
        let engine = ReconciliationEngine::new(Arc::clone(&store));
        Self {
            store,
            objects,
            ingest: Arc::new(ingest),
            engine,
            gate: Mutex::new(()),
        }
    }

    /// §4.5 start sequence. Returns only once every ingestion task has
    /// finished and the reconciliation gate has resolved (§9 Decision 2).
    pub async fn start_workflow(
        &self,
        system_file: String,
        bank_files: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Uuid, WorkflowError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end }.into());
        }
        if system_file.trim().is_empty() {
            return Err(DomainError::EmptyFilePath.into());
        }
        if bank_files.is_empty() {
            return Err(DomainError::NoBankFiles.into());
        }
        if bank_files.iter().any(|path| path.trim().is_empty()) {
            return Err(DomainError::EmptyFilePath.into());
        }

        let mut workflow = Workflow::new(start, end);

        let any_missing = {
            let mut missing = false;
            for path in std::iter::once(&system_file).chain(bank_files.iter()) {
                if reconcile_storage::stat(self.objects.as_ref(), path)
                    .await
                    .is_err()
                {
                    missing = true;
                    break;
                }
            }
            missing
        };

        if any_missing {
            workflow.status = WorkflowStatus::Failed;
            self.store.create(&workflow).await?;
            return Ok(workflow.id);
        }

        self.store.create(&workflow).await?;

        let system_job = IngestionJob::new(FileKind::SystemTx, system_file);
        self.store.create(&system_job).await?;

        let bank_jobs: Vec<IngestionJob> = bank_files
            .into_iter()
            .map(|path| IngestionJob::new(FileKind::BankStmt, path))
            .collect();
        for job in &bank_jobs {
            self.store.create(job).await?;
        }

        workflow.system_job_id = Some(system_job.id);
        workflow.bank_jobs = bank_jobs.iter().map(|job| BankJobSlot::new(job.id)).collect();
        self.store.update(&workflow).await?;

        let mut tasks: JoinSet<(FileKind, Uuid, bool)> = JoinSet::new();
        {
            let ingest = Arc::clone(&self.ingest);
            let job_id = system_job.id;
            tasks.spawn(async move {
                let success = ingest.process(job_id).await.is_ok();
                (FileKind::SystemTx, job_id, success)
            });
        }
        for job in &bank_jobs {
            let ingest = Arc::clone(&self.ingest);
            let job_id = job.id;
            tasks.spawn(async move {
                let success = ingest.process(job_id).await.is_ok();
                (FileKind::BankStmt, job_id, success)
            });
        }

        while let Some(outcome) = tasks.join_next().await {
            let Ok((kind, job_id, success)) = outcome else {
                // A task panicked rather than returning; its slot never
                // reports, so the gate stays open until an operator
                // intervenes. No ingestion row is silently marked done.
                continue;
            };
            match kind {
                FileKind::SystemTx => {
                    self.on_system_ingestion_complete(workflow.id, job_id, success)
                        .await?;
                }
                FileKind::BankStmt => {
                    self.on_bank_ingestion_complete(workflow.id, job_id, success)
                        .await?;
                }
            }
        }

        self.maybe_gate(workflow.id, start, end).await?;

        Ok(workflow.id)
    }

    pub async fn on_system_ingestion_complete(
        &self,
        workflow_id: Uuid,
        _job_id: Uuid,
        success: bool,
    ) -> Result<(), WorkflowError> {
        let _guard = self.gate.lock().await;
        let mut workflow = WorkflowStore::get(self.store.as_ref(), workflow_id).await?;
        workflow.system_job_success = Some(success);
        workflow.updated_at = Utc::now();
        self.store.update(&workflow).await?;
        Ok(())
    }

    pub async fn on_bank_ingestion_complete(
        &self,
        workflow_id: Uuid,
        job_id: Uuid,
        success: bool,
    ) -> Result<(), WorkflowError> {
        let _guard = self.gate.lock().await;
        let mut workflow = WorkflowStore::get(self.store.as_ref(), workflow_id).await?;
        if let Some(slot) = workflow.bank_slot_mut(job_id) {
            slot.success = Some(success);
        }
        workflow.updated_at = Utc::now();
        self.store.update(&workflow).await?;
        Ok(())
    }

    pub async fn on_reconciliation_complete(
        &self,
        workflow_id: Uuid,
        result: Result<Uuid, ()>,
    ) -> Result<(), WorkflowError> {
        let _guard = self.gate.lock().await;
        let mut workflow = WorkflowStore::get(self.store.as_ref(), workflow_id).await?;
        match result {
            Ok(job_id) => {
                workflow.reconciliation_job_id = Some(job_id);
                workflow.status = WorkflowStatus::Completed;
            }
            Err(()) => workflow.status = WorkflowStatus::Failed,
        }
        workflow.updated_at = Utc::now();
        self.store.update(&workflow).await?;
        Ok(())
    }

    /// Runs the §4.5 step-7 gate once every ingestion callback has fired.
    async fn maybe_gate(
        &self,
        workflow_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), WorkflowError> {
        let workflow = {
            let _guard = self.gate.lock().await;
            WorkflowStore::get(self.store.as_ref(), workflow_id).await?
        };

        if !workflow.ready_to_gate() {
            return Ok(());
        }

        if !workflow.ingestion_succeeded() {
            let _guard = self.gate.lock().await;
            let mut workflow = WorkflowStore::get(self.store.as_ref(), workflow_id).await?;
            workflow.status = WorkflowStatus::Failed;
            workflow.updated_at = Utc::now();
            self.store.update(&workflow).await?;
            return Ok(());
        }

        match self.engine.process(start, end).await {
            Ok(result) => {
                self.on_reconciliation_complete(workflow_id, Ok(result.job_id))
                    .await
            }
            Err(err) => {
                tracing::error!(error = %err, workflow_id = %workflow_id, "reconciliation failed");
                self.on_reconciliation_complete(workflow_id, Err(())).await
            }
        }
    }

    /// §4.6 status surface.
    pub async fn get_workflow_summary(
        &self,
        workflow_id: Uuid,
    ) -> Result<(Workflow, Option<ReconciliationSummary>), WorkflowError> {
        let workflow = WorkflowStore::get(self.store.as_ref(), workflow_id).await?;
        let summary = match workflow.reconciliation_job_id {
            Some(job_id) => self.engine.summary(job_id).await?,
            None => None,
        };
        Ok((workflow, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;
    use pretty_assertions::assert_eq;
    use reconcile_store::InMemoryStore;

    async fn put(objects: &dyn ObjectStore, name: &str, body: &str) {
        objects
            .put(&ObjectPath::from(name), Bytes::from(body.to_string()).into())
            .await
            .expect("put succeeds");
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[tokio::test]
    async fn end_to_end_workflow_completes_and_reconciles() {
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(
            objects.as_ref(),
            "system.csv",
            "trxID,amount,type,timestamp\nTX1001,100.00,CREDIT,2021-01-01 09:00:00\n",
        )
        .await;
        put(
            objects.as_ref(),
            "bank.csv",
            "uniqueID,amount,date,bankCode\nTX1001,100.00,2021-01-01,BCA\n",
        )
        .await;

        let store = Arc::new(InMemoryStore::new());
        let coordinator = WorkflowCoordinator::new(Arc::clone(&store), objects);

        let workflow_id = coordinator
            .start_workflow(
                "system.csv".to_string(),
                vec!["bank.csv".to_string()],
                date(2021, 1, 1),
                date(2021, 1, 1),
            )
            .await
            .expect("start_workflow succeeds");

        let (workflow, summary) = coordinator
            .get_workflow_summary(workflow_id)
            .await
            .expect("summary succeeds");

        assert_eq!(workflow.status, WorkflowStatus::Completed);
        let summary = summary.expect("reconciliation summary present");
        assert_eq!(summary.total_matched_transactions, 1);
        assert_eq!(summary.total_unmatched_transactions, 0);
    }

    // Scenario 6: a single bank-file ingestion failure fails the whole
    // workflow once both callbacks have fired, with no reconciliation
    // job created.
    #[tokio::test]
    async fn single_bank_ingestion_failure_fails_whole_workflow() {
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(
            objects.as_ref(),
            "system.csv",
            "trxID,amount,type,timestamp\nTX1,100.00,CREDIT,2021-01-01 09:00:00\n",
        )
        .await;
        put(
            objects.as_ref(),
            "bank-ok.csv",
            "uniqueID,amount,date,bankCode\nTX1,100.00,2021-01-01,BCA\n",
        )
        .await;
        // Unterminated quoted field: the csv crate surfaces this as a
        // read error, failing the ingestion job outright rather than
        // skipping a malformed row.
        put(objects.as_ref(), "bank-bad.csv", "uniqueID,amount,date,bankCode\n\"unterminated,100.00,2021-01-01,BCA\n").await;

        let store = Arc::new(InMemoryStore::new());
        let coordinator = WorkflowCoordinator::new(Arc::clone(&store), objects);

        let workflow_id = coordinator
            .start_workflow(
                "system.csv".to_string(),
                vec!["bank-ok.csv".to_string(), "bank-bad.csv".to_string()],
                date(2021, 1, 1),
                date(2021, 1, 1),
            )
            .await
            .expect("start_workflow succeeds");

        let (workflow, summary) = coordinator
            .get_workflow_summary(workflow_id)
            .await
            .expect("summary succeeds");

        assert_eq!(workflow.status, WorkflowStatus::Failed);
        assert!(workflow.reconciliation_job_id.is_none());
        assert!(summary.is_none());
    }

    #[tokio::test]
    async fn missing_file_fails_workflow_before_any_ingestion_job() {
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(
            objects.as_ref(),
            "system.csv",
            "trxID,amount,type,timestamp\n",
        )
        .await;
        // "missing.csv" is never put into the store.

        let store = Arc::new(InMemoryStore::new());
        let coordinator = WorkflowCoordinator::new(Arc::clone(&store), objects);

        let workflow_id = coordinator
            .start_workflow(
                "system.csv".to_string(),
                vec!["missing.csv".to_string()],
                date(2021, 1, 1),
                date(2021, 1, 1),
            )
            .await
            .expect("start_workflow succeeds");

        let (workflow, _summary) = coordinator
            .get_workflow_summary(workflow_id)
            .await
            .expect("summary succeeds");

        assert_eq!(workflow.status, WorkflowStatus::Failed);
        assert!(workflow.system_job_id.is_none());
        assert!(workflow.bank_jobs.is_empty());
    }

    #[tokio::test]
    async fn inverted_date_range_is_rejected_without_mutating_state() {
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let store = Arc::new(InMemoryStore::new());
        let coordinator = WorkflowCoordinator::new(store, objects);

        let err = coordinator
            .start_workflow(
                "system.csv".to_string(),
                vec!["bank.csv".to_string()],
                date(2021, 2, 1),
                date(2021, 1, 1),
            )
            .await
            .expect_err("inverted range rejected");
        assert!(matches!(
            err,
            WorkflowError::Validation(DomainError::InvalidDateRange { .. })
        ));
    }
}
