//! The ingestion worker (§4.2): streams one object-store file through a
//! synchronous `csv::Reader` bridged onto its `AsyncRead`, dispatches
//! each record through the parser registry, and batches rows of 1000
//! into transactional store flushes.

mod error;

use std::sync::Arc;

use object_store::ObjectStore;
use reconcile_domain::{BankStatement, FileKind, IngestionJob, JobStatus, SystemTransaction};
use reconcile_parsers::{get_parser, ParsedRecord};
use reconcile_store::{IngestionJobStore, TransactionStore};
use tokio_util::io::SyncIoBridge;
use uuid::Uuid;

pub use error::IngestError;

/// Rows are flushed to the store once a batch reaches this size (§4.2
/// step 4).
pub const BATCH_SIZE: usize = 1000;

/// Streams and persists a single [`IngestionJob`]'s file, backed by any
/// store implementing both the job and transaction sides.
pub struct IngestionWorker<S> {
    store: Arc<S>,
    objects: Arc<dyn ObjectStore>,
}

impl<S> IngestionWorker<S>
where
    S: IngestionJobStore + TransactionStore,
{
    pub fn new(store: Arc<S>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    #[tracing::instrument(skip(self), fields(job_id = %job_id))]
    pub async fn process(&self, job_id: Uuid) -> Result<(), IngestError> {
        let job = self.store.get(job_id).await?;

        let Some(parser) = get_parser(job.file_kind) else {
            tracing::warn!(file_kind = ?job.file_kind, "no parser registered for file kind");
            let _ = self.store.update_progress(job_id, 0, JobStatus::Failed).await;
            return Err(IngestError::NoParser(job.file_kind));
        };

        let reader = match reconcile_storage::open_reader(self.objects.as_ref(), &job.source_file).await {
            Ok(reader) => reader,
            Err(err) => {
                let _ = self.store.update_progress(job_id, 0, JobStatus::Failed).await;
                return Err(err.into());
            }
        };
        let sync_reader = SyncIoBridge::new(reader);

        let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<String>>(256);
        let parse_task = tokio::task::spawn_blocking(move || -> Result<(), csv::Error> {
            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(sync_reader);
            for record in csv_reader.records() {
                let record = record?;
                let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
                if tx.blocking_send(fields).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let mut lines_processed: u64 = 0;
        let result = self.drain(job_id, parser, &mut rx, &mut lines_processed).await;

        match parse_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = self
                    .store
                    .update_progress(job_id, lines_processed, JobStatus::Failed)
                    .await;
                return Err(err.into());
            }
            Err(join_err) => {
                let _ = self
                    .store
                    .update_progress(job_id, lines_processed, JobStatus::Failed)
                    .await;
                return Err(join_err.into());
            }
        }

        result
    }

    async fn drain(
        &self,
        job_id: Uuid,
        parser: &'static dyn reconcile_parsers::LineParser,
        rx: &mut tokio::sync::mpsc::Receiver<Vec<String>>,
        lines_processed: &mut u64,
    ) -> Result<(), IngestError> {
        let mut system_batch: Vec<SystemTransaction> = Vec::new();
        let mut bank_batch: Vec<BankStatement> = Vec::new();

        while let Some(fields) = rx.recv().await {
            *lines_processed += 1;
            match parser.parse_line(&fields) {
                Ok(ParsedRecord::SystemTx(row)) => system_batch.push(row),
                Ok(ParsedRecord::BankStmt(row)) => bank_batch.push(row),
                Err(err) => {
                    tracing::warn!(error = %err, job_id = %job_id, "skipping unparseable row");
                }
            }

            if system_batch.len() >= BATCH_SIZE {
                self.flush_system(job_id, &mut system_batch, *lines_processed).await?;
                if let Err(err) = self
                    .store
                    .update_progress(job_id, *lines_processed, JobStatus::InProgress)
                    .await
                {
                    tracing::warn!(error = %err, job_id = %job_id, "progress update failed");
                }
            }
            if bank_batch.len() >= BATCH_SIZE {
                self.flush_bank(job_id, &mut bank_batch, *lines_processed).await?;
                if let Err(err) = self
                    .store
                    .update_progress(job_id, *lines_processed, JobStatus::InProgress)
                    .await
                {
                    tracing::warn!(error = %err, job_id = %job_id, "progress update failed");
                }
            }
        }

        if let Err(err) = self.flush_system(job_id, &mut system_batch, *lines_processed).await {
            return Err(err);
        }
        if let Err(err) = self.flush_bank(job_id, &mut bank_batch, *lines_processed).await {
            return Err(err);
        }

        self.store
            .update_progress(job_id, *lines_processed, JobStatus::Completed)
            .await?;
        Ok(())
    }

    async fn flush_system(
        &self,
        job_id: Uuid,
        batch: &mut Vec<SystemTransaction>,
        lines_processed: u64,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.store.batch_insert_system_tx(batch).await {
            let _ = self
                .store
                .update_progress(job_id, lines_processed, JobStatus::Failed)
                .await;
            return Err(err.into());
        }
        batch.clear();
        Ok(())
    }

    async fn flush_bank(
        &self,
        job_id: Uuid,
        batch: &mut Vec<BankStatement>,
        lines_processed: u64,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.store.batch_insert_bank_stmts(batch).await {
            let _ = self
                .store
                .update_progress(job_id, lines_processed, JobStatus::Failed)
                .await;
            return Err(err.into());
        }
        batch.clear();
        Ok(())
    }
}
