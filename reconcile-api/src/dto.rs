use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reconcile_domain::{
    ReconciliationSummary, TransactionType, UnmatchedBankTx, UnmatchedSystemTx, Workflow,
    WorkflowStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// §6 `POST /<prefix>/v1/workflow` request body.
#[derive(Debug, Deserialize)]
pub struct StartWorkflowRequest {
    pub system_transaction_file_path: String,
    pub bank_statement_file_paths: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StartWorkflowResponse {
    pub workflow_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UnmatchedSystemTxDto {
    pub trx_id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub transaction_time: DateTime<Utc>,
}

impl From<UnmatchedSystemTx> for UnmatchedSystemTxDto {
    fn from(row: UnmatchedSystemTx) -> Self {
        Self {
            trx_id: row.trx_id,
            amount: row.amount,
            tx_type: row.tx_type,
            transaction_time: row.transaction_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnmatchedBankTxDto {
    pub unique_id: String,
    pub amount: Decimal,
    pub statement_time: chrono::NaiveDate,
    pub bank_code: String,
}

impl From<UnmatchedBankTx> for UnmatchedBankTxDto {
    fn from(row: UnmatchedBankTx) -> Self {
        Self {
            unique_id: row.unique_id,
            amount: row.amount,
            statement_time: row.statement_time,
            bank_code: row.bank_code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconciliationSummaryDto {
    pub total_transactions_processed: usize,
    pub total_matched_transactions: usize,
    pub total_unmatched_transactions: usize,
    pub unmatched_system_transactions: Vec<UnmatchedSystemTxDto>,
    pub unmatched_bank_transactions_by_bank: BTreeMap<String, Vec<UnmatchedBankTxDto>>,
    pub total_discrepancies: Decimal,
}

impl From<ReconciliationSummary> for ReconciliationSummaryDto {
    fn from(summary: ReconciliationSummary) -> Self {
        Self {
            total_transactions_processed: summary.total_transactions_processed,
            total_matched_transactions: summary.total_matched_transactions,
            total_unmatched_transactions: summary.total_unmatched_transactions,
            unmatched_system_transactions: summary
                .unmatched_system_transactions
                .into_iter()
                .map(Into::into)
                .collect(),
            unmatched_bank_transactions_by_bank: summary
                .unmatched_bank_transactions_by_bank
                .into_iter()
                .map(|(bank, rows)| (bank, rows.into_iter().map(Into::into).collect()))
                .collect(),
            total_discrepancies: summary.total_discrepancies,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub workflow_id: Uuid,
    pub status: WorkflowStatus,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reconciliation_summary: Option<ReconciliationSummaryDto>,
}

impl WorkflowResponse {
    pub fn new(workflow: Workflow, summary: Option<ReconciliationSummary>) -> Self {
        Self {
            workflow_id: workflow.id,
            status: workflow.status,
            start_date: workflow.start_date,
            end_date: workflow.end_date,
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
            reconciliation_summary: summary.map(Into::into),
        }
    }
}
