use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::TransactionType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationJob {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub job_id: Uuid,
    pub system_tx_id: i64,
    pub bank_statement_id: i64,
    pub discrepancy: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedSystemTx {
    pub job_id: Uuid,
    pub trx_id: String,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub transaction_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedBankTx {
    pub job_id: Uuid,
    pub unique_id: String,
    pub amount: Decimal,
    pub statement_time: NaiveDate,
    pub bank_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub job_id: Uuid,
    pub total_system: usize,
    pub total_bank: usize,
    pub matched: usize,
    pub unmatched_system: usize,
    pub unmatched_bank: usize,
    pub total_discrepancies: Decimal,
}

/// The read-side aggregation returned by the status surface (§4.6),
/// already shaped to match the HTTP response JSON in §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_transactions_processed: usize,
    pub total_matched_transactions: usize,
    pub total_unmatched_transactions: usize,
    pub unmatched_system_transactions: Vec<UnmatchedSystemTx>,
    pub unmatched_bank_transactions_by_bank: BTreeMap<String, Vec<UnmatchedBankTx>>,
    pub total_discrepancies: Decimal,
}
