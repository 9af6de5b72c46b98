//! Shared domain types for the reconciliation workspace: the entities
//! described by the data model, their status enums, and the pure
//! `hashCode` derivation for bank statements.

mod error;
mod job;
mod reconciliation;
mod statement;
mod status;
mod transaction;
mod workflow;

pub use error::DomainError;
pub use job::IngestionJob;
pub use reconciliation::{
    MatchedRecord, ReconciliationJob, ReconciliationResult, ReconciliationSummary,
    UnmatchedBankTx, UnmatchedSystemTx,
};
pub use statement::{compute_hash_code, BankStatement};
pub use status::{FileKind, JobStatus, TransactionType, WorkflowStatus};
pub use transaction::SystemTransaction;
pub use workflow::{BankJobSlot, Workflow};
