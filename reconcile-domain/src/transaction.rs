use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::TransactionType;

/// An internal system transaction. `amount` is always non-negative; the
/// sign lives in `tx_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTransaction {
    pub id: Option<i64>,
    pub trx_id: String,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub transaction_time: DateTime<Utc>,
}

impl SystemTransaction {
    pub fn new(
        trx_id: impl Into<String>,
        amount: Decimal,
        tx_type: TransactionType,
        transaction_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            trx_id: trx_id.into(),
            amount,
            tx_type,
            transaction_time,
        }
    }

    /// The signed amount a matching bank statement is expected to carry:
    /// positive for a credit, negative for a debit.
    pub fn expected_signed_amount(&self) -> Decimal {
        match self.tx_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }
}
