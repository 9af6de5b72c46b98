use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reconcile_domain::{
    MatchedRecord, ReconciliationJob, ReconciliationResult, TransactionType, UnmatchedBankTx,
    UnmatchedSystemTx,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::ReconciliationStore;

use super::PgStore;

#[async_trait]
impl ReconciliationStore for PgStore {
    async fn create_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_jobs (job_id, start_date, end_date, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            "#,
        )
        .bind(job.id)
        .bind(job.start_date)
        .bind(job.end_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_result(&self, result: &ReconciliationResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_results
                (job_id, total_system_tx_count, total_bank_tx_count, matched_count,
                 unmatched_system_count, unmatched_bank_count, total_discrepancies,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            "#,
        )
        .bind(result.job_id)
        .bind(result.total_system as i64)
        .bind(result.total_bank as i64)
        .bind(result.matched as i64)
        .bind(result.unmatched_system as i64)
        .bind(result.unmatched_bank as i64)
        .bind(result.total_discrepancies)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_matched_record(&self, record: &MatchedRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_matched_records
                (job_id, system_tx_id, bank_statement_id, discrepancy, matched_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(record.job_id)
        .bind(record.system_tx_id)
        .bind(record.bank_statement_id)
        .bind(record.discrepancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_unmatched_system_tx(&self, rows: &[UnmatchedSystemTx]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            let tx_type = match row.tx_type {
                TransactionType::Debit => "DEBIT",
                TransactionType::Credit => "CREDIT",
            };
            sqlx::query(
                r#"
                INSERT INTO reconciliation_unmatched_system_tx
                    (job_id, trx_id, amount, trx_type, transaction_time, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                "#,
            )
            .bind(row.job_id)
            .bind(&row.trx_id)
            .bind(row.amount)
            .bind(tx_type)
            .bind(row.transaction_time)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn store_unmatched_bank_tx(&self, rows: &[UnmatchedBankTx]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO reconciliation_unmatched_bank_tx
                    (job_id, unique_id, amount, statement_time, bank_code, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                "#,
            )
            .bind(row.job_id)
            .bind(&row.unique_id)
            .bind(row.amount)
            .bind(row.statement_time)
            .bind(&row.bank_code)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_result(&self, job_id: Uuid) -> Result<Option<ReconciliationResult>, StoreError> {
        let row = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT job_id, total_system_tx_count, total_bank_tx_count, matched_count,
                   unmatched_system_count, unmatched_bank_count, total_discrepancies
            FROM reconciliation_results
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_unmatched_system_tx(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UnmatchedSystemTx>, StoreError> {
        let rows = sqlx::query_as::<_, UnmatchedSystemTxRow>(
            r#"
            SELECT job_id, trx_id, amount, trx_type, transaction_time
            FROM reconciliation_unmatched_system_tx
            WHERE job_id = $1
            ORDER BY transaction_time ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_unmatched_bank_tx_grouped_by_bank(
        &self,
        job_id: Uuid,
    ) -> Result<BTreeMap<String, Vec<UnmatchedBankTx>>, StoreError> {
        let rows = sqlx::query_as::<_, UnmatchedBankTxRow>(
            r#"
            SELECT job_id, unique_id, amount, statement_time, bank_code
            FROM reconciliation_unmatched_bank_tx
            WHERE job_id = $1
            ORDER BY bank_code ASC, statement_time ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<String, Vec<UnmatchedBankTx>> = BTreeMap::new();
        for row in rows {
            let tx: UnmatchedBankTx = row.into();
            grouped.entry(tx.bank_code.clone()).or_default().push(tx);
        }
        Ok(grouped)
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    job_id: Uuid,
    total_system_tx_count: i64,
    total_bank_tx_count: i64,
    matched_count: i64,
    unmatched_system_count: i64,
    unmatched_bank_count: i64,
    total_discrepancies: rust_decimal::Decimal,
}

impl From<ResultRow> for ReconciliationResult {
    fn from(row: ResultRow) -> Self {
        ReconciliationResult {
            job_id: row.job_id,
            total_system: row.total_system_tx_count.max(0) as usize,
            total_bank: row.total_bank_tx_count.max(0) as usize,
            matched: row.matched_count.max(0) as usize,
            unmatched_system: row.unmatched_system_count.max(0) as usize,
            unmatched_bank: row.unmatched_bank_count.max(0) as usize,
            total_discrepancies: row.total_discrepancies,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UnmatchedSystemTxRow {
    job_id: Uuid,
    trx_id: String,
    amount: rust_decimal::Decimal,
    trx_type: String,
    transaction_time: DateTime<Utc>,
}

impl From<UnmatchedSystemTxRow> for UnmatchedSystemTx {
    fn from(row: UnmatchedSystemTxRow) -> Self {
        UnmatchedSystemTx {
            job_id: row.job_id,
            trx_id: row.trx_id,
            amount: row.amount,
            tx_type: if row.trx_type == "CREDIT" {
                TransactionType::Credit
            } else {
                TransactionType::Debit
            },
            transaction_time: row.transaction_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UnmatchedBankTxRow {
    job_id: Uuid,
    unique_id: String,
    amount: rust_decimal::Decimal,
    statement_time: NaiveDate,
    bank_code: String,
}

impl From<UnmatchedBankTxRow> for UnmatchedBankTx {
    fn from(row: UnmatchedBankTxRow) -> Self {
        UnmatchedBankTx {
            job_id: row.job_id,
            unique_id: row.unique_id,
            amount: row.amount,
            statement_time: row.statement_time,
            bank_code: row.bank_code,
        }
    }
}
