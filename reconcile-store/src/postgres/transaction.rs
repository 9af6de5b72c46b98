use async_trait::async_trait;
use chrono::NaiveDate;
use reconcile_domain::{BankStatement, SystemTransaction, TransactionType};

use crate::error::StoreError;
use crate::traits::TransactionStore;

use super::PgStore;

#[async_trait]
impl TransactionStore for PgStore {
    async fn batch_insert_system_tx(&self, rows: &[SystemTransaction]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            let tx_type = match row.tx_type {
                TransactionType::Debit => "DEBIT",
                TransactionType::Credit => "CREDIT",
            };
            sqlx::query(
                r#"
                INSERT INTO system_transactions (trx_id, amount, trx_type, transaction_time, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                ON CONFLICT (trx_id) DO NOTHING
                "#,
            )
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

    async fn batch_insert_bank_stmts(&self, rows: &[BankStatement]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO bank_statements (unique_id, amount, statement_time, bank_code, hash_code, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                ON CONFLICT (hash_code) DO NOTHING
                "#,
            )
            .bind(&row.unique_id)
            .bind(row.amount)
            .bind(row.statement_time)
            .bind(&row.bank_code)
            .bind(&row.hash_code)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_system_tx_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SystemTransaction>, StoreError> {
        let rows = sqlx::query_as::<_, SystemTxRow>(
            r#"
            SELECT id, trx_id, amount, trx_type, transaction_time
            FROM system_transactions
            WHERE transaction_time::date BETWEEN $1 AND $2
            ORDER BY transaction_time ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_bank_stmts_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BankStatement>, StoreError> {
        let rows = sqlx::query_as::<_, BankStmtRow>(
            r#"
            SELECT id, unique_id, amount, statement_time, bank_code, hash_code
            FROM bank_statements
            WHERE statement_time BETWEEN $1 AND $2
            ORDER BY statement_time ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct SystemTxRow {
    id: i64,
    trx_id: String,
    amount: rust_decimal::Decimal,
    trx_type: String,
    transaction_time: chrono::DateTime<chrono::Utc>,
}

impl From<SystemTxRow> for SystemTransaction {
    fn from(row: SystemTxRow) -> Self {
        SystemTransaction {
            id: Some(row.id),
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
struct BankStmtRow {
    id: i64,
    unique_id: String,
    amount: rust_decimal::Decimal,
    statement_time: NaiveDate,
    bank_code: String,
    hash_code: String,
}

impl From<BankStmtRow> for BankStatement {
    fn from(row: BankStmtRow) -> Self {
        BankStatement {
            id: Some(row.id),
            unique_id: row.unique_id,
            amount: row.amount,
            statement_time: row.statement_time,
            bank_code: row.bank_code,
            hash_code: row.hash_code,
        }
    }
}
