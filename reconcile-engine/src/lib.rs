//! The reconciliation engine (§4.4): buckets bank statements by
//! `(date, signed amount)`, pairs each system transaction against the
//! first bucket candidate scoring at least [`MATCH_THRESHOLD`], and
//! persists matched/unmatched rows plus the summary through a store that
//! implements both [`TransactionStore`] and [`ReconciliationStore`].

mod error;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use reconcile_domain::{
    BankStatement, MatchedRecord, ReconciliationJob, ReconciliationResult, ReconciliationSummary,
    SystemTransaction, UnmatchedBankTx, UnmatchedSystemTx,
};
use reconcile_store::{ReconciliationStore, TransactionStore};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use error::EngineError;

/// Minimum [`score`] for a system transaction to be paired with a bank
/// statement candidate.
pub const MATCH_THRESHOLD: u8 = 2;

/// A system transaction paired with the bank statement it was matched
/// against, and the absolute discrepancy between their amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub system_tx: SystemTransaction,
    pub bank_stmt: BankStatement,
    pub discrepancy: Decimal,
}

/// The result of one in-memory matching pass (§4.4.1), before any
/// persistence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPair>,
    pub unmatched_system: Vec<SystemTransaction>,
    pub unmatched_bank: Vec<BankStatement>,
    pub total_discrepancies: Decimal,
}

fn bucket_key(date: NaiveDate, amount: Decimal) -> String {
    format!("{}|{:.2}", date.format("%Y%m%d"), amount)
}

/// §4.4.2: 0-3, +1 per matching date/amount/trxID-substring component.
/// Within a single bucket the date and amount components are always
/// satisfied (both t and b were keyed on the same `(date, amount)`
/// pair), so the substring check is what actually discriminates between
/// same-bucket candidates.
pub fn score(t: &SystemTransaction, b: &BankStatement) -> u8 {
    let mut total = 0u8;
    if t.transaction_time.date_naive() == b.statement_time {
        total += 1;
    }
    if t.amount.abs() == b.amount.abs() {
        total += 1;
    }
    if b.unique_id.contains(&t.trx_id) || t.trx_id.contains(&b.unique_id) {
        total += 1;
    }
    total
}

/// Runs the bucketed matching pass over already-loaded rows. Pure and
/// deterministic in input order (§4.4.1 "Determinism").
pub fn match_transactions(systems: &[SystemTransaction], banks: &[BankStatement]) -> MatchOutcome {
    let mut buckets: HashMap<String, Vec<BankStatement>> = HashMap::new();
    for b in banks {
        buckets
            .entry(bucket_key(b.statement_time, b.amount))
            .or_default()
            .push(b.clone());
    }

    let mut matched = Vec::new();
    let mut unmatched_system = Vec::new();
    let mut total_discrepancies = Decimal::ZERO;

    for t in systems {
        let key = bucket_key(t.transaction_time.date_naive(), t.expected_signed_amount());
        let pick = buckets
            .get_mut(&key)
            .and_then(|candidates| {
                let pos = candidates
                    .iter()
                    .position(|b| score(t, b) >= MATCH_THRESHOLD)?;
                Some(candidates.remove(pos))
            });

        match pick {
            Some(b) => {
                let discrepancy = (t.amount - b.amount).abs();
                total_discrepancies += discrepancy;
                matched.push(MatchedPair {
                    system_tx: t.clone(),
                    bank_stmt: b,
                    discrepancy,
                });
            }
            None => unmatched_system.push(t.clone()),
        }
    }

    let unmatched_bank: Vec<BankStatement> = buckets.into_values().flatten().collect();

    MatchOutcome {
        matched,
        unmatched_system,
        unmatched_bank,
        total_discrepancies,
    }
}

/// Loads, matches, and persists a reconciliation run (§4.4.4), backed by
/// any store that implements both the transaction read side and the
/// reconciliation write side.
pub struct ReconciliationEngine<S> {
    store: Arc<S>,
}

impl<S> ReconciliationEngine<S>
where
    S: TransactionStore + ReconciliationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(start = %start, end = %end))]
    pub async fn process(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReconciliationResult, EngineError> {
        if start > end {
            return Err(EngineError::InvalidDateRange { start, end });
        }

        let systems = self.store.find_system_tx_by_date_range(start, end).await?;
        let banks = self.store.find_bank_stmts_by_date_range(start, end).await?;
        let total_system = systems.len();
        let total_bank = banks.len();

        let outcome = match_transactions(&systems, &banks);

        let job = ReconciliationJob {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
        };
        self.store.create_job(&job).await?;

        for pair in &outcome.matched {
            let (Some(system_tx_id), Some(bank_statement_id)) =
                (pair.system_tx.id, pair.bank_stmt.id)
            else {
                continue;
            };
            self.store
                .store_matched_record(&MatchedRecord {
                    job_id: job.id,
                    system_tx_id,
                    bank_statement_id,
                    discrepancy: pair.discrepancy,
                })
                .await?;
        }

        if !outcome.unmatched_system.is_empty() {
            let rows: Vec<UnmatchedSystemTx> = outcome
                .unmatched_system
                .iter()
                .map(|t| UnmatchedSystemTx {
                    job_id: job.id,
                    trx_id: t.trx_id.clone(),
                    amount: t.amount,
                    tx_type: t.tx_type,
                    transaction_time: t.transaction_time,
                })
                .collect();
            self.store.store_unmatched_system_tx(&rows).await?;
        }

        if !outcome.unmatched_bank.is_empty() {
            let rows: Vec<UnmatchedBankTx> = outcome
                .unmatched_bank
                .iter()
                .map(|b| UnmatchedBankTx {
                    job_id: job.id,
                    unique_id: b.unique_id.clone(),
                    amount: b.amount,
                    statement_time: b.statement_time,
                    bank_code: b.bank_code.clone(),
                })
                .collect();
            self.store.store_unmatched_bank_tx(&rows).await?;
        }

        let result = ReconciliationResult {
            job_id: job.id,
            total_system,
            total_bank,
            matched: outcome.matched.len(),
            unmatched_system: outcome.unmatched_system.len(),
            unmatched_bank: outcome.unmatched_bank.len(),
            total_discrepancies: outcome.total_discrepancies,
        };
        self.store.store_result(&result).await?;

        Ok(result)
    }

    /// §4.6: the read-only status surface.
    pub async fn summary(&self, job_id: Uuid) -> Result<Option<ReconciliationSummary>, EngineError> {
        let Some(result) = self.store.get_result(job_id).await? else {
            return Ok(None);
        };
        let unmatched_system = self.store.get_unmatched_system_tx(job_id).await?;
        let unmatched_bank = self
            .store
            .get_unmatched_bank_tx_grouped_by_bank(job_id)
            .await?;

        Ok(Some(ReconciliationSummary {
            total_transactions_processed: result.total_system + result.total_bank,
            total_matched_transactions: result.matched,
            total_unmatched_transactions: result.unmatched_system + result.unmatched_bank,
            unmatched_system_transactions: unmatched_system,
            unmatched_bank_transactions_by_bank: unmatched_bank,
            total_discrepancies: result.total_discrepancies,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use reconcile_domain::TransactionType;
    use reconcile_store::InMemoryStore;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s)
            .single()
            .expect("valid datetime")
    }

    fn sys_tx(
        id: i64,
        trx_id: &str,
        amount: Decimal,
        tx_type: TransactionType,
        time: DateTime<Utc>,
    ) -> SystemTransaction {
        let mut tx = SystemTransaction::new(trx_id, amount, tx_type, time);
        tx.id = Some(id);
        tx
    }

    fn bank_stmt(id: i64, unique_id: &str, amount: Decimal, date: NaiveDate, bank: &str) -> BankStatement {
        let mut stmt = BankStatement::new(unique_id, amount, date, bank);
        stmt.id = Some(id);
        stmt
    }

    // Scenario 1: perfect match.
    #[test]
    fn perfect_match() {
        let systems = vec![sys_tx(
            1,
            "TX1001",
            dec!(100.00),
            TransactionType::Credit,
            datetime(2021, 1, 1, 9, 0, 0),
        )];
        let banks = vec![bank_stmt(1, "TX1001", dec!(100.00), date(2021, 1, 1), "BCA")];

        let outcome = match_transactions(&systems, &banks);
        assert_eq!(outcome.matched.len(), 1);
        assert!(outcome.unmatched_system.is_empty());
        assert!(outcome.unmatched_bank.is_empty());
        assert_eq!(outcome.total_discrepancies, dec!(0.00));
    }

    // Scenario 2: debit sign match.
    #[test]
    fn debit_sign_match() {
        let systems = vec![sys_tx(
            1,
            "TX1",
            dec!(50.00),
            TransactionType::Debit,
            datetime(2021, 1, 2, 9, 0, 0),
        )];
        let banks = vec![bank_stmt(1, "TX1", dec!(-50.00), date(2021, 1, 2), "BCA")];

        let outcome = match_transactions(&systems, &banks);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.total_discrepancies, dec!(0.00));
    }

    // Scenario 3: different date, same amount ⇒ different bucket ⇒ unmatched.
    #[test]
    fn amount_mismatch_across_different_dates_stays_unmatched() {
        let systems = vec![sys_tx(
            1,
            "TX1",
            dec!(100.00),
            TransactionType::Credit,
            datetime(2021, 1, 3, 9, 0, 0),
        )];
        let banks = vec![bank_stmt(1, "TX1", dec!(100.00), date(2021, 1, 4), "BCA")];

        let outcome = match_transactions(&systems, &banks);
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched_system.len(), 1);
        assert_eq!(outcome.unmatched_bank.len(), 1);
    }

    // Scenario 4: same-bucket matches always carry zero discrepancy.
    #[test]
    fn same_bucket_matches_have_zero_discrepancy() {
        let systems = vec![sys_tx(
            1,
            "TX1",
            dec!(75.50),
            TransactionType::Credit,
            datetime(2021, 1, 5, 9, 0, 0),
        )];
        let banks = vec![bank_stmt(1, "TX1", dec!(75.50), date(2021, 1, 5), "BCA")];

        let outcome = match_transactions(&systems, &banks);
        assert_eq!(outcome.total_discrepancies, dec!(0.00));
    }

    // Scenario 5 belongs to BankStatement::hash_code dedup, covered in
    // reconcile-domain; the engine sees only already-deduped rows.

    #[test]
    fn first_candidate_in_bucket_wins_and_is_removed() {
        let systems = vec![sys_tx(
            1,
            "TX-A",
            dec!(10.00),
            TransactionType::Credit,
            datetime(2021, 2, 1, 9, 0, 0),
        )];
        let banks = vec![
            bank_stmt(1, "TX-A-first", dec!(10.00), date(2021, 2, 1), "BCA"),
            bank_stmt(2, "TX-A-second", dec!(10.00), date(2021, 2, 1), "BCA"),
        ];

        let outcome = match_transactions(&systems, &banks);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].bank_stmt.id, Some(1));
        assert_eq!(outcome.unmatched_bank.len(), 1);
        assert_eq!(outcome.unmatched_bank[0].id, Some(2));
    }

    #[test]
    fn empty_system_side_leaves_all_bank_rows_unmatched() {
        let banks = vec![bank_stmt(1, "TX1", dec!(10.00), date(2021, 1, 1), "BCA")];
        let outcome = match_transactions(&[], &banks);
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched_bank.len(), 1);
    }

    #[tokio::test]
    async fn process_persists_matched_and_unmatched_rows() {
        let store = Arc::new(InMemoryStore::new());
        store
            .batch_insert_system_tx(&[SystemTransaction::new(
                "TX1001",
                dec!(100.00),
                TransactionType::Credit,
                datetime(2021, 1, 1, 9, 0, 0),
            )])
            .await
            .expect("seed system tx");
        store
            .batch_insert_bank_stmts(&[BankStatement::new(
                "TX1001",
                dec!(100.00),
                date(2021, 1, 1),
                "BCA",
            )])
            .await
            .expect("seed bank stmt");

        let engine = ReconciliationEngine::new(Arc::clone(&store));
        let result = engine
            .process(date(2021, 1, 1), date(2021, 1, 1))
            .await
            .expect("process");

        assert_eq!(result.matched, 1);
        assert_eq!(result.unmatched_system, 0);
        assert_eq!(result.unmatched_bank, 0);
        assert_eq!(result.total_discrepancies, dec!(0.00));

        let summary = engine
            .summary(result.job_id)
            .await
            .expect("summary")
            .expect("summary present");
        assert_eq!(summary.total_matched_transactions, 1);
    }

    #[tokio::test]
    async fn process_rejects_inverted_date_range() {
        let store = Arc::new(InMemoryStore::new());
        let engine = ReconciliationEngine::new(store);
        let err = engine
            .process(date(2021, 2, 1), date(2021, 1, 1))
            .await
            .expect_err("inverted range");
        assert!(matches!(err, EngineError::InvalidDateRange { .. }));
    }
}
