use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single bank-statement line. `amount` is signed: negative for a
/// debit, positive for a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    pub id: Option<i64>,
    pub unique_id: String,
    pub amount: Decimal,
    pub statement_time: NaiveDate,
    pub bank_code: String,
    pub hash_code: String,
}

impl BankStatement {
    pub fn new(
        unique_id: impl Into<String>,
        amount: Decimal,
        statement_time: NaiveDate,
        bank_code: impl Into<String>,
    ) -> Self {
        let unique_id = unique_id.into();
        let bank_code = bank_code.into();
        let hash_code = compute_hash_code(&unique_id, &bank_code, amount, statement_time);
        Self {
            id: None,
            unique_id,
            amount,
            statement_time,
            bank_code,
            hash_code,
        }
    }
}

/// `hashCode` = SHA-256 of `uniqueID|bankCode|amount(%.2f)|YYYY-MM-DD`, a
/// pure function of its four inputs used as the dedupe key for bank
/// statement inserts.
pub fn compute_hash_code(
    unique_id: &str,
    bank_code: &str,
    amount: Decimal,
    statement_time: NaiveDate,
) -> String {
    let joined = format!(
        "{unique_id}|{bank_code}|{amount:.2}|{}",
        statement_time.format("%Y-%m-%d")
    );
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn hash_code_is_pure_function_of_its_inputs() {
        let a = compute_hash_code("TX1001", "BCA", dec!(100.00), date(2021, 1, 1));
        let b = compute_hash_code("TX1001", "BCA", dec!(100.00), date(2021, 1, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn hash_code_changes_with_any_component() {
        let base = compute_hash_code("TX1001", "BCA", dec!(100.00), date(2021, 1, 1));
        let other_amount = compute_hash_code("TX1001", "BCA", dec!(100.01), date(2021, 1, 1));
        let other_bank = compute_hash_code("TX1001", "BNI", dec!(100.00), date(2021, 1, 1));
        let other_date = compute_hash_code("TX1001", "BCA", dec!(100.00), date(2021, 1, 2));
        assert!(base != other_amount);
        assert!(base != other_bank);
        assert!(base != other_date);
    }

    #[test]
    fn identical_fields_after_trimming_share_hash_code() {
        // The CSV reader trims surrounding whitespace from every field
        // before a row ever reaches this function, so two rows that
        // differ only in incidental whitespace hash identically.
        let first = BankStatement::new("TX1001", dec!(100.00), date(2021, 1, 1), "BCA");
        let repeated = BankStatement::new("TX1001", dec!(100.00), date(2021, 1, 1), "BCA");
        assert_eq!(first.hash_code, repeated.hash_code);

        // A uniqueID differing only in case is, by the literal %.2f/ YYYY-MM-DD
        // hash formula, a distinct hash input and therefore not deduped.
        let different_case =
            BankStatement::new("tx1001", dec!(100.00), date(2021, 1, 1), "BCA");
        assert!(first.hash_code != different_case.hash_code);
    }
}
