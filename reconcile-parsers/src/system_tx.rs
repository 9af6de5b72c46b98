use chrono::{DateTime, NaiveDateTime, Utc};
use reconcile_domain::{SystemTransaction, TransactionType};
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::registry::{LineParser, ParsedRecord};

const REQUIRED_FIELDS: usize = 4;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses `[trxID, amount, type, "YYYY-MM-DD HH:MM:SS"]` rows from the
/// system-transaction export (§4.1).
pub struct SystemTxParser;

impl LineParser for SystemTxParser {
    fn parse_line(&self, fields: &[String]) -> Result<ParsedRecord, ParseError> {
        if fields.len() < REQUIRED_FIELDS {
            return Err(ParseError::TooFewFields {
                found: fields.len(),
                required: REQUIRED_FIELDS,
            });
        }

        let trx_id = fields[0].trim().to_string();

        let amount: Decimal = fields[1]
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidAmount(fields[1].clone()))?;

        let tx_type = match fields[2].trim().to_uppercase().as_str() {
            "CREDIT" => TransactionType::Credit,
            "DEBIT" => TransactionType::Debit,
            _ => return Err(ParseError::InvalidType(fields[2].clone())),
        };

        let raw_timestamp = fields[3].trim();
        let naive = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseError::InvalidTimestamp(fields[3].clone()))?;
        let transaction_time: DateTime<Utc> = naive.and_utc();

        Ok(ParsedRecord::SystemTx(SystemTransaction::new(
            trx_id,
            amount,
            tx_type,
            transaction_time,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_a_credit_row() {
        let row = fields(&["TX1001", "100.00", "CREDIT", "2021-01-01 09:00:00"]);
        let parsed = SystemTxParser.parse_line(&row).expect("parses");
        match parsed {
            ParsedRecord::SystemTx(tx) => {
                assert_eq!(tx.trx_id, "TX1001");
                assert_eq!(tx.tx_type, TransactionType::Credit);
            }
            ParsedRecord::BankStmt(_) => panic!("expected system tx"),
        }
    }

    #[test]
    fn trims_whitespace_around_timestamp() {
        let row = fields(&["TX1", "50.00", "DEBIT", "  2021-01-02 10:30:00  "]);
        assert!(SystemTxParser.parse_line(&row).is_ok());
    }

    #[test]
    fn rejects_rows_with_too_few_fields() {
        let row = fields(&["TX1", "50.00", "DEBIT"]);
        assert_eq!(
            SystemTxParser.parse_line(&row),
            Err(ParseError::TooFewFields {
                found: 3,
                required: 4
            })
        );
    }

    #[test]
    fn rejects_unparseable_amount() {
        let row = fields(&["TX1", "not-a-number", "DEBIT", "2021-01-02 10:30:00"]);
        assert!(matches!(
            SystemTxParser.parse_line(&row),
            Err(ParseError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let row = fields(&["TX1", "50.00", "DEBIT", "not-a-date"]);
        assert!(matches!(
            SystemTxParser.parse_line(&row),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }
}
