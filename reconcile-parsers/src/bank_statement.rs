use chrono::NaiveDate;
use reconcile_domain::BankStatement;
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::registry::{LineParser, ParsedRecord};

const REQUIRED_FIELDS: usize = 4;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses `[uniqueID, signedAmount, "YYYY-MM-DD", bankCode]` rows from a
/// bank statement export (§4.1).
pub struct BankStatementParser;

impl LineParser for BankStatementParser {
    fn parse_line(&self, fields: &[String]) -> Result<ParsedRecord, ParseError> {
        if fields.len() < REQUIRED_FIELDS {
            return Err(ParseError::TooFewFields {
                found: fields.len(),
                required: REQUIRED_FIELDS,
            });
        }

        let unique_id = fields[0].trim().to_string();

        let amount: Decimal = fields[1]
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidAmount(fields[1].clone()))?;

        let raw_date = fields[2].trim();
        let statement_time = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|_| ParseError::InvalidDate(fields[2].clone()))?;

        let bank_code = fields[3].trim().to_string();

        Ok(ParsedRecord::BankStmt(BankStatement::new(
            unique_id,
            amount,
            statement_time,
            bank_code,
        )))
    }
}
