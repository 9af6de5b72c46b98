use std::collections::HashMap;
use std::sync::LazyLock;

use reconcile_domain::{BankStatement, FileKind, SystemTransaction};

use crate::bank_statement::BankStatementParser;
use crate::error::ParseError;
use crate::system_tx::SystemTxParser;

/// The typed value produced by a line parser, tagged by which side of the
/// reconciliation it belongs to. Replaces the original's dynamic-type
/// dispatch with a plain sum type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    SystemTx(SystemTransaction),
    BankStmt(BankStatement),
}

/// A stateless, thread-safe capability that turns one CSV record's fields
/// into a typed domain value.
pub trait LineParser: Send + Sync {
    fn parse_line(&self, fields: &[String]) -> Result<ParsedRecord, ParseError>;
}

static REGISTRY: LazyLock<HashMap<FileKind, &'static dyn LineParser>> = LazyLock::new(|| {
    let mut map: HashMap<FileKind, &'static dyn LineParser> = HashMap::new();
    map.insert(FileKind::SystemTx, &SystemTxParser as &'static dyn LineParser);
    map.insert(FileKind::BankStmt, &BankStatementParser as &'static dyn LineParser);
    map
});

/// Resolve the registered parser for a file kind. Both recognized kinds
/// are always registered at process start; `None` is reachable only if a
/// future file kind is added to the domain model without a parser.
pub fn get_parser(kind: FileKind) -> Option<&'static dyn LineParser> {
    REGISTRY.get(&kind).copied()
}
