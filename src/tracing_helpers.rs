//! Spans for statement execution, transactions and connection setup.
//!
//! Only compiled with the `tracing` feature. Callers enter the returned span
//! for the duration of the operation.

use tracing::{debug_span, info_span, Span};

use crate::query::StatementKind;

/// Span around one executed statement
pub fn execute_statement_span(kind: StatementKind, sql: &str) -> Span {
    info_span!("rowguard.execute", db.operation = kind.as_str(), db.statement = sql)
}

pub fn begin_transaction_span() -> Span {
    debug_span!("rowguard.transaction.begin")
}

pub fn commit_transaction_span() -> Span {
    debug_span!("rowguard.transaction.commit")
}

pub fn rollback_transaction_span() -> Span {
    debug_span!("rowguard.transaction.rollback")
}

/// Span around opening a database connection
pub fn acquire_connection_span() -> Span {
    info_span!("rowguard.connect")
}
