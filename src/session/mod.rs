//! Sessions: one open connection the executor runs statements on.
//!
//! The engine never caches a session. Each execution borrows it mutably, so a
//! session runs one statement at a time and the generated key of an INSERT is
//! read on the same connection that ran it.

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSession;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSession;

use sea_query::Value;
use thiserror::Error;

use crate::alias::ColumnAliasStrategy;
use crate::dialect::Dialect;
use crate::row::Row;

/// Driver-level failure
#[derive(Debug, Error)]
pub enum SessionError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] may_postgres::Error),

    /// A parameter value the driver cannot bind
    #[error("unsupported parameter value: {0}")]
    UnsupportedValue(String),

    /// The session was closed
    #[error("session is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// An open database connection.
///
/// Parameters are positional and already rendered for [`dialect`](Session::dialect).
/// Results are fully buffered.
pub trait Session {
    fn dialect(&self) -> Dialect;

    /// Alias strategy for statements that do not set one
    fn alias_strategy(&self) -> ColumnAliasStrategy {
        ColumnAliasStrategy::default()
    }

    /// Run a statement that returns no rows; returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, SessionError>;

    /// Run a statement and read every row it returns.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SessionError>;

    /// Key generated by the last INSERT on this session, when the driver tracks one
    fn last_insert_id(&mut self) -> Result<Option<Value>, SessionError> {
        Ok(None)
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::begin_transaction_span().entered();
        self.execute("BEGIN", &[]).map(|_| ())
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::commit_transaction_span().entered();
        self.execute("COMMIT", &[]).map(|_| ())
    }

    fn rollback(&mut self) -> Result<(), SessionError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::rollback_transaction_span().entered();
        self.execute("ROLLBACK", &[]).map(|_| ())
    }

    /// Close the connection. Later calls fail with `SessionError::Closed`.
    fn close(&mut self) -> Result<(), SessionError>;
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn alias_strategy(&self) -> ColumnAliasStrategy {
        (**self).alias_strategy()
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, SessionError> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SessionError> {
        (**self).query(sql, params)
    }

    fn last_insert_id(&mut self) -> Result<Option<Value>, SessionError> {
        (**self).last_insert_id()
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), SessionError> {
        (**self).rollback()
    }

    fn close(&mut self) -> Result<(), SessionError> {
        (**self).close()
    }
}
