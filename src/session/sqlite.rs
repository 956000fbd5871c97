//! SQLite sessions through `rusqlite`.
//!
//! SQLite has no boolean or date types: booleans bind as 0/1 and dates and
//! timestamps bind as ISO-8601 text. The mapper coerces them back when rows
//! are read into entities.

use std::path::Path;
use std::sync::Arc;

use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use sea_query::Value;

use super::{Session, SessionError};
use crate::alias::ColumnAliasStrategy;
use crate::dialect::Dialect;
use crate::row::Row;
use crate::value::{self, is_null};

/// A single SQLite connection
pub struct SqliteSession {
    conn: Option<Connection>,
    alias_strategy: ColumnAliasStrategy,
}

impl SqliteSession {
    pub fn open_in_memory() -> Result<Self, SessionError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Some(conn),
            alias_strategy: ColumnAliasStrategy::default(),
        }
    }

    pub fn with_alias_strategy(mut self, strategy: ColumnAliasStrategy) -> Self {
        self.alias_strategy = strategy;
        self
    }

    fn conn(&self) -> Result<&Connection, SessionError> {
        self.conn.as_ref().ok_or(SessionError::Closed)
    }
}

fn to_sqlite(value: &Value) -> Result<SqliteValue, SessionError> {
    if is_null(value) {
        return Ok(SqliteValue::Null);
    }
    let converted = match value {
        Value::Bool(Some(b)) => SqliteValue::Integer(i64::from(*b)),
        Value::TinyInt(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::SmallInt(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::Int(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::BigInt(Some(v)) => SqliteValue::Integer(*v),
        Value::TinyUnsigned(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::Unsigned(Some(v)) => SqliteValue::Integer(i64::from(*v)),
        Value::BigUnsigned(Some(v)) => SqliteValue::Integer(
            i64::try_from(*v).map_err(|_| SessionError::UnsupportedValue(format!("{v} exceeds i64")))?,
        ),
        Value::Float(Some(v)) => SqliteValue::Real(f64::from(*v)),
        Value::Double(Some(v)) => SqliteValue::Real(*v),
        Value::String(Some(s)) => SqliteValue::Text(s.to_string()),
        Value::Char(Some(c)) => SqliteValue::Text(c.to_string()),
        Value::Bytes(Some(b)) => SqliteValue::Blob(b.to_vec()),
        Value::ChronoDate(Some(d)) => SqliteValue::Text(crate::value::format_date(d)),
        Value::ChronoDateTime(Some(t)) => SqliteValue::Text(crate::value::format_timestamp(t)),
        Value::ChronoTime(Some(t)) => SqliteValue::Text(t.format("%H:%M:%S%.f").to_string()),
        other => return Err(SessionError::UnsupportedValue(format!("{other:?}"))),
    };
    Ok(converted)
}

fn from_sqlite(value: ValueRef<'_>, label: &str) -> Result<Value, SessionError> {
    let converted = match value {
        ValueRef::Null => value::null(),
        ValueRef::Integer(v) => Value::BigInt(Some(v)),
        ValueRef::Real(v) => Value::Double(Some(v)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SessionError::Other(format!("column `{label}` is not UTF-8: {e}")))?;
            Value::from(text.to_string())
        }
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    };
    Ok(converted)
}

fn convert_params(params: &[Value]) -> Result<Vec<SqliteValue>, SessionError> {
    params.iter().map(to_sqlite).collect()
}

impl Session for SqliteSession {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn alias_strategy(&self) -> ColumnAliasStrategy {
        self.alias_strategy
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, SessionError> {
        let params = convert_params(params)?;
        let affected = self.conn()?.execute(sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SessionError> {
        let params = convert_params(params)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = stmt.query(params_from_iter(params))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for (i, label) in columns.iter().enumerate() {
                values.push(from_sqlite(row.get_ref(i)?, label)?);
            }
            result.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(result)
    }

    fn last_insert_id(&mut self) -> Result<Option<Value>, SessionError> {
        let id = self.conn()?.last_insert_rowid();
        Ok((id != 0).then_some(Value::BigInt(Some(id))))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| SessionError::from(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session() -> SqliteSession {
        let mut session = SqliteSession::open_in_memory().expect("open sqlite");
        session
            .execute("CREATE TABLE T (A INTEGER, B TEXT, C REAL, D BLOB)", &[])
            .expect("create table");
        session
    }

    #[test]
    fn test_execute_and_query() {
        let mut session = session();
        let inserted = session
            .execute(
                "INSERT INTO T (A, B, C, D) VALUES (?, ?, ?, ?)",
                &[
                    Value::Int(Some(1)),
                    Value::from("x".to_string()),
                    Value::Double(Some(1.5)),
                    Value::from(vec![1u8, 2]),
                ],
            )
            .expect("insert");
        assert_eq!(inserted, 1);
        assert_eq!(session.last_insert_id().expect("rowid"), Some(Value::BigInt(Some(1))));

        let rows = session.query("SELECT A, B, C, D FROM T", &[]).expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("A"), Some(&Value::BigInt(Some(1))));
        assert_eq!(rows[0].get("B"), Some(&Value::from("x".to_string())));
        assert_eq!(rows[0].get("C"), Some(&Value::Double(Some(1.5))));
        assert_eq!(rows[0].get("D"), Some(&Value::from(vec![1u8, 2])));
    }

    #[test]
    fn test_nulls_and_conversions() {
        let mut session = session();
        session
            .execute(
                "INSERT INTO T (A, B) VALUES (?, ?)",
                &[Value::Bool(Some(true)), Value::Int(None)],
            )
            .expect("insert");
        let rows = session.query("SELECT A, B FROM T", &[]).expect("select");
        assert_eq!(rows[0].get("A"), Some(&Value::BigInt(Some(1))));
        assert!(is_null(rows[0].get("B").expect("column B")));
    }

    #[test]
    fn test_dates_bind_as_text() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
        assert_eq!(
            to_sqlite(&Value::from(date)).expect("convert"),
            SqliteValue::Text("2024-02-29".to_string())
        );
    }

    #[test]
    fn test_closed_session() {
        let mut session = session();
        session.close().expect("close");
        assert!(matches!(session.execute("SELECT 1", &[]), Err(SessionError::Closed)));
        assert!(session.close().is_ok());
    }

    #[test]
    fn test_transaction_rollback() {
        let mut session = session();
        session.begin().expect("begin");
        session
            .execute("INSERT INTO T (A) VALUES (?)", &[Value::Int(Some(5))])
            .expect("insert");
        session.rollback().expect("rollback");
        let rows = session.query("SELECT COUNT(*) FROM T", &[]).expect("count");
        assert_eq!(rows[0].get_index(0), Some(&Value::BigInt(Some(0))));
    }
}
