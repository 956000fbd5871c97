//! PostgreSQL sessions through `may_postgres`.
//!
//! Parameters are bound with their exact Rust type, NULLs included, so that
//! PostgreSQL's strict parameter typing accepts them. Generated keys come
//! back through `RETURNING`, not through this session.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use may_postgres::types::{ToSql, Type};
use may_postgres::Client;
use sea_query::Value;

use super::{Session, SessionError};
use crate::alias::ColumnAliasStrategy;
use crate::dialect::Dialect;
use crate::row::Row;

/// A single PostgreSQL connection
pub struct PostgresSession {
    client: Option<Client>,
    alias_strategy: ColumnAliasStrategy,
}

impl PostgresSession {
    /// Connect with a `postgres://` URL or a key-value connection string.
    pub fn connect(url: &str) -> Result<Self, SessionError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::acquire_connection_span().entered();

        let client = may_postgres::connect(url)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Some(client),
            alias_strategy: ColumnAliasStrategy::default(),
        }
    }

    pub fn with_alias_strategy(mut self, strategy: ColumnAliasStrategy) -> Self {
        self.alias_strategy = strategy;
        self
    }

    fn client(&self) -> Result<&Client, SessionError> {
        self.client.as_ref().ok_or(SessionError::Closed)
    }
}

/// Convert `sea_query` values into owned `ToSql` parameters, then run `f`
/// with references to them.
fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, SessionError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, SessionError>,
{
    let mut owned: Vec<Box<dyn ToSql>> = Vec::with_capacity(values.len());
    for value in values {
        let param: Box<dyn ToSql> = match value {
            Value::Bool(v) => Box::new(*v),
            Value::TinyInt(v) => Box::new(v.map(i16::from)),
            Value::SmallInt(v) => Box::new(*v),
            Value::Int(v) => Box::new(*v),
            Value::BigInt(v) => Box::new(*v),
            Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
            Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
            Value::Unsigned(v) => Box::new(v.map(i64::from)),
            Value::BigUnsigned(v) => {
                let converted = v
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|_| SessionError::UnsupportedValue(format!("{value:?} exceeds i64")))?;
                Box::new(converted)
            }
            Value::Float(v) => Box::new(*v),
            Value::Double(v) => Box::new(*v),
            Value::String(v) => Box::new(v.as_ref().map(|s| s.to_string())),
            Value::Char(v) => Box::new(v.map(|c| c.to_string())),
            Value::Bytes(v) => Box::new(v.as_ref().map(|b| b.to_vec())),
            Value::ChronoDate(v) => Box::new(v.as_ref().map(|d| **d)),
            Value::ChronoTime(v) => Box::new(v.as_ref().map(|t| **t)),
            Value::ChronoDateTime(v) => Box::new(v.as_ref().map(|t| **t)),
            other => return Err(SessionError::UnsupportedValue(format!("{other:?}"))),
        };
        owned.push(param);
    }
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();
    f(&params)
}

fn read_cell(row: &may_postgres::Row, index: usize, ty: &Type) -> Result<Value, SessionError> {
    let value = if *ty == Type::BOOL {
        Value::Bool(row.try_get::<_, Option<bool>>(index)?)
    } else if *ty == Type::INT2 {
        Value::SmallInt(row.try_get::<_, Option<i16>>(index)?)
    } else if *ty == Type::INT4 {
        Value::Int(row.try_get::<_, Option<i32>>(index)?)
    } else if *ty == Type::INT8 {
        Value::BigInt(row.try_get::<_, Option<i64>>(index)?)
    } else if *ty == Type::FLOAT4 {
        Value::Float(row.try_get::<_, Option<f32>>(index)?)
    } else if *ty == Type::FLOAT8 {
        Value::Double(row.try_get::<_, Option<f64>>(index)?)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        Value::String(row.try_get::<_, Option<String>>(index)?.map(Box::new))
    } else if *ty == Type::BYTEA {
        Value::Bytes(row.try_get::<_, Option<Vec<u8>>>(index)?.map(Box::new))
    } else if *ty == Type::DATE {
        Value::ChronoDate(row.try_get::<_, Option<NaiveDate>>(index)?.map(Box::new))
    } else if *ty == Type::TIME {
        Value::ChronoTime(row.try_get::<_, Option<NaiveTime>>(index)?.map(Box::new))
    } else if *ty == Type::TIMESTAMP {
        Value::ChronoDateTime(row.try_get::<_, Option<NaiveDateTime>>(index)?.map(Box::new))
    } else {
        return Err(SessionError::UnsupportedValue(format!(
            "column {index} has unsupported type {ty}"
        )));
    };
    Ok(value)
}

fn convert_rows(rows: Vec<may_postgres::Row>) -> Result<Vec<Row>, SessionError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let types: Vec<Type> = first.columns().iter().map(|c| c.type_().clone()).collect();

    rows.iter()
        .map(|row| {
            let values = types
                .iter()
                .enumerate()
                .map(|(i, ty)| read_cell(row, i, ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

impl Session for PostgresSession {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn alias_strategy(&self) -> ColumnAliasStrategy {
        self.alias_strategy
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, SessionError> {
        let client = self.client()?;
        with_converted_params(params, |params| Ok(client.execute(sql, params)?))
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SessionError> {
        let client = self.client()?;
        let rows = with_converted_params(params, |params| Ok(client.query(sql, params)?))?;
        convert_rows(rows)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.client.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_every_supported_value() {
        let values = vec![
            Value::Bool(Some(true)),
            Value::Int(None),
            Value::BigInt(Some(7)),
            Value::from("x".to_string()),
            Value::String(None),
            Value::from(vec![1u8]),
        ];
        let count = with_converted_params(&values, |params| Ok(params.len())).expect("convert");
        assert_eq!(count, values.len());
    }

    #[test]
    fn test_rejects_oversized_unsigned() {
        let values = vec![Value::BigUnsigned(Some(u64::MAX))];
        assert!(matches!(
            with_converted_params(&values, |_| Ok(())),
            Err(SessionError::UnsupportedValue(_))
        ));
    }
}
