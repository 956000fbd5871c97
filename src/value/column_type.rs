//! Declared database column types.
//!
//! A `ColumnType` is inferred from the entity field type (through
//! `FieldValue::COLUMN_TYPE`) or set with `#[column_type = "..."]`. It is used
//! to normalize bound parameters, to type NULL parameters, and to render DDL
//! through `sea_query::ColumnDef`.

use chrono::{NaiveDate, NaiveDateTime};
use sea_query::{ColumnDef, Value};

use super::{is_null, FieldValue};
use crate::error::CoercionError;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    SmallInteger,
    Integer,
    BigInteger,
    Float,
    Double,
    Text,
    Binary,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Parse a column type name as written in `#[column_type = "..."]`.
    ///
    /// Accepts SQL names and Rust type names, case-insensitively:
    /// - "Integer" / "int" / "i32" → `Integer`
    /// - "BigInt" / "i64" → `BigInteger`
    /// - "String" / "Text" / "varchar" → `Text`
    /// - "Timestamp" / "DateTime" → `Timestamp`
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let column_type = match lower.as_str() {
            "boolean" | "bool" => ColumnType::Boolean,
            "smallint" | "i16" | "small_integer" => ColumnType::SmallInteger,
            "integer" | "int" | "i32" => ColumnType::Integer,
            "bigint" | "i64" | "big_integer" => ColumnType::BigInteger,
            "float" | "f32" | "real" => ColumnType::Float,
            "double" | "f64" | "double_precision" => ColumnType::Double,
            "string" | "text" | "varchar" | "char" => ColumnType::Text,
            "binary" | "bytes" | "bytea" | "blob" => ColumnType::Binary,
            "date" => ColumnType::Date,
            "timestamp" | "datetime" => ColumnType::Timestamp,
            _ => return None,
        };
        Some(column_type)
    }

    /// Canonical SQL-ish name, used in logs and errors
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::SmallInteger => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInteger => "BIGINT",
            ColumnType::Float => "REAL",
            ColumnType::Double => "DOUBLE",
            ColumnType::Text => "VARCHAR",
            ColumnType::Binary => "BLOB",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// The column type a value of this variant would be stored in.
    pub fn of_value(value: &Value) -> Option<Self> {
        let column_type = match value {
            Value::Bool(_) => ColumnType::Boolean,
            Value::TinyInt(_) | Value::SmallInt(_) | Value::TinyUnsigned(_) => ColumnType::SmallInteger,
            Value::Int(_) | Value::SmallUnsigned(_) => ColumnType::Integer,
            Value::BigInt(_) | Value::Unsigned(_) | Value::BigUnsigned(_) => ColumnType::BigInteger,
            Value::Float(_) => ColumnType::Float,
            Value::Double(_) => ColumnType::Double,
            Value::String(_) | Value::Char(_) => ColumnType::Text,
            Value::Bytes(_) => ColumnType::Binary,
            Value::ChronoDate(_) => ColumnType::Date,
            Value::ChronoDateTime(_) => ColumnType::Timestamp,
            _ => return None,
        };
        Some(column_type)
    }

    /// A NULL typed for this column, so strict drivers bind it correctly.
    pub fn null_value(self) -> Value {
        match self {
            ColumnType::Boolean => Value::Bool(None),
            ColumnType::SmallInteger => Value::SmallInt(None),
            ColumnType::Integer => Value::Int(None),
            ColumnType::BigInteger => Value::BigInt(None),
            ColumnType::Float => Value::Float(None),
            ColumnType::Double => Value::Double(None),
            ColumnType::Text => Value::String(None),
            ColumnType::Binary => Value::Bytes(None),
            ColumnType::Date => Value::ChronoDate(None),
            ColumnType::Timestamp => Value::ChronoDateTime(None),
        }
    }

    /// Coerce a parameter value to the variant matching this column type.
    pub fn normalize(self, value: Value) -> Result<Value, CoercionError> {
        if is_null(&value) {
            return Ok(self.null_value());
        }
        let normalized = match self {
            ColumnType::Boolean => Value::from(bool::from_value(value)?),
            ColumnType::SmallInteger => Value::from(i16::from_value(value)?),
            ColumnType::Integer => Value::from(i32::from_value(value)?),
            ColumnType::BigInteger => Value::from(i64::from_value(value)?),
            ColumnType::Float => Value::from(f32::from_value(value)?),
            ColumnType::Double => Value::from(f64::from_value(value)?),
            ColumnType::Text => Value::from(String::from_value(value)?),
            ColumnType::Binary => Value::from(Vec::<u8>::from_value(value)?),
            ColumnType::Date => Value::from(NaiveDate::from_value(value)?),
            ColumnType::Timestamp => Value::from(NaiveDateTime::from_value(value)?),
        };
        Ok(normalized)
    }

    /// Configure a `sea_query` column definition for this type.
    pub(crate) fn apply(self, def: &mut ColumnDef) {
        match self {
            ColumnType::Boolean => {
                def.boolean();
            }
            ColumnType::SmallInteger => {
                def.small_integer();
            }
            ColumnType::Integer => {
                def.integer();
            }
            ColumnType::BigInteger => {
                def.big_integer();
            }
            ColumnType::Float => {
                def.float();
            }
            ColumnType::Double => {
                def.double();
            }
            ColumnType::Text => {
                def.string();
            }
            ColumnType::Binary => {
                def.blob();
            }
            ColumnType::Date => {
                def.date();
            }
            ColumnType::Timestamp => {
                def.timestamp();
            }
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
