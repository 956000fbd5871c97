//! Values, declared column types and field coercion.
//!
//! `sea_query::Value` is the single value representation used for bound
//! parameters and for row cells. [`FieldValue`] converts entity field types to
//! and from it; [`ColumnType`] is the declared database type of a column.

mod column_type;
mod field;

pub use column_type::ColumnType;
pub use field::FieldValue;
pub(crate) use field::{format_date, format_timestamp};

use sea_query::Value;

/// Untyped NULL, used for cells read back from drivers that carry no type for NULL.
pub(crate) fn null() -> Value {
    Value::String(None)
}

/// Whether a value is SQL NULL, whatever variant it is typed as.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
    )
}

/// Short description of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_any_variant() {
        assert!(is_null(&Value::Int(None)));
        assert!(is_null(&Value::String(None)));
        assert!(is_null(&null()));
        assert!(!is_null(&Value::Int(Some(0))));
        assert!(!is_null(&Value::from(String::new())));
    }
}
