//! `FieldValue`: conversion between entity field types and `sea_query::Value`.
//!
//! Coercion rules applied when reading a value into a field:
//! - integers widen freely and narrow only when the value fits
//! - integers widen into `f32`/`f64`; `f64` narrows into `f32`
//! - integer `0`/`1` reads as `bool` (SQLite and MySQL store booleans as integers)
//! - text parses into dates and timestamps (SQLite stores them as text)
//! - strings are never trimmed
//! - NULL is accepted only by `Option<T>` fields

use chrono::{NaiveDate, NaiveDateTime};
use sea_query::Value;

use super::{describe, is_null, ColumnType};
use crate::error::CoercionError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Rust types that can be stored in an entity field.
///
/// Implemented for the supported scalar types and for `Option<T>` (the
/// nullable form). The `Entity` derive uses `COLUMN_TYPE` and `NULLABLE` to
/// describe each column.
pub trait FieldValue: Sized {
    /// Declared database type for a column holding this field
    const COLUMN_TYPE: ColumnType;
    /// Whether the column accepts NULL
    const NULLABLE: bool = false;

    /// The field's value, or `None` when the field is null
    fn to_value(&self) -> Option<Value>;

    /// Coerce a database value into this field type
    fn from_value(value: Value) -> Result<Self, CoercionError>;
}

fn mismatch(expected: &'static str, value: &Value) -> CoercionError {
    CoercionError::TypeMismatch {
        expected,
        actual: describe(value),
    }
}

fn unparsable(expected: &'static str, text: &str) -> CoercionError {
    CoercionError::TypeMismatch {
        expected,
        actual: format!("String({text:?})"),
    }
}

fn out_of_range(target: &'static str, value: impl ToString) -> CoercionError {
    CoercionError::OutOfRange {
        target,
        value: value.to_string(),
    }
}

/// Read any integer variant as `i64`.
fn integer(value: &Value, target: &'static str) -> Result<i64, CoercionError> {
    match value {
        Value::TinyInt(Some(v)) => Ok(i64::from(*v)),
        Value::SmallInt(Some(v)) => Ok(i64::from(*v)),
        Value::Int(Some(v)) => Ok(i64::from(*v)),
        Value::BigInt(Some(v)) => Ok(*v),
        Value::TinyUnsigned(Some(v)) => Ok(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => Ok(i64::from(*v)),
        Value::Unsigned(Some(v)) => Ok(i64::from(*v)),
        Value::BigUnsigned(Some(v)) => i64::try_from(*v).map_err(|_| out_of_range(target, v)),
        other if is_null(other) => Err(CoercionError::UnexpectedNull),
        other => Err(mismatch(target, other)),
    }
}

macro_rules! impl_integer_field {
    ($type:ty, $column_type:expr, $name:expr) => {
        impl FieldValue for $type {
            const COLUMN_TYPE: ColumnType = $column_type;

            fn to_value(&self) -> Option<Value> {
                Some(Value::from(*self))
            }

            fn from_value(value: Value) -> Result<Self, CoercionError> {
                let wide = integer(&value, $name)?;
                <$type>::try_from(wide).map_err(|_| out_of_range($name, wide))
            }
        }
    };
}

impl_integer_field!(i16, ColumnType::SmallInteger, "i16");
impl_integer_field!(i32, ColumnType::Integer, "i32");
impl_integer_field!(i64, ColumnType::BigInteger, "i64");

impl FieldValue for f64 {
    const COLUMN_TYPE: ColumnType = ColumnType::Double;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Float(Some(v)) => Ok(f64::from(v)),
            Value::Double(Some(v)) => Ok(v),
            other => integer(&other, "f64").map(|v| v as f64),
        }
    }
}

impl FieldValue for f32 {
    const COLUMN_TYPE: ColumnType = ColumnType::Float;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Float(Some(v)) => Ok(v),
            Value::Double(Some(v)) => {
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(out_of_range("f32", v));
                }
                Ok(v as f32)
            }
            other => integer(&other, "f32").map(|v| v as f32),
        }
    }
}

impl FieldValue for bool {
    const COLUMN_TYPE: ColumnType = ColumnType::Boolean;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Bool(Some(v)) => Ok(v),
            other => match integer(&other, "bool")? {
                0 => Ok(false),
                1 => Ok(true),
                n => Err(out_of_range("bool", n)),
            },
        }
    }
}

impl FieldValue for String {
    const COLUMN_TYPE: ColumnType = ColumnType::Text;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::String(Some(s)) => Ok(s.to_string()),
            Value::Char(Some(c)) => Ok(c.to_string()),
            other if is_null(&other) => Err(CoercionError::UnexpectedNull),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FieldValue for Vec<u8> {
    const COLUMN_TYPE: ColumnType = ColumnType::Binary;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Bytes(Some(b)) => Ok(b.to_vec()),
            other if is_null(&other) => Err(CoercionError::UnexpectedNull),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }
}

impl FieldValue for NaiveDate {
    const COLUMN_TYPE: ColumnType = ColumnType::Date;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::ChronoDate(Some(d)) => Ok(*d),
            Value::String(Some(s)) => {
                NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| unparsable("NaiveDate", &s))
            }
            other if is_null(&other) => Err(CoercionError::UnexpectedNull),
            other => Err(mismatch("NaiveDate", &other)),
        }
    }
}

impl FieldValue for NaiveDateTime {
    const COLUMN_TYPE: ColumnType = ColumnType::Timestamp;

    fn to_value(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::ChronoDateTime(Some(d)) => Ok(*d),
            Value::String(Some(s)) => TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&s, format).ok())
                .ok_or_else(|| unparsable("NaiveDateTime", &s)),
            other if is_null(&other) => Err(CoercionError::UnexpectedNull),
            other => Err(mismatch("NaiveDateTime", &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const COLUMN_TYPE: ColumnType = T::COLUMN_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        if is_null(&value) {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

/// Render a timestamp the way text-typed drivers store it.
pub(crate) fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMATS[0]).to_string()
}

/// Render a date the way text-typed drivers store it.
pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(Value::Int(Some(7))), Ok(7));
        assert_eq!(i32::from_value(Value::BigInt(Some(7))), Ok(7));
        assert_eq!(
            i16::from_value(Value::BigInt(Some(70_000))),
            Err(CoercionError::OutOfRange {
                target: "i16",
                value: "70000".to_string()
            })
        );
    }

    #[test]
    fn test_null_only_into_option() {
        assert_eq!(i32::from_value(Value::Int(None)), Err(CoercionError::UnexpectedNull));
        assert_eq!(Option::<i32>::from_value(Value::Int(None)), Ok(None));
        assert_eq!(Option::<i32>::from_value(Value::String(None)), Ok(None));
        assert_eq!(Option::<i32>::from_value(Value::BigInt(Some(3))), Ok(Some(3)));
    }

    #[test]
    fn test_string_not_trimmed() {
        let value = Value::from("  padded  ".to_string());
        assert_eq!(String::from_value(value), Ok("  padded  ".to_string()));
    }

    #[test]
    fn test_string_does_not_coerce_from_number() {
        assert!(matches!(
            String::from_value(Value::Int(Some(1))),
            Err(CoercionError::TypeMismatch { expected: "String", .. })
        ));
    }

    #[test]
    fn test_float_coercions() {
        assert_eq!(f64::from_value(Value::Int(Some(2))), Ok(2.0));
        assert_eq!(f64::from_value(Value::Float(Some(1.5))), Ok(1.5));
        assert_eq!(f32::from_value(Value::Double(Some(0.25))), Ok(0.25));
        assert!(f32::from_value(Value::Double(Some(1e300))).is_err());
    }

    #[test]
    fn test_bool_from_integer() {
        assert_eq!(bool::from_value(Value::BigInt(Some(1))), Ok(true));
        assert_eq!(bool::from_value(Value::BigInt(Some(0))), Ok(false));
        assert!(bool::from_value(Value::BigInt(Some(2))).is_err());
    }

    #[test]
    fn test_timestamp_from_text() {
        let parsed = NaiveDateTime::from_value(Value::from("2024-03-01 10:20:30".to_string()));
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(10, 20, 30));
        assert_eq!(parsed.ok(), expected);

        let date = NaiveDate::from_value(Value::from("2024-03-01".to_string()));
        assert_eq!(date.ok(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_option_to_value() {
        assert_eq!(Some(5i32).to_value(), Some(Value::Int(Some(5))));
        assert_eq!(Option::<i32>::None.to_value(), None);
        assert!(Option::<String>::NULLABLE);
        assert!(!String::NULLABLE);
        assert_eq!(Option::<i64>::COLUMN_TYPE, ColumnType::BigInteger);
    }
}
