//! Identity values for lookups by key.

use sea_query::Value;

/// Values for an entity's identity columns, in declaration order.
///
/// Single keys convert from the common scalar types; composite keys use
/// [`KeyValue::composite`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    values: Vec<Value>,
}

impl KeyValue {
    pub fn single(value: impl Into<Value>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    pub fn composite(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}

macro_rules! key_from {
    ($($type:ty),*) => {
        $(
            impl From<$type> for KeyValue {
                fn from(value: $type) -> Self {
                    KeyValue::single(value)
                }
            }
        )*
    };
}

key_from!(i16, i32, i64, String, &str);

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::single(value)
    }
}

impl From<Vec<Value>> for KeyValue {
    fn from(values: Vec<Value>) -> Self {
        KeyValue::composite(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(KeyValue::from(5i64).values(), [Value::BigInt(Some(5))]);
        assert_eq!(KeyValue::from(5).values(), [Value::Int(Some(5))]);
        assert_eq!(KeyValue::from("k").values(), [Value::from("k")]);
    }

    #[test]
    fn test_composite() {
        let key = KeyValue::composite(vec![Value::Int(Some(1)), Value::Int(Some(2))]);
        assert_eq!(key.len(), 2);
        assert!(!key.is_empty());
    }
}
