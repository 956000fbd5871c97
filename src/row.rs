//! Result rows read from a session.

use std::sync::Arc;

use sea_query::Value;

/// One result row: column labels and their values, in select order.
///
/// Rows of the same result share their label list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `label`: exact match first, then ignoring ASCII case.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == label)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(label)))
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.index_of(label).and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Labels paired with values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns: Arc<[String]> = vec!["ID".to_string(), "name".to_string()].into();
        Row::new(columns, vec![Value::BigInt(Some(1)), Value::from("a".to_string())])
    }

    #[test]
    fn test_get_exact_then_case_insensitive() {
        let row = row();
        assert_eq!(row.get("ID"), Some(&Value::BigInt(Some(1))));
        assert_eq!(row.get("id"), Some(&Value::BigInt(Some(1))));
        assert_eq!(row.get("NAME"), Some(&Value::from("a".to_string())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_exact_label_wins() {
        let columns: Arc<[String]> = vec!["value".to_string(), "VALUE".to_string()].into();
        let row = Row::new(columns, vec![Value::Int(Some(1)), Value::Int(Some(2))]);
        assert_eq!(row.index_of("VALUE"), Some(1));
        assert_eq!(row.index_of("Value"), Some(0));
    }

    #[test]
    fn test_iter_pairs() {
        let row = row();
        let labels: Vec<&str> = row.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["ID", "name"]);
    }
}
