//! Error types shared by the registry, statement builders, executor and mapper.
//!
//! Metadata and statement-building errors are raised before anything reaches
//! the database. Driver failures surface as [`OomError::ExecutionFailure`]
//! with the statement kind and entity they belong to.

use crate::query::StatementKind;
use crate::session::SessionError;
use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum OomError {
    /// The entity type was never passed to `register`
    #[error("entity type `{entity}` is not registered")]
    UnregisteredEntity { entity: &'static str },

    /// The entity metadata cannot be turned into a descriptor
    #[error("entity `{entity}` is invalid: {reason}")]
    InvalidEntity { entity: String, reason: String },

    /// No column with this field or column name exists on the entity
    #[error("entity `{entity}` has no column named `{column}`")]
    UnknownColumn { entity: String, column: String },

    /// The statement needs an identity column and the entity declares none
    #[error("entity `{entity}` declares no identity column")]
    MissingIdentity { entity: String },

    /// Supplied key values do not match the identity column count
    #[error("entity `{entity}` has a {expected}-column key, got {actual} key value(s)")]
    KeyArityMismatch {
        entity: String,
        expected: usize,
        actual: usize,
    },

    /// A value could not be coerced to or from a column's declared type
    #[error("cannot map column alias `{alias}`: {source}")]
    ColumnMappingError {
        alias: String,
        #[source]
        source: CoercionError,
    },

    /// The executed statement did not yield a generated key
    #[error("{kind} on `{entity}` did not produce a generated key")]
    NoGeneratedKey { kind: StatementKind, entity: String },

    /// The database rejected or failed the statement
    #[error("{kind} on `{entity}` failed: {source}")]
    ExecutionFailure {
        kind: StatementKind,
        entity: String,
        #[source]
        source: SessionError,
    },

    /// A handle accessor was used for a result shape the statement does not have
    #[error("{kind} on `{entity}` has no {expected}")]
    UnexpectedResult {
        kind: StatementKind,
        entity: String,
        expected: &'static str,
    },
}

impl OomError {
    pub(crate) fn mapping(alias: impl Into<String>, source: CoercionError) -> Self {
        OomError::ColumnMappingError {
            alias: alias.into(),
            source,
        }
    }
}

/// Value-level coercion failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// NULL arrived for a field that cannot hold it
    #[error("null value for a non-nullable field")]
    UnexpectedNull,
    /// The value's type cannot be converted to the target type
    #[error("cannot coerce {actual} into {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },
    /// The value is representable but outside the target type's range
    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },
    /// The row has no column with the requested label
    #[error("column is missing from the result row")]
    MissingColumn,
    /// The entity has no field at this column index
    #[error("no field at column index {0}")]
    UnknownField(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_names_alias() {
        let err = OomError::mapping("col_0_2_", CoercionError::UnexpectedNull);
        let display = err.to_string();
        assert!(display.contains("col_0_2_"));
        assert!(display.contains("null value"));
    }

    #[test]
    fn test_key_arity_display() {
        let err = OomError::KeyArityMismatch {
            entity: "Tester".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "entity `Tester` has a 2-column key, got 1 key value(s)"
        );
    }

    #[test]
    fn test_execution_failure_carries_context() {
        let err = OomError::ExecutionFailure {
            kind: StatementKind::Insert,
            entity: "Tester".to_string(),
            source: SessionError::Other("constraint violated".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("INSERT"));
        assert!(display.contains("Tester"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
