//! Statement builders for registered entities.
//!
//! Every builder looks the entity up in the process-wide registry and fails
//! before any I/O when the entity, a column or a key does not fit. Values are
//! normalized to each column's declared type as they are bound.

use std::sync::Arc;

use sea_query::Value;

use super::key::KeyValue;
use super::statement::{Assignment, BoundParam, Condition, Shape, StatementDescriptor, StatementKind};
use crate::entity::{lookup_entity, ColumnDescriptor, Entity, EntityDescriptor};
use crate::error::{CoercionError, OomError};
use crate::value::{describe, is_null, ColumnType};

fn bind(column: &ColumnDescriptor, value: Value) -> Result<BoundParam, OomError> {
    let value = column
        .column_type()
        .normalize(value)
        .map_err(|source| OomError::mapping(column.column_name(), source))?;
    Ok(BoundParam {
        column: column.column_name().to_string(),
        column_type: column.column_type(),
        value,
    })
}

/// Bind the entity's current value for `column`, typed NULL when unset.
fn bind_field<T: Entity>(entity: &T, column: &ColumnDescriptor) -> Result<BoundParam, OomError> {
    let value = entity
        .column_value(column.index())
        .unwrap_or_else(|| column.column_type().null_value());
    bind(column, value)
}

/// `key = ?` for each identity column, from the entity's own key fields.
fn instance_key<T: Entity>(desc: &EntityDescriptor, entity: &T) -> Result<Vec<Condition>, OomError> {
    if desc.key_arity() == 0 {
        return Err(OomError::MissingIdentity {
            entity: desc.type_name().to_string(),
        });
    }
    let present: Vec<(&ColumnDescriptor, Value)> = desc
        .identity_columns()
        .filter_map(|column| {
            entity
                .column_value(column.index())
                .filter(|v| !is_null(v))
                .map(|v| (column, v))
        })
        .collect();
    if present.len() != desc.key_arity() {
        return Err(OomError::KeyArityMismatch {
            entity: desc.type_name().to_string(),
            expected: desc.key_arity(),
            actual: present.len(),
        });
    }
    present
        .into_iter()
        .map(|(column, value)| bind(column, value).map(Condition::Eq))
        .collect()
}

/// `key = ?` for each identity column, from a supplied key.
fn supplied_key(desc: &EntityDescriptor, key: KeyValue) -> Result<Vec<Condition>, OomError> {
    if desc.key_arity() == 0 {
        return Err(OomError::MissingIdentity {
            entity: desc.type_name().to_string(),
        });
    }
    let actual = key.values().iter().filter(|v| !is_null(v)).count();
    if key.len() != desc.key_arity() || actual != desc.key_arity() {
        return Err(OomError::KeyArityMismatch {
            entity: desc.type_name().to_string(),
            expected: desc.key_arity(),
            actual,
        });
    }
    desc.identity_columns()
        .zip(key.into_values())
        .map(|(column, value)| bind(column, value).map(Condition::Eq))
        .collect()
}

/// `col = ?` for every non-null field of the example.
fn example<T: Entity>(desc: &EntityDescriptor, entity: &T) -> Result<Vec<Condition>, OomError> {
    desc.columns()
        .iter()
        .filter_map(|column| {
            entity
                .column_value(column.index())
                .filter(|v| !is_null(v))
                .map(|v| (column, v))
        })
        .map(|(column, value)| bind(column, value).map(Condition::Eq))
        .collect()
}

fn updatable<'a>(desc: &'a EntityDescriptor, name: &str) -> Result<&'a ColumnDescriptor, OomError> {
    let column = desc.column_named(name)?;
    if column.is_identity() {
        return Err(OomError::InvalidEntity {
            entity: desc.type_name().to_string(),
            reason: format!("identity column `{}` cannot be updated", column.column_name()),
        });
    }
    Ok(column)
}

fn statement(kind: StatementKind, desc: Arc<EntityDescriptor>, shape: Shape) -> StatementDescriptor {
    StatementDescriptor::new(kind, desc, shape)
}

/// `INSERT INTO table (cols) VALUES (?, ...)`.
///
/// An auto-increment key with no value is left out so the database generates
/// it; every other column is bound, NULLs included.
pub fn insert<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let mut values = Vec::with_capacity(desc.columns().len());
    for column in desc.columns() {
        match entity.column_value(column.index()).filter(|v| !is_null(v)) {
            Some(value) => values.push(bind(column, value)?),
            None if column.is_auto_increment() => {}
            None => values.push(bind(column, column.column_type().null_value())?),
        }
    }
    Ok(statement(StatementKind::Insert, desc, Shape::Insert { values }))
}

/// `UPDATE table SET <every non-key column> WHERE <key>`.
///
/// # Errors
///
/// `MissingIdentity` for entities without a key, `KeyArityMismatch` when a key
/// field is null.
pub fn update_all<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = instance_key(&desc, entity)?;
    let set = desc
        .non_identity_columns()
        .map(|column| bind_field(entity, column).map(Assignment::Set))
        .collect::<Result<Vec<_>, _>>()?;
    if set.is_empty() {
        return Err(OomError::InvalidEntity {
            entity: desc.type_name().to_string(),
            reason: "no non-key columns to update".to_string(),
        });
    }
    Ok(statement(StatementKind::Update, desc, Shape::Update { set, filter }))
}

/// Same statement as [`update_all`]: every non-key column is written.
pub fn update<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    update_all(entity)
}

/// `UPDATE table SET col = ? WHERE <key>` for one column.
///
/// `name` is a field name or, ignoring case, a column name.
pub fn update_column<T: Entity>(entity: &T, name: &str) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let column = updatable(&desc, name)?;
    let set = vec![Assignment::Set(bind_field(entity, column)?)];
    let filter = instance_key(&desc, entity)?;
    Ok(statement(StatementKind::Update, desc, Shape::Update { set, filter }))
}

/// `UPDATE table SET col = col + ? WHERE <key>`.
pub fn increase_column<T: Entity>(
    key: impl Into<KeyValue>,
    name: &str,
    delta: impl Into<Value>,
) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let column = updatable(&desc, name)?;
    let numeric = matches!(
        column.column_type(),
        ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Float
            | ColumnType::Double
    );
    if !numeric {
        return Err(OomError::mapping(
            column.column_name(),
            CoercionError::TypeMismatch {
                expected: "numeric column",
                actual: column.column_type().name().to_string(),
            },
        ));
    }
    let set = vec![Assignment::Increase(bind(column, delta.into())?)];
    let filter = supplied_key(&desc, key.into())?;
    Ok(statement(StatementKind::Update, desc, Shape::Update { set, filter }))
}

/// Query by example: `SELECT ... WHERE` every non-null field matches.
pub fn find<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = example(&desc, entity)?;
    Ok(statement(StatementKind::Select, desc, Shape::Select { filter }))
}

/// `SELECT ...` every row.
pub fn find_all<T: Entity>() -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    Ok(statement(StatementKind::Select, desc, Shape::Select { filter: Vec::new() }))
}

/// `SELECT ... WHERE col = ?`, or `col IS NULL` for a null value.
pub fn find_by_column<T: Entity>(
    name: &str,
    value: impl Into<Value>,
) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let column = desc.column_named(name)?;
    let value = value.into();
    let condition = if is_null(&value) {
        Condition::IsNull(column.column_name().to_string())
    } else {
        Condition::Eq(bind(column, value)?)
    };
    Ok(statement(
        StatementKind::Select,
        desc,
        Shape::Select {
            filter: vec![condition],
        },
    ))
}

/// `SELECT ... WHERE <key>`.
///
/// # Errors
///
/// `MissingIdentity` when the entity has no key, `KeyArityMismatch` when the
/// number of key values differs from the number of key columns.
pub fn find_by_id<T: Entity>(key: impl Into<KeyValue>) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = supplied_key(&desc, key.into())?;
    Ok(statement(StatementKind::Select, desc, Shape::Select { filter }))
}

/// `SELECT COUNT(*) FROM table`.
pub fn count<T: Entity>() -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    Ok(statement(StatementKind::Count, desc, Shape::Count { filter: Vec::new() }))
}

/// `SELECT COUNT(*)` of the rows matching the example.
pub fn count_by_example<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = example(&desc, entity)?;
    Ok(statement(StatementKind::Count, desc, Shape::Count { filter }))
}

/// `DELETE FROM table WHERE <key>`.
pub fn delete_by_id<T: Entity>(key: impl Into<KeyValue>) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = supplied_key(&desc, key.into())?;
    Ok(statement(StatementKind::Delete, desc, Shape::Delete { filter }))
}

/// `DELETE FROM table WHERE <key>`, with the key read from the entity.
pub fn delete_entity<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = instance_key(&desc, entity)?;
    Ok(statement(StatementKind::Delete, desc, Shape::Delete { filter }))
}

/// Delete by example. An example with every field null deletes every row.
pub fn delete<T: Entity>(entity: &T) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let filter = example(&desc, entity)?;
    Ok(statement(StatementKind::Delete, desc, Shape::Delete { filter }))
}

/// A caller-written statement whose rows map into `T` by column name.
///
/// The SQL is passed through unchanged, so it must use the placeholder style
/// of the session it runs on. Values are bound as given.
pub fn raw<T: Entity>(sql: impl Into<String>, params: Vec<Value>) -> Result<StatementDescriptor, OomError> {
    let desc = lookup_entity::<T>()?;
    let params = params
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let column_type = ColumnType::of_value(&value).ok_or_else(|| {
                OomError::mapping(
                    format!("param {}", i + 1),
                    CoercionError::TypeMismatch {
                        expected: "a supported parameter type",
                        actual: describe(&value),
                    },
                )
            })?;
            Ok(BoundParam {
                column: String::new(),
                column_type,
                value,
            })
        })
        .collect::<Result<Vec<_>, OomError>>()?;
    Ok(statement(
        StatementKind::Raw,
        desc,
        Shape::Raw {
            sql: sql.into(),
            params,
        },
    ))
}
