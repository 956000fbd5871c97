//! Mapping result rows back into entities.
//!
//! Each alias in the statement's [`AliasPlan`] is looked up in the row (exact
//! label first, then ignoring case) and coerced into the entity field it was
//! selected from. Coercion rules live on [`FieldValue`](crate::FieldValue).

use sea_query::Value;

use crate::alias::AliasPlan;
use crate::entity::{lookup_entity, ColumnDescriptor, Entity, EntityDescriptor};
use crate::error::{CoercionError, OomError};
use crate::row::Row;
use crate::value::is_null;

/// Build a new entity from `row`.
pub fn map_row<T: Entity>(row: &Row, plan: &AliasPlan) -> Result<T, OomError> {
    let mut entity = T::default();
    map_row_into(&mut entity, row, plan)?;
    Ok(entity)
}

/// Populate an existing entity from `row`.
///
/// Fields outside the plan keep their current values.
pub fn map_row_into<T: Entity>(entity: &mut T, row: &Row, plan: &AliasPlan) -> Result<(), OomError> {
    for entry in plan.entries() {
        let value = row
            .get(&entry.alias)
            .cloned()
            .ok_or_else(|| OomError::mapping(&entry.alias, CoercionError::MissingColumn))?;
        entity
            .set_column_value(entry.column_index, value)
            .map_err(|source| OomError::mapping(&entry.alias, source))?;
    }
    Ok(())
}

/// Build an entity from a row of a caller-written statement.
///
/// Row labels are matched against column names ignoring case; labels that
/// match no column are skipped.
pub fn map_row_by_label<T: Entity>(row: &Row, entity_desc: &EntityDescriptor) -> Result<T, OomError> {
    let mut entity = T::default();
    for (label, value) in row.iter() {
        let Some(column) = entity_desc
            .columns()
            .iter()
            .find(|c| c.column_name().eq_ignore_ascii_case(label))
        else {
            continue;
        };
        entity
            .set_column_value(column.index(), value.clone())
            .map_err(|source| OomError::mapping(label, source))?;
    }
    Ok(entity)
}

/// Coerce a raw generated key into the key column's declared type.
pub fn coerce_generated_key(raw: Value, column: &ColumnDescriptor) -> Result<Value, OomError> {
    if is_null(&raw) {
        return Err(OomError::mapping(column.column_name(), CoercionError::UnexpectedNull));
    }
    column
        .column_type()
        .normalize(raw)
        .map_err(|source| OomError::mapping(column.column_name(), source))
}

/// Write a generated key into the entity's key field.
///
/// Returns the key as stored, after coercion.
pub fn assign_generated_key<T: Entity>(entity: &mut T, raw: Value) -> Result<Value, OomError> {
    let desc = lookup_entity::<T>()?;
    let column = key_column(&desc)?;
    let key = coerce_generated_key(raw, column)?;
    entity
        .set_column_value(column.index(), key.clone())
        .map_err(|source| OomError::mapping(column.column_name(), source))?;
    Ok(key)
}

/// The column a generated key is written to: the auto-increment key, or the
/// only key column.
pub(crate) fn key_column(desc: &EntityDescriptor) -> Result<&ColumnDescriptor, OomError> {
    if let Some(column) = desc.generated_identity() {
        return Ok(column);
    }
    let mut identity = desc.identity_columns();
    match (identity.next(), identity.next()) {
        (Some(column), None) => Ok(column),
        (None, _) => Err(OomError::MissingIdentity {
            entity: desc.type_name().to_string(),
        }),
        (Some(_), Some(_)) => Err(OomError::KeyArityMismatch {
            entity: desc.type_name().to_string(),
            expected: desc.key_arity(),
            actual: 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::ColumnAliasStrategy;
    use crate::entity::fixtures::{GirlBoy, LogLine, Tester};
    use crate::entity::register_entity;
    use crate::value::ColumnType;
    use std::sync::Arc;

    fn tester_desc() -> Arc<EntityDescriptor> {
        register_entity::<Tester>().expect("register")
    }

    fn row(labels: &[&str], values: Vec<Value>) -> Row {
        let columns: Arc<[String]> = labels.iter().map(|l| l.to_string()).collect();
        Row::new(columns, values)
    }

    #[test]
    fn test_map_row_under_every_strategy() {
        let desc = tester_desc();
        for strategy in [
            ColumnAliasStrategy::ColumnName,
            ColumnAliasStrategy::ColumnCode,
            ColumnAliasStrategy::TableName,
            ColumnAliasStrategy::TableReference,
        ] {
            let plan = AliasPlan::for_entity(&desc, strategy);
            let labels: Vec<&str> = plan.aliases().collect();
            let row = row(
                &labels,
                vec![
                    Value::BigInt(Some(1)),
                    Value::from("one".to_string()),
                    Value::BigInt(Some(7)),
                ],
            );
            let tester: Tester = map_row(&row, &plan).expect("map row");
            assert_eq!(
                tester,
                Tester {
                    id: Some(1),
                    name: Some("one".to_string()),
                    value: Some(7),
                }
            );
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        let desc = tester_desc();
        let plan = AliasPlan::for_entity(&desc, ColumnAliasStrategy::ColumnName);
        let row = row(
            &["id", "name", "value"],
            vec![Value::BigInt(Some(1)), Value::String(None), Value::Int(None)],
        );
        let tester: Tester = map_row(&row, &plan).expect("map row");
        assert_eq!(tester.id, Some(1));
        assert_eq!(tester.name, None);
    }

    #[test]
    fn test_missing_alias_names_it() {
        let desc = tester_desc();
        let plan = AliasPlan::for_entity(&desc, ColumnAliasStrategy::ColumnCode);
        let row = row(&["col_0_0_"], vec![Value::BigInt(Some(1))]);
        match map_row::<Tester>(&row, &plan) {
            Err(OomError::ColumnMappingError { alias, source }) => {
                assert_eq!(alias, "col_0_1_");
                assert_eq!(source, CoercionError::MissingColumn);
            }
            other => panic!("expected ColumnMappingError, got {other:?}"),
        }
    }

    #[test]
    fn test_null_into_required_field() {
        let desc = register_entity::<LogLine>().expect("register");
        let plan = AliasPlan::for_entity(&desc, ColumnAliasStrategy::ColumnName);
        let row = row(&["MESSAGE", "LEVEL"], vec![Value::String(None), Value::BigInt(Some(1))]);
        assert!(matches!(
            map_row::<LogLine>(&row, &plan),
            Err(OomError::ColumnMappingError {
                source: CoercionError::UnexpectedNull,
                ..
            })
        ));
    }

    #[test]
    fn test_map_row_into_keeps_other_fields() {
        let desc = register_entity::<GirlBoy>().expect("register");
        let plan = AliasPlan::new(
            &crate::alias::ColumnRef::for_entity(&desc, 0)[2..],
            ColumnAliasStrategy::ColumnName,
        );
        let mut entity = GirlBoy {
            girl_id: Some(1),
            boy_id: Some(2),
            note: None,
        };
        let row = row(&["NOTE_TEXT"], vec![Value::from("hi".to_string())]);
        map_row_into(&mut entity, &row, &plan).expect("map");
        assert_eq!(entity.girl_id, Some(1));
        assert_eq!(entity.note.as_deref(), Some("hi"));
    }

    #[test]
    fn test_map_row_by_label() {
        let desc = tester_desc();
        let row = row(
            &["value", "extra", "NAME"],
            vec![Value::BigInt(Some(3)), Value::Int(Some(0)), Value::from("n".to_string())],
        );
        let tester: Tester = map_row_by_label(&row, &desc).expect("map");
        assert_eq!(tester.value, Some(3));
        assert_eq!(tester.name.as_deref(), Some("n"));
        assert_eq!(tester.id, None);
    }

    #[test]
    fn test_generated_key_coercion() {
        let desc = tester_desc();
        let column = desc.generated_identity().expect("generated key");
        assert_eq!(
            coerce_generated_key(Value::Int(Some(4)), column).expect("coerce"),
            Value::BigInt(Some(4))
        );
        assert!(coerce_generated_key(Value::BigInt(None), column).is_err());
        assert_eq!(column.column_type(), ColumnType::BigInteger);

        let mut tester = Tester::default();
        let key = assign_generated_key(&mut tester, Value::BigInt(Some(12))).expect("assign");
        assert_eq!(key, Value::BigInt(Some(12)));
        assert_eq!(tester.id, Some(12));
    }

    #[test]
    fn test_composite_key_has_no_single_key_column() {
        let desc = register_entity::<GirlBoy>().expect("register");
        assert!(matches!(key_column(&desc), Err(OomError::KeyArityMismatch { .. })));
    }
}
