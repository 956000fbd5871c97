//! Column alias resolution for SELECT output columns.
//!
//! Every selected column gets an alias under one [`ColumnAliasStrategy`]. The
//! resulting [`AliasPlan`] travels with the statement so the mapper can find
//! each column in the result row by the alias it was given.

use serde::Deserialize;

use crate::entity::EntityDescriptor;

/// How selected columns are aliased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAliasStrategy {
    /// `NAME`
    #[default]
    ColumnName,
    /// `col_0_1_`: table index, column index
    ColumnCode,
    /// `TESTER_NAME`
    TableName,
    /// `schema.TESTER.NAME`, or `TESTER.NAME` without a schema
    TableReference,
}

/// A column as it appears in a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub schema: Option<String>,
    pub table: String,
    /// Position of the table in the statement's FROM list
    pub table_index: usize,
    pub column: String,
    /// Position of the column in its entity
    pub column_index: usize,
}

impl ColumnRef {
    /// Reference every column of an entity, in declaration order.
    pub fn for_entity(entity: &EntityDescriptor, table_index: usize) -> Vec<ColumnRef> {
        entity
            .columns()
            .iter()
            .map(|column| ColumnRef {
                schema: entity.schema_name().map(str::to_string),
                table: entity.table_name().to_string(),
                table_index,
                column: column.column_name().to_string(),
                column_index: column.index(),
            })
            .collect()
    }
}

/// Render the alias of `column` under `strategy`.
pub fn resolve(column: &ColumnRef, strategy: ColumnAliasStrategy) -> String {
    match strategy {
        ColumnAliasStrategy::ColumnName => column.column.clone(),
        ColumnAliasStrategy::ColumnCode => {
            format!("col_{}_{}_", column.table_index, column.column_index)
        }
        ColumnAliasStrategy::TableName => format!("{}_{}", column.table, column.column),
        ColumnAliasStrategy::TableReference => match &column.schema {
            Some(schema) => format!("{schema}.{}.{}", column.table, column.column),
            None => format!("{}.{}", column.table, column.column),
        },
    }
}

/// One selected column and its alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub table: String,
    pub column: String,
    pub column_index: usize,
    pub alias: String,
}

/// Ordered aliases for a SELECT's output columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPlan {
    strategy: ColumnAliasStrategy,
    entries: Vec<AliasEntry>,
}

impl AliasPlan {
    pub fn new(columns: &[ColumnRef], strategy: ColumnAliasStrategy) -> Self {
        let entries = columns
            .iter()
            .map(|column| AliasEntry {
                table: column.table.clone(),
                column: column.column.clone(),
                column_index: column.column_index,
                alias: resolve(column, strategy),
            })
            .collect();
        Self { strategy, entries }
    }

    /// Plan for selecting every column of a single entity.
    pub fn for_entity(entity: &EntityDescriptor, strategy: ColumnAliasStrategy) -> Self {
        Self::new(&ColumnRef::for_entity(entity, 0), strategy)
    }

    /// Resolve under `strategy`, switching to `ColumnCode` when any alias
    /// would exceed `max_len`.
    pub fn within_limit(
        columns: &[ColumnRef],
        strategy: ColumnAliasStrategy,
        max_len: Option<usize>,
    ) -> Self {
        let plan = Self::new(columns, strategy);
        let Some(max) = max_len else {
            return plan;
        };
        match plan.entries.iter().find(|e| e.alias.len() > max) {
            Some(long) if strategy != ColumnAliasStrategy::ColumnCode => {
                log::warn!(
                    "alias `{}` exceeds the {max}-character identifier limit, using column codes",
                    long.alias
                );
                Self::new(columns, ColumnAliasStrategy::ColumnCode)
            }
            _ => plan,
        }
    }

    pub fn strategy(&self) -> ColumnAliasStrategy {
        self.strategy
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.alias.as_str())
    }
}
