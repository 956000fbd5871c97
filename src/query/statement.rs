//! Statement descriptors and their rendering.
//!
//! A [`StatementDescriptor`] is dialect-neutral: it records which columns are
//! assigned or compared and the value bound to each. Rendering turns it into
//! SQL text for one [`Dialect`] through `sea_query`, so the placeholder style
//! and quoting always match the value list.

use std::fmt;
use std::sync::Arc;

use sea_query::{Alias, Asterisk, Expr, Func, Query, SimpleExpr};

use crate::alias::{AliasPlan, ColumnAliasStrategy, ColumnRef};
use crate::dialect::{table_ref, Dialect, GeneratedKeyMode};
use crate::entity::EntityDescriptor;
use crate::value::ColumnType;
use sea_query::Value;

/// What a statement does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Select,
    Count,
    Delete,
    /// Caller-written SQL
    Raw,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Select => "SELECT",
            StatementKind::Count => "SELECT COUNT",
            StatementKind::Delete => "DELETE",
            StatementKind::Raw => "RAW",
        }
    }

    /// Whether executing the statement yields rows rather than an update count
    pub fn returns_rows(self) -> bool {
        matches!(
            self,
            StatementKind::Select | StatementKind::Count | StatementKind::Raw
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value together with the column it is bound to.
///
/// Parameters of caller-written statements have an empty `column`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub column: String,
    pub column_type: ColumnType,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Assignment {
    /// `col = ?`
    Set(BoundParam),
    /// `col = col + ?`
    Increase(BoundParam),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    /// `col = ?`
    Eq(BoundParam),
    /// `col IS NULL`
    IsNull(String),
}

impl Condition {
    fn to_expr(&self) -> SimpleExpr {
        match self {
            Condition::Eq(param) => Expr::col(Alias::new(&param.column)).eq(param.value.clone()),
            Condition::IsNull(column) => Expr::col(Alias::new(column)).is_null(),
        }
    }
}

fn compared(filter: &[Condition]) -> impl Iterator<Item = &BoundParam> + '_ {
    filter.iter().filter_map(|condition| match condition {
        Condition::Eq(param) => Some(param),
        Condition::IsNull(_) => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Insert {
        values: Vec<BoundParam>,
    },
    Update {
        set: Vec<Assignment>,
        filter: Vec<Condition>,
    },
    Select {
        filter: Vec<Condition>,
    },
    Count {
        filter: Vec<Condition>,
    },
    Delete {
        filter: Vec<Condition>,
    },
    Raw {
        sql: String,
        params: Vec<BoundParam>,
    },
}

/// A statement ready to be rendered and executed
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDescriptor {
    kind: StatementKind,
    entity: Arc<EntityDescriptor>,
    shape: Shape,
    alias_strategy: Option<ColumnAliasStrategy>,
    generated_key: bool,
}

/// SQL text, positional values and output aliases for one dialect
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub sql: String,
    pub values: Vec<Value>,
    pub alias_plan: Option<AliasPlan>,
}

impl StatementDescriptor {
    pub(crate) fn new(kind: StatementKind, entity: Arc<EntityDescriptor>, shape: Shape) -> Self {
        Self {
            kind,
            entity,
            shape,
            alias_strategy: None,
            generated_key: false,
        }
    }

    /// Alias the selected columns under `strategy`.
    ///
    /// Has no effect on statements that select no entity columns.
    pub fn alias_columns_as(mut self, strategy: ColumnAliasStrategy) -> Self {
        self.alias_strategy = Some(strategy);
        self
    }

    /// Retrieve the generated key when the statement executes.
    pub fn with_generated_key(mut self) -> Self {
        self.generated_key = true;
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn entity(&self) -> &Arc<EntityDescriptor> {
        &self.entity
    }

    pub fn alias_strategy(&self) -> Option<ColumnAliasStrategy> {
        self.alias_strategy
    }

    pub fn wants_generated_key(&self) -> bool {
        self.generated_key
    }

    /// Bound parameters in placeholder order
    pub fn params(&self) -> Vec<&BoundParam> {
        match &self.shape {
            Shape::Insert { values } => values.iter().collect(),
            Shape::Update { set, filter } => set
                .iter()
                .map(|assignment| match assignment {
                    Assignment::Set(param) | Assignment::Increase(param) => param,
                })
                .chain(compared(filter))
                .collect(),
            Shape::Select { filter } | Shape::Count { filter } | Shape::Delete { filter } => {
                compared(filter).collect()
            }
            Shape::Raw { params, .. } => params.iter().collect(),
        }
    }

    /// Output aliases under the requested strategy, before any dialect limit
    pub fn alias_plan(&self) -> Option<AliasPlan> {
        match self.shape {
            Shape::Select { .. } => Some(AliasPlan::for_entity(
                &self.entity,
                self.alias_strategy.unwrap_or_default(),
            )),
            _ => None,
        }
    }

    /// Render for `dialect` with the default alias strategy.
    pub fn render(&self, dialect: Dialect) -> RenderedStatement {
        self.render_with(dialect, ColumnAliasStrategy::default())
    }

    /// Render for `dialect`; `fallback_strategy` applies when no strategy
    /// was set on the statement.
    pub fn render_with(
        &self,
        dialect: Dialect,
        fallback_strategy: ColumnAliasStrategy,
    ) -> RenderedStatement {
        let table = table_ref(&self.entity);
        let mut alias_plan = None;

        let (sql, values) = match &self.shape {
            Shape::Insert { values } => {
                let mut insert = Query::insert();
                insert.into_table(table);
                if values.is_empty() {
                    insert.or_default_values();
                } else {
                    insert.columns(values.iter().map(|p| Alias::new(&p.column)));
                    // Columns and values come from the same list
                    insert.values_panic(values.iter().map(|p| SimpleExpr::Value(p.value.clone())));
                }
                if self.generated_key && dialect.generated_key_mode() == GeneratedKeyMode::Returning {
                    if let Some(key) = self.entity.generated_identity() {
                        insert.returning_col(Alias::new(key.column_name()));
                    }
                }
                dialect.build(&insert)
            }
            Shape::Update { set, filter } => {
                let mut update = Query::update();
                update.table(table);
                for assignment in set {
                    match assignment {
                        Assignment::Set(param) => {
                            update.value(Alias::new(&param.column), param.value.clone());
                        }
                        Assignment::Increase(param) => {
                            update.value(
                                Alias::new(&param.column),
                                Expr::col(Alias::new(&param.column)).add(param.value.clone()),
                            );
                        }
                    }
                }
                for condition in filter {
                    update.and_where(condition.to_expr());
                }
                dialect.build(&update)
            }
            Shape::Select { filter } => {
                let columns = ColumnRef::for_entity(&self.entity, 0);
                let plan = AliasPlan::within_limit(
                    &columns,
                    self.alias_strategy.unwrap_or(fallback_strategy),
                    dialect.max_identifier_length(),
                );
                let mut select = Query::select();
                for entry in plan.entries() {
                    select.expr_as(Expr::col(Alias::new(&entry.column)), Alias::new(&entry.alias));
                }
                select.from(table);
                for condition in filter {
                    select.and_where(condition.to_expr());
                }
                alias_plan = Some(plan);
                dialect.build(&select)
            }
            Shape::Count { filter } => {
                let mut select = Query::select();
                select.expr(Func::count(Expr::col(Asterisk))).from(table);
                for condition in filter {
                    select.and_where(condition.to_expr());
                }
                dialect.build(&select)
            }
            Shape::Delete { filter } => {
                let mut delete = Query::delete();
                delete.from_table(table);
                for condition in filter {
                    delete.and_where(condition.to_expr());
                }
                dialect.build(&delete)
            }
            Shape::Raw { sql, params } => (sql.clone(), params.iter().map(|p| p.value.clone()).collect()),
        };

        RenderedStatement {
            sql,
            values,
            alias_plan,
        }
    }
}
