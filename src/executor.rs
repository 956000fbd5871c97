//! Statement execution and result handles.
//!
//! [`execute`] binds a [`StatementDescriptor`] to a session, runs it and
//! returns an [`ExecutionHandle`] over the buffered result. The handle moves
//! through [`StatementState`]s and is released when dropped.
//!
//! ```ignore
//! use rowguard::{execute, query};
//!
//! let mut handle = execute(&mut session, &query::find_all::<Tester>()?)?;
//! for tester in handle.entities::<Tester>() {
//!     println!("{:?}", tester?);
//! }
//! ```

use std::sync::Arc;

use sea_query::Value;

use crate::alias::AliasPlan;
use crate::dialect::GeneratedKeyMode;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::OomError;
use crate::mapper;
use crate::query::{StatementDescriptor, StatementKind};
use crate::row::Row;
use crate::session::{Session, SessionError};
use crate::value::FieldValue;

/// Lifecycle of an executed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Built,
    Bound,
    Executed,
    /// Rows are buffered and can be read or mapped
    RowsAvailable,
    /// Only an update count is available
    CountAvailable,
    /// An update count and a generated key are available
    KeyAvailable,
    Released,
}

/// Result of one execution.
///
/// Rows are read once: [`rows`](Self::rows) and [`entities`](Self::entities)
/// drain the buffer.
#[derive(Debug)]
pub struct ExecutionHandle {
    kind: StatementKind,
    entity: Arc<EntityDescriptor>,
    state: StatementState,
    alias_plan: Option<AliasPlan>,
    rows: Vec<Row>,
    update_count: Option<u64>,
    generated_key: Option<Value>,
}

fn failure(stmt: &StatementDescriptor, source: SessionError) -> OomError {
    OomError::ExecutionFailure {
        kind: stmt.kind(),
        entity: stmt.entity().type_name().to_string(),
        source,
    }
}

fn transition(stmt: &StatementDescriptor, state: StatementState) -> StatementState {
    log::trace!("{} on {}: {state:?}", stmt.kind(), stmt.entity().type_name());
    state
}

/// Run `stmt` on `session`.
///
/// Renders for the session's dialect, binds parameters positionally and, when
/// the statement asks for it, retrieves the generated key on the same session.
///
/// # Errors
///
/// Driver failures are returned as `OomError::ExecutionFailure` carrying the
/// statement kind and entity name. A requested key that does not come back is
/// `OomError::NoGeneratedKey`.
pub fn execute(session: &mut dyn Session, stmt: &StatementDescriptor) -> Result<ExecutionHandle, OomError> {
    transition(stmt, StatementState::Built);
    let rendered = stmt.render_with(session.dialect(), session.alias_strategy());
    let state = transition(stmt, StatementState::Bound);

    #[cfg(feature = "tracing")]
    let _span = crate::tracing_helpers::execute_statement_span(stmt.kind(), &rendered.sql).entered();

    log::debug!(
        "{} on {} [{}]: {} ({} params)",
        stmt.kind(),
        stmt.entity().type_name(),
        session.dialect(),
        rendered.sql,
        rendered.values.len()
    );

    let mut handle = ExecutionHandle {
        kind: stmt.kind(),
        entity: Arc::clone(stmt.entity()),
        state,
        alias_plan: rendered.alias_plan,
        rows: Vec::new(),
        update_count: None,
        generated_key: None,
    };

    let wants_key = stmt.kind() == StatementKind::Insert && stmt.wants_generated_key();
    // Only an auto-increment identity yields a key; a driver rowid is not one.
    let reads_key = wants_key && stmt.entity().generated_identity().is_some();
    let returning = reads_key && session.dialect().generated_key_mode() == GeneratedKeyMode::Returning;

    if stmt.kind().returns_rows() {
        handle.rows = session
            .query(&rendered.sql, &rendered.values)
            .map_err(|e| failure(stmt, e))?;
        transition(stmt, StatementState::Executed);
        handle.state = transition(stmt, StatementState::RowsAvailable);
        return Ok(handle);
    }

    if returning {
        let rows = session
            .query(&rendered.sql, &rendered.values)
            .map_err(|e| failure(stmt, e))?;
        transition(stmt, StatementState::Executed);
        handle.update_count = Some(rows.len() as u64);
        handle.generated_key = rows.into_iter().next().and_then(|row| row.into_values().into_iter().next());
    } else {
        let count = session
            .execute(&rendered.sql, &rendered.values)
            .map_err(|e| failure(stmt, e))?;
        transition(stmt, StatementState::Executed);
        handle.update_count = Some(count);
        if reads_key {
            handle.generated_key = session.last_insert_id().map_err(|e| failure(stmt, e))?;
        }
    }

    if wants_key {
        if handle.generated_key.is_none() {
            handle.release();
            return Err(OomError::NoGeneratedKey {
                kind: stmt.kind(),
                entity: stmt.entity().type_name().to_string(),
            });
        }
        handle.state = transition(stmt, StatementState::KeyAvailable);
    } else {
        handle.state = transition(stmt, StatementState::CountAvailable);
    }
    Ok(handle)
}

impl ExecutionHandle {
    pub fn state(&self) -> StatementState {
        self.state
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Aliases the rows were selected under, for entity selects
    pub fn alias_plan(&self) -> Option<&AliasPlan> {
        self.alias_plan.as_ref()
    }

    fn unexpected(&self, expected: &'static str) -> OomError {
        OomError::UnexpectedResult {
            kind: self.kind,
            entity: self.entity.type_name().to_string(),
            expected,
        }
    }

    /// Rows affected by an INSERT, UPDATE or DELETE
    pub fn update_count(&self) -> Result<u64, OomError> {
        match self.state {
            StatementState::CountAvailable | StatementState::KeyAvailable => {
                self.update_count.ok_or_else(|| self.unexpected("update count"))
            }
            _ => Err(self.unexpected("update count")),
        }
    }

    /// The single value of an aggregate query such as `SELECT COUNT(*)`
    pub fn row_count(&self) -> Result<i64, OomError> {
        if self.state != StatementState::RowsAvailable {
            return Err(self.unexpected("aggregate row"));
        }
        let cell = self
            .rows
            .first()
            .and_then(|row| row.get_index(0))
            .ok_or_else(|| self.unexpected("aggregate row"))?;
        i64::from_value(cell.clone()).map_err(|source| {
            let label = self.rows[0].columns().first().cloned().unwrap_or_default();
            OomError::mapping(label, source)
        })
    }

    /// Drain the buffered rows.
    pub fn rows(&mut self) -> std::vec::IntoIter<Row> {
        std::mem::take(&mut self.rows).into_iter()
    }

    /// Drain the buffered rows, mapping each into `T` as it is pulled.
    ///
    /// Entity selects map through their alias plan; caller-written statements
    /// map by column name.
    pub fn entities<T: Entity>(&mut self) -> impl Iterator<Item = Result<T, OomError>> {
        let plan = self.alias_plan.clone();
        let entity = Arc::clone(&self.entity);
        self.rows().map(move |row| match &plan {
            Some(plan) => mapper::map_row::<T>(&row, plan),
            None => mapper::map_row_by_label::<T>(&row, &entity),
        })
    }

    /// Key generated by an INSERT run with `with_generated_key()`
    pub fn generated_key(&self) -> Result<Value, OomError> {
        match (&self.generated_key, self.state) {
            (Some(key), StatementState::KeyAvailable) => Ok(key.clone()),
            _ => Err(OomError::NoGeneratedKey {
                kind: self.kind,
                entity: self.entity.type_name().to_string(),
            }),
        }
    }

    /// Drop buffered results. Later accessors fail.
    pub fn release(&mut self) {
        if self.state != StatementState::Released {
            self.rows.clear();
            self.generated_key = None;
            self.update_count = None;
            self.state = StatementState::Released;
            log::trace!("{} on {}: Released", self.kind, self.entity.type_name());
        }
    }
}

impl Drop for ExecutionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// A statement bound to a session, with one-call accessors for the common
/// result shapes.
pub struct OomQuery<'s> {
    session: &'s mut dyn Session,
    statement: StatementDescriptor,
}

impl<'s> OomQuery<'s> {
    pub fn new(session: &'s mut dyn Session, statement: StatementDescriptor) -> Self {
        Self { session, statement }
    }

    pub fn statement(&self) -> &StatementDescriptor {
        &self.statement
    }

    fn run(&mut self) -> Result<ExecutionHandle, OomError> {
        execute(&mut *self.session, &self.statement)
    }

    /// Run an INSERT, UPDATE or DELETE and return the affected row count.
    pub fn execute_update(mut self) -> Result<u64, OomError> {
        self.run()?.update_count()
    }

    /// Run an aggregate query and return its single value.
    pub fn execute_count(mut self) -> Result<i64, OomError> {
        self.run()?.row_count()
    }

    /// First mapped row, if any.
    pub fn find<T: Entity>(mut self) -> Result<Option<T>, OomError> {
        self.run()?.entities::<T>().next().transpose()
    }

    /// Every mapped row.
    pub fn list<T: Entity>(mut self) -> Result<Vec<T>, OomError> {
        self.run()?.entities::<T>().collect()
    }

    /// Run an INSERT and return the key the database generated.
    pub fn generated_key(mut self) -> Result<Value, OomError> {
        self.statement = self.statement.clone().with_generated_key();
        self.run()?.generated_key()
    }

    /// Run an INSERT and write the generated key back into `entity`.
    ///
    /// Returns the key as stored in the entity.
    pub fn insert_with_key<T: Entity>(self, entity: &mut T) -> Result<Value, OomError> {
        let raw = self.generated_key()?;
        mapper::assign_generated_key(entity, raw)
    }
}
