//! Statement building.
//!
//! The builders in this module turn a registered entity, and optionally an
//! instance or key, into a [`StatementDescriptor`]. Nothing here touches a
//! session; see [`crate::executor`] for running statements.
//!
//! ```ignore
//! use rowguard::{query, Dialect};
//!
//! let stmt = query::find_by_id::<Tester>(1i64)?;
//! let rendered = stmt.render(Dialect::Postgres);
//! assert_eq!(rendered.values.len(), 1);
//! ```

pub mod builder;
mod key;
mod statement;

pub use builder::{
    count, count_by_example, delete, delete_by_id, delete_entity, find, find_all, find_by_column,
    find_by_id, increase_column, insert, raw, update, update_all, update_column,
};
pub use key::KeyValue;
pub use statement::{BoundParam, RenderedStatement, StatementDescriptor, StatementKind};
