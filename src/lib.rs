//! # Rowguard
//!
//! Dialect-aware entity-to-SQL statements, column aliasing and row mapping.
//!
//! Entities are plain structs deriving [`Entity`]. They are registered once,
//! turned into parameterized statements by the builders in [`query`],
//! executed through a [`Session`] and mapped back from rows by [`mapper`].
//!
//! ```ignore
//! use rowguard::{query, register_entity, Entity, OomQuery};
//!
//! #[derive(Entity, Default, Debug)]
//! #[table_name = "TESTER"]
//! pub struct Tester {
//!     #[primary_key]
//!     #[auto_increment]
//!     pub id: Option<i64>,
//!     pub name: Option<String>,
//!     pub value: Option<i32>,
//! }
//!
//! register_entity::<Tester>()?;
//! let mut tester = Tester { name: Some("one".into()), value: Some(7), ..Default::default() };
//! OomQuery::new(&mut session, query::insert(&tester)?).insert_with_key(&mut tester)?;
//! let found: Option<Tester> = OomQuery::new(&mut session, query::find_by_id::<Tester>(1)?).find()?;
//! ```

// Lets the derive's `::rowguard::` paths resolve inside this crate's own tests.
extern crate self as rowguard;

pub mod alias;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod naming;
pub mod query;
pub mod row;
pub mod session;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;
pub mod value;

pub use alias::{AliasEntry, AliasPlan, ColumnAliasStrategy, ColumnRef};
pub use config::DatabaseConfig;
pub use connection::{open_session, ConnectionError};
pub use dialect::{Dialect, GeneratedKeyMode};
pub use entity::{
    lookup_entity, register_entity, ColumnDescriptor, Entity, EntityDescriptor, EntityMeta,
    EntityRegistry, FieldMeta,
};
pub use error::{CoercionError, OomError};
pub use executor::{execute, ExecutionHandle, OomQuery, StatementState};
pub use query::{KeyValue, StatementDescriptor, StatementKind};
pub use row::Row;
pub use session::{Session, SessionError};
pub use value::{ColumnType, FieldValue};

pub use rowguard_derive::Entity;
pub use sea_query::Value;
