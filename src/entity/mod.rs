//! Entities and their metadata.
//!
//! An entity is a plain struct implementing [`Entity`], normally through
//! `#[derive(Entity)]`. The derive emits raw [`EntityMeta`]; registration turns
//! it into an immutable [`EntityDescriptor`] cached by type.

mod descriptor;
mod registry;

pub use descriptor::{ColumnDescriptor, EntityDescriptor};
pub use registry::{lookup_entity, register_entity, registry, EntityRegistry};

use crate::error::CoercionError;
use crate::value::ColumnType;
use sea_query::Value;

/// A struct mapped one-to-one to a table row.
///
/// Column indices follow field declaration order and match
/// [`EntityDescriptor::columns`].
pub trait Entity: Default + 'static {
    /// Raw metadata used to build the descriptor at registration
    fn metadata() -> EntityMeta;

    /// Value of the field at `index`, or `None` when the field is null
    fn column_value(&self, index: usize) -> Option<Value>;

    /// Coerce `value` into the field at `index` and assign it
    fn set_column_value(&mut self, index: usize, value: Value) -> Result<(), CoercionError>;
}

/// Raw entity metadata as declared on the struct
#[derive(Debug, Clone)]
pub struct EntityMeta {
    pub type_name: &'static str,
    pub table_name: Option<&'static str>,
    pub schema_name: Option<&'static str>,
    pub fields: Vec<FieldMeta>,
}

impl EntityMeta {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table_name: None,
            schema_name: None,
            fields: Vec::new(),
        }
    }

    pub fn table_name(mut self, name: &'static str) -> Self {
        self.table_name = Some(name);
        self
    }

    pub fn schema_name(mut self, name: &'static str) -> Self {
        self.schema_name = Some(name);
        self
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }
}

/// Raw metadata for one mapped field
#[derive(Debug, Clone)]
pub struct FieldMeta {
    pub field_name: &'static str,
    pub column_name: Option<&'static str>,
    pub column_type: ColumnType,
    pub column_type_override: Option<&'static str>,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl FieldMeta {
    pub fn new(field_name: &'static str, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            field_name,
            column_name: None,
            column_type,
            column_type_override: None,
            nullable,
            primary_key: false,
            auto_increment: false,
        }
    }

    pub fn column_name(mut self, name: &'static str) -> Self {
        self.column_name = Some(name);
        self
    }

    pub fn column_type_override(mut self, name: &'static str) -> Self {
        self.column_type_override = Some(name);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Entities shared by unit tests across the crate.

    use crate::Entity;

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    #[table_name = "TESTER"]
    pub struct Tester {
        #[primary_key]
        #[auto_increment]
        pub id: Option<i64>,
        pub name: Option<String>,
        pub value: Option<i32>,
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    #[schema_name = "audit"]
    pub struct GirlBoy {
        #[primary_key]
        pub girl_id: Option<i32>,
        #[primary_key]
        pub boy_id: Option<i32>,
        #[column_name = "NOTE_TEXT"]
        pub note: Option<String>,
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    pub struct LogLine {
        pub message: String,
        pub level: i16,
    }

    /// Never registered anywhere; used for `UnregisteredEntity` checks.
    #[derive(Entity, Default, Debug)]
    pub struct Orphan {
        #[primary_key]
        pub id: Option<i32>,
    }
}
