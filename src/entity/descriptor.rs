//! Immutable entity and column descriptors.

use super::EntityMeta;
use crate::error::OomError;
use crate::naming;
use crate::value::ColumnType;

/// One mapped column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    index: usize,
    column_name: String,
    field_name: String,
    column_type: ColumnType,
    nullable: bool,
    identity: bool,
    auto_increment: bool,
}

impl ColumnDescriptor {
    /// Position in the entity's column list (and the entity field index)
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Part of the entity's identity (primary key)
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Value generated by the database on insert
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }
}

/// Table-level metadata for a registered entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    type_name: &'static str,
    table_name: String,
    schema_name: Option<String>,
    columns: Vec<ColumnDescriptor>,
    identity: Vec<usize>,
}

impl EntityDescriptor {
    /// Derive a descriptor from raw metadata.
    ///
    /// Table and column names default to the UPPER_SNAKE form of the type and
    /// field names.
    ///
    /// # Errors
    ///
    /// Returns `OomError::InvalidEntity` when the entity has no columns, two
    /// columns share a name, a `column_type` override is unknown, or an
    /// auto-increment column is not a nullable identity column.
    pub fn from_meta(meta: EntityMeta) -> Result<Self, OomError> {
        let invalid = |reason: String| OomError::InvalidEntity {
            entity: meta.type_name.to_string(),
            reason,
        };

        if meta.fields.is_empty() {
            return Err(invalid("no mapped columns".to_string()));
        }

        let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(meta.fields.len());
        for (index, field) in meta.fields.iter().enumerate() {
            let column_name = field
                .column_name
                .map(str::to_string)
                .unwrap_or_else(|| naming::column_name_for(field.field_name));

            if columns
                .iter()
                .any(|c| c.column_name.eq_ignore_ascii_case(&column_name))
            {
                return Err(invalid(format!("duplicate column `{column_name}`")));
            }

            let column_type = match field.column_type_override {
                Some(name) => ColumnType::parse(name)
                    .ok_or_else(|| invalid(format!("unknown column type `{name}` on `{}`", field.field_name)))?,
                None => field.column_type,
            };

            if field.auto_increment && !(field.primary_key && field.nullable) {
                return Err(invalid(format!(
                    "auto-increment field `{}` must be an optional primary key",
                    field.field_name
                )));
            }

            columns.push(ColumnDescriptor {
                index,
                column_name,
                field_name: field.field_name.to_string(),
                column_type,
                nullable: field.nullable,
                identity: field.primary_key,
                auto_increment: field.auto_increment,
            });
        }

        let identity = columns
            .iter()
            .filter(|c| c.identity)
            .map(|c| c.index)
            .collect();

        Ok(Self {
            type_name: meta.type_name,
            table_name: meta
                .table_name
                .map(str::to_string)
                .unwrap_or_else(|| naming::table_name_for(meta.type_name)),
            schema_name: meta.schema_name.map(str::to_string),
            columns,
            identity,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    /// `schema.table`, or just `table` without a schema
    pub fn table_reference(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{schema}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    /// Identity columns in declaration order
    pub fn identity_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.identity.iter().map(move |&i| &self.columns[i])
    }

    /// Number of identity columns: 0 (no key), 1, or more (composite)
    pub fn key_arity(&self) -> usize {
        self.identity.len()
    }

    /// Columns outside the identity, in declaration order
    pub fn non_identity_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.columns.iter().filter(|c| !c.identity)
    }

    /// The single database-generated key column, if the entity has one
    pub fn generated_identity(&self) -> Option<&ColumnDescriptor> {
        match self.identity.as_slice() {
            [single] if self.columns[*single].auto_increment => Some(&self.columns[*single]),
            _ => None,
        }
    }

    /// Find a column by field name, or by column name ignoring case.
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.field_name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.column_name.eq_ignore_ascii_case(name))
            })
    }

    /// Like [`find_column`](Self::find_column), failing with `UnknownColumn`.
    pub fn column_named(&self, name: &str) -> Result<&ColumnDescriptor, OomError> {
        self.find_column(name).ok_or_else(|| OomError::UnknownColumn {
            entity: self.type_name.to_string(),
            column: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{GirlBoy, LogLine, Tester};
    use crate::entity::FieldMeta;
    use crate::Entity;

    #[test]
    fn test_descriptor_from_derive() {
        let desc = EntityDescriptor::from_meta(Tester::metadata()).expect("valid entity");
        assert_eq!(desc.type_name(), "Tester");
        assert_eq!(desc.table_name(), "TESTER");
        let names: Vec<&str> = desc.columns().iter().map(|c| c.column_name()).collect();
        assert_eq!(names, ["ID", "NAME", "VALUE"]);
        assert_eq!(desc.key_arity(), 1);
        let id = desc.generated_identity().expect("generated key");
        assert_eq!(id.field_name(), "id");
        assert_eq!(id.column_type(), ColumnType::BigInteger);
        assert_eq!(desc.column(2).map(|c| c.column_type()), Some(ColumnType::Integer));
    }

    #[test]
    fn test_composite_key_and_schema() {
        let desc = EntityDescriptor::from_meta(GirlBoy::metadata()).expect("valid entity");
        assert_eq!(desc.table_name(), "GIRL_BOY");
        assert_eq!(desc.table_reference(), "audit.GIRL_BOY");
        assert_eq!(desc.key_arity(), 2);
        assert!(desc.generated_identity().is_none());
        let keys: Vec<&str> = desc.identity_columns().map(|c| c.column_name()).collect();
        assert_eq!(keys, ["GIRL_ID", "BOY_ID"]);
        assert_eq!(desc.find_column("note").map(|c| c.column_name()), Some("NOTE_TEXT"));
    }

    #[test]
    fn test_no_identity() {
        let desc = EntityDescriptor::from_meta(LogLine::metadata()).expect("valid entity");
        assert_eq!(desc.key_arity(), 0);
        assert!(!desc.columns()[0].is_nullable());
    }

    #[test]
    fn test_find_column_by_field_or_column_name() {
        let desc = EntityDescriptor::from_meta(Tester::metadata()).expect("valid entity");
        assert_eq!(desc.find_column("name").map(|c| c.index()), Some(1));
        assert_eq!(desc.find_column("NAME").map(|c| c.index()), Some(1));
        assert_eq!(desc.find_column("Value").map(|c| c.index()), Some(2));
        assert!(matches!(
            desc.column_named("missing"),
            Err(OomError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let meta = EntityMeta::new("Broken")
            .field(FieldMeta::new("a", ColumnType::Integer, false).column_name("X"))
            .field(FieldMeta::new("b", ColumnType::Integer, false).column_name("x"));
        assert!(matches!(
            EntityDescriptor::from_meta(meta),
            Err(OomError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_type_override() {
        let meta = EntityMeta::new("Broken")
            .field(FieldMeta::new("a", ColumnType::Integer, false).column_type_override("geometry"));
        assert!(EntityDescriptor::from_meta(meta).is_err());
    }

    #[test]
    fn test_rejects_non_optional_auto_increment() {
        let meta = EntityMeta::new("Broken").field(
            FieldMeta::new("id", ColumnType::BigInteger, false)
                .primary_key()
                .auto_increment(),
        );
        assert!(EntityDescriptor::from_meta(meta).is_err());
    }

    #[test]
    fn test_rejects_empty_entity() {
        assert!(EntityDescriptor::from_meta(EntityMeta::new("Empty")).is_err());
    }
}
