//! Supported SQL dialects.
//!
//! A `Dialect` picks the `sea_query` backend used to render statements
//! (identifier quoting and placeholder style), the identifier length limit
//! that drives alias fallback, and how generated keys come back after an
//! INSERT.

use sea_query::{
    Alias, ColumnDef, Index, IntoIden, MysqlQueryBuilder, PostgresQueryBuilder,
    QueryStatementWriter, SchemaStatementBuilder, SqliteQueryBuilder, Table, TableRef, Value,
};
use serde::Deserialize;

use crate::entity::EntityDescriptor;
use crate::value::ColumnType;

/// How the key of a freshly inserted row is retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeyMode {
    /// `INSERT ... RETURNING key`, read from the returned row
    Returning,
    /// The driver's last-insert id after a plain INSERT
    LastInsertId,
}

/// SQL dialect of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "postgresql")]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Infer the dialect from a connection URL scheme.
    ///
    /// Key-value Postgres strings (`host=... dbname=...`) also map to `Postgres`.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':').map(|(scheme, _)| scheme.to_lowercase());
        match scheme.as_deref() {
            Some("postgres" | "postgresql") => Some(Dialect::Postgres),
            Some("mysql" | "mariadb") => Some(Dialect::MySql),
            Some("sqlite") => Some(Dialect::Sqlite),
            _ if url.contains('=') => Some(Dialect::Postgres),
            _ => None,
        }
    }

    pub fn generated_key_mode(self) -> GeneratedKeyMode {
        match self {
            Dialect::Postgres => GeneratedKeyMode::Returning,
            Dialect::MySql | Dialect::Sqlite => GeneratedKeyMode::LastInsertId,
        }
    }

    /// Longest identifier (and therefore column alias) the database accepts
    pub fn max_identifier_length(self) -> Option<usize> {
        match self {
            Dialect::Postgres => Some(63),
            Dialect::MySql => Some(64),
            Dialect::Sqlite => None,
        }
    }

    /// Render a `sea_query` statement with this dialect's quoting and placeholders.
    pub(crate) fn build<S: QueryStatementWriter>(self, statement: &S) -> (String, Vec<Value>) {
        let (sql, values) = match self {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::MySql => statement.build(MysqlQueryBuilder),
            Dialect::Sqlite => statement.build(SqliteQueryBuilder),
        };
        (sql, values.0)
    }

    fn render_schema<S: SchemaStatementBuilder>(self, statement: &S) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::MySql => statement.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }

    /// Quote one identifier, doubling any embedded quote character.
    pub fn quote_identifier(self, name: &str) -> String {
        let quote = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(quote);
        for c in name.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// The entity's table name as this dialect quotes it, schema included
    pub fn table_name(self, entity: &EntityDescriptor) -> String {
        let table = self.quote_identifier(entity.table_name());
        match entity.schema_name() {
            Some(schema) => format!("{}.{table}", self.quote_identifier(schema)),
            None => table,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for the entity.
    ///
    /// SQLite auto-increment keys are declared as `integer` so that they alias
    /// the rowid.
    pub fn create_table_sql(self, entity: &EntityDescriptor) -> String {
        let mut table = Table::create();
        table.table(table_ref(entity)).if_not_exists();

        let composite_key = entity.key_arity() > 1;
        for column in entity.columns() {
            let mut def = ColumnDef::new(Alias::new(column.column_name()));
            if column.is_auto_increment() && self == Dialect::Sqlite {
                ColumnType::Integer.apply(&mut def);
            } else {
                column.column_type().apply(&mut def);
            }
            if !column.is_nullable() || column.is_identity() {
                def.not_null();
            }
            if column.is_identity() && !composite_key {
                def.primary_key();
            }
            if column.is_auto_increment() {
                def.auto_increment();
            }
            table.col(&mut def);
        }

        if composite_key {
            let mut key = Index::create();
            for column in entity.identity_columns() {
                key.col(Alias::new(column.column_name()));
            }
            table.primary_key(&mut key);
        }

        self.render_schema(&table)
    }

    /// `DROP TABLE IF EXISTS` for the entity
    pub fn drop_table_sql(self, entity: &EntityDescriptor) -> String {
        let statement = Table::drop().table(table_ref(entity)).if_exists().to_owned();
        self.render_schema(&statement)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema-qualified table reference for `sea_query` statements
pub(crate) fn table_ref(entity: &EntityDescriptor) -> TableRef {
    let table = Alias::new(entity.table_name());
    match entity.schema_name() {
        Some(schema) => TableRef::SchemaTable(Alias::new(schema).into_iden(), table.into_iden()),
        None => TableRef::Table(table.into_iden()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{GirlBoy, Tester};
    use crate::Entity;

    fn tester() -> EntityDescriptor {
        EntityDescriptor::from_meta(Tester::metadata()).expect("valid entity")
    }

    #[test]
    fn test_from_url() {
        assert_eq!(Dialect::from_url("postgres://u:p@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("postgresql://u:p@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("host=localhost dbname=x"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("mysql://u:p@h/db"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("sqlite://./data.db"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("oracle://x"), None);
    }

    #[test]
    fn test_generated_key_modes() {
        assert_eq!(Dialect::Postgres.generated_key_mode(), GeneratedKeyMode::Returning);
        assert_eq!(Dialect::Sqlite.generated_key_mode(), GeneratedKeyMode::LastInsertId);
        assert_eq!(Dialect::MySql.generated_key_mode(), GeneratedKeyMode::LastInsertId);
    }

    #[test]
    fn test_table_name_quoting() {
        let desc = tester();
        assert_eq!(Dialect::Postgres.table_name(&desc), "\"TESTER\"");
        assert_eq!(Dialect::MySql.table_name(&desc), "`TESTER`");

        let girl_boy = EntityDescriptor::from_meta(GirlBoy::metadata()).expect("valid entity");
        assert_eq!(Dialect::Postgres.table_name(&girl_boy), "\"audit\".\"GIRL_BOY\"");
    }

    #[test]
    fn test_create_table_sql() {
        let desc = tester();
        let sqlite = Dialect::Sqlite.create_table_sql(&desc);
        assert!(sqlite.starts_with("CREATE TABLE IF NOT EXISTS \"TESTER\""));
        assert!(sqlite.contains("\"ID\" integer"));
        assert!(sqlite.contains("AUTOINCREMENT"));
        assert!(sqlite.contains("\"NAME\""));

        let postgres = Dialect::Postgres.create_table_sql(&desc);
        assert!(postgres.to_lowercase().contains("serial"));
    }

    #[test]
    fn test_create_table_composite_key() {
        let desc = EntityDescriptor::from_meta(GirlBoy::metadata()).expect("valid entity");
        let sql = Dialect::Postgres.create_table_sql(&desc);
        assert!(sql.contains("\"audit\".\"GIRL_BOY\""));
        assert!(sql.contains("PRIMARY KEY"));
        assert!(!sql.contains("\"GIRL_ID\" integer NOT NULL PRIMARY KEY"));
    }

    #[test]
    fn test_quote_identifier_escapes() {
        assert_eq!(Dialect::Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_drop_table_sql() {
        assert_eq!(
            Dialect::Sqlite.drop_table_sql(&tester()),
            "DROP TABLE IF EXISTS \"TESTER\""
        );
    }
}
