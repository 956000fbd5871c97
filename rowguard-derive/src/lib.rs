//! Procedural macros for rowguard
//!
//! This crate provides the `Entity` derive, which turns a plain struct with
//! named fields into a registrable rowguard entity.

mod attributes;
mod macros;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates entity metadata and field accessors
///
/// This macro generates an `impl rowguard::Entity` containing:
/// - `metadata()` with the table name, schema, and one `FieldMeta` per field
/// - `column_value()` reading a field by column index
/// - `set_column_value()` writing a coerced value into a field by column index
///
/// Struct attributes: `table_name`, `schema_name`.
/// Field attributes: `column_name`, `column_type`, `primary_key`,
/// `auto_increment`, `skip`.
///
/// # Example
///
/// ```ignore
/// use rowguard::Entity;
///
/// #[derive(Entity, Default)]
/// #[table_name = "TESTER"]
/// pub struct Tester {
///     #[primary_key]
///     #[auto_increment]
///     pub id: Option<i64>,
///     pub name: Option<String>,
///     pub value: Option<i32>,
/// }
/// ```
#[proc_macro_derive(
    Entity,
    attributes(table_name, schema_name, column_name, column_type, primary_key, auto_increment, skip)
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}
