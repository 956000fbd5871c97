//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// Read a `#[name = "value"]` string attribute.
///
/// Returns `Ok(None)` when the attribute is absent and an error when it is
/// present but not a string name-value pair.
fn string_attribute(attrs: &[Attribute], name: &str) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident(name) {
            continue;
        }
        let meta = attr.meta.require_name_value()?;
        if let syn::Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &meta.value
        {
            return Ok(Some(s.value()));
        }
        return Err(syn::Error::new_spanned(
            &meta.value,
            format!("`{}` expects a string literal, e.g. #[{} = \"...\"]", name, name),
        ));
    }
    Ok(None)
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    string_attribute(attrs, "table_name")
}

/// Extract schema name from struct attributes
pub fn extract_schema_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    string_attribute(attrs, "schema_name")
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Column attributes of one entity field
#[derive(Default)]
pub struct ColumnAttributes {
    pub column_name: Option<String>,
    pub column_type: Option<String>,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_ignored: bool,
}

/// Parse all column attributes from a field
pub fn parse_column_attributes(field: &Field) -> syn::Result<ColumnAttributes> {
    let attrs = ColumnAttributes {
        column_name: string_attribute(&field.attrs, "column_name")?,
        column_type: string_attribute(&field.attrs, "column_type")?,
        is_primary_key: has_attribute(field, "primary_key"),
        is_auto_increment: has_attribute(field, "auto_increment"),
        is_ignored: has_attribute(field, "skip"),
    };

    if attrs.is_auto_increment && !attrs.is_primary_key {
        return Err(syn::Error::new_spanned(
            field,
            "#[auto_increment] is only supported on #[primary_key] fields",
        ));
    }
    if attrs.is_ignored && (attrs.is_primary_key || attrs.column_name.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "a skipped field cannot carry column attributes",
        ));
    }

    Ok(attrs)
}
