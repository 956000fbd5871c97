//! Derive macro for the `Entity` trait
//!
//! Fields are numbered in declaration order (skipped fields excluded); that
//! number is the column index used by `column_value` and `set_column_value`
//! and matches the column order of the registered descriptor.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes;

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    let table_name = attributes::extract_table_name(&input.attrs)?;
    let schema_name = attributes::extract_schema_name(&input.attrs)?;

    let mut field_metas: Vec<TokenStream2> = Vec::new();
    let mut readers: Vec<TokenStream2> = Vec::new();
    let mut writers: Vec<TokenStream2> = Vec::new();

    for field in fields {
        let attrs = attributes::parse_column_attributes(field)?;
        if attrs.is_ignored {
            continue;
        }

        let index = field_metas.len();
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_name = field_ident.to_string();
        let field_type = &field.ty;

        let column_name = attrs
            .column_name
            .as_ref()
            .map(|name| quote! { .column_name(#name) });
        let column_type = attrs
            .column_type
            .as_ref()
            .map(|name| quote! { .column_type_override(#name) });
        let primary_key = attrs.is_primary_key.then(|| quote! { .primary_key() });
        let auto_increment = attrs.is_auto_increment.then(|| quote! { .auto_increment() });

        field_metas.push(quote! {
            ::rowguard::FieldMeta::new(
                #field_name,
                <#field_type as ::rowguard::FieldValue>::COLUMN_TYPE,
                <#field_type as ::rowguard::FieldValue>::NULLABLE,
            )
            #column_name
            #column_type
            #primary_key
            #auto_increment
        });

        readers.push(quote! {
            #index => ::rowguard::FieldValue::to_value(&self.#field_ident),
        });

        writers.push(quote! {
            #index => {
                self.#field_ident = ::rowguard::FieldValue::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    if field_metas.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Entity requires at least one mapped field",
        ));
    }

    let table_name = table_name.map(|name| quote! { .table_name(#name) });
    let schema_name = schema_name.map(|name| quote! { .schema_name(#name) });
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rowguard::Entity for #struct_name #ty_generics #where_clause {
            fn metadata() -> ::rowguard::EntityMeta {
                ::rowguard::EntityMeta::new(#type_name)
                    #table_name
                    #schema_name
                    #(.field(#field_metas))*
            }

            fn column_value(&self, index: usize) -> ::core::option::Option<::rowguard::Value> {
                match index {
                    #(#readers)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_column_value(
                &mut self,
                index: usize,
                value: ::rowguard::Value,
            ) -> ::core::result::Result<(), ::rowguard::CoercionError> {
                match index {
                    #(#writers)*
                    _ => ::core::result::Result::Err(::rowguard::CoercionError::UnknownField(index)),
                }
            }
        }
    })
}
