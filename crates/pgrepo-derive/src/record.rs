//! Record derive macro implementation.
//!
//! Emits a `static` schema descriptor, so the field list, column names and
//! identity policy are fixed at compile time.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::common::attrs::FieldAttr;
use crate::common::syn_types::semantic_kind;
use crate::from_row::{field_ident, named_fields};

struct RecordField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    column: String,
    attr: FieldAttr,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = named_fields(&input, "Record")?
        .iter()
        .map(|field| {
            let attr = FieldAttr::from_field(field)?;
            let ident = field_ident(field)?;
            Ok(RecordField {
                ident,
                ty: &field.ty,
                column: attr.column.clone().unwrap_or_else(|| ident.to_string()),
                attr,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let identity = find_identity(&input, &fields)?;
    let id = &fields[identity];

    for (idx, field) in fields.iter().enumerate() {
        if idx != identity && (field.attr.generated || field.attr.client_supplied) {
            return Err(syn::Error::new_spanned(
                field.ident,
                "`generated` and `client_supplied` only apply to the identity field",
            ));
        }
    }
    if id.attr.ignore {
        return Err(syn::Error::new_spanned(
            id.ident,
            "the identity field cannot be ignored",
        ));
    }

    let field_defs = fields.iter().enumerate().map(|(idx, field)| {
        let name = field.ident.to_string();
        let column = &field.column;
        let (kind, nullable) = semantic_kind(field.ty);
        let kind = kind.to_tokens();

        let mut def = quote! { ::pgrepo::FieldDef::new(#name, #kind) };
        if *column != name {
            def = quote! { #def.column(#column) };
        }
        if nullable {
            def = quote! { #def.nullable() };
        }
        if field.attr.ignore {
            def = quote! { #def.ignored() };
        }
        if idx == identity {
            def = quote! { #def.identity() };
        }
        def
    });

    let (id_kind, _) = semantic_kind(id.ty);
    let policy = if id.attr.generated {
        quote! { ::pgrepo::IdentityPolicy::ServerGenerated }
    } else if id.attr.client_supplied {
        quote! { ::pgrepo::IdentityPolicy::ClientSupplied }
    } else {
        let kind = id_kind.to_tokens();
        quote! { ::pgrepo::IdentityPolicy::for_type(#kind) }
    };

    let id_ident = id.ident;
    let id_ty = id.ty;

    let value_arms = fields.iter().filter(|f| !f.attr.ignore).map(|field| {
        let column = &field.column;
        let ident = field.ident;
        quote! { #column => ::core::option::Option::Some(&self.#ident) }
    });

    Ok(quote! {
        impl #impl_generics ::pgrepo::Record for #name #ty_generics #where_clause {
            type Id = #id_ty;

            fn schema() -> &'static ::pgrepo::RecordSchema {
                static SCHEMA: ::pgrepo::RecordSchema = ::pgrepo::RecordSchema::new(
                    &[#(#field_defs),*],
                    #policy,
                );
                &SCHEMA
            }

            fn id(&self) -> &Self::Id {
                &self.#id_ident
            }

            fn column_value(
                &self,
                column: &str,
            ) -> ::core::option::Option<&(dyn ::pgrepo::tokio_postgres::types::ToSql + Sync)> {
                match column {
                    #(#value_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// Index of the field marked `#[orm(id)]`, or else the field named `id`.
fn find_identity(input: &DeriveInput, fields: &[RecordField<'_>]) -> Result<usize> {
    let mut marked = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.attr.is_id)
        .map(|(idx, _)| idx);

    match (marked.next(), marked.next()) {
        (Some(idx), None) => Ok(idx),
        (Some(_), Some(extra)) => Err(syn::Error::new_spanned(
            fields[extra].ident,
            "Record allows only one #[orm(id)] field",
        )),
        (None, _) => fields
            .iter()
            .position(|f| f.ident == "id")
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    input,
                    "Record requires an identity: mark a field #[orm(id)] or name it `id`",
                )
            }),
    }
}
