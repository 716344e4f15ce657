//! Field-level `#[orm(...)]` attribute parsing shared by `FromRow` and `Record`.
//!
//! Supported keys:
//!
//! - `id`: the field is the record identity
//! - `ignore`: left out of INSERT/UPDATE column lists
//! - `generated` / `client_supplied`: override the identity policy (identity field only)
//! - `column = "Name"`: map the field to a differently named column

use syn::Result;

use crate::sql_ident::parse_sql_ident;

#[derive(Default)]
pub(crate) struct FieldAttr {
    pub(crate) is_id: bool,
    pub(crate) ignore: bool,
    pub(crate) generated: bool,
    pub(crate) client_supplied: bool,
    pub(crate) column: Option<String>,
}

impl FieldAttr {
    /// Merge every `#[orm(...)]` attribute on `field`.
    pub(crate) fn from_field(field: &syn::Field) -> Result<Self> {
        let mut out = Self::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            let parsed: FieldAttr = attr.parse_args()?;
            out.is_id |= parsed.is_id;
            out.ignore |= parsed.ignore;
            out.generated |= parsed.generated;
            out.client_supplied |= parsed.client_supplied;
            if parsed.column.is_some() {
                out.column = parsed.column;
            }
        }

        if out.generated && out.client_supplied {
            return Err(syn::Error::new_spanned(
                field,
                "`generated` and `client_supplied` are mutually exclusive",
            ));
        }
        Ok(out)
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut out = FieldAttr::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                match key.as_str() {
                    "column" => out.column = Some(parse_sql_ident(&value, "column")?),
                    _ => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown orm attribute `{key}`"),
                        ));
                    }
                }
            } else {
                match key.as_str() {
                    "id" => out.is_id = true,
                    "ignore" => out.ignore = true,
                    "generated" => out.generated = true,
                    "client_supplied" => out.client_supplied = true,
                    _ => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown orm attribute `{key}`"),
                        ));
                    }
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn parses_flags_and_column() {
        let field: syn::Field = parse_quote! {
            #[orm(id, generated, column = "OrderId")]
            id: i64
        };
        let attr = FieldAttr::from_field(&field).unwrap();
        assert!(attr.is_id);
        assert!(attr.generated);
        assert!(!attr.ignore);
        assert_eq!(attr.column.as_deref(), Some("OrderId"));
    }

    #[test]
    fn merges_multiple_attributes() {
        let field: syn::Field = parse_quote! {
            #[orm(ignore)]
            #[orm(column = "CreatedAt")]
            created_at: String
        };
        let attr = FieldAttr::from_field(&field).unwrap();
        assert!(attr.ignore);
        assert_eq!(attr.column.as_deref(), Some("CreatedAt"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let field: syn::Field = parse_quote! {
            #[orm(primary)]
            id: i64
        };
        assert!(FieldAttr::from_field(&field).is_err());
    }

    #[test]
    fn rejects_invalid_column() {
        let field: syn::Field = parse_quote! {
            #[orm(column = "first name")]
            first_name: String
        };
        assert!(FieldAttr::from_field(&field).is_err());
    }

    #[test]
    fn rejects_conflicting_policies() {
        let field: syn::Field = parse_quote! {
            #[orm(id, generated, client_supplied)]
            id: i64
        };
        assert!(FieldAttr::from_field(&field).is_err());
    }
}
