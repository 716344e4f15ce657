//! Type helper utilities for syn type analysis.

use proc_macro2::TokenStream;
use quote::quote;

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic_arg(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic_arg(ty, "Vec")
}

fn single_generic_arg<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Mirror of `pgrepo::SemanticType`, decided from the field's Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticKind {
    Uuid,
    Text,
    Integer,
    Float,
    Boolean,
    Decimal,
    Timestamp,
    Date,
    Time,
    Bytes,
    Json,
    Other,
}

impl SemanticKind {
    /// `::pgrepo::SemanticType::<Variant>`
    pub fn to_tokens(self) -> TokenStream {
        let variant = match self {
            Self::Uuid => quote!(Uuid),
            Self::Text => quote!(Text),
            Self::Integer => quote!(Integer),
            Self::Float => quote!(Float),
            Self::Boolean => quote!(Boolean),
            Self::Decimal => quote!(Decimal),
            Self::Timestamp => quote!(Timestamp),
            Self::Date => quote!(Date),
            Self::Time => quote!(Time),
            Self::Bytes => quote!(Bytes),
            Self::Json => quote!(Json),
            Self::Other => quote!(Other),
        };
        quote!(::pgrepo::SemanticType::#variant)
    }
}

/// Classify a field type, looking through `Option<T>`.
///
/// Returns the kind and whether the field is nullable.
pub fn semantic_kind(ty: &syn::Type) -> (SemanticKind, bool) {
    match option_inner(ty) {
        Some(inner) => (classify(inner), true),
        None => (classify(ty), false),
    }
}

fn classify(ty: &syn::Type) -> SemanticKind {
    if let Some(inner) = vec_inner(ty) {
        return match last_ident(inner).as_deref() {
            Some("u8") => SemanticKind::Bytes,
            _ => SemanticKind::Other,
        };
    }

    let Some(ident) = last_ident(ty) else {
        return SemanticKind::Other;
    };
    match ident.as_str() {
        "Uuid" => SemanticKind::Uuid,
        "String" | "str" => SemanticKind::Text,
        "i8" | "i16" | "i32" | "i64" | "u32" => SemanticKind::Integer,
        "f32" | "f64" => SemanticKind::Float,
        "bool" => SemanticKind::Boolean,
        "Decimal" => SemanticKind::Decimal,
        "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "PrimitiveDateTime" | "SystemTime" => {
            SemanticKind::Timestamp
        }
        "NaiveDate" | "Date" => SemanticKind::Date,
        "NaiveTime" | "Time" => SemanticKind::Time,
        "Value" | "Json" => SemanticKind::Json,
        _ => SemanticKind::Other,
    }
}

fn last_ident(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(type_path) => type_path.path.segments.last().map(|s| s.ident.to_string()),
        syn::Type::Reference(r) => last_ident(&r.elem),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn classifies_common_types() {
        let cases: [(syn::Type, SemanticKind); 9] = [
            (parse_quote!(uuid::Uuid), SemanticKind::Uuid),
            (parse_quote!(String), SemanticKind::Text),
            (parse_quote!(i64), SemanticKind::Integer),
            (parse_quote!(f64), SemanticKind::Float),
            (parse_quote!(bool), SemanticKind::Boolean),
            (parse_quote!(chrono::DateTime<chrono::Utc>), SemanticKind::Timestamp),
            (parse_quote!(chrono::NaiveDate), SemanticKind::Date),
            (parse_quote!(Vec<u8>), SemanticKind::Bytes),
            (parse_quote!(serde_json::Value), SemanticKind::Json),
        ];
        for (ty, expected) in cases {
            assert_eq!(semantic_kind(&ty), (expected, false));
        }
    }

    #[test]
    fn option_marks_nullable() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert_eq!(semantic_kind(&ty), (SemanticKind::Text, true));
    }

    #[test]
    fn unknown_types_are_other() {
        let ty: syn::Type = parse_quote!(Vec<String>);
        assert_eq!(semantic_kind(&ty), (SemanticKind::Other, false));

        let ty: syn::Type = parse_quote!(MyEnum);
        assert_eq!(semantic_kind(&ty), (SemanticKind::Other, false));
    }
}
