//! Derive macros for pgrepo
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod from_row;
mod record;
mod sql_ident;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use pgrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map field to a different column name
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` for a struct, making it usable with `GenericRepository`.
///
/// The type must also implement `FromRow` (usually derived alongside).
///
/// # Example
///
/// ```ignore
/// use pgrepo::{FromRow, Record};
///
/// #[derive(FromRow, Record)]
/// struct User {
///     #[orm(id, column = "Id")]
///     id: uuid::Uuid,
///     #[orm(column = "FirstName")]
///     first_name: String,
///     #[orm(ignore)]
///     created_at: Option<chrono::DateTime<chrono::Utc>>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(id)]` - Mark the identity field (defaults to the field named `id`)
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(ignore)]` - Read on select, never written by insert/update
/// - `#[orm(generated)]` / `#[orm(client_supplied)]` - Override who produces
///   the identity value (default: client for `Uuid`/`String`, server otherwise)
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
