//! Record schema descriptors.
//!
//! A [`RecordSchema`] is the static description of a record type: its fields
//! in declaration order, the column each maps to, which one is the identity,
//! and which are excluded from generated INSERT/UPDATE column lists.
//!
//! Descriptors are normally produced by `#[derive(Record)]`, but they are
//! plain `const`-constructible data and can be written by hand:
//!
//! ```ignore
//! use pgrepo::{FieldDef, IdentityPolicy, RecordSchema, SemanticType};
//!
//! static USER_SCHEMA: RecordSchema = RecordSchema::new(
//!     &[
//!         FieldDef::new("id", SemanticType::Uuid).column("Id").identity(),
//!         FieldDef::new("first_name", SemanticType::Text).column("FirstName"),
//!         FieldDef::new("created_at", SemanticType::Timestamp).ignored(),
//!     ],
//!     IdentityPolicy::ClientSupplied,
//! );
//! ```

use crate::error::{RepoError, RepoResult};
use crate::ident::is_plain_ident;
use crate::row::FromRow;
use std::collections::HashSet;
use std::fmt;
use tokio_postgres::types::ToSql;

/// Coarse semantic type of a field, as seen by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
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

/// Who produces the identity value of a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityPolicy {
    /// The caller sets the identity before insert; it is part of INSERT lists.
    ClientSupplied,
    /// The database assigns the identity; it is left out of INSERT lists.
    ServerGenerated,
}

impl IdentityPolicy {
    /// Default policy for an identity of the given type.
    ///
    /// UUID and text identities are supplied by the caller; every other type
    /// is assumed to be generated by the database.
    pub const fn for_type(ty: SemanticType) -> Self {
        match ty {
            SemanticType::Uuid | SemanticType::Text => Self::ClientSupplied,
            _ => Self::ServerGenerated,
        }
    }
}

/// One persisted field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: &'static str,
    /// SQL column name.
    pub column: &'static str,
    pub ty: SemanticType,
    pub nullable: bool,
    /// Excluded from generated INSERT/UPDATE column lists (computed or audit columns).
    pub ignored: bool,
    pub identity: bool,
}

impl FieldDef {
    /// A field whose column is named like the field.
    pub const fn new(name: &'static str, ty: SemanticType) -> Self {
        Self {
            name,
            column: name,
            ty,
            nullable: false,
            ignored: false,
            identity: false,
        }
    }

    /// Map the field to a differently named column.
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Exclude the field from INSERT/UPDATE column lists.
    pub const fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Mark the field as the record identity.
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// Static description of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    fields: &'static [FieldDef],
    identity_policy: IdentityPolicy,
}

impl RecordSchema {
    pub const fn new(fields: &'static [FieldDef], identity_policy: IdentityPolicy) -> Self {
        Self {
            fields,
            identity_policy,
        }
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    pub fn identity_policy(&self) -> IdentityPolicy {
        self.identity_policy
    }

    /// The identity field, if one is declared.
    pub fn identity(&self) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.identity)
    }

    /// Fields that take part in generated INSERT/UPDATE lists, in declaration order.
    ///
    /// This is the only place the `ignored` marker is interpreted; every
    /// write statement shape goes through it.
    pub fn included(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| !f.ignored)
    }

    /// Check that the schema can produce well-formed SQL.
    ///
    /// Returns the identity field on success.
    pub fn validate(&self) -> RepoResult<&'static FieldDef> {
        if self.fields.is_empty() {
            return Err(RepoError::schema("record declares no fields"));
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in self.fields {
            if !is_plain_ident(field.column) {
                return Err(RepoError::schema(format!(
                    "column '{}' of field '{}' is not a valid SQL identifier",
                    field.column, field.name
                )));
            }
            if !seen.insert(field.column) {
                return Err(RepoError::schema(format!(
                    "column '{}' is mapped more than once",
                    field.column
                )));
            }
        }

        let mut identities = self.fields.iter().filter(|f| f.identity);
        let identity = identities
            .next()
            .ok_or_else(|| RepoError::schema("record declares no identity field"))?;
        if let Some(extra) = identities.next() {
            return Err(RepoError::schema(format!(
                "record declares more than one identity field ('{}' and '{}')",
                identity.name, extra.name
            )));
        }
        if identity.ignored {
            return Err(RepoError::schema(format!(
                "identity field '{}' cannot be ignored",
                identity.name
            )));
        }

        Ok(identity)
    }
}

/// A record type the generic repository can persist.
///
/// Usually derived together with [`FromRow`]:
///
/// ```ignore
/// #[derive(FromRow, Record)]
/// struct User {
///     #[orm(id, column = "Id")]
///     id: uuid::Uuid,
///     #[orm(column = "FirstName")]
///     first_name: String,
/// }
/// ```
pub trait Record: FromRow + Send + Sync {
    /// Rust type of the identity field.
    type Id: ToSql + Sync + Send + fmt::Debug;

    /// The static schema descriptor of this record type.
    fn schema() -> &'static RecordSchema;

    /// The identity value of this record.
    fn id(&self) -> &Self::Id;

    /// The value bound for `column`, or `None` if the record has no such column.
    fn column_value(&self, column: &str) -> Option<&(dyn ToSql + Sync)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static USERS: [FieldDef; 4] = [
        FieldDef::new("id", SemanticType::Uuid).column("Id").identity(),
        FieldDef::new("first_name", SemanticType::Text).column("FirstName"),
        FieldDef::new("last_name", SemanticType::Text).column("LastName"),
        FieldDef::new("created_at", SemanticType::Timestamp)
            .column("CreatedAt")
            .ignored(),
    ];

    #[test]
    fn identity_policy_follows_type() {
        assert_eq!(
            IdentityPolicy::for_type(SemanticType::Uuid),
            IdentityPolicy::ClientSupplied
        );
        assert_eq!(
            IdentityPolicy::for_type(SemanticType::Text),
            IdentityPolicy::ClientSupplied
        );
        assert_eq!(
            IdentityPolicy::for_type(SemanticType::Integer),
            IdentityPolicy::ServerGenerated
        );
        assert_eq!(
            IdentityPolicy::for_type(SemanticType::Other),
            IdentityPolicy::ServerGenerated
        );
    }

    #[test]
    fn included_skips_ignored_and_keeps_order() {
        let schema = RecordSchema::new(&USERS, IdentityPolicy::ClientSupplied);
        let cols: Vec<_> = schema.included().map(|f| f.column).collect();
        assert_eq!(cols, ["Id", "FirstName", "LastName"]);
    }

    #[test]
    fn validate_returns_identity() {
        let schema = RecordSchema::new(&USERS, IdentityPolicy::ClientSupplied);
        assert_eq!(schema.validate().unwrap().column, "Id");
    }

    #[test]
    fn validate_rejects_empty_schema() {
        let schema = RecordSchema::new(&[], IdentityPolicy::ServerGenerated);
        assert!(schema.validate().unwrap_err().is_schema());
    }

    #[test]
    fn validate_rejects_missing_identity() {
        static FIELDS: [FieldDef; 1] = [FieldDef::new("name", SemanticType::Text)];
        let schema = RecordSchema::new(&FIELDS, IdentityPolicy::ServerGenerated);
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("no identity field"));
    }

    #[test]
    fn validate_rejects_two_identities() {
        static FIELDS: [FieldDef; 2] = [
            FieldDef::new("id", SemanticType::Integer).identity(),
            FieldDef::new("other_id", SemanticType::Integer).identity(),
        ];
        let schema = RecordSchema::new(&FIELDS, IdentityPolicy::ServerGenerated);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn validate_rejects_ignored_identity() {
        static FIELDS: [FieldDef; 2] = [
            FieldDef::new("id", SemanticType::Integer).identity().ignored(),
            FieldDef::new("name", SemanticType::Text),
        ];
        let schema = RecordSchema::new(&FIELDS, IdentityPolicy::ServerGenerated);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_and_duplicate_columns() {
        static BAD: [FieldDef; 2] = [
            FieldDef::new("id", SemanticType::Integer).identity(),
            FieldDef::new("name", SemanticType::Text).column("name; --"),
        ];
        assert!(
            RecordSchema::new(&BAD, IdentityPolicy::ServerGenerated)
                .validate()
                .is_err()
        );

        static DUP: [FieldDef; 3] = [
            FieldDef::new("id", SemanticType::Integer).identity(),
            FieldDef::new("name", SemanticType::Text),
            FieldDef::new("alias", SemanticType::Text).column("name"),
        ];
        assert!(
            RecordSchema::new(&DUP, IdentityPolicy::ServerGenerated)
                .validate()
                .is_err()
        );
    }
}
