//! Row mapping traits and utilities

use crate::error::{RepoError, RepoResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`
/// from the `pgrepo-derive` crate. Columns are looked up by name, so the
/// order of the SELECT list does not matter.
///
/// # Example
///
/// ```ignore
/// use pgrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     #[orm(column = "Id")]
///     id: uuid::Uuid,
///     #[orm(column = "FirstName")]
///     first_name: String,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> RepoResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning RepoError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| RepoError::decode(column, e.to_string()))
    }
}

/// Map every row, stopping at the first decode failure.
pub(crate) fn map_rows<T: FromRow>(rows: &[Row]) -> RepoResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}
