//! Error types for pgrepo

use thiserror::Error;

/// Result type alias for pgrepo operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Error types for repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    /// The database could not be reached or the connection broke.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error not covered by a more specific variant
    #[error("Query error: {}", describe(.0))]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation (duplicate identity included)
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// NOT NULL constraint violation
    #[error("Not null violation: {0}")]
    NotNullViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The record schema cannot produce valid SQL (empty field list, missing identity, ...)
    #[error("Invalid record schema: {0}")]
    Schema(String),

    /// Invalid identifier or argument
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statement timeout
    #[error("Statement timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Migration error
    #[cfg(feature = "migrate")]
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Driver error text with the server's SQLSTATE and message, or the cause chain.
fn describe(err: &tokio_postgres::Error) -> String {
    if let Some(db_err) = err.as_db_error() {
        let mut text = format!(
            "{} {}: {}",
            db_err.severity(),
            db_err.code().code(),
            db_err.message()
        );
        if let Some(detail) = db_err.detail() {
            text.push_str(&format!(" ({detail})"));
        }
        return text;
    }
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

impl RepoError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this error comes from any schema constraint (SQLSTATE class 23).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation(_)
                | Self::ForeignKeyViolation(_)
                | Self::CheckViolation(_)
                | Self::NotNullViolation(_)
        )
    }

    /// Check if this is a connection failure
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Query(err) => err.is_closed(),
            _ => false,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// SQLSTATE reported by the server, if the error came from it.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.as_db_error().map(|db_err| db_err.code().code()),
            _ => None,
        }
    }

    /// Check if this is a schema error
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Parse a tokio_postgres error into a more specific RepoError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err
                .constraint()
                .or_else(|| db_err.column())
                .unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{constraint}: {message}")),
                "23503" => return Self::ForeignKeyViolation(format!("{constraint}: {message}")),
                "23514" => return Self::CheckViolation(format!("{constraint}: {message}")),
                "23502" => return Self::NotNullViolation(format!("{constraint}: {message}")),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for RepoError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(feature = "migrate")]
impl From<refinery::Error> for RepoError {
    fn from(err: refinery::Error) -> Self {
        Self::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_variants_are_grouped() {
        assert!(RepoError::UniqueViolation("users_pkey: dup".into()).is_constraint_violation());
        assert!(RepoError::NotNullViolation("FirstName: null".into()).is_constraint_violation());
        assert!(!RepoError::not_found("Users").is_constraint_violation());
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = RepoError::not_found("Users with id [1] could not be found.");
        assert!(err.is_not_found());
        assert!(!err.is_schema());
        assert_eq!(
            err.to_string(),
            "Not found: Users with id [1] could not be found."
        );
    }

    #[test]
    fn driver_errors_keep_their_cause() {
        let err = "host=localhost port=notaport"
            .parse::<tokio_postgres::Config>()
            .unwrap_err();
        let expected = match std::error::Error::source(&err) {
            Some(source) => format!("Query error: {err}: {source}"),
            None => format!("Query error: {err}"),
        };
        let err = RepoError::Query(err);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.sqlstate(), None);
    }

    #[test]
    fn connection_errors_are_flagged() {
        assert!(RepoError::Connection("refused".into()).is_connection());
        assert!(!RepoError::schema("no identity").is_connection());
    }
}
