//! Repository configuration.

use crate::trace::SqlTracer;
use std::time::Duration;

/// Transaction isolation level requested for upserts.
///
/// The upsert statement already serialises writers on the row it touches, so
/// `ReadCommitted` lets concurrent callers queue. Stricter levels turn that
/// wait into a serialization failure (SQLSTATE 40001) for all but one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpsertIsolation {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl UpsertIsolation {
    pub(crate) fn to_driver(self) -> tokio_postgres::IsolationLevel {
        match self {
            Self::ReadCommitted => tokio_postgres::IsolationLevel::ReadCommitted,
            Self::RepeatableRead => tokio_postgres::IsolationLevel::RepeatableRead,
            Self::Serializable => tokio_postgres::IsolationLevel::Serializable,
        }
    }
}

/// Configuration for [`GenericRepository`](crate::GenericRepository).
///
/// ```ignore
/// let config = RepositoryConfig::new()
///     .statement_timeout(Duration::from_secs(5))
///     .atomic_batches(true);
/// let repo = GenericRepository::<User, _>::with_config(connector, "Users", config)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Upper bound for a single statement. `None` waits indefinitely.
    pub statement_timeout: Option<Duration>,
    /// Isolation of the transaction wrapping an upsert.
    pub upsert_isolation: UpsertIsolation,
    /// Run `save_range` inside one transaction.
    pub atomic_batches: bool,
    pub tracer: SqlTracer,
}

impl RepositoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set statement timeout.
    pub fn statement_timeout(mut self, duration: Duration) -> Self {
        self.statement_timeout = Some(duration);
        self
    }

    /// Set the isolation level used for upserts.
    pub fn upsert_isolation(mut self, isolation: UpsertIsolation) -> Self {
        self.upsert_isolation = isolation;
        self
    }

    /// All-or-nothing `save_range`.
    pub fn atomic_batches(mut self, enabled: bool) -> Self {
        self.atomic_batches = enabled;
        self
    }

    /// Replace the SQL tracer.
    pub fn tracer(mut self, tracer: SqlTracer) -> Self {
        self.tracer = tracer;
        self
    }
}
