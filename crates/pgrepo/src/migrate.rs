//! SQL migrations via [`refinery`].
//!
//! The repository assumes its tables exist; this module is a thin helper for
//! creating them. Migration files live in the application crate and are
//! embedded at compile time.
//!
//! # Example
//!
//! ```ignore
//! mod embedded {
//!     pgrepo::embed_migrations!("./migrations");
//! }
//!
//! let connector = pgrepo::PgConnector::from_env("DATABASE_URL")?;
//! pgrepo::migrate::run(&connector, embedded::migrations::runner()).await?;
//! ```

use crate::connect::{Connection, Connector};
use crate::error::RepoResult;

pub use refinery::{Migration, Report, Runner, embed_migrations};

/// Apply pending migrations on a connection taken from `connector`.
pub async fn run<C: Connector>(connector: &C, runner: Runner) -> RepoResult<Report> {
    let mut conn = connector.connect().await?;
    let result = run_on(conn.client_mut(), runner).await;
    conn.release().await;
    result
}

/// Apply pending migrations on an existing client.
pub async fn run_on(client: &mut tokio_postgres::Client, runner: Runner) -> RepoResult<Report> {
    let report = runner.run_async(client).await?;
    for migration in report.applied_migrations() {
        tracing::info!(
            target: "pgrepo",
            version = migration.version(),
            name = migration.name(),
            "migration applied"
        );
    }
    Ok(report)
}
