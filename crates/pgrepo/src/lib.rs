//! # pgrepo
//!
//! A generic, schema-driven CRUD repository for PostgreSQL.
//!
//! ## Features
//!
//! - **One repository for every table**: [`GenericRepository<T, C>`] handles
//!   get-all, get-by-id, insert, update, upsert, batch insert and delete for any [`Record`]
//! - **SQL from structure**: statements are generated from a static [`RecordSchema`],
//!   never written per entity, and values are always bound parameters
//! - **Scoped connections**: every operation acquires a connection from a
//!   [`Connector`] and releases it before returning
//! - **Derive support**: `#[derive(FromRow, Record)]` builds the schema and row mapping
//!
//! ## Example
//!
//! ```ignore
//! use pgrepo::{FromRow, GenericRepository, PgConnector, Record};
//!
//! #[derive(Debug, FromRow, Record)]
//! struct User {
//!     #[orm(id, column = "Id")]
//!     id: uuid::Uuid,
//!     #[orm(column = "FirstName")]
//!     first_name: String,
//!     #[orm(column = "LastName")]
//!     last_name: String,
//! }
//!
//! let users = GenericRepository::<User, _>::new(PgConnector::from_env("DATABASE_URL")?, "Users")?;
//! for user in users.get_all().await? {
//!     println!("{} {}", user.first_name, user.last_name);
//! }
//! ```

extern crate self as pgrepo;

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod ident;
pub mod query_builder;
pub mod repository;
pub mod row;
pub mod schema;
pub mod statement;
pub mod trace;

#[cfg(feature = "migrate")]
pub mod migrate;

pub use client::GenericClient;
pub use config::{RepositoryConfig, UpsertIsolation};
pub use connect::{Connection, Connector, PgConnector, ScopedConnection};
pub use error::{RepoError, RepoResult};
pub use ident::{Ident, IdentPart};
pub use query_builder::QueryBuilder;
pub use repository::{GenericRepository, Repository, SaveMode};
pub use row::{FromRow, RowExt};
pub use schema::{FieldDef, IdentityPolicy, Record, RecordSchema, SemanticType};
pub use statement::{Statement, StatementKind};
pub use trace::SqlTracer;

#[cfg(feature = "pool")]
pub use connect::{
    create_pool, create_pool_with_config, create_pool_with_manager_config, create_pool_with_tls,
};

#[cfg(feature = "derive")]
pub use pgrepo_derive::{FromRow, Record};

#[cfg(feature = "migrate")]
pub use migrate::embed_migrations;

// Re-exported so derive expansions and callers share one driver version.
pub use tokio_postgres;
