//! The generic repository.
//!
//! [`GenericRepository<T, C>`] performs whole-row CRUD against one table for
//! any [`Record`] type. SQL is generated by the [`QueryBuilder`] on every
//! call from `T::schema()`; connections come from a [`Connector`] and are
//! released before each operation returns.
//!
//! ```ignore
//! use pgrepo::{FromRow, GenericRepository, PgConnector, Record, SaveMode};
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
//! let repo = GenericRepository::<User, _>::new(PgConnector::from_env("DATABASE_URL")?, "Users")?;
//! repo.insert(&user).await?;
//! let fetched = repo.get(&user.id).await?;
//! repo.save(&fetched, SaveMode::Upsert).await?;
//! repo.delete_row(&user.id).await?;
//! ```

use crate::client::GenericClient;
use crate::config::RepositoryConfig;
use crate::connect::{Connection, Connector};
use crate::error::{RepoError, RepoResult};
use crate::query_builder::QueryBuilder;
use crate::row::map_rows;
use crate::schema::Record;
use crate::statement::Statement;
use std::future::Future;
use std::marker::PhantomData;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// How [`GenericRepository::save`] writes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Plain INSERT; a duplicate identity is a constraint violation.
    #[default]
    Insert,
    /// Update the row if it exists, insert it otherwise.
    Upsert,
}

/// The repository contract, independent of how connections are obtained.
pub trait Repository<T: Record>: Send + Sync {
    /// Every row of the table.
    fn get_all(&self) -> impl Future<Output = RepoResult<Vec<T>>> + Send;

    /// The row with identity `id`, or [`RepoError::NotFound`].
    fn get(&self, id: &T::Id) -> impl Future<Output = RepoResult<T>> + Send;

    fn insert(&self, record: &T) -> impl Future<Output = RepoResult<()>> + Send;

    /// Update the row matching the record's identity. No matching row is not an error.
    fn update(&self, record: &T) -> impl Future<Output = RepoResult<()>> + Send;

    fn save(&self, record: &T, mode: SaveMode) -> impl Future<Output = RepoResult<()>> + Send;

    /// Insert every record; returns the number of rows inserted.
    fn save_range(&self, records: &[T]) -> impl Future<Output = RepoResult<u64>> + Send;

    /// Delete the row with identity `id`. No matching row is not an error.
    fn delete_row(&self, id: &T::Id) -> impl Future<Output = RepoResult<()>> + Send;
}

/// CRUD over one table for one record type.
pub struct GenericRepository<T, C> {
    connector: C,
    builder: QueryBuilder,
    table: String,
    config: RepositoryConfig,
    _record: PhantomData<fn() -> T>,
}

impl<T, C> std::fmt::Debug for GenericRepository<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericRepository")
            .field("table", &self.table)
            .field("record", &std::any::type_name::<T>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Record, C: Connector> GenericRepository<T, C> {
    /// Bind `T` to `table`.
    ///
    /// The table name and `T::schema()` are validated here, so a repository
    /// that was constructed can always generate its statements.
    pub fn new(connector: C, table: &str) -> RepoResult<Self> {
        Self::with_config(connector, table, RepositoryConfig::default())
    }

    pub fn with_config(connector: C, table: &str, config: RepositoryConfig) -> RepoResult<Self> {
        let builder = QueryBuilder::new(table, T::schema())?;
        Ok(Self {
            table: builder.table(),
            connector,
            builder,
            config,
            _record: PhantomData,
        })
    }

    /// The bound table name as rendered in SQL.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn get_all(&self) -> RepoResult<Vec<T>> {
        let stmt = self.builder.select_all()?;
        let conn = self.connector.connect().await?;
        let result = self.query(&conn, &stmt, &[]).await;
        conn.release().await;
        map_rows(&result?)
    }

    pub async fn get(&self, id: &T::Id) -> RepoResult<T> {
        let stmt = self.builder.select_by_id()?;
        let conn = self.connector.connect().await?;
        let result = self.query_opt(&conn, &stmt, &[id]).await;
        conn.release().await;
        match result? {
            Some(row) => T::from_row(&row),
            None => Err(RepoError::not_found(format!(
                "{} with id [{id:?}] could not be found.",
                self.table
            ))),
        }
    }

    pub async fn insert(&self, record: &T) -> RepoResult<()> {
        let stmt = self.builder.insert()?;
        let params = stmt.bind(record)?;
        let conn = self.connector.connect().await?;
        let result = self.execute(&conn, &stmt, &params).await;
        conn.release().await;
        result.map(drop)
    }

    pub async fn update(&self, record: &T) -> RepoResult<()> {
        let stmt = self.builder.update()?;
        let params = stmt.bind(record)?;
        let conn = self.connector.connect().await?;
        let result = self.execute(&conn, &stmt, &params).await;
        conn.release().await;
        if result? == 0 {
            tracing::debug!(
                target: "pgrepo",
                table = %self.table,
                id = ?record.id(),
                "update matched no rows"
            );
        }
        Ok(())
    }

    pub async fn save(&self, record: &T, mode: SaveMode) -> RepoResult<()> {
        match mode {
            SaveMode::Insert => self.insert(record).await,
            SaveMode::Upsert => self.upsert(record).await,
        }
    }

    async fn upsert(&self, record: &T) -> RepoResult<()> {
        let stmt = self.builder.upsert()?;
        let params = stmt.bind(record)?;
        let mut conn = self.connector.connect().await?;
        let result = self.upsert_in_transaction(&mut conn, &stmt, &params).await;
        conn.release().await;
        result
    }

    async fn upsert_in_transaction(
        &self,
        conn: &mut C::Connection,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<()> {
        let tx = conn
            .client_mut()
            .build_transaction()
            .isolation_level(self.config.upsert_isolation.to_driver())
            .start()
            .await
            .map_err(RepoError::from_db_error)?;
        // An error drops `tx`, which rolls back.
        self.execute(&tx, stmt, params).await?;
        tx.commit().await.map_err(RepoError::from_db_error)
    }

    pub async fn save_range(&self, records: &[T]) -> RepoResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let stmt = self.builder.insert()?;
        let mut conn = self.connector.connect().await?;
        let result = if self.config.atomic_batches {
            self.insert_all_atomic(&mut conn, &stmt, records).await
        } else {
            self.insert_all(&conn, &stmt, records).await
        };
        conn.release().await;
        result
    }

    async fn insert_all_atomic(
        &self,
        conn: &mut C::Connection,
        stmt: &Statement,
        records: &[T],
    ) -> RepoResult<u64> {
        let tx = conn
            .client_mut()
            .transaction()
            .await
            .map_err(RepoError::from_db_error)?;
        let inserted = self.insert_all(&tx, stmt, records).await?;
        tx.commit().await.map_err(RepoError::from_db_error)?;
        Ok(inserted)
    }

    /// Prepare the INSERT once, then execute it per record.
    async fn insert_all<G: GenericClient>(
        &self,
        client: &G,
        stmt: &Statement,
        records: &[T],
    ) -> RepoResult<u64> {
        let sql = stmt.to_sql();
        self.config.tracer.statement(&self.table, stmt, &sql);
        let prepared = self.timed(client, client.prepare_statement(&sql)).await?;

        let mut inserted = 0;
        for record in records {
            let params = stmt.bind(record)?;
            inserted += self
                .timed(client, client.execute_prepared(&prepared, &params))
                .await?;
        }
        tracing::debug!(target: "pgrepo", table = %self.table, inserted, "batch insert finished");
        Ok(inserted)
    }

    pub async fn delete_row(&self, id: &T::Id) -> RepoResult<()> {
        let stmt = self.builder.delete_by_id()?;
        let conn = self.connector.connect().await?;
        let result = self.execute(&conn, &stmt, &[id]).await;
        conn.release().await;
        if result? == 0 {
            tracing::debug!(target: "pgrepo", table = %self.table, id = ?id, "delete matched no rows");
        }
        Ok(())
    }

    async fn query<G: GenericClient>(
        &self,
        client: &G,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Vec<Row>> {
        let sql = stmt.to_sql();
        self.config.tracer.statement(&self.table, stmt, &sql);
        self.timed(client, client.query(&sql, params)).await
    }

    async fn query_opt<G: GenericClient>(
        &self,
        client: &G,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Option<Row>> {
        let sql = stmt.to_sql();
        self.config.tracer.statement(&self.table, stmt, &sql);
        self.timed(client, client.query_opt(&sql, params)).await
    }

    async fn execute<G: GenericClient>(
        &self,
        client: &G,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<u64> {
        let sql = stmt.to_sql();
        self.config.tracer.statement(&self.table, stmt, &sql);
        self.timed(client, client.execute(&sql, params)).await
    }

    /// Apply the configured statement timeout, cancelling the server-side query on expiry.
    async fn timed<G, R, F>(&self, client: &G, future: F) -> RepoResult<R>
    where
        G: GenericClient,
        F: Future<Output = RepoResult<R>> + Send,
    {
        match self.config.statement_timeout {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => {
                        if let Some(cancel_token) = client.cancel_token() {
                            tokio::spawn(async move {
                                let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                            });
                        }
                        Err(RepoError::Timeout(timeout))
                    }
                }
            }
            None => future.await,
        }
    }
}

impl<T: Record, C: Connector> Repository<T> for GenericRepository<T, C> {
    fn get_all(&self) -> impl Future<Output = RepoResult<Vec<T>>> + Send {
        GenericRepository::get_all(self)
    }

    fn get(&self, id: &T::Id) -> impl Future<Output = RepoResult<T>> + Send {
        GenericRepository::get(self, id)
    }

    fn insert(&self, record: &T) -> impl Future<Output = RepoResult<()>> + Send {
        GenericRepository::insert(self, record)
    }

    fn update(&self, record: &T) -> impl Future<Output = RepoResult<()>> + Send {
        GenericRepository::update(self, record)
    }

    fn save(&self, record: &T, mode: SaveMode) -> impl Future<Output = RepoResult<()>> + Send {
        GenericRepository::save(self, record, mode)
    }

    fn save_range(&self, records: &[T]) -> impl Future<Output = RepoResult<u64>> + Send {
        GenericRepository::save_range(self, records)
    }

    fn delete_row(&self, id: &T::Id) -> impl Future<Output = RepoResult<()>> + Send {
        GenericRepository::delete_row(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::PgConnector;
    use crate::row::{FromRow, RowExt};
    use crate::schema::{FieldDef, IdentityPolicy, RecordSchema, SemanticType};

    #[derive(Debug)]
    struct Tag {
        id: i64,
        label: String,
    }

    static TAG_SCHEMA: RecordSchema = RecordSchema::new(
        &[
            FieldDef::new("id", SemanticType::Integer).identity(),
            FieldDef::new("label", SemanticType::Text),
        ],
        IdentityPolicy::ServerGenerated,
    );

    impl FromRow for Tag {
        fn from_row(row: &Row) -> RepoResult<Self> {
            Ok(Self {
                id: row.try_get_column("id")?,
                label: row.try_get_column("label")?,
            })
        }
    }

    impl Record for Tag {
        type Id = i64;

        fn schema() -> &'static RecordSchema {
            &TAG_SCHEMA
        }

        fn id(&self) -> &i64 {
            &self.id
        }

        fn column_value(&self, column: &str) -> Option<&(dyn ToSql + Sync)> {
            match column {
                "id" => Some(&self.id),
                "label" => Some(&self.label),
                _ => None,
            }
        }
    }

    fn connector() -> PgConnector {
        PgConnector::new("postgres://app@localhost/app").unwrap()
    }

    #[test]
    fn construction_validates_table_name() {
        let err = GenericRepository::<Tag, _>::new(connector(), "tags where 1=1").unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn construction_keeps_rendered_table() {
        let repo = GenericRepository::<Tag, _>::new(connector(), "public.tags").unwrap();
        assert_eq!(repo.table(), "public.tags");
        assert!(!repo.config().atomic_batches);
    }

    #[tokio::test]
    async fn empty_batch_does_not_connect() {
        // Nothing listens on this port; connecting would fail.
        let connector = PgConnector::new("postgres://app@127.0.0.1:1/app").unwrap();
        let repo = GenericRepository::<Tag, _>::new(connector, "tags").unwrap();
        assert_eq!(repo.save_range(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreachable_database_is_a_connection_error() {
        let connector = PgConnector::new("postgres://app@127.0.0.1:1/app").unwrap();
        let repo = GenericRepository::<Tag, _>::new(connector, "tags").unwrap();
        let tag = Tag {
            id: 1,
            label: "x".into(),
        };
        assert!(repo.insert(&tag).await.unwrap_err().is_connection());
        assert!(repo.get_all().await.unwrap_err().is_connection());
    }
}
