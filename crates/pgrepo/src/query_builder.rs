//! Statement generation from a table binding and a record schema.
//!
//! [`QueryBuilder`] is pure: it never touches a connection. Column lists are
//! derived from [`RecordSchema::included`], so INSERT, UPDATE and UPSERT can
//! never disagree about which fields are persisted.
//!
//! Shapes (named placeholders shown):
//!
//! ```text
//! INSERT INTO Users ("Id", "FirstName") VALUES (@Id, @FirstName)
//! UPDATE Users SET "FirstName" = @FirstName WHERE "Id" = @Id
//! SELECT "Id", "FirstName" FROM Users
//! SELECT "Id", "FirstName" FROM Users WHERE "Id" = @Id
//! DELETE FROM Users WHERE "Id" = @Id
//! ```
//!
//! The upsert is a single statement. A client-supplied identity is resolved
//! by the primary key itself:
//!
//! ```text
//! INSERT INTO Users ("Id", "FirstName") VALUES (@Id, @FirstName)
//! ON CONFLICT ("Id") DO UPDATE SET "FirstName" = EXCLUDED."FirstName"
//! ```
//!
//! A server-generated identity never conflicts on insert, so the existence
//! check locks the row instead:
//!
//! ```text
//! WITH existing AS (SELECT "id" FROM orders WHERE "id" = @id FOR UPDATE),
//! updated AS (UPDATE orders SET "total" = @total WHERE "id" = @id RETURNING "id")
//! INSERT INTO orders ("total") SELECT @total
//! WHERE NOT EXISTS (SELECT 1 FROM existing)
//! ```

use crate::error::{RepoError, RepoResult};
use crate::ident::Ident;
use crate::schema::{FieldDef, IdentityPolicy, RecordSchema};
use crate::statement::{Statement, StatementBuilder, StatementKind};

/// A column as it appears in generated SQL: quoted identifier + parameter name.
struct Column {
    ident: Ident,
    param: &'static str,
}

impl Column {
    fn of(field: &'static FieldDef) -> RepoResult<Self> {
        Ok(Self {
            ident: Ident::column(field.column)?,
            param: field.column,
        })
    }
}

/// Builds the six statement shapes for one table binding.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: Ident,
    schema: &'static RecordSchema,
    identity: &'static FieldDef,
}

impl QueryBuilder {
    /// Validate the table name and schema, then bind them together.
    pub fn new(table: &str, schema: &'static RecordSchema) -> RepoResult<Self> {
        let table = Ident::parse(table)?;
        let identity = schema.validate()?;
        Ok(Self {
            table,
            schema,
            identity,
        })
    }

    /// The rendered table name.
    pub fn table(&self) -> String {
        self.table.to_sql()
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Columns of an INSERT, identity included only when the caller supplies it.
    fn insert_columns(&self) -> RepoResult<Vec<Column>> {
        let include_identity = self.schema.identity_policy() == IdentityPolicy::ClientSupplied;
        self.schema
            .included()
            .filter(|f| include_identity || !f.identity)
            .map(Column::of)
            .collect()
    }

    /// Columns of an UPDATE SET list: everything included except the identity.
    fn update_columns(&self) -> RepoResult<Vec<Column>> {
        let cols: Vec<Column> = self
            .schema
            .included()
            .filter(|f| !f.identity)
            .map(Column::of)
            .collect::<RepoResult<_>>()?;
        if cols.is_empty() {
            return Err(RepoError::schema(format!(
                "record has no updatable columns besides identity '{}'",
                self.identity.column
            )));
        }
        Ok(cols)
    }

    fn identity_column(&self) -> RepoResult<Column> {
        Column::of(self.identity)
    }

    fn push_where_identity(&self, b: &mut StatementBuilder, id: &Column) {
        b.push(" WHERE ").push_ident(&id.ident).push(" = ").push_param(id.param);
    }

    fn push_set_list(b: &mut StatementBuilder, cols: &[Column]) {
        b.push_separated(cols, ", ", |b, col| {
            b.push_ident(&col.ident).push(" = ").push_param(col.param);
        });
    }

    fn push_column_list(b: &mut StatementBuilder, cols: &[Column]) {
        b.push_separated(cols, ", ", |b, col| {
            b.push_ident(&col.ident);
        });
    }

    fn push_param_list(b: &mut StatementBuilder, cols: &[Column]) {
        b.push_separated(cols, ", ", |b, col| {
            b.push_param(col.param);
        });
    }

    /// `INSERT INTO t (cols) VALUES (params)`, or `DEFAULT VALUES` when nothing is insertable.
    pub fn insert(&self) -> RepoResult<Statement> {
        let cols = self.insert_columns()?;
        let mut b = Statement::builder(StatementKind::Insert);
        b.push("INSERT INTO ").push_ident(&self.table);
        if cols.is_empty() {
            b.push(" DEFAULT VALUES");
        } else {
            b.push(" (");
            Self::push_column_list(&mut b, &cols);
            b.push(") VALUES (");
            Self::push_param_list(&mut b, &cols);
            b.push(")");
        }
        Ok(b.build())
    }

    /// `UPDATE t SET c = @c, ... WHERE id = @id`.
    pub fn update(&self) -> RepoResult<Statement> {
        let cols = self.update_columns()?;
        let id = self.identity_column()?;
        let mut b = Statement::builder(StatementKind::Update);
        b.push("UPDATE ").push_ident(&self.table).push(" SET ");
        Self::push_set_list(&mut b, &cols);
        self.push_where_identity(&mut b, &id);
        Ok(b.build())
    }

    /// Update-or-insert in one statement.
    pub fn upsert(&self) -> RepoResult<Statement> {
        let set_cols = self.update_columns()?;
        let insert_cols = self.insert_columns()?;
        let id = self.identity_column()?;

        let mut b = Statement::builder(StatementKind::Upsert);
        match self.schema.identity_policy() {
            IdentityPolicy::ClientSupplied => {
                b.push("INSERT INTO ").push_ident(&self.table).push(" (");
                Self::push_column_list(&mut b, &insert_cols);
                b.push(") VALUES (");
                Self::push_param_list(&mut b, &insert_cols);
                b.push(") ON CONFLICT (")
                    .push_ident(&id.ident)
                    .push(") DO UPDATE SET ");
                b.push_separated(&set_cols, ", ", |b, col| {
                    b.push_ident(&col.ident)
                        .push(" = EXCLUDED.")
                        .push_ident(&col.ident);
                });
            }
            IdentityPolicy::ServerGenerated => {
                b.push("WITH existing AS (SELECT ")
                    .push_ident(&id.ident)
                    .push(" FROM ")
                    .push_ident(&self.table);
                self.push_where_identity(&mut b, &id);
                b.push(" FOR UPDATE), updated AS (UPDATE ")
                    .push_ident(&self.table)
                    .push(" SET ");
                Self::push_set_list(&mut b, &set_cols);
                self.push_where_identity(&mut b, &id);
                b.push(" RETURNING ")
                    .push_ident(&id.ident)
                    .push(") INSERT INTO ")
                    .push_ident(&self.table)
                    .push(" (");
                Self::push_column_list(&mut b, &insert_cols);
                b.push(") SELECT ");
                Self::push_param_list(&mut b, &insert_cols);
                b.push(" WHERE NOT EXISTS (SELECT 1 FROM existing)");
            }
        }
        Ok(b.build())
    }

    fn push_select_list(&self, b: &mut StatementBuilder) -> RepoResult<()> {
        let cols = self
            .schema
            .fields()
            .iter()
            .map(Column::of)
            .collect::<RepoResult<Vec<_>>>()?;
        b.push("SELECT ");
        Self::push_column_list(b, &cols);
        b.push(" FROM ").push_ident(&self.table);
        Ok(())
    }

    /// `SELECT <every column> FROM t`.
    pub fn select_all(&self) -> RepoResult<Statement> {
        let mut b = Statement::builder(StatementKind::SelectAll);
        self.push_select_list(&mut b)?;
        Ok(b.build())
    }

    /// `SELECT <every column> FROM t WHERE id = @id`.
    pub fn select_by_id(&self) -> RepoResult<Statement> {
        let id = self.identity_column()?;
        let mut b = Statement::builder(StatementKind::SelectById);
        self.push_select_list(&mut b)?;
        self.push_where_identity(&mut b, &id);
        Ok(b.build())
    }

    /// `DELETE FROM t WHERE id = @id`.
    pub fn delete_by_id(&self) -> RepoResult<Statement> {
        let id = self.identity_column()?;
        let mut b = Statement::builder(StatementKind::DeleteById);
        b.push("DELETE FROM ").push_ident(&self.table);
        self.push_where_identity(&mut b, &id);
        Ok(b.build())
    }
}
