//! Generated statements.
//!
//! A [`Statement`] keeps SQL fragments and named parameters apart, the same
//! way the parts of a dynamic SQL builder do, so the text can be rendered in
//! two dialects:
//!
//! - [`Statement::to_named_sql`]: `@Name` placeholders, handy for logs and tests.
//! - [`Statement::to_sql`]: PostgreSQL `$n` placeholders, `$n` being `params()[n - 1]`.
//!
//! A parameter name that appears more than once (e.g. `Id` in an upsert)
//! always renders to the same `$n` and is bound once.

use crate::error::{RepoError, RepoResult};
use crate::ident::Ident;
use crate::schema::Record;
use std::fmt::Write as _;
use tokio_postgres::types::ToSql;

/// Which operation a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Upsert,
    SelectAll,
    SelectById,
    DeleteById,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::SelectAll => "select_all",
            Self::SelectById => "select_by_id",
            Self::DeleteById => "delete_by_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Raw(String),
    /// Index into `Statement::params`.
    Param(usize),
}

/// SQL text plus the ordered set of parameter names it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    parts: Vec<Part>,
    params: Vec<String>,
}

impl Statement {
    pub(crate) fn builder(kind: StatementKind) -> StatementBuilder {
        StatementBuilder {
            stmt: Statement {
                kind,
                parts: Vec::new(),
                params: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Parameter names in order of first appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Render with PostgreSQL `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        self.render(|out, idx, _| {
            let _ = write!(out, "${}", idx + 1);
        })
    }

    /// Render with `@Name` placeholders.
    pub fn to_named_sql(&self) -> String {
        self.render(|out, _, name| {
            out.push('@');
            out.push_str(name);
        })
    }

    fn render(&self, mut placeholder: impl FnMut(&mut String, usize, &str)) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param(idx) => placeholder(&mut out, *idx, &self.params[*idx]),
            }
        }
        out
    }

    /// Resolve every parameter against the record's column values.
    pub fn bind<'r, T: Record>(&self, record: &'r T) -> RepoResult<Vec<&'r (dyn ToSql + Sync)>> {
        self.params
            .iter()
            .map(|name| {
                record.column_value(name).ok_or_else(|| {
                    RepoError::schema(format!(
                        "record has no value for parameter @{name} of {} statement",
                        self.kind.as_str()
                    ))
                })
            })
            .collect()
    }
}

/// Incremental construction of a [`Statement`].
#[must_use]
pub(crate) struct StatementBuilder {
    stmt: Statement,
}

impl StatementBuilder {
    /// Append raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.stmt.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(sql),
            _ => self.stmt.parts.push(Part::Raw(sql.to_string())),
        }
        self
    }

    /// Append a rendered identifier.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        let mut sql = String::new();
        ident.write_sql(&mut sql);
        self.push(&sql)
    }

    /// Append a named parameter placeholder.
    pub fn push_param(&mut self, name: &str) -> &mut Self {
        let idx = match self.stmt.params.iter().position(|p| p == name) {
            Some(idx) => idx,
            None => {
                self.stmt.params.push(name.to_string());
                self.stmt.params.len() - 1
            }
        };
        self.stmt.parts.push(Part::Param(idx));
        self
    }

    /// Append `items` separated by `sep`, rendering each with `f`.
    ///
    /// Separators only ever go between items.
    pub fn push_separated<I, F>(&mut self, items: I, sep: &str, mut f: F) -> &mut Self
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item),
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            f(self, item);
        }
        self
    }

    pub fn build(self) -> Statement {
        self.stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Statement {
        let mut b = Statement::builder(StatementKind::Update);
        b.push("UPDATE t SET ")
            .push_separated(["a", "b"], ", ", |b, col| {
                b.push(col).push(" = ").push_param(col);
            })
            .push(" WHERE id = ")
            .push_param("id");
        b.build()
    }

    #[test]
    fn renders_both_placeholder_styles() {
        let stmt = sample();
        assert_eq!(stmt.to_named_sql(), "UPDATE t SET a = @a, b = @b WHERE id = @id");
        assert_eq!(stmt.to_sql(), "UPDATE t SET a = $1, b = $2 WHERE id = $3");
        assert_eq!(stmt.params(), ["a", "b", "id"]);
    }

    #[test]
    fn repeated_param_reuses_index() {
        let mut b = Statement::builder(StatementKind::Upsert);
        b.push("x = ").push_param("Id").push(" AND y = ").push_param("Id");
        let stmt = b.build();
        assert_eq!(stmt.to_sql(), "x = $1 AND y = $1");
        assert_eq!(stmt.params(), ["Id"]);
    }

    #[test]
    fn separated_has_no_stray_separator() {
        let mut b = Statement::builder(StatementKind::Insert);
        b.push("(")
            .push_separated(Vec::<&str>::new(), ", ", |b, c| {
                b.push(c);
            })
            .push(")");
        assert_eq!(b.build().to_sql(), "()");

        let mut b = Statement::builder(StatementKind::Insert);
        b.push_separated(["only"], ", ", |b, c| {
            b.push(c);
        });
        assert_eq!(b.build().to_sql(), "only");
    }
}
