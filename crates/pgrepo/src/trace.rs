//! SQL tracing.
//!
//! Every statement the repository executes is reported through a
//! [`SqlTracer`] as a `tracing` event on target `pgrepo.sql`, before the
//! statement is sent. Install any subscriber to see them, e.g.:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("pgrepo.sql=debug")
//!     .init();
//! ```

use crate::statement::Statement;
use tracing::Level;

/// Emits one event per executed statement.
#[derive(Debug, Clone)]
pub struct SqlTracer {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlTracer {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_at_char_boundary(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Report `stmt` about to run against `table`.
    pub fn statement(&self, table: &str, stmt: &Statement, sql: &str) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "pgrepo.sql",
            operation = stmt.kind().as_str(),
            table,
            param_count = stmt.params().len(),
            sql = %sql,
        );
    }
}

fn truncate_at_char_boundary(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sql_is_untouched() {
        let tracer = SqlTracer::new();
        assert_eq!(tracer.truncate_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn long_sql_is_truncated_with_ellipsis() {
        let tracer = SqlTracer::new().max_sql_length(6);
        assert_eq!(tracer.truncate_sql("SELECT 1 FROM t"), "SELECT...");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; cutting at byte 2 would split it.
        assert_eq!(truncate_at_char_boundary("aé b", 2), "a");
    }

    #[test]
    fn no_truncate_keeps_everything() {
        let sql = "x".repeat(500);
        assert_eq!(SqlTracer::new().no_truncate().truncate_sql(&sql), sql);
    }
}
