//! DDL execution.
//!
//! The executor renders compiled operations through a dialect and either
//! applies them on a live connection or captures them as script text.
//! Script capture never touches a database.

use sqlx::PgConnection;
use tracing::{debug, warn};

use crate::dialect::SqlDialect;
use crate::error::{MigrateError, Result};
use crate::operations::DdlOperation;

/// SQLSTATE codes that mean the desired state already holds: duplicate
/// table, duplicate object, undefined object.
const RECOVERABLE_SQLSTATES: &[&str] = &["42P07", "42710", "42704"];

fn is_recoverable_sqlstate(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| RECOVERABLE_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Executes compiled DDL operations through a dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlExecutor<D: SqlDialect> {
    dialect: D,
}

impl<D: SqlDialect> DdlExecutor<D> {
    /// Creates an executor for the given dialect.
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Applies operations on a live connection, in order.
    ///
    /// Index and constraint operations that fail because the desired
    /// state already holds are skipped with a warning; every other
    /// failure aborts. Callers run this inside a transaction so that an
    /// abort leaves no partial transition behind.
    pub async fn apply(
        &self,
        conn: &mut PgConnection,
        operations: &[DdlOperation],
    ) -> Result<()> {
        for operation in operations {
            for sql in self.dialect.render(operation) {
                debug!(sql = %sql, "Executing DDL");
                match sqlx::query(&sql).execute(&mut *conn).await {
                    Ok(_) => {}
                    Err(error) if operation.recoverable() && is_recoverable_sqlstate(&error) => {
                        warn!(
                            operation = %operation.description(),
                            error = %error,
                            "State already holds, skipping"
                        );
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        }
        Ok(())
    }

    /// Renders operations to SQL statements without executing them.
    ///
    /// Empty statements and anything that is not schema-mutating (plain
    /// SELECTs a dialect might emit for inspection) are dropped.
    pub fn capture(&self, operations: &[DdlOperation]) -> Vec<String> {
        operations
            .iter()
            .flat_map(|operation| self.dialect.render(operation))
            .filter(|sql| {
                let trimmed = sql.trim();
                !trimmed.is_empty() && !trimmed.to_uppercase().starts_with("SELECT")
            })
            .collect()
    }

    /// Frames captured statements as a replayable transactional script.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::EmptyScript`] when there is nothing to
    /// frame, which signals a transition that renders no SQL.
    pub fn render_script(&self, version: &str, statements: &[String]) -> Result<String> {
        if statements.is_empty() {
            return Err(MigrateError::EmptyScript {
                version: version.to_string(),
            });
        }

        let mut script = format!("-- Migration: {version}\nBEGIN;\n");
        for statement in statements {
            script.push_str(statement);
            script.push_str(";\n");
        }
        script.push_str("COMMIT;\n");
        Ok(script)
    }
}
