//! Applied-version ledger.
//!
//! The ledger is the `schemaflow_migrations` table recording which
//! version transitions have been applied. Version strings key the table,
//! so each registered transition is applied at most once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::Result;

/// SQL to create the ledger table.
pub const CREATE_LEDGER_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schemaflow_migrations (
    id TEXT PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
";

/// SQLSTATE for a unique violation, raised when two runners race to
/// record the same version.
const UNIQUE_VIOLATION: &str = "23505";

/// A ledger row for one applied version.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedVersion {
    /// Version string.
    pub id: String,
    /// When the version was applied.
    pub applied_at: DateTime<Utc>,
}

/// Manages the applied-version ledger.
pub struct MigrationLedger {
    pool: PgPool,
}

impl MigrationLedger {
    /// Creates a ledger over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensures the ledger table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Checks whether a version has been applied.
    pub async fn is_applied(&self, version: &str) -> Result<bool> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM schemaflow_migrations WHERE id = $1")
                .bind(version)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Returns the set of applied version strings.
    pub async fn applied_set(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM schemaflow_migrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Returns every applied version, oldest first.
    pub async fn applied(&self) -> Result<Vec<AppliedVersion>> {
        let rows = sqlx::query_as::<_, AppliedVersion>(
            "SELECT id, applied_at FROM schemaflow_migrations ORDER BY applied_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Records a version as applied, on the caller's connection so the
    /// record commits or rolls back together with the version's DDL.
    ///
    /// Returns `false` when another runner recorded the version first
    /// (unique violation); the caller then discards its own transaction.
    pub async fn record_applied(conn: &mut PgConnection, version: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO schemaflow_migrations (id) VALUES ($1)")
            .bind(version)
            .execute(conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db))
                if db.code().is_some_and(|code| code == UNIQUE_VIOLATION) =>
            {
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }
}
