//! Migration runner.
//!
//! Drives the whole pipeline over a [`Registry`]: introspect each
//! registered shape version, compile its transition, then either apply
//! pending versions against a live database (ledger-gated, one
//! transaction per version) or emit replayable up/down scripts.

use std::collections::BTreeMap;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::compiler::Compiler;
use crate::dialect::{PostgresDialect, SqlDialect};
use crate::error::{MigrateError, Result};
use crate::executor::DdlExecutor;
use crate::introspect::introspect;
use crate::ledger::MigrationLedger;
use crate::operations::DdlOperation;
use crate::registry::{EntityVersion, Registry};

struct CompiledVersion {
    version: String,
    forward: Vec<DdlOperation>,
    rollback: Vec<DdlOperation>,
}

/// Runs registered shape transitions, live or as script output.
pub struct Runner<D: SqlDialect = PostgresDialect> {
    registry: Registry,
    compiler: Compiler,
    executor: DdlExecutor<D>,
}

impl Runner<PostgresDialect> {
    /// Creates a runner targeting PostgreSQL.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self::with_dialect(registry, PostgresDialect::new())
    }
}

impl<D: SqlDialect> Runner<D> {
    /// Creates a runner with an explicit dialect.
    pub fn with_dialect(registry: Registry, dialect: D) -> Self {
        Self {
            registry,
            compiler: Compiler::new(),
            executor: DdlExecutor::new(dialect),
        }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn compile_version(&self, entry: &EntityVersion) -> Result<CompiledVersion> {
        let current = introspect(&entry.current)?;
        let previous = entry.previous.as_ref().map(introspect).transpose()?;

        Ok(CompiledVersion {
            version: entry.version.clone(),
            forward: self.compiler.compile_forward(previous.as_ref(), &current)?,
            rollback: self.compiler.compile_rollback(previous.as_ref(), &current)?,
        })
    }

    /// Compiles every registered version. Any modeling or compile error
    /// aborts the whole run before any DDL is attempted.
    fn compile_all(&self) -> Result<Vec<CompiledVersion>> {
        self.registry
            .get_all()
            .into_iter()
            .map(|entry| self.compile_version(entry))
            .collect()
    }

    /// Applies all pending versions against the database.
    ///
    /// Every registered transition is compiled up front, so a modeling
    /// bug in any version aborts the run with nothing applied. Each
    /// pending version then runs in its own transaction: DDL and the
    /// ledger record commit together, or not at all. Versions already in
    /// the ledger are skipped, so re-runs are idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::EmptyRegistry`] when nothing is
    /// registered; modeling and compile errors surface before any DDL.
    pub async fn run_migrations(&self, pool: &PgPool) -> Result<()> {
        if self.registry.is_empty() {
            return Err(MigrateError::EmptyRegistry);
        }
        let compiled = self.compile_all()?;

        let ledger = MigrationLedger::new(pool.clone());
        ledger.ensure_table().await?;
        let applied = ledger.applied_set().await?;

        for version in &compiled {
            if applied.contains(&version.version) {
                debug!(version = %version.version, "Already applied, skipping");
                continue;
            }

            info!(version = %version.version, "Applying migration");
            let mut tx = pool.begin().await?;
            self.executor.apply(&mut tx, &version.forward).await?;

            if MigrationLedger::record_applied(&mut tx, &version.version).await? {
                tx.commit().await?;
                info!(version = %version.version, "Migration applied");
            } else {
                warn!(
                    version = %version.version,
                    "Applied concurrently by another runner, discarding"
                );
                tx.rollback().await?;
            }
        }

        Ok(())
    }

    /// Generates replayable up/down scripts for every registered version,
    /// keyed `<version>_up.sql` / `<version>_down.sql`.
    ///
    /// Never touches a connection or the ledger. Output is deterministic
    /// for a given registry.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::EmptyRegistry`] when nothing is
    /// registered; any per-version failure aborts the whole map.
    pub fn generate_sql(&self) -> Result<BTreeMap<String, String>> {
        if self.registry.is_empty() {
            return Err(MigrateError::EmptyRegistry);
        }

        let mut scripts = BTreeMap::new();
        for version in self.compile_all()? {
            let up = self.executor.capture(&version.forward);
            let down = self.executor.capture(&version.rollback);

            scripts.insert(
                format!("{}_up.sql", version.version),
                self.executor.render_script(&version.version, &up)?,
            );
            scripts.insert(
                format!("{}_down.sql", version.version),
                self.executor.render_script(&version.version, &down)?,
            );
        }
        Ok(scripts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{text, timestamp, uuid, varchar, EntityShape};

    fn user_v1() -> EntityShape {
        EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("name", 100))
            .field(varchar("email", 255))
            .field(timestamp("created_at").create_time())
    }

    fn user_v2() -> EntityShape {
        // Adds a column and a single-field index.
        EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("name", 100).index("idx_name", 1))
            .field(varchar("email", 255))
            .field(text("bio"))
            .field(timestamp("created_at").create_time())
    }

    fn user_v3() -> EntityShape {
        // Replaces idx_name with a composite index and drops a column.
        EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("name", 100).index("idx_name_email", 1))
            .field(varchar("email", 255).index("idx_name_email", 2))
            .field(timestamp("created_at").create_time())
    }

    fn runner(registry: Registry) -> Runner {
        Runner::new(registry)
    }

    #[test]
    fn initial_version_scripts_create_and_drop_the_table() {
        let mut registry = Registry::new();
        registry.register("user", "1.0.0", user_v1(), None).unwrap();

        let scripts = runner(registry).generate_sql().unwrap();
        assert_eq!(scripts.len(), 2);

        let up = &scripts["1.0.0_up.sql"];
        assert!(up.starts_with("-- Migration: 1.0.0\nBEGIN;\n"));
        assert!(up.contains("CREATE TABLE \"users\""));
        assert!(up.ends_with("COMMIT;\n"));

        let down = &scripts["1.0.0_down.sql"];
        assert!(down.contains("DROP TABLE \"users\";\n"));
        assert!(!down.contains("CREATE"));
    }

    #[test]
    fn add_column_and_index_scripts() {
        let mut registry = Registry::new();
        registry
            .register("user", "1.0.1", user_v2(), Some(user_v1()))
            .unwrap();

        let scripts = runner(registry).generate_sql().unwrap();

        let up = &scripts["1.0.1_up.sql"];
        assert!(up.contains("ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT;\n"));
        assert!(up.contains("CREATE INDEX \"idx_name\" ON \"users\" (\"name\");\n"));

        let down = &scripts["1.0.1_down.sql"];
        assert!(down.contains("ALTER TABLE \"users\" DROP COLUMN \"bio\";\n"));
        assert!(down.contains("DROP INDEX \"idx_name\";\n"));
        assert!(!down.contains("ADD COLUMN"));
    }

    #[test]
    fn composite_index_follows_declared_priorities() {
        let mut registry = Registry::new();
        registry
            .register("user", "1.0.2", user_v3(), Some(user_v2()))
            .unwrap();

        let scripts = runner(registry).generate_sql().unwrap();

        let up = &scripts["1.0.2_up.sql"];
        assert!(
            up.contains("CREATE INDEX \"idx_name_email\" ON \"users\" (\"name\", \"email\");\n")
        );
        assert!(up.contains("DROP INDEX \"idx_name\";\n"));
        assert!(up.contains("ALTER TABLE \"users\" DROP COLUMN \"bio\";\n"));

        let down = &scripts["1.0.2_down.sql"];
        assert!(down.contains("DROP INDEX \"idx_name_email\";\n"));
        assert!(down.contains("ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT;\n"));
    }

    #[test]
    fn scripts_cover_every_registered_version() {
        let mut registry = Registry::new();
        registry.register("user", "1.0.0", user_v1(), None).unwrap();
        registry
            .register("item", "1.0.1", item_v1(), None)
            .unwrap();
        registry
            .register("user", "1.0.2", user_v2(), Some(user_v1()))
            .unwrap();

        let scripts = runner(registry).generate_sql().unwrap();
        let keys: Vec<&str> = scripts.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "1.0.0_down.sql",
                "1.0.0_up.sql",
                "1.0.1_down.sql",
                "1.0.1_up.sql",
                "1.0.2_down.sql",
                "1.0.2_up.sql",
            ]
        );
    }

    fn item_v1() -> EntityShape {
        EntityShape::new("items")
            .field(uuid("id").primary_key())
            .field(text("title"))
            .field(uuid("owner_id").references("users", "id"))
    }

    #[test]
    fn generation_is_deterministic() {
        let build = || {
            let mut registry = Registry::new();
            registry.register("user", "1.0.0", user_v1(), None).unwrap();
            registry
                .register("user", "1.0.1", user_v2(), Some(user_v1()))
                .unwrap();
            runner(registry).generate_sql().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn empty_registry_is_an_error() {
        let result = runner(Registry::new()).generate_sql();
        assert!(matches!(result, Err(MigrateError::EmptyRegistry)));
    }

    #[test]
    fn identical_shapes_abort_the_whole_map() {
        let mut registry = Registry::new();
        registry.register("user", "1.0.0", user_v1(), None).unwrap();
        registry
            .register("user", "1.0.1", user_v1(), Some(user_v1()))
            .unwrap();

        let result = runner(registry).generate_sql();
        assert!(matches!(
            result,
            Err(MigrateError::EmptyTransition { table }) if table == "users"
        ));
    }

    #[test]
    fn timestamp_role_change_compiles_to_a_default_change() {
        let v1 = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(timestamp("created_at"));
        let v2 = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(timestamp("created_at").create_time());

        let mut registry = Registry::new();
        registry.register("user", "1.0.1", v2, Some(v1)).unwrap();

        let scripts = runner(registry).generate_sql().unwrap();
        assert!(scripts["1.0.1_up.sql"]
            .contains("ALTER TABLE \"users\" ALTER COLUMN \"created_at\" SET DEFAULT now();\n"));
        assert!(scripts["1.0.1_down.sql"]
            .contains("ALTER TABLE \"users\" ALTER COLUMN \"created_at\" DROP DEFAULT;\n"));
    }

    #[test]
    fn declared_rename_round_trips() {
        let v1 = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("name", 100));
        let v2 = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("full_name", 100).renamed_from("name"));

        let mut registry = Registry::new();
        registry
            .register("user", "1.1.0", v2, Some(v1))
            .unwrap();

        let scripts = runner(registry).generate_sql().unwrap();
        assert!(scripts["1.1.0_up.sql"]
            .contains("ALTER TABLE \"users\" RENAME COLUMN \"name\" TO \"full_name\";\n"));
        assert!(scripts["1.1.0_down.sql"]
            .contains("ALTER TABLE \"users\" RENAME COLUMN \"full_name\" TO \"name\";\n"));
    }

    mod live {
        use super::*;
        use sqlx::postgres::PgPoolOptions;

        async fn create_test_pool() -> PgPool {
            let url = std::env::var("DATABASE_URL")
                .expect("DATABASE_URL must point at a test database");
            PgPoolOptions::new()
                .max_connections(2)
                .connect(&url)
                .await
                .expect("Failed to connect to test database")
        }

        #[tokio::test]
        #[ignore = "needs a PostgreSQL server"]
        async fn run_migrations_is_idempotent() {
            let pool = create_test_pool().await;

            let mut registry = Registry::new();
            registry.register("user", "1.0.0", user_v1(), None).unwrap();
            registry
                .register("user", "1.0.1", user_v2(), Some(user_v1()))
                .unwrap();

            let runner = Runner::new(registry);
            runner.run_migrations(&pool).await.unwrap();
            // Second run sees both versions in the ledger and does nothing.
            runner.run_migrations(&pool).await.unwrap();

            let ledger = MigrationLedger::new(pool);
            assert!(ledger.is_applied("1.0.0").await.unwrap());
            assert!(ledger.is_applied("1.0.1").await.unwrap());
        }
    }
}
