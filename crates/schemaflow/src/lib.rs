//! Schema evolution as compiled version transitions.
//!
//! `schemaflow` turns successive declared versions of an entity's table
//! shape into ordered DDL. Application code never writes migration SQL:
//! it declares each version's shape, and the engine diffs consecutive
//! shapes, compiles the difference, and either applies it against a live
//! PostgreSQL database (exactly once per version, ledger-gated) or emits
//! replayable `<version>_up.sql` / `<version>_down.sql` scripts.
//!
//! # Architecture
//!
//! - **Model** - Declarative entity shapes (`EntityShape`, `FieldSpec`)
//! - **Introspector** - Resolves a shape into a structural `ShapeDescriptor`
//! - **Differ** - Computes the structural diff between two descriptors
//! - **Compiler** - Orders the diff into executable `DdlOperation`s
//! - **Dialect** - Renders operations as literal PostgreSQL statements
//! - **Executor** - Applies operations live, or captures them as scripts
//! - **Registry / Runner** - Version bookkeeping and the two entry points
//!
//! # Example
//!
//! ```rust,ignore
//! use schemaflow::prelude::*;
//!
//! let v1 = EntityShape::new("users")
//!     .field(uuid("id").primary_key())
//!     .field(varchar("email", 255).not_null().unique())
//!     .field(timestamp("created_at").create_time());
//!
//! let v2 = v1.clone().field(varchar("name", 100).index("idx_name", 1));
//!
//! let mut registry = Registry::new();
//! registry.register("user", "1.0.0", v1.clone(), None)?;
//! registry.register("user", "1.0.1", v2, Some(v1))?;
//!
//! let runner = Runner::new(registry);
//!
//! // Apply pending versions against a live database...
//! runner.run_migrations(&pool).await?;
//!
//! // ...or write replayable scripts without a connection.
//! for (filename, script) in runner.generate_sql()? {
//!     std::fs::write(&filename, script)?;
//! }
//! ```

pub mod compiler;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod ledger;
pub mod model;
pub mod operations;
pub mod registry;
pub mod runner;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::Compiler;
    pub use crate::dialect::{PostgresDialect, SqlDialect};
    pub use crate::diff::{Differ, SchemaDiff};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::DdlExecutor;
    pub use crate::introspect::introspect;
    pub use crate::ledger::MigrationLedger;
    pub use crate::model::{
        bigint, boolean, integer, text, timestamp, uuid, varchar, EntityShape, FieldSpec,
    };
    pub use crate::operations::DdlOperation;
    pub use crate::registry::{EntityVersion, Registry};
    pub use crate::runner::Runner;
    pub use crate::schema::{
        ColumnDescriptor, ConstraintDescriptor, ConstraintKind, DefaultValue, ForeignKeyAction,
        IndexDescriptor, IndexKind, ShapeDescriptor, SqlType, TimestampRole,
    };
}
