//! Error types for the schema-evolution engine.

/// Errors that can occur while introspecting, compiling, or applying
/// schema transitions.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// An entity shape is malformed (conflicting metadata, duplicate
    /// columns, and so on). Raised before any DDL is attempted.
    #[error("Invalid entity shape for '{table}': {message}")]
    Model {
        /// Table the shape describes.
        table: String,
        /// What was wrong with it.
        message: String,
    },

    /// Two shapes passed to the differ describe different tables.
    #[error("Cannot diff shapes for different tables: '{old}' vs '{new}'")]
    TableMismatch {
        /// Table name of the old shape.
        old: String,
        /// Table name of the new shape.
        new: String,
    },

    /// A non-trivial transition compiled to zero operations, which means
    /// the declared shapes do not actually differ.
    #[error("Transition for table '{table}' produced no operations")]
    EmptyTransition {
        /// Table of the offending transition.
        table: String,
    },

    /// A dry-run capture produced no statements for a version.
    #[error("No SQL statements generated for migration '{version}'")]
    EmptyScript {
        /// Version whose script came out empty.
        version: String,
    },

    /// No entity versions are registered.
    #[error("No entity versions registered")]
    EmptyRegistry,

    /// A version string was registered twice. Version strings key the
    /// ledger and the generated script filenames, so they must be
    /// globally unique.
    #[error("Duplicate registration for version '{version}'")]
    DuplicateVersion {
        /// The colliding version string.
        version: String,
    },

    /// Database error during migration execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
