//! SQL rendering for DDL operations.
//!
//! The dialect turns a [`DdlOperation`] into literal SQL text. The engine
//! targets a single dialect (PostgreSQL); the trait keeps rendering
//! concerns out of the compiler and executor.

mod postgres;

pub use postgres::PostgresDialect;

use crate::operations::DdlOperation;
use crate::schema::SqlType;

/// Renders DDL operations as literal SQL statements.
pub trait SqlDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Renders an operation as zero or more SQL statements, in execution
    /// order.
    fn render(&self, operation: &DdlOperation) -> Vec<String>;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String;

    /// Quotes an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }
}
