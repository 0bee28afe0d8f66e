//! DDL operations.
//!
//! A [`DdlOperation`] is one atomic schema-mutating action, carrying the
//! descriptor data the dialect needs to render literal SQL for it.

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDescriptor, ConstraintDescriptor, IndexDescriptor};

/// A single schema-mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DdlOperation {
    /// Create a new table.
    CreateTable {
        /// Table name.
        table: String,
        /// Column definitions.
        columns: Vec<ColumnDescriptor>,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        table: String,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column definition.
        column: ColumnDescriptor,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Old column name.
        from: String,
        /// New column name.
        to: String,
    },

    /// Alter a column's structural attributes.
    AlterColumn {
        /// Table name.
        table: String,
        /// Column definition before the change.
        old: ColumnDescriptor,
        /// Column definition after the change.
        new: ColumnDescriptor,
    },

    /// Create an index.
    CreateIndex {
        /// Table name.
        table: String,
        /// Index definition.
        index: IndexDescriptor,
    },

    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
    },

    /// Rename an index.
    RenameIndex {
        /// Old index name.
        from: String,
        /// New index name.
        to: String,
    },

    /// Add a constraint to a table.
    CreateConstraint {
        /// Table name.
        table: String,
        /// Constraint definition.
        constraint: ConstraintDescriptor,
    },

    /// Drop a constraint from a table.
    DropConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },
}

impl DdlOperation {
    /// Creates a CreateTable operation.
    #[must_use]
    pub fn create_table(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self::CreateTable {
            table: table.into(),
            columns,
        }
    }

    /// Creates a DropTable operation.
    #[must_use]
    pub fn drop_table(table: impl Into<String>) -> Self {
        Self::DropTable {
            table: table.into(),
        }
    }

    /// Creates an AddColumn operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnDescriptor) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a DropColumn operation.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a RenameColumn operation.
    #[must_use]
    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a CreateIndex operation.
    #[must_use]
    pub fn create_index(table: impl Into<String>, index: IndexDescriptor) -> Self {
        Self::CreateIndex {
            table: table.into(),
            index,
        }
    }

    /// Creates a DropIndex operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>) -> Self {
        Self::DropIndex { name: name.into() }
    }

    /// Creates a RenameIndex operation.
    #[must_use]
    pub fn rename_index(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameIndex {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a CreateConstraint operation.
    #[must_use]
    pub fn create_constraint(table: impl Into<String>, constraint: ConstraintDescriptor) -> Self {
        Self::CreateConstraint {
            table: table.into(),
            constraint,
        }
    }

    /// Creates a DropConstraint operation.
    #[must_use]
    pub fn drop_constraint(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DropConstraint {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Returns true if a failure of this operation may be skipped when
    /// the database reports the desired state already holds.
    ///
    /// Constraint and index presence is often already satisfied by a
    /// prior partial run; column and table operations are never skipped,
    /// since a half-applied column set poisons every later transition.
    #[must_use]
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            Self::CreateIndex { .. }
                | Self::DropIndex { .. }
                | Self::RenameIndex { .. }
                | Self::CreateConstraint { .. }
                | Self::DropConstraint { .. }
        )
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { table, .. } => format!("Create table '{table}'"),
            Self::DropTable { table } => format!("Drop table '{table}'"),
            Self::AddColumn { table, column } => {
                format!("Add column '{}' to table '{table}'", column.name)
            }
            Self::DropColumn { table, column } => {
                format!("Drop column '{column}' from table '{table}'")
            }
            Self::RenameColumn { table, from, to } => {
                format!("Rename column '{from}' to '{to}' in table '{table}'")
            }
            Self::AlterColumn { table, new, .. } => {
                format!("Alter column '{}' in table '{table}'", new.name)
            }
            Self::CreateIndex { table, index } => {
                format!("Create index '{}' on table '{table}'", index.name)
            }
            Self::DropIndex { name } => format!("Drop index '{name}'"),
            Self::RenameIndex { from, to } => format!("Rename index '{from}' to '{to}'"),
            Self::CreateConstraint { table, constraint } => {
                format!("Add constraint '{}' to table '{table}'", constraint.name)
            }
            Self::DropConstraint { table, name } => {
                format!("Drop constraint '{name}' from table '{table}'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConstraintDescriptor, IndexDescriptor, IndexKind};

    #[test]
    fn constraint_and_index_operations_are_recoverable() {
        let index = IndexDescriptor {
            name: "idx_email".to_string(),
            fields: vec!["email".to_string()],
            unique: false,
            kind: IndexKind::BTree,
        };
        assert!(DdlOperation::create_index("users", index).recoverable());
        assert!(DdlOperation::drop_index("idx_email").recoverable());
        assert!(DdlOperation::rename_index("idx_a", "idx_b").recoverable());
        let constraint =
            ConstraintDescriptor::unique("uk_users_email", vec!["email".to_string()]);
        assert!(DdlOperation::create_constraint("users", constraint).recoverable());
    }

    #[test]
    fn column_and_table_operations_are_fatal() {
        assert!(!DdlOperation::drop_table("users").recoverable());
        assert!(!DdlOperation::drop_column("users", "email").recoverable());
        assert!(!DdlOperation::rename_column("users", "a", "b").recoverable());
        assert!(!DdlOperation::create_table("users", Vec::new()).recoverable());
    }

    #[test]
    fn descriptions_name_the_target() {
        assert_eq!(
            DdlOperation::drop_column("users", "email").description(),
            "Drop column 'email' from table 'users'"
        );
        assert_eq!(
            DdlOperation::rename_index("idx_a", "idx_b").description(),
            "Rename index 'idx_a' to 'idx_b'"
        );
    }
}
