//! Migration compiler.
//!
//! Turns a version transition (previous shape, current shape) into an
//! ordered [`DdlOperation`] sequence. The forward direction compiles the
//! diff from previous to current; rollback is the same compilation with
//! the shapes swapped, not an undo log.

use crate::diff::{Differ, SchemaDiff};
use crate::error::{MigrateError, Result};
use crate::operations::DdlOperation;
use crate::schema::ShapeDescriptor;

/// Compiles shape transitions into ordered DDL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    differ: Differ,
}

impl Compiler {
    /// Creates a compiler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            differ: Differ::new(),
        }
    }

    /// Compiles the forward (migrate) operation sequence.
    ///
    /// A transition without a previous shape creates the table along with
    /// all of its indexes and constraints.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::TableMismatch`] for shapes of different
    /// tables and [`MigrateError::EmptyTransition`] when two declared
    /// shapes do not differ, which signals a modeling bug.
    pub fn compile_forward(
        &self,
        previous: Option<&ShapeDescriptor>,
        current: &ShapeDescriptor,
    ) -> Result<Vec<DdlOperation>> {
        match previous {
            None => Ok(Self::creation_operations(current)),
            Some(old) => self.compile_transition(old, current),
        }
    }

    /// Compiles the rollback operation sequence: the diff in the opposite
    /// direction. Table creation rolls back to a single `DropTable`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Compiler::compile_forward`].
    pub fn compile_rollback(
        &self,
        previous: Option<&ShapeDescriptor>,
        current: &ShapeDescriptor,
    ) -> Result<Vec<DdlOperation>> {
        match previous {
            None => Ok(vec![DdlOperation::drop_table(current.table_name.clone())]),
            Some(old) => self.compile_transition(current, old),
        }
    }

    fn compile_transition(
        &self,
        old: &ShapeDescriptor,
        new: &ShapeDescriptor,
    ) -> Result<Vec<DdlOperation>> {
        let diff = self.differ.diff(old, new)?;
        if diff.is_empty() {
            return Err(MigrateError::EmptyTransition {
                table: new.table_name.clone(),
            });
        }
        Ok(Self::diff_operations(&new.table_name, &diff))
    }

    fn creation_operations(shape: &ShapeDescriptor) -> Vec<DdlOperation> {
        let mut operations = vec![DdlOperation::create_table(
            shape.table_name.clone(),
            shape.columns.clone(),
        )];
        for constraint in &shape.constraints {
            operations.push(DdlOperation::create_constraint(
                shape.table_name.clone(),
                constraint.clone(),
            ));
        }
        for index in &shape.indexes {
            operations.push(DdlOperation::create_index(
                shape.table_name.clone(),
                index.clone(),
            ));
        }
        operations
    }

    /// Emits diff operations in dependency order: constraints that refer
    /// to doomed columns go first, then column changes (drops before
    /// adds, so a conceptual rename never collides on a name), then new
    /// constraints, then index maintenance.
    fn diff_operations(table: &str, diff: &SchemaDiff) -> Vec<DdlOperation> {
        let mut operations = Vec::new();

        for constraint in &diff.dropped_constraints {
            operations.push(DdlOperation::drop_constraint(table, constraint.name.clone()));
        }
        for rename in &diff.renamed_columns {
            operations.push(DdlOperation::rename_column(
                table,
                rename.from.clone(),
                rename.to.name.clone(),
            ));
        }
        for column in &diff.dropped_columns {
            operations.push(DdlOperation::drop_column(table, column.clone()));
        }
        for column in &diff.added_columns {
            operations.push(DdlOperation::add_column(table, column.clone()));
        }
        for altered in &diff.altered_columns {
            operations.push(DdlOperation::AlterColumn {
                table: table.to_string(),
                old: altered.old.clone(),
                new: altered.new.clone(),
            });
        }
        for constraint in &diff.added_constraints {
            operations.push(DdlOperation::create_constraint(table, constraint.clone()));
        }
        for rename in &diff.renamed_indexes {
            operations.push(DdlOperation::rename_index(
                rename.from.clone(),
                rename.to.clone(),
            ));
        }
        for index in &diff.dropped_indexes {
            operations.push(DdlOperation::drop_index(index.clone()));
        }
        for index in &diff.added_indexes {
            operations.push(DdlOperation::create_index(table, index.clone()));
        }

        operations
    }
}
