//! Schema differ.
//!
//! Compares two [`ShapeDescriptor`]s for the same table and produces a
//! [`SchemaDiff`]: the column/index/constraint add, drop, alter and rename
//! sets the compiler turns into DDL. A diff is transient; it is consumed
//! immediately by the compiler and never persisted.

use std::collections::HashSet;

use crate::error::{MigrateError, Result};
use crate::schema::{ColumnDescriptor, ConstraintDescriptor, IndexDescriptor, ShapeDescriptor};

/// A column altered in place: the old and new descriptors side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct AlteredColumn {
    /// Descriptor in the old shape.
    pub old: ColumnDescriptor,
    /// Descriptor in the new shape.
    pub new: ColumnDescriptor,
}

/// A column carried over under a new name.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedColumn {
    /// Name in the old shape.
    pub from: String,
    /// Descriptor (and name) in the new shape.
    pub to: ColumnDescriptor,
}

/// An index carried over under a new name.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedIndex {
    /// Name in the old shape.
    pub from: String,
    /// Name in the new shape.
    pub to: String,
}

/// Structural differences between two shapes of the same table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    /// Columns present only in the new shape.
    pub added_columns: Vec<ColumnDescriptor>,
    /// Names of columns present only in the old shape.
    pub dropped_columns: Vec<String>,
    /// Columns present in both shapes with structural differences.
    pub altered_columns: Vec<AlteredColumn>,
    /// Columns declared as renames of old columns.
    pub renamed_columns: Vec<RenamedColumn>,
    /// Indexes present only in the new shape.
    pub added_indexes: Vec<IndexDescriptor>,
    /// Names of indexes present only in the old shape.
    pub dropped_indexes: Vec<String>,
    /// Dropped+added index pairs reclassified as renames.
    pub renamed_indexes: Vec<RenamedIndex>,
    /// Constraints present only in the new shape.
    pub added_constraints: Vec<ConstraintDescriptor>,
    /// Constraints present only in the old shape.
    pub dropped_constraints: Vec<ConstraintDescriptor>,
}

impl SchemaDiff {
    /// Returns true if the two shapes did not differ at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.altered_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.renamed_indexes.is_empty()
            && self.added_constraints.is_empty()
            && self.dropped_constraints.is_empty()
    }
}

/// Compares two shapes of the same table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differ;

impl Differ {
    /// Creates a differ.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Computes the structural difference from `old` to `new`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::TableMismatch`] if the shapes describe
    /// different tables.
    pub fn diff(&self, old: &ShapeDescriptor, new: &ShapeDescriptor) -> Result<SchemaDiff> {
        if old.table_name != new.table_name {
            return Err(MigrateError::TableMismatch {
                old: old.table_name.clone(),
                new: new.table_name.clone(),
            });
        }

        let mut diff = SchemaDiff::default();
        self.diff_columns(old, new, &mut diff);
        self.diff_indexes(old, new, &mut diff);
        self.diff_constraints(old, new, &mut diff);
        Ok(diff)
    }

    fn diff_columns(&self, old: &ShapeDescriptor, new: &ShapeDescriptor, diff: &mut SchemaDiff) {
        // Names consumed as the source of a rename are neither dropped
        // nor re-added.
        let mut rename_sources: HashSet<String> = HashSet::new();
        let mut rename_targets: HashSet<String> = HashSet::new();

        // Declared renames, forward direction: a new column points back at
        // an old one via `renamed_from`.
        for column in &new.columns {
            if let Some(from) = column.renamed_from.as_deref() {
                if old.get_column(from).is_some()
                    && new.get_column(from).is_none()
                    && old.get_column(&column.name).is_none()
                {
                    rename_sources.insert(from.to_string());
                    rename_targets.insert(column.name.clone());
                    diff.renamed_columns.push(RenamedColumn {
                        from: from.to_string(),
                        to: column.clone(),
                    });
                }
            }
        }

        // Reverse direction: when this diff runs with the shapes swapped
        // (rollback compilation), the rename declaration sits on the old
        // side and must undo itself.
        for column in &old.columns {
            if let Some(from) = column.renamed_from.as_deref() {
                if let Some(target) = new.get_column(from) {
                    if new.get_column(&column.name).is_none()
                        && !rename_sources.contains(&column.name)
                    {
                        rename_sources.insert(column.name.clone());
                        rename_targets.insert(target.name.clone());
                        diff.renamed_columns.push(RenamedColumn {
                            from: column.name.clone(),
                            to: target.clone(),
                        });
                    }
                }
            }
        }

        for column in &new.columns {
            if rename_targets.contains(&column.name) {
                // Structural changes piggy-backing on a rename still need
                // an alter against the source column.
                let source = diff
                    .renamed_columns
                    .iter()
                    .find(|r| r.to.name == column.name)
                    .and_then(|r| old.get_column(&r.from));
                if let Some(source) = source {
                    if source.needs_alter(column) {
                        diff.altered_columns.push(AlteredColumn {
                            old: source.clone(),
                            new: column.clone(),
                        });
                    }
                }
                continue;
            }
            match old.get_column(&column.name) {
                None => diff.added_columns.push(column.clone()),
                Some(existing) if existing.needs_alter(column) => {
                    diff.altered_columns.push(AlteredColumn {
                        old: existing.clone(),
                        new: column.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        for column in &old.columns {
            if new.get_column(&column.name).is_none() && !rename_sources.contains(&column.name) {
                diff.dropped_columns.push(column.name.clone());
            }
        }
    }

    fn diff_indexes(&self, old: &ShapeDescriptor, new: &ShapeDescriptor, diff: &mut SchemaDiff) {
        // Exact name matches first: unchanged indexes need no operation,
        // changed ones are rebuilt.
        let mut unmatched_old: Vec<&IndexDescriptor> = Vec::new();
        for index in &old.indexes {
            match new.get_index(&index.name) {
                Some(counterpart) if counterpart == index => {}
                Some(_) => {
                    diff.dropped_indexes.push(index.name.clone());
                }
                None => unmatched_old.push(index),
            }
        }

        let mut unmatched_new: Vec<&IndexDescriptor> = Vec::new();
        for index in &new.indexes {
            match old.get_index(&index.name) {
                Some(counterpart) if counterpart == index => {}
                Some(_) => diff.added_indexes.push(index.clone()),
                None => unmatched_new.push(index),
            }
        }

        // Rename heuristic: a dropped+added pair over the same field
        // sequence and kind is a rename. Candidates are visited in name
        // order and the first match wins, so the classification is
        // deterministic but best-effort, not globally optimal.
        let mut consumed = vec![false; unmatched_new.len()];
        for index in &unmatched_old {
            let matched = unmatched_new
                .iter()
                .enumerate()
                .find(|(i, candidate)| !consumed[*i] && index.field_equivalent(candidate));
            if let Some((i, candidate)) = matched {
                consumed[i] = true;
                diff.renamed_indexes.push(RenamedIndex {
                    from: index.name.clone(),
                    to: candidate.name.clone(),
                });
            } else {
                diff.dropped_indexes.push(index.name.clone());
            }
        }

        for (i, index) in unmatched_new.iter().enumerate() {
            if !consumed[i] {
                diff.added_indexes.push((*index).clone());
            }
        }
    }

    fn diff_constraints(
        &self,
        old: &ShapeDescriptor,
        new: &ShapeDescriptor,
        diff: &mut SchemaDiff,
    ) {
        // No rename detection for constraints: by-name add/drop only.
        for constraint in &new.constraints {
            match old.get_constraint(&constraint.name) {
                Some(counterpart) if counterpart == constraint => {}
                Some(_) | None => diff.added_constraints.push(constraint.clone()),
            }
        }

        for constraint in &old.constraints {
            match new.get_constraint(&constraint.name) {
                Some(counterpart) if counterpart == constraint => {}
                Some(_) | None => diff.dropped_constraints.push(constraint.clone()),
            }
        }
    }
}
