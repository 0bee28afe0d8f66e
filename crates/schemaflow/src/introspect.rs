//! Schema introspector.
//!
//! Derives a [`ShapeDescriptor`] from a declared [`EntityShape`]. The
//! derivation is deterministic: the same shape always yields an identical
//! descriptor (field order preserved, indexes and constraints sorted by
//! their deterministically derived names), which is what makes diffs and
//! regenerated scripts reproducible.

use std::collections::{BTreeMap, HashSet};

use crate::error::{MigrateError, Result};
use crate::model::EntityShape;
use crate::schema::{
    ColumnDescriptor, ConstraintDescriptor, ConstraintKind, IndexDescriptor, IndexKind,
    ShapeDescriptor, SqlType,
};

fn model_err(table: &str, message: impl Into<String>) -> MigrateError {
    MigrateError::Model {
        table: table.to_string(),
        message: message.into(),
    }
}

/// Resolves the declared type and explicit size into the final column type.
///
/// An explicit size is only meaningful for character types; a size that
/// conflicts with the length the type itself carries is a hard error.
fn resolve_type(table: &str, field: &str, sql_type: &SqlType, size: Option<u32>) -> Result<SqlType> {
    match (sql_type, size) {
        (SqlType::Varchar(n), Some(m)) if *n != m => Err(model_err(
            table,
            format!("field '{field}': size {m} conflicts with VARCHAR({n})"),
        )),
        (SqlType::Char(n), Some(m)) if *n != m => Err(model_err(
            table,
            format!("field '{field}': size {m} conflicts with CHAR({n})"),
        )),
        (SqlType::Text, Some(m)) => Ok(SqlType::Varchar(m)),
        (other, Some(_)) if other.length().is_none() => Err(model_err(
            table,
            format!("field '{field}': size declared for non-character type"),
        )),
        (other, _) => Ok(other.clone()),
    }
}

struct IndexMember {
    priority: u32,
    declared_at: usize,
    column: String,
    unique: bool,
    kind: IndexKind,
}

/// Derives the structural descriptor of an entity shape.
///
/// # Errors
///
/// Returns [`MigrateError::Model`] for malformed metadata: an empty shape,
/// duplicate column names, conflicting size/type declarations, duplicate
/// priorities within one index group, mixed index kinds in one group, or
/// a field declared as a rename of itself.
pub fn introspect(shape: &EntityShape) -> Result<ShapeDescriptor> {
    let table = shape.table.as_str();
    if table.is_empty() {
        return Err(model_err(table, "empty table name"));
    }
    if shape.fields.is_empty() {
        return Err(model_err(table, "shape declares no fields"));
    }

    let mut columns = Vec::with_capacity(shape.fields.len());
    let mut seen = HashSet::new();
    let mut groups: BTreeMap<String, Vec<IndexMember>> = BTreeMap::new();
    let mut constraints = Vec::new();

    for (position, field) in shape.fields.iter().enumerate() {
        let column = field.column_name().to_string();
        if !seen.insert(column.clone()) {
            return Err(model_err(table, format!("duplicate column '{column}'")));
        }

        let sql_type = resolve_type(table, &field.name, &field.sql_type, field.size)?;

        if field.renamed_from.as_deref() == Some(column.as_str()) {
            return Err(model_err(
                table,
                format!("column '{column}' declared as a rename of itself"),
            ));
        }

        if let Some(ref membership) = field.index {
            groups.entry(membership.group.clone()).or_default().push(IndexMember {
                priority: membership.priority,
                declared_at: position,
                column: column.clone(),
                unique: membership.unique,
                kind: membership.kind,
            });
        }

        if field.unique {
            constraints.push(ConstraintDescriptor::unique(
                format!("uk_{table}_{column}"),
                vec![column.clone()],
            ));
        }

        if let Some(ref fk) = field.references {
            constraints.push(ConstraintDescriptor {
                name: format!("fk_{table}_{column}"),
                kind: ConstraintKind::ForeignKey,
                fields: vec![column.clone()],
                ref_table: Some(fk.table.clone()),
                ref_fields: vec![fk.field.clone()],
                on_delete: Some(fk.on_delete),
                on_update: Some(fk.on_update),
            });
        }

        columns.push(ColumnDescriptor {
            name: column,
            size: sql_type.length(),
            sql_type,
            nullable: field.nullable,
            default: field.default.clone(),
            primary_key: field.primary_key,
            auto_increment: field.auto_increment,
            timestamp_role: field.timestamp_role,
            renamed_from: field.renamed_from.clone(),
        });
    }

    let mut indexes = Vec::with_capacity(groups.len());
    for (group, mut members) in groups {
        let kind = members[0].kind;
        if members.iter().any(|m| m.kind != kind) {
            return Err(model_err(
                table,
                format!("index '{group}' declares conflicting kinds"),
            ));
        }
        let mut priorities = HashSet::new();
        for member in &members {
            if !priorities.insert(member.priority) {
                return Err(model_err(
                    table,
                    format!(
                        "index '{group}' declares priority {} twice",
                        member.priority
                    ),
                ));
            }
        }
        members.sort_by_key(|m| (m.priority, m.declared_at));

        indexes.push(IndexDescriptor {
            name: group,
            unique: members.iter().any(|m| m.unique),
            kind,
            fields: members.into_iter().map(|m| m.column).collect(),
        });
    }

    // groups come out of the BTreeMap already name-sorted
    constraints.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ShapeDescriptor {
        table_name: table.to_string(),
        columns,
        indexes,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{text, timestamp, uuid, varchar, EntityShape};
    use crate::schema::ForeignKeyAction;

    fn users_shape() -> EntityShape {
        EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("email", 255).not_null().unique())
            .field(varchar("name", 100))
            .field(timestamp("created_at").create_time())
    }

    #[test]
    fn introspection_is_deterministic() {
        let shape = users_shape();
        let a = introspect(&shape).unwrap();
        let b = introspect(&shape).unwrap();
        assert_eq!(a, b);

        let rendered_a = serde_json::to_string(&a).unwrap();
        let rendered_b = serde_json::to_string(&b).unwrap();
        assert_eq!(rendered_a, rendered_b);
    }

    #[test]
    fn every_field_maps_to_one_column() {
        let descriptor = introspect(&users_shape()).unwrap();
        let names: Vec<_> = descriptor.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "name", "created_at"]);
    }

    #[test]
    fn unique_field_becomes_named_constraint() {
        let descriptor = introspect(&users_shape()).unwrap();
        let constraint = descriptor.get_constraint("uk_users_email").unwrap();
        assert_eq!(constraint.kind, ConstraintKind::Unique);
        assert_eq!(constraint.fields, vec!["email"]);
    }

    #[test]
    fn index_group_merges_ordered_by_priority() {
        let shape = EntityShape::new("users")
            .field(uuid("id").primary_key())
            // declared out of key order on purpose
            .field(varchar("email", 100).index("idx_name_email", 2))
            .field(varchar("name", 100).index("idx_name_email", 1));

        let descriptor = introspect(&shape).unwrap();
        assert_eq!(descriptor.indexes.len(), 1);
        let index = &descriptor.indexes[0];
        assert_eq!(index.name, "idx_name_email");
        assert_eq!(index.fields, vec!["name", "email"]);
        assert!(!index.unique);
    }

    #[test]
    fn foreign_key_field_becomes_constraint() {
        let shape = EntityShape::new("items")
            .field(uuid("id").primary_key())
            .field(
                uuid("owner_id")
                    .references("users", "id")
                    .on_delete(ForeignKeyAction::Cascade),
            );

        let descriptor = introspect(&shape).unwrap();
        let fk = descriptor.get_constraint("fk_items_owner_id").unwrap();
        assert_eq!(fk.kind, ConstraintKind::ForeignKey);
        assert_eq!(fk.ref_table.as_deref(), Some("users"));
        assert_eq!(fk.on_delete, Some(ForeignKeyAction::Cascade));
    }

    #[test]
    fn text_with_size_resolves_to_varchar() {
        let shape = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(text("name").size(100));

        let descriptor = introspect(&shape).unwrap();
        let name = descriptor.get_column("name").unwrap();
        assert_eq!(name.sql_type, SqlType::Varchar(100));
        assert_eq!(name.size, Some(100));
    }

    #[test]
    fn conflicting_size_is_rejected() {
        let shape = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(varchar("name", 100).size(200));

        assert!(matches!(
            introspect(&shape),
            Err(MigrateError::Model { .. })
        ));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let shape = EntityShape::new("users")
            .field(uuid("id").primary_key())
            .field(text("email"))
            .field(varchar("email", 100));

        assert!(matches!(
            introspect(&shape),
            Err(MigrateError::Model { .. })
        ));
    }

    #[test]
    fn duplicate_index_priority_is_rejected() {
        let shape = EntityShape::new("users")
            .field(text("name").index("idx_pair", 1))
            .field(text("email").index("idx_pair", 1));

        assert!(matches!(
            introspect(&shape),
            Err(MigrateError::Model { .. })
        ));
    }

    #[test]
    fn empty_shape_is_rejected() {
        assert!(matches!(
            introspect(&EntityShape::new("users")),
            Err(MigrateError::Model { .. })
        ));
    }
}
