//! Declarative entity shapes.
//!
//! An [`EntityShape`] is the hand-authored description of a table version:
//! an ordered list of fields with per-field metadata (type, size,
//! nullability, default, index membership, uniqueness, foreign-key
//! target). Shapes are static data; the introspector turns them into
//! [`ShapeDescriptor`](crate::schema::ShapeDescriptor)s.

use serde::{Deserialize, Serialize};

use crate::schema::{DefaultValue, ForeignKeyAction, IndexKind, SqlType, TimestampRole};

/// Membership of a field in a named index group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMembership {
    /// Index group name, used verbatim as the index name.
    pub group: String,
    /// Ordinal position of this field within the index key.
    pub priority: u32,
    /// Whether the group forms a unique index.
    pub unique: bool,
    /// Physical index kind.
    pub kind: IndexKind,
}

/// Foreign-key target of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub field: String,
    /// ON DELETE action.
    pub on_delete: ForeignKeyAction,
    /// ON UPDATE action.
    pub on_update: ForeignKeyAction,
}

/// One declared field of an entity shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Logical field name, used as the column name unless overridden.
    pub name: String,
    /// Physical column name override.
    pub column: Option<String>,
    /// SQL data type.
    pub sql_type: SqlType,
    /// Explicit character length. Must agree with any length the type
    /// itself carries.
    pub size: Option<u32>,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value.
    pub default: DefaultValue,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
    /// Singleton unique constraint (without an index group).
    pub unique: bool,
    /// Index group membership.
    pub index: Option<IndexMembership>,
    /// Foreign-key target.
    pub references: Option<ForeignKeyRef>,
    /// Auto-managed timestamp role.
    pub timestamp_role: TimestampRole,
    /// Declares this field as a rename of a column from the previous
    /// version, so the differ compiles a rename instead of drop+add.
    pub renamed_from: Option<String>,
}

impl FieldSpec {
    /// Creates a new field with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            column: None,
            sql_type,
            size: None,
            nullable: true,
            default: DefaultValue::None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            index: None,
            references: None,
            timestamp_role: TimestampRole::None,
            renamed_from: None,
        }
    }

    /// Overrides the physical column name.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Sets an explicit character length.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Adds a singleton unique constraint on this column.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds this field to the index group `group` at the given priority.
    #[must_use]
    pub fn index(mut self, group: impl Into<String>, priority: u32) -> Self {
        self.index = Some(IndexMembership {
            group: group.into(),
            priority,
            unique: false,
            kind: IndexKind::BTree,
        });
        self
    }

    /// Adds this field to the unique index group `group`.
    #[must_use]
    pub fn unique_index(mut self, group: impl Into<String>, priority: u32) -> Self {
        self.index = Some(IndexMembership {
            group: group.into(),
            priority,
            unique: true,
            kind: IndexKind::BTree,
        });
        self
    }

    /// Sets the physical kind of the field's index group.
    #[must_use]
    pub fn index_kind(mut self, kind: IndexKind) -> Self {
        if let Some(ref mut membership) = self.index {
            membership.kind = kind;
        }
        self
    }

    /// Declares a foreign key to `table.field`.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.references = Some(ForeignKeyRef {
            table: table.into(),
            field: field.into(),
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        });
        self
    }

    /// Sets the ON DELETE action of the foreign key.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        if let Some(ref mut fk) = self.references {
            fk.on_delete = action;
        }
        self
    }

    /// Sets the ON UPDATE action of the foreign key.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        if let Some(ref mut fk) = self.references {
            fk.on_update = action;
        }
        self
    }

    /// Marks the column as set once at row creation.
    #[must_use]
    pub fn create_time(mut self) -> Self {
        self.timestamp_role = TimestampRole::CreateTime;
        self
    }

    /// Marks the column as refreshed on every row update.
    #[must_use]
    pub fn update_time(mut self) -> Self {
        self.timestamp_role = TimestampRole::UpdateTime;
        self
    }

    /// Declares this field as a rename of `from` in the previous version.
    #[must_use]
    pub fn renamed_from(mut self, from: impl Into<String>) -> Self {
        self.renamed_from = Some(from.into());
        self
    }

    /// Resolved physical column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// A declared version of an entity's table shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityShape {
    /// Table name.
    pub table: String,
    /// Fields, in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl EntityShape {
    /// Creates an empty shape for the given table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

/// Shorthand for a UUID field.
#[must_use]
pub fn uuid(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::Uuid)
}

/// Shorthand for a BIGINT field.
#[must_use]
pub fn bigint(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::BigInt)
}

/// Shorthand for an INTEGER field.
#[must_use]
pub fn integer(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::Integer)
}

/// Shorthand for a TEXT field.
#[must_use]
pub fn text(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::Text)
}

/// Shorthand for a VARCHAR field.
#[must_use]
pub fn varchar(name: impl Into<String>, len: u32) -> FieldSpec {
    FieldSpec::new(name, SqlType::Varchar(len))
}

/// Shorthand for a BOOLEAN field.
#[must_use]
pub fn boolean(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::Boolean)
}

/// Shorthand for a TIMESTAMP field.
#[must_use]
pub fn timestamp(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, SqlType::Timestamp)
}
