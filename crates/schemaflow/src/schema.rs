//! Schema descriptor model.
//!
//! These types are the structural description of a table that the differ
//! and compiler operate on. They are always derived from a declared
//! [`EntityShape`](crate::model::EntityShape) by the introspector, never
//! hand-authored, and carry no behavior beyond comparisons.

use serde::{Deserialize, Serialize};

/// SQL data types supported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Small integer (16-bit).
    SmallInt,
    /// Unbounded text.
    Text,
    /// Variable-length character string.
    Varchar(u32),
    /// Fixed-length character string.
    Char(u32),
    /// Boolean.
    Boolean,
    /// Date and time.
    Timestamp,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Binary data.
    Bytea,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
}

impl SqlType {
    /// Returns the declared character length, for the types that carry one.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        match self {
            Self::Varchar(n) | Self::Char(n) => Some(*n),
            _ => None,
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "now()", "gen_random_uuid()").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value, or `None`
    /// if no default is set.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }

    /// Returns true if a default value is present.
    #[must_use]
    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Auto-managed timestamp role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimestampRole {
    /// Not an auto-managed timestamp.
    #[default]
    None,
    /// Set once at row creation.
    CreateTime,
    /// Refreshed on every row update.
    UpdateTime,
}

/// Structural description of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Resolved SQL data type.
    pub sql_type: SqlType,
    /// Declared character length, if the type carries one.
    pub size: Option<u32>,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value.
    pub default: DefaultValue,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
    /// Auto-managed timestamp role.
    pub timestamp_role: TimestampRole,
    /// Previous name of this column, when it was declared as a rename.
    pub renamed_from: Option<String>,
}

impl ColumnDescriptor {
    /// Returns true if the column has a default value.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Returns true if `other` differs structurally, i.e. an existing
    /// column with this descriptor would need an ALTER to match `other`.
    ///
    /// Names and rename declarations are not part of the comparison;
    /// default values compare by presence only.
    #[must_use]
    pub fn needs_alter(&self, other: &Self) -> bool {
        self.sql_type != other.sql_type
            || self.size != other.size
            || self.nullable != other.nullable
            || self.has_default() != other.has_default()
            || self.timestamp_role != other.timestamp_role
    }
}

/// Physical layout of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IndexKind {
    /// B-tree index (the default).
    #[default]
    BTree,
    /// Hash index.
    Hash,
    /// GIN index.
    Gin,
    /// GiST index.
    Gist,
}

/// Structural description of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// Indexed column names, in key order.
    pub fields: Vec<String>,
    /// Whether this is a unique index.
    pub unique: bool,
    /// Physical index kind.
    pub kind: IndexKind,
}

impl IndexDescriptor {
    /// Returns true if `other` indexes the same field sequence with the
    /// same kind and uniqueness, regardless of name. This is the basis
    /// of rename detection.
    #[must_use]
    pub fn field_equivalent(&self, other: &Self) -> bool {
        self.fields == other.fields && self.kind == other.kind && self.unique == other.unique
    }
}

/// Kind of a table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// UNIQUE constraint.
    Unique,
    /// FOREIGN KEY constraint.
    ForeignKey,
}

/// Structural description of a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    /// Constraint name.
    pub name: String,
    /// Constraint kind.
    pub kind: ConstraintKind,
    /// Constrained column names.
    pub fields: Vec<String>,
    /// Referenced table (foreign keys only).
    pub ref_table: Option<String>,
    /// Referenced columns (foreign keys only).
    pub ref_fields: Vec<String>,
    /// ON DELETE action (foreign keys only).
    pub on_delete: Option<ForeignKeyAction>,
    /// ON UPDATE action (foreign keys only).
    pub on_update: Option<ForeignKeyAction>,
}

impl ConstraintDescriptor {
    /// Creates a unique constraint over the given columns.
    #[must_use]
    pub fn unique(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Unique,
            fields,
            ref_table: None,
            ref_fields: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Returns true if this constraint involves the given column.
    #[must_use]
    pub fn involves(&self, column: &str) -> bool {
        self.fields.iter().any(|f| f == column)
    }
}

/// Complete structural description of one table, derived from a declared
/// entity shape. Indexes and constraints are kept sorted by name so that
/// iteration order (and therefore diff and script output) is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Table name.
    pub table_name: String,
    /// Column descriptors, in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Index descriptors, sorted by name.
    pub indexes: Vec<IndexDescriptor>,
    /// Constraint descriptors, sorted by name.
    pub constraints: Vec<ConstraintDescriptor>,
}

impl ShapeDescriptor {
    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Gets a constraint by name.
    #[must_use]
    pub fn get_constraint(&self, name: &str) -> Option<&ConstraintDescriptor> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Primary key column names, in declaration order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}
