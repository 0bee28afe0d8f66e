//! PostgreSQL dialect.

use crate::operations::DdlOperation;
use crate::schema::{
    ColumnDescriptor, ConstraintDescriptor, ConstraintKind, ForeignKeyAction, IndexDescriptor,
    IndexKind, SqlType, TimestampRole,
};

use super::SqlDialect;

/// PostgreSQL DDL rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn column_definition(&self, column: &ColumnDescriptor) -> String {
        // Auto-incrementing integer primary keys become SERIAL types.
        let type_name = if column.auto_increment && column.primary_key {
            match column.sql_type {
                SqlType::Integer | SqlType::SmallInt => "SERIAL".to_string(),
                SqlType::BigInt => "BIGSERIAL".to_string(),
                ref other => self.type_name(other),
            }
        } else {
            self.type_name(&column.sql_type)
        };

        let mut sql = format!("{} {}", self.quote_identifier(&column.name), type_name);

        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            sql.push_str(" NOT NULL");
        }

        // Auto-managed timestamps are seeded by the database unless an
        // explicit default overrides them.
        if let Some(default) = column.default.to_sql() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        } else if column.timestamp_role != TimestampRole::None {
            sql.push_str(" DEFAULT now()");
        }

        sql
    }

    fn create_table_sql(&self, table: &str, columns: &[ColumnDescriptor]) -> String {
        let pk: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.primary_key).collect();
        let composite_pk = pk.len() > 1;

        let mut sql = format!("CREATE TABLE {} (\n  ", self.quote_identifier(table));
        let definitions: Vec<String> = columns
            .iter()
            .map(|c| {
                if composite_pk && c.primary_key {
                    // The PRIMARY KEY clause is emitted once at table level.
                    let mut plain = c.clone();
                    plain.primary_key = false;
                    plain.nullable = false;
                    self.column_definition(&plain)
                } else {
                    self.column_definition(c)
                }
            })
            .collect();
        sql.push_str(&definitions.join(",\n  "));

        if composite_pk {
            let quoted: Vec<String> = pk
                .iter()
                .map(|c| self.quote_identifier(&c.name))
                .collect();
            sql.push_str(",\n  PRIMARY KEY (");
            sql.push_str(&quoted.join(", "));
            sql.push(')');
        }

        sql.push_str("\n)");
        sql
    }

    fn alter_column_sql(&self, table: &str, old: &ColumnDescriptor, new: &ColumnDescriptor) -> Vec<String> {
        let table = self.quote_identifier(table);
        let column = self.quote_identifier(&new.name);
        let mut statements = Vec::new();

        if old.sql_type != new.sql_type || old.size != new.size {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} TYPE {}",
                self.type_name(&new.sql_type)
            ));
        }

        if old.nullable != new.nullable {
            if new.nullable {
                statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} DROP NOT NULL"
                ));
            } else {
                statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} SET NOT NULL"
                ));
            }
        }

        // A timestamp-role change surfaces as a default change, matching
        // how the role renders at creation.
        if old.timestamp_role != new.timestamp_role || old.has_default() != new.has_default() {
            match new.default.to_sql() {
                Some(default) => statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} SET DEFAULT {default}"
                )),
                None if new.timestamp_role == TimestampRole::None => statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} DROP DEFAULT"
                )),
                None => statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} SET DEFAULT now()"
                )),
            }
        }

        statements
    }

    fn create_index_sql(&self, table: &str, index: &IndexDescriptor) -> String {
        let mut sql = String::from("CREATE ");
        if index.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        sql.push_str(&self.quote_identifier(&index.name));
        sql.push_str(" ON ");
        sql.push_str(&self.quote_identifier(table));

        match index.kind {
            IndexKind::BTree => {}
            IndexKind::Hash => sql.push_str(" USING hash"),
            IndexKind::Gin => sql.push_str(" USING gin"),
            IndexKind::Gist => sql.push_str(" USING gist"),
        }

        let quoted: Vec<String> = index
            .fields
            .iter()
            .map(|f| self.quote_identifier(f))
            .collect();
        sql.push_str(" (");
        sql.push_str(&quoted.join(", "));
        sql.push(')');
        sql
    }

    fn create_constraint_sql(&self, table: &str, constraint: &ConstraintDescriptor) -> String {
        let columns: Vec<String> = constraint
            .fields
            .iter()
            .map(|f| self.quote_identifier(f))
            .collect();
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} ",
            self.quote_identifier(table),
            self.quote_identifier(&constraint.name)
        );

        match constraint.kind {
            ConstraintKind::Unique => {
                sql.push_str("UNIQUE (");
                sql.push_str(&columns.join(", "));
                sql.push(')');
            }
            ConstraintKind::ForeignKey => {
                sql.push_str("FOREIGN KEY (");
                sql.push_str(&columns.join(", "));
                sql.push_str(") REFERENCES ");
                sql.push_str(
                    &self.quote_identifier(constraint.ref_table.as_deref().unwrap_or_default()),
                );
                let referenced: Vec<String> = constraint
                    .ref_fields
                    .iter()
                    .map(|f| self.quote_identifier(f))
                    .collect();
                sql.push_str(" (");
                sql.push_str(&referenced.join(", "));
                sql.push(')');

                if let Some(action) = constraint.on_delete {
                    if action != ForeignKeyAction::NoAction {
                        sql.push_str(" ON DELETE ");
                        sql.push_str(action.as_sql());
                    }
                }
                if let Some(action) = constraint.on_update {
                    if action != ForeignKeyAction::NoAction {
                        sql.push_str(" ON UPDATE ");
                        sql.push_str(action.as_sql());
                    }
                }
            }
        }

        sql
    }
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn render(&self, operation: &DdlOperation) -> Vec<String> {
        match operation {
            DdlOperation::CreateTable { table, columns } => {
                vec![self.create_table_sql(table, columns)]
            }

            DdlOperation::DropTable { table } => {
                vec![format!("DROP TABLE {}", self.quote_identifier(table))]
            }

            DdlOperation::AddColumn { table, column } => {
                vec![format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    self.quote_identifier(table),
                    self.column_definition(column)
                )]
            }

            DdlOperation::DropColumn { table, column } => {
                vec![format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    self.quote_identifier(table),
                    self.quote_identifier(column)
                )]
            }

            DdlOperation::RenameColumn { table, from, to } => {
                vec![format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {}",
                    self.quote_identifier(table),
                    self.quote_identifier(from),
                    self.quote_identifier(to)
                )]
            }

            DdlOperation::AlterColumn { table, old, new } => {
                self.alter_column_sql(table, old, new)
            }

            DdlOperation::CreateIndex { table, index } => {
                vec![self.create_index_sql(table, index)]
            }

            DdlOperation::DropIndex { name } => {
                vec![format!("DROP INDEX {}", self.quote_identifier(name))]
            }

            DdlOperation::RenameIndex { from, to } => {
                vec![format!(
                    "ALTER INDEX {} RENAME TO {}",
                    self.quote_identifier(from),
                    self.quote_identifier(to)
                )]
            }

            DdlOperation::CreateConstraint { table, constraint } => {
                vec![self.create_constraint_sql(table, constraint)]
            }

            DdlOperation::DropConstraint { table, name } => {
                vec![format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    self.quote_identifier(table),
                    self.quote_identifier(name)
                )]
            }
        }
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({len})"),
            SqlType::Char(len) => format!("CHAR({len})"),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Decimal(precision, scale) => format!("DECIMAL({precision}, {scale})"),
            SqlType::Bytea => "BYTEA".to_string(),
            SqlType::Json => "JSONB".to_string(),
            SqlType::Uuid => "UUID".to_string(),
        }
    }
}
