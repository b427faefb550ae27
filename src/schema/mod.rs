//! In-memory model of the database under test.
//!
//! A [`Schema`] is an immutable snapshot. Refreshing builds a new one and the
//! owner swaps it in whole; nothing edits a snapshot in place.

pub mod data_type;
pub mod introspect;

use crate::random::Randomly;
use serde::{Deserialize, Serialize};

pub use data_type::SemanticType;
pub use introspect::build_schema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Raw type text as declared or as reported by the catalog.
    pub declared_type: String,
    pub semantic_type: SemanticType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            semantic_type: SemanticType::from_declared(&declared_type),
            declared_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn to_sql_definition(&self) -> String {
        let nullable_str = if self.nullable { "" } else { " NOT NULL" };
        format!("{} {}{}", self.name, self.declared_type, nullable_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<TableIndex>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn random_column(&self, r: &mut Randomly) -> Option<&Column> {
        r.choose_one_of(&self.columns)
    }

    /// First numeric column, else the first column.
    pub fn preferred_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.semantic_type.is_numeric())
            .or_else(|| self.columns.first())
    }

    pub fn to_create_table_sql(&self) -> String {
        let columns_sql: Vec<String> = self
            .columns
            .iter()
            .map(|col| col.to_sql_definition())
            .collect();

        format!("CREATE TABLE {} ({})", self.name, columns_sql.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn database_tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn random_table(&self, r: &mut Randomly) -> Option<&Table> {
        r.choose_one_of(&self.tables)
    }

    /// Table names paired with their column names, for content comparisons.
    pub fn shape(&self) -> Vec<(String, Vec<String>)> {
        let mut shape: Vec<(String, Vec<String>)> = self
            .tables
            .iter()
            .map(|t| {
                let mut cols: Vec<String> = t.columns.iter().map(|c| c.name.clone()).collect();
                cols.sort();
                (t.name.clone(), cols)
            })
            .collect();
        shape.sort();
        shape
    }
}
