pub mod db_pool;
pub mod executor;
#[cfg(test)]
pub(crate) mod testing;

use crate::error::DbError;
use duckdb::types::Value;

pub use db_pool::DuckDBConnectionManager;
pub use executor::DuckExecutor;

/// One result row; cells are loosely typed.
pub type Row = Vec<Value>;

/// Runs raw SQL against the engine under test.
///
/// Exactly one statement runs at a time; callers never share an executor
/// across threads.
pub trait SqlExecutor {
    fn execute_statement(&self, sql: &str) -> Result<(), DbError>;

    fn execute_and_get_rows(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Column names of a query's result set, without reading its rows.
    fn query_column_names(&self, sql: &str) -> Result<Vec<String>, DbError>;

    fn is_alive(&self) -> bool;
}

/// Trims whitespace and a single trailing statement terminator.
pub fn strip_terminator(sql: &str) -> &str {
    let trimmed = sql.trim();
    trimmed.strip_suffix(';').map(str::trim_end).unwrap_or(trimmed)
}

/// Renders a cell for logs and reports.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::HugeInt(v) => v.to_string(),
        Value::UTinyInt(v) => v.to_string(),
        Value::USmallInt(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::UBigInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}
