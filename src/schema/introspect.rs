//! Builds a [`Schema`] from a live connection.
//!
//! Every lookup is an ordered list of strategies. Column discovery degrades
//! from the information schema, to `PRAGMA table_info`, to reading result-set
//! column names with a VARCHAR placeholder type, so a table is never dropped
//! from the snapshot just because its type descriptors are unreadable.

use crate::db::{Row, SqlExecutor};
use crate::error::{DbError, FuzzError, Result};
use crate::schema::{Column, Schema, SemanticType, Table, TableIndex};
use duckdb::types::Value;
use tracing::{debug, warn};

/// Name prefixes of engine-internal tables.
const RESERVED_PREFIXES: &[&str] = &["sqlite_", "duck_", "pg_"];

type TableListStrategy = fn(&dyn SqlExecutor) -> std::result::Result<Vec<String>, DbError>;
type ColumnStrategy = fn(&dyn SqlExecutor, &str) -> std::result::Result<Vec<Column>, DbError>;

const TABLE_LIST_STRATEGIES: &[(&str, TableListStrategy)] = &[
    ("information_schema.tables", tables_from_information_schema),
    ("SHOW TABLES", tables_from_show_tables),
];

const COLUMN_STRATEGIES: &[(&str, ColumnStrategy)] = &[
    ("information_schema.columns", columns_from_information_schema),
    ("pragma table_info", columns_from_pragma),
    ("result set names", columns_from_result_names),
];

pub fn build_schema(executor: &dyn SqlExecutor) -> Result<Schema> {
    let mut table_names = list_tables(executor)?;
    table_names.retain(|name| !is_reserved(name));
    table_names.sort();
    table_names.dedup();

    let tables = table_names
        .into_iter()
        .map(|name| {
            let columns = table_columns(executor, &name);
            let indexes = table_indexes(executor, &name);
            Table {
                name,
                columns,
                indexes,
            }
        })
        .collect();

    Ok(Schema::new(tables))
}

fn is_reserved(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn list_tables(executor: &dyn SqlExecutor) -> Result<Vec<String>> {
    let mut last_error = None;
    for (label, strategy) in TABLE_LIST_STRATEGIES {
        match strategy(executor) {
            Ok(tables) => return Ok(tables),
            Err(e) => {
                warn!("Table listing via {} failed: {}", label, e);
                last_error = Some(e);
            }
        }
    }
    Err(FuzzError::Connectivity(
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no table listing strategy available".to_string()),
    ))
}

fn table_columns(executor: &dyn SqlExecutor, table: &str) -> Vec<Column> {
    for (label, strategy) in COLUMN_STRATEGIES {
        match strategy(executor, table) {
            Ok(columns) if !columns.is_empty() => {
                debug!("Columns of {} read via {}", table, label);
                return columns;
            }
            Ok(_) => debug!("No columns for {} via {}", table, label),
            Err(e) => warn!("Column lookup for {} via {} failed: {}", table, label, e),
        }
    }
    warn!("Keeping table {} without column information", table);
    Vec::new()
}

/// Index names; any failure reads as "no indexes".
fn table_indexes(executor: &dyn SqlExecutor, table: &str) -> Vec<TableIndex> {
    let sql = format!(
        "SELECT index_name FROM duckdb_indexes() WHERE table_name = {}",
        quote_literal(table)
    );
    match executor.execute_and_get_rows(&sql) {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| text_at(row, 0))
            .map(|name| TableIndex { name })
            .collect(),
        Err(e) => {
            debug!("Index lookup for {} failed, assuming none: {}", table, e);
            Vec::new()
        }
    }
}

fn tables_from_information_schema(
    executor: &dyn SqlExecutor,
) -> std::result::Result<Vec<String>, DbError> {
    let rows = executor.execute_and_get_rows(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_type = 'BASE TABLE' AND table_schema = current_schema() \
         ORDER BY table_name",
    )?;
    Ok(rows.iter().filter_map(|row| text_at(row, 0)).collect())
}

fn tables_from_show_tables(executor: &dyn SqlExecutor) -> std::result::Result<Vec<String>, DbError> {
    let rows = executor.execute_and_get_rows("SHOW TABLES")?;
    Ok(rows.iter().filter_map(|row| text_at(row, 0)).collect())
}

fn columns_from_information_schema(
    executor: &dyn SqlExecutor,
    table: &str,
) -> std::result::Result<Vec<Column>, DbError> {
    let sql = format!(
        "SELECT column_name, data_type, character_maximum_length, is_nullable \
         FROM information_schema.columns \
         WHERE table_name = {} AND table_schema = current_schema() \
         ORDER BY ordinal_position",
        quote_literal(table)
    );
    let rows = executor.execute_and_get_rows(&sql)?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = text_at(row, 0)?;
            let mut declared = text_at(row, 1).unwrap_or_else(|| SemanticType::Varchar.to_string());
            if let Some(len) = int_at(row, 2).filter(|len| *len > 0) {
                let ty = SemanticType::from_declared(&declared);
                if ty.is_textual() && !declared.contains('(') {
                    declared = format!("{}({})", declared, len);
                }
            }
            let nullable = text_at(row, 3).is_none_or(|v| v.eq_ignore_ascii_case("YES"));
            Some(Column {
                semantic_type: SemanticType::from_declared(&declared),
                declared_type: declared,
                name,
                nullable,
            })
        })
        .collect())
}

fn columns_from_pragma(
    executor: &dyn SqlExecutor,
    table: &str,
) -> std::result::Result<Vec<Column>, DbError> {
    let sql = format!("PRAGMA table_info({})", quote_literal(table));
    let rows = executor.execute_and_get_rows(&sql)?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = text_at(row, 1)?;
            let declared = text_at(row, 2).unwrap_or_else(|| SemanticType::Varchar.to_string());
            let not_null = matches!(row.get(3), Some(Value::Boolean(true)));
            let column = Column::new(name, declared);
            Some(if not_null { column.not_null() } else { column })
        })
        .collect())
}

fn columns_from_result_names(
    executor: &dyn SqlExecutor,
    table: &str,
) -> std::result::Result<Vec<Column>, DbError> {
    let sql = format!("SELECT * FROM {} LIMIT 0", quote_identifier(table));
    let names = executor.query_column_names(&sql)?;
    Ok(names
        .into_iter()
        .map(|name| Column::new(name, SemanticType::Varchar.sql_name()))
        .collect())
}

fn text_at(row: &Row, idx: usize) -> Option<String> {
    match row.get(idx)? {
        Value::Text(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(crate::db::cell_to_string(other)),
    }
}

fn int_at(row: &Row, idx: usize) -> Option<i64> {
    match row.get(idx)? {
        Value::TinyInt(v) => Some(i64::from(*v)),
        Value::SmallInt(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::BigInt(v) => Some(*v),
        Value::UInt(v) => Some(i64::from(*v)),
        _ => None,
    }
}

pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DuckExecutor;
    use crate::db::testing::ScriptedExecutor;

    #[test]
    fn reads_tables_columns_and_types() {
        let exec = DuckExecutor::in_memory().unwrap();
        exec.execute_statement(
            "CREATE TABLE t1 (id INTEGER NOT NULL, c0 VARCHAR(50), c1 DECIMAL(10,2), c2 TIMESTAMP)",
        )
        .unwrap();
        exec.execute_statement("CREATE TABLE t0 (id INTEGER NOT NULL)").unwrap();
        exec.execute_statement("CREATE INDEX i_t1_id ON t1 (id)").unwrap();

        let schema = build_schema(&exec).unwrap();
        let names: Vec<&str> = schema.database_tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t0", "t1"]);

        let t1 = schema.table("t1").unwrap();
        let types: Vec<SemanticType> = t1.columns.iter().map(|c| c.semantic_type).collect();
        assert_eq!(
            types,
            vec![
                SemanticType::Integer,
                SemanticType::Varchar,
                SemanticType::Decimal,
                SemanticType::Timestamp
            ]
        );
        assert!(!t1.columns[0].nullable);
        assert!(t1.columns[1].nullable);
        assert_eq!(t1.indexes, vec![TableIndex { name: "i_t1_id".to_string() }]);
    }

    #[test]
    fn pragma_strategy_reads_types() {
        let exec = DuckExecutor::in_memory().unwrap();
        exec.execute_statement("CREATE TABLE t (id INTEGER NOT NULL, b BOOLEAN)").unwrap();
        let cols = columns_from_pragma(&exec, "t").unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1].semantic_type, SemanticType::Boolean);
        assert!(!cols[0].nullable);
    }

    #[test]
    fn result_name_strategy_defaults_to_varchar() {
        let exec = DuckExecutor::in_memory().unwrap();
        exec.execute_statement("CREATE TABLE t (id INTEGER, d DATE)").unwrap();
        let cols = columns_from_result_names(&exec, "t").unwrap();
        assert_eq!(cols.len(), 2);
        assert!(cols.iter().all(|c| c.semantic_type == SemanticType::Varchar));
    }

    #[test]
    fn columns_fall_back_to_pragma() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE t (id INTEGER NOT NULL, b BOOLEAN)")
            .reject("information_schema.columns", "Catalog Error: unreadable type descriptor");

        let schema = build_schema(&exec).unwrap();
        let t = schema.table("t").unwrap();
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.columns[1].semantic_type, SemanticType::Boolean);
        assert!(!t.columns[0].nullable);
    }

    #[test]
    fn columns_fall_back_to_result_names() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE t (id INTEGER, d DATE)")
            .reject("information_schema.columns", "Catalog Error: unreadable type descriptor")
            .reject("PRAGMA table_info", "Catalog Error: pragma unavailable");

        let schema = build_schema(&exec).unwrap();
        let t = schema.table("t").unwrap();
        let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "d"]);
        assert!(t.columns.iter().all(|c| c.semantic_type == SemanticType::Varchar));
    }

    #[test]
    fn index_lookup_failure_means_no_indexes() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE t (id INTEGER)")
            .setup("CREATE INDEX i_t_id ON t (id)")
            .reject("duckdb_indexes", "Catalog Error: no index catalog");

        let schema = build_schema(&exec).unwrap();
        let t = schema.table("t").unwrap();
        assert!(t.indexes.is_empty());
        assert_eq!(t.columns.len(), 1);
    }

    #[test]
    fn table_listing_falls_back_to_show_tables() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE t (id INTEGER)")
            .reject("information_schema.tables", "Catalog Error: no information schema");

        let schema = build_schema(&exec).unwrap();
        let names: Vec<&str> = schema.database_tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t"]);
    }

    #[test]
    fn unreadable_table_list_is_a_connectivity_error() {
        let exec = ScriptedExecutor::new()
            .reject("information_schema.tables", "IO Error: catalog unreadable")
            .reject("SHOW TABLES", "IO Error: catalog unreadable");

        let err = build_schema(&exec).unwrap_err();
        assert!(matches!(err, FuzzError::Connectivity(_)));
    }

    #[test]
    fn reserved_prefixes_are_skipped() {
        assert!(is_reserved("sqlite_master"));
        assert!(is_reserved("DUCK_internal"));
        assert!(!is_reserved("t0_1_2"));
    }

    #[test]
    fn literals_and_identifiers_are_escaped() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
