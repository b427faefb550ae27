//! Creates and seeds the tables a fuzz iteration runs against.

use crate::error::Result;
use crate::generator::insert::{generate_insert, generate_minimal_insert};
use crate::generator::table::{generate_table, parse_create_table, unique_table_name};
use crate::schema::Table;
use crate::state::GlobalState;
use chrono::Utc;

const MIN_TABLES: i32 = 2;
const MAX_TABLES: i32 = 4;
const MIN_ROWS: i32 = 1;
const MAX_ROWS: i32 = 3;
const MAX_RUN_ID: i32 = 9999;
/// Insert attempts per empty table when topping up.
const TOP_UP_ATTEMPTS: usize = 5;

/// Creates 2-4 tables and seeds each with 1-3 rows.
///
/// Statement failures are logged and skipped; only connectivity failures and
/// an unrecoverable schema refresh are returned. Returns the names of the
/// tables whose CREATE TABLE succeeded.
pub fn populate(state: &mut GlobalState) -> Result<Vec<String>> {
    let table_count = state.randomly().integer_in(MIN_TABLES, MAX_TABLES);
    state.log().log_info(&format!("Creating {} tables", table_count));

    let timestamp = Utc::now().timestamp_millis();
    let run_id = state.randomly().integer_in(0, MAX_RUN_ID) as u32;

    let mut created: Vec<Table> = Vec::new();
    for ordinal in 0..table_count as usize {
        let name = unique_table_name(ordinal, timestamp, run_id);
        let table = generate_table(state.randomly(), &name);
        let ddl = table.to_create_table_sql();

        match state.execute_statement(&ddl) {
            Ok(()) => created.push(parse_create_table(&ddl).unwrap_or(table)),
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => state.log().log_exception(&e, Some(ddl.as_str())),
        }
    }

    state.refresh_schema_with_retry()?;

    let names: Vec<String> = created.iter().map(|t| t.name.clone()).collect();
    state.log().log_info(&format!("Tables created: {:?}", names));

    let schema = state.schema();
    for fallback in &created {
        let table = match schema.table(&fallback.name) {
            Some(table) => table,
            None => {
                state.log().log_info(&format!(
                    "Table {} not visible after refresh, using generated definition",
                    fallback.name
                ));
                fallback
            }
        };

        let rows = state.randomly().integer_in(MIN_ROWS, MAX_ROWS);
        state
            .log()
            .log_info(&format!("Inserting {} rows into table {}", rows, table.name));
        for _ in 0..rows {
            insert_row(state, table)?;
        }
    }

    state.log().log_info(&format!(
        "Database generation completed: {} tables created",
        state.table_count()
    ));
    Ok(names)
}

/// Tries a typed insert, then once more with the two-column fallback.
/// Returns whether a row landed.
pub fn insert_row(state: &mut GlobalState, table: &Table) -> Result<bool> {
    let Some(sql) = generate_insert(state.randomly(), table) else {
        return Ok(false);
    };

    match state.execute_statement(&sql) {
        Ok(()) => return Ok(true),
        Err(e) if e.is_connectivity() => return Err(e),
        Err(e) => state.log().log_exception(&e, Some(sql.as_str())),
    }

    let Some(fallback) = generate_minimal_insert(state.randomly(), table) else {
        return Ok(false);
    };
    match state.execute_statement(&fallback) {
        Ok(()) => Ok(true),
        Err(e) if e.is_connectivity() => Err(e),
        Err(e) => {
            state.log().log_exception(&e, Some(fallback.as_str()));
            Ok(false)
        }
    }
}

/// Gives every empty table some rows. Returns whether anything was added.
pub fn add_rows_to_all_tables(state: &mut GlobalState) -> Result<bool> {
    let schema = state.schema();
    let mut added = false;

    for table in schema.database_tables() {
        let count_sql = format!("SELECT COUNT(*) FROM {}", table.name);
        let is_empty = match state.execute_and_get_rows(&count_sql) {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.first())
                .is_some_and(|cell| crate::db::cell_to_string(cell) == "0"),
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => {
                state.log().log_exception(&e, Some(count_sql.as_str()));
                false
            }
        };

        if is_empty {
            for _ in 0..TOP_UP_ATTEMPTS {
                added |= insert_row(state, table)?;
            }
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DuckExecutor;
    use crate::db::testing::ScriptedExecutor;
    use crate::util::event_log::RecordingEventLog;
    use duckdb::types::Value;

    fn state(seed: u64) -> (GlobalState, RecordingEventLog) {
        let log = RecordingEventLog::new();
        let exec = DuckExecutor::in_memory().unwrap();
        (GlobalState::new(Box::new(exec), Box::new(log.clone()), seed), log)
    }

    #[test]
    fn failed_row_is_not_fatal() {
        let (mut state, log) = state(4);
        state
            .execute_statement(
                "CREATE TABLE strict_t (id INTEGER NOT NULL, c0 INTEGER, c1 BLOB NOT NULL)",
            )
            .unwrap();
        state.refresh_schema().unwrap();
        let table = state.schema().table("strict_t").unwrap().clone();

        // BLOB literals are always NULL and the fallback leaves c1 out, so
        // both attempts are rejected.
        assert!(!insert_row(&mut state, &table).unwrap());
        assert_eq!(log.errors().len(), 2);
    }

    #[test]
    fn minimal_insert_lands_after_typed_insert_is_rejected() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE loose_t (id INTEGER NOT NULL, c0 VARCHAR(50), c1 DATE)")
            .reject_times("INSERT INTO loose_t", "Conversion Error: rejected once", 1);
        let log = RecordingEventLog::new();
        let mut state = GlobalState::new(Box::new(exec), Box::new(log.clone()), 6);
        state.refresh_schema().unwrap();
        let table = state.schema().table("loose_t").unwrap().clone();

        assert!(insert_row(&mut state, &table).unwrap());
        assert_eq!(log.errors().len(), 1);

        let last = log.queries().pop().unwrap();
        assert!(last.starts_with("INSERT INTO loose_t (id, c0) VALUES"));
        let rows = state.execute_and_get_rows("SELECT c1 FROM loose_t").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0][0], Value::Null));
    }

    #[test]
    fn top_up_fills_empty_tables_only() {
        let (mut state, _log) = state(9);
        state.execute_statement("CREATE TABLE empty_t (id INTEGER NOT NULL)").unwrap();
        state.execute_statement("CREATE TABLE full_t (id INTEGER NOT NULL)").unwrap();
        state.execute_statement("INSERT INTO full_t VALUES (1)").unwrap();
        state.refresh_schema().unwrap();

        assert!(add_rows_to_all_tables(&mut state).unwrap());
        let empty_rows = state.execute_and_get_rows("SELECT * FROM empty_t").unwrap();
        let full_rows = state.execute_and_get_rows("SELECT * FROM full_t").unwrap();
        assert_eq!(empty_rows.len(), TOP_UP_ATTEMPTS);
        assert_eq!(full_rows.len(), 1);
    }
}
