//! NoREC-style check: a query and its copy with a tautological condition
//! appended must return the same number of rows.

use crate::db::{Row, cell_to_string, strip_terminator};
use crate::error::{FuzzError, Result};
use crate::oracle::TestOracle;
use crate::oracle::errors;
use crate::random::Randomly;
use crate::schema::Table;
use crate::state::{Finding, GlobalState};

#[derive(Debug, Clone)]
pub enum CheckOutcome {
    Pass { rows: usize },
    Mismatch(Finding),
    ExpectedError { message: String, pattern: &'static str },
}

#[derive(Debug, Default)]
pub struct NoRecOracle {
    last_query: Option<String>,
}

impl NoRecOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// One check, with the outcome returned instead of only logged. Errors
    /// that are not benign are returned as `Err`.
    pub fn check_outcome(&mut self, state: &mut GlobalState) -> Result<CheckOutcome> {
        state.stats_mut().checks += 1;

        let outcome = match self.compare(state) {
            Ok(outcome) => outcome,
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => {
                let message = e.to_string();
                match errors::classify(&e.engine_message()) {
                    Some(benign) => CheckOutcome::ExpectedError {
                        message,
                        pattern: benign.pattern,
                    },
                    None => {
                        state.log().log_exception(&e, self.last_query.as_deref());
                        return Err(e);
                    }
                }
            }
        };

        match &outcome {
            CheckOutcome::Pass { rows } => {
                state.stats_mut().passes += 1;
                state
                    .log()
                    .log_info(&format!("NoREC check passed: both queries returned {} rows", rows));
            }
            CheckOutcome::Mismatch(finding) => {
                state.log().log_error(
                    &format!(
                        "NoREC inconsistency: base query returned {} rows, rewritten query returned {} rows\n  base:      {}\n  rewritten: {}",
                        finding.base_rows,
                        finding.rewritten_rows,
                        finding.base_query,
                        finding.rewritten_query
                    ),
                    Some(finding.rewritten_query.as_str()),
                );
                state.stats_mut().findings.push(finding.clone());
            }
            CheckOutcome::ExpectedError { message, pattern } => {
                state.stats_mut().expected_errors += 1;
                state.log().log_info(&format!(
                    "expected error ({}): {}",
                    pattern, message
                ));
            }
        }

        Ok(outcome)
    }

    fn compare(&mut self, state: &mut GlobalState) -> Result<CheckOutcome> {
        let schema = state.schema();
        let table = schema
            .random_table(state.randomly())
            .ok_or_else(|| FuzzError::Precondition("no tables available in schema".to_string()))?;

        let base = generate_base_query(state.randomly(), table)?;
        let rewritten = rewrite_with_tautology(&base);
        self.last_query = Some(base.clone());

        let base_rows = state.execute_and_get_rows(&base)?;
        self.last_query = Some(rewritten.clone());
        let rewritten_rows = state.execute_and_get_rows(&rewritten)?;

        if row_counts_agree(&base_rows, &rewritten_rows) {
            return Ok(CheckOutcome::Pass {
                rows: base_rows.len(),
            });
        }

        Ok(CheckOutcome::Mismatch(Finding {
            base_plan: query_plan(state, &base),
            rewritten_plan: query_plan(state, &rewritten),
            base_rows: base_rows.len(),
            rewritten_rows: rewritten_rows.len(),
            base_query: base,
            rewritten_query: rewritten,
        }))
    }
}

impl TestOracle for NoRecOracle {
    fn check(&mut self, state: &mut GlobalState) -> Result<()> {
        self.check_outcome(state).map(|_| ())
    }

    fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }
}

/// `SELECT <col> FROM <table>`, preferring a numeric column, with a
/// `WHERE <col> > 0` filter on a coin flip when that column is numeric.
pub fn generate_base_query(r: &mut Randomly, table: &Table) -> Result<String> {
    let column = table.preferred_column().ok_or_else(|| {
        FuzzError::Precondition(format!("table {} has no columns", table.name))
    })?;

    let mut sql = format!("SELECT {} FROM {}", column.name, table.name);
    if r.boolean() && column.semantic_type.is_numeric() {
        sql.push_str(&format!(" WHERE {} > 0", column.name));
    }
    Ok(sql)
}

/// Appends `AND 1=1` to a filtered query, `WHERE 1=1` otherwise.
pub fn rewrite_with_tautology(base: &str) -> String {
    let base = strip_terminator(base);
    if has_where_clause(base) {
        format!("{} AND 1=1", base)
    } else {
        format!("{} WHERE 1=1", base)
    }
}

fn has_where_clause(sql: &str) -> bool {
    sql.split_whitespace().any(|word| word.eq_ignore_ascii_case("WHERE"))
}

/// Only the number of rows is compared, never the cells.
pub fn row_counts_agree(base: &[Row], rewritten: &[Row]) -> bool {
    base.len() == rewritten.len()
}

/// `EXPLAIN` output for a query; empty when the engine refuses to explain.
fn query_plan(state: &GlobalState, sql: &str) -> String {
    let explain = format!("EXPLAIN {}", sql);
    match state.execute_and_get_rows(&explain) {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| row.last())
            .map(cell_to_string)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        Err(e) => {
            state.log().log_exception(&e, Some(explain.as_str()));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::ScriptedExecutor;
    use crate::schema::{Column, Schema};
    use crate::util::event_log::RecordingEventLog;
    use duckdb::types::Value;

    fn state_over(exec: ScriptedExecutor, table: &str) -> (GlobalState, RecordingEventLog) {
        let log = RecordingEventLog::new();
        let mut state = GlobalState::new(Box::new(exec), Box::new(log.clone()), 3);
        state.set_schema(Schema::new(vec![Table::new(
            table,
            vec![Column::new("id", "INTEGER")],
        )]));
        (state, log)
    }

    #[test]
    fn identifiers_in_sql_do_not_make_errors_benign() {
        let exec = ScriptedExecutor::new().reject(
            "FROM invalid_orders",
            "INTERNAL Error: Attempted to access index 3",
        );
        let (mut state, log) = state_over(exec, "invalid_orders");

        let err = NoRecOracle::new().check(&mut state).unwrap_err();
        assert!(err.engine_message().starts_with("INTERNAL Error"));
        assert_eq!(state.stats().expected_errors, 0);
        assert_eq!(log.errors().len(), 1);
    }

    #[test]
    fn engine_message_decides_benign() {
        let exec = ScriptedExecutor::new().reject(
            "FROM orders",
            "Binder Error: Referenced column \"id\" not found in FROM clause!",
        );
        let (mut state, _log) = state_over(exec, "orders");

        let outcome = NoRecOracle::new().check_outcome(&mut state).unwrap();
        assert!(matches!(
            outcome,
            CheckOutcome::ExpectedError {
                pattern: "not found",
                ..
            }
        ));
        assert_eq!(state.stats().expected_errors, 1);
    }

    #[test]
    fn rewrite_adds_where_or_and() {
        assert_eq!(rewrite_with_tautology("SELECT id FROM t"), "SELECT id FROM t WHERE 1=1");
        assert_eq!(
            rewrite_with_tautology("SELECT id FROM t WHERE id > 0;"),
            "SELECT id FROM t WHERE id > 0 AND 1=1"
        );
        assert_eq!(
            rewrite_with_tautology("select id from t where id > 0"),
            "select id from t where id > 0 AND 1=1"
        );
    }

    #[test]
    fn base_query_prefers_numeric_and_filters_only_numeric() {
        let mut r = Randomly::new(10);
        let numeric = Table::new(
            "t",
            vec![Column::new("c0", "VARCHAR(50)"), Column::new("c1", "BIGINT")],
        );
        let text = Table::new("u", vec![Column::new("c0", "VARCHAR(50)")]);

        let mut saw_filter = false;
        for _ in 0..100 {
            let q = generate_base_query(&mut r, &numeric).unwrap();
            assert!(q == "SELECT c1 FROM t" || q == "SELECT c1 FROM t WHERE c1 > 0");
            saw_filter |= q.contains("WHERE");
            assert_eq!(generate_base_query(&mut r, &text).unwrap(), "SELECT c0 FROM u");
        }
        assert!(saw_filter);
    }

    #[test]
    fn table_without_columns_is_a_precondition_error() {
        let mut r = Randomly::new(1);
        let err = generate_base_query(&mut r, &Table::new("e", vec![])).unwrap_err();
        assert!(matches!(err, FuzzError::Precondition(_)));
    }

    #[test]
    fn counts_not_cells_are_compared() {
        let a = vec![vec![Value::Int(1)], vec![Value::Int(2)]];
        let b = vec![vec![Value::Int(7)], vec![Value::Null]];
        let c = vec![vec![Value::Int(1)]];
        assert!(row_counts_agree(&a, &b));
        assert!(!row_counts_agree(&a, &c));
        assert!(row_counts_agree(&[], &[]));
    }
}
