//! Per-database fuzzing state, passed explicitly to every generator and oracle.

use crate::db::{Row, SqlExecutor};
use crate::error::{FuzzError, Result};
use crate::random::Randomly;
use crate::schema::{Schema, build_schema};
use crate::util::event_log::EventLog;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Pause before the single schema-refresh retry.
pub const SCHEMA_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A reproducible oracle finding.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub base_query: String,
    pub rewritten_query: String,
    pub base_rows: usize,
    pub rewritten_rows: usize,
    pub base_plan: String,
    pub rewritten_plan: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub checks: u64,
    pub passes: u64,
    pub expected_errors: u64,
    pub findings: Vec<Finding>,
}

pub struct GlobalState {
    executor: Box<dyn SqlExecutor>,
    log: Box<dyn EventLog>,
    randomly: Randomly,
    schema: Arc<Schema>,
    stats: RunStats,
}

impl GlobalState {
    pub fn new(executor: Box<dyn SqlExecutor>, log: Box<dyn EventLog>, seed: u64) -> Self {
        Self {
            executor,
            log,
            randomly: Randomly::new(seed),
            schema: Arc::new(Schema::empty()),
            stats: RunStats::default(),
        }
    }

    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = Arc::new(schema);
    }

    pub fn randomly(&mut self) -> &mut Randomly {
        &mut self.randomly
    }

    pub fn log(&self) -> &dyn EventLog {
        self.log.as_ref()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    pub fn executor(&self) -> &dyn SqlExecutor {
        self.executor.as_ref()
    }

    pub fn execute_statement(&self, sql: &str) -> Result<()> {
        self.log.log_query(sql);
        self.executor.execute_statement(sql)?;
        Ok(())
    }

    pub fn execute_and_get_rows(&self, sql: &str) -> Result<Vec<Row>> {
        self.log.log_query(sql);
        Ok(self.executor.execute_and_get_rows(sql)?)
    }

    /// Re-reads the schema from the connection and swaps it in.
    pub fn refresh_schema(&mut self) -> Result<()> {
        let schema = build_schema(self.executor.as_ref())?;
        self.log.log_info(&format!(
            "Schema refreshed, now has {} tables",
            schema.database_tables().len()
        ));
        self.schema = Arc::new(schema);
        Ok(())
    }

    /// [`Self::refresh_schema`] with one delayed retry.
    pub fn refresh_schema_with_retry(&mut self) -> Result<()> {
        match self.refresh_schema() {
            Ok(()) => Ok(()),
            Err(first) => {
                self.log.log_exception(&first, None);
                std::thread::sleep(SCHEMA_RETRY_DELAY);
                self.refresh_schema().map_err(|e| {
                    if e.is_connectivity() {
                        e
                    } else {
                        FuzzError::SchemaVisibility(e.to_string())
                    }
                })
            }
        }
    }

    pub fn table_count(&self) -> usize {
        self.schema.database_tables().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DuckExecutor;
    use crate::db::testing::ScriptedExecutor;
    use crate::util::event_log::RecordingEventLog;

    #[test]
    fn refresh_replaces_the_snapshot() {
        let exec = DuckExecutor::in_memory().unwrap();
        let log = RecordingEventLog::new();
        let mut state = GlobalState::new(Box::new(exec), Box::new(log.clone()), 1);

        let before = state.schema();
        state.execute_statement("CREATE TABLE t (id INTEGER)").unwrap();
        state.refresh_schema_with_retry().unwrap();

        assert!(before.is_empty());
        assert_eq!(state.table_count(), 1);
        assert!(log.infos().iter().any(|m| m.contains("now has 1 tables")));
        assert_eq!(log.queries(), vec!["CREATE TABLE t (id INTEGER)".to_string()]);
    }

    #[test]
    fn refresh_retries_once_after_a_transient_failure() {
        let exec = ScriptedExecutor::new()
            .setup("CREATE TABLE t (id INTEGER)")
            .reject_times("information_schema.tables", "Catalog Error: not visible yet", 1)
            .reject_times("SHOW TABLES", "Catalog Error: not visible yet", 1);
        let log = RecordingEventLog::new();
        let mut state = GlobalState::new(Box::new(exec), Box::new(log.clone()), 1);

        state.refresh_schema_with_retry().unwrap();
        assert_eq!(state.table_count(), 1);
        assert_eq!(log.errors().len(), 1);
    }

    #[test]
    fn lost_connection_stays_a_connectivity_error() {
        let exec = ScriptedExecutor::new().disconnected();
        let mut state = GlobalState::new(Box::new(exec), Box::new(RecordingEventLog::new()), 1);

        let err = state.refresh_schema_with_retry().unwrap_err();
        assert!(err.is_connectivity());
        assert!(!matches!(err, FuzzError::SchemaVisibility(_)));
    }
}
