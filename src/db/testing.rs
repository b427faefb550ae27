//! In-memory executor that rejects chosen statements, for exercising
//! fallback and error paths.

use crate::db::{DuckExecutor, Row, SqlExecutor};
use crate::error::DbError;
use duckdb::Connection;
use std::cell::{Cell, RefCell};

struct Rejection {
    fragment: String,
    message: String,
    /// `None` rejects every match.
    remaining: Option<usize>,
}

pub(crate) struct ScriptedExecutor {
    inner: DuckExecutor<Box<Connection>>,
    rejections: RefCell<Vec<Rejection>>,
    alive: Cell<bool>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self {
            inner: DuckExecutor::in_memory().unwrap(),
            rejections: RefCell::new(Vec::new()),
            alive: Cell::new(true),
        }
    }

    /// Runs setup SQL without going through the rejection rules.
    pub(crate) fn setup(self, sql: &str) -> Self {
        self.inner.execute_statement(sql).unwrap();
        self
    }

    /// Rejects every statement containing `fragment`.
    pub(crate) fn reject(self, fragment: &str, message: &str) -> Self {
        self.push(fragment, message, None)
    }

    /// Rejects the first `times` statements containing `fragment`.
    pub(crate) fn reject_times(self, fragment: &str, message: &str, times: usize) -> Self {
        self.push(fragment, message, Some(times))
    }

    pub(crate) fn disconnected(self) -> Self {
        self.alive.set(false);
        self
    }

    fn push(self, fragment: &str, message: &str, remaining: Option<usize>) -> Self {
        self.rejections.borrow_mut().push(Rejection {
            fragment: fragment.to_string(),
            message: message.to_string(),
            remaining,
        });
        self
    }

    fn gate(&self, sql: &str) -> Result<(), DbError> {
        if !self.alive.get() {
            return Err(DbError::Connection("connection closed".to_string()));
        }
        for rejection in self.rejections.borrow_mut().iter_mut() {
            if !sql.contains(&rejection.fragment) {
                continue;
            }
            match &mut rejection.remaining {
                Some(0) => continue,
                Some(n) => *n -= 1,
                None => {}
            }
            return Err(DbError::Statement {
                sql: sql.to_string(),
                message: rejection.message.clone(),
            });
        }
        Ok(())
    }
}

impl SqlExecutor for ScriptedExecutor {
    fn execute_statement(&self, sql: &str) -> Result<(), DbError> {
        self.gate(sql)?;
        self.inner.execute_statement(sql)
    }

    fn execute_and_get_rows(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.gate(sql)?;
        self.inner.execute_and_get_rows(sql)
    }

    fn query_column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        self.gate(sql)?;
        self.inner.query_column_names(sql)
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }
}
