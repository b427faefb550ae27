use crate::db::{Row, SqlExecutor, strip_terminator};
use crate::error::DbError;
use duckdb::Connection;
use duckdb::types::Value;
use std::ops::Deref;
use tracing::{debug, warn};

/// [`SqlExecutor`] over a DuckDB connection.
///
/// `C` is anything that derefs to a [`Connection`]: a boxed connection in
/// tests, an r2d2 `PooledConnection` in the harness.
pub struct DuckExecutor<C> {
    conn: C,
}

impl<C> DuckExecutor<C>
where
    C: Deref<Target = Connection>,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Turns a failed statement into a connection error when the connection
    /// no longer answers a trivial query.
    fn classify(&self, sql: &str, err: duckdb::Error) -> DbError {
        if self.is_alive() {
            DbError::Statement {
                sql: sql.to_string(),
                message: err.to_string(),
            }
        } else {
            warn!("Connection failed liveness probe after: {}", err);
            DbError::Connection(err.to_string())
        }
    }
}

impl DuckExecutor<Box<Connection>> {
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self::new(Box::new(conn)))
    }
}

impl<C> SqlExecutor for DuckExecutor<C>
where
    C: Deref<Target = Connection>,
{
    fn execute_statement(&self, sql: &str) -> Result<(), DbError> {
        let sql = strip_terminator(sql);
        debug!("execute: {}", sql);
        self.conn
            .execute(sql, [])
            .map(|_| ())
            .map_err(|e| self.classify(sql, e))
    }

    fn execute_and_get_rows(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let sql = strip_terminator(sql);
        debug!("query: {}", sql);

        let fetch = || -> duckdb::Result<Vec<Row>> {
            let mut stmt = self.conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            let width = rows.as_ref().map_or(0, |s| s.column_count());

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    cells.push(row.get::<_, Value>(i)?);
                }
                out.push(cells);
            }
            Ok(out)
        };

        fetch().map_err(|e| self.classify(sql, e))
    }

    fn query_column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        let sql = strip_terminator(sql);

        let names = || -> duckdb::Result<Vec<String>> {
            let mut stmt = self.conn.prepare(sql)?;
            let rows = stmt.query([])?;
            Ok(rows.as_ref().map(|s| s.column_names()).unwrap_or_default())
        };

        names().map_err(|e| self.classify(sql, e))
    }

    fn is_alive(&self) -> bool {
        self.conn.execute("SELECT 1", []).is_ok()
    }
}
