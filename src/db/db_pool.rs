use duckdb::Connection;
use r2d2::ManageConnection;
use tracing::debug;

/// r2d2 manager for connections to the database under test.
///
/// Each in-memory connection (`:memory:`) is its own private database. Idle
/// connections are reused, so later iterations may see earlier tables.
pub struct DuckDBConnectionManager {
    connection_string: String,
}

impl DuckDBConnectionManager {
    pub fn new(connection_string: String) -> Self {
        Self { connection_string }
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection_string.is_empty() || self.connection_string == ":memory:"
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        if self.is_in_memory() {
            debug!("Opening in-memory database");
            Connection::open_in_memory()
        } else {
            debug!("Opening database at {}", self.connection_string);
            Connection::open(&self.connection_string)
        }
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
