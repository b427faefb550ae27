//! Error types for duck-norec.
//!
//! Errors fall into the buckets the fuzzer treats differently:
//! - **Connection** failures are unrecoverable and always surface.
//! - **Schema visibility** failures get one bounded retry before surfacing.
//! - **Statement** failures are absorbed by the generators and, in the oracle
//!   path, checked against the benign-error table in [`crate::oracle::errors`].

/// Error raised by a [`crate::db::SqlExecutor`].
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The connection itself is unusable.
    #[error("connection error: {0}")]
    Connection(String),

    /// A single statement was rejected while the connection stayed healthy.
    #[error("{message} [sql: {sql}]")]
    Statement { sql: String, message: String },
}

impl DbError {
    pub fn is_connection(&self) -> bool {
        matches!(self, DbError::Connection(_))
    }

    /// The engine's text, without the statement it was raised for.
    pub fn message(&self) -> &str {
        match self {
            DbError::Connection(message) => message,
            DbError::Statement { message, .. } => message,
        }
    }
}

/// Top-level error type for generation, oracle checks and the harness.
#[derive(Debug, thiserror::Error)]
pub enum FuzzError {
    /// Metadata could not be read at all.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// An operation was invoked on state that cannot support it.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The schema could not be re-read after DDL, even after the retry.
    #[error("schema refresh failed after retry: {0}")]
    SchemaVisibility(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fuzz task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl FuzzError {
    /// True for failures that mean the database can no longer be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            FuzzError::Connectivity(_) | FuzzError::Pool(_) => true,
            FuzzError::Db(e) => e.is_connection(),
            _ => false,
        }
    }

    /// Text benign-error classification looks at. Database errors yield the
    /// engine message only, so identifiers in the SQL cannot match a pattern.
    pub fn engine_message(&self) -> String {
        match self {
            FuzzError::Db(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FuzzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_error_message_carries_sql() {
        let err = DbError::Statement {
            sql: "SELECT * FROM nope".to_string(),
            message: "Catalog Error: Table with name nope does not exist!".to_string(),
        };
        let text = FuzzError::from(err).to_string();
        assert!(text.contains("does not exist"));
        assert!(text.contains("SELECT * FROM nope"));
    }

    #[test]
    fn engine_message_leaves_out_sql() {
        let err = FuzzError::from(DbError::Statement {
            sql: "SELECT id FROM invalid_orders".to_string(),
            message: "INTERNAL Error: Attempted to access index 3".to_string(),
        });
        assert_eq!(err.engine_message(), "INTERNAL Error: Attempted to access index 3");
        assert_eq!(
            FuzzError::Precondition("no tables".into()).engine_message(),
            "precondition failed: no tables"
        );
    }

    #[test]
    fn connectivity_classification() {
        assert!(FuzzError::Connectivity("gone".into()).is_connectivity());
        assert!(FuzzError::Db(DbError::Connection("closed".into())).is_connectivity());
        assert!(!FuzzError::Precondition("no tables".into()).is_connectivity());
        let stmt = DbError::Statement {
            sql: "x".into(),
            message: "y".into(),
        };
        assert!(!FuzzError::Db(stmt).is_connectivity());
    }
}
