//! Database execution abstraction over `may_postgres`.
//!
//! The [`DbExecutor`] trait is the seam between the resource controllers and
//! the driver: everything above it works with SQL strings and `&[&dyn ToSql]`
//! parameter slices, so unit tests can substitute a capturing mock.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;

/// Database-level error.
#[derive(Debug)]
pub enum DbError {
    /// Error surfaced by `may_postgres`.
    Postgres(PostgresError),
    /// Query execution error raised above the driver.
    Query(String),
    /// Row decoding/conversion error.
    Decode(String),
    /// Other execution errors.
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            DbError::Query(s) => write!(f, "Query error: {s}"),
            DbError::Decode(s) => write!(f, "Decode error: {s}"),
            DbError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<PostgresError> for DbError {
    fn from(err: PostgresError) -> Self {
        DbError::Postgres(err)
    }
}

/// Trait for executing database operations.
///
/// Abstracts execution so pooled clients and test mocks are interchangeable.
pub trait DbExecutor {
    /// Execute a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the execution fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError>;

    /// Execute a query expected to return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the execution fails or the query does not return
    /// exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError>;

    /// Execute a query and return all rows.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the execution fails.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError>;
}

/// [`DbExecutor`] backed by a `may_postgres::Client`.
///
/// Clients are multiplexed and cheap to clone, so each request can carry its
/// own executor taken from the pool.
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DbExecutor for PgExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        tracing::trace!(sql = query, "execute");
        self.client.execute(query, params).map_err(DbError::Postgres)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        tracing::trace!(sql = query, "query_one");
        self.client.query_one(query, params).map_err(DbError::Postgres)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        tracing::trace!(sql = query, "query_all");
        self.client.query(query, params).map_err(DbError::Postgres)
    }
}

/// Capturing mock for unit tests: records every SQL string and parameter
/// count, and returns canned responses.
#[cfg(test)]
pub struct MockExecutor {
    pub captured_sql: std::sync::Mutex<Vec<String>>,
    pub captured_param_counts: std::sync::Mutex<Vec<usize>>,
    /// Rows-affected values returned by successive `execute` calls.
    pub execute_results: std::sync::Mutex<Vec<u64>>,
    /// When set, `query_one`/`query_all` fail with this message.
    pub fail_queries_with: Option<String>,
}

#[cfg(test)]
impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor {
            captured_sql: std::sync::Mutex::new(Vec::new()),
            captured_param_counts: std::sync::Mutex::new(Vec::new()),
            execute_results: std::sync::Mutex::new(Vec::new()),
            fail_queries_with: None,
        }
    }

    pub fn sql(&self) -> Vec<String> {
        self.captured_sql.lock().unwrap().clone()
    }

    pub fn param_counts(&self) -> Vec<usize> {
        self.captured_param_counts.lock().unwrap().clone()
    }

    fn capture(&self, query: &str, params: &[&dyn ToSql]) {
        self.captured_sql.lock().unwrap().push(query.to_string());
        self.captured_param_counts.lock().unwrap().push(params.len());
    }
}

#[cfg(test)]
impl DbExecutor for MockExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.capture(query, params);
        Ok(self.execute_results.lock().unwrap().pop().unwrap_or(1))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.capture(query, params);
        Err(DbError::Query(
            self.fail_queries_with
                .clone()
                .unwrap_or_else(|| "query returned no rows".to_string()),
        ))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.capture(query, params);
        match &self.fail_queries_with {
            Some(msg) => Err(DbError::Query(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_error_display() {
        assert!(DbError::Query("boom".into()).to_string().contains("Query error"));
        assert!(DbError::Decode("bad".into()).to_string().contains("Decode error"));
        assert!(DbError::Other("x".into()).to_string().contains("Execution error"));
    }

    #[test]
    fn mock_captures_sql_and_params() {
        let mock = MockExecutor::new();
        let id = 42i64;
        let _ = mock.execute("DELETE FROM employees WHERE id = $1", &[&id]);
        assert_eq!(mock.sql(), vec!["DELETE FROM employees WHERE id = $1"]);
        assert_eq!(mock.param_counts(), vec![1]);
    }
}
