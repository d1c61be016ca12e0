/// Connection wrapper: owns a single SQLite connection and exposes
/// synchronous execution, scalar and row queries, and explicit
/// transaction control.
///
/// All methods borrow the wrapper, so any number of statement builders
/// can be created from one connection over its lifetime. The handle
/// stays open until [`Db::close`] is called or the value is dropped.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, error};

use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::row::{FromRow, Row};
use crate::sql::Sql;
use crate::value::{FromValue, Value};

/// A single synchronous SQLite connection.
///
/// A `Db` belongs to one logical thread of use: it can move between
/// threads (`Send`) but cannot be shared between them (`!Sync`).
#[derive(Debug)]
pub struct Db {
    conn: Option<Connection>,
    verbose: bool,
}

impl Db {
    /// Opens (creating if necessary) a database file at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::connect(&DbConfig::file(path.as_ref()))
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::connect(&DbConfig::in_memory())
    }

    /// Opens a connection described by a [`DbConfig`], applying its
    /// pragmas before returning.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => {
                debug!("opening database at {:?}", path);
                Connection::open(path)?
            }
            None => {
                debug!("opening in-memory database");
                Connection::open_in_memory()?
            }
        };
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        if let Some(timeout) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        Ok(Db {
            conn: Some(conn),
            verbose: config.verbose,
        })
    }

    /// Starts a new statement builder bound to this connection.
    pub fn sql(&self) -> Sql<'_> {
        Sql::new(self)
    }

    /// Enables or disables statement logging. When enabled, every
    /// executed statement and its bound parameters are written to the
    /// diagnostic stream before execution.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether the connection is still open.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Whether an explicit or implicit transaction is currently active.
    /// A closed connection reports `false`.
    pub fn in_transaction(&self) -> bool {
        self.conn
            .as_ref()
            .map(|conn| !conn.is_autocommit())
            .unwrap_or(false)
    }

    /// Rowid generated by the most recent successful `INSERT` on this
    /// connection.
    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.handle()?.last_insert_rowid())
    }

    /// Executes a statement that is expected to produce no result set,
    /// such as DDL.
    ///
    /// # Errors
    /// Returns an error if the statement is malformed, violates a
    /// constraint, or produces rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<()> {
        let conn = self.handle()?;
        self.trace_sql(sql, params);
        conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(())
    }

    /// Executes several semicolon-separated statements in one call,
    /// with no parameters and no result sets. Intended for schema
    /// setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.handle()?;
        if self.verbose {
            debug!("executing batch: {}", sql);
        }
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Executes a data-modification statement and returns the number of
    /// rows affected.
    ///
    /// If no transaction is active, one is opened implicitly before the
    /// statement runs and stays open afterwards; call [`Db::commit`] or
    /// [`Db::rollback`] to end it. Should the statement itself fail,
    /// the implicitly opened transaction is rolled back before the
    /// error is returned, so a failed update never leaves partial
    /// changes behind. A transaction the caller opened explicitly is
    /// left untouched on failure.
    ///
    /// # Arguments
    /// * `sql` - The statement text, with `?` placeholders
    /// * `params` - Values bound to the placeholders, in order
    ///
    /// # Returns
    /// The number of rows inserted, updated, or deleted.
    pub fn execute_update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let conn = self.handle()?;
        self.trace_sql(sql, params);
        let implicit = conn.is_autocommit();
        if implicit {
            conn.execute_batch("BEGIN")?;
        }
        match conn.execute(sql, rusqlite::params_from_iter(params.iter())) {
            Ok(affected) => Ok(affected as u64),
            Err(err) => {
                if implicit {
                    // Surface the statement error, not the rollback error.
                    if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                        error!("rollback after failed update also failed: {}", rollback_err);
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Runs a query and returns every result row as a generic [`Row`].
    pub fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.handle()?;
        self.trace_sql(sql, params);
        let mut stmt = conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(&columns, row)?);
        }
        Ok(out)
    }

    /// Runs a query and returns its first row, or `None` when the
    /// result set is empty. Remaining rows are not fetched.
    pub fn query_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let conn = self.handle()?;
        self.trace_sql(sql, params);
        let mut stmt = conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row(&columns, row)?)),
            None => Ok(None),
        }
    }

    /// Runs a query and maps every result row onto `T` through its
    /// [`FromRow`] bindings.
    pub fn query_as<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        Ok(self
            .query_rows(sql, params)?
            .iter()
            .map(T::from_row)
            .collect())
    }

    /// Runs a query and decodes the first column of its first row.
    ///
    /// # Returns
    /// `Ok(None)` when the result set has no rows at all; `Ok(Some)`
    /// with the decoded value otherwise. Note that an aggregate such as
    /// `COUNT(*)` always produces a row, so it yields `Some(0)` on an
    /// empty table rather than `None`.
    ///
    /// # Errors
    /// Returns [`DbError::Decode`] when the cell cannot be coerced to
    /// `T`.
    pub fn query_scalar<T: FromValue>(&self, sql: &str, params: &[Value]) -> Result<Option<T>> {
        let conn = self.handle()?;
        self.trace_sql(sql, params);
        let mut stmt = conn.prepare(sql)?;
        let column = stmt
            .column_names()
            .first()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "0".to_string());
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        match rows.next()? {
            Some(row) => {
                let value = Value::from(row.get_ref(0)?);
                let scalar = T::from_value(&value)
                    .map_err(|mismatch| DbError::decode(column, mismatch.to_string()))?;
                Ok(Some(scalar))
            }
            None => Ok(None),
        }
    }

    /// Begins an explicit transaction. Idempotent: if a transaction is
    /// already active, this is a no-op.
    pub fn begin_transaction(&self) -> Result<()> {
        let conn = self.handle()?;
        if !conn.is_autocommit() {
            return Ok(());
        }
        debug!("beginning transaction");
        conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commits the active transaction. A no-op when no transaction is
    /// active.
    pub fn commit(&self) -> Result<()> {
        let conn = self.handle()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        debug!("committing transaction");
        conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Rolls back the active transaction. A no-op when no transaction
    /// is active, but an error when the connection has been closed.
    pub fn rollback(&self) -> Result<()> {
        let conn = self.handle()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        debug!("rolling back transaction");
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Closes the connection. Idempotent: closing an already-closed
    /// connection is a no-op. A transaction still open at close is
    /// rolled back by SQLite. Any further operation on this handle
    /// fails with [`DbError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                debug!("closing database connection");
                conn.close().map_err(|(_, err)| DbError::Database(err))
            }
            None => Ok(()),
        }
    }

    fn handle(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    fn trace_sql(&self, sql: &str, params: &[Value]) {
        if self.verbose {
            debug!("executing SQL: {} with params {:?}", sql, params);
        }
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Arc<[String]> {
    stmt.column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>()
        .into()
}

fn read_row(columns: &Arc<[String]>, row: &rusqlite::Row<'_>) -> Result<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for index in 0..columns.len() {
        values.push(Value::from(row.get_ref(index)?));
    }
    Ok(Row::new(Arc::clone(columns), values))
}
