//! A minimal fluent SQL layer over a single SQLite connection.
//!
//! `litequery` stays deliberately small: it concatenates SQL fragments,
//! binds positional `?` parameters, executes synchronously, and shapes
//! results as generic [`Row`]s or caller-defined types implementing
//! [`FromRow`]. It is not an ORM: it never parses, rewrites, or
//! generates SQL beyond the documented `IN`-list expansion, and it
//! manages exactly one connection.
//!
//! ```
//! use litequery::{params, Db};
//!
//! # fn main() -> litequery::Result<()> {
//! let db = Db::open_in_memory()?;
//! db.execute_batch("CREATE TABLE article (id INTEGER PRIMARY KEY, title TEXT NOT NULL);")?;
//!
//! db.sql()
//!     .append("INSERT INTO article")
//!     .append_with("(title) VALUES (?)", params!["hello"])
//!     .insert()?;
//! db.commit()?;
//!
//! let titles = db
//!     .sql()
//!     .append("SELECT title FROM article")
//!     .append_in("WHERE id IN (?)", params![1])?
//!     .select_rows()?;
//! assert_eq!(titles.len(), 1);
//! # Ok(())
//! # }
//! ```

// Core infrastructure modules
pub mod config;
pub mod db;
pub mod error;
pub mod row;
pub mod sql;
pub mod value;

// Re-export commonly used types for convenience
pub use config::DbConfig;
pub use db::Db;
pub use error::{DbError, Result};
pub use row::{FieldBinding, FromRow, Row};
pub use sql::Sql;
pub use value::{FromValue, TypeMismatch, Value};
