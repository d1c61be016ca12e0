/// Error types for litequery.
///
/// Every fallible operation in the crate returns [`Result`]. Failures
/// surfaced by the driver are carried as error values the caller can
/// inspect and react to; nothing is logged-and-swallowed.
use thiserror::Error;

/// Error type covering connection, statement, decoding, and misuse
/// failures.
#[derive(Error, Debug)]
pub enum DbError {
    /// Driver-level errors from SQLite: malformed SQL, constraint
    /// violations, bind-time parameter count or type mismatches, and
    /// lost connections.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection has been closed; no further operations are
    /// permitted on this handle.
    #[error("connection is closed")]
    Closed,

    /// A result column could not be coerced to the requested Rust type.
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Caller misuse of the statement builder, such as an `IN`-list
    /// expansion with no values.
    #[error("builder misuse: {0}")]
    Misuse(String),

    /// Configuration parsing or validation errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// File system errors while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a decode error for a specific column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a builder misuse error.
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }

    /// Check if this error came from the connection being closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Type alias for Result to use [`DbError`] as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
