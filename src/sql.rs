/// Fluent statement builder.
///
/// A [`Sql`] accumulates SQL text fragments and positional parameters,
/// then hands the assembled statement to the connection it was built
/// from. Fragments are joined with single spaces and passed to the
/// driver verbatim; the builder never parses, validates, or rewrites
/// SQL beyond the one documented `IN`-list expansion.
///
/// Builders are one-shot: every terminal operation takes the builder by
/// value, so a consumed builder cannot be executed twice. The
/// underlying connection is left open and can hand out further
/// builders.
use chrono::NaiveDateTime;

use crate::db::Db;
use crate::error::{DbError, Result};
use crate::row::{FromRow, Row};
use crate::value::{FromValue, Value};

/// An in-progress SQL statement bound to a [`Db`].
///
/// # Example
///
/// ```
/// use litequery::{params, Db};
///
/// # fn main() -> litequery::Result<()> {
/// let db = Db::open_in_memory()?;
/// db.execute_batch("CREATE TABLE article (id INTEGER PRIMARY KEY, title TEXT);")?;
///
/// db.sql()
///     .append("INSERT INTO article")
///     .append_with("(title) VALUES (?)", params!["first post"])
///     .insert()?;
/// db.commit()?;
///
/// let title = db
///     .sql()
///     .append("SELECT title FROM article")
///     .append_in("WHERE id IN (?)", params![1])?
///     .select_string()?;
/// assert_eq!(title.as_deref(), Some("first post"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Sql<'db> {
    db: &'db Db,
    fragments: Vec<String>,
    params: Vec<Value>,
}

impl<'db> Sql<'db> {
    /// Creates an empty builder bound to the given connection.
    /// Equivalent to [`Db::sql`].
    pub fn new(db: &'db Db) -> Self {
        Sql {
            db,
            fragments: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Appends a SQL fragment with no parameters.
    pub fn append(mut self, fragment: &str) -> Self {
        self.fragments.push(fragment.to_string());
        self
    }

    /// Appends a SQL fragment together with the values bound to its
    /// `?` placeholders, in order.
    pub fn append_with<I>(mut self, fragment: &str, params: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.fragments.push(fragment.to_string());
        self.params.extend(params);
        self
    }

    /// Appends a fragment containing exactly one `?`, expanding it to
    /// one placeholder per value: `"id IN (?)"` with three values
    /// becomes `"id IN (?, ?, ?)"`.
    ///
    /// # Errors
    /// Returns [`DbError::Misuse`] when `values` is empty (the
    /// expansion would produce invalid SQL) or when the fragment does
    /// not contain exactly one `?`.
    pub fn append_in<I>(mut self, fragment: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        if values.is_empty() {
            return Err(DbError::misuse(
                "append_in requires at least one value; an empty IN list is not valid SQL",
            ));
        }
        let placeholders = fragment.matches('?').count();
        if placeholders != 1 {
            return Err(DbError::misuse(format!(
                "append_in fragment must contain exactly one '?', found {}",
                placeholders
            )));
        }
        let expanded = vec!["?"; values.len()].join(", ");
        self.fragments.push(fragment.replacen('?', &expanded, 1));
        self.params.extend(values);
        Ok(self)
    }

    /// The assembled statement text: fragments joined by single spaces,
    /// with no leading or trailing whitespace added.
    pub fn sql(&self) -> String {
        self.fragments.join(" ")
    }

    /// Parameters bound so far, in binding order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Executes as an `INSERT`, returning the number of rows inserted.
    pub fn insert(self) -> Result<u64> {
        self.db.execute_update(&self.sql(), &self.params)
    }

    /// Executes as an `UPDATE`, returning the number of rows updated.
    pub fn update(self) -> Result<u64> {
        self.db.execute_update(&self.sql(), &self.params)
    }

    /// Executes as a `DELETE`, returning the number of rows deleted.
    pub fn delete(self) -> Result<u64> {
        self.db.execute_update(&self.sql(), &self.params)
    }

    /// Executes a statement that produces no result set.
    pub fn run(self) -> Result<()> {
        self.db.execute(&self.sql(), &self.params)
    }

    /// Runs the query and returns all result rows.
    pub fn select_rows(self) -> Result<Vec<Row>> {
        self.db.query_rows(&self.sql(), &self.params)
    }

    /// Runs the query and maps every row onto `T`.
    pub fn select_rows_as<T: FromRow>(self) -> Result<Vec<T>> {
        self.db.query_as(&self.sql(), &self.params)
    }

    /// Runs the query and returns the first row, if any.
    pub fn select_row(self) -> Result<Option<Row>> {
        self.db.query_row(&self.sql(), &self.params)
    }

    /// Runs the query and maps the first row onto `T`, if any.
    pub fn select_row_as<T: FromRow>(self) -> Result<Option<T>> {
        Ok(self
            .db
            .query_row(&self.sql(), &self.params)?
            .map(|row| T::from_row(&row)))
    }

    /// Runs the query and decodes the first column of the first row as
    /// a 64-bit integer. `None` when the result set is empty.
    pub fn select_long(self) -> Result<Option<i64>> {
        self.db.query_scalar(&self.sql(), &self.params)
    }

    /// Runs the query and decodes the first column of the first row as
    /// text.
    pub fn select_string(self) -> Result<Option<String>> {
        self.db.query_scalar(&self.sql(), &self.params)
    }

    /// Runs the query and decodes the first column of the first row as
    /// a boolean. Any non-zero integer is `true`.
    pub fn select_bool(self) -> Result<Option<bool>> {
        self.db.query_scalar(&self.sql(), &self.params)
    }

    /// Runs the query and decodes the first column of the first row as
    /// a timestamp.
    pub fn select_datetime(self) -> Result<Option<NaiveDateTime>> {
        self.db.query_scalar(&self.sql(), &self.params)
    }

    /// Runs the query and decodes the first column of every row as a
    /// 64-bit integer.
    ///
    /// # Errors
    /// Returns [`DbError::Decode`] as soon as any row's first column
    /// fails to decode.
    pub fn select_longs(self) -> Result<Vec<i64>> {
        let rows = self.db.query_rows(&self.sql(), &self.params)?;
        let mut longs = Vec::with_capacity(rows.len());
        for row in &rows {
            let value = row
                .first()
                .ok_or_else(|| DbError::decode("0", "row has no columns"))?;
            let long = i64::from_value(value)
                .map_err(|mismatch| DbError::decode(row.columns()[0].clone(), mismatch.to_string()))?;
            longs.push(long);
        }
        Ok(longs)
    }
}
