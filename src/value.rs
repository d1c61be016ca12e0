/// Untyped database values and their conversions to and from Rust types.
///
/// [`Value`] mirrors the five SQLite storage classes. Parameters are
/// converted *into* values through `From` impls (and the [`params!`]
/// macro), result cells are converted *out* through [`FromValue`].
use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use thiserror::Error;

/// Timestamps are stored as TEXT in this format; fractional seconds are
/// kept only when non-zero.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Accepted on the way out: the stored format plus the ISO 8601 `T`
/// separator other writers commonly use.
const DATETIME_PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single untyped database cell, one variant per SQLite storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Storage class name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON view of this value, for diagnostics and export. Blobs are
    /// summarized rather than encoded.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Number::from_f64(*r)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(t) => serde_json::Value::String(t.clone()),
            Value::Blob(b) => serde_json::Value::String(format!("<BLOB: {} bytes>", b.len())),
        }
    }
}

/// Formats a value for display, handling NULL values and binary
/// data appropriately.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(t) => write!(f, "{}", t),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

/// Booleans are stored as `INTEGER` 0 or 1, matching SQLite's own
/// convention.
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

/// Timestamps are stored as `TEXT`; see [`DATETIME_FORMAT`].
impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Text(format_datetime(&value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(t) => ToSqlOutput::Borrowed(ValueRef::Text(t.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

pub(crate) fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_PARSE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Failure to coerce a [`Value`] into a concrete Rust type.
///
/// Carries the storage class that was found and the type that was
/// requested, so callers (and the row mapper's diagnostics) can report
/// exactly what went wrong.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read {found} value as {requested}")]
pub struct TypeMismatch {
    pub found: &'static str,
    pub requested: &'static str,
}

impl TypeMismatch {
    fn new(found: &Value, requested: &'static str) -> Self {
        TypeMismatch {
            found: found.type_name(),
            requested,
        }
    }
}

/// Conversion from an untyped [`Value`] into a concrete Rust type.
///
/// Implementations are deliberately strict: no lossy coercions beyond
/// the widenings SQLite itself performs (`INTEGER` reads as `REAL`,
/// timestamps read from either `TEXT` or Unix-epoch `INTEGER`).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(TypeMismatch::new(other, "integer")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Real(r) => Ok(*r),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(TypeMismatch::new(other, "real")),
        }
    }
}

/// Any non-zero `INTEGER` is truthy, matching SQLite's boolean
/// semantics.
impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Integer(i) => Ok(*i != 0),
            other => Err(TypeMismatch::new(other, "boolean")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Text(t) => Ok(t.clone()),
            other => Err(TypeMismatch::new(other, "text")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(TypeMismatch::new(other, "blob")),
        }
    }
}

/// Reads `TEXT` in either supported timestamp format, or `INTEGER` as
/// Unix-epoch seconds.
impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Text(t) => {
                parse_datetime(t).ok_or_else(|| TypeMismatch::new(value, "datetime"))
            }
            Value::Integer(i) => chrono::DateTime::from_timestamp(*i, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| TypeMismatch::new(value, "datetime")),
            other => Err(TypeMismatch::new(other, "datetime")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, TypeMismatch> {
        Ok(value.clone())
    }
}

/// Builds a `Vec<`[`Value`]`>` from a comma-separated list of
/// expressions, converting each through `Value::from`.
///
/// ```
/// use litequery::{params, Value};
///
/// let params = params!["title", 42, true, None::<String>];
/// assert_eq!(params.len(), 4);
/// assert_eq!(params[3], Value::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Value::from($value)),+]
    };
}
