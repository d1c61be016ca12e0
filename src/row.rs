/// Result rows and the mapping of rows onto plain Rust structs.
///
/// A [`Row`] keeps column names in the order the driver reported them,
/// alongside one [`Value`] per column. Typed mapping goes through
/// [`FromRow`], driven by an explicit table of [`FieldBinding`]s:
/// every mapped column and the setter it drives are spelled out in
/// code, with no derive machinery in between.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::value::{TypeMismatch, Value};

/// One row of a result set: ordered column names plus one value per
/// column.
///
/// Column names are shared across all rows of a result set, so cloning
/// a row does not duplicate them.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    /// Column names in driver-reported order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a value by column name. When the statement produced
    /// duplicate column names, the first occurrence wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|index| &self.values[index])
    }

    /// Looks up a value by positional index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The first column's value, if the row has any columns.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Iterates over `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consumes the row into a name-to-value map. Duplicate column
    /// names collapse to the last occurrence.
    pub fn into_map(self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values)
            .collect()
    }

    /// JSON object view of this row, for diagnostics and export.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (column, value) in self.iter() {
            object.insert(column.to_string(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

/// Maps one result column onto a field of `T`.
///
/// The setter is a plain function pointer, so binding tables are
/// assembled entirely at compile time.
pub struct FieldBinding<T> {
    column: &'static str,
    apply: fn(&mut T, &Value) -> Result<(), TypeMismatch>,
}

impl<T> FieldBinding<T> {
    pub fn new(
        column: &'static str,
        apply: fn(&mut T, &Value) -> Result<(), TypeMismatch>,
    ) -> Self {
        FieldBinding { column, apply }
    }

    /// Column name this binding listens for.
    pub fn column(&self) -> &'static str {
        self.column
    }
}

/// Builds `Self` from a result row by walking the row's columns and
/// applying the matching [`FieldBinding`] for each.
///
/// Mapping is deliberately forgiving about shape differences:
///
/// * A result column with no binding is skipped silently.
/// * A binding whose column is absent from the row leaves the field at
///   its [`Default`] value.
/// * A value that fails to coerce leaves the field at its default and
///   emits a warning; it never fails the whole row.
///
/// When the statement produced duplicate column names, the mapper
/// visits them in column order, so the last occurrence ends up in the
/// field.
///
/// # Example
///
/// ```
/// use litequery::{FieldBinding, FromRow, FromValue};
///
/// #[derive(Default)]
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl FromRow for Tag {
///     fn bindings() -> Vec<FieldBinding<Self>> {
///         vec![
///             FieldBinding::new("id", |tag, value| {
///                 tag.id = FromValue::from_value(value)?;
///                 Ok(())
///             }),
///             FieldBinding::new("label", |tag, value| {
///                 tag.label = FromValue::from_value(value)?;
///                 Ok(())
///             }),
///         ]
///     }
/// }
/// ```
pub trait FromRow: Default {
    /// The column-to-setter table for this type.
    fn bindings() -> Vec<FieldBinding<Self>>;

    /// Maps a row onto a freshly constructed `Self`.
    fn from_row(row: &Row) -> Self {
        let bindings = Self::bindings();
        let mut target = Self::default();
        for (column, value) in row.iter() {
            let Some(binding) = bindings.iter().find(|b| b.column == column) else {
                continue;
            };
            if let Err(mismatch) = (binding.apply)(&mut target, value) {
                warn!("skipping column '{}' during row mapping: {}", column, mismatch);
            }
        }
        target
    }
}
