//! Adapter that turns JSON values into rows.

use anydata_error::{AnyDataError, Result};
use anydata_types::Row;
use serde_json::{Map, Value};

use crate::iter::AnyIterator;

/// Field name used for bare scalar items.
pub const DEFAULT_FIELD_NAME: &str = "value";

/// Rows built from a JSON array.
///
/// Objects become rows; scalar items become single-field rows under the
/// configured field name.
#[derive(Debug, Clone, Default)]
pub struct ArrayDataset {
    rows: Vec<Row>,
}

impl ArrayDataset {
    pub fn new(source: Value) -> Result<Self> {
        Self::with_field_name(source, DEFAULT_FIELD_NAME)
    }

    /// Build rows from `source`, storing scalar items under `field_name`.
    ///
    /// `null` yields an empty set; anything else that is not an array is
    /// rejected.
    pub fn with_field_name(source: Value, field_name: &str) -> Result<Self> {
        let items = match source {
            Value::Null => return Ok(Self::default()),
            Value::Array(items) => items,
            other => {
                return Err(AnyDataError::invalid_input(format!(
                    "expected an array, got {}",
                    kind(&other)
                )));
            }
        };
        let rows = items
            .into_iter()
            .map(|item| item_to_row(item, field_name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn get_iterator(&self) -> AnyIterator<'_> {
        AnyIterator::over(&self.rows, None)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

fn item_to_row(item: Value, field_name: &str) -> Result<Row> {
    match item {
        Value::Object(map) => object_to_row(map),
        Value::Array(_) => Err(AnyDataError::invalid_input(
            "nested arrays cannot be flattened into a row",
        )),
        Value::Null => Ok(Row::new()),
        scalar => {
            let mut row = Row::new();
            row.add_field(field_name, scalar_text(scalar)?);
            row.accept_changes();
            Ok(row)
        }
    }
}

/// Flatten a JSON object into an accepted row.
///
/// Scalar members become fields, arrays of scalars become multi-valued
/// fields and `null` members are skipped. Nested objects are rejected.
pub fn object_to_row(map: Map<String, Value>) -> Result<Row> {
    let mut row = Row::new();
    for (name, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if !item.is_null() {
                        row.add_field(&name, scalar_text(item)?);
                    }
                }
            }
            other => row.add_field(&name, scalar_text(other)?),
        }
    }
    row.accept_changes();
    Ok(row)
}

fn scalar_text(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(AnyDataError::invalid_input(format!(
            "cannot store {} as a field value",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
