//! Core value model for anydata: field values and change-tracked rows.

pub mod row;
pub mod value;

pub use row::{FieldMap, FieldNameCase, Row};
pub use value::{FieldValue, compare_values};
