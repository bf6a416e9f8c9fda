//! Schema-per-row datasets.
//!
//! An [`AnyDataset`] is an ordered list of [`Row`]s where every row carries
//! its own field set. Datasets load from and save to a small XML document
//! format, can be traversed through filters, and sort by any field.

pub mod array;
pub mod dataset;
pub mod filter;
pub mod iter;
pub mod path;
pub mod xml;

pub use anydata_error::{AnyDataError, ErrorCode, Result};
pub use anydata_types::{FieldMap, FieldNameCase, FieldValue, Row, compare_values};
pub use array::ArrayDataset;
pub use dataset::{AnyDataset, RowSelector};
pub use filter::{IteratorFilter, Relation};
pub use iter::{AnyIterator, RowFilter, RowIterator};
pub use path::DEFAULT_EXTENSION;
