//! The row collection: an ordered, cursor-tracked list of rows.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use anydata_error::{AnyDataError, Result};
use anydata_types::{Row, compare_values};
use serde_json::Value;
use tracing::debug;

use crate::array::object_to_row;
use crate::iter::{AnyIterator, RowFilter};
use crate::path::{resolve_save_path, with_default_extension};
use crate::xml;

/// Which row [`AnyDataset::remove_row`] removes.
#[derive(Debug, Clone, Copy)]
pub enum RowSelector<'a> {
    /// The row under the cursor.
    Current,
    /// The row at an index.
    Index(usize),
    /// The first row whose fields equal this row's fields.
    Matching(&'a Row),
}

/// An ordered collection of rows whose field sets may differ row to row.
///
/// The cursor follows the most recently appended or inserted row and is the
/// default target of [`add_field`](Self::add_field) and
/// [`remove_row`](Self::remove_row). A dataset opened from a file remembers
/// that file as its default save destination.
#[derive(Debug, Clone, Default)]
pub struct AnyDataset {
    rows: Vec<Row>,
    cursor: Option<usize>,
    path: Option<PathBuf>,
}

impl AnyDataset {
    /// Create an empty in-memory dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a dataset file.
    ///
    /// A name without an extension gets `.anydata.xml` appended. A file that
    /// does not exist yields an empty dataset bound to that path, so a later
    /// [`save`](Self::save) creates it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = with_default_extension(path.as_ref());
        let mut dataset = Self {
            path: Some(path.clone()),
            ..Self::default()
        };
        if path.is_file() {
            let text = fs::read_to_string(&path)?;
            dataset.load_rows(xml::parse_rows(&text, &path)?);
            debug!(path = %path.display(), rows = dataset.len(), "loaded anydataset");
        } else {
            debug!(path = %path.display(), "anydataset file not found, starting empty");
        }
        Ok(dataset)
    }

    /// Parse a dataset from document text without binding a file.
    pub fn from_xml(text: &str) -> Result<Self> {
        let mut dataset = Self::new();
        dataset.load_rows(xml::parse_rows(text, Path::new("<memory>"))?);
        Ok(dataset)
    }

    fn load_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.cursor = self.rows.len().checked_sub(1);
    }

    /// The file this dataset reads from and saves to by default.
    pub fn filename(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Render the dataset as an XML document.
    pub fn xml(&self) -> Result<String> {
        xml::render_rows(&self.rows)
    }

    /// Render the dataset as a JSON array of objects.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.rows)
            .map_err(|err| AnyDataError::internal(format!("JSON rendering failed: {err}")))
    }

    /// Overwrite the target file with the whole dataset.
    ///
    /// `path` overrides (and replaces) the bound file; without either the
    /// save fails before anything is written.
    pub fn save(&mut self, path: Option<&Path>) -> Result<()> {
        let target = resolve_save_path(path, self.path.as_deref())?;
        let text = self.xml()?;
        fs::write(&target, text)?;
        debug!(path = %target.display(), rows = self.len(), "saved anydataset");
        self.path = Some(target);
        Ok(())
    }

    /// Append a row and move the cursor to it.
    ///
    /// The row's current state becomes its accepted snapshot.
    pub fn append_row(&mut self, row: impl Into<Row>) {
        let mut row = row.into();
        row.accept_changes();
        self.rows.push(row);
        self.cursor = Some(self.rows.len() - 1);
    }

    pub fn append_empty_row(&mut self) {
        self.append_row(Row::new());
    }

    /// Append a row described by a JSON value.
    ///
    /// `null` appends an empty row and an object appends its members; any
    /// other value is rejected without touching the dataset.
    pub fn append_value(&mut self, value: Value) -> Result<()> {
        let row = match value {
            Value::Null => Row::new(),
            Value::Object(map) => object_to_row(map)?,
            _ => {
                return Err(AnyDataError::invalid_input(
                    "a row must be built from an object or null",
                ));
            }
        };
        self.append_row(row);
        Ok(())
    }

    /// Append every row of `source`, in order.
    pub fn import<I, R>(&mut self, source: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Row>,
    {
        let before = self.len();
        for row in source {
            self.append_row(row);
        }
        debug!(rows = self.len() - before, "imported rows");
    }

    /// Insert a row before `index`, shifting later rows down.
    ///
    /// An index past the end appends instead. The cursor moves to the
    /// inserted row.
    pub fn insert_row_before(&mut self, index: usize, row: impl Into<Row>) {
        if index > self.rows.len() {
            self.append_row(row);
            return;
        }
        self.rows.insert(index, row.into());
        self.cursor = Some(index);
    }

    /// Remove a row, returning it.
    ///
    /// Returns `None` when the selector names no row. Afterwards the cursor
    /// is clamped to the last row.
    pub fn remove_row(&mut self, selector: RowSelector<'_>) -> Option<Row> {
        let index = match selector {
            RowSelector::Current => self.cursor?,
            RowSelector::Index(index) => index,
            RowSelector::Matching(target) => self.rows.iter().position(|row| row == target)?,
        };
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        self.cursor = match self.cursor {
            Some(cursor) if cursor < self.rows.len() => Some(cursor),
            _ => self.rows.len().checked_sub(1),
        };
        Some(removed)
    }

    /// Add a field value to the cursor row, creating a row if the dataset
    /// is empty.
    pub fn add_field(&mut self, name: &str, value: impl Into<String>) {
        if self.cursor.is_none() {
            self.append_empty_row();
        }
        if let Some(row) = self.current_row_mut() {
            row.add_field(name, value);
        }
    }

    /// Traverse the rows, optionally restricted by a filter.
    pub fn get_iterator(&self, filter: Option<&dyn RowFilter>) -> AnyIterator<'_> {
        AnyIterator::over(&self.rows, filter)
    }

    /// The first value of `field` for every traversed row.
    pub fn get_array(&self, field: &str, filter: Option<&dyn RowFilter>) -> Vec<Option<&str>> {
        self.get_iterator(filter).map(|row| row.get(field)).collect()
    }

    /// Sort rows by the first value of `field`.
    ///
    /// Quicksort with the first row as pivot. Rows comparing less than the
    /// pivot go before it and the rest after it, both in their original
    /// order, so rows with equal keys keep their relative order. A row whose
    /// key equals the pivot's is placed after the pivot. Already sorted
    /// input is the quadratic worst case.
    pub fn sort(&mut self, field: &str) {
        if self.rows.is_empty() {
            return;
        }
        let order = {
            let keys: Vec<Option<&str>> = self.rows.iter().map(|row| row.get(field)).collect();
            partition_order(&keys)
        };
        let mut rank = vec![0; order.len()];
        for (position, &index) in order.iter().enumerate() {
            rank[index] = position;
        }
        let mut ranked: Vec<(usize, Row)> = std::mem::take(&mut self.rows)
            .into_iter()
            .enumerate()
            .map(|(index, row)| (rank[index], row))
            .collect();
        ranked.sort_unstable_by_key(|(position, _)| *position);
        self.rows = ranked.into_iter().map(|(_, row)| row).collect();
        debug!(field, rows = self.rows.len(), "sorted dataset");
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the cursor row.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.cursor?)
    }

    pub fn current_row_mut(&mut self) -> Option<&mut Row> {
        self.rows.get_mut(self.cursor?)
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl<'a> IntoIterator for &'a AnyDataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Sorted order of `keys` as a list of indices.
///
/// Recursive partitioning (pivot = first element, ties after it) unrolled
/// onto an explicit stack so sorted input cannot exhaust the call stack.
fn partition_order(keys: &[Option<&str>]) -> Vec<usize> {
    enum Task {
        Sort(Vec<usize>),
        Emit(usize),
    }

    let mut order = Vec::with_capacity(keys.len());
    let mut stack = vec![Task::Sort((0..keys.len()).collect())];
    while let Some(task) = stack.pop() {
        match task {
            Task::Emit(index) => order.push(index),
            Task::Sort(seq) => {
                let Some((&pivot, rest)) = seq.split_first() else {
                    continue;
                };
                let (left, right): (Vec<usize>, Vec<usize>) = rest
                    .iter()
                    .copied()
                    .partition(|&index| compare_values(keys[index], keys[pivot]) == Ordering::Less);
                stack.push(Task::Sort(right));
                stack.push(Task::Emit(pivot));
                stack.push(Task::Sort(left));
            }
        }
    }
    order
}


#[cfg(test)]
mod prop {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sort_orders_keys_and_keeps_ties_in_place(keys in proptest::collection::vec(0_u8..5, 0..40)) {
            let mut ds = AnyDataset::new();
            for (i, k) in keys.iter().enumerate() {
                let (k, i) = (k.to_string(), i.to_string());
                ds.append_row([("k", k.as_str()), ("i", i.as_str())].into_iter().collect::<Row>());
            }
            ds.sort("k");

            let mut expected: Vec<(u8, usize)> =
                keys.iter().copied().enumerate().map(|(i, k)| (k, i)).collect();
            expected.sort_by_key(|&(k, _)| k);
            let got: Vec<(u8, usize)> = ds
                .rows()
                .iter()
                .map(|row| {
                    let k = row.get("k").and_then(|v| v.parse().ok()).unwrap_or(u8::MAX);
                    let i = row.get("i").and_then(|v| v.parse().ok()).unwrap_or(usize::MAX);
                    (k, i)
                })
                .collect();
            prop_assert_eq!(got, expected);
        }
    }
}
