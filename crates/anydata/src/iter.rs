//! Row traversal and filtering contracts.

use anydata_types::{FieldMap, Row};

/// A forward-only traversal over rows.
///
/// `move_next` both advances and yields, so callers loop with
/// `while it.has_next() { let row = it.move_next(); ... }` or simply use the
/// [`Iterator`] impl of the concrete traversal.
pub trait RowIterator<'a> {
    /// Whether another row is waiting.
    fn has_next(&self) -> bool;

    /// Advance and return the next row.
    fn move_next(&mut self) -> Option<&'a Row>;

    /// Total number of rows in the traversal, consumed or not.
    fn row_count(&self) -> usize;

    /// Collect the field mappings of every remaining row.
    fn to_array(&mut self) -> Vec<FieldMap> {
        let mut collected = Vec::new();
        while self.has_next() {
            if let Some(row) = self.move_next() {
                collected.push(row.fields().clone());
            }
        }
        collected
    }
}

/// Selects an ordered subsequence of rows.
///
/// Implementations must keep input order and must not yield a row twice.
pub trait RowFilter {
    fn matches<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row>;
}

impl<F> RowFilter for F
where
    F: Fn(&Row) -> bool,
{
    fn matches<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|row| self(row)).collect()
    }
}

/// Read-only traversal over a dataset's rows.
#[derive(Debug, Clone)]
pub struct AnyIterator<'a> {
    rows: Vec<&'a Row>,
    pos: usize,
}

impl<'a> AnyIterator<'a> {
    pub fn new(rows: Vec<&'a Row>) -> Self {
        Self { rows, pos: 0 }
    }

    pub(crate) fn over(rows: &'a [Row], filter: Option<&dyn RowFilter>) -> Self {
        match filter {
            Some(filter) => Self::new(filter.matches(rows)),
            None => Self::new(rows.iter().collect()),
        }
    }
}

impl<'a> RowIterator<'a> for AnyIterator<'a> {
    fn has_next(&self) -> bool {
        self.pos < self.rows.len()
    }

    fn move_next(&mut self) -> Option<&'a Row> {
        let row = self.rows.get(self.pos).copied()?;
        self.pos += 1;
        Some(row)
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl<'a> Iterator for AnyIterator<'a> {
    type Item = &'a Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.move_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AnyIterator<'_> {}
