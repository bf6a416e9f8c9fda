//! A field/relation/value filter for datasets.

use std::cmp::Ordering;

use anydata_types::{Row, compare_values};

use crate::iter::RowFilter;

/// How a row's field value is compared with a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    /// Field text contains the value.
    Contains,
    /// Field text starts with the value.
    StartsWith,
}

#[derive(Debug, Clone)]
struct Condition {
    field: String,
    relation: Relation,
    value: String,
}

impl Condition {
    fn holds(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.field) else {
            return self.relation == Relation::NotEqual;
        };
        let ord = || compare_values(Some(actual), Some(&self.value));
        match self.relation {
            Relation::Equal => ord() == Ordering::Equal,
            Relation::NotEqual => ord() != Ordering::Equal,
            Relation::LessThan => ord() == Ordering::Less,
            Relation::GreaterThan => ord() == Ordering::Greater,
            Relation::LessOrEqual => ord() != Ordering::Greater,
            Relation::GreaterOrEqual => ord() != Ordering::Less,
            Relation::Contains => actual.contains(self.value.as_str()),
            Relation::StartsWith => actual.starts_with(self.value.as_str()),
        }
    }
}

/// Conditions combined as a disjunction of conjunctions.
///
/// `and_where` adds to the current group; `or_where` opens a new group. A
/// row matches when every condition of at least one group holds. A filter
/// without conditions matches every row.
///
/// ```
/// use anydata::{IteratorFilter, Relation};
///
/// let filter = IteratorFilter::new()
///     .and_where("city", Relation::Equal, "Rio")
///     .and_where("age", Relation::GreaterOrEqual, "18")
///     .or_where("vip", Relation::Equal, "yes");
/// # let _ = filter;
/// ```
#[derive(Debug, Clone, Default)]
pub struct IteratorFilter {
    groups: Vec<Vec<Condition>>,
}

impl IteratorFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and_where(
        mut self,
        field: impl Into<String>,
        relation: Relation,
        value: impl Into<String>,
    ) -> Self {
        let condition = Condition {
            field: field.into(),
            relation,
            value: value.into(),
        };
        match self.groups.last_mut() {
            Some(group) => group.push(condition),
            None => self.groups.push(vec![condition]),
        }
        self
    }

    #[must_use]
    pub fn or_where(
        mut self,
        field: impl Into<String>,
        relation: Relation,
        value: impl Into<String>,
    ) -> Self {
        self.groups.push(Vec::new());
        self.and_where(field, relation, value)
    }

    /// Whether a single row passes the filter.
    pub fn is_match(&self, row: &Row) -> bool {
        self.groups.is_empty()
            || self
                .groups
                .iter()
                .any(|group| group.iter().all(|condition| condition.holds(row)))
    }
}

impl RowFilter for IteratorFilter {
    fn matches<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|row| self.is_match(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, age: &str, city: &str) -> Row {
        [("name", name), ("age", age), ("city", city)]
            .into_iter()
            .collect()
    }

    fn people() -> Vec<Row> {
        vec![
            person("Ana", "34", "Rio"),
            person("Bruno", "9", "Lisbon"),
            person("Carla", "17", "Rio"),
            person("Davi", "52", "Porto"),
        ]
    }

    fn names(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.get("name").map(str::to_owned))
            .collect()
    }

    #[test]
    fn empty_filter_matches_all() {
        let rows = people();
        assert_eq!(IteratorFilter::new().matches(&rows).len(), 4);
    }

    #[test]
    fn and_conditions() {
        let rows = people();
        let filter = IteratorFilter::new()
            .and_where("city", Relation::Equal, "Rio")
            .and_where("age", Relation::GreaterOrEqual, "18");
        assert_eq!(names(&filter.matches(&rows)), ["Ana"]);
    }

    #[test]
    fn or_groups_keep_input_order() {
        let rows = people();
        let filter = IteratorFilter::new()
            .and_where("city", Relation::Equal, "Porto")
            .or_where("age", Relation::LessThan, "10");
        assert_eq!(names(&filter.matches(&rows)), ["Bruno", "Davi"]);
    }

    #[test]
    fn numeric_relations_compare_as_numbers() {
        let rows = people();
        let filter = IteratorFilter::new().and_where("age", Relation::GreaterThan, "10");
        assert_eq!(names(&filter.matches(&rows)), ["Ana", "Carla", "Davi"]);
        let filter = IteratorFilter::new().and_where("age", Relation::LessOrEqual, "17");
        assert_eq!(names(&filter.matches(&rows)), ["Bruno", "Carla"]);
    }

    #[test]
    fn text_relations() {
        let rows = people();
        let filter = IteratorFilter::new().and_where("name", Relation::StartsWith, "Ca");
        assert_eq!(names(&filter.matches(&rows)), ["Carla"]);
        let filter = IteratorFilter::new().and_where("city", Relation::Contains, "is");
        assert_eq!(names(&filter.matches(&rows)), ["Bruno"]);
    }

    #[test]
    fn missing_field() {
        let rows = people();
        let filter = IteratorFilter::new().and_where("email", Relation::Equal, "x");
        assert!(filter.matches(&rows).is_empty());
        let filter = IteratorFilter::new().and_where("email", Relation::NotEqual, "x");
        assert_eq!(filter.matches(&rows).len(), 4);
    }
}
