//! Change-tracked rows with a per-row field schema.

use std::borrow::Cow;

use indexmap::IndexMap;
use tracing::debug;

use crate::value::FieldValue;

/// Ordered field mapping held by a [`Row`].
pub type FieldMap = IndexMap<String, FieldValue>;

/// How a row compares field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNameCase {
    /// Names match exactly.
    #[default]
    Sensitive,
    /// Names are lower-cased on the way in.
    Insensitive,
}

/// One record: an ordered bag of named fields plus the last accepted
/// snapshot of that bag.
///
/// Field names are unique within a row. A field holds either one value or
/// an ordered list; repeated [`add_field`](Self::add_field) calls on the same
/// name build the list.
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: FieldMap,
    accepted: FieldMap,
    case: FieldNameCase,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a row from an existing field mapping and accept it.
    ///
    /// Lists with fewer than two entries are collapsed so the stored state
    /// keeps the scalar/list invariant.
    pub fn from_fields(fields: FieldMap) -> Self {
        let fields: FieldMap = fields
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    FieldValue::List(list) => FieldValue::from_values(list)?,
                    scalar @ FieldValue::Scalar(_) => scalar,
                };
                Some((name, value))
            })
            .collect();
        Self {
            accepted: fields.clone(),
            fields,
            case: FieldNameCase::Sensitive,
        }
    }

    fn hydrate<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self.case {
            FieldNameCase::Sensitive => Cow::Borrowed(name),
            FieldNameCase::Insensitive => Cow::Owned(name.to_lowercase()),
        }
    }

    /// Add a value to a field.
    ///
    /// A missing field becomes a scalar, a scalar becomes a two-element
    /// list, and a list grows by one entry.
    pub fn add_field(&mut self, name: &str, value: impl Into<String>) {
        let name = self.hydrate(name).into_owned();
        let value = value.into();
        match self.fields.get_mut(&name) {
            Some(existing) => existing.push(value),
            None => {
                self.fields.insert(name, FieldValue::Scalar(value));
            }
        }
    }

    /// First value of a field, or `None` when the field is absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(self.hydrate(name).as_ref())?.first()
    }

    /// All values of a field; empty when the field is absent.
    pub fn get_as_array(&self, name: &str) -> &[String] {
        self.fields
            .get(self.hydrate(name).as_ref())
            .map(FieldValue::as_slice)
            .unwrap_or_default()
    }

    /// The stored value of a field.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(self.hydrate(name).as_ref())
    }

    /// Set a field to a single value, replacing any existing list.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = self.hydrate(name).into_owned();
        match self.fields.get_mut(&name) {
            Some(existing) => *existing = FieldValue::Scalar(value.into()),
            None => self.add_field(&name, value),
        }
    }

    /// Remove a field entirely, returning its value if it existed.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        let name = self.hydrate(name);
        self.fields.shift_remove(name.as_ref())
    }

    /// Remove every occurrence of `value` from a field.
    ///
    /// Returns whether anything was removed. Remaining list entries keep
    /// their relative order; a list left with one entry becomes a scalar and
    /// a list left empty removes the field.
    pub fn remove_value(&mut self, name: &str, value: &str) -> bool {
        let name = self.hydrate(name);
        let Some(existing) = self.fields.get_mut(name.as_ref()) else {
            return false;
        };
        let remaining = match existing {
            FieldValue::Scalar(current) => {
                if current.as_str() != value {
                    return false;
                }
                None
            }
            FieldValue::List(list) => {
                let before = list.len();
                list.retain(|entry| entry != value);
                if list.len() == before {
                    return false;
                }
                FieldValue::from_values(std::mem::take(list))
            }
        };
        match remaining {
            Some(compacted) => *existing = compacted,
            None => {
                self.fields.shift_remove(name.as_ref());
            }
        }
        true
    }

    /// Replace every occurrence of `old` in a field with `new`.
    ///
    /// Returns whether anything was replaced. List positions are unchanged.
    pub fn replace_value(&mut self, name: &str, old: &str, new: impl Into<String>) -> bool {
        let name = self.hydrate(name);
        let Some(existing) = self.fields.get_mut(name.as_ref()) else {
            return false;
        };
        let new = new.into();
        match existing {
            FieldValue::Scalar(current) if current == old => {
                *current = new;
                true
            }
            FieldValue::Scalar(_) => false,
            FieldValue::List(list) => {
                let mut replaced = false;
                for entry in list.iter_mut().filter(|entry| *entry == old) {
                    entry.clone_from(&new);
                    replaced = true;
                }
                replaced
            }
        }
    }

    /// Current field mapping.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Mapping as of the last [`accept_changes`](Self::accept_changes).
    pub fn snapshot(&self) -> &FieldMap {
        &self.accepted
    }

    pub fn field_exists(&self, name: &str) -> bool {
        self.fields.contains_key(self.hydrate(name).as_ref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the fields differ from the accepted snapshot.
    ///
    /// Comparison is by name/value pairs; field order is ignored.
    pub fn has_changes(&self) -> bool {
        self.fields != self.accepted
    }

    pub fn accept_changes(&mut self) {
        self.accepted.clone_from(&self.fields);
    }

    /// Discard every change since the last accept.
    pub fn reject_changes(&mut self) {
        self.fields.clone_from(&self.accepted);
    }

    pub fn is_field_name_case_sensitive(&self) -> bool {
        self.case == FieldNameCase::Sensitive
    }

    /// Switch this row to case-insensitive field names.
    ///
    /// Existing names in both the current mapping and the snapshot are
    /// lower-cased; when two names fold together the later one wins. There is
    /// no way back to case-sensitive names.
    pub fn enable_field_name_case_insensitive(&mut self) {
        if self.case == FieldNameCase::Insensitive {
            return;
        }
        let before = self.fields.len();
        self.fields = lower_keys(std::mem::take(&mut self.fields));
        self.accepted = lower_keys(std::mem::take(&mut self.accepted));
        self.case = FieldNameCase::Insensitive;
        if self.fields.len() != before {
            debug!(
                before,
                after = self.fields.len(),
                "field names collided while folding case"
            );
        }
    }
}

fn lower_keys(fields: FieldMap) -> FieldMap {
    let mut folded = FieldMap::with_capacity(fields.len());
    for (name, value) in fields {
        folded.insert(name.to_lowercase(), value);
    }
    folded
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl From<FieldMap> for Row {
    fn from(fields: FieldMap) -> Self {
        Self::from_fields(fields)
    }
}

/// Collect `(name, value)` pairs with [`Row::add_field`] semantics, so a
/// repeated name becomes a multi-valued field. The result is accepted.
impl<K, V> FromIterator<(K, V)> for Row
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (name, value) in iter {
            row.add_field(name.as_ref(), value);
        }
        row.accept_changes();
        row
    }
}

impl serde::Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.fields, serializer)
    }
}
