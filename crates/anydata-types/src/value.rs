use std::cmp::Ordering;
use std::fmt;

/// The value held by one field of a [`Row`](crate::Row).
///
/// A field is either a single string or an ordered list of strings. A list
/// always carries at least two entries: one entry collapses to a scalar and
/// an emptied list removes the field from its row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// One value.
    Scalar(String),
    /// Two or more values in insertion order.
    List(Vec<String>),
}

impl FieldValue {
    /// Build a value from a list, collapsing short lists.
    ///
    /// Returns `None` for an empty list.
    pub fn from_values(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Scalar),
            _ => Some(Self::List(values)),
        }
    }

    /// First (or only) value.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(list) => list.first().map(String::as_str),
        }
    }

    /// All values as a slice; a scalar yields a one-element slice.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::List(list) => list,
        }
    }

    pub const fn is_multi(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Append a value, promoting a scalar to a two-element list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Scalar(existing) => {
                let first = std::mem::take(existing);
                *self = Self::List(vec![first, value]);
            }
            Self::List(list) => list.push(value),
        }
    }

    /// Consume into an owned vector of values.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s],
            Self::List(list) => list,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s),
            Self::List(list) => write!(f, "[{}]", list.join(", ")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_owned())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Scalar(s.clone())
    }
}

/// Compare two field values the way sorting and filtering see them.
///
/// Absent values sort first. When both sides parse as numbers they compare
/// numerically (`"9" < "10"`); otherwise they compare byte-wise.
pub fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.cmp(b),
        },
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
