//! Scan requests: filter predicates plus ordering.
//!
//! A [`Scan`] is plain data. Backends evaluate it with [`Scan::apply`] or
//! translate it into their own query language.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mtree_types::NodeId;

use crate::record::Record;

/// A single predicate over a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Column equals the value.
    Eq { field: String, value: Value },
    /// Column is present and differs from the value.
    NotEq { field: String, value: Value },
    /// Column value is one of the given values.
    In { field: String, values: Vec<Value> },
    /// Column is a string starting with `prefix`.
    Prefix { field: String, prefix: String },
    /// Column is absent or null.
    IsNull { field: String },
    /// Record identifier is one of the given identifiers.
    IdIn(Vec<NodeId>),
    /// Record identifier differs from the given identifier.
    IdNotEq(NodeId),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::NotEq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    /// Evaluate the predicate against a record.
    ///
    /// An unpersisted record never matches the identifier predicates.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq { field, value } => record.get(field) == Some(value),
            Filter::NotEq { field, value } => {
                matches!(record.get(field), Some(v) if v != value)
            }
            Filter::In { field, values } => record
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Filter::Prefix { field, prefix } => record
                .get_str(field)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Filter::IsNull { field } => record.is_null(field),
            Filter::IdIn(ids) => record.id.is_some_and(|id| ids.contains(&id)),
            Filter::IdNotEq(other) => record.id.is_some_and(|id| id != *other),
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Ordering on a single column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// A conjunction of filters plus an ordering.
///
/// Records tied on every ordering column come back in identifier order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Scan {
    /// A scan matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a filter (all filters must match).
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an ordering column after any existing ones.
    pub fn order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Returns `true` if every filter matches the record.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Filter and sort a set of records according to this scan.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut matched: Vec<Record> = records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for order in &self.order_by {
            let ord = compare_values(a.get(&order.field), b.get(&order.field));
            let ord = match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    }
}

/// Total order over optional JSON values: missing/null first, then numbers,
/// then strings, then booleans. Other kinds compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
