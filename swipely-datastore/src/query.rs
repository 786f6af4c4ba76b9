use serde::Serialize;
use uuid::Uuid;

use crate::record::Record;

/// A scalar compared against a record field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Uuid(Uuid),
    Text(String),
}

impl Value {
    /// Equality across representations: a UUID and its hyphenated text form
    /// compare equal.
    fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Uuid(u), Value::Text(t)) | (Value::Text(t), Value::Uuid(u)) => {
                Uuid::parse_str(t).map(|parsed| parsed == *u).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Eq,
    Ne,
}

/// Query specification over the fields `F` of one record kind.
///
/// Serializes to the JSON filter document the remote store accepts, e.g.
/// `{"and":[{"cmp":{"field":"is_match","op":"eq","value":true}}, ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Query<F> {
    All,
    Cmp { field: F, op: Op, value: Value },
    And(Vec<Query<F>>),
    Or(Vec<Query<F>>),
    Not(Box<Query<F>>),
}

impl<F> Query<F> {
    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Query::Cmp { field, op: Op::Eq, value: value.into() }
    }

    pub fn ne(field: F, value: impl Into<Value>) -> Self {
        Query::Cmp { field, op: Op::Ne, value: value.into() }
    }

    pub fn and(self, other: Query<F>) -> Self {
        match self {
            Query::All => other,
            Query::And(mut parts) => {
                parts.push(other);
                Query::And(parts)
            }
            q => Query::And(vec![q, other]),
        }
    }

    pub fn or(self, other: Query<F>) -> Self {
        match self {
            Query::Or(mut parts) => {
                parts.push(other);
                Query::Or(parts)
            }
            q => Query::Or(vec![q, other]),
        }
    }

    pub fn negate(self) -> Self {
        Query::Not(Box::new(self))
    }

    /// Evaluate against a record in memory.
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Record<Field = F>,
        F: Copy,
    {
        match self {
            Query::All => true,
            Query::Cmp { field, op, value } => {
                let equal = record.field(*field).same_as(value);
                match op {
                    Op::Eq => equal,
                    Op::Ne => !equal,
                }
            }
            Query::And(parts) => parts.iter().all(|q| q.matches(record)),
            Query::Or(parts) => parts.iter().any(|q| q.matches(record)),
            Query::Not(inner) => !inner.matches(record),
        }
    }
}
