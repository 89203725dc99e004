use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use zeroapp_fiql::{BooleanOp, ComparisonOp};

/// A filter value coerced to its field's declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Date(v) => write!(f, "{v}"),
            Scalar::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// A compiled filter: the expression tree with every field validated against
/// the entity schema and every value coerced.
///
/// Structurally mirrors [`zeroapp_fiql::Expr`]; compilation is all or
/// nothing, so a `Predicate` is never partially resolved. Immutable once
/// built and owned by the caller, which hands it to the storage layer (or
/// the in-memory evaluator) for a single query and discards it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Compare {
        field: String,
        op: ComparisonOp,
        value: Scalar,
    },
    Group {
        op: BooleanOp,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: Scalar) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value,
        }
    }
}
