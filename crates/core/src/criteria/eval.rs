use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use zeroapp_fiql::{BooleanOp, ComparisonOp};

use super::predicate::{Predicate, Scalar};

/// Apply a compiled predicate to a JSON record in memory.
///
/// A field that is absent, null, or of a shape the scalar cannot compare
/// against makes its comparison false; it never errors, since the predicate
/// was already validated against the schema and a record simply may not
/// carry the field.
pub fn matches(pred: &Predicate, record: &Value) -> bool {
    match pred {
        Predicate::Compare { field, op, value } => record
            .get(field)
            .map(|found| compare_value(found, value).is_some_and(|ord| op_holds(*op, ord)))
            .unwrap_or(false),
        Predicate::Group { op, children } => match op {
            BooleanOp::And => children.iter().all(|child| matches(child, record)),
            BooleanOp::Or => children.iter().any(|child| matches(child, record)),
        },
    }
}

fn op_holds(op: ComparisonOp, ord: Ordering) -> bool {
    match op {
        ComparisonOp::Eq => ord == Ordering::Equal,
        ComparisonOp::Ne => ord != Ordering::Equal,
        ComparisonOp::Lt => ord == Ordering::Less,
        ComparisonOp::Le => ord != Ordering::Greater,
        ComparisonOp::Gt => ord == Ordering::Greater,
        ComparisonOp::Ge => ord != Ordering::Less,
    }
}

/// Ordering of the record's field value relative to the filter scalar, or
/// `None` when the JSON value does not have the scalar's type.
fn compare_value(found: &Value, scalar: &Scalar) -> Option<Ordering> {
    match scalar {
        Scalar::Int(rhs) => found.as_i64().map(|lhs| lhs.cmp(rhs)),
        Scalar::Float(rhs) => found.as_f64().and_then(|lhs| lhs.partial_cmp(rhs)),
        Scalar::Text(rhs) => found.as_str().map(|lhs| lhs.cmp(rhs.as_str())),
        Scalar::Bool(rhs) => found.as_bool().map(|lhs| lhs.cmp(rhs)),
        Scalar::Date(rhs) => found
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(|lhs| lhs.cmp(rhs)),
        Scalar::DateTime(rhs) => found
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|lhs| lhs.with_timezone(&Utc).cmp(rhs)),
    }
}
