use chrono::NaiveDate;
use zeroapp_fiql::{ComparisonOp, Expr};

use crate::schema::model::parse_datetime;
use crate::schema::{FieldSchema, FieldType};

use super::predicate::{Predicate, Scalar};

/// Criteria compilation error types.
///
/// Every variant is attributable to the client's filter string and maps to
/// a 4xx response at the HTTP boundary; compilation never touches the data
/// store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("operator '{op}' is not supported for {field_type} field '{field}'")]
    UnsupportedOperator {
        field: String,
        op: ComparisonOp,
        field_type: FieldType,
    },

    #[error("value '{value}' is not a valid {expected} for field '{field}'")]
    TypeMismatch {
        field: String,
        value: String,
        expected: FieldType,
    },
}

/// Compile a parsed expression tree into a typed predicate against an
/// entity's field schema.
///
/// Recursive over the tree: comparisons are validated (field exists and is
/// queryable, operator is legal for the field type, value coerces to the
/// declared type) and groups compile their children left to right, failing
/// on the first bad child. Pure and deterministic: the same tree and schema
/// always produce the same predicate.
pub fn compile(expr: &Expr, schema: &FieldSchema) -> Result<Predicate, CompileError> {
    match expr {
        Expr::Comparison { field, op, value } => {
            let def = schema
                .queryable(field)
                .ok_or_else(|| CompileError::UnknownField {
                    field: field.clone(),
                })?;

            if !def.field_type.supports(*op) {
                return Err(CompileError::UnsupportedOperator {
                    field: field.clone(),
                    op: *op,
                    field_type: def.field_type,
                });
            }

            let coerced =
                coerce(value, def.field_type).ok_or_else(|| CompileError::TypeMismatch {
                    field: field.clone(),
                    value: value.clone(),
                    expected: def.field_type,
                })?;

            Ok(Predicate::Compare {
                field: field.clone(),
                op: *op,
                value: coerced,
            })
        }
        Expr::Group { op, children } => {
            let compiled = children
                .iter()
                .map(|child| compile(child, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::Group {
                op: *op,
                children: compiled,
            })
        }
    }
}

/// Coerce a raw filter value to the field's declared type.
///
/// A `*` in a text value is treated as a literal character, matching the
/// plain-equality behavior the gateway has always had; glob matching would
/// be a separate `==` value rule, not a new operator.
fn coerce(raw: &str, field_type: FieldType) -> Option<Scalar> {
    match field_type {
        FieldType::Integer => raw.parse::<i64>().ok().map(Scalar::Int),
        FieldType::Float => raw.parse::<f64>().ok().map(Scalar::Float),
        FieldType::Text => Some(Scalar::Text(raw.to_string())),
        FieldType::Boolean => match raw {
            "true" => Some(Scalar::Bool(true)),
            "false" => Some(Scalar::Bool(false)),
            _ => None,
        },
        FieldType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(Scalar::Date),
        FieldType::DateTime => parse_datetime(raw).map(Scalar::DateTime),
    }
}
