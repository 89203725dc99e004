use std::fmt::Write;

use zeroapp_fiql::{BooleanOp, ComparisonOp};

use super::predicate::{Predicate, Scalar};

/// A predicate rendered as a Postgres `WHERE` fragment over the JSONB
/// `content` column, plus the ordered bind values for its placeholders.
///
/// Field names in a predicate come from a validated schema (the compiler
/// rejects anything the schema does not declare), so they can be embedded
/// in the fragment; values always travel as binds.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub binds: Vec<Scalar>,
}

impl SqlFilter {
    /// Render a predicate. Placeholder numbering starts at
    /// `first_placeholder` so the caller can prepend binds of its own.
    pub fn from_predicate(pred: &Predicate, first_placeholder: usize) -> Self {
        let mut filter = SqlFilter {
            clause: String::new(),
            binds: Vec::new(),
        };
        filter.render(pred, first_placeholder);
        filter
    }

    fn render(&mut self, pred: &Predicate, first_placeholder: usize) {
        match pred {
            Predicate::Compare { field, op, value } => {
                let placeholder = first_placeholder + self.binds.len();
                let _ = write!(
                    self.clause,
                    "{} {} ${placeholder}",
                    column_expr(field, value),
                    sql_op(*op),
                );
                self.binds.push(value.clone());
            }
            Predicate::Group { op, children } => {
                let connective = match op {
                    BooleanOp::And => " AND ",
                    BooleanOp::Or => " OR ",
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.clause.push_str(connective);
                    }
                    let nested = matches!(child, Predicate::Group { .. });
                    if nested {
                        self.clause.push('(');
                    }
                    self.render(child, first_placeholder);
                    if nested {
                        self.clause.push(')');
                    }
                }
            }
        }
    }
}

/// JSONB text extraction with the cast matching the bind's type. The
/// surrogate `id` is a real column, not a key inside `content`.
fn column_expr(field: &str, value: &Scalar) -> String {
    if field == "id" {
        return "id".to_string();
    }
    let accessor = format!("content->>'{field}'");
    match value {
        Scalar::Int(_) => format!("({accessor})::bigint"),
        Scalar::Float(_) => format!("({accessor})::double precision"),
        Scalar::Text(_) => accessor,
        Scalar::Bool(_) => format!("({accessor})::boolean"),
        Scalar::Date(_) => format!("({accessor})::date"),
        Scalar::DateTime(_) => format!("({accessor})::timestamptz"),
    }
}

fn sql_op(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::Ne => "<>",
        ComparisonOp::Lt => "<",
        ComparisonOp::Le => "<=",
        ComparisonOp::Gt => ">",
        ComparisonOp::Ge => ">=",
    }
}
