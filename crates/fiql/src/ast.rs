use std::fmt;

use serde::{Deserialize, Serialize};

/// FIQL expression tree types.

/// A comparison operator embedded in a filter token, e.g. the `<` of `age<55`.
///
/// This is the complete operator set; anything else on the wire is rejected
/// by the lexer before an expression tree is ever built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl ComparisonOp {
    /// The wire form of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    /// True for the four ordering operators (`<`, `<=`, `>`, `>=`).
    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A boolean connective joining sub-expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    /// `;` — binds tighter than `,`.
    And,
    /// `,`
    Or,
}

impl BooleanOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::And => ";",
            BooleanOp::Or => ",",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed filter expression.
///
/// Either a single field comparison or an n-ary boolean group. A `Group`
/// always has at least two children; a degenerate query with one comparison
/// parses to a bare `Comparison`, never a one-child group. Values are kept
/// as raw strings here; the criteria compiler coerces them once it knows the
/// target field's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Comparison {
        field: String,
        op: ComparisonOp,
        value: String,
    },
    Group {
        op: BooleanOp,
        children: Vec<Expr>,
    },
}

impl Expr {
    /// Build a comparison node.
    pub fn cmp(field: impl Into<String>, op: ComparisonOp, value: impl Into<String>) -> Self {
        Expr::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Flatten the tree back to FIQL text. A child group whose connective
    /// binds looser than its parent's (OR under AND) is parenthesized so the
    /// output re-parses to the same structure.
    pub fn to_query_string(&self) -> String {
        match self {
            Expr::Comparison { field, op, value } => format!("{field}{op}{value}"),
            Expr::Group { op, children } => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|child| match child {
                        Expr::Group { op: child_op, .. }
                            if *op == BooleanOp::And && *child_op == BooleanOp::Or =>
                        {
                            format!("({})", child.to_query_string())
                        }
                        _ => child.to_query_string(),
                    })
                    .collect();
                parts.join(op.as_str())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}
