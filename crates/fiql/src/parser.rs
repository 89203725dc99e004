use crate::ast::{BooleanOp, ComparisonOp, Expr};
use crate::lexer::{tokenize, SpannedToken, Token};

/// Parser error types.
///
/// Both variants are terminal for the request that carried the filter: a
/// malformed query never parses on retry, so callers surface these as
/// client errors with the offending token attached.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed expression: {detail}, near '{near}'")]
    MalformedExpression { detail: String, near: String },
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
}

impl ParseError {
    fn malformed(detail: impl Into<String>, near: impl ToString) -> Self {
        ParseError::MalformedExpression {
            detail: detail.into(),
            near: near.to_string(),
        }
    }
}

/// Parse a FIQL filter string into an expression tree.
///
/// Grammar, with FIQL precedence (`;` binds tighter than `,`):
///
/// ```text
/// or_expr    := and_expr (',' and_expr)*
/// and_expr   := primary (';' primary)*
/// primary    := '(' or_expr ')' | comparison
/// comparison := field op value
/// ```
///
/// Pure function: no side effects, no state shared across calls.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    if input.is_empty() {
        return Err(ParseError::malformed("empty query", "end of input"));
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(ParseError::malformed(
            "unexpected trailing input",
            other.clone(),
        )),
    }
}

/// Like [`parse`], but rejects inputs longer than `max_len` bytes before
/// lexing. Parse time and recursion depth are bounded by input length, so a
/// gateway caps it to keep hostile queries cheap.
pub fn parse_with_limit(input: &str, max_len: usize) -> Result<Expr, ParseError> {
    if input.len() > max_len {
        return Err(ParseError::malformed(
            format!("query exceeds maximum length of {max_len} bytes"),
            "start of input",
        ));
    }
    parse(input)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        let token = self
            .tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof);
        self.pos += 1;
        token
    }

    // or_expr := and_expr (',' and_expr)*
    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and()?;
        let mut children = vec![first];

        while self.peek() == &Token::Comma {
            self.advance();
            children.push(self.parse_and()?);
        }

        Ok(group(BooleanOp::Or, children))
    }

    // and_expr := primary (';' primary)*
    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_primary()?;
        let mut children = vec![first];

        while self.peek() == &Token::Semi {
            self.advance();
            children.push(self.parse_primary()?);
        }

        Ok(group(BooleanOp::And, children))
    }

    // primary := '(' or_expr ')' | comparison
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            Token::LParen => {
                self.advance();
                if self.peek() == &Token::RParen {
                    return Err(ParseError::malformed("empty group", ")"));
                }
                let inner = self.parse_or()?;
                match self.advance() {
                    Token::RParen => Ok(inner),
                    other => Err(ParseError::malformed(
                        "unbalanced parentheses",
                        other.clone(),
                    )),
                }
            }
            _ => self.parse_comparison(),
        }
    }

    // comparison := field op value
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let field = match self.advance().clone() {
            Token::Atom(name) => name,
            other => {
                return Err(ParseError::malformed("expected a field name", other));
            }
        };

        let op = match self.advance().clone() {
            Token::Op(op) => op,
            other => {
                return Err(ParseError::malformed(
                    format!("expected a comparison operator after '{field}'"),
                    other,
                ));
            }
        };

        let value = match self.advance().clone() {
            Token::Atom(value) => value,
            other => {
                return Err(ParseError::malformed(
                    format!("expected a value after '{field}{op}'"),
                    other,
                ));
            }
        };

        Ok(Expr::Comparison { field, op, value })
    }
}

/// Wrap children in a group, except that a single child stays bare: a group
/// with fewer than two members is not a valid tree node.
fn group(op: BooleanOp, mut children: Vec<Expr>) -> Expr {
    if children.len() == 1 {
        children.remove(0)
    } else {
        Expr::Group { op, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_comparison() {
        let expr = parse("age==30").unwrap();
        assert_eq!(expr, Expr::cmp("age", ComparisonOp::Eq, "30"));
    }

    #[test]
    fn parse_and_chain_flattens() {
        let expr = parse("a==1;b==2;c==3").unwrap();
        match expr {
            Expr::Group { op, children } => {
                assert_eq!(op, BooleanOp::And);
                assert_eq!(children.len(), 3);
            }
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a==v1;b==v2,c==v3 must group as (a AND b) OR c.
        let expr = parse("a==v1;b==v2,c==v3").unwrap();
        assert_eq!(
            expr,
            Expr::Group {
                op: BooleanOp::Or,
                children: vec![
                    Expr::Group {
                        op: BooleanOp::And,
                        children: vec![
                            Expr::cmp("a", ComparisonOp::Eq, "v1"),
                            Expr::cmp("b", ComparisonOp::Eq, "v2"),
                        ],
                    },
                    Expr::cmp("c", ComparisonOp::Eq, "v3"),
                ],
            }
        );
    }

    #[test]
    fn parens_override_precedence() {
        let expr = parse("a==v1;(b==v2,c==v3)").unwrap();
        assert_eq!(
            expr,
            Expr::Group {
                op: BooleanOp::And,
                children: vec![
                    Expr::cmp("a", ComparisonOp::Eq, "v1"),
                    Expr::Group {
                        op: BooleanOp::Or,
                        children: vec![
                            Expr::cmp("b", ComparisonOp::Eq, "v2"),
                            Expr::cmp("c", ComparisonOp::Eq, "v3"),
                        ],
                    },
                ],
            }
        );
    }

    #[test]
    fn parenthesized_single_comparison_stays_bare() {
        let expr = parse("(age<5)").unwrap();
        assert_eq!(expr, Expr::cmp("age", ComparisonOp::Lt, "5"));
    }

    #[test]
    fn round_trip_without_parens() {
        for q in ["age==30", "name==foo;age<55", "a==1;b==2,c==3,d<=4"] {
            let expr = parse(q).unwrap();
            let flat = expr.to_query_string();
            assert_eq!(flat, q);
            assert_eq!(parse(&flat).unwrap(), expr);
        }
    }

    #[test]
    fn round_trip_reinserts_needed_parens() {
        let expr = parse("name==foo;(age<5,age>55)").unwrap();
        assert_eq!(expr.to_query_string(), "name==foo;(age<5,age>55)");
        assert_eq!(parse(&expr.to_query_string()).unwrap(), expr);
    }

    #[test]
    fn empty_query_is_malformed() {
        assert!(matches!(
            parse(""),
            Err(ParseError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn unbalanced_parens_are_malformed() {
        for q in ["(age==1;age==2", "age==1)", "((age==1)"] {
            assert!(
                matches!(parse(q), Err(ParseError::MalformedExpression { .. })),
                "query {q:?} should be malformed"
            );
        }
    }

    #[test]
    fn stray_connectives_are_malformed() {
        for q in [";age==1", "age==1;", "a==1;;b==2", ",a==1", "a==1,"] {
            assert!(
                matches!(parse(q), Err(ParseError::MalformedExpression { .. })),
                "query {q:?} should be malformed"
            );
        }
    }

    #[test]
    fn missing_operands_are_malformed() {
        for q in ["age==", "==30", "age"] {
            let err = parse(q).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedExpression { .. }),
                "query {q:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_group_is_malformed() {
        assert!(matches!(
            parse("()"),
            Err(ParseError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn unknown_operator_surfaces_token() {
        let err = parse("age=lt=55").unwrap_err();
        assert_eq!(err, ParseError::UnknownOperator("=lt=".to_string()));
    }

    #[test]
    fn length_limit_is_enforced() {
        let long = format!("age=={}", "9".repeat(100));
        assert!(parse_with_limit(&long, 32).is_err());
        assert!(parse_with_limit("age==30", 32).is_ok());
    }
}
