use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::ComparisonOp;
use crate::parser::ParseError;

/// Token types produced by the FIQL lexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A field name or a raw comparison value. Any run of characters outside
    /// the reserved set `; , ( ) = ! < >` and whitespace.
    Atom(String),

    /// A comparison operator (`==`, `!=`, `<`, `<=`, `>`, `>=`).
    Op(ComparisonOp),

    /// The conjunction connective.
    Semi, // ;
    /// The disjunction connective.
    Comma, // ,
    /// The left parenthesis.
    LParen, // (
    /// The right parenthesis.
    RParen, // )

    /// The end of the input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Atom(s) => write!(f, "{s}"),
            Token::Op(op) => write!(f, "{op}"),
            Token::Semi => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Position in the filter string for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

fn is_reserved(ch: char) -> bool {
    matches!(ch, ';' | ',' | '(' | ')' | '=' | '!' | '<' | '>')
}

/// Tokenize a FIQL filter string into a sequence of tokens.
///
/// Operator tokens outside the fixed set are rejected here, including the
/// alternate `=op=` forms (`=lt=`, `=ge=`, ...) some FIQL dialects accept.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        // Skip whitespace
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        let token = match ch {
            ';' => {
                pos += 1;
                Token::Semi
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            '=' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 2;
                    Token::Op(ComparisonOp::Eq)
                } else {
                    // An `=word=` form, or a stray `=`. Consume through the
                    // closing `=` so the whole token is reported.
                    pos += 1;
                    while pos < chars.len() && !is_reserved(chars[pos]) && !chars[pos].is_whitespace()
                    {
                        pos += 1;
                    }
                    if pos < chars.len() && chars[pos] == '=' {
                        pos += 1;
                    }
                    let tok: String = chars[start..pos].iter().collect();
                    return Err(ParseError::UnknownOperator(tok));
                }
            }
            '!' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 2;
                    Token::Op(ComparisonOp::Ne)
                } else {
                    return Err(ParseError::UnknownOperator("!".to_string()));
                }
            }
            '<' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 2;
                    Token::Op(ComparisonOp::Le)
                } else {
                    pos += 1;
                    Token::Op(ComparisonOp::Lt)
                }
            }
            '>' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 2;
                    Token::Op(ComparisonOp::Ge)
                } else {
                    pos += 1;
                    Token::Op(ComparisonOp::Gt)
                }
            }
            _ => {
                while pos < chars.len() && !is_reserved(chars[pos]) && !chars[pos].is_whitespace() {
                    pos += 1;
                }
                Token::Atom(chars[start..pos].iter().collect())
            }
        };

        tokens.push(SpannedToken {
            token,
            span: Span { start, end: pos },
        });
    }

    tokens.push(SpannedToken {
        token: Token::Eof,
        span: Span {
            start: pos,
            end: pos,
        },
    });

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn tokenize_simple_comparison() {
        let tokens = tok("age<55");
        assert_eq!(tokens[0], Token::Atom("age".into()));
        assert_eq!(tokens[1], Token::Op(ComparisonOp::Lt));
        assert_eq!(tokens[2], Token::Atom("55".into()));
        assert_eq!(tokens[3], Token::Eof);
    }

    #[test]
    fn tokenize_connectives_and_parens() {
        let tokens = tok("name==foo;(age<5,age>55)");
        assert_eq!(tokens[0], Token::Atom("name".into()));
        assert_eq!(tokens[1], Token::Op(ComparisonOp::Eq));
        assert_eq!(tokens[2], Token::Atom("foo".into()));
        assert_eq!(tokens[3], Token::Semi);
        assert_eq!(tokens[4], Token::LParen);
        assert_eq!(tokens[5], Token::Atom("age".into()));
        assert_eq!(tokens[6], Token::Op(ComparisonOp::Lt));
        assert_eq!(tokens[7], Token::Atom("5".into()));
        assert_eq!(tokens[8], Token::Comma);
        assert_eq!(tokens[9], Token::Atom("age".into()));
        assert_eq!(tokens[10], Token::Op(ComparisonOp::Gt));
        assert_eq!(tokens[11], Token::Atom("55".into()));
        assert_eq!(tokens[12], Token::RParen);
        assert_eq!(tokens[13], Token::Eof);
    }

    #[test]
    fn tokenize_all_operators() {
        let tokens = tok("a==1 a!=1 a<1 a<=1 a>1 a>=1");
        let ops: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Op(op) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                ComparisonOp::Eq,
                ComparisonOp::Ne,
                ComparisonOp::Lt,
                ComparisonOp::Le,
                ComparisonOp::Gt,
                ComparisonOp::Ge,
            ]
        );
    }

    #[test]
    fn tokenize_dates_and_wildcards_as_atoms() {
        let tokens = tok("dob>=1990-01-01;username==foo*");
        assert_eq!(tokens[2], Token::Atom("1990-01-01".into()));
        assert_eq!(tokens[6], Token::Atom("foo*".into()));
    }

    #[test]
    fn fiql_word_operator_is_rejected() {
        let err = tokenize("age=lt=55").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator(tok) if tok == "=lt="));
    }

    #[test]
    fn stray_equals_is_rejected() {
        let err = tokenize("age=").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator(tok) if tok == "="));
    }

    #[test]
    fn lone_bang_is_rejected() {
        let err = tokenize("age!55").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator(tok) if tok == "!"));
    }
}
