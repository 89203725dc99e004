//! FIQL filter expression parser.
//!
//! Turns a compact filter string such as `name==foo;(age<5,age>55)` into an
//! expression tree of comparisons and boolean groups. The tree carries raw
//! string values; type coercion against an entity schema happens downstream
//! in `zeroapp-core`.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{BooleanOp, ComparisonOp, Expr};
pub use parser::{parse, parse_with_limit, ParseError};
