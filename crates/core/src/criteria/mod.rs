pub mod compile;
pub mod eval;
pub mod predicate;
pub mod sql;

pub use compile::{compile, CompileError};
pub use eval::matches;
pub use predicate::{Predicate, Scalar};
pub use sql::SqlFilter;
