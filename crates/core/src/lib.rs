//! Query engine and record store for the zeroapp CRUD gateway.
//!
//! `schema` declares entity field schemas, `criteria` compiles parsed FIQL
//! expression trees into typed predicates (and renders them to SQL or
//! evaluates them in memory), and `store` is the JSONB-backed record store
//! the gateway persists entities in.

pub mod criteria;
pub mod schema;
pub mod store;
