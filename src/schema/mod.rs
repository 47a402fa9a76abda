//! Schema module declares which table properties exist, their types and
//! their defaults.
//!
//! Both sides of a reconciliation are normalized against the same schema,
//! which is what lets an omitted property and an explicit default compare
//! equal.

mod builtin;
mod elements;

pub use builtin::{cassandra_table_schema, CASSANDRA_TABLE_SCHEMA_YAML};
pub use elements::*;
