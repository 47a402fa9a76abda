//! # Table Properties
//!
//! Declarative management of Cassandra table properties.
//!
//! A desired-state document declares, per table, the properties an operator
//! cares about. The observed state is read from a metadata source. Both are
//! normalized against a property schema (unknown keys rejected, values
//! coerced to their declared kinds, defaults filled in), diffed property by
//! property, and the differences turned into `ALTER TABLE` statements.
//!
//! ## Modules
//!
//! - [`value`] - Raw YAML/JSON values, ordered maps and document I/O
//! - [`fieldpath`] - Dotted paths into a property tree
//! - [`schema`] - Property schema definition and the built-in Cassandra schema
//! - [`typed`] - Normalization, violations and export of property trees
//! - [`diff`] - Property changes, grouping into statements and CQL rendering
//! - [`reconcile`] - Multi-table planning and application against collaborators

pub mod diff;
pub mod fieldpath;
pub mod reconcile;
pub mod schema;
pub mod typed;
pub mod value;

pub use diff::{build, ChangeKind, ChangeStatement, Differ, PropertyChange};
pub use fieldpath::Path;
pub use reconcile::{MetadataSource, Reconciler, StatementExecutor};
pub use schema::Schema;
pub use typed::{export, normalize, Normalizer, PropertyTree, PropertyValue, SchemaViolations};
pub use value::{Map, Value};
