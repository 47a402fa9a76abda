//! Value module - In-memory representation of untyped YAML/JSON documents.
//!
//! Raw values are what declarative documents and metadata sources produce
//! before any schema has been applied.

mod document;
mod map;
mod value;

pub use document::*;
pub use map::Map;
pub use value::*;
