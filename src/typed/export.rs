//! Export of property trees back into declarative-document shape.

use super::property_value::PropertyTree;
use crate::value::{Map, Value};

/// Exports a normalized tree as a raw mapping of property names.
///
/// Every property in the tree is written, including those still at their
/// default, so the result documents the table completely. Normalizing the
/// result against the same schema yields the original tree.
pub fn export(tree: &PropertyTree) -> Value {
    Value::Map(export_properties(tree))
}

/// Like [`export`], returning the mapping itself.
pub fn export_properties(tree: &PropertyTree) -> Map {
    tree.iter()
        .map(|(name, value)| (name.clone(), value.to_value()))
        .collect()
}

/// Exports several tables into one document, in iteration order.
pub fn export_tables<'a>(tables: impl IntoIterator<Item = (&'a String, &'a PropertyTree)>) -> Map {
    tables
        .into_iter()
        .map(|(table, tree)| (table.clone(), export(tree)))
        .collect()
}
