//! Structural comparison of normalized property trees.

use std::collections::BTreeSet;
use tracing::debug;

use super::change::{ChangeKind, PropertyChange};
use crate::fieldpath::Path;
use crate::typed::{Normalizer, PropertyTree, PropertyValue};
use crate::value::Map;

/// Differ compares desired and observed trees produced by one Normalizer.
///
/// The differ needs the normalizer's defaults to tell a reset from an
/// ordinary modification. It never fails: both trees are total over the
/// schema.
#[derive(Debug, Clone, Copy)]
pub struct Differ<'a> {
    normalizer: &'a Normalizer,
}

impl<'a> Differ<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Differ { normalizer }
    }

    /// Compares one table. Changes come out in ascending property name
    /// order, one per differing top-level property.
    pub fn diff_table(
        &self,
        table: &str,
        desired: &PropertyTree,
        observed: &PropertyTree,
    ) -> Vec<PropertyChange> {
        let names: BTreeSet<&String> = desired.names().chain(observed.names()).collect();
        let mut changes = Vec::new();

        for name in names {
            let path = Path::property(name.clone());
            let change = match (desired.get(name), observed.get(name)) {
                (Some(want), Some(have)) if want == have => continue,
                (Some(want), Some(have)) => {
                    let kind = if self.normalizer.default_for(name) == Some(want)
                        && self.normalizer.is_resettable(name)
                    {
                        ChangeKind::Remove
                    } else {
                        ChangeKind::Modify
                    };
                    PropertyChange {
                        table: table.to_string(),
                        leaves: leaf_differences(Some(have), Some(want), &path),
                        path,
                        kind,
                        old: Some(have.clone()),
                        new: Some(want.clone()),
                    }
                }
                (Some(want), None) => PropertyChange {
                    table: table.to_string(),
                    leaves: leaf_differences(None, Some(want), &path),
                    path,
                    kind: ChangeKind::Add,
                    old: None,
                    new: Some(want.clone()),
                },
                (None, Some(_)) => {
                    // Only properties without a default can be missing from
                    // the desired tree; leaving them out means "unmanaged".
                    debug!(table, property = %name, "observed property not managed by desired state");
                    continue;
                }
                (None, None) => continue,
            };
            debug!(table, property = %name, kind = %change.kind, "property differs");
            changes.push(change);
        }

        changes
    }

    /// Compares every desired table against its observed counterpart, in
    /// desired order. Tables with no observed tree are skipped; reporting
    /// them is up to the caller.
    pub fn diff(
        &self,
        desired: &Map<PropertyTree>,
        observed: &Map<PropertyTree>,
    ) -> Vec<PropertyChange> {
        let mut changes = Vec::new();
        for (table, want) in desired.iter() {
            match observed.get(table) {
                Some(have) => changes.extend(self.diff_table(table, want, have)),
                None => debug!(table = %table, "no observed properties, skipping"),
            }
        }
        changes
    }
}

/// Lists the paths of every leaf that differs between `old` and `new`.
/// Maps are walked key by key; anything else that differs is a leaf.
fn leaf_differences(
    old: Option<&PropertyValue>,
    new: Option<&PropertyValue>,
    path: &Path,
) -> Vec<Path> {
    match (old, new) {
        (Some(PropertyValue::Map(a)), Some(PropertyValue::Map(b))) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            keys.into_iter()
                .flat_map(|k| leaf_differences(a.get(k), b.get(k), &path.with(k.clone())))
                .collect()
        }
        (None, Some(PropertyValue::Map(m))) | (Some(PropertyValue::Map(m)), None) if !m.is_empty() => {
            let keys: BTreeSet<&String> = m.keys().collect();
            keys.into_iter()
                .flat_map(|k| {
                    let child = m.get(k);
                    let (o, n) = if old.is_some() { (child, None) } else { (None, child) };
                    leaf_differences(o, n, &path.with(k.clone()))
                })
                .collect()
        }
        (a, b) if a == b => Vec::new(),
        _ => vec![path.clone()],
    }
}
