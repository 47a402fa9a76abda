//! Grouping of property changes into per-table change statements.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::change::PropertyChange;
use super::cql;
use crate::typed::PropertyValue;
use crate::value::Map;

/// ChangeStatement sets one or more top-level properties of a table.
///
/// The backing store replaces a property as a whole, so every payload value
/// is the complete new top-level value, never a patch of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeStatement {
    pub table: String,
    pub payload: Map<PropertyValue>,
}

impl ChangeStatement {
    pub fn new(table: impl Into<String>) -> Self {
        ChangeStatement {
            table: table.into(),
            payload: Map::new(),
        }
    }

    /// Returns the names of the affected top-level properties.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.payload.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Renders the statement as CQL.
    pub fn to_cql(&self) -> String {
        cql::render_statement(self)
    }
}

impl fmt::Display for ChangeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cql())
    }
}

/// Groups changes into exactly one statement per table, tables in order of
/// first appearance. No changes yields no statements.
pub fn build(changes: &[PropertyChange]) -> Vec<ChangeStatement> {
    let mut statements: Vec<ChangeStatement> = Vec::new();

    for change in changes {
        let Some(ref value) = change.new else {
            warn!(table = %change.table, property = %change.path, "change carries no target value, skipping");
            continue;
        };

        let idx = match statements.iter().position(|s| s.table == change.table) {
            Some(idx) => idx,
            None => {
                statements.push(ChangeStatement::new(change.table.clone()));
                statements.len() - 1
            }
        };
        statements[idx].payload.set(change.property(), value.clone());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeKind;
    use crate::fieldpath::Path;

    fn change(table: &str, property: &str, new: PropertyValue) -> PropertyChange {
        PropertyChange {
            table: table.to_string(),
            path: Path::property(property),
            kind: ChangeKind::Modify,
            old: None,
            new: Some(new),
            leaves: vec![Path::property(property)],
        }
    }

    #[test]
    fn test_build_empty() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn test_build_groups_by_table() {
        let changes = vec![
            change("t1", "comment", PropertyValue::string("a")),
            change("t2", "gc_grace_seconds", PropertyValue::integer(10)),
            change("t1", "default_time_to_live", PropertyValue::integer(60)),
        ];

        let statements = build(&changes);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].table, "t1");
        assert_eq!(
            statements[0].properties().collect::<Vec<_>>(),
            vec!["comment", "default_time_to_live"]
        );
        assert_eq!(statements[1].table, "t2");
    }

    #[test]
    fn test_build_skips_change_without_value() {
        let mut c = change("t1", "comment", PropertyValue::string("a"));
        c.new = None;
        assert!(build(&[c]).is_empty());
    }
}
