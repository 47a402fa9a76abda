//! Metadata source backed by a snapshot document.

use std::path::Path as FsPath;
use tracing::warn;

use super::source::{MetadataSource, SourceError};
use crate::fieldpath::Path;
use crate::schema::Schema;
use crate::value::{load_document, DocumentError, Map, Value};

/// SnapshotSource serves observed properties from a document shaped like a
/// declarative file: table name to raw properties.
///
/// Columns a live system reports that are not table options (`id`, `flags`,
/// ...) are dropped when the snapshot is loaded and listed by
/// [`ignored_keys`](SnapshotSource::ignored_keys).
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    tables: Map,
    ignored: Vec<Path>,
}

impl SnapshotSource {
    pub fn new(document: Map, schema: &Schema) -> Self {
        let mut ignored = Vec::new();
        let tables = document
            .into_iter()
            .map(|(table, properties)| {
                let properties = match properties {
                    Value::Map(props) => Value::Map(
                        props
                            .into_iter()
                            .filter(|(key, _)| {
                                let known = schema.find_property(key).is_some();
                                if !known {
                                    warn!(table = %table, key = %key, "ignoring unrecognized observed property");
                                    ignored.push(Path::from_elements(vec![table.clone(), key.clone()]));
                                }
                                known
                            })
                            .collect(),
                    ),
                    other => other,
                };
                (table, properties)
            })
            .collect();

        SnapshotSource { tables, ignored }
    }

    /// Loads a snapshot document from `path`.
    pub fn load(path: impl AsRef<FsPath>, schema: &Schema) -> Result<Self, DocumentError> {
        Ok(SnapshotSource::new(load_document(path)?, schema))
    }

    /// Returns `table.key` paths dropped while loading.
    pub fn ignored_keys(&self) -> &[Path] {
        &self.ignored
    }

    /// Lists the snapshot's tables in document order, leaving out system
    /// keyspaces.
    pub fn tables(&self) -> Vec<String> {
        self.tables
            .keys()
            .filter(|t| !is_system_table(t))
            .cloned()
            .collect()
    }
}

impl MetadataSource for SnapshotSource {
    fn fetch(&self, table: &str) -> Result<Map, SourceError> {
        match self.tables.get(table) {
            Some(Value::Map(properties)) => Ok(properties.clone()),
            Some(Value::Null) => Ok(Map::new()),
            Some(other) => Err(SourceError::unavailable(format!(
                "snapshot entry for '{}' is a {}, not a mapping",
                table,
                other.type_name()
            ))),
            None => Err(SourceError::not_found(table)),
        }
    }
}

/// System keyspaces are `system` and anything prefixed `system_`.
fn is_system_table(table: &str) -> bool {
    let keyspace = table.split('.').next().unwrap_or(table).to_lowercase();
    keyspace == "system" || keyspace.starts_with("system_")
}
