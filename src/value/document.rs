//! Loading and saving declarative documents.
//!
//! A document is an ordered mapping of table name to that table's raw
//! properties. JSON documents are accepted too since JSON is a YAML subset.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{Map, Value};

/// DocumentError is returned when a document cannot be read or written.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document must be a mapping of table name to properties, got {found}")]
    NotAMapping { found: &'static str },
}

/// Parses a document from YAML text.
pub fn parse_document(text: &str) -> Result<Map, DocumentError> {
    // An empty file describes no tables.
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(text)?;
    match value {
        Value::Map(tables) => Ok(tables),
        Value::Null => Ok(Map::new()),
        other => Err(DocumentError::NotAMapping {
            found: other.type_name(),
        }),
    }
}

/// Reads and parses a document from `path`.
pub fn load_document(path: impl AsRef<Path>) -> Result<Map, DocumentError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text)
}

/// Renders a document as YAML text.
pub fn render_document(document: &Map) -> Result<String, DocumentError> {
    Ok(serde_yaml::to_string(document)?)
}

/// Writes a document to `path` as YAML.
pub fn save_document(path: impl AsRef<Path>, document: &Map) -> Result<(), DocumentError> {
    let path = path.as_ref();
    let text = render_document(document)?;
    fs::write(path, text).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
