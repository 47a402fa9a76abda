//! Schema violation types.

use std::fmt;
use thiserror::Error;

use crate::fieldpath::Path;

/// SchemaViolation is a desired or observed property that does not fit the
/// schema. These are authoring errors; the engine never works around them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("unknown property '{path}'")]
    UnknownProperty { path: Path },

    #[error("{path}: type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        path: Path,
        expected: String,
        actual: String,
    },

    #[error("{path}: {message}")]
    InvalidValue { path: Path, message: String },

    #[error("{message}")]
    InvalidSchema { message: String },
}

impl SchemaViolation {
    pub fn unknown_property(path: Path) -> Self {
        SchemaViolation::UnknownProperty { path }
    }

    pub fn type_mismatch(path: Path, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        SchemaViolation::TypeMismatch {
            path,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_value(path: Path, message: impl Into<String>) -> Self {
        SchemaViolation::InvalidValue {
            path,
            message: message.into(),
        }
    }

    /// Returns the offending property path, if the violation has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SchemaViolation::UnknownProperty { path }
            | SchemaViolation::TypeMismatch { path, .. }
            | SchemaViolation::InvalidValue { path, .. } => Some(path),
            SchemaViolation::InvalidSchema { .. } => None,
        }
    }
}

/// SchemaViolations collects every violation found in one property tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaViolations {
    table: Option<String>,
    violations: Vec<SchemaViolation>,
}

impl SchemaViolations {
    /// Creates a new empty SchemaViolations.
    pub fn new() -> Self {
        SchemaViolations::default()
    }

    pub fn from_violation(violation: SchemaViolation) -> Self {
        SchemaViolations {
            table: None,
            violations: vec![violation],
        }
    }

    /// Attributes the violations to `table`.
    pub fn for_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn add(&mut self, violation: SchemaViolation) {
        self.violations.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaViolation> {
        self.violations.iter()
    }
}

impl IntoIterator for SchemaViolations {
    type Item = SchemaViolation;
    type IntoIter = std::vec::IntoIter<SchemaViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match self.table {
                Some(ref table) => write!(f, "{}: {}", table, violation)?,
                None => write!(f, "{}", violation)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolations {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let err = SchemaViolation::type_mismatch(Path::from("gc_grace_seconds"), "integer", "map");
        assert_eq!(
            err.to_string(),
            "gc_grace_seconds: type mismatch: expected integer, got map"
        );

        let err = SchemaViolation::unknown_property(Path::from("gc_grace_second"));
        assert!(err.to_string().contains("gc_grace_second"));
    }

    #[test]
    fn test_violations_for_table() {
        let mut errs = SchemaViolations::new();
        assert!(errs.is_empty());

        errs.add(SchemaViolation::unknown_property(Path::from("foo")));
        errs.add(SchemaViolation::invalid_value(Path::from("cdc"), "not a boolean"));
        let errs = errs.for_table("events.by_day");

        assert_eq!(errs.len(), 2);
        assert_eq!(errs.table(), Some("events.by_day"));
        assert_eq!(
            errs.to_string(),
            "events.by_day: unknown property 'foo'\nevents.by_day: cdc: not a boolean"
        );
    }
}
