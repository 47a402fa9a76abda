//! Interfaces to the systems the engine reads from and writes to.

use thiserror::Error;

use crate::diff::ChangeStatement;
use crate::value::Map;

/// MetadataSource reports the live properties of a table.
///
/// The returned mapping must only use property names the schema
/// recognizes; sources report anything else on their own.
pub trait MetadataSource {
    fn fetch(&self, table: &str) -> Result<Map, SourceError>;
}

/// SourceError is returned when a table's observed properties cannot be
/// fetched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("table '{table}' not found")]
    NotFound { table: String },

    #[error("metadata source unavailable: {detail}")]
    Unavailable { detail: String },
}

impl SourceError {
    pub fn not_found(table: impl Into<String>) -> Self {
        SourceError::NotFound {
            table: table.into(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        SourceError::Unavailable {
            detail: detail.into(),
        }
    }
}

/// StatementExecutor applies change statements to the backing store.
///
/// Executors own timeout and retry policy; the engine calls `apply` once per
/// statement and never retries.
pub trait StatementExecutor {
    fn apply(&mut self, table: &str, statement: &ChangeStatement) -> Result<(), ExecutionError>;
}

/// ExecutionError carries the executor's failure detail verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution failed: {detail}")]
pub struct ExecutionError {
    pub detail: String,
}

impl ExecutionError {
    pub fn new(detail: impl Into<String>) -> Self {
        ExecutionError {
            detail: detail.into(),
        }
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn fetch(&self, table: &str) -> Result<Map, SourceError> {
        (**self).fetch(table)
    }
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &mut T {
    fn apply(&mut self, table: &str, statement: &ChangeStatement) -> Result<(), ExecutionError> {
        (**self).apply(table, statement)
    }
}
