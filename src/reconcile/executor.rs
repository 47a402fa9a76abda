//! Statement executor that only prints what it would run.

use std::io::Write;

use super::source::{ExecutionError, StatementExecutor};
use crate::diff::ChangeStatement;

/// DryRunExecutor writes each statement as a line of CQL.
#[derive(Debug)]
pub struct DryRunExecutor<W: Write> {
    out: W,
    applied: usize,
}

impl<W: Write> DryRunExecutor<W> {
    pub fn new(out: W) -> Self {
        DryRunExecutor { out, applied: 0 }
    }

    /// Returns how many statements were written.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatementExecutor for DryRunExecutor<W> {
    fn apply(&mut self, _table: &str, statement: &ChangeStatement) -> Result<(), ExecutionError> {
        writeln!(self.out, "{}", statement.to_cql()).map_err(|e| ExecutionError::new(e.to_string()))?;
        self.applied += 1;
        Ok(())
    }
}
