//! Per-table reconciliation: plan, apply, export.

use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::source::{ExecutionError, MetadataSource, SourceError, StatementExecutor};
use crate::diff::{build, ChangeStatement, Differ, PropertyChange};
use crate::typed::{export, Normalizer, PropertyTree, SchemaViolations};
use crate::value::{Map, Value};

/// TableError is why one table could not be reconciled. It never stops
/// other tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("desired state invalid:\n{0}")]
    InvalidDesired(SchemaViolations),

    #[error("observed state invalid:\n{0}")]
    InvalidObserved(SchemaViolations),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl TableError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TableError::Source(SourceError::NotFound { .. }))
    }
}

/// Plan holds what one reconciliation pass would do, table by table, in
/// desired-document order.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub tables: Vec<TablePlan>,
}

#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table: String,
    pub outcome: PlanOutcome,
}

#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Unchanged,
    Changes {
        changes: Vec<PropertyChange>,
        statements: Vec<ChangeStatement>,
    },
    Failed(TableError),
}

impl Plan {
    pub fn changes(&self) -> impl Iterator<Item = &PropertyChange> {
        self.tables.iter().flat_map(|t| match t.outcome {
            PlanOutcome::Changes { ref changes, .. } => changes.as_slice(),
            _ => &[][..],
        })
    }

    pub fn statements(&self) -> impl Iterator<Item = &ChangeStatement> {
        self.tables.iter().flat_map(|t| match t.outcome {
            PlanOutcome::Changes { ref statements, .. } => statements.as_slice(),
            _ => &[][..],
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TableError)> {
        self.tables.iter().filter_map(|t| match t.outcome {
            PlanOutcome::Failed(ref err) => Some((t.table.as_str(), err)),
            _ => None,
        })
    }

    /// True when every table planned cleanly and none needs changes.
    pub fn is_converged(&self) -> bool {
        self.tables
            .iter()
            .all(|t| matches!(t.outcome, PlanOutcome::Unchanged))
    }
}

/// Report is the outcome of applying a plan.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub tables: Vec<TableReport>,
}

#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub status: TableStatus,
}

#[derive(Debug, Clone)]
pub enum TableStatus {
    Unchanged,
    Applied { statements: usize },
    /// `applied` statements went through before `error`.
    Failed { applied: usize, error: TableError },
}

impl Report {
    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Applied { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&TableStatus) -> bool) -> usize {
        self.tables.iter().filter(|t| pred(&t.status)).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.tables {
            match t.status {
                TableStatus::Unchanged => writeln!(f, "{}: unchanged", t.table)?,
                TableStatus::Applied { statements } => {
                    writeln!(f, "{}: applied {} statement(s)", t.table, statements)?
                }
                TableStatus::Failed { applied, ref error } => {
                    writeln!(f, "{}: failed after {} statement(s): {}", t.table, applied, error)?
                }
            }
        }
        write!(
            f,
            "{} applied, {} unchanged, {} failed",
            self.applied(),
            self.unchanged(),
            self.failed()
        )
    }
}

/// Export is a declarative document for the tables that could be read,
/// plus the tables that could not.
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub document: Map,
    pub failures: Vec<(String, TableError)>,
}

/// Reconciler runs the engine over many tables against a metadata source
/// and a statement executor.
#[derive(Debug, Clone)]
pub struct Reconciler {
    normalizer: Normalizer,
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler::new(Normalizer::builtin().clone())
    }
}

impl Reconciler {
    pub fn new(normalizer: Normalizer) -> Self {
        Reconciler { normalizer }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Normalizes every table of a desired document, returning the
    /// violations of the tables that fail.
    pub fn validate(&self, desired: &Map) -> Vec<SchemaViolations> {
        desired
            .iter()
            .filter_map(|(table, raw)| {
                self.normalizer
                    .normalize(raw)
                    .err()
                    .map(|e| e.for_table(table.clone()))
            })
            .collect()
    }

    /// Plans every table of `desired` in document order.
    pub fn plan<S: MetadataSource + ?Sized>(&self, desired: &Map, source: &S) -> Plan {
        let tables = desired
            .iter()
            .map(|(table, raw)| TablePlan {
                table: table.clone(),
                outcome: self.plan_table(table, raw, source),
            })
            .collect();
        Plan { tables }
    }

    /// Plans one table: normalize desired, fetch and normalize observed,
    /// diff, build statements.
    pub fn plan_table<S: MetadataSource + ?Sized>(
        &self,
        table: &str,
        desired: &Value,
        source: &S,
    ) -> PlanOutcome {
        match self.changes_for(table, desired, source) {
            Ok(changes) if changes.is_empty() => {
                debug!(table, "table is up to date");
                PlanOutcome::Unchanged
            }
            Ok(changes) => {
                let statements = build(&changes);
                debug!(table, changes = changes.len(), statements = statements.len(), "planned table");
                PlanOutcome::Changes {
                    changes,
                    statements,
                }
            }
            Err(err) => {
                warn!(table, error = %err, "cannot plan table");
                PlanOutcome::Failed(err)
            }
        }
    }

    fn changes_for<S: MetadataSource + ?Sized>(
        &self,
        table: &str,
        desired: &Value,
        source: &S,
    ) -> Result<Vec<PropertyChange>, TableError> {
        let desired = self
            .normalizer
            .normalize(desired)
            .map_err(|e| TableError::InvalidDesired(e.for_table(table)))?;
        let observed = self.observe(table, source)?;
        Ok(Differ::new(&self.normalizer).diff_table(table, &desired, &observed))
    }

    fn observe<S: MetadataSource + ?Sized>(&self, table: &str, source: &S) -> Result<PropertyTree, TableError> {
        let raw = source.fetch(table)?;
        self.normalizer
            .normalize_properties(&raw)
            .map_err(|e| TableError::InvalidObserved(e.for_table(table)))
    }

    /// Applies each table's statements in order. A table stops at its first
    /// failing statement; the remaining tables still run.
    pub fn apply<E: StatementExecutor + ?Sized>(&self, plan: &Plan, executor: &mut E) -> Report {
        let mut report = Report::default();

        for t in &plan.tables {
            let status = match t.outcome {
                PlanOutcome::Unchanged => TableStatus::Unchanged,
                PlanOutcome::Failed(ref error) => TableStatus::Failed {
                    applied: 0,
                    error: error.clone(),
                },
                PlanOutcome::Changes { ref statements, .. } => apply_table(&t.table, statements, executor),
            };
            report.tables.push(TableReport {
                table: t.table.clone(),
                status,
            });
        }

        info!(
            applied = report.applied(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "reconciliation finished"
        );
        report
    }

    /// Plans and applies in one pass.
    pub fn reconcile<S, E>(&self, desired: &Map, source: &S, executor: &mut E) -> Report
    where
        S: MetadataSource + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let plan = self.plan(desired, source);
        self.apply(&plan, executor)
    }

    /// Fetches, normalizes and exports the named tables.
    pub fn export<S: MetadataSource + ?Sized>(&self, tables: &[String], source: &S) -> Export {
        let mut out = Export::default();
        for table in tables {
            match self.observe(table, source) {
                Ok(tree) => {
                    out.document.set(table.clone(), export(&tree));
                }
                Err(err) => {
                    warn!(table = %table, error = %err, "cannot export table");
                    out.failures.push((table.clone(), err));
                }
            }
        }
        out
    }
}

fn apply_table<E: StatementExecutor + ?Sized>(
    table: &str,
    statements: &[ChangeStatement],
    executor: &mut E,
) -> TableStatus {
    for (applied, statement) in statements.iter().enumerate() {
        if let Err(err) = executor.apply(table, statement) {
            warn!(table, error = %err, "statement failed");
            return TableStatus::Failed {
                applied,
                error: err.into(),
            };
        }
    }
    TableStatus::Applied {
        statements: statements.len(),
    }
}
