//! Tests for planning and applying across several tables.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    use crate::diff::{ChangeKind, ChangeStatement};
    use crate::reconcile::{
        DryRunExecutor, ExecutionError, PlanOutcome, Reconciler, SnapshotSource, SourceError,
        StatementExecutor, TableError, TableStatus,
    };
    use crate::schema::cassandra_table_schema;
    use crate::typed::SchemaViolation;
    use crate::value::{parse_document, Map};

    /// Records every statement and fails for the listed tables.
    #[derive(Default)]
    struct RecordingExecutor {
        applied: Vec<(String, String)>,
        failing: HashSet<String>,
    }

    impl StatementExecutor for RecordingExecutor {
        fn apply(&mut self, table: &str, statement: &ChangeStatement) -> Result<(), ExecutionError> {
            if self.failing.contains(table) {
                return Err(ExecutionError::new("Unavailable: cannot achieve consistency level ALL"));
            }
            self.applied.push((table.to_string(), statement.to_cql()));
            Ok(())
        }
    }

    fn document(text: &str) -> Map {
        parse_document(text).unwrap()
    }

    fn snapshot(text: &str) -> SnapshotSource {
        SnapshotSource::new(document(text), cassandra_table_schema())
    }

    const OBSERVED: &str = r#"
ks.events:
  id: 5a1c395e-b41f-11e5-9f22-ba0be0483c18
  gc_grace_seconds: 0
  compaction:
    class: org.apache.cassandra.db.compaction.SizeTieredCompactionStrategy
    max_threshold: '32'
    min_threshold: '4'
ks.users:
  comment: users
ks.cache:
  caching: {keys: NONE, rows_per_partition: '0'}
"#;

    #[test]
    fn test_plan_per_table_outcomes() {
        let desired = document(
            r#"
ks.events:
  compaction: {class: TimeWindowCompactionStrategy, compaction_window_size: 1}
ks.users:
  comment: users
ks.missing:
  comment: nobody home
ks.cache:
  caching: {keys: ALL, rows_per_partition: 100}
"#,
        );

        let plan = Reconciler::default().plan(&desired, &snapshot(OBSERVED));
        let tables: Vec<_> = plan.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(tables, vec!["ks.events", "ks.users", "ks.missing", "ks.cache"]);

        match plan.tables[0].outcome {
            PlanOutcome::Changes { ref changes, ref statements } => {
                let kinds: Vec<_> = changes.iter().map(|c| (c.property(), c.kind)).collect();
                assert_eq!(
                    kinds,
                    vec![("compaction", ChangeKind::Modify), ("gc_grace_seconds", ChangeKind::Remove)]
                );
                assert_eq!(statements.len(), 1);
                assert_eq!(
                    statements[0].to_cql(),
                    "ALTER TABLE ks.events WITH compaction = {'class': 'TimeWindowCompactionStrategy', \
                     'max_threshold': '32', 'min_threshold': '4', 'compaction_window_size': '1'} \
                     AND gc_grace_seconds = 864000;"
                );
            }
            ref other => panic!("unexpected outcome for ks.events: {:?}", other),
        }
        assert!(matches!(plan.tables[1].outcome, PlanOutcome::Unchanged));
        match plan.tables[2].outcome {
            PlanOutcome::Failed(ref err) => assert!(err.is_not_found()),
            ref other => panic!("unexpected outcome for ks.missing: {:?}", other),
        }
        assert_eq!(plan.statements().count(), 2);
        assert_eq!(plan.changes().count(), 3);
        assert_eq!(plan.failures().count(), 1);
        assert!(!plan.is_converged());
    }

    #[test]
    fn test_invalid_desired_does_not_block_others() {
        let desired = document(
            r#"
ks.users:
  coment: typo
ks.cache:
  caching: {keys: ALL}
"#,
        );

        let plan = Reconciler::default().plan(&desired, &snapshot(OBSERVED));
        match plan.tables[0].outcome {
            PlanOutcome::Failed(TableError::InvalidDesired(ref violations)) => {
                assert_eq!(violations.table(), Some("ks.users"));
                assert!(matches!(
                    violations.iter().next(),
                    Some(SchemaViolation::UnknownProperty { .. })
                ));
            }
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(plan.tables[1].outcome, PlanOutcome::Changes { .. }));
    }

    #[test]
    fn test_apply_isolates_execution_failures() {
        let desired = document(
            r#"
ks.events: {}
ks.users: {comment: renamed}
ks.cache: {}
ks.missing: {}
"#,
        );
        let reconciler = Reconciler::default();
        let plan = reconciler.plan(&desired, &snapshot(OBSERVED));

        let mut executor = RecordingExecutor::default();
        executor.failing.insert("ks.users".to_string());
        let report = reconciler.apply(&plan, &mut executor);

        let applied_tables: Vec<_> = executor.applied.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(applied_tables, vec!["ks.events", "ks.cache"]);

        assert!(matches!(report.tables[0].status, TableStatus::Applied { statements: 1 }));
        match report.tables[1].status {
            TableStatus::Failed { applied: 0, error: TableError::Execution(ref err) } => {
                assert_eq!(err.detail, "Unavailable: cannot achieve consistency level ALL");
            }
            ref other => panic!("unexpected status: {:?}", other),
        }
        assert!(matches!(report.tables[2].status, TableStatus::Applied { .. }));
        assert!(matches!(report.tables[3].status, TableStatus::Failed { .. }));

        assert_eq!(report.applied(), 2);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_success());
        assert!(report.to_string().ends_with("2 applied, 0 unchanged, 2 failed"));
    }

    #[test]
    fn test_reconcile_converges() {
        let desired = document("ks.users: {comment: users}\n");
        let reconciler = Reconciler::default();
        let source = snapshot(OBSERVED);

        let plan = reconciler.plan(&desired, &source);
        assert!(plan.is_converged());

        let mut out = DryRunExecutor::new(Vec::new());
        let report = reconciler.reconcile(&desired, &source, &mut out);
        assert!(report.is_success());
        assert_eq!(report.unchanged(), 1);
        assert_eq!(out.applied(), 0);
    }

    #[test]
    fn test_export_then_plan_is_noop() {
        let reconciler = Reconciler::default();
        let source = snapshot(OBSERVED);
        let tables = source.tables();

        let exported = reconciler.export(&tables, &source);
        assert!(exported.failures.is_empty());
        assert_eq!(exported.document.len(), 3);

        let plan = reconciler.plan(&exported.document, &source);
        assert!(plan.is_converged(), "plan after export: {:?}", plan);
    }

    #[test]
    fn test_export_reports_missing_tables() {
        let reconciler = Reconciler::default();
        let exported = reconciler.export(
            &["ks.users".to_string(), "ks.gone".to_string()],
            &snapshot(OBSERVED),
        );

        assert!(exported.document.has("ks.users"));
        assert_eq!(exported.failures.len(), 1);
        assert_eq!(exported.failures[0].0, "ks.gone");
        assert_eq!(
            exported.failures[0].1,
            TableError::Source(SourceError::not_found("ks.gone"))
        );
    }

    #[test]
    fn test_invalid_observed_reported() {
        let source = snapshot("ks.odd:\n  gc_grace_seconds: forever\n");
        let plan = Reconciler::default().plan(&document("ks.odd: {}\n"), &source);
        assert!(matches!(
            plan.tables[0].outcome,
            PlanOutcome::Failed(TableError::InvalidObserved(_))
        ));
    }

    #[test]
    fn test_validate_lists_failing_tables() {
        let desired = document("ok: {comment: fine}\nbad: {cdc: perhaps}\n");
        let errors = Reconciler::default().validate(&desired);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].table(), Some("bad"));
    }
}
