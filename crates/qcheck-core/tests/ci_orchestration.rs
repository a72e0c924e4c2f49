//! End-to-end tests for the `ci` command with scripted engines.

use qcheck_core::fakes::{
    RecordingErrorHandler, RecordingReporter, ScriptedLintEngine, ScriptedTestEngine,
};
use qcheck_core::{
    CiCommand, CiReport, Diagnostic, DiagnosticSource, DiagnosticsReport, Failure, Phase,
    RunContext, RunIntent, Severity, StepResolution,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("snapshot store corrupted (marker {0})")]
struct SnapshotStoreCorrupted(u32);

struct Fixture {
    ctx: RunContext,
    reporter: Arc<RecordingReporter>,
    handler: Arc<RecordingErrorHandler>,
    lint: Arc<ScriptedLintEngine>,
    test: Arc<ScriptedTestEngine>,
}

impl Fixture {
    fn new(lint: ScriptedLintEngine, test: ScriptedTestEngine) -> Self {
        let reporter = Arc::new(RecordingReporter::new());
        let handler = Arc::new(RecordingErrorHandler::new());
        let ctx = RunContext::new(reporter.clone(), handler.clone());
        Self {
            ctx,
            reporter,
            handler,
            lint: Arc::new(lint),
            test: Arc::new(test),
        }
    }

    async fn run(&mut self, intent: RunIntent) -> Result<CiReport, Failure> {
        let cmd = CiCommand::new(self.lint.clone(), self.test.clone());
        cmd.run(&mut self.ctx, intent).await
    }
}

fn lint_violations() -> DiagnosticsReport {
    DiagnosticsReport::new(
        DiagnosticSource::Lint,
        vec![
            Diagnostic::new(Severity::Error, "unused variable `x`", DiagnosticSource::Lint)
                .with_code("unused_variables")
                .with_location("src/lib.rs", 3, 9),
        ],
    )
}

/// Check-only run where both passes succeed.
#[tokio::test]
async fn test_check_only_run_succeeds_with_headings_in_order() {
    let mut fx = Fixture::new(ScriptedLintEngine::passing(), ScriptedTestEngine::passing());

    let report = fx
        .run(RunIntent { fix: false })
        .await
        .expect("run should succeed");

    assert_eq!(
        fx.reporter.headings(),
        vec!["Running lint".to_string(), "Running tests".to_string()]
    );
    assert_eq!(report.phases.len(), 2);
    assert!(report
        .phases
        .iter()
        .all(|p| p.resolution == StepResolution::Completed));
    assert_eq!(fx.handler.count(), 0);

    let lint_calls = fx.lint.calls();
    assert_eq!(lint_calls.len(), 1);
    assert!(!lint_calls[0].apply_fixes);

    let test_calls = fx.test.calls();
    assert_eq!(test_calls.len(), 1);
    assert!(test_calls[0].freeze_recorded_outputs);
    assert!(!test_calls[0].update_recorded_outputs);
}

/// Fix run: lint options apply fixes, tests update recorded outputs.
#[tokio::test]
async fn test_fix_run_derives_fix_options() {
    let mut fx = Fixture::new(ScriptedLintEngine::passing(), ScriptedTestEngine::passing());

    fx.run(RunIntent { fix: true }).await.expect("run should succeed");

    assert!(fx.lint.calls()[0].apply_fixes);
    let test = &fx.test.calls()[0];
    assert!(!test.freeze_recorded_outputs);
    assert!(test.update_recorded_outputs);
}

/// Lint diagnostics abort the run before the test heading.
#[tokio::test]
async fn test_lint_diagnostics_abort_after_lint_heading() {
    let report = lint_violations();
    let report_id = report.report_id;
    let mut fx = Fixture::new(
        ScriptedLintEngine::failing_with(Failure::Diagnostics(report)),
        ScriptedTestEngine::passing(),
    );

    let err = fx
        .run(RunIntent { fix: true })
        .await
        .expect_err("run should abort");

    let observed = err.report().expect("diagnostics failure reaches the caller");
    assert_eq!(observed.report_id, report_id);
    assert_eq!(observed.diagnostics[0].code.as_deref(), Some("unused_variables"));

    assert!(fx.test.calls().is_empty(), "test pass must never start");
    assert_eq!(fx.reporter.headings(), vec!["Running lint".to_string()]);
    assert_eq!(fx.handler.count(), 0);
}

/// An empty lint report is handed to the error handler and tests still run.
#[tokio::test]
async fn test_empty_lint_report_is_absorbed_and_tests_run() {
    let report = DiagnosticsReport::empty(DiagnosticSource::Lint);
    let report_id = report.report_id;
    let mut fx = Fixture::new(
        ScriptedLintEngine::failing_with(Failure::Diagnostics(report)),
        ScriptedTestEngine::passing(),
    );

    let result = fx.run(RunIntent::check_only()).await.expect("run should succeed");

    assert_eq!(fx.handler.count(), 1);
    assert_eq!(fx.handler.report_ids(), vec![report_id]);
    assert_eq!(fx.test.calls().len(), 1);
    assert_eq!(result.absorbed_count(), 1);
    assert_eq!(result.phases[0].phase, Phase::Lint);
    assert_eq!(result.phases[0].resolution, StepResolution::Absorbed);
}

/// An internal test failure propagates unchanged and skips the error handler.
#[tokio::test]
async fn test_internal_test_failure_propagates_unchanged() {
    let failure = Failure::Internal(anyhow::Error::new(SnapshotStoreCorrupted(42)));
    let mut fx = Fixture::new(
        ScriptedLintEngine::passing(),
        ScriptedTestEngine::failing_with(failure),
    );

    let err = fx
        .run(RunIntent::check_only())
        .await
        .expect_err("run should abort");

    match err {
        Failure::Internal(cause) => {
            let inner = cause
                .downcast_ref::<SnapshotStoreCorrupted>()
                .expect("cause is not re-wrapped");
            assert_eq!(inner.0, 42);
        }
        Failure::Diagnostics(_) => panic!("internal failure was re-typed"),
    }
    assert_eq!(fx.handler.count(), 0);
    assert_eq!(
        fx.reporter.headings(),
        vec!["Running lint".to_string(), "Running tests".to_string()]
    );
}

/// Test diagnostics fail the run after both headings.
#[tokio::test]
async fn test_test_diagnostics_fail_run() {
    let report = DiagnosticsReport::new(
        DiagnosticSource::Test,
        vec![Diagnostic::new(
            Severity::Error,
            "assertion `left == right` failed",
            DiagnosticSource::Test,
        )],
    );
    let mut fx = Fixture::new(
        ScriptedLintEngine::passing(),
        ScriptedTestEngine::failing_with(Failure::Diagnostics(report)),
    );

    let err = fx.run(RunIntent::check_only()).await.expect_err("run should fail");

    assert_eq!(err.report().map(|r| r.source), Some(DiagnosticSource::Test));
    assert_eq!(fx.handler.count(), 0);
}

/// An internal lint failure aborts before tests.
#[tokio::test]
async fn test_internal_lint_failure_aborts_before_tests() {
    let mut fx = Fixture::new(
        ScriptedLintEngine::failing_with(Failure::internal("lint engine crashed")),
        ScriptedTestEngine::passing(),
    );

    let err = fx.run(RunIntent::fix()).await.expect_err("run should abort");

    assert_eq!(err.to_string(), "lint engine crashed");
    assert!(fx.test.calls().is_empty());
    assert_eq!(fx.handler.count(), 0);
}

/// Both passes absorb: the run still succeeds and both failures are reported.
#[tokio::test]
async fn test_both_passes_absorbed() {
    let mut fx = Fixture::new(
        ScriptedLintEngine::failing_with(Failure::Diagnostics(DiagnosticsReport::empty(
            DiagnosticSource::Lint,
        ))),
        ScriptedTestEngine::failing_with(Failure::Diagnostics(DiagnosticsReport::empty(
            DiagnosticSource::Test,
        ))),
    );

    let report = fx.run(RunIntent::check_only()).await.expect("run should succeed");

    assert_eq!(report.absorbed_count(), 2);
    assert_eq!(fx.handler.count(), 2);
}

/// The report can be written to disk as JSON and read back.
#[tokio::test]
async fn test_report_written_as_json() {
    let mut fx = Fixture::new(ScriptedLintEngine::passing(), ScriptedTestEngine::passing());
    let report = fx.run(RunIntent::fix()).await.expect("run should succeed");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ci-report.json");
    report.write_json(&path).expect("write report");

    let bytes = std::fs::read(&path).expect("read report");
    let loaded: CiReport = serde_json::from_slice(&bytes).expect("parse report");
    assert_eq!(loaded.run_id, report.run_id);
    assert!(loaded.intent.fix);
    assert_eq!(loaded.options_digest, report.options_digest);
}
