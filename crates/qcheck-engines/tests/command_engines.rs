//! Integration tests for the command-backed engines using shell commands.

use qcheck_core::fakes::{RecordingErrorHandler, RecordingReporter};
use qcheck_core::{
    CiCommand, DiagnosticSource, Failure, LintEngine, LintOptions, RunContext, RunIntent,
    StepResolution, TestEngine, TestOptions,
};
use qcheck_engines::{
    CommandLintEngine, CommandTestEngine, LintConfig, OutputFormat, StageConfig, StageKind,
    TestConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

fn context() -> (RunContext, Arc<RecordingReporter>, Arc<RecordingErrorHandler>) {
    let reporter = Arc::new(RecordingReporter::new());
    let handler = Arc::new(RecordingErrorHandler::new());
    let ctx = RunContext::new(reporter.clone(), handler.clone());
    (ctx, reporter, handler)
}

fn lint_engine(stages: Vec<StageConfig>, work_dir: Option<PathBuf>) -> CommandLintEngine {
    CommandLintEngine::new(LintConfig { stages }, work_dir)
}

fn test_engine(command: Vec<String>) -> CommandTestEngine {
    CommandTestEngine::new(
        TestConfig {
            command,
            ..TestConfig::default()
        },
        None,
    )
}

#[tokio::test]
async fn test_passing_lint_stage() {
    let (ctx, reporter, _) = context();
    let engine = lint_engine(
        vec![StageConfig::custom("noop", StageKind::Lint, vec!["true".to_string()])],
        None,
    );

    engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect("lint should pass");

    assert_eq!(reporter.lines(), vec!["noop: true".to_string()]);
}

#[tokio::test]
async fn test_failing_text_stage_yields_diagnostics() {
    let (ctx, _, _) = context();
    let engine = lint_engine(
        vec![
            StageConfig::custom("ok", StageKind::Format, vec!["true".to_string()]),
            StageConfig::custom(
                "lint",
                StageKind::Lint,
                sh("echo 'error[L001]: forbidden pattern' >&2; echo ' --> src/a.rs:4:2' >&2; exit 1"),
            ),
        ],
        None,
    );

    let err = engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("lint should fail");

    let report = err.report().expect("diagnostics failure");
    assert_eq!(report.source, DiagnosticSource::Lint);
    assert_eq!(report.len(), 1);
    assert_eq!(report.diagnostics[0].code.as_deref(), Some("L001"));
    assert_eq!(report.diagnostics[0].location().as_deref(), Some("src/a.rs:4:2"));
    assert_eq!(report.summary.as_deref(), Some("failed stage(s): lint"));
}

#[tokio::test]
async fn test_fix_command_runs_before_check() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stage = StageConfig::custom("fmt", StageKind::Format, sh("test -f formatted"))
        .with_fix_command(sh("touch formatted"));
    let engine = lint_engine(vec![stage], Some(dir.path().to_path_buf()));
    let (ctx, _, _) = context();

    let err = engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("check-only must not run the fix");
    assert!(err.report().is_some_and(|r| r.has_diagnostics()));
    assert!(!dir.path().join("formatted").exists());

    engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::fix()))
        .await
        .expect("fix then check should pass");
    assert!(dir.path().join("formatted").exists());
}

#[tokio::test]
async fn test_missing_binary_is_internal() {
    let (ctx, _, _) = context();
    let engine = lint_engine(
        vec![StageConfig::custom(
            "ghost",
            StageKind::Lint,
            vec!["qcheck-no-such-binary-7f3a".to_string()],
        )],
        None,
    );

    let err = engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("spawn should fail");

    assert!(matches!(err, Failure::Internal(_)));
    assert!(err.to_string().contains("failed to spawn"));
}

#[tokio::test]
async fn test_timeout_is_internal() {
    let (ctx, _, _) = context();
    let engine = lint_engine(
        vec![StageConfig::custom("slow", StageKind::Lint, sh("sleep 5")).with_timeout(1)],
        None,
    );

    let err = engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("should time out");

    assert!(matches!(err, Failure::Internal(_)));
}

#[tokio::test]
async fn test_json_stage_failing_with_empty_array() {
    let (ctx, _, _) = context();
    let engine = lint_engine(
        vec![StageConfig::custom("eslint", StageKind::Lint, sh("echo '[]'; exit 1"))
            .with_output(OutputFormat::Json)],
        None,
    );

    let err = engine
        .run_lint(&ctx, &LintOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("stage failed");

    let report = err.report().expect("diagnostics failure");
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_failing_tests_yield_diagnostics() {
    let (ctx, _, _) = context();
    let engine = test_engine(sh("echo 'test parser::rejects_garbage ... FAILED'; exit 101"));

    let err = engine
        .run_tests(&ctx, &TestOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("tests should fail");

    let report = err.report().expect("diagnostics failure");
    assert_eq!(report.source, DiagnosticSource::Test);
    assert_eq!(report.diagnostics[0].code.as_deref(), Some("parser::rejects_garbage"));
    assert_eq!(report.summary.as_deref(), Some("test exited with code 101"));
}

#[tokio::test]
async fn test_snapshot_env_follows_intent() {
    let (ctx, _, _) = context();
    let engine = test_engine(sh("test \"$INSTA_UPDATE\" = always"));

    engine
        .run_tests(&ctx, &TestOptions::from_intent(RunIntent::fix()))
        .await
        .expect("fix mode updates snapshots");

    let err = engine
        .run_tests(&ctx, &TestOptions::from_intent(RunIntent::check_only()))
        .await
        .expect_err("check mode freezes snapshots");
    assert!(err.report().is_some());
}

#[tokio::test]
async fn test_filter_is_appended() {
    let (ctx, _, _) = context();
    let engine = test_engine(sh("test \"$0\" = smoke"));
    let mut options = TestOptions::from_intent(RunIntent::check_only());
    options.filter = Some("smoke".to_string());

    engine.run_tests(&ctx, &options).await.expect("filter reaches the command");
}

#[tokio::test]
async fn test_coverage_without_command_is_internal() {
    let (ctx, _, _) = context();
    let engine = test_engine(vec!["true".to_string()]);
    let mut options = TestOptions::from_intent(RunIntent::check_only());
    options.collect_coverage = true;

    let err = engine.run_tests(&ctx, &options).await.expect_err("coverage not configured");
    assert!(matches!(err, Failure::Internal(_)));
}

/// Full `ci` run: an empty JSON lint report is absorbed and tests still run.
#[tokio::test]
async fn test_ci_absorbs_empty_lint_report() {
    let (mut ctx, reporter, handler) = context();
    let lint = lint_engine(
        vec![StageConfig::custom("eslint", StageKind::Lint, sh("echo '[]'; exit 1"))
            .with_output(OutputFormat::Json)],
        None,
    );
    let cmd = CiCommand::new(Arc::new(lint), Arc::new(test_engine(vec!["true".to_string()])));

    let report = cmd
        .run(&mut ctx, RunIntent::check_only())
        .await
        .expect("absorbed failure does not fail the run");

    assert_eq!(report.phases[0].resolution, StepResolution::Absorbed);
    assert_eq!(report.phases[1].resolution, StepResolution::Completed);
    assert_eq!(handler.count(), 1);
    assert_eq!(
        reporter.headings(),
        vec!["Running lint".to_string(), "Running tests".to_string()]
    );
}

/// Full `ci` run: lint violations stop the run before the test command.
#[tokio::test]
async fn test_ci_lint_violation_skips_tests() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("tests-ran");
    let (mut ctx, reporter, _) = context();
    let lint = lint_engine(
        vec![StageConfig::custom(
            "clippy",
            StageKind::Lint,
            sh("echo 'warning: unused import' >&2; exit 1"),
        )],
        None,
    );
    let test = test_engine(sh(&format!("touch {}", marker.display())));
    let cmd = CiCommand::new(Arc::new(lint), Arc::new(test));

    let err = cmd
        .run(&mut ctx, RunIntent::fix())
        .await
        .expect_err("lint violations abort");

    assert!(err.report().is_some_and(|r| r.has_diagnostics()));
    assert!(!marker.exists());
    assert_eq!(reporter.headings(), vec!["Running lint".to_string()]);
}
