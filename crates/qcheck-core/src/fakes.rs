//! In-memory collaborators (testing only)
//!
//! Provides `RecordingReporter`, `RecordingErrorHandler`, `ScriptedLintEngine`
//! and `ScriptedTestEngine` that satisfy the collaborator traits without
//! spawning any external tools.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::{ErrorHandler, Reporter, RunContext};
use crate::engine::{LintEngine, TestEngine};
use crate::failure::Failure;
use crate::intent::{LintOptions, TestOptions};

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps every heading and line in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    headings: Mutex<Vec<String>>,
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headings(&self) -> Vec<String> {
        self.headings.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn heading(&self, text: &str) {
        self.headings.lock().unwrap().push(text.to_string());
    }

    fn info(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn success(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// RecordingErrorHandler
// ---------------------------------------------------------------------------

/// Error handler that stores every failure it is given.
#[derive(Debug, Default)]
pub struct RecordingErrorHandler {
    failures: Mutex<Vec<Failure>>,
}

impl RecordingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }

    /// Report ids of the diagnostic failures handled so far.
    pub fn report_ids(&self) -> Vec<Uuid> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .filter_map(|f| f.report().map(|r| r.report_id))
            .collect()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle_request_error(&self, _ctx: &RunContext, failure: Failure) {
        self.failures.lock().unwrap().push(failure);
    }
}

// ---------------------------------------------------------------------------
// Scripted engines
// ---------------------------------------------------------------------------

/// Lint engine that returns a pre-set outcome and records its calls.
///
/// The scripted failure is returned on the first call only.
#[derive(Debug, Default)]
pub struct ScriptedLintEngine {
    failure: Mutex<Option<Failure>>,
    calls: Mutex<Vec<LintOptions>>,
    seen_verbose: Mutex<Vec<bool>>,
}

impl ScriptedLintEngine {
    pub fn passing() -> Self {
        Self::default()
    }

    pub fn failing_with(failure: Failure) -> Self {
        Self {
            failure: Mutex::new(Some(failure)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LintOptions> {
        self.calls.lock().unwrap().clone()
    }

    /// `verbose_diagnostics` as observed on the context at each call.
    pub fn seen_verbose(&self) -> Vec<bool> {
        self.seen_verbose.lock().unwrap().clone()
    }
}

#[async_trait]
impl LintEngine for ScriptedLintEngine {
    async fn run_lint(&self, ctx: &RunContext, options: &LintOptions) -> Result<(), Failure> {
        self.calls.lock().unwrap().push(options.clone());
        self.seen_verbose
            .lock()
            .unwrap()
            .push(ctx.flags().verbose_diagnostics);
        match self.failure.lock().unwrap().take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Test engine that returns a pre-set outcome and records its calls.
#[derive(Debug, Default)]
pub struct ScriptedTestEngine {
    failure: Mutex<Option<Failure>>,
    calls: Mutex<Vec<TestOptions>>,
}

impl ScriptedTestEngine {
    pub fn passing() -> Self {
        Self::default()
    }

    pub fn failing_with(failure: Failure) -> Self {
        Self {
            failure: Mutex::new(Some(failure)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TestOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestEngine for ScriptedTestEngine {
    async fn run_tests(&self, _ctx: &RunContext, options: &TestOptions) -> Result<(), Failure> {
        self.calls.lock().unwrap().push(options.clone());
        match self.failure.lock().unwrap().take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}
