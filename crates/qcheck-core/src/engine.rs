//! Traits for the lint and test engines driven by the orchestrator.

use async_trait::async_trait;

use crate::context::RunContext;
use crate::failure::Failure;
use crate::intent::{LintOptions, TestOptions};

/// Lint/format backend.
#[async_trait]
pub trait LintEngine: Send + Sync {
    /// Run the lint pass. Violations are returned as `Failure::Diagnostics`.
    async fn run_lint(&self, ctx: &RunContext, options: &LintOptions) -> Result<(), Failure>;
}

/// Test backend.
#[async_trait]
pub trait TestEngine: Send + Sync {
    /// Run the test pass. Failing tests are returned as `Failure::Diagnostics`.
    async fn run_tests(&self, ctx: &RunContext, options: &TestOptions) -> Result<(), Failure>;
}
