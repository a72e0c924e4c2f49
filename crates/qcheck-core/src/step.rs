//! Child step runner: runs one pass and applies the failure policy.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::context::RunContext;
use crate::failure::{Disposition, Failure};
use crate::obs;

/// One of the two sequential passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lint,
    Test,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lint => "lint",
            Phase::Test => "test",
        }
    }

    /// Reporter heading printed before the phase starts.
    pub fn heading(&self) -> &'static str {
        match self {
            Phase::Lint => "Running lint",
            Phase::Test => "Running tests",
        }
    }
}

/// How a step that did not abort the run was resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepResolution {
    /// The step returned normally.
    Completed,
    /// The step failed with an empty diagnostics report, which was handed to
    /// the error handler.
    Absorbed,
}

impl StepResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepResolution::Completed => "completed",
            StepResolution::Absorbed => "absorbed",
        }
    }
}

/// Run `step` and classify any failure it returns.
///
/// Propagated failures are returned as the same value the step produced.
/// Absorbed failures are passed to [`RunContext::handle_request_error`]
/// exactly once and the step counts as resolved.
pub async fn run_child_step<F, Fut>(
    ctx: &RunContext,
    phase: Phase,
    step: F,
) -> Result<StepResolution, Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), Failure>>,
{
    let failure = match step().await {
        Ok(()) => return Ok(StepResolution::Completed),
        Err(failure) => failure,
    };

    let class = failure.class();
    match class.disposition() {
        Disposition::Propagate => {
            obs::emit_run_aborted(phase, class, &failure);
            Err(failure)
        }
        Disposition::Absorb => {
            obs::emit_failure_absorbed(phase, class);
            ctx.handle_request_error(failure);
            Ok(StepResolution::Absorbed)
        }
    }
}
