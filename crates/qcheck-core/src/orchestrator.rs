//! The `ci` command: lint, then test, from a single intent.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::context::RunContext;
use crate::engine::{LintEngine, TestEngine};
use crate::failure::Failure;
use crate::intent::{options_digest, LintOptions, RunIntent, TestOptions};
use crate::obs;
use crate::report::{CiReport, PhaseRecord, RunState};
use crate::step::run_child_step;

/// Sequences the lint pass and the test pass.
pub struct CiCommand {
    lint: Arc<dyn LintEngine>,
    test: Arc<dyn TestEngine>,
}

impl CiCommand {
    pub fn new(lint: Arc<dyn LintEngine>, test: Arc<dyn TestEngine>) -> Self {
        Self { lint, test }
    }

    /// Run lint then tests.
    ///
    /// Sets `verbose_diagnostics` on the context before the first pass and
    /// touches nothing else on it. Returns the failure that aborted the run,
    /// unchanged, if either pass propagated one; the test pass never starts
    /// after the lint pass aborted.
    pub async fn run(&self, ctx: &mut RunContext, intent: RunIntent) -> Result<CiReport, Failure> {
        ctx.update_request_flags(|flags| flags.verbose_diagnostics = true);

        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string());
        self.run_phases(ctx, intent, run_id).instrument(span).await
    }

    async fn run_phases(
        &self,
        ctx: &RunContext,
        intent: RunIntent,
        run_id: Uuid,
    ) -> Result<CiReport, Failure> {
        let lint_options = LintOptions::from_intent(intent);
        let test_options = TestOptions::from_intent(intent);

        let run_id_str = run_id.to_string();
        obs::emit_run_started(&run_id_str, intent.fix);

        let digest = options_digest(&lint_options, &test_options);
        let mut report = CiReport::new(run_id, intent, digest);
        let mut state = RunState::LintPhase;

        let lint = run_phase(ctx, &mut state, || {
            self.lint.run_lint(ctx, &lint_options)
        })
        .await?;
        report.record(lint);
        state = state
            .transition(RunState::TestPhase)
            .map_err(anyhow::Error::from)?;

        let test = run_phase(ctx, &mut state, || {
            self.test.run_tests(ctx, &test_options)
        })
        .await?;
        report.record(test);
        state = state.transition(RunState::Done).map_err(anyhow::Error::from)?;
        debug!(state = ?state, "ci run resolved");

        let report = report.finish();
        obs::emit_run_finished(&run_id_str, report.duration_ms, report.absorbed_count());
        Ok(report)
    }
}

/// Emit the heading for the phase `state` is in, run the step through the
/// child step runner and record how it resolved. Moves `state` to `Aborted`
/// on a propagated failure.
async fn run_phase<F, Fut>(
    ctx: &RunContext,
    state: &mut RunState,
    step: F,
) -> Result<PhaseRecord, Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), Failure>>,
{
    let phase = state
        .phase()
        .ok_or_else(|| Failure::internal(format!("no phase to run in state {:?}", state)))?;
    ctx.reporter().heading(phase.heading());
    obs::emit_phase_started(phase);

    let start = Instant::now();
    match run_child_step(ctx, phase, step).await {
        Ok(resolution) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            obs::emit_phase_resolved(phase, resolution, duration_ms);
            Ok(PhaseRecord {
                phase,
                resolution,
                duration_ms,
            })
        }
        Err(failure) => {
            if let Ok(next) = state.transition(RunState::Aborted) {
                *state = next;
            }
            debug!(state = ?state, phase = phase.as_str(), "ci run aborted");
            Err(failure)
        }
    }
}
