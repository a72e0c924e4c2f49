//! Structured observability hooks for the `ci` run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via `run_span`
//! - Emission functions for lifecycle events: start, phase start/resolve,
//!   absorbed failure, abort, finish
//!
//! Events are emitted at `info!` level except for absorbed failures (`warn!`)
//! and aborts (`error!`). Set `RUST_LOG` to filter.

use tracing::{error, info, warn};

use crate::failure::FailureClass;
use crate::step::{Phase, StepResolution};

/// Span tagging everything logged during one run with its `run_id`.
///
/// # Example
///
/// ```ignore
/// async { /* ... */ }.instrument(run_span("3f0c...")).await
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("qcheck.ci", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, fix: bool) {
    info!(event = "ci.started", run_id = %run_id, fix = fix);
}

pub fn emit_phase_started(phase: Phase) {
    info!(event = "ci.phase_started", phase = %phase.as_str());
}

pub fn emit_phase_resolved(phase: Phase, resolution: StepResolution, duration_ms: u64) {
    info!(
        event = "ci.phase_resolved",
        phase = %phase.as_str(),
        resolution = %resolution.as_str(),
        duration_ms = duration_ms,
    );
}

/// Emit event: a failure was absorbed and handed to the error handler.
pub fn emit_failure_absorbed(phase: Phase, class: FailureClass) {
    warn!(
        event = "ci.failure_absorbed",
        phase = %phase.as_str(),
        class = %class.as_str(),
    );
}

/// Emit event: a phase propagated a failure and the run aborted.
pub fn emit_run_aborted(phase: Phase, class: FailureClass, error: &dyn std::fmt::Display) {
    error!(
        event = "ci.aborted",
        phase = %phase.as_str(),
        class = %class.as_str(),
        error = %error,
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, absorbed: usize) {
    info!(
        event = "ci.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        absorbed = absorbed,
    );
}
