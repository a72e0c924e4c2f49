//! Run state machine and the summary returned by a successful run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::{QcheckError, Result};
use crate::intent::RunIntent;
use crate::step::{Phase, StepResolution};

/// Progress of a `ci` run.
///
/// `LintPhase -> TestPhase -> Done`, with `Aborted` reachable from either
/// phase. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    LintPhase,
    TestPhase,
    Done,
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }

    pub fn can_transition_to(&self, to: RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (RunState::LintPhase, RunState::TestPhase)
                | (RunState::TestPhase, RunState::Done)
                | (_, RunState::Aborted)
        )
    }

    pub fn transition(self, to: RunState) -> Result<RunState> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(QcheckError::InvalidTransition { from: self, to })
        }
    }

    /// The phase being executed in this state, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunState::LintPhase => Some(Phase::Lint),
            RunState::TestPhase => Some(Phase::Test),
            RunState::Done | RunState::Aborted => None,
        }
    }
}

/// Outcome of one phase that did not abort the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub resolution: StepResolution,
    pub duration_ms: u64,
}

/// Summary of a `ci` run that completed without a propagated failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CiReport {
    pub run_id: Uuid,

    pub intent: RunIntent,

    /// SHA-256 of the derived lint and test options.
    pub options_digest: String,

    /// Phase records in execution order.
    pub phases: Vec<PhaseRecord>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Sum of phase durations in milliseconds.
    pub duration_ms: u64,
}

impl CiReport {
    pub fn new(run_id: Uuid, intent: RunIntent, options_digest: String) -> Self {
        Self {
            run_id,
            intent,
            options_digest,
            phases: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, record: PhaseRecord) {
        self.duration_ms += record.duration_ms;
        self.phases.push(record);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Number of phases whose failure was absorbed.
    pub fn absorbed_count(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| p.resolution == StepResolution::Absorbed)
            .count()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
