//! qcheck core
//!
//! Sequences a lint pass and a test pass for `qcheck ci` and decides, for
//! every failure a pass returns, whether it aborts the run or is handed to
//! the operator error channel.
//!
//! - [`intent`]: the `--fix` intent and the per-pass options derived from it
//! - [`failure`]: `Failure` and the propagate/absorb classifier
//! - [`step`]: the child step runner
//! - [`orchestrator`]: the `ci` command itself

pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod failure;
pub mod fakes;
pub mod intent;
pub mod obs;
pub mod orchestrator;
pub mod report;
pub mod step;
pub mod telemetry;

pub use context::{ErrorHandler, Reporter, RequestFlags, RunContext};
pub use diagnostic::{Diagnostic, DiagnosticSource, DiagnosticsReport, Severity};
pub use engine::{LintEngine, TestEngine};
pub use error::{QcheckError, Result};
pub use failure::{classify, Disposition, Failure, FailureClass};
pub use intent::{options_digest, LintOptions, RunIntent, TestOptions};
pub use orchestrator::CiCommand;
pub use report::{CiReport, PhaseRecord, RunState};
pub use step::{run_child_step, Phase, StepResolution};
pub use telemetry::init_tracing;
