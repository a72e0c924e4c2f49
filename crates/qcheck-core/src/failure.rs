//! Phase failures and the propagate/absorb classification.
//!
//! Every engine call returns `Result<(), Failure>`. The variant is chosen by
//! the engine at the point the failure is created; [`classify`] only reads
//! it back:
//!
//! | failure                              | class                                 | disposition |
//! |--------------------------------------|---------------------------------------|-------------|
//! | `Diagnostics` with diagnostics       | `DiagnosticFailure { true }`          | propagate   |
//! | `Diagnostics` with an empty report   | `DiagnosticFailure { false }`         | absorb      |
//! | `Internal`                           | `OpaqueFailure`                       | propagate   |

use serde::{Deserialize, Serialize};

use crate::diagnostic::DiagnosticsReport;

/// A failure raised by a lint or test pass.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// A structured, user-presentable failure.
    #[error("{0}")]
    Diagnostics(DiagnosticsReport),

    /// Anything else: a programming or environment error.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Failure {
    /// Build an internal failure from any displayable message.
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Failure::Internal(anyhow::anyhow!("{}", msg))
    }

    /// The diagnostics report, when this is a diagnostic failure.
    pub fn report(&self) -> Option<&DiagnosticsReport> {
        match self {
            Failure::Diagnostics(report) => Some(report),
            Failure::Internal(_) => None,
        }
    }

    pub fn class(&self) -> FailureClass {
        classify(self)
    }
}

impl From<DiagnosticsReport> for Failure {
    fn from(report: DiagnosticsReport) -> Self {
        Failure::Diagnostics(report)
    }
}

/// Category of a caught failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum FailureClass {
    DiagnosticFailure { has_diagnostics: bool },
    OpaqueFailure,
}

/// What the child step runner does with a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Return the failure to the caller; the run aborts.
    Propagate,
    /// Hand the failure to the context's error handler and continue.
    Absorb,
}

impl FailureClass {
    pub fn disposition(&self) -> Disposition {
        match self {
            FailureClass::DiagnosticFailure {
                has_diagnostics: true,
            } => Disposition::Propagate,
            // Empty report: an engine signalled failure with nothing to show.
            FailureClass::DiagnosticFailure {
                has_diagnostics: false,
            } => Disposition::Absorb,
            FailureClass::OpaqueFailure => Disposition::Propagate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::DiagnosticFailure {
                has_diagnostics: true,
            } => "diagnostics",
            FailureClass::DiagnosticFailure {
                has_diagnostics: false,
            } => "empty_diagnostics",
            FailureClass::OpaqueFailure => "opaque",
        }
    }
}

/// Classify a failure.
pub fn classify(failure: &Failure) -> FailureClass {
    match failure {
        Failure::Diagnostics(report) => FailureClass::DiagnosticFailure {
            has_diagnostics: report.has_diagnostics(),
        },
        Failure::Internal(_) => FailureClass::OpaqueFailure,
    }
}
