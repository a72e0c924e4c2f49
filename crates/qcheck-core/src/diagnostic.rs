//! Structured, user-presentable diagnostics produced by the lint and test passes.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hint,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Which pass produced a diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSource {
    Format,
    Lint,
    Test,
    Custom,
}

impl DiagnosticSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSource::Format => "format",
            DiagnosticSource::Lint => "lint",
            DiagnosticSource::Test => "test",
            DiagnosticSource::Custom => "custom",
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,

    /// Rule or assertion code (e.g. "clippy::needless_return").
    #[serde(default)]
    pub code: Option<String>,

    /// Human-readable message.
    pub message: String,

    /// Source file path (relative to workspace root).
    #[serde(default)]
    pub file: Option<String>,

    /// Line number (1-indexed).
    #[serde(default)]
    pub line: Option<u32>,

    /// Column number (1-indexed).
    #[serde(default)]
    pub column: Option<u32>,

    /// Which pass produced this diagnostic.
    pub source: DiagnosticSource,

    /// Evidence snippet from the original output.
    #[serde(default)]
    pub evidence: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, source: DiagnosticSource) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            source,
            evidence: None,
        }
    }

    /// Set file location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Set diagnostic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set evidence snippet.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// `file:line:col` when a location is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{}:{}:{}", file, line, col),
            (Some(line), None) => format!("{}:{}", file, line),
            _ => file.to_string(),
        })
    }
}

/// The structured report carried by a diagnostic failure.
///
/// A report may legitimately be empty: an engine can signal a diagnostic
/// failure while having nothing to show. Callers decide what that means via
/// [`crate::failure::classify`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsReport {
    /// Identity of this report, stable across moves.
    pub report_id: Uuid,

    /// Pass that produced the report.
    pub source: DiagnosticSource,

    /// Optional one-line summary from the engine.
    #[serde(default)]
    pub summary: Option<String>,

    /// Diagnostics in the order the engine produced them.
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsReport {
    pub fn new(source: DiagnosticSource, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            source,
            summary: None,
            diagnostics,
        }
    }

    /// A report with no diagnostics.
    pub fn empty(source: DiagnosticSource) -> Self {
        Self::new(source, Vec::new())
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= severity)
            .count()
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.summary {
            Some(summary) => write!(
                f,
                "{} pass reported {} diagnostic(s): {}",
                self.source.as_str(),
                self.diagnostics.len(),
                summary
            ),
            None => write!(
                f,
                "{} pass reported {} diagnostic(s)",
                self.source.as_str(),
                self.diagnostics.len()
            ),
        }
    }
}
