//! Turns stage output into diagnostics.
//!
//! Text output is scanned for rustc/clippy headers (`error[E0425]: ...`)
//! with their `--> file:line:col` locations, libtest `... FAILED` lines and
//! rustfmt `Diff in` hunks. A failing stage whose text output matches none of
//! these still yields one diagnostic, so a non-zero exit is never silent.
//!
//! JSON output is a diagnostics array filtered by the same severity and count
//! limits; a JSON stage may fail with an empty array.

use std::sync::OnceLock;

use qcheck_core::{Diagnostic, DiagnosticSource, DiagnosticsReport, Failure, Severity};
use regex::Regex;

use crate::runner::StageOutput;
use crate::stage::{OutputFormat, StageConfig};

/// Configuration for the diagnostics parser.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsParserConfig {
    /// Maximum number of diagnostics to retain per stage.
    pub max_per_stage: usize,

    /// Minimum severity to include.
    pub min_severity: Severity,
}

impl Default for DiagnosticsParserConfig {
    fn default() -> Self {
        Self {
            max_per_stage: 100,
            min_severity: Severity::Warning,
        }
    }
}

impl DiagnosticsParserConfig {
    /// Keep every diagnostic, including hints.
    pub fn verbose() -> Self {
        Self {
            max_per_stage: usize::MAX,
            min_severity: Severity::Hint,
        }
    }
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<sev>error|warning|help|note)(\[(?P<code>[^\]]+)\])?: (?P<msg>.+)$")
            .expect("valid regex")
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*--> (?P<file>[^:]+):(?P<line>\d+):(?P<col>\d+)").expect("valid regex")
    })
}

fn failed_test_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^test (?P<name>\S+) \.\.\. FAILED$").expect("valid regex"))
}

fn fmt_diff_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Diff in (?P<file>.+?) at line (?P<line>\d+):?$").expect("valid regex")
    })
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(aborting due to|could not compile|\d+ warnings? emitted|build failed|test failed",
            r"|`[^`]+` \(.+\) generated \d+ warnings?)",
        ))
        .expect("valid regex")
    })
}

fn severity_of(label: &str) -> Severity {
    match label {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        _ => Severity::Hint,
    }
}

/// Parse human-oriented output into diagnostics.
pub fn parse_text_output(
    text: &str,
    source: DiagnosticSource,
    config: &DiagnosticsParserConfig,
) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    // Index of the last header diagnostic still waiting for a location.
    let mut pending: Option<usize> = None;

    for line in text.lines() {
        let trimmed = line.trim_end();

        if let Some(caps) = header_re().captures(trimmed) {
            let msg = &caps["msg"];
            if summary_re().is_match(msg) {
                pending = None;
                continue;
            }
            let mut diag = Diagnostic::new(severity_of(&caps["sev"]), msg, source);
            if let Some(code) = caps.name("code") {
                diag = diag.with_code(code.as_str());
            }
            diagnostics.push(diag);
            pending = Some(diagnostics.len() - 1);
            continue;
        }

        if let Some(caps) = location_re().captures(trimmed) {
            if let Some(idx) = pending.take() {
                let line_no = caps["line"].parse().unwrap_or(0);
                let col = caps["col"].parse().unwrap_or(0);
                let diag = diagnostics[idx]
                    .clone()
                    .with_location(&caps["file"], line_no, col);
                diagnostics[idx] = diag;
            }
            continue;
        }

        if let Some(caps) = failed_test_re().captures(trimmed) {
            let name = &caps["name"];
            diagnostics.push(
                Diagnostic::new(Severity::Error, format!("test {} failed", name), source)
                    .with_code(name),
            );
            pending = None;
            continue;
        }

        if let Some(caps) = fmt_diff_re().captures(trimmed) {
            let line_no = caps["line"].parse().unwrap_or(0);
            diagnostics.push(
                Diagnostic::new(Severity::Error, "file is not formatted", source)
                    .with_location(&caps["file"], line_no, 1)
                    .with_evidence(trimmed),
            );
            pending = None;
        }
    }

    diagnostics.retain(|d| d.severity >= config.min_severity);
    diagnostics.truncate(config.max_per_stage);
    diagnostics
}

/// Parse a JSON diagnostics array.
pub fn parse_json_output(stdout: &str) -> Result<Vec<Diagnostic>, serde_json::Error> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

/// Diagnostics for a stage that exited unsuccessfully.
///
/// Returns `Err` when the stage promised JSON and produced something else.
pub fn failed_stage_diagnostics(
    stage: &StageConfig,
    output: &StageOutput,
    config: &DiagnosticsParserConfig,
) -> Result<Vec<Diagnostic>, Failure> {
    let source = stage.kind.source();
    match stage.output {
        OutputFormat::Json => {
            let mut diagnostics = parse_json_output(&output.stdout).map_err(|e| {
                Failure::internal(format!(
                    "stage '{}' produced invalid diagnostics JSON: {}",
                    stage.name, e
                ))
            })?;
            diagnostics.retain(|d| d.severity >= config.min_severity);
            diagnostics.truncate(config.max_per_stage);
            Ok(diagnostics)
        }
        OutputFormat::Text => {
            let combined = output.combined();
            let mut diagnostics = parse_text_output(&combined, source, config);
            if diagnostics.is_empty() {
                diagnostics.push(fallback_diagnostic(stage, output, &combined));
            }
            Ok(diagnostics)
        }
    }
}

fn fallback_diagnostic(stage: &StageConfig, output: &StageOutput, combined: &str) -> Diagnostic {
    let source = stage.kind.source();
    let message = combined
        .lines()
        .find(|l| l.contains("error") || l.contains("FAILED") || l.contains("panicked"))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| {
            format!(
                "stage '{}' failed with exit code {}",
                stage.name, output.exit_code
            )
        });
    let diag = Diagnostic::new(Severity::Error, message, source).with_code(stage.name.clone());
    match last_lines(combined, 20) {
        Some(tail) => diag.with_evidence(tail),
        None => diag,
    }
}

fn last_lines(text: &str, n: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(n);
    Some(lines[start..].join("\n"))
}

/// Merge the diagnostics of several failed stages into one report.
pub fn merge_reports(
    source: DiagnosticSource,
    failed_stages: &[String],
    diagnostics: Vec<Diagnostic>,
) -> DiagnosticsReport {
    DiagnosticsReport::new(source, diagnostics)
        .with_summary(format!("failed stage(s): {}", failed_stages.join(", ")))
}
