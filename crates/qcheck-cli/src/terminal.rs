//! Terminal output: reporter, diagnostics printer and the operator channel.

use qcheck_core::{
    Diagnostic, DiagnosticsReport, ErrorHandler, Failure, Reporter, RunContext, Severity,
};
use tracing::error;

/// Diagnostics shown when verbose output is off.
const TRUNCATED_DIAGNOSTICS: usize = 10;

/// Writes headings and progress lines to stdout.
#[derive(Debug, Default)]
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn heading(&self, text: &str) {
        println!("\n▶ {}", text);
    }

    fn info(&self, text: &str) {
        println!("  {}", text);
    }

    fn success(&self, text: &str) {
        println!("✓ {}", text);
    }
}

/// Sends absorbed failures to the log instead of failing the run.
#[derive(Debug, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle_request_error(&self, ctx: &RunContext, failure: Failure) {
        match &failure {
            Failure::Diagnostics(report) => error!(
                event = "ci.request_error",
                report_id = %report.report_id,
                source = %report.source.as_str(),
                summary = report.summary.as_deref().unwrap_or(""),
                verbose = ctx.flags().verbose_diagnostics,
                "pass failed without diagnostics"
            ),
            Failure::Internal(err) => error!(
                event = "ci.request_error",
                error = %err,
                "pass failed with an internal error"
            ),
        }
    }
}

fn render_diagnostic(diag: &Diagnostic, verbose: bool) -> String {
    let mut line = String::from("  ");
    line.push_str(diag.severity.as_str());
    if let Some(code) = &diag.code {
        line.push_str(&format!("[{}]", code));
    }
    if let Some(location) = diag.location() {
        line.push_str(&format!(" {}", location));
    }
    line.push_str(&format!(": {}\n", diag.message));
    if verbose {
        if let Some(evidence) = &diag.evidence {
            for ev in evidence.lines() {
                line.push_str(&format!("      | {}\n", ev));
            }
        }
    }
    line
}

/// Render a propagated diagnostics report for the terminal.
pub fn render_diagnostics(report: &DiagnosticsReport, verbose: bool) -> String {
    let mut out = format!(
        "✗ {} ({} error(s))\n",
        report,
        report.count_at_least(Severity::Error)
    );
    let shown = if verbose {
        report.diagnostics.len()
    } else {
        report.diagnostics.len().min(TRUNCATED_DIAGNOSTICS)
    };
    for diag in &report.diagnostics[..shown] {
        out.push_str(&render_diagnostic(diag, verbose));
    }
    let hidden = report.diagnostics.len() - shown;
    if hidden > 0 {
        out.push_str(&format!("  ... and {} more\n", hidden));
    }
    out
}
