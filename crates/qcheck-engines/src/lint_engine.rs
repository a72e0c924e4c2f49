//! Lint engine that runs configured format/lint commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use qcheck_core::{DiagnosticSource, Failure, LintEngine, LintOptions, RunContext};
use tracing::{debug, info};

use crate::config::LintConfig;
use crate::diagnostics::{failed_stage_diagnostics, merge_reports, DiagnosticsParserConfig};
use crate::runner::{execute, Invocation};
use crate::stage::{StageConfig, StageKind};

/// Newline-joined `LintOptions::decisions`.
pub const DECISIONS_ENV: &str = "QCHECK_LINT_DECISIONS";

/// `LintOptions::changed`.
pub const CHANGED_SINCE_ENV: &str = "QCHECK_CHANGED_SINCE";

/// Runs every enabled lint stage and merges the diagnostics of the stages
/// that failed into a single report.
#[derive(Debug, Clone)]
pub struct CommandLintEngine {
    config: LintConfig,
    work_dir: Option<PathBuf>,
}

impl CommandLintEngine {
    pub fn new(config: LintConfig, work_dir: Option<PathBuf>) -> Self {
        Self { config, work_dir }
    }

    /// Stages selected for `options`, in configuration order.
    pub fn stages_for<'a>(&'a self, options: &LintOptions) -> Vec<&'a StageConfig> {
        self.config
            .stages
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| !options.format_only || s.kind == StageKind::Format)
            .collect()
    }

    fn invocation(
        &self,
        stage: &StageConfig,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> Invocation {
        Invocation::new(stage.name.clone(), command.to_vec(), stage.timeout_secs)
            .with_env(env.clone())
            .with_work_dir(self.work_dir.clone())
    }
}

/// Environment exported to every lint command.
pub fn lint_env(options: &LintOptions) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    if !options.decisions.is_empty() {
        env.insert(DECISIONS_ENV.to_string(), options.decisions.join("\n"));
    }
    if let Some(changed) = &options.changed {
        env.insert(CHANGED_SINCE_ENV.to_string(), changed.clone());
    }
    env
}

#[async_trait]
impl LintEngine for CommandLintEngine {
    async fn run_lint(&self, ctx: &RunContext, options: &LintOptions) -> Result<(), Failure> {
        let parser = if ctx.flags().verbose_diagnostics {
            DiagnosticsParserConfig::verbose()
        } else {
            DiagnosticsParserConfig::default()
        };
        let env = lint_env(options);
        let source = if options.format_only {
            DiagnosticSource::Format
        } else {
            DiagnosticSource::Lint
        };

        let mut failed_stages = Vec::new();
        let mut diagnostics = Vec::new();

        for stage in self.stages_for(options) {
            if options.apply_fixes {
                if let Some(fix) = &stage.fix_command {
                    let inv = self.invocation(stage, fix, &env);
                    ctx.reporter().info(&format!("{}: {}", stage.name, inv.display_command()));
                    let output = execute(&inv).await?;
                    if !output.passed() {
                        // A fix that fails leaves the check command to report.
                        debug!(
                            stage = %stage.name,
                            exit_code = output.exit_code,
                            "fix command failed"
                        );
                    }
                }
            }

            let inv = self.invocation(stage, &stage.command, &env);
            ctx.reporter().info(&format!("{}: {}", stage.name, inv.display_command()));
            let output = execute(&inv).await?;

            if output.passed() {
                info!(stage = %stage.name, duration_ms = output.duration_ms, "lint stage passed");
                continue;
            }

            info!(stage = %stage.name, exit_code = output.exit_code, "lint stage failed");
            diagnostics.extend(failed_stage_diagnostics(stage, &output, &parser)?);
            failed_stages.push(stage.name.clone());
        }

        if failed_stages.is_empty() {
            Ok(())
        } else {
            Err(Failure::Diagnostics(merge_reports(source, &failed_stages, diagnostics)))
        }
    }
}
