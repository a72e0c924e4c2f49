//! Test engine that runs the configured test command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use qcheck_core::{DiagnosticsReport, Failure, RunContext, TestEngine, TestOptions};
use tracing::info;

use crate::config::TestConfig;
use crate::diagnostics::{failed_stage_diagnostics, DiagnosticsParserConfig};
use crate::runner::{execute, Invocation};

pub const ALLOW_FOCUSED_ENV: &str = "QCHECK_ALLOW_FOCUSED";
pub const SHOW_FULL_COVERAGE_ENV: &str = "QCHECK_SHOW_FULL_COVERAGE";
pub const TEST_THREADS_ENV: &str = "RUST_TEST_THREADS";

#[derive(Debug, Clone)]
pub struct CommandTestEngine {
    config: TestConfig,
    work_dir: Option<PathBuf>,
}

impl CommandTestEngine {
    pub fn new(config: TestConfig, work_dir: Option<PathBuf>) -> Self {
        Self { config, work_dir }
    }

    /// Environment exported to the test command.
    pub fn test_env(&self, options: &TestOptions) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if options.update_recorded_outputs {
            env.insert(self.config.snapshot_env.clone(), "always".to_string());
        } else if options.freeze_recorded_outputs {
            env.insert(self.config.snapshot_env.clone(), "no".to_string());
        }
        if options.run_synchronously {
            env.insert(TEST_THREADS_ENV.to_string(), "1".to_string());
        }
        if options.allow_focused_tests {
            env.insert(ALLOW_FOCUSED_ENV.to_string(), "1".to_string());
        }
        if options.show_full_coverage {
            env.insert(SHOW_FULL_COVERAGE_ENV.to_string(), "1".to_string());
        }
        env
    }
}

#[async_trait]
impl TestEngine for CommandTestEngine {
    async fn run_tests(&self, ctx: &RunContext, options: &TestOptions) -> Result<(), Failure> {
        let stage = self.config.stage(options.collect_coverage).ok_or_else(|| {
            Failure::internal("coverage requested but no test.coverage_command is configured")
        })?;

        let mut command = stage.command.clone();
        if let Some(filter) = &options.filter {
            command.push(filter.clone());
        }

        let inv = Invocation::new(stage.name.clone(), command, stage.timeout_secs)
            .with_env(self.test_env(options))
            .with_work_dir(self.work_dir.clone());
        ctx.reporter().info(&format!("{}: {}", stage.name, inv.display_command()));

        let output = execute(&inv).await?;
        if output.passed() {
            info!(stage = %stage.name, duration_ms = output.duration_ms, "test stage passed");
            return Ok(());
        }

        info!(stage = %stage.name, exit_code = output.exit_code, "test stage failed");
        let parser = if ctx.flags().verbose_diagnostics {
            DiagnosticsParserConfig::verbose()
        } else {
            DiagnosticsParserConfig::default()
        };
        let diagnostics = failed_stage_diagnostics(&stage, &output, &parser)?;
        Err(Failure::Diagnostics(
            DiagnosticsReport::new(stage.kind.source(), diagnostics)
                .with_summary(format!("{} exited with code {}", stage.name, output.exit_code)),
        ))
    }
}
