//! qcheck - lint-then-test CI step
//!
//! ## Commands
//!
//! - `ci [--fix]`: run the lint pass, then the test pass. With `--fix`, lint
//!   fixes are applied and recorded test outputs are updated.

mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qcheck_core::{CiCommand, Failure, Reporter, RunContext, RunIntent};
use qcheck_engines::{CommandLintEngine, CommandTestEngine, QcheckConfig, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

use terminal::{render_diagnostics, LogErrorHandler, TerminalReporter};

#[derive(Parser)]
#[command(name = "qcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run lint and tests as a single CI step", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Engine configuration file (default: ./qcheck.toml if present)
    #[arg(long, global = true, env = "QCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Write the run report as JSON to this path on success
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lint and tests
    Ci {
        /// Apply lint fixes and update recorded test outputs
        #[arg(long)]
        fix: bool,
    },
}

/// How a `ci` run ended when it did not hit an internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CiOutcome {
    Passed,
    Failed,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    qcheck_core::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Ci { fix } => {
            cmd_ci(cli.config.as_deref(), cli.report.as_deref(), RunIntent { fix }).await?
        }
    };

    Ok(match outcome {
        CiOutcome::Passed => ExitCode::SUCCESS,
        CiOutcome::Failed => ExitCode::from(1),
    })
}

fn load_config(config: Option<&Path>) -> Result<QcheckConfig> {
    let config = match config {
        Some(path) => QcheckConfig::load_or_default(path, true),
        None => QcheckConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE), false),
    };
    config.context("Failed to load qcheck configuration")
}

/// Run lint and tests.
///
/// Diagnostics failures are printed and reported as `CiOutcome::Failed`;
/// internal failures are returned as errors, unchanged.
async fn cmd_ci(
    config: Option<&Path>,
    report: Option<&Path>,
    intent: RunIntent,
) -> Result<CiOutcome> {
    let config = load_config(config)?;
    let work_dir = config.work_dir.clone();

    let reporter = Arc::new(TerminalReporter);
    let mut ctx = RunContext::new(reporter.clone(), Arc::new(LogErrorHandler));
    let cmd = CiCommand::new(
        Arc::new(CommandLintEngine::new(config.lint, work_dir.clone())),
        Arc::new(CommandTestEngine::new(config.test, work_dir)),
    );

    match cmd.run(&mut ctx, intent).await {
        Ok(ci_report) => {
            reporter.success(&format!(
                "ci passed in {}ms ({} absorbed)",
                ci_report.duration_ms,
                ci_report.absorbed_count()
            ));
            if let Some(path) = report {
                ci_report
                    .write_json(path)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                info!(path = %path.display(), "wrote ci report");
            }
            Ok(CiOutcome::Passed)
        }
        Err(Failure::Diagnostics(diagnostics)) => {
            print!(
                "{}",
                render_diagnostics(&diagnostics, ctx.flags().verbose_diagnostics)
            );
            Ok(CiOutcome::Failed)
        }
        Err(Failure::Internal(err)) => Err(err),
    }
}
