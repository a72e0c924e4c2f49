//! qcheck engines - command-backed lint and test passes
//!
//! Runs the tools configured in `qcheck.toml` (cargo fmt, clippy and test by
//! default) and decides, where each failure is created, whether it is a
//! diagnostics failure or an internal one:
//! - non-zero exit: `Failure::Diagnostics` parsed from the tool's output
//! - spawn error, timeout, malformed JSON: `Failure::Internal`

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lint_engine;
pub mod runner;
pub mod stage;
pub mod test_engine;

pub use config::{LintConfig, QcheckConfig, TestConfig, DEFAULT_CONFIG_FILE};
pub use diagnostics::DiagnosticsParserConfig;
pub use error::{EngineError, Result};
pub use lint_engine::CommandLintEngine;
pub use runner::{execute, Invocation, StageOutput};
pub use stage::{BuiltinStage, OutputFormat, StageConfig, StageKind};
pub use test_engine::CommandTestEngine;
