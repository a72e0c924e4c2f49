//! `qcheck.toml` configuration for the command-backed engines.
//!
//! ```toml
//! work_dir = "."
//!
//! [[lint.stages]]
//! name = "fmt"
//! kind = "format"
//! command = ["cargo", "fmt", "--all", "--", "--check"]
//! fix_command = ["cargo", "fmt", "--all"]
//!
//! [test]
//! command = ["cargo", "test", "--workspace"]
//! snapshot_env = "INSTA_UPDATE"
//! ```
//!
//! Every section is optional; missing sections fall back to the builtin cargo
//! stages.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::stage::{BuiltinStage, OutputFormat, StageConfig, StageKind};

pub const DEFAULT_CONFIG_FILE: &str = "qcheck.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QcheckConfig {
    /// Directory every stage runs in; defaults to the current directory.
    pub work_dir: Option<PathBuf>,

    pub lint: LintConfig,

    pub test: TestConfig,
}

/// Lint pass: an ordered list of format and lint stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LintConfig {
    pub stages: Vec<StageConfig>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            stages: vec![
                StageConfig::from_builtin(BuiltinStage::CargoFmt),
                StageConfig::from_builtin(BuiltinStage::CargoClippy),
            ],
        }
    }
}

fn default_test_command() -> Vec<String> {
    BuiltinStage::CargoTest.command()
}

fn default_test_timeout() -> u64 {
    BuiltinStage::CargoTest.default_timeout_secs()
}

fn default_snapshot_env() -> String {
    "INSTA_UPDATE".to_string()
}

/// Test pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestConfig {
    #[serde(default = "default_test_command")]
    pub command: Vec<String>,

    /// Command used instead of `command` when coverage is collected.
    #[serde(default)]
    pub coverage_command: Option<Vec<String>>,

    #[serde(default = "default_test_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub output: OutputFormat,

    /// Variable that switches recorded outputs between `always` and `no`.
    #[serde(default = "default_snapshot_env")]
    pub snapshot_env: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            command: default_test_command(),
            coverage_command: None,
            timeout_secs: default_test_timeout(),
            output: OutputFormat::Text,
            snapshot_env: default_snapshot_env(),
        }
    }
}

impl TestConfig {
    /// The test pass as a stage definition.
    pub fn stage(&self, coverage: bool) -> Option<StageConfig> {
        let command = if coverage {
            self.coverage_command.clone()?
        } else {
            self.command.clone()
        };
        let name = if coverage { "coverage" } else { "test" };
        Some(
            StageConfig::custom(name, StageKind::Test, command)
                .with_timeout(self.timeout_secs)
                .with_output(self.output),
        )
    }
}

impl QcheckConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self> {
        let config: QcheckConfig = toml::from_str(text).map_err(|source| EngineError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path`, or the builtin defaults when it does not exist and
    /// `required` is false.
    pub fn load_or_default(path: &Path, required: bool) -> Result<Self> {
        if !required && !path.exists() {
            debug!(path = %path.display(), "config not found, using builtin stages");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Reject stages that could never run.
    pub fn validate(&self) -> Result<()> {
        for stage in &self.lint.stages {
            if stage.name.trim().is_empty() {
                return Err(EngineError::InvalidStage("lint stage with empty name".to_string()));
            }
            if stage.command.is_empty() {
                return Err(EngineError::InvalidStage(format!(
                    "lint stage '{}' has empty command",
                    stage.name
                )));
            }
            if stage.kind == StageKind::Test {
                return Err(EngineError::InvalidStage(format!(
                    "lint stage '{}' has kind 'test'",
                    stage.name
                )));
            }
            if matches!(&stage.fix_command, Some(cmd) if cmd.is_empty()) {
                return Err(EngineError::InvalidStage(format!(
                    "lint stage '{}' has empty fix_command",
                    stage.name
                )));
            }
        }
        if self.test.command.is_empty() {
            return Err(EngineError::InvalidStage("test command is empty".to_string()));
        }
        if self.test.snapshot_env.trim().is_empty() {
            return Err(EngineError::InvalidStage("test snapshot_env is empty".to_string()));
        }
        Ok(())
    }
}
