//! Stage definitions for the command-backed engines.

use qcheck_core::DiagnosticSource;
use serde::{Deserialize, Serialize};

/// What a stage checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Formatting check; kept when the lint pass is format-only.
    Format,
    Lint,
    Test,
}

impl StageKind {
    pub fn source(&self) -> DiagnosticSource {
        match self {
            StageKind::Format => DiagnosticSource::Format,
            StageKind::Lint => DiagnosticSource::Lint,
            StageKind::Test => DiagnosticSource::Test,
        }
    }
}

/// How a stage reports its findings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-oriented compiler/test output, scanned line by line.
    #[default]
    Text,
    /// A JSON array of diagnostics on stdout.
    Json,
}

/// Builtin cargo stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinStage {
    /// cargo fmt --all -- --check
    CargoFmt,

    /// cargo clippy --workspace --all-targets -- -D warnings
    CargoClippy,

    /// cargo test --workspace
    CargoTest,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl BuiltinStage {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStage::CargoFmt => "fmt",
            BuiltinStage::CargoClippy => "clippy",
            BuiltinStage::CargoTest => "test",
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            BuiltinStage::CargoFmt => StageKind::Format,
            BuiltinStage::CargoClippy => StageKind::Lint,
            BuiltinStage::CargoTest => StageKind::Test,
        }
    }

    /// The stage's check command.
    pub fn command(&self) -> Vec<String> {
        match self {
            BuiltinStage::CargoFmt => argv(&["cargo", "fmt", "--all", "--", "--check"]),
            BuiltinStage::CargoClippy => argv(&[
                "cargo",
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ]),
            BuiltinStage::CargoTest => argv(&["cargo", "test", "--workspace"]),
        }
    }

    /// The stage's auto-fix command (if available).
    pub fn fix_command(&self) -> Option<Vec<String>> {
        match self {
            BuiltinStage::CargoFmt => Some(argv(&["cargo", "fmt", "--all"])),
            BuiltinStage::CargoClippy => Some(argv(&[
                "cargo",
                "clippy",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
                "--workspace",
                "--all-targets",
            ])),
            BuiltinStage::CargoTest => None,
        }
    }

    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            BuiltinStage::CargoFmt => 300,
            BuiltinStage::CargoClippy => 600,
            BuiltinStage::CargoTest => 1200,
        }
    }
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_enabled() -> bool {
    true
}

/// Configuration for one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    pub kind: StageKind,

    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Command run before `command` when fixes are applied.
    #[serde(default)]
    pub fix_command: Option<Vec<String>>,

    /// Timeout in seconds; 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl StageConfig {
    pub fn from_builtin(stage: BuiltinStage) -> Self {
        Self {
            name: stage.name().to_string(),
            kind: stage.kind(),
            command: stage.command(),
            fix_command: stage.fix_command(),
            timeout_secs: stage.default_timeout_secs(),
            output: OutputFormat::Text,
            enabled: true,
        }
    }

    pub fn custom(name: impl Into<String>, kind: StageKind, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            command,
            fix_command: None,
            timeout_secs: default_timeout_secs(),
            output: OutputFormat::Text,
            enabled: true,
        }
    }

    pub fn with_fix_command(mut self, fix_command: Vec<String>) -> Self {
        self.fix_command = Some(fix_command);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
