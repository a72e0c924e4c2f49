//! External process execution for engine stages.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

/// A fully resolved command to run for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage_name: String,

    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Extra environment variables.
    pub env: BTreeMap<String, String>,

    /// Timeout in seconds; 0 disables the timeout.
    pub timeout_secs: u64,

    pub work_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(stage_name: impl Into<String>, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            stage_name: stage_name.into(),
            command,
            env: BTreeMap::new(),
            timeout_secs,
            work_dir: None,
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }

    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stage_name: String,

    /// Exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,

    pub success: bool,
}

impl StageOutput {
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Execute an invocation and capture its output.
///
/// Errors are reserved for failures to run the command at all (empty
/// command, spawn error, timeout); a non-zero exit is a normal `StageOutput`.
pub async fn execute(inv: &Invocation) -> anyhow::Result<StageOutput> {
    let start = Instant::now();

    let (exe, args) = inv
        .command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Stage {} has empty command", inv.stage_name))?;

    debug!(stage = %inv.stage_name, command = %inv.display_command(), "spawning stage");

    let mut cmd = Command::new(exe);
    cmd.args(args)
        .envs(&inv.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &inv.work_dir {
        cmd.current_dir(dir);
    }

    let child = cmd
        .spawn()
        .map_err(|e| anyhow::anyhow!("Stage {} failed to spawn `{}`: {}", inv.stage_name, exe, e))?;

    let output = if inv.timeout_secs > 0 {
        tokio::time::timeout(
            Duration::from_secs(inv.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "Stage {} timed out after {} seconds",
                inv.stage_name,
                inv.timeout_secs
            )
        })??
    } else {
        child.wait_with_output().await?
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let exit_code = output.status.code().unwrap_or(-1);

    Ok(StageOutput {
        stage_name: inv.stage_name.clone(),
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms,
        success: output.status.success(),
    })
}
