//! Run intent and the per-pass options derived from it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The single user choice for a `ci` invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunIntent {
    /// Apply lint fixes and update recorded test outputs instead of checking.
    pub fix: bool,
}

impl RunIntent {
    pub fn check_only() -> Self {
        Self { fix: false }
    }

    pub fn fix() -> Self {
        Self { fix: true }
    }
}

/// Options handed to the lint engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LintOptions {
    /// Apply safe fixes instead of only reporting them.
    pub apply_fixes: bool,

    /// Run formatting checks only.
    pub format_only: bool,

    /// Pending user decisions, in order.
    pub decisions: Vec<String>,

    /// Restrict the pass to files changed since this ref.
    pub changed: Option<String>,
}

impl LintOptions {
    pub fn from_intent(intent: RunIntent) -> Self {
        Self {
            apply_fixes: intent.fix,
            format_only: false,
            decisions: Vec::new(),
            changed: None,
        }
    }
}

/// Options handed to the test engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestOptions {
    /// Only run tests matching this filter.
    pub filter: Option<String>,

    /// Allow focused (only-this) tests to narrow the run.
    pub allow_focused_tests: bool,

    pub collect_coverage: bool,

    /// Fail on any recorded output (snapshot) that would change.
    pub freeze_recorded_outputs: bool,

    /// Rewrite recorded outputs with the current results.
    pub update_recorded_outputs: bool,

    pub show_full_coverage: bool,

    /// Run tests one at a time.
    pub run_synchronously: bool,
}

impl TestOptions {
    pub fn from_intent(intent: RunIntent) -> Self {
        Self {
            filter: None,
            allow_focused_tests: false,
            collect_coverage: false,
            freeze_recorded_outputs: !intent.fix,
            update_recorded_outputs: intent.fix,
            show_full_coverage: false,
            run_synchronously: false,
        }
    }
}

/// Deterministic digest of the options derived for a run.
///
/// Serialised field order is fixed by the struct definitions, so equal
/// options always hash identically.
pub fn options_digest(lint: &LintOptions, test: &TestOptions) -> String {
    let mut hasher = Sha256::new();
    // Serialising plain structs of bools/strings cannot fail.
    hasher.update(serde_json::to_vec(lint).unwrap_or_default());
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(test).unwrap_or_default());
    hex::encode(hasher.finalize())
}
