//! Request-scoped context handed to every pass.
//!
//! The context carries the user-facing reporter, the operator error channel,
//! and the request flags. It is owned by the caller; the orchestrator only
//! flips `verbose_diagnostics` before the first pass.

use std::fmt;
use std::sync::Arc;

use crate::failure::Failure;

/// User-facing output sink.
pub trait Reporter: Send + Sync {
    /// Emit a section heading.
    fn heading(&self, text: &str);

    /// Emit an informational line.
    fn info(&self, _text: &str) {}

    /// Emit a success line.
    fn success(&self, _text: &str) {}
}

/// Operator channel for failures that must be surfaced but do not fail the run.
pub trait ErrorHandler: Send + Sync {
    fn handle_request_error(&self, ctx: &RunContext, failure: Failure);
}

/// Flags that can be updated for the lifetime of one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Print every diagnostic in full rather than a truncated summary.
    pub verbose_diagnostics: bool,
}

/// Context for a single `ci` request.
#[derive(Clone)]
pub struct RunContext {
    reporter: Arc<dyn Reporter>,
    error_handler: Arc<dyn ErrorHandler>,
    flags: RequestFlags,
}

impl RunContext {
    pub fn new(reporter: Arc<dyn Reporter>, error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            reporter,
            error_handler,
            flags: RequestFlags::default(),
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn flags(&self) -> RequestFlags {
        self.flags
    }

    /// Update request flags in place.
    pub fn update_request_flags(&mut self, update: impl FnOnce(&mut RequestFlags)) {
        update(&mut self.flags);
    }

    /// Route a failure to the operator error channel.
    pub fn handle_request_error(&self, failure: Failure) {
        self.error_handler.handle_request_error(self, failure);
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
