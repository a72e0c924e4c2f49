//! Errors outside the lint/test failure path.

use crate::report::RunState;

#[derive(Debug, thiserror::Error)]
pub enum QcheckError {
    #[error("invalid run state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: RunState, to: RunState },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QcheckError>;
