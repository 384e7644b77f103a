//! Error types for the stacking engine

use thiserror::Error;

/// Failures surfaced by restack requests.
///
/// Invariant violations (stale item ids, items that are not where they claim
/// to be) are not errors; the engine logs them and leaves the model untouched.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("restack request failed: {0}")]
    Restack(String),

    #[error("window system connection lost")]
    ConnectionLost,

    #[cfg(feature = "x11")]
    #[error("X11 connection error: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),
}

impl StackError {
    pub fn restack(msg: impl Into<String>) -> Self {
        Self::Restack(msg.into())
    }
}

/// Result type for stacking operations
pub type Result<T> = std::result::Result<T, StackError>;
