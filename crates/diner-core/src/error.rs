//! Engine error types.

use thiserror::Error;

/// Top-level engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A task id did not resolve to a loaded task.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// A save/backend call failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}
