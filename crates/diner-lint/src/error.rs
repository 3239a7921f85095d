//! Diner lint — error types.

use diner_content::error::ContentError;
use thiserror::Error;

/// Startup and run errors for the lint binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The content tree or catalog could not be loaded.
    #[error("content error: {0}")]
    Content(#[from] ContentError),
}
