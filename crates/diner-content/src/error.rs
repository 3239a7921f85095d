//! Content loading errors.

use thiserror::Error;

/// Errors that stop a content tree from loading.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A document could not be read.
    #[error("failed to read document {reference}: {source}")]
    Io {
        /// The document reference.
        reference: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A document was not found in an in-memory source.
    #[error("document not found: {0}")]
    MissingDocument(String),

    /// A document is not valid YAML for its expected shape.
    #[error("failed to parse document {reference}: {source}")]
    Parse {
        /// The document reference.
        reference: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// A document references itself, directly or transitively.
    #[error("cyclic document reference: {}", chain.join(" -> "))]
    CyclicReference {
        /// The reference chain, ending in the repeated document.
        chain: Vec<String>,
    },

    /// A completion sequence has no events.
    #[error("task {task_id}: completion sequence {pass_index} has no events")]
    EmptySequence {
        /// Owning task.
        task_id: String,
        /// Index of the sequence within the task.
        pass_index: usize,
    },

    /// An event is missing a field its variant requires.
    #[error("task {task_id}: {event_type} event is missing required field `{field}`")]
    MissingField {
        /// Owning task.
        task_id: String,
        /// Event variant name.
        event_type: &'static str,
        /// The missing field.
        field: &'static str,
    },
}
