//! Where content documents come from.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::ContentError;

/// Resolves a document reference to its text.
pub trait DocumentSource {
    /// Reads the document named by `reference`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` or `ContentError::MissingDocument` if the
    /// document cannot be read.
    fn read(&self, reference: &str) -> Result<String, ContentError>;
}

/// Reads documents from a directory; references are paths relative to it.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSource for DirectorySource {
    fn read(&self, reference: &str) -> Result<String, ContentError> {
        fs::read_to_string(self.root.join(reference)).map_err(|source| ContentError::Io {
            reference: reference.to_owned(),
            source,
        })
    }
}

/// Documents held in memory, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<String, String>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, builder style.
    #[must_use]
    pub fn with_document(mut self, reference: &str, text: &str) -> Self {
        self.documents.insert(reference.to_owned(), text.to_owned());
        self
    }
}

impl DocumentSource for InMemorySource {
    fn read(&self, reference: &str) -> Result<String, ContentError> {
        self.documents
            .get(reference)
            .cloned()
            .ok_or_else(|| ContentError::MissingDocument(reference.to_owned()))
    }
}
