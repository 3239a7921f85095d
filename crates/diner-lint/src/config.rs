//! Environment-driven settings.

use std::path::PathBuf;

use crate::error::AppError;

/// Where the content tree and catalog live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Directory every document reference is resolved against.
    pub content_dir: PathBuf,
    /// Root chapter document, relative to `content_dir`.
    pub root_document: String,
    /// Catalog document, relative to `content_dir`.
    pub catalog_document: String,
}

impl LintConfig {
    /// Reads `DINER_CONTENT_DIR`, `DINER_ROOT_DOCUMENT` and
    /// `DINER_CATALOG_DOCUMENT`, falling back to defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but empty.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LintConfig::from_env`] over an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let read = |key: &str, default: &str| -> Result<String, AppError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => {
                    Err(AppError::Config(format!("{key} must not be empty")))
                }
                Some(value) => Ok(value),
                None => Ok(default.to_string()),
            }
        };

        Ok(Self {
            content_dir: PathBuf::from(read("DINER_CONTENT_DIR", "content")?),
            root_document: read("DINER_ROOT_DOCUMENT", "chapters.yaml")?,
            catalog_document: read("DINER_CATALOG_DOCUMENT", "catalog.yaml")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = LintConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.content_dir, PathBuf::from("content"));
        assert_eq!(config.root_document, "chapters.yaml");
        assert_eq!(config.catalog_document, "catalog.yaml");
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let vars = HashMap::from([
            ("DINER_CONTENT_DIR", "/srv/diner"),
            ("DINER_ROOT_DOCUMENT", "story.yaml"),
        ]);

        let config = LintConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();

        assert_eq!(config.content_dir, PathBuf::from("/srv/diner"));
        assert_eq!(config.root_document, "story.yaml");
        assert_eq!(config.catalog_document, "catalog.yaml");
    }

    #[test]
    fn test_empty_variable_is_rejected() {
        let result = LintConfig::from_lookup(|key| (key == "DINER_CATALOG_DOCUMENT").then(String::new));

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("DINER_CATALOG_DOCUMENT")));
    }
}
