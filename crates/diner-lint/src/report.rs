//! Loads a content tree and reports its integrity.

use diner_content::application::loader::{load_catalog, load_chapters};
use diner_content::application::source::DocumentSource;
use diner_tasks::application::validation::{IntegrityIssue, validate_task_graph};
use diner_tasks::domain::task::Chapter;
use serde::Serialize;

use crate::config::LintConfig;
use crate::error::AppError;

/// Printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct LintReport {
    /// SHA-256 over every chapter document, in load order.
    pub version_hash: String,
    /// Chapter documents read, in load order.
    pub documents: Vec<String>,
    /// Chapters in the merged tree.
    pub chapter_count: usize,
    /// Tasks in the merged tree, duplicates included.
    pub task_count: usize,
    /// Rooms in the catalog.
    pub room_count: usize,
    /// Integrity issues found by validation.
    pub issues: Vec<IntegrityIssue>,
}

impl LintReport {
    /// `true` when no integrity issue was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Loads the documents named by `config` from `source` and validates them.
///
/// # Errors
///
/// Returns `AppError::Content` if the tree or catalog fails to load.
pub fn lint(source: &dyn DocumentSource, config: &LintConfig) -> Result<LintReport, AppError> {
    let bundle = load_chapters(source, &config.root_document)?;
    let catalog = load_catalog(source, &config.catalog_document)?;
    let task_count = bundle.task_count();
    let chapters: Vec<Chapter> = bundle.chapters.into_iter().map(Chapter::from).collect();
    let report = validate_task_graph(&chapters, &catalog, &bundle.diagnostics);

    Ok(LintReport {
        version_hash: bundle.version_hash,
        documents: bundle.documents,
        chapter_count: chapters.len(),
        task_count,
        room_count: catalog.room_count(),
        issues: report.issues,
    })
}
