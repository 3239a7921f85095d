//! Diner lint entry point.

use std::error::Error;
use std::process::ExitCode;

use diner_content::application::source::DirectorySource;
use diner_lint::config::LintConfig;
use diner_lint::report::lint;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = LintConfig::from_env()?;
    tracing::info!(
        content_dir = %config.content_dir.display(),
        root = %config.root_document,
        catalog = %config.catalog_document,
        "Linting diner content"
    );

    let source = DirectorySource::new(config.content_dir.clone());
    let report = lint(&source, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_clean() {
        tracing::info!(tasks = report.task_count, "content is clean");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(issues = report.issues.len(), "content has integrity issues");
        Ok(ExitCode::FAILURE)
    }
}
