//! Loads a chapter tree and merges referenced documents into it.
//!
//! A root document lists chapters. Each chapter contributes its inline tasks
//! followed by the tasks of every referenced document, resolved depth-first
//! in listed order. Nothing is deduplicated here; duplicate task ids are left
//! for integrity validation to flag.

use diner_core::ids::TaskId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use super::source::DocumentSource;
use crate::domain::catalog::{Catalog, CatalogDocument};
use crate::domain::documents::{RootDocument, TaskDocument, TaskListDocument};
use crate::domain::model::{ChapterDefinition, TaskDefinition};
use crate::error::ContentError;

/// A non-fatal problem found while loading, attributed to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDiagnostic {
    /// Position of the chapter in configured order.
    pub chapter_index: usize,
    /// Chapter containing the task.
    pub chapter_id: String,
    /// Position of the task within its chapter's merged task list.
    pub task_index: usize,
    /// Task the problem belongs to.
    pub task_id: TaskId,
    /// Completion pass containing the event.
    pub pass_index: usize,
    /// Event position within the pass.
    pub event_index: usize,
    /// Description of the problem.
    pub message: String,
}

/// The result of loading a chapter tree.
#[derive(Debug, Clone)]
pub struct ContentBundle {
    /// Chapters in configured order.
    pub chapters: Vec<ChapterDefinition>,
    /// Non-fatal problems, for integrity validation.
    pub diagnostics: Vec<ContentDiagnostic>,
    /// Every document read, in load order.
    pub documents: Vec<String>,
    /// Hex SHA-256 over every document read, in load order.
    pub version_hash: String,
}

impl ContentBundle {
    /// Total number of tasks across every chapter.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.chapters.iter().map(|chapter| chapter.tasks.len()).sum()
    }
}

struct LoadContext<'a> {
    source: &'a dyn DocumentSource,
    hasher: Sha256,
    documents: Vec<String>,
    diagnostics: Vec<ContentDiagnostic>,
    stack: Vec<String>,
    chapter_index: usize,
    chapter_id: String,
}

impl LoadContext<'_> {
    fn read<T: DeserializeOwned>(&mut self, reference: &str) -> Result<T, ContentError> {
        let text = self.source.read(reference)?;
        self.hasher.update(reference.as_bytes());
        self.hasher.update(text.as_bytes());
        self.documents.push(reference.to_owned());
        tracing::debug!(reference, bytes = text.len(), "read content document");
        serde_yaml::from_str(&text).map_err(|source| ContentError::Parse {
            reference: reference.to_owned(),
            source,
        })
    }

    fn convert(
        &mut self,
        documents: Vec<TaskDocument>,
        into: &mut Vec<TaskDefinition>,
    ) -> Result<(), ContentError> {
        for document in documents {
            let converted = document.into_definition()?;
            for note in converted.notes {
                tracing::warn!(
                    task_id = %converted.definition.id,
                    pass_index = note.pass_index,
                    event_index = note.event_index,
                    "{}",
                    note.message
                );
                self.diagnostics.push(ContentDiagnostic {
                    chapter_index: self.chapter_index,
                    chapter_id: self.chapter_id.clone(),
                    task_index: into.len(),
                    task_id: converted.definition.id.clone(),
                    pass_index: note.pass_index,
                    event_index: note.event_index,
                    message: note.message,
                });
            }
            into.push(converted.definition);
        }
        Ok(())
    }

    fn merge_references(
        &mut self,
        references: Vec<String>,
        into: &mut Vec<TaskDefinition>,
    ) -> Result<(), ContentError> {
        for reference in references {
            if self.stack.contains(&reference) {
                let mut chain = self.stack.clone();
                chain.push(reference);
                return Err(ContentError::CyclicReference { chain });
            }
            self.stack.push(reference.clone());
            let child: TaskListDocument = self.read(&reference)?;
            self.convert(child.tasks, into)?;
            self.merge_references(child.references, into)?;
            self.stack.pop();
        }
        Ok(())
    }
}

/// Loads the chapter tree rooted at `root`.
///
/// # Errors
///
/// Returns `ContentError` if any document cannot be read or parsed, if a
/// reference cycle exists, or if an event is structurally unusable (empty
/// sequence, missing required field).
pub fn load_chapters(
    source: &dyn DocumentSource,
    root: &str,
) -> Result<ContentBundle, ContentError> {
    let mut context = LoadContext {
        source,
        hasher: Sha256::new(),
        documents: Vec::new(),
        diagnostics: Vec::new(),
        stack: vec![root.to_owned()],
        chapter_index: 0,
        chapter_id: String::new(),
    };

    let document: RootDocument = context.read(root)?;
    let mut chapters = Vec::with_capacity(document.chapters.len());
    for (chapter_index, chapter) in document.chapters.into_iter().enumerate() {
        let mut tasks = Vec::new();
        context.chapter_index = chapter_index;
        context.chapter_id.clone_from(&chapter.id);
        context.convert(chapter.tasks, &mut tasks)?;
        context.merge_references(chapter.references, &mut tasks)?;
        tracing::debug!(chapter_id = %chapter.id, tasks = tasks.len(), "loaded chapter");
        chapters.push(ChapterDefinition {
            id: chapter.id,
            name: chapter.name,
            completion_requirements: chapter.completion_requirements,
            tasks,
        });
    }

    let version_hash = format!("{:x}", context.hasher.finalize());
    tracing::info!(
        chapters = chapters.len(),
        documents = context.documents.len(),
        %version_hash,
        "content loaded"
    );

    Ok(ContentBundle {
        chapters,
        diagnostics: context.diagnostics,
        documents: context.documents,
        version_hash,
    })
}

/// Loads the room/dialogue/icon catalog.
///
/// # Errors
///
/// Returns `ContentError` if the document cannot be read or parsed.
pub fn load_catalog(source: &dyn DocumentSource, reference: &str) -> Result<Catalog, ContentError> {
    let text = source.read(reference)?;
    let document: CatalogDocument =
        serde_yaml::from_str(&text).map_err(|source| ContentError::Parse {
            reference: reference.to_owned(),
            source,
        })?;
    Ok(Catalog::from(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::source::InMemorySource;
    use crate::domain::model::CompletionSequenceEvent;

    const ROOT: &str = r"
chapters:
  - id: chapter_1
    name: Opening Day
    tasks:
      - id: t_sweep
        name: Sweep the floor
        star_cost: 1
        completion_sequences:
          - - type: none
    references: [kitchen.yaml, patio.yaml]
";

    const KITCHEN: &str = r"
tasks:
  - id: t_oven
    name: Fix the oven
    icon: oven_icon
    star_cost: 2
    completion_sequences:
      - - type: dialogue
          dialogue_id: oven_intro
        - type: focus_on_item
          room_id: kitchen
          spawn_id: oven_spot
          item_id: wrench
references: [kitchen_extra.yaml]
";

    const KITCHEN_EXTRA: &str = r"
tasks:
  - id: t_sweep
    name: Sweep again
    completion_sequences:
      - - type: none
";

    const PATIO: &str = r"
tasks:
  - id: t_chairs
    name: Set out chairs
    completion_sequences:
      - - type: force_swap_props
          swaps:
            - { room_id: patio, node_id: n1, prop_id: chair_red }
";

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_document("root.yaml", ROOT)
            .with_document("kitchen.yaml", KITCHEN)
            .with_document("kitchen_extra.yaml", KITCHEN_EXTRA)
            .with_document("patio.yaml", PATIO)
    }

    #[test]
    fn test_load_chapters_merges_references_in_order_and_keeps_duplicates() {
        // Act
        let bundle = load_chapters(&source(), "root.yaml").unwrap();

        // Assert
        assert_eq!(bundle.chapters.len(), 1);
        let ids: Vec<&str> = bundle.chapters[0]
            .tasks
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t_sweep", "t_oven", "t_sweep", "t_chairs"]);
        assert_eq!(
            bundle.documents,
            vec!["root.yaml", "kitchen.yaml", "kitchen_extra.yaml", "patio.yaml"]
        );
        assert_eq!(bundle.version_hash.len(), 64);
    }

    #[test]
    fn test_load_chapters_converts_typed_events() {
        let bundle = load_chapters(&source(), "root.yaml").unwrap();

        let oven = &bundle.chapters[0].tasks[1];
        assert_eq!(oven.required_completion_count, 1);
        assert_eq!(
            oven.completion_sequences[0].events()[1],
            CompletionSequenceEvent::FocusOnItem {
                room_id: "kitchen".to_owned(),
                spawn_id: "oven_spot".to_owned(),
                item_id: "wrench".to_owned(),
            }
        );
    }

    #[test]
    fn test_load_chapters_rejects_cyclic_references() {
        // Arrange
        let source = InMemorySource::new()
            .with_document(
                "root.yaml",
                "chapters:\n  - id: c\n    name: C\n    references: [a.yaml]\n",
            )
            .with_document("a.yaml", "references: [b.yaml]\n")
            .with_document("b.yaml", "references: [a.yaml]\n");

        // Act
        let result = load_chapters(&source, "root.yaml");

        // Assert
        match result {
            Err(ContentError::CyclicReference { chain }) => {
                assert_eq!(chain, vec!["root.yaml", "a.yaml", "b.yaml", "a.yaml"]);
            }
            other => panic!("expected CyclicReference, got {other:?}"),
        }
    }

    #[test]
    fn test_load_chapters_fails_fast_on_empty_sequence() {
        let source = InMemorySource::new().with_document(
            "root.yaml",
            "chapters:\n  - id: c\n    name: C\n    tasks:\n      - id: t\n        name: T\n        completion_sequences: [[]]\n",
        );

        let result = load_chapters(&source, "root.yaml");

        assert!(matches!(result, Err(ContentError::EmptySequence { .. })));
    }

    #[test]
    fn test_load_chapters_fails_on_missing_required_field() {
        let source = InMemorySource::new().with_document(
            "root.yaml",
            "chapters:\n  - id: c\n    name: C\n    tasks:\n      - id: t\n        name: T\n        completion_sequences:\n          - - type: unlock_room\n",
        );

        let result = load_chapters(&source, "root.yaml");

        match result {
            Err(ContentError::MissingField {
                task_id,
                event_type,
                field,
            }) => {
                assert_eq!(task_id, "t");
                assert_eq!(event_type, "unlock_room");
                assert_eq!(field, "room_id");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_none_event_with_payload_produces_diagnostic() {
        let source = InMemorySource::new().with_document(
            "root.yaml",
            "chapters:\n  - id: c\n    name: C\n    tasks:\n      - id: t\n        name: T\n        completion_sequences:\n          - - type: none\n              room_id: kitchen\n",
        );

        let bundle = load_chapters(&source, "root.yaml").unwrap();

        assert_eq!(bundle.diagnostics.len(), 1);
        let diagnostic = &bundle.diagnostics[0];
        assert_eq!(diagnostic.task_id, "t");
        assert_eq!(diagnostic.chapter_index, 0);
        assert_eq!(diagnostic.chapter_id, "c");
        assert_eq!(diagnostic.task_index, 0);
        assert_eq!(diagnostic.pass_index, 0);
        assert_eq!(diagnostic.event_index, 0);
        assert!(diagnostic.message.contains("room_id"));
        assert_eq!(
            bundle.chapters[0].tasks[0].completion_sequences[0].events(),
            &[CompletionSequenceEvent::None]
        );
    }

    #[test]
    fn test_load_catalog_indexes_rooms() {
        let source = InMemorySource::new().with_document(
            "catalog.yaml",
            "rooms:\n  - id: kitchen\n    spawn_points: [oven_spot]\n    nodes: [n1]\ndialogues: [oven_intro]\nicons: [oven_icon]\n",
        );

        let catalog = load_catalog(&source, "catalog.yaml").unwrap();

        let kitchen = catalog.room("kitchen").unwrap();
        assert!(kitchen.spawn_points.contains("oven_spot"));
        assert!(kitchen.nodes.contains("n1"));
        assert!(catalog.has_dialogue("oven_intro"));
        assert!(catalog.has_icon("oven_icon"));
        assert!(catalog.room("patio").is_none());
    }
}
