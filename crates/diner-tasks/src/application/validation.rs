//! Referential integrity checks over the loaded task graph.
//!
//! Validation never halts loading. Each problem becomes an
//! [`IntegrityIssue`] naming the offending task; the Task Manager marks that
//! task invalid so it is never offered.

use std::collections::HashSet;
use std::fmt;

use diner_content::application::loader::ContentDiagnostic;
use diner_content::domain::catalog::{Catalog, RoomLayout};
use diner_content::domain::model::{CompletionSequenceEvent, TaskDefinition};
use diner_core::ids::TaskId;
use serde::Serialize;

use crate::domain::task::Chapter;

/// What is wrong with a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssueKind {
    /// The task icon is not in the catalog.
    MissingIcon { icon_id: String },
    /// A dialogue step names an unknown dialogue.
    MissingDialogue { dialogue_id: String },
    /// A step names an unknown room.
    MissingRoom { room_id: String },
    /// A step names a spawn point its room does not have.
    MissingSpawnPoint { room_id: String, spawn_id: String },
    /// A step names a prop node its room does not have.
    MissingNode { room_id: String, node_id: String },
    /// Another task earlier in configured order has the same id.
    DuplicateTaskId,
    /// A `none` step carries payload fields.
    MalformedNoneEvent {
        pass_index: usize,
        event_index: usize,
        message: String,
    },
    /// Fewer completion sequences than required completions.
    InsufficientSequences { required: u32, authored: usize },
}

impl fmt::Display for IntegrityIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIcon { icon_id } => write!(f, "missing icon {icon_id}"),
            Self::MissingDialogue { dialogue_id } => write!(f, "missing dialogue {dialogue_id}"),
            Self::MissingRoom { room_id } => write!(f, "missing room {room_id}"),
            Self::MissingSpawnPoint { room_id, spawn_id } => {
                write!(f, "missing spawn point {room_id}/{spawn_id}")
            }
            Self::MissingNode { room_id, node_id } => {
                write!(f, "missing node {room_id}/{node_id}")
            }
            Self::DuplicateTaskId => f.write_str("duplicate task id"),
            Self::MalformedNoneEvent {
                pass_index,
                event_index,
                message,
            } => write!(f, "malformed none event at pass {pass_index} step {event_index}: {message}"),
            Self::InsufficientSequences { required, authored } => write!(
                f,
                "{authored} completion sequences for {required} required completions"
            ),
        }
    }
}

/// A problem found with one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    /// Position of the chapter in configured order.
    pub chapter_index: usize,
    /// Chapter containing the task.
    pub chapter_id: String,
    /// Position of the task within its chapter.
    pub task_index: usize,
    /// Offending task.
    pub task_id: TaskId,
    /// What is wrong.
    #[serde(flatten)]
    pub kind: IntegrityIssueKind,
}

/// Every integrity issue found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Issues in configured task order.
    pub issues: Vec<IntegrityIssue>,
}

impl ValidationReport {
    /// `true` when no issue was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues found for one task id.
    pub fn issues_for<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a IntegrityIssue> {
        self.issues.iter().filter(move |issue| issue.task_id == task_id)
    }

    /// `(chapter_index, task_index)` of every task with at least one issue.
    /// Positions stay distinct even when two chapters share an id.
    #[must_use]
    pub fn invalid_positions(&self) -> HashSet<(usize, usize)> {
        self.issues
            .iter()
            .map(|issue| (issue.chapter_index, issue.task_index))
            .collect()
    }
}

struct Collector<'a> {
    chapter_index: usize,
    chapter_id: &'a str,
    task_index: usize,
    task_id: &'a str,
    issues: &'a mut Vec<IntegrityIssue>,
}

impl Collector<'_> {
    fn push(&mut self, kind: IntegrityIssueKind) {
        self.issues.push(IntegrityIssue {
            chapter_index: self.chapter_index,
            chapter_id: self.chapter_id.to_owned(),
            task_index: self.task_index,
            task_id: self.task_id.to_owned(),
            kind,
        });
    }

    fn room<'c>(&mut self, catalog: &'c Catalog, room_id: &str) -> Option<&'c RoomLayout> {
        let room = catalog.room(room_id);
        if room.is_none() {
            self.push(IntegrityIssueKind::MissingRoom {
                room_id: room_id.to_owned(),
            });
        }
        room
    }

    fn spawn_point(&mut self, catalog: &Catalog, room_id: &str, spawn_id: &str) {
        let missing = self
            .room(catalog, room_id)
            .is_some_and(|room| !room.spawn_points.contains(spawn_id));
        if missing {
            self.push(IntegrityIssueKind::MissingSpawnPoint {
                room_id: room_id.to_owned(),
                spawn_id: spawn_id.to_owned(),
            });
        }
    }

    fn node(&mut self, catalog: &Catalog, room_id: &str, node_id: &str) {
        let missing = self
            .room(catalog, room_id)
            .is_some_and(|room| !room.nodes.contains(node_id));
        if missing {
            self.push(IntegrityIssueKind::MissingNode {
                room_id: room_id.to_owned(),
                node_id: node_id.to_owned(),
            });
        }
    }

    fn event(&mut self, catalog: &Catalog, event: &CompletionSequenceEvent) {
        match event {
            CompletionSequenceEvent::Dialogue { dialogue_id } => {
                if !catalog.has_dialogue(dialogue_id) {
                    self.push(IntegrityIssueKind::MissingDialogue {
                        dialogue_id: dialogue_id.clone(),
                    });
                }
            }
            CompletionSequenceEvent::FocusOnItem {
                room_id, spawn_id, ..
            } => self.spawn_point(catalog, room_id, spawn_id),
            CompletionSequenceEvent::InteractableItems {
                room_id,
                icon_id,
                spawn_ids,
                ..
            } => {
                if !catalog.has_icon(icon_id) {
                    self.push(IntegrityIssueKind::MissingIcon {
                        icon_id: icon_id.clone(),
                    });
                }
                if self.room(catalog, room_id).is_some() {
                    for spawn_id in spawn_ids {
                        self.spawn_point(catalog, room_id, spawn_id);
                    }
                }
            }
            CompletionSequenceEvent::PlaceProp {
                room_id, node_id, ..
            } => self.node(catalog, room_id, node_id),
            CompletionSequenceEvent::ForceSwapProps { swaps } => {
                for swap in swaps {
                    self.node(catalog, &swap.room_id, &swap.node_id);
                }
            }
            CompletionSequenceEvent::UnlockRoom { room_id } => {
                self.room(catalog, room_id);
            }
            // A missing popup sprite degrades to no sprite.
            CompletionSequenceEvent::EndGamePopUp { .. } | CompletionSequenceEvent::None => {}
        }
    }

    fn task(&mut self, catalog: &Catalog, task: &TaskDefinition) {
        if let Some(icon_id) = task.icon.as_ref().filter(|icon| !catalog.has_icon(icon)) {
            self.push(IntegrityIssueKind::MissingIcon {
                icon_id: icon_id.clone(),
            });
        }

        let authored = task.completion_sequences.len();
        if usize::try_from(task.required_completion_count).is_ok_and(|required| authored < required) {
            self.push(IntegrityIssueKind::InsufficientSequences {
                required: task.required_completion_count,
                authored,
            });
        }

        for sequence in &task.completion_sequences {
            for event in sequence.events() {
                self.event(catalog, event);
            }
        }
    }
}

/// Checks every task in `chapters` against `catalog` and folds in the
/// loader's `diagnostics`. Issues are logged at warn level.
#[must_use]
pub fn validate_task_graph(
    chapters: &[Chapter],
    catalog: &Catalog,
    diagnostics: &[ContentDiagnostic],
) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (chapter_index, chapter) in chapters.iter().enumerate() {
        for (task_index, task) in chapter.tasks.iter().enumerate() {
            let mut collector = Collector {
                chapter_index,
                chapter_id: &chapter.id,
                task_index,
                task_id: task.id(),
                issues: &mut issues,
            };
            if !seen.insert(task.id()) {
                collector.push(IntegrityIssueKind::DuplicateTaskId);
            }
            collector.task(catalog, task.definition());
            for diagnostic in diagnostics.iter().filter(|diagnostic| {
                diagnostic.chapter_index == chapter_index && diagnostic.task_index == task_index
            }) {
                collector.push(IntegrityIssueKind::MalformedNoneEvent {
                    pass_index: diagnostic.pass_index,
                    event_index: diagnostic.event_index,
                    message: diagnostic.message.clone(),
                });
            }
        }
    }

    for issue in &issues {
        tracing::warn!(
            chapter_id = %issue.chapter_id,
            task_id = %issue.task_id,
            "integrity issue: {}",
            issue.kind
        );
    }

    ValidationReport { issues }
}
