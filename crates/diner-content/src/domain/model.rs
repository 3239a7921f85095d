//! Chapter, task and completion sequence definitions.
//!
//! Everything in this module is immutable once loaded. Runtime state lives
//! in the task engine, not here.

use diner_core::ids::{
    ChapterMarker, DialogueId, IconId, ItemId, NodeId, PropSwap, RoomId, SpawnId, SpawnPointKey,
    TaskId,
};
use diner_core::requirement::Requirement;
use serde::Serialize;

use crate::error::ContentError;

/// One typed step of a completion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionSequenceEvent {
    /// Play a narrative dialogue.
    Dialogue {
        /// Dialogue to play.
        dialogue_id: DialogueId,
    },
    /// Focus the camera on a spawned item and wait for the player to tap it.
    FocusOnItem {
        /// Room of the spawn point.
        room_id: RoomId,
        /// Spawn point hosting the item.
        spawn_id: SpawnId,
        /// Item to spawn.
        item_id: ItemId,
    },
    /// Spawn interactable items and wait until every one was interacted with.
    InteractableItems {
        /// Room of the spawn points.
        room_id: RoomId,
        /// Item spawned at each spawn point.
        item_id: ItemId,
        /// Icon shown above each item.
        icon_id: IconId,
        /// Spawn points hosting the items.
        spawn_ids: Vec<SpawnId>,
    },
    /// Ask the player to place a prop through build mode.
    PlaceProp {
        /// Room of the node.
        room_id: RoomId,
        /// Node to place on.
        node_id: NodeId,
        /// Allowed prop tags; empty allows any prop.
        prop_tags: Vec<String>,
    },
    /// Place props without asking the player.
    ForceSwapProps {
        /// Props to place.
        swaps: Vec<PropSwap>,
    },
    /// Unlock a room.
    UnlockRoom {
        /// Room to unlock.
        room_id: RoomId,
    },
    /// Show the end-of-story popup.
    EndGamePopUp {
        /// Popup title.
        title: String,
        /// Popup body.
        message: String,
        /// Optional popup sprite.
        sprite_path: Option<String>,
    },
    /// No-op step, complete as soon as it begins.
    None,
}

impl CompletionSequenceEvent {
    /// Variant name as written in content documents.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Dialogue { .. } => "dialogue",
            Self::FocusOnItem { .. } => "focus_on_item",
            Self::InteractableItems { .. } => "interactable_items",
            Self::PlaceProp { .. } => "place_prop",
            Self::ForceSwapProps { .. } => "force_swap_props",
            Self::UnlockRoom { .. } => "unlock_room",
            Self::EndGamePopUp { .. } => "end_game_pop_up",
            Self::None => "none",
        }
    }

    /// Spawn points this step needs an item spawned at before it runs.
    ///
    /// Only focus and interactable steps spawn items.
    #[must_use]
    pub fn required_spawn_points(&self) -> Vec<SpawnPointKey> {
        match self {
            Self::FocusOnItem {
                room_id, spawn_id, ..
            } => vec![SpawnPointKey::new(room_id.clone(), spawn_id.clone())],
            Self::InteractableItems {
                room_id, spawn_ids, ..
            } => spawn_ids
                .iter()
                .map(|spawn_id| SpawnPointKey::new(room_id.clone(), spawn_id.clone()))
                .collect(),
            Self::Dialogue { .. }
            | Self::PlaceProp { .. }
            | Self::ForceSwapProps { .. }
            | Self::UnlockRoom { .. }
            | Self::EndGamePopUp { .. }
            | Self::None => Vec::new(),
        }
    }

    /// Item to spawn for this step, if it spawns one.
    #[must_use]
    pub fn spawned_item(&self) -> Option<&ItemId> {
        match self {
            Self::FocusOnItem { item_id, .. } | Self::InteractableItems { item_id, .. } => {
                Some(item_id)
            }
            Self::Dialogue { .. }
            | Self::PlaceProp { .. }
            | Self::ForceSwapProps { .. }
            | Self::UnlockRoom { .. }
            | Self::EndGamePopUp { .. }
            | Self::None => None,
        }
    }
}

/// The ordered steps of one completion pass of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSequence {
    events: Vec<CompletionSequenceEvent>,
}

impl CompletionSequence {
    /// Creates a sequence.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::EmptySequence` if `events` is empty.
    pub fn new(
        task_id: &str,
        pass_index: usize,
        events: Vec<CompletionSequenceEvent>,
    ) -> Result<Self, ContentError> {
        if events.is_empty() {
            return Err(ContentError::EmptySequence {
                task_id: task_id.to_owned(),
                pass_index,
            });
        }
        Ok(Self { events })
    }

    /// The events, in execution order.
    #[must_use]
    pub fn events(&self) -> &[CompletionSequenceEvent] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always `false`; sequences are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every spawn point any step of this sequence spawns an item at.
    #[must_use]
    pub fn required_spawn_points(&self) -> Vec<SpawnPointKey> {
        self.events
            .iter()
            .flat_map(CompletionSequenceEvent::required_spawn_points)
            .collect()
    }
}

/// Static definition of a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDefinition {
    /// Task identifier.
    pub id: TaskId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Icon shown in the task list.
    pub icon: Option<IconId>,
    /// Stars spent to turn the task in.
    pub star_cost: u32,
    /// Number of completion passes needed.
    pub required_completion_count: u32,
    /// Requirements gating availability.
    pub unlock_requirements: Vec<Requirement>,
    /// One sequence per completion pass, consumed in order.
    pub completion_sequences: Vec<CompletionSequence>,
    /// Set when completing this task starts a chapter.
    pub chapter_start: Option<ChapterMarker>,
    /// Set when completing this task ends a chapter.
    pub chapter_end: Option<ChapterMarker>,
}

impl TaskDefinition {
    /// Sequence run for a given pass, if authored.
    #[must_use]
    pub fn sequence_for_pass(&self, pass_index: u32) -> Option<&CompletionSequence> {
        usize::try_from(pass_index)
            .ok()
            .and_then(|index| self.completion_sequences.get(index))
    }
}

/// Static definition of a chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterDefinition {
    /// Chapter identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Requirements that, once met, mark the chapter complete.
    pub completion_requirements: Vec<Requirement>,
    /// Tasks in configured order.
    pub tasks: Vec<TaskDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_completion_sequence_is_rejected() {
        let result = CompletionSequence::new("t_01", 0, Vec::new());

        match result {
            Err(ContentError::EmptySequence {
                task_id,
                pass_index,
            }) => {
                assert_eq!(task_id, "t_01");
                assert_eq!(pass_index, 0);
            }
            other => panic!("expected EmptySequence, got {other:?}"),
        }
    }

    #[test]
    fn test_required_spawn_points_only_cover_focus_and_interactable_steps() {
        // Arrange
        let sequence = CompletionSequence::new(
            "t_01",
            0,
            vec![
                CompletionSequenceEvent::Dialogue {
                    dialogue_id: "intro".to_owned(),
                },
                CompletionSequenceEvent::FocusOnItem {
                    room_id: "kitchen".to_owned(),
                    spawn_id: "counter".to_owned(),
                    item_id: "mop".to_owned(),
                },
                CompletionSequenceEvent::InteractableItems {
                    room_id: "patio".to_owned(),
                    item_id: "leaf".to_owned(),
                    icon_id: "sweep".to_owned(),
                    spawn_ids: vec!["a".to_owned(), "b".to_owned()],
                },
                CompletionSequenceEvent::UnlockRoom {
                    room_id: "patio".to_owned(),
                },
            ],
        )
        .unwrap();

        // Act
        let spawn_points = sequence.required_spawn_points();

        // Assert
        assert_eq!(
            spawn_points,
            vec![
                SpawnPointKey::new("kitchen", "counter"),
                SpawnPointKey::new("patio", "a"),
                SpawnPointKey::new("patio", "b"),
            ]
        );
    }
}
