//! On-disk document shapes and their conversion into the domain model.

use diner_core::ids::{ChapterMarker, PropSwap};
use diner_core::requirement::Requirement;
use serde::Deserialize;

use super::model::{CompletionSequence, CompletionSequenceEvent, TaskDefinition};
use crate::error::ContentError;

/// Root document: the ordered chapter list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RootDocument {
    pub chapters: Vec<ChapterDocument>,
}

/// One chapter. Inline tasks come first, then referenced documents in order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ChapterDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completion_requirements: Vec<Requirement>,
    #[serde(default)]
    pub tasks: Vec<TaskDocument>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// A referenced child document contributing tasks to its chapter.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TaskListDocument {
    #[serde(default)]
    pub tasks: Vec<TaskDocument>,
    #[serde(default)]
    pub references: Vec<String>,
}

fn default_required_completion_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TaskDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub star_cost: u32,
    #[serde(default = "default_required_completion_count")]
    pub required_completion_count: u32,
    #[serde(default)]
    pub unlock_requirements: Vec<Requirement>,
    #[serde(default)]
    pub completion_sequences: Vec<Vec<EventDocument>>,
    #[serde(default)]
    pub chapter_start: Option<ChapterMarker>,
    #[serde(default)]
    pub chapter_end: Option<ChapterMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum EventType {
    Dialogue,
    FocusOnItem,
    InteractableItems,
    PlaceProp,
    ForceSwapProps,
    UnlockRoom,
    EndGamePopUp,
    None,
}

/// Flat event shape; which fields are required depends on `type`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EventDocument {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub dialogue_id: Option<String>,
    pub room_id: Option<String>,
    pub spawn_id: Option<String>,
    pub item_id: Option<String>,
    pub icon_id: Option<String>,
    pub spawn_ids: Option<Vec<String>>,
    pub node_id: Option<String>,
    pub prop_tags: Option<Vec<String>>,
    pub swaps: Option<Vec<PropSwap>>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub sprite_path: Option<String>,
}

/// A converted task plus anything suspicious found on the way.
pub(crate) struct ConvertedTask {
    pub definition: TaskDefinition,
    pub notes: Vec<EventNote>,
}

/// A non-fatal problem found in one event.
pub(crate) struct EventNote {
    pub pass_index: usize,
    pub event_index: usize,
    pub message: String,
}

fn required<T>(
    value: Option<T>,
    task_id: &str,
    event_type: &'static str,
    field: &'static str,
) -> Result<T, ContentError> {
    value.ok_or_else(|| ContentError::MissingField {
        task_id: task_id.to_owned(),
        event_type,
        field,
    })
}

impl EventDocument {
    /// Names of every payload field that was set.
    fn populated_fields(&self) -> Vec<&'static str> {
        [
            ("dialogue_id", self.dialogue_id.is_some()),
            ("room_id", self.room_id.is_some()),
            ("spawn_id", self.spawn_id.is_some()),
            ("item_id", self.item_id.is_some()),
            ("icon_id", self.icon_id.is_some()),
            ("spawn_ids", self.spawn_ids.is_some()),
            ("node_id", self.node_id.is_some()),
            ("prop_tags", self.prop_tags.is_some()),
            ("swaps", self.swaps.is_some()),
            ("title", self.title.is_some()),
            ("message", self.message.is_some()),
            ("sprite_path", self.sprite_path.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Converts into a domain event. A `none` event carrying payload fields
    /// still converts, and the stray fields are returned as a note.
    fn into_event(
        self,
        task_id: &str,
    ) -> Result<(CompletionSequenceEvent, Option<String>), ContentError> {
        let event = match self.event_type {
            EventType::Dialogue => CompletionSequenceEvent::Dialogue {
                dialogue_id: required(self.dialogue_id, task_id, "dialogue", "dialogue_id")?,
            },
            EventType::FocusOnItem => CompletionSequenceEvent::FocusOnItem {
                room_id: required(self.room_id, task_id, "focus_on_item", "room_id")?,
                spawn_id: required(self.spawn_id, task_id, "focus_on_item", "spawn_id")?,
                item_id: required(self.item_id, task_id, "focus_on_item", "item_id")?,
            },
            EventType::InteractableItems => CompletionSequenceEvent::InteractableItems {
                room_id: required(self.room_id, task_id, "interactable_items", "room_id")?,
                item_id: required(self.item_id, task_id, "interactable_items", "item_id")?,
                icon_id: required(self.icon_id, task_id, "interactable_items", "icon_id")?,
                spawn_ids: required(self.spawn_ids, task_id, "interactable_items", "spawn_ids")?,
            },
            EventType::PlaceProp => CompletionSequenceEvent::PlaceProp {
                room_id: required(self.room_id, task_id, "place_prop", "room_id")?,
                node_id: required(self.node_id, task_id, "place_prop", "node_id")?,
                prop_tags: self.prop_tags.unwrap_or_default(),
            },
            EventType::ForceSwapProps => CompletionSequenceEvent::ForceSwapProps {
                swaps: required(self.swaps, task_id, "force_swap_props", "swaps")?,
            },
            EventType::UnlockRoom => CompletionSequenceEvent::UnlockRoom {
                room_id: required(self.room_id, task_id, "unlock_room", "room_id")?,
            },
            EventType::EndGamePopUp => CompletionSequenceEvent::EndGamePopUp {
                title: required(self.title, task_id, "end_game_pop_up", "title")?,
                message: required(self.message, task_id, "end_game_pop_up", "message")?,
                sprite_path: self.sprite_path,
            },
            EventType::None => {
                let stray = self.populated_fields();
                let note = (!stray.is_empty())
                    .then(|| format!("none event carries payload fields: {}", stray.join(", ")));
                return Ok((CompletionSequenceEvent::None, note));
            }
        };
        Ok((event, None))
    }
}

impl TaskDocument {
    pub(crate) fn into_definition(self) -> Result<ConvertedTask, ContentError> {
        let mut notes = Vec::new();
        let mut completion_sequences = Vec::with_capacity(self.completion_sequences.len());

        for (pass_index, events) in self.completion_sequences.into_iter().enumerate() {
            let mut converted = Vec::with_capacity(events.len());
            for (event_index, event) in events.into_iter().enumerate() {
                let (event, note) = event.into_event(&self.id)?;
                if let Some(message) = note {
                    notes.push(EventNote {
                        pass_index,
                        event_index,
                        message,
                    });
                }
                converted.push(event);
            }
            completion_sequences.push(CompletionSequence::new(&self.id, pass_index, converted)?);
        }

        Ok(ConvertedTask {
            definition: TaskDefinition {
                id: self.id,
                name: self.name,
                description: self.description,
                icon: self.icon,
                star_cost: self.star_cost,
                required_completion_count: self.required_completion_count,
                unlock_requirements: self.unlock_requirements,
                completion_sequences,
                chapter_start: self.chapter_start,
                chapter_end: self.chapter_end,
            },
            notes,
        })
    }
}
