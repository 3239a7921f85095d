//! Room, dialogue and icon catalog used for integrity checks.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Layout of one room: where items can spawn and where props can go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomLayout {
    /// Room identifier.
    pub id: String,
    /// Spawn point identifiers.
    #[serde(default)]
    pub spawn_points: HashSet<String>,
    /// Prop placement node identifiers.
    #[serde(default)]
    pub nodes: HashSet<String>,
}

/// Catalog document as written on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CatalogDocument {
    #[serde(default)]
    pub rooms: Vec<RoomLayout>,
    #[serde(default)]
    pub dialogues: HashSet<String>,
    #[serde(default)]
    pub icons: HashSet<String>,
}

/// Known rooms, dialogues and icons.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rooms: HashMap<String, RoomLayout>,
    dialogues: HashSet<String>,
    icons: HashSet<String>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room, builder style.
    #[must_use]
    pub fn with_room<S: Into<String>>(
        mut self,
        id: &str,
        spawn_points: impl IntoIterator<Item = S>,
        nodes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.rooms.insert(
            id.to_owned(),
            RoomLayout {
                id: id.to_owned(),
                spawn_points: spawn_points.into_iter().map(Into::into).collect(),
                nodes: nodes.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Adds a dialogue, builder style.
    #[must_use]
    pub fn with_dialogue(mut self, id: &str) -> Self {
        self.dialogues.insert(id.to_owned());
        self
    }

    /// Adds an icon, builder style.
    #[must_use]
    pub fn with_icon(mut self, id: &str) -> Self {
        self.icons.insert(id.to_owned());
        self
    }

    /// Looks up a room.
    #[must_use]
    pub fn room(&self, id: &str) -> Option<&RoomLayout> {
        self.rooms.get(id)
    }

    /// Whether a dialogue exists.
    #[must_use]
    pub fn has_dialogue(&self, id: &str) -> bool {
        self.dialogues.contains(id)
    }

    /// Whether an icon exists.
    #[must_use]
    pub fn has_icon(&self, id: &str) -> bool {
        self.icons.contains(id)
    }

    /// Number of rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl From<CatalogDocument> for Catalog {
    fn from(document: CatalogDocument) -> Self {
        Self {
            rooms: document
                .rooms
                .into_iter()
                .map(|room| (room.id.clone(), room))
                .collect(),
            dialogues: document.dialogues,
            icons: document.icons,
        }
    }
}
