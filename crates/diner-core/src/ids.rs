//! Identifier aliases and small value types shared across crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Task identifier, unique across all chapters.
pub type TaskId = String;
/// Room identifier.
pub type RoomId = String;
/// Spawn point identifier, unique within its room.
pub type SpawnId = String;
/// Placement node identifier, unique within its room.
pub type NodeId = String;
/// Spawnable item identifier.
pub type ItemId = String;
/// Prop identifier.
pub type PropId = String;
/// Narrative dialogue identifier.
pub type DialogueId = String;
/// Icon/sprite identifier.
pub type IconId = String;

/// A room + spawn point pair that can host one task item at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointKey {
    /// Room containing the spawn point.
    pub room_id: RoomId,
    /// Spawn point within the room.
    pub spawn_id: SpawnId,
}

impl SpawnPointKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(room_id: impl Into<RoomId>, spawn_id: impl Into<SpawnId>) -> Self {
        Self {
            room_id: room_id.into(),
            spawn_id: spawn_id.into(),
        }
    }
}

impl fmt::Display for SpawnPointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room_id, self.spawn_id)
    }
}

/// One forced prop placement: put `prop_id` on `node_id` in `room_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSwap {
    /// Room containing the node.
    pub room_id: RoomId,
    /// Node receiving the prop.
    pub node_id: NodeId,
    /// Prop to place.
    pub prop_id: PropId,
}

/// Chapter start/end marker attached to a task for analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMarker {
    /// Chapter identifier.
    pub id: String,
    /// Human-readable chapter name.
    pub name: String,
}
