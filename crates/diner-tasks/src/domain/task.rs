//! Runtime task and chapter records.

use std::fmt;

use diner_content::domain::model::{ChapterDefinition, TaskDefinition};
use diner_core::requirement::Requirement;
use serde::Serialize;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Locked, invalid, or blocked this cycle.
    #[default]
    Unavailable,
    /// Offered and not yet seen by the player.
    Available,
    /// Offered and already seen, but not affordable.
    Assigned,
    /// Offered and affordable.
    Collectable,
    /// Every completion pass is done.
    Complete,
}

impl TaskState {
    /// Whether a task in this state belongs to the active task set.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Available | Self::Assigned | Self::Collectable)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Collectable => "collectable",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// A task definition plus its mutable lifecycle state.
#[derive(Debug, Clone)]
pub struct Task {
    definition: TaskDefinition,
    pub(crate) state: TaskState,
    pub(crate) valid: bool,
}

impl Task {
    /// Wraps a definition; new tasks start `Unavailable` and valid.
    #[must_use]
    pub fn new(definition: TaskDefinition) -> Self {
        Self {
            definition,
            state: TaskState::Unavailable,
            valid: true,
        }
    }

    /// Task identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// The immutable definition.
    #[must_use]
    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// `false` once integrity validation found a problem with this task.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// A chapter and its runtime tasks.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Chapter identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Requirements that, once met, mark the chapter complete.
    pub completion_requirements: Vec<Requirement>,
    /// Tasks in configured order.
    pub tasks: Vec<Task>,
}

impl From<ChapterDefinition> for Chapter {
    fn from(definition: ChapterDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            completion_requirements: definition.completion_requirements,
            tasks: definition.tasks.into_iter().map(Task::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_offered_states_are_active() {
        assert!(!TaskState::Unavailable.is_active());
        assert!(TaskState::Available.is_active());
        assert!(TaskState::Assigned.is_active());
        assert!(TaskState::Collectable.is_active());
        assert!(!TaskState::Complete.is_active());
    }
}
