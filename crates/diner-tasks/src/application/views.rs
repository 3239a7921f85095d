//! Read-only task views for UI surfaces.

use diner_core::ids::{IconId, TaskId};
use serde::Serialize;

use crate::domain::task::{Task, TaskState};

/// A task as shown in the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub icon: Option<IconId>,
    pub star_cost: u32,
    pub state: TaskState,
    pub completion_count: u32,
    pub required_completion_count: u32,
}

impl TaskView {
    /// Builds a view of `task` with its persisted completion count.
    #[must_use]
    pub fn new(task: &Task, completion_count: u32) -> Self {
        let definition = task.definition();
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            star_cost: definition.star_cost,
            state: task.state(),
            completion_count,
            required_completion_count: definition.required_completion_count,
        }
    }
}
