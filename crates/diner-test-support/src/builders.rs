//! Builders for content definitions used in tests.

use diner_content::domain::model::{
    ChapterDefinition, CompletionSequence, CompletionSequenceEvent, TaskDefinition,
};
use diner_core::ids::ChapterMarker;
use diner_core::requirement::Requirement;

/// Builds a [`TaskDefinition`] with sensible defaults: one required
/// completion, no cost, no requirements, no sequences.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    definition: TaskDefinition,
}

impl TaskBuilder {
    /// Starts a task with the given id; the name defaults to the id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            definition: TaskDefinition {
                id: id.to_owned(),
                name: id.to_owned(),
                description: String::new(),
                icon: None,
                star_cost: 0,
                required_completion_count: 1,
                unlock_requirements: Vec::new(),
                completion_sequences: Vec::new(),
                chapter_start: None,
                chapter_end: None,
            },
        }
    }

    /// Sets the star cost.
    #[must_use]
    pub fn star_cost(mut self, cost: u32) -> Self {
        self.definition.star_cost = cost;
        self
    }

    /// Sets the required completion count.
    #[must_use]
    pub fn required_completions(mut self, count: u32) -> Self {
        self.definition.required_completion_count = count;
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: &str) -> Self {
        self.definition.icon = Some(icon.to_owned());
        self
    }

    /// Adds an unlock requirement of the given kind.
    #[must_use]
    pub fn requires(mut self, kind: &str) -> Self {
        self.definition.unlock_requirements.push(Requirement::new(kind));
        self
    }

    /// Appends a completion sequence.
    ///
    /// # Panics
    ///
    /// Panics if `events` is empty.
    #[must_use]
    pub fn sequence(mut self, events: Vec<CompletionSequenceEvent>) -> Self {
        let pass_index = self.definition.completion_sequences.len();
        let sequence = CompletionSequence::new(&self.definition.id, pass_index, events)
            .expect("test sequences must not be empty");
        self.definition.completion_sequences.push(sequence);
        self
    }

    /// Marks the task as ending a chapter.
    #[must_use]
    pub fn ends_chapter(mut self, id: &str, name: &str) -> Self {
        self.definition.chapter_end = Some(ChapterMarker {
            id: id.to_owned(),
            name: name.to_owned(),
        });
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> TaskDefinition {
        self.definition
    }
}

/// Builds a [`ChapterDefinition`].
#[derive(Debug, Clone)]
pub struct ChapterBuilder {
    definition: ChapterDefinition,
}

impl ChapterBuilder {
    /// Starts a chapter with the given id; the name defaults to the id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            definition: ChapterDefinition {
                id: id.to_owned(),
                name: id.to_owned(),
                completion_requirements: Vec::new(),
                tasks: Vec::new(),
            },
        }
    }

    /// Adds a task.
    #[must_use]
    pub fn task(mut self, task: TaskBuilder) -> Self {
        self.definition.tasks.push(task.build());
        self
    }

    /// Adds a chapter completion requirement of the given kind.
    #[must_use]
    pub fn completed_when(mut self, kind: &str) -> Self {
        self.definition
            .completion_requirements
            .push(Requirement::new(kind));
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> ChapterDefinition {
        self.definition
    }
}
