//! Task lifecycle recompute, integrity validation and chapter progress.
//!
//! The Task Manager owns every chapter and task. [`TaskManager::update_active_tasks`]
//! rebuilds the active task set from scratch: it never patches individual
//! task states incrementally. Backend "task updated" calls produced by a
//! recompute are queued and sent by [`TaskManager::flush_pending_updates`],
//! so the recompute itself stays synchronous.

use std::collections::BTreeMap;

use diner_content::application::loader::ContentDiagnostic;
use diner_content::domain::catalog::Catalog;
use diner_content::domain::model::{ChapterDefinition, TaskDefinition};
use diner_core::error::EngineError;
use diner_core::ids::{SpawnPointKey, TaskId};
use diner_core::services::{Currency, Services, SpawnPointState, TaskUpdate};
use diner_core::signal::Signal;
use serde::Serialize;

use super::validation::{ValidationReport, validate_task_graph};
use super::views::TaskView;
use crate::domain::task::{Chapter, Task, TaskState};

/// A task held back this cycle because another active task already
/// occupies one of its spawn points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnConflict {
    /// Task forced to `Unavailable`.
    pub task_id: TaskId,
    /// Active task that owns the spawn point.
    pub blocking_task_id: TaskId,
    /// The contested spawn point.
    pub spawn: SpawnPointKey,
}

/// Decides which tasks of the current chapter are offered, and in what state.
#[derive(Debug)]
pub struct TaskManager {
    services: Services,
    chapters: Vec<Chapter>,
    current_chapter: Option<usize>,
    chapter_progress: f64,
    active: Vec<usize>,
    occupied: BTreeMap<SpawnPointKey, TaskId>,
    spawn_conflicts: Vec<SpawnConflict>,
    pending_updates: Vec<TaskId>,
    new_available_task_found: Signal<TaskId>,
    new_collectable_task_found: Signal<TaskId>,
    purge_task_notifications: Signal<()>,
    active_task_list_updated: Signal<Vec<TaskId>>,
}

impl TaskManager {
    /// Creates a manager over the loaded chapters. Nothing is offered until
    /// the first [`update_active_tasks`](Self::update_active_tasks).
    #[must_use]
    pub fn new(services: Services, chapters: Vec<ChapterDefinition>) -> Self {
        Self {
            services,
            chapters: chapters.into_iter().map(Chapter::from).collect(),
            current_chapter: None,
            chapter_progress: 0.0,
            active: Vec::new(),
            occupied: BTreeMap::new(),
            spawn_conflicts: Vec::new(),
            pending_updates: Vec::new(),
            new_available_task_found: Signal::new("new_available_task_found"),
            new_collectable_task_found: Signal::new("new_collectable_task_found"),
            purge_task_notifications: Signal::new("purge_task_notifications"),
            active_task_list_updated: Signal::new("active_task_list_updated"),
        }
    }

    /// Every chapter, in configured order.
    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// The first chapter not yet complete, as of the last recompute.
    #[must_use]
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.current_chapter.and_then(|index| self.chapters.get(index))
    }

    /// Share of the current chapter's tasks already complete, in `0.0..=1.0`.
    /// `1.0` when every chapter is complete.
    #[must_use]
    pub fn chapter_progress(&self) -> f64 {
        self.chapter_progress
    }

    /// Looks up a task by id. With duplicate ids the first one wins.
    #[must_use]
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.chapters
            .iter()
            .flat_map(|chapter| chapter.tasks.iter())
            .find(|task| task.id() == task_id)
    }

    /// Tasks currently offered, in configured order.
    #[must_use]
    pub fn active_tasks(&self) -> Vec<&Task> {
        let Some(chapter) = self.current_chapter() else {
            return Vec::new();
        };
        self.active
            .iter()
            .filter_map(|&index| chapter.tasks.get(index))
            .collect()
    }

    /// Views of the offered tasks, for UI surfaces.
    #[must_use]
    pub fn active_task_views(&self) -> Vec<TaskView> {
        self.active_tasks()
            .into_iter()
            .map(|task| TaskView::new(task, self.services.session.task_completion_count(task.id())))
            .collect()
    }

    /// Spawn conflicts found by the last recompute.
    #[must_use]
    pub fn spawn_conflicts(&self) -> &[SpawnConflict] {
        &self.spawn_conflicts
    }

    /// Fired with the task id when a task is offered but not yet seen.
    #[must_use]
    pub fn new_available_task_found(&self) -> &Signal<TaskId> {
        &self.new_available_task_found
    }

    /// Fired with the task id when a task becomes collectable for the first time.
    #[must_use]
    pub fn new_collectable_task_found(&self) -> &Signal<TaskId> {
        &self.new_collectable_task_found
    }

    /// Fired when the player opens the task list.
    #[must_use]
    pub fn purge_task_notifications(&self) -> &Signal<()> {
        &self.purge_task_notifications
    }

    /// Fired with the active task ids at the end of every recompute.
    #[must_use]
    pub fn active_task_list_updated(&self) -> &Signal<Vec<TaskId>> {
        &self.active_task_list_updated
    }

    /// Checks the task graph against `catalog` and marks every task with an
    /// integrity issue invalid.
    pub fn validate(
        &mut self,
        catalog: &Catalog,
        diagnostics: &[ContentDiagnostic],
    ) -> ValidationReport {
        let report = validate_task_graph(&self.chapters, catalog, diagnostics);
        let invalid = report.invalid_positions();
        for (chapter_index, chapter) in self.chapters.iter_mut().enumerate() {
            for (task_index, task) in chapter.tasks.iter_mut().enumerate() {
                task.valid = !invalid.contains(&(chapter_index, task_index));
            }
        }
        tracing::info!(issues = report.issues.len(), "task graph validated");
        report
    }

    /// Terminal transition used by the Task Director once a task's final
    /// pass is persisted.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::TaskNotFound` if no task has this id.
    pub fn mark_task_complete(&mut self, task_id: &str) -> Result<(), EngineError> {
        let task = self
            .chapters
            .iter_mut()
            .flat_map(|chapter| chapter.tasks.iter_mut())
            .find(|task| task.id() == task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_owned()))?;
        task.state = TaskState::Complete;
        tracing::debug!(task_id, "task complete");
        Ok(())
    }

    /// Recomputes the current chapter, its progress, and every task state.
    ///
    /// Safe to call while a completion sequence runs: a spawn point kept by
    /// the same task across recomputes is left untouched, so items the
    /// player already interacted with stay interacted. Spawn points that
    /// change owner or are no longer needed are cleared.
    pub fn update_active_tasks(&mut self) {
        let services = self.services.clone();
        let previous = std::mem::take(&mut self.occupied);
        self.active.clear();
        self.spawn_conflicts.clear();

        self.current_chapter = self
            .chapters
            .iter()
            .position(|chapter| !is_chapter_complete(&services, chapter));

        let Some(chapter_index) = self.current_chapter else {
            release_spawn_points(&services, &previous, &self.occupied);
            self.chapter_progress = 1.0;
            tracing::info!("every chapter complete");
            self.active_task_list_updated.emit(&Vec::new());
            return;
        };
        self.chapter_progress = chapter_progress(&services, &self.chapters[chapter_index]);

        for task_index in 0..self.chapters[chapter_index].tasks.len() {
            let state = self.evaluate_task(&services, &previous, chapter_index, task_index);
            let task = &mut self.chapters[chapter_index].tasks[task_index];
            if task.state != state {
                tracing::debug!(task_id = %task.id(), from = %task.state, to = %state, "task state changed");
            }
            task.state = state;
            if state.is_active() {
                self.active.push(task_index);
            }
        }
        release_spawn_points(&services, &previous, &self.occupied);

        let active_ids: Vec<TaskId> = self
            .active_tasks()
            .iter()
            .map(|task| task.id().to_owned())
            .collect();
        tracing::debug!(
            chapter_id = %self.chapters[chapter_index].id,
            progress = self.chapter_progress,
            active = active_ids.len(),
            "active tasks updated"
        );
        self.active_task_list_updated.emit(&active_ids);
    }

    fn evaluate_task(
        &mut self,
        services: &Services,
        previous: &BTreeMap<SpawnPointKey, TaskId>,
        chapter_index: usize,
        task_index: usize,
    ) -> TaskState {
        let task = &self.chapters[chapter_index].tasks[task_index];
        let definition = task.definition();
        let task_id = definition.id.as_str();
        let session = &services.session;

        if session.is_task_completed(task_id, definition.required_completion_count) {
            return TaskState::Complete;
        }
        if !task.is_valid() {
            return TaskState::Unavailable;
        }
        if !services
            .requirements
            .check_requirements_met(&definition.unlock_requirements)
        {
            return TaskState::Unavailable;
        }

        let completion_count = session.task_completion_count(task_id);
        let Some(sequence) = definition.sequence_for_pass(completion_count) else {
            tracing::error!(task_id, completion_count, "no completion sequence for next pass");
            return TaskState::Unavailable;
        };

        let conflicts: Vec<SpawnConflict> = sequence
            .required_spawn_points()
            .into_iter()
            .filter_map(|spawn| {
                let owner = self.occupied.get(&spawn)?;
                (owner != task_id).then(|| SpawnConflict {
                    task_id: task_id.to_owned(),
                    blocking_task_id: owner.clone(),
                    spawn,
                })
            })
            .collect();
        if !conflicts.is_empty() {
            for conflict in &conflicts {
                tracing::warn!(
                    task_id,
                    blocking_task_id = %conflict.blocking_task_id,
                    room_id = %conflict.spawn.room_id,
                    spawn_id = %conflict.spawn.spawn_id,
                    "spawn point already occupied, task held back"
                );
            }
            self.spawn_conflicts.extend(conflicts);
            return TaskState::Unavailable;
        }

        let assigned = session.is_task_assigned(task_id);
        let state = if session.currency_balance(Currency::Stars) >= definition.star_cost {
            if !assigned {
                queue_update(&mut self.pending_updates, task_id);
                self.new_collectable_task_found.emit(&task_id.to_owned());
            }
            TaskState::Collectable
        } else if assigned {
            TaskState::Assigned
        } else {
            self.new_available_task_found.emit(&task_id.to_owned());
            TaskState::Available
        };

        for event in sequence.events() {
            let Some(item_id) = event.spawned_item() else {
                continue;
            };
            for spawn in event.required_spawn_points() {
                if previous.get(&spawn).is_some_and(|owner| owner != task_id) {
                    services.world.clear_spawn_point(&spawn);
                }
                if services.world.spawn_point_state(&spawn) == SpawnPointState::Empty {
                    services.world.spawn_item(&spawn, item_id, task_id);
                }
                self.occupied.insert(spawn, task_id.to_owned());
            }
        }

        state
    }

    /// Sends every queued "task updated" call to the session backend, built
    /// from the task's completion count at send time. Failures are logged;
    /// nothing is retried.
    pub async fn flush_pending_updates(&mut self) {
        let session = self.services.session.clone();
        for task_id in std::mem::take(&mut self.pending_updates) {
            let Some(definition) = self.task(&task_id).map(Task::definition) else {
                continue;
            };
            let completion_count = session.task_completion_count(&task_id);
            let completed = completion_count >= definition.required_completion_count;
            let update = task_update(definition, completion_count, true, completed);
            if let Err(error) = session.on_task_updated(&task_id, &update).await {
                tracing::error!(%task_id, %error, "task update was not persisted");
            }
        }
    }

    /// Recomputes the active task set and sends the resulting updates.
    pub async fn refresh(&mut self) {
        self.update_active_tasks();
        self.flush_pending_updates().await;
    }

    /// Handles the player opening the task list: every `Available` task
    /// becomes `Assigned` and is persisted as such.
    pub async fn on_task_list_opened(&mut self) {
        if let Some(chapter_index) = self.current_chapter {
            for &task_index in &self.active {
                let task = &mut self.chapters[chapter_index].tasks[task_index];
                if task.state != TaskState::Available {
                    continue;
                }
                task.state = TaskState::Assigned;
                queue_update(&mut self.pending_updates, task.id());
            }
        }
        self.purge_task_notifications.emit(&());
        self.flush_pending_updates().await;
    }
}

fn release_spawn_points(
    services: &Services,
    previous: &BTreeMap<SpawnPointKey, TaskId>,
    occupied: &BTreeMap<SpawnPointKey, TaskId>,
) {
    for spawn in previous.keys().filter(|spawn| !occupied.contains_key(*spawn)) {
        services.world.clear_spawn_point(spawn);
    }
}

fn is_chapter_complete(services: &Services, chapter: &Chapter) -> bool {
    if chapter.completion_requirements.is_empty() {
        chapter
            .tasks
            .iter()
            .filter(|task| task.is_valid())
            .all(|task| is_persisted_complete(services, task.definition()))
    } else {
        services
            .requirements
            .check_requirements_met(&chapter.completion_requirements)
    }
}

fn chapter_progress(services: &Services, chapter: &Chapter) -> f64 {
    if chapter.tasks.is_empty() {
        return 1.0;
    }
    let completed = chapter
        .tasks
        .iter()
        .filter(|task| is_persisted_complete(services, task.definition()))
        .count();
    let completed = u32::try_from(completed).unwrap_or(u32::MAX);
    let total = u32::try_from(chapter.tasks.len()).unwrap_or(u32::MAX);
    f64::from(completed) / f64::from(total)
}

fn is_persisted_complete(services: &Services, definition: &TaskDefinition) -> bool {
    services
        .session
        .is_task_completed(&definition.id, definition.required_completion_count)
}

pub(crate) fn task_update(
    definition: &TaskDefinition,
    completion_count: u32,
    assigned: bool,
    completed: bool,
) -> TaskUpdate {
    TaskUpdate {
        completion_count,
        assigned,
        completed,
        chapter_start: definition.chapter_start.clone(),
        chapter_end: definition.chapter_end.clone(),
        star_cost: definition.star_cost,
    }
}

fn queue_update(pending: &mut Vec<TaskId>, task_id: &str) {
    if !pending.iter().any(|queued| queued == task_id) {
        pending.push(task_id.to_owned());
    }
}
