//! Single-flight orchestration of completion sequences.
//!
//! The Task Director owns at most one running [`CompletionSequenceStateMachine`].
//! Every method takes `&self` so UI surfaces can ask
//! [`TaskDirector::is_task_sequence_running`] while a begin or a completion is
//! suspended on an external callback or a save.

use std::cell::{Cell, RefCell};

use diner_content::domain::model::TaskDefinition;
use diner_core::ids::TaskId;
use diner_core::services::{Currency, Services};
use diner_core::signal::Signal;
use tracing::Instrument;
use uuid::Uuid;

use super::task_manager::{TaskManager, task_update};
use crate::domain::sequence_state::CompletionSequenceStateMachine;
use crate::domain::task::Task;

struct ActiveRun {
    run_id: Uuid,
    span: tracing::Span,
    task_id: TaskId,
    pass_index: u32,
    definition: TaskDefinition,
    machine: CompletionSequenceStateMachine,
}

/// Runs one task's completion sequence at a time.
pub struct TaskDirector {
    services: Services,
    running: Cell<bool>,
    current: RefCell<Option<ActiveRun>>,
    withheld_stars: Cell<u32>,
    stars_withheld: Signal<u32>,
    task_completed: Signal<TaskId>,
    sequence_complete: Signal<TaskId>,
}

impl std::fmt::Debug for TaskDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDirector")
            .field("running", &self.running.get())
            .field("withheld_stars", &self.withheld_stars.get())
            .field("current_task_id", &self.current_task_id())
            .finish_non_exhaustive()
    }
}

impl TaskDirector {
    /// Creates an idle director.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            running: Cell::new(false),
            current: RefCell::new(None),
            withheld_stars: Cell::new(0),
            stars_withheld: Signal::new("stars_withheld"),
            task_completed: Signal::new("task_completed"),
            sequence_complete: Signal::new("sequence_complete"),
        }
    }

    /// Whether a completion sequence is running. Stays `true` until the
    /// completion save settled.
    #[must_use]
    pub fn is_task_sequence_running(&self) -> bool {
        self.running.get()
    }

    /// Stars reserved by the running sequence but not yet spent.
    #[must_use]
    pub fn withheld_stars(&self) -> u32 {
        self.withheld_stars.get()
    }

    /// Star balance as UI surfaces should display it.
    #[must_use]
    pub fn displayed_star_balance(&self) -> u32 {
        self.services
            .session
            .currency_balance(Currency::Stars)
            .saturating_sub(self.withheld_stars.get())
    }

    /// Task whose sequence is running, if its events are still in progress.
    #[must_use]
    pub fn current_task_id(&self) -> Option<TaskId> {
        self.current
            .try_borrow()
            .ok()
            .and_then(|current| current.as_ref().map(|run| run.task_id.clone()))
    }

    /// Fired with the withheld amount when a sequence starts.
    #[must_use]
    pub fn stars_withheld(&self) -> &Signal<u32> {
        &self.stars_withheld
    }

    /// Fired with the task id once a pass was persisted.
    #[must_use]
    pub fn task_completed(&self) -> &Signal<TaskId> {
        &self.task_completed
    }

    /// Fired with the task id right after [`TaskDirector::task_completed`].
    #[must_use]
    pub fn sequence_complete(&self) -> &Signal<TaskId> {
        &self.sequence_complete
    }

    /// Starts the next completion pass of `task` once `withdrawal` (the
    /// currency withdrawal animation) finished.
    ///
    /// Logs and does nothing if a sequence is already running, if the task
    /// has no sequence for its next pass, or if another begin won the race
    /// while `withdrawal` was pending.
    pub async fn instance_and_begin_completion_sequence_state<F>(&self, task: &Task, withdrawal: F)
    where
        F: Future<Output = ()>,
    {
        if self.running.get() {
            tracing::error!(task_id = %task.id(), "a completion sequence is already running");
            return;
        }

        withdrawal.await;

        if self.running.get() {
            tracing::error!(
                task_id = %task.id(),
                "a completion sequence started while the withdrawal was playing"
            );
            return;
        }

        let definition = task.definition();
        let pass_index = self.services.session.task_completion_count(task.id());
        let Some(sequence) = definition.sequence_for_pass(pass_index) else {
            tracing::error!(task_id = %task.id(), pass_index, "no completion sequence for pass");
            return;
        };

        self.running.set(true);
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("completion_sequence", %run_id, task_id = %task.id(), pass_index);
        let mut machine =
            CompletionSequenceStateMachine::new(task.id(), sequence.clone(), self.services.clone());

        {
            let _entered = span.enter();
            self.withheld_stars.set(definition.star_cost);
            self.stars_withheld.emit(&definition.star_cost);
            tracing::info!(star_cost = definition.star_cost, "completion sequence started");
            machine.begin();
        }

        *self.current.borrow_mut() = Some(ActiveRun {
            run_id,
            span,
            task_id: task.id().to_owned(),
            pass_index,
            definition: definition.clone(),
            machine,
        });
    }

    /// Per-frame tick. Completes the run once every event finished.
    pub async fn tick_current_completion_sequence_state(&self, manager: &mut TaskManager) {
        if !self.running.get() {
            return;
        }

        let finished = {
            let mut current = self.current.borrow_mut();
            let Some(run) = current.as_mut() else {
                // Completion is already in flight.
                return;
            };
            {
                let _entered = run.span.enter();
                run.machine.tick();
            }
            if !run.machine.completion_criteria_met() {
                return;
            }
            current.take()
        };

        if let Some(run) = finished {
            let span = run.span.clone();
            self.complete_run(run, manager).instrument(span).await;
        }
    }

    async fn complete_run(&self, mut run: ActiveRun, manager: &mut TaskManager) {
        let session = &self.services.session;
        let star_cost = run.definition.star_cost;

        run.machine.complete();
        if !session.lose_currency(Currency::Stars, star_cost, &run.task_id) {
            tracing::warn!(star_cost, "star balance could not cover the task cost");
        }
        self.withheld_stars.set(0);

        let completion_count = run.pass_index + 1;
        let completed = completion_count >= run.definition.required_completion_count;
        let update = task_update(&run.definition, completion_count, true, completed);
        if let Err(error) = session.on_task_updated(&run.task_id, &update).await {
            tracing::error!(%error, completion_count, "task completion was not persisted");
        }

        let marked = if completed {
            manager.mark_task_complete(&run.task_id)
        } else {
            Ok(())
        };
        if let Err(error) = marked {
            tracing::error!(%error, "completed task is not managed");
        }
        self.task_completed.emit(&run.task_id);
        self.sequence_complete.emit(&run.task_id);

        manager.refresh().await;
        self.running.set(false);
        tracing::info!(run_id = %run.run_id, completion_count, completed, "completion sequence finished");
    }
}
