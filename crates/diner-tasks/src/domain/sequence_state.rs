//! Steps one completion sequence's events in order.

use diner_content::domain::model::CompletionSequence;
use diner_core::ids::TaskId;
use diner_core::services::Services;
use diner_core::signal::Signal;

use super::event_state::CompletionSequenceEventStateMachine;

/// Drives a [`CompletionSequence`] one event at a time.
///
/// Each finished event registers its deferred persistence on a shared
/// broadcast; [`complete`](Self::complete) fires that broadcast once, after
/// the last event finished.
#[derive(Debug)]
pub struct CompletionSequenceStateMachine {
    task_id: TaskId,
    sequence: CompletionSequence,
    services: Services,
    current_event_index: usize,
    current: Option<CompletionSequenceEventStateMachine>,
    on_all_events_persisted: Signal<()>,
    begun: bool,
    finished: bool,
    persisted: bool,
}

impl CompletionSequenceStateMachine {
    /// Creates a machine for one pass of `task_id`.
    #[must_use]
    pub fn new(task_id: &str, sequence: CompletionSequence, services: Services) -> Self {
        Self {
            task_id: task_id.to_owned(),
            sequence,
            services,
            current_event_index: 0,
            current: None,
            on_all_events_persisted: Signal::new("on_all_events_persisted"),
            begun: false,
            finished: false,
            persisted: false,
        }
    }

    /// Index of the event currently running.
    #[must_use]
    pub fn current_event_index(&self) -> usize {
        self.current_event_index
    }

    /// `true` once every event finished.
    #[must_use]
    pub fn completion_criteria_met(&self) -> bool {
        self.finished
    }

    /// Starts the first event.
    pub fn begin(&mut self) {
        if self.begun {
            tracing::error!(task_id = %self.task_id, "sequence already begun");
            return;
        }
        self.begun = true;
        self.current_event_index = 0;
        self.start_current_event();
    }

    fn start_current_event(&mut self) {
        let Some(event) = self.sequence.events().get(self.current_event_index) else {
            self.finished = true;
            return;
        };
        tracing::debug!(
            task_id = %self.task_id,
            event_index = self.current_event_index,
            event_type = event.type_name(),
            "starting sequence event"
        );
        let mut machine = CompletionSequenceEventStateMachine::new(
            &self.task_id,
            event.clone(),
            self.services.clone(),
        );
        machine.begin();
        self.current = Some(machine);
    }

    /// Ticks the current event and advances past it once it is done.
    pub fn tick(&mut self) {
        if self.finished {
            return;
        }
        let Some(current) = self.current.as_mut() else {
            tracing::error!(task_id = %self.task_id, "sequence ticked with no current event");
            return;
        };

        current.tick();
        if !current.completion_criteria_met() {
            return;
        }

        current.complete(&self.on_all_events_persisted);
        self.current = None;
        self.current_event_index += 1;
        if self.current_event_index >= self.sequence.len() {
            tracing::debug!(task_id = %self.task_id, "sequence events finished");
            self.finished = true;
        } else {
            self.start_current_event();
        }
    }

    /// Runs every deferred persistence action, in event order.
    pub fn complete(&mut self) {
        if !self.finished {
            tracing::error!(
                task_id = %self.task_id,
                event_index = self.current_event_index,
                "sequence completed before its last event finished"
            );
            return;
        }
        if self.persisted {
            tracing::error!(task_id = %self.task_id, "sequence already completed");
            return;
        }
        self.persisted = true;
        self.on_all_events_persisted.emit(&());
        self.on_all_events_persisted.clear();
    }
}
