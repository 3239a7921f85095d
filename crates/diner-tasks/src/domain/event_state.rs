//! Runtime controller for one completion sequence event.
//!
//! Lifecycle: [`begin`](CompletionSequenceEventStateMachine::begin) once,
//! [`tick`](CompletionSequenceEventStateMachine::tick) every frame until
//! [`completion_criteria_met`](CompletionSequenceEventStateMachine::completion_criteria_met),
//! then [`complete`](CompletionSequenceEventStateMachine::complete), which
//! registers this event's persistence on the sequence-wide broadcast instead
//! of performing it immediately.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use diner_content::domain::model::CompletionSequenceEvent;
use diner_core::ids::{PropId, SpawnPointKey, TaskId};
use diner_core::services::{
    BuildModeContext, Completion, PopupKind, PopupRequest, Services, SpawnPointState,
};
use diner_core::signal::Signal;

/// Drives a single [`CompletionSequenceEvent`].
#[derive(Debug)]
pub struct CompletionSequenceEventStateMachine {
    task_id: TaskId,
    event: CompletionSequenceEvent,
    services: Services,
    begun: bool,
    criteria_met: Rc<Cell<bool>>,
    camera_settled: Rc<Cell<bool>>,
    build_mode_open: Rc<Cell<bool>>,
    placed_prop: Rc<RefCell<Option<PropId>>>,
}

impl CompletionSequenceEventStateMachine {
    /// Creates a controller for `event`, run on behalf of `task_id`.
    #[must_use]
    pub fn new(task_id: &str, event: CompletionSequenceEvent, services: Services) -> Self {
        Self {
            task_id: task_id.to_owned(),
            event,
            services,
            begun: false,
            criteria_met: Rc::new(Cell::new(false)),
            camera_settled: Rc::new(Cell::new(false)),
            build_mode_open: Rc::new(Cell::new(false)),
            placed_prop: Rc::new(RefCell::new(None)),
        }
    }

    /// The event being driven.
    #[must_use]
    pub fn event(&self) -> &CompletionSequenceEvent {
        &self.event
    }

    /// Whether the event is done and may be completed.
    #[must_use]
    pub fn completion_criteria_met(&self) -> bool {
        self.criteria_met.get()
    }

    fn mark_met(&self) -> Completion {
        let met = Rc::clone(&self.criteria_met);
        Box::new(move || met.set(true))
    }

    /// Performs the event's one-time side effect.
    pub fn begin(&mut self) {
        if self.begun {
            tracing::error!(
                task_id = %self.task_id,
                event_type = self.event.type_name(),
                "event already begun"
            );
            return;
        }
        self.begun = true;
        tracing::debug!(task_id = %self.task_id, event_type = self.event.type_name(), "event begin");

        let world = &self.services.world;
        match &self.event {
            CompletionSequenceEvent::Dialogue { dialogue_id } => {
                let skippable = self.services.session.has_seen_dialogue(dialogue_id);
                self.services
                    .overlay
                    .play_narrative(dialogue_id, skippable, self.mark_met());
            }
            CompletionSequenceEvent::FocusOnItem {
                room_id,
                spawn_id,
                item_id,
            } => {
                let spawn = SpawnPointKey::new(room_id.clone(), spawn_id.clone());
                if world.spawn_point_state(&spawn) == SpawnPointState::Empty {
                    world.spawn_item(&spawn, item_id, &self.task_id);
                }
                let settled = Rc::clone(&self.camera_settled);
                world.focus_camera(&spawn, Box::new(move || settled.set(true)));
            }
            CompletionSequenceEvent::InteractableItems {
                room_id,
                item_id,
                icon_id,
                spawn_ids,
            } => {
                for spawn_id in spawn_ids {
                    let spawn = SpawnPointKey::new(room_id.clone(), spawn_id.clone());
                    if world.spawn_point_state(&spawn) == SpawnPointState::Empty {
                        world.spawn_item(&spawn, item_id, &self.task_id);
                    }
                    world.arm_interactable(&spawn, item_id, icon_id);
                }
            }
            CompletionSequenceEvent::PlaceProp { .. } => {
                self.services.overlay.set_task_list_enabled(false);
                self.open_build_mode();
            }
            CompletionSequenceEvent::ForceSwapProps { swaps } => {
                let met = Rc::clone(&self.criteria_met);
                let task_id = self.task_id.clone();
                world.swap_props(
                    swaps,
                    Box::new(move |applied| {
                        if !applied {
                            tracing::warn!(%task_id, "forced prop swap did not fully apply");
                        }
                        met.set(true);
                    }),
                );
            }
            CompletionSequenceEvent::UnlockRoom { room_id } => {
                world.play_room_unlock(room_id, self.mark_met());
            }
            CompletionSequenceEvent::EndGamePopUp {
                title,
                message,
                sprite_path,
            } => {
                let met = Rc::clone(&self.criteria_met);
                self.services.overlay.show_popup(
                    PopupRequest {
                        kind: PopupKind::EndGame,
                        title: title.clone(),
                        message: message.clone(),
                        sprite_path: sprite_path.clone(),
                    },
                    Box::new(move |_confirmed| met.set(true)),
                );
            }
            CompletionSequenceEvent::None => self.criteria_met.set(true),
        }
    }

    fn open_build_mode(&self) {
        let CompletionSequenceEvent::PlaceProp {
            room_id,
            node_id,
            prop_tags,
        } = &self.event
        else {
            return;
        };

        self.build_mode_open.set(true);
        let open = Rc::clone(&self.build_mode_open);
        let met = Rc::clone(&self.criteria_met);
        let placed = Rc::clone(&self.placed_prop);
        self.services.world.enter_build_mode(
            BuildModeContext {
                task_id: self.task_id.clone(),
                room_id: room_id.clone(),
                node_id: node_id.clone(),
                prop_tags: prop_tags.clone(),
            },
            Box::new(move |prop| {
                open.set(false);
                if let Some(prop) = prop {
                    *placed.borrow_mut() = Some(prop);
                    met.set(true);
                }
            }),
        );
    }

    /// Re-polls external state; called once per frame while current.
    pub fn tick(&mut self) {
        if !self.begun {
            tracing::error!(task_id = %self.task_id, "event ticked before begin");
            return;
        }
        if self.criteria_met.get() {
            return;
        }

        let world = &self.services.world;
        match &self.event {
            CompletionSequenceEvent::FocusOnItem {
                room_id, spawn_id, ..
            } => {
                let spawn = SpawnPointKey::new(room_id.clone(), spawn_id.clone());
                if self.camera_settled.get()
                    && world.spawn_point_state(&spawn) == SpawnPointState::Interacted
                {
                    self.criteria_met.set(true);
                }
            }
            CompletionSequenceEvent::InteractableItems {
                room_id, spawn_ids, ..
            } => {
                let interacted = spawn_ids
                    .iter()
                    .filter(|spawn_id| {
                        let spawn = SpawnPointKey::new(room_id.clone(), (*spawn_id).clone());
                        world.spawn_point_state(&spawn) == SpawnPointState::Interacted
                    })
                    .count();
                if interacted >= spawn_ids.len() {
                    self.criteria_met.set(true);
                }
            }
            CompletionSequenceEvent::PlaceProp { .. } => {
                // Build mode was closed without placing anything.
                if !self.build_mode_open.get() {
                    tracing::debug!(task_id = %self.task_id, "reopening build mode");
                    self.open_build_mode();
                }
            }
            CompletionSequenceEvent::Dialogue { .. }
            | CompletionSequenceEvent::ForceSwapProps { .. }
            | CompletionSequenceEvent::UnlockRoom { .. }
            | CompletionSequenceEvent::EndGamePopUp { .. }
            | CompletionSequenceEvent::None => {}
        }
    }

    /// Registers this event's deferred persistence on `on_all_events_persisted`.
    pub fn complete(&self, on_all_events_persisted: &Signal<()>) {
        if !self.criteria_met.get() {
            tracing::error!(
                task_id = %self.task_id,
                event_type = self.event.type_name(),
                "event completed before its criteria were met"
            );
            return;
        }

        let session = Rc::clone(&self.services.session);
        let world = Rc::clone(&self.services.world);
        match &self.event {
            CompletionSequenceEvent::Dialogue { dialogue_id } => {
                let dialogue_id = dialogue_id.clone();
                on_all_events_persisted.subscribe(move |()| session.on_dialogue_seen(&dialogue_id));
            }
            CompletionSequenceEvent::FocusOnItem {
                room_id, spawn_id, ..
            } => {
                let spawn = SpawnPointKey::new(room_id.clone(), spawn_id.clone());
                on_all_events_persisted.subscribe(move |()| world.clear_spawn_point(&spawn));
            }
            CompletionSequenceEvent::InteractableItems {
                room_id, spawn_ids, ..
            } => {
                let spawns: Vec<SpawnPointKey> = spawn_ids
                    .iter()
                    .map(|spawn_id| SpawnPointKey::new(room_id.clone(), spawn_id.clone()))
                    .collect();
                on_all_events_persisted.subscribe(move |()| {
                    for spawn in &spawns {
                        world.clear_spawn_point(spawn);
                    }
                });
            }
            CompletionSequenceEvent::PlaceProp {
                room_id, node_id, ..
            } => {
                let room_id = room_id.clone();
                let node_id = node_id.clone();
                let placed = self.placed_prop.borrow().clone();
                let overlay = Rc::clone(&self.services.overlay);
                on_all_events_persisted.subscribe(move |()| {
                    if let Some(prop_id) = &placed {
                        session.on_prop_swapped(&room_id, &node_id, prop_id);
                    }
                    overlay.set_task_list_enabled(true);
                });
            }
            CompletionSequenceEvent::ForceSwapProps { swaps } => {
                let swaps = swaps.clone();
                on_all_events_persisted.subscribe(move |()| {
                    for swap in &swaps {
                        session.on_prop_swapped(&swap.room_id, &swap.node_id, &swap.prop_id);
                    }
                });
            }
            CompletionSequenceEvent::UnlockRoom { room_id } => {
                let room_id = room_id.clone();
                on_all_events_persisted.subscribe(move |()| session.unlock_room(&room_id));
            }
            CompletionSequenceEvent::EndGamePopUp { .. } | CompletionSequenceEvent::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diner_core::ids::PropSwap;
    use diner_test_support::FakeServices;

    fn machine(fakes: &FakeServices, event: CompletionSequenceEvent) -> CompletionSequenceEventStateMachine {
        CompletionSequenceEventStateMachine::new("t_01", event, fakes.services())
    }

    #[test]
    fn test_none_event_is_met_on_begin() {
        let fakes = FakeServices::new();
        let mut event = machine(&fakes, CompletionSequenceEvent::None);

        event.begin();

        assert!(event.completion_criteria_met());
    }

    #[test]
    fn test_dialogue_waits_for_narrative_callback_and_defers_seen_flag() {
        // Arrange
        let fakes = FakeServices::new();
        let broadcast = Signal::new("test");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::Dialogue {
                dialogue_id: "intro".to_owned(),
            },
        );

        // Act
        event.begin();
        event.tick();
        let met_before_callback = event.completion_criteria_met();
        fakes.overlay.finish_narrative();
        event.complete(&broadcast);
        let seen_before_broadcast = fakes.session.seen_dialogues();
        broadcast.emit(&());

        // Assert
        assert!(!met_before_callback);
        assert!(event.completion_criteria_met());
        assert_eq!(fakes.overlay.narratives(), vec![("intro".to_owned(), false)]);
        assert!(seen_before_broadcast.is_empty());
        assert_eq!(fakes.session.seen_dialogues(), vec!["intro".to_owned()]);
    }

    #[test]
    fn test_focus_on_item_needs_camera_and_interaction() {
        // Arrange
        let fakes = FakeServices::new();
        let spawn = SpawnPointKey::new("kitchen", "oven_spot");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::FocusOnItem {
                room_id: "kitchen".to_owned(),
                spawn_id: "oven_spot".to_owned(),
                item_id: "wrench".to_owned(),
            },
        );

        // Act / Assert
        event.begin();
        assert_eq!(fakes.world.focus_requests(), vec![spawn.clone()]);
        assert!(fakes.world.spawned_items().contains_key(&spawn));

        fakes.world.interact(&spawn);
        event.tick();
        assert!(!event.completion_criteria_met());

        fakes.world.finish_camera_focus();
        event.tick();
        assert!(event.completion_criteria_met());

        let broadcast = Signal::new("test");
        event.complete(&broadcast);
        broadcast.emit(&());
        assert_eq!(fakes.world.cleared_spawn_points(), vec![spawn]);
    }

    #[test]
    fn test_interactable_items_counts_interacted_spawn_points() {
        // Arrange
        let fakes = FakeServices::new();
        let first = SpawnPointKey::new("patio", "a");
        let second = SpawnPointKey::new("patio", "b");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::InteractableItems {
                room_id: "patio".to_owned(),
                item_id: "leaf".to_owned(),
                icon_id: "sweep".to_owned(),
                spawn_ids: vec!["a".to_owned(), "b".to_owned()],
            },
        );

        // Act / Assert
        event.begin();
        assert_eq!(fakes.world.armed().len(), 2);

        fakes.world.interact(&first);
        event.tick();
        assert!(!event.completion_criteria_met());

        fakes.world.interact(&second);
        event.tick();
        assert!(event.completion_criteria_met());
    }

    #[test]
    fn test_place_prop_reopens_build_mode_when_cancelled() {
        // Arrange
        let fakes = FakeServices::new();
        let broadcast = Signal::new("test");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::PlaceProp {
                room_id: "patio".to_owned(),
                node_id: "n1".to_owned(),
                prop_tags: vec!["table".to_owned()],
            },
        );

        // Act
        event.begin();
        fakes.world.confirm_build_mode(None);
        event.tick();
        fakes.world.confirm_build_mode(Some("table_oak"));
        event.tick();
        event.complete(&broadcast);
        broadcast.emit(&());

        // Assert
        assert_eq!(fakes.world.build_requests().len(), 2);
        assert_eq!(fakes.world.build_requests()[0].prop_tags, vec!["table".to_owned()]);
        assert!(event.completion_criteria_met());
        assert_eq!(
            fakes.session.swapped_props(),
            vec![("patio".to_owned(), "n1".to_owned(), "table_oak".to_owned())]
        );
        assert_eq!(fakes.overlay.task_list_toggles(), vec![false, true]);
    }

    #[test]
    fn test_force_swap_props_completes_even_when_swap_fails() {
        // Arrange
        let fakes = FakeServices::new();
        let swap = PropSwap {
            room_id: "patio".to_owned(),
            node_id: "n1".to_owned(),
            prop_id: "chair_red".to_owned(),
        };
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::ForceSwapProps {
                swaps: vec![swap.clone()],
            },
        );

        // Act
        event.begin();
        let met_before = event.completion_criteria_met();
        fakes.world.resolve_prop_swap(false);

        // Assert
        assert!(!met_before);
        assert!(event.completion_criteria_met());
        assert_eq!(fakes.world.swap_requests(), vec![vec![swap]]);
    }

    #[test]
    fn test_unlock_room_defers_unlock_until_broadcast() {
        // Arrange
        let fakes = FakeServices::new();
        let broadcast = Signal::new("test");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::UnlockRoom {
                room_id: "patio".to_owned(),
            },
        );

        // Act
        event.begin();
        fakes.world.finish_room_unlock();
        event.complete(&broadcast);
        let unlocked_before = fakes.session.unlocked_rooms();
        broadcast.emit(&());

        // Assert
        assert!(unlocked_before.is_empty());
        assert_eq!(fakes.session.unlocked_rooms(), vec!["patio".to_owned()]);
    }

    #[test]
    fn test_end_game_popup_waits_for_dismissal() {
        let fakes = FakeServices::new();
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::EndGamePopUp {
                title: "The End".to_owned(),
                message: "Thanks for playing".to_owned(),
                sprite_path: None,
            },
        );

        event.begin();
        assert!(!event.completion_criteria_met());
        fakes.overlay.dismiss_popup(true);

        assert!(event.completion_criteria_met());
        assert_eq!(fakes.overlay.popups()[0].title, "The End");
    }

    #[test]
    fn test_complete_before_criteria_registers_nothing() {
        let fakes = FakeServices::new();
        let broadcast = Signal::new("test");
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::UnlockRoom {
                room_id: "patio".to_owned(),
            },
        );

        event.begin();
        event.complete(&broadcast);

        assert_eq!(broadcast.listener_count(), 0);
    }

    #[test]
    fn test_second_begin_is_ignored() {
        let fakes = FakeServices::new();
        let mut event = machine(
            &fakes,
            CompletionSequenceEvent::Dialogue {
                dialogue_id: "intro".to_owned(),
            },
        );

        event.begin();
        event.begin();

        assert_eq!(fakes.overlay.narratives().len(), 1);
    }
}
