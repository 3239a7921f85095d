//! In-memory session/progress backend.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diner_core::error::EngineError;
use diner_core::services::{Currency, SessionService, TaskUpdate};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SessionState {
    completion_counts: HashMap<String, u32>,
    assigned: HashSet<String>,
    balances: HashMap<Currency, u32>,
    seen_dialogues: Vec<String>,
    unlocked_rooms: Vec<String>,
    swapped_props: Vec<(String, String, String)>,
    updates: Vec<(String, TaskUpdate)>,
    spends: Vec<(Currency, u32, String)>,
}

/// A session backend that keeps everything in memory.
///
/// Task updates are applied to the in-memory view before the (simulated)
/// save settles, matching an optimistic backend. Saves can be held open with
/// [`FakeSession::hold_saves`] or made to fail with
/// [`FakeSession::failing_saves`].
#[derive(Debug, Default)]
pub struct FakeSession {
    state: RefCell<SessionState>,
    fail_saves: Cell<bool>,
    hold_saves: Cell<bool>,
    save_gate: Notify,
}

impl FakeSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a task's persisted completion count, builder style.
    #[must_use]
    pub fn with_completion_count(self, task_id: &str, count: u32) -> Self {
        self.state
            .borrow_mut()
            .completion_counts
            .insert(task_id.to_owned(), count);
        self
    }

    /// Marks a task as previously shown, builder style.
    #[must_use]
    pub fn with_assigned(self, task_id: &str) -> Self {
        self.state.borrow_mut().assigned.insert(task_id.to_owned());
        self
    }

    /// Sets a currency balance, builder style.
    #[must_use]
    pub fn with_balance(self, currency: Currency, amount: u32) -> Self {
        self.state.borrow_mut().balances.insert(currency, amount);
        self
    }

    /// Makes every save report failure, builder style.
    #[must_use]
    pub fn failing_saves(self) -> Self {
        self.fail_saves.set(true);
        self
    }

    /// Holds every subsequent save open until [`FakeSession::release_saves`].
    pub fn hold_saves(&self) {
        self.hold_saves.set(true);
    }

    /// Lets one held save settle and stops holding new ones.
    pub fn release_saves(&self) {
        self.hold_saves.set(false);
        self.save_gate.notify_one();
    }

    /// Every task update received, in order.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, TaskUpdate)> {
        self.state.borrow().updates.clone()
    }

    /// Task updates received for one task, in order.
    #[must_use]
    pub fn updates_for(&self, task_id: &str) -> Vec<TaskUpdate> {
        self.state
            .borrow()
            .updates
            .iter()
            .filter(|(id, _)| id == task_id)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Dialogues recorded as seen, in order.
    #[must_use]
    pub fn seen_dialogues(&self) -> Vec<String> {
        self.state.borrow().seen_dialogues.clone()
    }

    /// Rooms recorded as unlocked, in order.
    #[must_use]
    pub fn unlocked_rooms(&self) -> Vec<String> {
        self.state.borrow().unlocked_rooms.clone()
    }

    /// Props recorded as placed, as `(room, node, prop)`, in order.
    #[must_use]
    pub fn swapped_props(&self) -> Vec<(String, String, String)> {
        self.state.borrow().swapped_props.clone()
    }

    /// Currency spends, as `(currency, amount, context)`, in order.
    #[must_use]
    pub fn spends(&self) -> Vec<(Currency, u32, String)> {
        self.state.borrow().spends.clone()
    }
}

#[async_trait(?Send)]
impl SessionService for FakeSession {
    fn task_completion_count(&self, task_id: &str) -> u32 {
        self.state
            .borrow()
            .completion_counts
            .get(task_id)
            .copied()
            .unwrap_or(0)
    }

    fn is_task_assigned(&self, task_id: &str) -> bool {
        self.state.borrow().assigned.contains(task_id)
    }

    async fn on_task_updated(&self, task_id: &str, update: &TaskUpdate) -> Result<(), EngineError> {
        {
            let mut state = self.state.borrow_mut();
            state
                .completion_counts
                .insert(task_id.to_owned(), update.completion_count);
            if update.assigned {
                state.assigned.insert(task_id.to_owned());
            }
            state.updates.push((task_id.to_owned(), update.clone()));
        }

        if self.hold_saves.get() {
            self.save_gate.notified().await;
        }

        if self.fail_saves.get() {
            return Err(EngineError::Persistence("save rejected".into()));
        }
        Ok(())
    }

    fn currency_balance(&self, currency: Currency) -> u32 {
        self.state
            .borrow()
            .balances
            .get(&currency)
            .copied()
            .unwrap_or(0)
    }

    fn lose_currency(&self, currency: Currency, amount: u32, context: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let balance = state.balances.entry(currency).or_insert(0);
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        state.spends.push((currency, amount, context.to_owned()));
        true
    }

    fn has_seen_dialogue(&self, dialogue_id: &str) -> bool {
        self.state
            .borrow()
            .seen_dialogues
            .iter()
            .any(|seen| seen == dialogue_id)
    }

    fn on_dialogue_seen(&self, dialogue_id: &str) {
        self.state
            .borrow_mut()
            .seen_dialogues
            .push(dialogue_id.to_owned());
    }

    fn unlock_room(&self, room_id: &str) {
        self.state
            .borrow_mut()
            .unlocked_rooms
            .push(room_id.to_owned());
    }

    fn on_prop_swapped(&self, room_id: &str, node_id: &str, prop_id: &str) {
        self.state.borrow_mut().swapped_props.push((
            room_id.to_owned(),
            node_id.to_owned(),
            prop_id.to_owned(),
        ));
    }
}
