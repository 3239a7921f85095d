//! In-memory diner world scene.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use diner_core::ids::{PropId, PropSwap, SpawnPointKey};
use diner_core::services::{BuildModeContext, Completion, SpawnPointState, WorldService};

type PlacedCallback = Box<dyn FnOnce(Option<PropId>)>;
type SwapCallback = Box<dyn FnOnce(bool)>;

#[derive(Default)]
struct WorldState {
    spawned: BTreeMap<SpawnPointKey, (String, String)>,
    interacted: HashSet<SpawnPointKey>,
    spawn_calls: Vec<(SpawnPointKey, String, String)>,
    armed: Vec<(SpawnPointKey, String, String)>,
    cleared: Vec<SpawnPointKey>,
    focus_requests: Vec<SpawnPointKey>,
    pending_focus: Vec<Completion>,
    unlock_requests: Vec<String>,
    pending_unlocks: Vec<Completion>,
    build_requests: Vec<BuildModeContext>,
    pending_builds: Vec<PlacedCallback>,
    swap_requests: Vec<Vec<PropSwap>>,
    pending_swaps: Vec<SwapCallback>,
}

/// A world scene that records every call and holds completion callbacks
/// until the test fires them.
#[derive(Default)]
pub struct FakeWorld {
    state: RefCell<WorldState>,
}

impl fmt::Debug for FakeWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeWorld")
            .field("spawned", &state.spawned)
            .field("interacted", &state.interacted)
            .finish_non_exhaustive()
    }
}

impl FakeWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the player tapping the item at `spawn`.
    pub fn interact(&self, spawn: &SpawnPointKey) {
        self.state.borrow_mut().interacted.insert(spawn.clone());
    }

    /// Items currently spawned, as `spawn -> (item, task)`.
    #[must_use]
    pub fn spawned_items(&self) -> BTreeMap<SpawnPointKey, (String, String)> {
        self.state.borrow().spawned.clone()
    }

    /// Every `spawn_item` call, as `(spawn, item, task)`, in order.
    #[must_use]
    pub fn spawn_calls(&self) -> Vec<(SpawnPointKey, String, String)> {
        self.state.borrow().spawn_calls.clone()
    }

    /// Every `arm_interactable` call, as `(spawn, item, icon)`, in order.
    #[must_use]
    pub fn armed(&self) -> Vec<(SpawnPointKey, String, String)> {
        self.state.borrow().armed.clone()
    }

    /// Every cleared spawn point, in order.
    #[must_use]
    pub fn cleared_spawn_points(&self) -> Vec<SpawnPointKey> {
        self.state.borrow().cleared.clone()
    }

    /// Every camera focus request, in order.
    #[must_use]
    pub fn focus_requests(&self) -> Vec<SpawnPointKey> {
        self.state.borrow().focus_requests.clone()
    }

    /// Every room unlock animation request, in order.
    #[must_use]
    pub fn unlock_requests(&self) -> Vec<String> {
        self.state.borrow().unlock_requests.clone()
    }

    /// Every build mode request, in order.
    #[must_use]
    pub fn build_requests(&self) -> Vec<BuildModeContext> {
        self.state.borrow().build_requests.clone()
    }

    /// Every prop swap batch, in order.
    #[must_use]
    pub fn swap_requests(&self) -> Vec<Vec<PropSwap>> {
        self.state.borrow().swap_requests.clone()
    }

    /// Completes the oldest pending camera focus. Returns `false` if none.
    pub fn finish_camera_focus(&self) -> bool {
        let callback = take_first(&mut self.state.borrow_mut().pending_focus);
        callback.map(|done| done()).is_some()
    }

    /// Completes the oldest pending room unlock. Returns `false` if none.
    pub fn finish_room_unlock(&self) -> bool {
        let callback = take_first(&mut self.state.borrow_mut().pending_unlocks);
        callback.map(|done| done()).is_some()
    }

    /// Confirms the oldest pending build mode session. Returns `false` if none.
    pub fn confirm_build_mode(&self, prop_id: Option<&str>) -> bool {
        let callback = take_first(&mut self.state.borrow_mut().pending_builds);
        callback
            .map(|placed| placed(prop_id.map(str::to_owned)))
            .is_some()
    }

    /// Resolves the oldest pending prop swap. Returns `false` if none.
    pub fn resolve_prop_swap(&self, applied: bool) -> bool {
        let callback = take_first(&mut self.state.borrow_mut().pending_swaps);
        callback.map(|resolved| resolved(applied)).is_some()
    }
}

fn take_first<T>(pending: &mut Vec<T>) -> Option<T> {
    if pending.is_empty() {
        None
    } else {
        Some(pending.remove(0))
    }
}

impl WorldService for FakeWorld {
    fn spawn_item(&self, spawn: &SpawnPointKey, item_id: &str, task_id: &str) {
        let mut state = self.state.borrow_mut();
        state
            .spawned
            .insert(spawn.clone(), (item_id.to_owned(), task_id.to_owned()));
        state
            .spawn_calls
            .push((spawn.clone(), item_id.to_owned(), task_id.to_owned()));
    }

    fn clear_spawn_point(&self, spawn: &SpawnPointKey) {
        let mut state = self.state.borrow_mut();
        state.spawned.remove(spawn);
        state.interacted.remove(spawn);
        state.cleared.push(spawn.clone());
    }

    fn spawn_point_state(&self, spawn: &SpawnPointKey) -> SpawnPointState {
        let state = self.state.borrow();
        if state.interacted.contains(spawn) {
            SpawnPointState::Interacted
        } else if state.spawned.contains_key(spawn) {
            SpawnPointState::Spawned
        } else {
            SpawnPointState::Empty
        }
    }

    fn arm_interactable(&self, spawn: &SpawnPointKey, item_id: &str, icon_id: &str) {
        self.state
            .borrow_mut()
            .armed
            .push((spawn.clone(), item_id.to_owned(), icon_id.to_owned()));
    }

    fn focus_camera(&self, spawn: &SpawnPointKey, on_done: Completion) {
        let mut state = self.state.borrow_mut();
        state.focus_requests.push(spawn.clone());
        state.pending_focus.push(on_done);
    }

    fn play_room_unlock(&self, room_id: &str, on_done: Completion) {
        let mut state = self.state.borrow_mut();
        state.unlock_requests.push(room_id.to_owned());
        state.pending_unlocks.push(on_done);
    }

    fn enter_build_mode(&self, context: BuildModeContext, on_placed: PlacedCallback) {
        let mut state = self.state.borrow_mut();
        state.build_requests.push(context);
        state.pending_builds.push(on_placed);
    }

    fn swap_props(&self, swaps: &[PropSwap], on_resolved: SwapCallback) {
        let mut state = self.state.borrow_mut();
        state.swap_requests.push(swaps.to_vec());
        state.pending_swaps.push(on_resolved);
    }
}
