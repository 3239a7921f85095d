//! Collaborator ports.
//!
//! Each trait is a boundary between the engine and an external system: the
//! session/progress backend, the diner world scene, the overlay UI, and the
//! requirement evaluator. The engine receives them through [`Services`]
//! rather than looking them up globally.
//!
//! Execution is single-threaded. Long-running world/overlay operations take
//! a completion callback and return immediately; the callback fires later,
//! from the host loop, when the animation/dialogue/popup finishes.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ids::{ChapterMarker, PropId, PropSwap, SpawnPointKey};
use crate::requirement::Requirement;

/// One-shot completion callback handed to a collaborator.
pub type Completion = Box<dyn FnOnce()>;

/// Currencies known to the session backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Spent to turn in collectable tasks.
    Stars,
}

/// Payload persisted whenever a task's progress or assignment changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Completion count after this update.
    pub completion_count: u32,
    /// Whether the task has been shown to the player.
    pub assigned: bool,
    /// Whether the task reached its required completion count.
    pub completed: bool,
    /// Chapter this task starts, if any.
    pub chapter_start: Option<ChapterMarker>,
    /// Chapter this task ends, if any.
    pub chapter_end: Option<ChapterMarker>,
    /// Star cost of the task.
    pub star_cost: u32,
}

/// Observable state of a spawn point in the world scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnPointState {
    /// Nothing spawned.
    #[default]
    Empty,
    /// An item is spawned and waiting for the player.
    Spawned,
    /// The player has interacted with the spawned item.
    Interacted,
}

/// Context passed to build mode when a task asks the player to place a prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModeContext {
    /// Task that opened build mode.
    pub task_id: String,
    /// Room containing the node.
    pub room_id: String,
    /// Node to place a prop on.
    pub node_id: String,
    /// Only props carrying one of these tags may be chosen. Empty means any.
    pub prop_tags: Vec<String>,
}

/// Kind of modal popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    /// Shown at the end of the story.
    EndGame,
}

/// A modal popup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRequest {
    /// Popup kind.
    pub kind: PopupKind,
    /// Title text.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Optional sprite shown in the popup.
    pub sprite_path: Option<String>,
}

/// Session/progress backend.
#[async_trait(?Send)]
pub trait SessionService {
    /// Persisted completion count for a task.
    fn task_completion_count(&self, task_id: &str) -> u32;

    /// Whether the task has been shown to the player before.
    fn is_task_assigned(&self, task_id: &str) -> bool;

    /// Whether the task's persisted completion count reached `required_count`.
    fn is_task_completed(&self, task_id: &str, required_count: u32) -> bool {
        self.task_completion_count(task_id) >= required_count
    }

    /// Persists a task update. Implementations update their in-memory view
    /// before the backend write settles.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Persistence` if the backend write fails.
    async fn on_task_updated(&self, task_id: &str, update: &TaskUpdate) -> Result<(), EngineError>;

    /// Current balance of a currency.
    fn currency_balance(&self, currency: Currency) -> u32;

    /// Spends currency. Returns `false` if the balance was insufficient.
    fn lose_currency(&self, currency: Currency, amount: u32, context: &str) -> bool;

    /// Whether a dialogue has already been played.
    fn has_seen_dialogue(&self, dialogue_id: &str) -> bool;

    /// Records a dialogue as played.
    fn on_dialogue_seen(&self, dialogue_id: &str);

    /// Records a room as unlocked.
    fn unlock_room(&self, room_id: &str);

    /// Records a prop placed on a node.
    fn on_prop_swapped(&self, room_id: &str, node_id: &str, prop_id: &str);
}

/// Diner world scene.
pub trait WorldService {
    /// Spawns a task item at a spawn point.
    fn spawn_item(&self, spawn: &SpawnPointKey, item_id: &str, task_id: &str);

    /// Removes whatever occupies a spawn point.
    fn clear_spawn_point(&self, spawn: &SpawnPointKey);

    /// Current state of a spawn point.
    fn spawn_point_state(&self, spawn: &SpawnPointKey) -> SpawnPointState;

    /// Makes a spawned item interactable, showing `icon_id` over it.
    fn arm_interactable(&self, spawn: &SpawnPointKey, item_id: &str, icon_id: &str);

    /// Moves the camera to a spawn point.
    fn focus_camera(&self, spawn: &SpawnPointKey, on_done: Completion);

    /// Plays the unlock animation for a room and pans the camera to it.
    fn play_room_unlock(&self, room_id: &str, on_done: Completion);

    /// Enters build mode; `on_placed` receives the prop the player confirmed.
    fn enter_build_mode(&self, context: BuildModeContext, on_placed: Box<dyn FnOnce(Option<PropId>)>);

    /// Swaps a batch of props; `on_resolved` receives whether all swaps applied.
    fn swap_props(&self, swaps: &[PropSwap], on_resolved: Box<dyn FnOnce(bool)>);
}

/// Overlay UI.
pub trait OverlayService {
    /// Plays a narrative sequence.
    fn play_narrative(&self, dialogue_id: &str, skippable: bool, on_done: Completion);

    /// Shows a modal popup; `on_result` receives whether it was confirmed.
    fn show_popup(&self, popup: PopupRequest, on_result: Box<dyn FnOnce(bool)>);

    /// Enables or disables the task list button.
    fn set_task_list_enabled(&self, enabled: bool);
}

/// Black-box predicate over authored requirements.
pub trait RequirementsEvaluator {
    /// Whether every requirement in `requirements` is met.
    fn check_requirements_met(&self, requirements: &[Requirement]) -> bool;
}

/// The collaborators handed to every engine component.
#[derive(Clone)]
pub struct Services {
    /// Session/progress backend.
    pub session: Rc<dyn SessionService>,
    /// Diner world scene.
    pub world: Rc<dyn WorldService>,
    /// Overlay UI.
    pub overlay: Rc<dyn OverlayService>,
    /// Requirement evaluator.
    pub requirements: Rc<dyn RequirementsEvaluator>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
