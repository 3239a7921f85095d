//! In-memory overlay UI.

use std::cell::RefCell;
use std::fmt;

use diner_core::services::{Completion, OverlayService, PopupRequest};

type PopupCallback = Box<dyn FnOnce(bool)>;

#[derive(Default)]
struct OverlayState {
    narratives: Vec<(String, bool)>,
    pending_narratives: Vec<Completion>,
    popups: Vec<PopupRequest>,
    pending_popups: Vec<PopupCallback>,
    task_list_toggles: Vec<bool>,
}

/// An overlay that records every request and holds callbacks until the test
/// fires them.
#[derive(Default)]
pub struct FakeOverlay {
    state: RefCell<OverlayState>,
}

impl fmt::Debug for FakeOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeOverlay")
            .field("narratives", &state.narratives)
            .field("popups", &state.popups)
            .finish_non_exhaustive()
    }
}

impl FakeOverlay {
    /// Creates an idle overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every narrative played, as `(dialogue, skippable)`, in order.
    #[must_use]
    pub fn narratives(&self) -> Vec<(String, bool)> {
        self.state.borrow().narratives.clone()
    }

    /// Every popup shown, in order.
    #[must_use]
    pub fn popups(&self) -> Vec<PopupRequest> {
        self.state.borrow().popups.clone()
    }

    /// Every task list enable/disable, in order.
    #[must_use]
    pub fn task_list_toggles(&self) -> Vec<bool> {
        self.state.borrow().task_list_toggles.clone()
    }

    /// Finishes the oldest playing narrative. Returns `false` if none.
    pub fn finish_narrative(&self) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            if state.pending_narratives.is_empty() {
                None
            } else {
                Some(state.pending_narratives.remove(0))
            }
        };
        callback.map(|done| done()).is_some()
    }

    /// Dismisses the oldest open popup. Returns `false` if none.
    pub fn dismiss_popup(&self, confirmed: bool) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            if state.pending_popups.is_empty() {
                None
            } else {
                Some(state.pending_popups.remove(0))
            }
        };
        callback.map(|dismissed| dismissed(confirmed)).is_some()
    }
}

impl OverlayService for FakeOverlay {
    fn play_narrative(&self, dialogue_id: &str, skippable: bool, on_done: Completion) {
        let mut state = self.state.borrow_mut();
        state.narratives.push((dialogue_id.to_owned(), skippable));
        state.pending_narratives.push(on_done);
    }

    fn show_popup(&self, popup: PopupRequest, on_result: PopupCallback) {
        let mut state = self.state.borrow_mut();
        state.popups.push(popup);
        state.pending_popups.push(on_result);
    }

    fn set_task_list_enabled(&self, enabled: bool) {
        self.state.borrow_mut().task_list_toggles.push(enabled);
    }
}
