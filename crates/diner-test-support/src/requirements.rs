//! Requirement evaluator driven by a fixed answer list.

use std::cell::RefCell;
use std::collections::HashSet;

use diner_core::requirement::Requirement;
use diner_core::services::RequirementsEvaluator;

/// Treats a requirement as met when its `type` is in the met set, or when
/// every requirement is declared met.
#[derive(Debug)]
pub struct StaticRequirements {
    all_met: bool,
    met_kinds: RefCell<HashSet<String>>,
}

impl Default for StaticRequirements {
    fn default() -> Self {
        Self::all_met()
    }
}

impl StaticRequirements {
    /// Every requirement is met.
    #[must_use]
    pub fn all_met() -> Self {
        Self {
            all_met: true,
            met_kinds: RefCell::new(HashSet::new()),
        }
    }

    /// No requirement is met until marked with [`StaticRequirements::mark_met`].
    #[must_use]
    pub fn none_met() -> Self {
        Self {
            all_met: false,
            met_kinds: RefCell::new(HashSet::new()),
        }
    }

    /// Marks a requirement kind as met, builder style.
    #[must_use]
    pub fn with_met(self, kind: &str) -> Self {
        self.mark_met(kind);
        self
    }

    /// Marks a requirement kind as met.
    pub fn mark_met(&self, kind: &str) {
        self.met_kinds.borrow_mut().insert(kind.to_owned());
    }
}

impl RequirementsEvaluator for StaticRequirements {
    fn check_requirements_met(&self, requirements: &[Requirement]) -> bool {
        if self.all_met {
            return true;
        }
        let met = self.met_kinds.borrow();
        requirements
            .iter()
            .all(|requirement| met.contains(&requirement.kind))
    }
}
