//! Shared test fakes and builders for the diner task engine.

mod builders;
mod overlay;
mod requirements;
mod session;
mod world;

use std::rc::Rc;

use diner_core::services::Services;

pub use builders::{ChapterBuilder, TaskBuilder};
pub use overlay::FakeOverlay;
pub use requirements::StaticRequirements;
pub use session::FakeSession;
pub use world::FakeWorld;

/// Every fake collaborator, kept around so tests can drive and inspect them.
#[derive(Debug, Clone, Default)]
pub struct FakeServices {
    /// Session/progress backend.
    pub session: Rc<FakeSession>,
    /// World scene.
    pub world: Rc<FakeWorld>,
    /// Overlay UI.
    pub overlay: Rc<FakeOverlay>,
    /// Requirement evaluator.
    pub requirements: Rc<StaticRequirements>,
}

impl FakeServices {
    /// Fakes with default state: no progress, no stars, every requirement met.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the session fake, builder style.
    #[must_use]
    pub fn with_session(mut self, session: FakeSession) -> Self {
        self.session = Rc::new(session);
        self
    }

    /// Replaces the requirement evaluator, builder style.
    #[must_use]
    pub fn with_requirements(mut self, requirements: StaticRequirements) -> Self {
        self.requirements = Rc::new(requirements);
        self
    }

    /// The engine-facing service bundle.
    #[must_use]
    pub fn services(&self) -> Services {
        Services {
            session: self.session.clone(),
            world: self.world.clone(),
            overlay: self.overlay.clone(),
            requirements: self.requirements.clone(),
        }
    }
}
