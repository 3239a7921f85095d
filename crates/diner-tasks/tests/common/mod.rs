//! Shared helpers for task engine integration tests.
#![allow(dead_code)]

use diner_content::application::loader::{ContentBundle, load_catalog, load_chapters};
use diner_content::application::source::InMemorySource;
use diner_content::domain::catalog::Catalog;
use diner_tasks::application::task_director::TaskDirector;
use diner_tasks::application::task_manager::TaskManager;
use diner_tasks::application::validation::ValidationReport;
use diner_test_support::FakeServices;

/// Catalog covering every room, dialogue and icon used by [`DINER_ROOT`].
pub const CATALOG: &str = r"
rooms:
  - id: kitchen
    spawn_points: [oven_spot, crumbs_a, crumbs_b]
    nodes: [counter]
  - id: patio
    spawn_points: [leaves_a]
    nodes: [n1, n2]
dialogues: [oven_intro, patio_intro]
icons: [oven_icon, broom_icon]
";

/// A small two-chapter diner.
pub const DINER_ROOT: &str = r"
chapters:
  - id: chapter_1
    name: Opening Day
    tasks:
      - id: t_oven
        name: Fix the oven
        icon: oven_icon
        star_cost: 2
        completion_sequences:
          - - type: dialogue
              dialogue_id: oven_intro
            - type: focus_on_item
              room_id: kitchen
              spawn_id: oven_spot
              item_id: wrench
    references: [kitchen.yaml]
  - id: chapter_2
    name: Patio Season
    completion_requirements:
      - type: chapter_2_done
    tasks:
      - id: t_patio
        name: Open the patio
        star_cost: 3
        chapter_start: { id: chapter_2, name: Patio Season }
        completion_sequences:
          - - type: unlock_room
              room_id: patio
            - type: force_swap_props
              swaps:
                - { room_id: patio, node_id: n1, prop_id: chair_red }
";

/// Child document for chapter one.
pub const KITCHEN: &str = r"
tasks:
  - id: t_crumbs
    name: Sweep the crumbs
    icon: broom_icon
    star_cost: 1
    chapter_end: { id: chapter_1, name: Opening Day }
    completion_sequences:
      - - type: interactable_items
          room_id: kitchen
          item_id: crumbs
          icon_id: broom_icon
          spawn_ids: [crumbs_a, crumbs_b]
        - type: place_prop
          room_id: kitchen
          node_id: counter
          prop_tags: [plant]
";

/// Document source holding the diner content and catalog.
pub fn diner_source() -> InMemorySource {
    InMemorySource::new()
        .with_document("chapters.yaml", DINER_ROOT)
        .with_document("kitchen.yaml", KITCHEN)
        .with_document("catalog.yaml", CATALOG)
}

/// Loads the diner content.
pub fn load_diner() -> (ContentBundle, Catalog) {
    let source = diner_source();
    let bundle = load_chapters(&source, "chapters.yaml").unwrap();
    let catalog = load_catalog(&source, "catalog.yaml").unwrap();
    (bundle, catalog)
}

/// A validated manager, a director, and the fakes behind both.
pub struct Engine {
    pub fakes: FakeServices,
    pub manager: TaskManager,
    pub director: TaskDirector,
    pub report: ValidationReport,
}

impl Engine {
    /// Builds, validates and runs the first recompute.
    pub fn start(fakes: FakeServices, bundle: ContentBundle, catalog: &Catalog) -> Self {
        let mut manager = TaskManager::new(fakes.services(), bundle.chapters);
        let report = manager.validate(catalog, &bundle.diagnostics);
        manager.update_active_tasks();
        let director = TaskDirector::new(fakes.services());
        Self {
            fakes,
            manager,
            director,
            report,
        }
    }

    /// Begins the next pass of `task_id` with an instant withdrawal.
    pub async fn begin(&self, task_id: &str) {
        let task = self.manager.task(task_id).cloned().unwrap();
        self.director
            .instance_and_begin_completion_sequence_state(&task, async {})
            .await;
    }

    /// One frame.
    pub async fn tick(&mut self) {
        self.director
            .tick_current_completion_sequence_state(&mut self.manager)
            .await;
    }

    /// Ids of the offered tasks.
    pub fn active_ids(&self) -> Vec<String> {
        self.manager
            .active_tasks()
            .iter()
            .map(|task| task.id().to_owned())
            .collect()
    }
}
