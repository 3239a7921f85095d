//! Task orchestration services.

pub mod task_director;
pub mod task_manager;
pub mod validation;
pub mod views;
