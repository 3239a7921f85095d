//! Diner task engine — Content.
//!
//! Responsible for the chapter/task/completion-sequence model, the room and
//! dialogue catalog used for integrity checks, and loading YAML documents
//! that reference each other into one merged chapter list.

pub mod application;
pub mod domain;
pub mod error;
