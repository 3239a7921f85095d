//! Diner lint: content integrity checker.
//!
//! Loads a chapter tree and its catalog from disk, runs the same integrity
//! validation the task engine runs at startup, and reports the result.

pub mod config;
pub mod error;
pub mod report;
