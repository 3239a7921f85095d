//! Diner task engine — Task Orchestration.
//!
//! Responsible for deciding which tasks the player is offered (task
//! lifecycle and integrity validation) and for running the ordered
//! completion sequences that turn a task in.

pub mod application;
pub mod domain;
