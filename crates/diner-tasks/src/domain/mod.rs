//! Task orchestration domain: runtime task records and state machines.

pub mod event_state;
pub mod sequence_state;
pub mod task;
