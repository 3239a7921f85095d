//! Diner Core — shared abstractions.
//!
//! This crate defines the identifiers, error type, broadcast primitive and
//! collaborator ports that the content and task crates depend on. It
//! contains no engine logic and no scene/backend code.

pub mod error;
pub mod ids;
pub mod requirement;
pub mod services;
pub mod signal;
