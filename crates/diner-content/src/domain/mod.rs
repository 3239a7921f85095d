//! Content domain model.

pub mod catalog;
pub(crate) mod documents;
pub mod model;
