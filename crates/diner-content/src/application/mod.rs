//! Content loading.

pub mod loader;
pub mod source;
