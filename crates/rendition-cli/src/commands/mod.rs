//! CLI command implementations

pub mod augment;
pub mod batch;
pub mod validate;

mod loader;
