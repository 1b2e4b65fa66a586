//! Rendition CLI library.
//!
//! Command implementations behind the `rendition` binary: single-file
//! augmentation, directory batches, and configuration validation.

pub mod commands;
