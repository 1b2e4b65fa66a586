//! Rendition Spec Library
//!
//! This crate holds the data side of Rendition: render configuration,
//! dynamic-level velocity bands, the General MIDI instrument alias table,
//! articulation and percussion tables, validation, and seed derivation.
//! It performs no randomness and no MIDI I/O; see `rendition-backend-midi`
//! for the engine.
//!
//! # Example
//!
//! ```
//! use rendition_spec::{validate_config, RenditionConfig, DynamicLevel};
//!
//! let config = RenditionConfig::from_json_str(r#"{
//!     "intervals": { "min_len": 2.0, "max_len": 4.0 },
//!     "dynamics": { "levels": ["p", "mf", "ff"], "ramp_probability": 1.0 }
//! }"#).unwrap();
//!
//! assert!(validate_config(&config).is_ok());
//! assert_eq!(config.dynamics.levels[1], DynamicLevel::Mf);
//! ```
//!
//! # Modules
//!
//! - [`config`]: Render configuration and its defaults
//! - [`dynamics`]: Dynamic levels and velocity bands
//! - [`error`]: Error and warning types
//! - [`hash`]: Seed derivation
//! - [`instrument`]: GM instrument ids and the alias table
//! - [`tables`]: Articulation and percussion tables
//! - [`validation`]: Configuration validation

pub mod config;
pub mod dynamics;
pub mod error;
pub mod hash;
pub mod instrument;
pub mod tables;
pub mod validation;

// Re-export commonly used types at the crate root
pub use config::{
    ArticulationConfig, ArticulationMode, DynamicsConfig, IntervalConfig, RenditionConfig,
    TempoConfig, DEFAULT_ARTICULATION_CONTROLLER, MAX_ENCODABLE_BPM, MAX_TEMPO_MICROS,
    MICROS_PER_MINUTE, MIN_ENCODABLE_BPM,
};
pub use dynamics::{DynamicLevel, DynamicTable, VelocityBand};
pub use error::{
    ErrorCode, RenditionError, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
pub use hash::{content_hash, derive_component_seed, derive_file_seed, derive_track_seed};
pub use instrument::{gm_table, normalize_name, GmTable, InstrumentId, GM_PROGRAM_NAMES};
pub use tables::{ArticulationEntry, ArticulationTable, PercussionTable, PROBABILITY_TOLERANCE};
pub use validation::validate_config;
