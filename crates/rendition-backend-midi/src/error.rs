//! Error types for the MIDI backend.

use rendition_spec::RenditionError;
use thiserror::Error;

/// Result type for SMF reading and writing.
pub type MidiResult<T> = Result<T, MidiError>;

/// Errors that can occur while reading or writing a Standard MIDI File.
#[derive(Debug, Error)]
pub enum MidiError {
    /// The bytes are not a valid SMF.
    #[error("SMF parse error: {0}")]
    Parse(#[from] midly::Error),

    /// The file uses timing the engine cannot map to seconds.
    #[error("unsupported timing: {0}")]
    UnsupportedTiming(String),

    /// A value does not fit its SMF field.
    #[error("{what} {value} exceeds the SMF limit")]
    OutOfRange {
        /// Field name.
        what: &'static str,
        /// Offending value.
        value: u64,
    },

    /// Serialization failed.
    #[error("SMF write error: {0}")]
    Write(#[from] std::io::Error),
}

impl MidiError {
    /// Creates an out-of-range error.
    pub fn out_of_range(what: &'static str, value: u64) -> Self {
        Self::OutOfRange { what, value }
    }

    /// Converts into a per-file [`RenditionError::MalformedScoreFile`].
    pub fn for_file(self, file: impl Into<String>) -> RenditionError {
        RenditionError::malformed(file, self.to_string())
    }
}
