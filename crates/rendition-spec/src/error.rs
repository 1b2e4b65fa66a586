//! Error types for configuration validation and rendering.

use thiserror::Error;

/// Error codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Interval errors (E001-E002)
    /// E001: Minimum interval length is not positive
    NonPositiveIntervalLength,
    /// E002: Minimum interval length exceeds maximum
    InvertedIntervalRange,

    // Dynamics errors (E010-E014)
    /// E010: No dynamic levels configured
    EmptyLevelSet,
    /// E011: Velocity band has low > high or leaves the MIDI range
    InvalidVelocityBand,
    /// E012: Velocity bands decrease across the level order
    NonMonotonicBands,
    /// E013: Ramp probability outside [0, 1]
    InvalidRampProbability,

    // Tempo errors (E020-E023)
    /// E020: Tempo bounds are not positive or min > max
    InvalidTempoBounds,
    /// E021: Tempo standard deviation is negative or not finite
    InvalidTempoDeviation,
    /// E022: Tempo mean offset is not finite
    InvalidTempoOffset,
    /// E023: Tempo change count range is inverted
    InvertedTempoChangeRange,

    // Articulation errors (E030-E032)
    /// E030: Controller number above 127
    InvalidController,
    /// E031: Region parameters out of range
    InvalidRegionParameters,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NonPositiveIntervalLength => "E001",
            ErrorCode::InvertedIntervalRange => "E002",
            ErrorCode::EmptyLevelSet => "E010",
            ErrorCode::InvalidVelocityBand => "E011",
            ErrorCode::NonMonotonicBands => "E012",
            ErrorCode::InvalidRampProbability => "E013",
            ErrorCode::InvalidTempoBounds => "E020",
            ErrorCode::InvalidTempoDeviation => "E021",
            ErrorCode::InvalidTempoOffset => "E022",
            ErrorCode::InvertedTempoChangeRange => "E023",
            ErrorCode::InvalidController => "E030",
            ErrorCode::InvalidRegionParameters => "E031",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Only one dynamic level, no contrast or ramps possible
    SingleDynamicLevel,
    /// W002: Ramp spread wider than the narrowest velocity band
    WideRampSpread,
    /// W003: Duplicate dynamic levels in the level set
    DuplicateLevels,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::SingleDynamicLevel => "W001",
            WarningCode::WideRampSpread => "W002",
            WarningCode::DuplicateLevels => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "intervals.min_len").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a config path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning with a config path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Top-level error type for loading tables and rendering scores.
#[derive(Debug, Error)]
pub enum RenditionError {
    /// A track name did not resolve to any GM instrument.
    ///
    /// Never aborts a render; the track is passed through unchanged.
    #[error("track {track}: unresolved instrument name '{name}'")]
    UnresolvedInstrument {
        /// Index of the track within the score.
        track: usize,
        /// Raw track name as found in the file.
        name: String,
    },

    /// An articulation table entry is unusable.
    #[error("invalid probability table for '{instrument}': {message}")]
    InvalidProbabilityTable {
        /// Instrument key as written in the table.
        instrument: String,
        /// What is wrong with it.
        message: String,
    },

    /// A percussion pitch table entry is unusable.
    #[error("invalid percussion table entry for pitch {pitch}: {message}")]
    InvalidPercussionTable {
        /// Pitch key as written in the table.
        pitch: u8,
        /// What is wrong with it.
        message: String,
    },

    /// A score file could not be parsed or serialized.
    #[error("malformed score file '{file}': {message}")]
    MalformedScoreFile {
        /// File identity (path or name).
        file: String,
        /// Parser or writer message.
        message: String,
    },

    /// Configuration validation failed.
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfigurationRange(Vec<ValidationError>),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RenditionError {
    /// Creates a malformed score error.
    pub fn malformed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedScoreFile {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid probability table error.
    pub fn probability_table(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProbabilityTable {
            instrument: instrument.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            RenditionError::UnresolvedInstrument { .. } => "R001",
            RenditionError::InvalidProbabilityTable { .. } => "R002",
            RenditionError::MalformedScoreFile { .. } => "R003",
            RenditionError::InvalidConfigurationRange(_) => "R004",
            RenditionError::Io(_) => "R005",
            RenditionError::Json(_) => "R006",
            RenditionError::Yaml(_) => "R007",
            RenditionError::InvalidPercussionTable { .. } => "R008",
        }
    }

    /// Whether this error must abort a whole batch run.
    ///
    /// Load-time errors corrupt every output; per-file errors do not.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            RenditionError::InvalidProbabilityTable { .. }
                | RenditionError::InvalidPercussionTable { .. }
                | RenditionError::InvalidConfigurationRange(_)
                | RenditionError::Json(_)
                | RenditionError::Yaml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_tracks_errors() {
        let mut result = ValidationResult::default();
        assert!(result.is_ok());

        result.add_warning(ValidationWarning::with_path(
            WarningCode::SingleDynamicLevel,
            "only one level",
            "dynamics.levels",
        ));
        assert!(result.is_ok());

        result.add_error(ValidationError::new(
            ErrorCode::InvertedIntervalRange,
            "min > max",
        ));
        assert!(!result.is_ok());
        assert_eq!(result.into_result().unwrap_err().len(), 1);
    }

    #[test]
    fn test_error_display_includes_path() {
        let err = ValidationError::with_path(
            ErrorCode::InvalidRampProbability,
            "must be within [0, 1]",
            "dynamics.ramp_probability",
        );
        assert_eq!(
            err.to_string(),
            "E013: must be within [0, 1] (at dynamics.ramp_probability)"
        );
    }

    #[test]
    fn test_fatal_classification() {
        let load = RenditionError::probability_table("violin", "sum is 0.9");
        assert!(load.is_fatal_for_run());
        assert_eq!(load.code(), "R002");

        let per_file = RenditionError::malformed("song.mid", "truncated header");
        assert!(!per_file.is_fatal_for_run());
        assert!(per_file.to_string().contains("song.mid"));

        let unresolved = RenditionError::UnresolvedInstrument {
            track: 2,
            name: "Weird Synth 3".to_string(),
        };
        assert!(!unresolved.is_fatal_for_run());
    }

    #[test]
    fn test_configuration_error_lists_all_messages() {
        let err = RenditionError::InvalidConfigurationRange(vec![
            ValidationError::new(ErrorCode::InvertedIntervalRange, "min > max"),
            ValidationError::new(ErrorCode::EmptyLevelSet, "no levels"),
        ]);
        let text = err.to_string();
        assert!(text.contains("E002"));
        assert!(text.contains("E010"));
    }
}
