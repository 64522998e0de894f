//! Error types for the swb crate.

use thiserror::Error;

/// Error type for all fallible operations in the crate.
#[derive(Debug, Clone, Error)]
pub enum SwbError {
    /// Returned when a required series column is absent.
    #[error("series column {name:?} is missing")]
    MissingColumn {
        /// Name of the missing column.
        name: String,
    },

    /// Returned when a column or schedule does not match the series length.
    #[error("{name}: expected {expected} values, got {got}")]
    LengthMismatch {
        /// Name of the mismatched column or input.
        name: String,
        /// Expected length (the series length).
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when series timestamps do not step by exactly one day.
    #[error("timestamps must be strictly increasing daily steps (violation at position {position})")]
    NonDailyIndex {
        /// Index of the first offending timestamp.
        position: usize,
    },

    /// Returned when a growth stage has zero duration.
    #[error("growth stage {index} must last at least one day")]
    ZeroDurationStage {
        /// Position of the stage in the schedule.
        index: usize,
    },

    /// Returned when soil or crop parameters are out of range.
    #[error("invalid parameters: {reason}")]
    InvalidParameters {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a TOML run configuration cannot be read or parsed.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

/// Convenience type for `Result<T, SwbError>`.
pub type SwbResult<T> = Result<T, SwbError>;
