//! Library error types for malformed input data.

use thiserror::Error;

use crate::sim::component::ComponentRef;

/// Malformed or missing input data for an in-scope component.
///
/// Raised explicitly at construction or lookup time; there are no silent
/// fallback defaults for bad curves or duration datasets.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("fragility curve has no points")]
    EmptyFragilityCurve,

    #[error("fragility curve state/probability lengths differ ({states} vs {probabilities})")]
    CurveLengthMismatch { states: usize, probabilities: usize },

    #[error("fragility probability {value} at index {index} is outside [0, 1]")]
    InvalidProbability { index: usize, value: f64 },

    #[error("fragility curve state {value} at index {index} is not finite")]
    InvalidCurveState { index: usize, value: f64 },

    #[error("no fragility curve registered for {0}")]
    MissingCurve(ComponentRef),

    #[error("environmental-state series has no rows")]
    EmptyEnvironmentSeries,

    #[error("environmental-state rows have unequal lengths")]
    RaggedEnvironmentSeries,

    #[error("recovery-time dataset is empty")]
    EmptyRecoveryDataset,

    #[error("recovery duration {value} at index {index} is negative or non-finite")]
    InvalidRecoveryDuration { index: usize, value: f64 },

    #[error("no recovery duration supplied for {0}")]
    MissingRecoveryDuration(ComponentRef),
}
